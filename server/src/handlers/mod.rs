use axum::response::Response;
use serde::Serialize;
use uuid::Uuid;

use crate::utils::error::AppError;
use crate::utils::response::success;

pub mod events;
pub mod guests;
pub mod media;
pub mod registrations;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "conbook-api",
    };

    success(payload, "Health check successful")
}

/// Parses a path segment as an id, reporting failures in the API envelope.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("{} '{}'", what, raw)))
}
