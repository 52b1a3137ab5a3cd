use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;

use crate::auth::Actor;
use crate::handlers::parse_id;
use crate::services::guests::{CheckIn, GuestStatusChange};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub async fn list_for_event(
    State(state): State<AppState>,
    actor: Actor,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let event_id = parse_id(&key, "Event")?;
    let guests = state.guests().list_event_guests(&actor, event_id).await?;
    Ok(success(guests, "Guests retrieved"))
}

pub async fn set_status(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(change): Json<GuestStatusChange>,
) -> Result<Response, AppError> {
    let guest_id = parse_id(&id, "Guest")?;
    let guest = state
        .guests()
        .set_guest_status(&actor, guest_id, change.status)
        .await?;
    Ok(success(guest, "Guest status updated"))
}

pub async fn check_in(
    State(state): State<AppState>,
    actor: Actor,
    Json(request): Json<CheckIn>,
) -> Result<Response, AppError> {
    let guest = state.guests().check_in_by_token(&actor, &request.token).await?;
    Ok(success(guest, "Guest checked in"))
}
