use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use chrono::Utc;

use crate::auth::Actor;
use crate::handlers::parse_id;
use crate::services::registrations::RegistrationInput;
use crate::services::review::StatusChange;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

pub async fn submit(
    State(state): State<AppState>,
    actor: Actor,
    Path(key): Path<String>,
    Json(input): Json<RegistrationInput>,
) -> Result<Response, AppError> {
    let event_id = parse_id(&key, "Event")?;
    let registration = state
        .registrations()
        .submit_registration(&actor, event_id, input)
        .await?;
    Ok(created(registration, "Registration submitted"))
}

pub async fn list_for_event(
    State(state): State<AppState>,
    actor: Actor,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let event_id = parse_id(&key, "Event")?;
    let rows = state
        .registrations()
        .list_event_registrations(&actor, event_id)
        .await?;
    Ok(success(rows, "Registrations retrieved"))
}

pub async fn list_mine(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Response, AppError> {
    let timeline = state
        .registrations()
        .list_user_registrations(actor.user_id, Utc::now())
        .await?;
    Ok(success(timeline, "Registrations retrieved"))
}

pub async fn set_status(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(change): Json<StatusChange>,
) -> Result<Response, AppError> {
    let registration_id = parse_id(&id, "Registration")?;
    let outcome = state
        .review()
        .set_registration_status(&actor, registration_id, change)
        .await?;
    Ok(success(outcome, "Registration status updated"))
}
