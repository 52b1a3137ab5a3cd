use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use chrono::Utc;

use crate::auth::Actor;
use crate::handlers::parse_id;
use crate::services::events::EventInput;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    Json(input): Json<EventInput>,
) -> Result<Response, AppError> {
    let details = state.events().create_event(&actor, input).await?;
    Ok(created(details, "Event created"))
}

pub async fn update(
    State(state): State<AppState>,
    actor: Actor,
    Path(key): Path<String>,
    Json(input): Json<EventInput>,
) -> Result<Response, AppError> {
    let event_id = parse_id(&key, "Event")?;
    let details = state.events().update_event(&actor, event_id, input).await?;
    Ok(success(details, "Event updated"))
}

pub async fn cancel(
    State(state): State<AppState>,
    actor: Actor,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let event_id = parse_id(&key, "Event")?;
    let summary = state.events().cancel_event(&actor, event_id).await?;
    Ok(success(summary, "Event cancelled"))
}

pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let details = state.events().get_event_by_slug(&slug).await?;
    Ok(success(details, "Event retrieved"))
}

pub async fn list_upcoming(State(state): State<AppState>) -> Result<Response, AppError> {
    let events = state.events().list_upcoming_events(Utc::now()).await?;
    Ok(success(events, "Upcoming events retrieved"))
}

pub async fn list_mine(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Response, AppError> {
    let timeline = state
        .events()
        .list_organizer_events(actor.user_id, Utc::now())
        .await?;
    Ok(success(timeline, "Organizer events retrieved"))
}
