//! Door-side guest tracking. Guest status is independent of the
//! registration status and may move between any two values.

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::auth::Actor;
use crate::db::{events, guests, Database};
use crate::models::guest::{Guest, GuestStatus};
use crate::utils::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct GuestStatusChange {
    pub status: GuestStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckIn {
    pub token: String,
}

#[derive(Clone)]
pub struct GuestTracker {
    db: Database,
}

impl GuestTracker {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn set_guest_status(
        &self,
        actor: &Actor,
        guest_id: Uuid,
        status: GuestStatus,
    ) -> Result<Guest, AppError> {
        let mut tx = self.db.begin().await?;
        let guest = guests::find_guest(&mut tx, guest_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Guest {}", guest_id)))?;
        let guest = apply_status(&mut tx, actor, guest, status).await?;
        tx.commit().await?;
        Ok(guest)
    }

    /// Marks the holder of `token` as checked in.
    pub async fn check_in_by_token(&self, actor: &Actor, token: &str) -> Result<Guest, AppError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::ValidationError("token is required".to_string()));
        }

        let mut tx = self.db.begin().await?;
        let guest = guests::find_by_token(&mut tx, token)
            .await?
            .ok_or_else(|| AppError::NotFound("No guest matches this token".to_string()))?;
        let guest = apply_status(&mut tx, actor, guest, GuestStatus::CheckedIn).await?;
        tx.commit().await?;
        Ok(guest)
    }

    /// All guests of an event, newest first.
    pub async fn list_event_guests(
        &self,
        actor: &Actor,
        event_id: Uuid,
    ) -> Result<Vec<Guest>, AppError> {
        let mut conn = self.db.pool().acquire().await?;
        let event = events::find_event(&mut conn, event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {}", event_id)))?;
        actor.ensure_staff_for(&event)?;

        Ok(guests::list_for_event(&mut conn, event.id).await?)
    }
}

async fn apply_status(
    conn: &mut SqliteConnection,
    actor: &Actor,
    mut guest: Guest,
    status: GuestStatus,
) -> Result<Guest, AppError> {
    let event_id = guests::event_id_for_guest(&mut *conn, guest.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Guest {}", guest.id)))?;
    let event = events::find_event(&mut *conn, event_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event {}", event_id)))?;
    actor.ensure_staff_for(&event)?;

    let now = Utc::now();
    if guests::update_status(&mut *conn, guest.id, status, now).await? == 0 {
        return Err(AppError::NotFound(format!("Guest {}", guest.id)));
    }

    tracing::info!(
        guest_id = %guest.id,
        event_id = %event.id,
        operator_id = %actor.user_id,
        from = %guest.status,
        to = %status,
        "Guest status changed"
    );

    guest.status = status;
    guest.updated_at = now;
    Ok(guest)
}
