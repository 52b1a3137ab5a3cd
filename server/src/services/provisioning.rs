//! Guest provisioning, driven by [`RegistrationAccepted`].
//!
//! A registration gets its guest record the first time it is accepted.
//! The record survives later status changes, so accepting again never
//! mints a second guest or a new token.

use chrono::Utc;
use serde::Serialize;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::db::{guests, profiles};
use crate::models::guest::{Guest, GuestStatus};
use crate::utils::error::AppError;
use crate::utils::random::random_token;

const MAX_TOKEN_ATTEMPTS: usize = 5;

/// Raised by the review workflow when a registration is set to accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationAccepted {
    pub registration_id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct GuestProvisioner;

impl GuestProvisioner {
    pub fn new() -> Self {
        Self
    }

    /// Runs on the caller's transaction. Returns the guest that was
    /// created, or `None` when the registration already had one.
    pub async fn on_registration_accepted(
        &self,
        conn: &mut SqliteConnection,
        event: &RegistrationAccepted,
    ) -> Result<Option<Guest>, AppError> {
        if guests::find_by_registration(&mut *conn, event.registration_id)
            .await?
            .is_some()
        {
            tracing::debug!(
                registration_id = %event.registration_id,
                "Guest already provisioned"
            );
            return Ok(None);
        }

        let (name, email, contact_number) = match profiles::find_profile(&mut *conn, event.user_id)
            .await?
        {
            Some(profile) => (profile.display_name, profile.email, profile.contact_number),
            None => {
                tracing::warn!(
                    user_id = %event.user_id,
                    "No profile for registrant, guest created without contact details"
                );
                (String::new(), String::new(), String::new())
            }
        };

        for attempt in 1..=MAX_TOKEN_ATTEMPTS {
            let now = Utc::now();
            let guest = Guest {
                id: Uuid::new_v4(),
                registration_id: event.registration_id,
                name: name.clone(),
                email: email.clone(),
                contact_number: contact_number.clone(),
                token: random_token(),
                status: GuestStatus::Pending,
                created_at: now,
                updated_at: now,
            };

            match guests::insert_guest(&mut *conn, &guest).await {
                Ok(()) => {
                    tracing::info!(
                        guest_id = %guest.id,
                        registration_id = %guest.registration_id,
                        event_id = %event.event_id,
                        "Guest provisioned"
                    );
                    return Ok(Some(guest));
                }
                Err(e) => {
                    let err = AppError::from(e);
                    if !err.is_unique_violation() {
                        return Err(err);
                    }
                    // Either the token collided or another request won the
                    // race for this registration.
                    if guests::find_by_registration(&mut *conn, event.registration_id)
                        .await?
                        .is_some()
                    {
                        return Ok(None);
                    }
                    tracing::warn!(attempt, "Guest token collision, retrying");
                }
            }
        }

        Err(AppError::Conflict(
            "Could not allocate a unique check-in token".to_string(),
        ))
    }
}
