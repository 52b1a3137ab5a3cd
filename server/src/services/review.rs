//! Registration review: organizers and staff move registrations between
//! `pending`, `accepted` and `declined`.
//!
//! Any status may follow any other. Accepting publishes
//! [`RegistrationAccepted`], which the guest provisioner handles inside
//! the same transaction as the status write.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Actor;
use crate::db::{events, registrations, Database};
use crate::models::guest::Guest;
use crate::models::registration::{Registration, RegistrationStatus};
use crate::services::provisioning::{GuestProvisioner, RegistrationAccepted};
use crate::utils::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct StatusChange {
    pub status: RegistrationStatus,
    /// When set, the write only happens if the registration still has this status.
    #[serde(default)]
    pub expected_status: Option<RegistrationStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutcome {
    pub registration: Registration,
    pub previous_status: RegistrationStatus,
    /// Set only when this transition created the guest.
    pub provisioned_guest: Option<Guest>,
}

#[derive(Clone)]
pub struct ReviewWorkflow {
    db: Database,
    provisioner: GuestProvisioner,
}

impl ReviewWorkflow {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            provisioner: GuestProvisioner::new(),
        }
    }

    pub async fn set_registration_status(
        &self,
        actor: &Actor,
        registration_id: Uuid,
        change: StatusChange,
    ) -> Result<ReviewOutcome, AppError> {
        let mut tx = self.db.begin().await?;

        let mut registration = registrations::find_registration(&mut tx, registration_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Registration {}", registration_id)))?;
        let event = events::find_event(&mut tx, registration.event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {}", registration.event_id)))?;
        actor.ensure_staff_for(&event)?;

        let previous_status = registration.status;
        let now = Utc::now();
        let written = match change.expected_status {
            Some(expected) => {
                registrations::update_status_if(&mut tx, registration.id, expected, change.status, now)
                    .await?
            }
            None => registrations::update_status(&mut tx, registration.id, change.status, now).await?,
        };
        if written == 0 {
            return Err(AppError::Conflict(format!(
                "Registration {} is {}, not {}",
                registration.id,
                previous_status,
                change
                    .expected_status
                    .map(|s| s.as_str())
                    .unwrap_or("present")
            )));
        }
        registration.status = change.status;
        registration.updated_at = now;

        let provisioned_guest = if change.status == RegistrationStatus::Accepted {
            let accepted = RegistrationAccepted {
                registration_id: registration.id,
                event_id: registration.event_id,
                user_id: registration.user_id,
            };
            self.provisioner
                .on_registration_accepted(&mut tx, &accepted)
                .await?
        } else {
            None
        };

        tx.commit().await?;

        tracing::info!(
            registration_id = %registration.id,
            event_id = %registration.event_id,
            operator_id = %actor.user_id,
            from = %previous_status,
            to = %registration.status,
            guest_provisioned = provisioned_guest.is_some(),
            "Registration status changed"
        );

        Ok(ReviewOutcome {
            registration,
            previous_status,
            provisioned_guest,
        })
    }
}
