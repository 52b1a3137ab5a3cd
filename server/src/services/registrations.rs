//! Registration intake and the registrant/organizer listings.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Actor;
use crate::db::{events, profiles, registrations, tickets, Database};
use crate::models::event::EventDetails;
use crate::models::profile::UserProfile;
use crate::models::registration::{
    EventRegistrationRow, Registration, RegistrationStatus, UserRegistrationRow,
};
use crate::models::Timeline;
use crate::services::media::{require_owned_attachment, AttachmentUse};
use crate::utils::error::AppError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationInput {
    pub ticket_type_id: Option<Uuid>,
    pub payment_method_id: Option<Uuid>,
    /// Attachment id of the uploaded proof of payment. Mandatory.
    pub proof_id: Option<Uuid>,
    pub contact_number: Option<String>,
}

#[derive(Clone)]
pub struct RegistrationService {
    db: Database,
}

impl RegistrationService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn submit_registration(
        &self,
        actor: &Actor,
        event_id: Uuid,
        input: RegistrationInput,
    ) -> Result<Registration, AppError> {
        let proof_id = input.proof_id.ok_or_else(|| {
            AppError::ValidationError("Proof of payment upload is required".to_string())
        })?;
        let ticket_type_id = input
            .ticket_type_id
            .ok_or_else(|| AppError::ValidationError("ticket_type_id is required".to_string()))?;
        let payment_method_id = input.payment_method_id.ok_or_else(|| {
            AppError::ValidationError("payment_method_id is required".to_string())
        })?;

        let mut tx = self.db.begin().await?;

        let event = events::find_event(&mut tx, event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {}", event_id)))?;

        let details = EventDetails {
            ticket_types: tickets::list_ticket_types(&mut tx, event.id).await?,
            payment_methods: tickets::list_payment_methods(&mut tx, event.id).await?,
            event,
        };
        if !details.is_open_for_registration() {
            return Err(AppError::ValidationError(
                "Event is not open for registration".to_string(),
            ));
        }
        if !details.ticket_types.iter().any(|t| t.id == ticket_type_id) {
            return Err(AppError::ValidationError(
                "Ticket type does not belong to this event".to_string(),
            ));
        }
        if !details.payment_methods.iter().any(|m| m.id == payment_method_id) {
            return Err(AppError::ValidationError(
                "Payment method does not belong to this event".to_string(),
            ));
        }

        require_owned_attachment(&mut tx, actor, proof_id, AttachmentUse::ProofOfPayment).await?;

        let now = Utc::now();
        let existing = profiles::find_profile(&mut tx, actor.user_id).await?;
        let profile = merge_profile(existing, actor, input.contact_number.as_deref(), now);
        profiles::upsert_profile(&mut tx, &profile).await?;

        let registration = Registration {
            id: Uuid::new_v4(),
            user_id: actor.user_id,
            event_id: details.event.id,
            ticket_id: ticket_type_id,
            payment_method_id,
            proof_id: Some(proof_id),
            status: RegistrationStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        registrations::insert_registration(&mut tx, &registration).await?;
        tx.commit().await?;

        tracing::info!(
            registration_id = %registration.id,
            event_id = %registration.event_id,
            user_id = %registration.user_id,
            "Registration submitted"
        );
        Ok(registration)
    }

    /// Registrations for an organizer's dashboard, newest first.
    pub async fn list_event_registrations(
        &self,
        actor: &Actor,
        event_id: Uuid,
    ) -> Result<Vec<EventRegistrationRow>, AppError> {
        let mut conn = self.db.pool().acquire().await?;
        let event = events::find_event(&mut conn, event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {}", event_id)))?;
        actor.ensure_staff_for(&event)?;

        Ok(registrations::list_for_event(&mut conn, event.id).await?)
    }

    pub async fn list_user_registrations(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Timeline<UserRegistrationRow>, AppError> {
        let mut conn = self.db.pool().acquire().await?;
        let rows = registrations::list_for_user(&mut conn, user_id).await?;
        Ok(Timeline::partition(rows, now, |row| row.end_at))
    }
}

/// Fresh values from the identity provider win; blanks keep what was stored.
fn merge_profile(
    existing: Option<UserProfile>,
    actor: &Actor,
    contact_number: Option<&str>,
    now: DateTime<Utc>,
) -> UserProfile {
    let existing = existing.unwrap_or(UserProfile {
        id: actor.user_id,
        display_name: String::new(),
        email: String::new(),
        contact_number: String::new(),
        updated_at: now,
    });

    let pick = |fresh: &str, stored: String| {
        let fresh = fresh.trim();
        if fresh.is_empty() {
            stored
        } else {
            fresh.to_string()
        }
    };

    UserProfile {
        id: actor.user_id,
        display_name: pick(&actor.display_name, existing.display_name),
        email: pick(&actor.email, existing.email),
        contact_number: pick(contact_number.unwrap_or_default(), existing.contact_number),
        updated_at: now,
    }
}
