use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use super::guest::GuestStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Pending,
    Accepted,
    Declined,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Accepted => "accepted",
            RegistrationStatus::Declined => "declined",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Registration {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub ticket_id: Uuid,
    pub payment_method_id: Uuid,
    pub proof_id: Option<Uuid>,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A registration as the organizer's dashboard shows it.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EventRegistrationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: RegistrationStatus,
    pub proof_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub ticket_id: Uuid,
    pub ticket_name: String,
    pub payment_method_id: Uuid,
    pub payment_method_name: String,
    pub registrant_name: Option<String>,
    pub registrant_email: Option<String>,
    pub contact_number: Option<String>,
}

/// A registration as its registrant sees it under "my registrations".
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserRegistrationRow {
    pub id: Uuid,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    pub event_id: Uuid,
    pub event_slug: String,
    pub event_title: String,
    pub event_location: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub ticket_name: String,
    pub payment_method_name: String,
    pub guest_token: Option<String>,
    pub guest_status: Option<GuestStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&RegistrationStatus::Accepted).unwrap(),
            "\"accepted\""
        );
        let parsed: RegistrationStatus = serde_json::from_str("\"declined\"").unwrap();
        assert_eq!(parsed, RegistrationStatus::Declined);
        assert!(serde_json::from_str::<RegistrationStatus>("\"cancelled\"").is_err());
    }
}
