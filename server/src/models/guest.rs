use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum GuestStatus {
    Pending,
    #[serde(rename = "Checked In")]
    #[sqlx(rename = "Checked In")]
    CheckedIn,
    #[serde(rename = "No Show")]
    #[sqlx(rename = "No Show")]
    NoShow,
    Cancelled,
}

impl GuestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuestStatus::Pending => "Pending",
            GuestStatus::CheckedIn => "Checked In",
            GuestStatus::NoShow => "No Show",
            GuestStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for GuestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Guest {
    pub id: Uuid,
    pub registration_id: Uuid,
    pub name: String,
    pub email: String,
    pub contact_number: String,
    pub token: String,
    pub status: GuestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
