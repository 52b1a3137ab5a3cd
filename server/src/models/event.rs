use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::ticket::{PaymentMethod, TicketType};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub slug: String,
    pub organizer_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_date: NaiveDate,
    pub end_time: NaiveTime,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub cover_image_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An event together with the options a registrant picks from.
#[derive(Debug, Clone, Serialize)]
pub struct EventDetails {
    #[serde(flatten)]
    pub event: Event,
    pub ticket_types: Vec<TicketType>,
    pub payment_methods: Vec<PaymentMethod>,
}

impl EventDetails {
    /// Events without ticket types or payment methods are listed but
    /// cannot take registrations.
    pub fn is_open_for_registration(&self) -> bool {
        !self.ticket_types.is_empty() && !self.payment_methods.is_empty()
    }
}
