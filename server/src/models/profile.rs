use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Registrant details copied from the identity provider at submission time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub display_name: String,
    pub email: String,
    pub contact_number: String,
    pub updated_at: DateTime<Utc>,
}
