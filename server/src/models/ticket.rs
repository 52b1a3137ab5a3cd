use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketType {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
}

// Prices are kept as decimal text so no precision is lost in SQLite.
impl<'r> FromRow<'r, SqliteRow> for TicketType {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let raw_price: String = row.try_get("price")?;
        let price = raw_price
            .parse::<Decimal>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "price".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            id: row.try_get("id")?,
            event_id: row.try_get("event_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PaymentMethod {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub details: String,
}
