//! Ticket types and payment methods: the per-event option lists.

use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::models::ticket::{PaymentMethod, TicketType};

pub async fn list_ticket_types(
    conn: &mut SqliteConnection,
    event_id: Uuid,
) -> Result<Vec<TicketType>, sqlx::Error> {
    sqlx::query_as::<_, TicketType>(
        "SELECT id, event_id, name, description, price FROM event_tickets \
         WHERE event_id = ? ORDER BY position ASC, rowid ASC",
    )
    .bind(event_id)
    .fetch_all(conn)
    .await
}

pub async fn insert_ticket_type(
    conn: &mut SqliteConnection,
    ticket: &TicketType,
    position: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO event_tickets (id, event_id, name, description, price, position) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(ticket.id)
    .bind(ticket.event_id)
    .bind(&ticket.name)
    .bind(&ticket.description)
    .bind(ticket.price.to_string())
    .bind(position)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn update_ticket_type(
    conn: &mut SqliteConnection,
    ticket: &TicketType,
    position: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE event_tickets SET name = ?, description = ?, price = ?, position = ? \
         WHERE id = ? AND event_id = ?",
    )
    .bind(&ticket.name)
    .bind(&ticket.description)
    .bind(ticket.price.to_string())
    .bind(position)
    .bind(ticket.id)
    .bind(ticket.event_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete_ticket_type(conn: &mut SqliteConnection, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM event_tickets WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn ticket_type_in_use(conn: &mut SqliteConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM event_registrations WHERE ticket_id = ? LIMIT 1")
            .bind(id)
            .fetch_optional(conn)
            .await?;
    Ok(found.is_some())
}

pub async fn list_payment_methods(
    conn: &mut SqliteConnection,
    event_id: Uuid,
) -> Result<Vec<PaymentMethod>, sqlx::Error> {
    sqlx::query_as::<_, PaymentMethod>(
        "SELECT id, event_id, name, details FROM event_payment_methods \
         WHERE event_id = ? ORDER BY position ASC, rowid ASC",
    )
    .bind(event_id)
    .fetch_all(conn)
    .await
}

pub async fn insert_payment_method(
    conn: &mut SqliteConnection,
    method: &PaymentMethod,
    position: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO event_payment_methods (id, event_id, name, details, position) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(method.id)
    .bind(method.event_id)
    .bind(&method.name)
    .bind(&method.details)
    .bind(position)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn update_payment_method(
    conn: &mut SqliteConnection,
    method: &PaymentMethod,
    position: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE event_payment_methods SET name = ?, details = ?, position = ? \
         WHERE id = ? AND event_id = ?",
    )
    .bind(&method.name)
    .bind(&method.details)
    .bind(position)
    .bind(method.id)
    .bind(method.event_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete_payment_method(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM event_payment_methods WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn payment_method_in_use(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<bool, sqlx::Error> {
    let found: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM event_registrations WHERE payment_method_id = ? LIMIT 1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(found.is_some())
}

/// Drops both option lists of an event.
pub async fn delete_for_event(
    conn: &mut SqliteConnection,
    event_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let tickets = sqlx::query("DELETE FROM event_tickets WHERE event_id = ?")
        .bind(event_id)
        .execute(&mut *conn)
        .await?;
    let methods = sqlx::query("DELETE FROM event_payment_methods WHERE event_id = ?")
        .bind(event_id)
        .execute(&mut *conn)
        .await?;
    Ok(tickets.rows_affected() + methods.rows_affected())
}
