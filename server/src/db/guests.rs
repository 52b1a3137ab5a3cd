use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::models::guest::{Guest, GuestStatus};

const GUEST_COLUMNS: &str =
    "id, registration_id, name, email, contact_number, token, status, created_at, updated_at";

pub async fn find_by_registration(
    conn: &mut SqliteConnection,
    registration_id: Uuid,
) -> Result<Option<Guest>, sqlx::Error> {
    sqlx::query_as::<_, Guest>(&format!(
        "SELECT {GUEST_COLUMNS} FROM event_guests WHERE registration_id = ?"
    ))
    .bind(registration_id)
    .fetch_optional(conn)
    .await
}

pub async fn find_guest(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<Option<Guest>, sqlx::Error> {
    sqlx::query_as::<_, Guest>(&format!("SELECT {GUEST_COLUMNS} FROM event_guests WHERE id = ?"))
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn find_by_token(
    conn: &mut SqliteConnection,
    token: &str,
) -> Result<Option<Guest>, sqlx::Error> {
    sqlx::query_as::<_, Guest>(&format!(
        "SELECT {GUEST_COLUMNS} FROM event_guests WHERE token = ?"
    ))
    .bind(token)
    .fetch_optional(conn)
    .await
}

/// Fails with a UNIQUE violation on a token collision or a second guest
/// for the same registration.
pub async fn insert_guest(conn: &mut SqliteConnection, guest: &Guest) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO event_guests (id, registration_id, name, email, contact_number, token, \
         status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(guest.id)
    .bind(guest.registration_id)
    .bind(&guest.name)
    .bind(&guest.email)
    .bind(&guest.contact_number)
    .bind(&guest.token)
    .bind(guest.status)
    .bind(guest.created_at)
    .bind(guest.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn update_status(
    conn: &mut SqliteConnection,
    id: Uuid,
    status: GuestStatus,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE event_guests SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(now)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Guests of an event, newest first.
pub async fn list_for_event(
    conn: &mut SqliteConnection,
    event_id: Uuid,
) -> Result<Vec<Guest>, sqlx::Error> {
    sqlx::query_as::<_, Guest>(
        "SELECT g.id, g.registration_id, g.name, g.email, g.contact_number, g.token, \
                g.status, g.created_at, g.updated_at \
         FROM event_guests g \
         JOIN event_registrations r ON r.id = g.registration_id \
         WHERE r.event_id = ? \
         ORDER BY g.created_at DESC, g.rowid DESC",
    )
    .bind(event_id)
    .fetch_all(conn)
    .await
}

/// The event a guest belongs to, through its registration.
pub async fn event_id_for_guest(
    conn: &mut SqliteConnection,
    guest_id: Uuid,
) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT r.event_id FROM event_guests g \
         JOIN event_registrations r ON r.id = g.registration_id WHERE g.id = ?",
    )
    .bind(guest_id)
    .fetch_optional(conn)
    .await
}

/// Removes every guest whose registration belongs to the event.
pub async fn delete_for_event(
    conn: &mut SqliteConnection,
    event_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM event_guests WHERE registration_id IN \
         (SELECT id FROM event_registrations WHERE event_id = ?)",
    )
    .bind(event_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}
