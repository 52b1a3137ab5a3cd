use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::models::registration::{
    EventRegistrationRow, Registration, RegistrationStatus, UserRegistrationRow,
};

const REGISTRATION_COLUMNS: &str =
    "id, user_id, event_id, ticket_id, payment_method_id, proof_id, status, created_at, updated_at";

pub async fn insert_registration(
    conn: &mut SqliteConnection,
    registration: &Registration,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO event_registrations (id, user_id, event_id, ticket_id, payment_method_id, \
         proof_id, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(registration.id)
    .bind(registration.user_id)
    .bind(registration.event_id)
    .bind(registration.ticket_id)
    .bind(registration.payment_method_id)
    .bind(registration.proof_id)
    .bind(registration.status)
    .bind(registration.created_at)
    .bind(registration.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn find_registration(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<Option<Registration>, sqlx::Error> {
    sqlx::query_as::<_, Registration>(&format!(
        "SELECT {REGISTRATION_COLUMNS} FROM event_registrations WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn update_status(
    conn: &mut SqliteConnection,
    id: Uuid,
    status: RegistrationStatus,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("UPDATE event_registrations SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(now)
            .bind(id)
            .execute(conn)
            .await?;
    Ok(result.rows_affected())
}

/// Compare-and-swap: only writes when the row still has `expected`.
pub async fn update_status_if(
    conn: &mut SqliteConnection,
    id: Uuid,
    expected: RegistrationStatus,
    status: RegistrationStatus,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE event_registrations SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
    )
    .bind(status)
    .bind(now)
    .bind(id)
    .bind(expected)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn list_for_event(
    conn: &mut SqliteConnection,
    event_id: Uuid,
) -> Result<Vec<EventRegistrationRow>, sqlx::Error> {
    sqlx::query_as::<_, EventRegistrationRow>(
        "SELECT r.id, r.user_id, r.status, r.proof_id, r.created_at, \
                r.ticket_id, t.name AS ticket_name, \
                r.payment_method_id, pm.name AS payment_method_name, \
                p.display_name AS registrant_name, p.email AS registrant_email, \
                p.contact_number AS contact_number \
         FROM event_registrations r \
         JOIN event_tickets t ON t.id = r.ticket_id \
         JOIN event_payment_methods pm ON pm.id = r.payment_method_id \
         LEFT JOIN user_profiles p ON p.id = r.user_id \
         WHERE r.event_id = ? \
         ORDER BY r.created_at DESC, r.rowid DESC",
    )
    .bind(event_id)
    .fetch_all(conn)
    .await
}

pub async fn list_for_user(
    conn: &mut SqliteConnection,
    user_id: Uuid,
) -> Result<Vec<UserRegistrationRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRegistrationRow>(
        "SELECT r.id, r.status, r.created_at, \
                e.id AS event_id, e.slug AS event_slug, e.title AS event_title, \
                e.location AS event_location, e.start_at, e.end_at, \
                t.name AS ticket_name, pm.name AS payment_method_name, \
                g.token AS guest_token, g.status AS guest_status \
         FROM event_registrations r \
         JOIN events e ON e.id = r.event_id \
         JOIN event_tickets t ON t.id = r.ticket_id \
         JOIN event_payment_methods pm ON pm.id = r.payment_method_id \
         LEFT JOIN event_guests g ON g.registration_id = r.id \
         WHERE r.user_id = ? \
         ORDER BY e.start_at ASC, r.rowid ASC",
    )
    .bind(user_id)
    .fetch_all(conn)
    .await
}

/// Proof-of-payment attachments referenced by an event's registrations.
pub async fn proof_ids_for_event(
    conn: &mut SqliteConnection,
    event_id: Uuid,
) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT proof_id FROM event_registrations WHERE event_id = ? AND proof_id IS NOT NULL",
    )
    .bind(event_id)
    .fetch_all(conn)
    .await
}

pub async fn delete_for_event(
    conn: &mut SqliteConnection,
    event_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM event_registrations WHERE event_id = ?")
        .bind(event_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
