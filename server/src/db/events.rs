use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::models::event::Event;

const EVENT_COLUMNS: &str = "id, slug, organizer_id, title, description, location, \
     start_date, start_time, end_date, end_time, start_at, end_at, \
     cover_image_id, created_at, updated_at";

pub async fn slug_exists(conn: &mut SqliteConnection, slug: &str) -> Result<bool, sqlx::Error> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM events WHERE slug = ?")
        .bind(slug)
        .fetch_optional(conn)
        .await?;
    Ok(found.is_some())
}

pub async fn insert_event(conn: &mut SqliteConnection, event: &Event) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO events (id, slug, organizer_id, title, description, location, \
         start_date, start_time, end_date, end_time, start_at, end_at, cover_image_id, \
         created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(event.id)
    .bind(&event.slug)
    .bind(event.organizer_id)
    .bind(&event.title)
    .bind(&event.description)
    .bind(&event.location)
    .bind(event.start_date)
    .bind(event.start_time)
    .bind(event.end_date)
    .bind(event.end_time)
    .bind(event.start_at)
    .bind(event.end_at)
    .bind(event.cover_image_id)
    .bind(event.created_at)
    .bind(event.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Writes every editable column. Slug, organizer and creation time are left alone.
pub async fn update_event(conn: &mut SqliteConnection, event: &Event) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE events SET title = ?, description = ?, location = ?, \
         start_date = ?, start_time = ?, end_date = ?, end_time = ?, \
         start_at = ?, end_at = ?, cover_image_id = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&event.title)
    .bind(&event.description)
    .bind(&event.location)
    .bind(event.start_date)
    .bind(event.start_time)
    .bind(event.end_date)
    .bind(event.end_time)
    .bind(event.start_at)
    .bind(event.end_at)
    .bind(event.cover_image_id)
    .bind(event.updated_at)
    .bind(event.id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn find_event(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<Option<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?"))
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn find_event_by_slug(
    conn: &mut SqliteConnection,
    slug: &str,
) -> Result<Option<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE slug = ?"))
        .bind(slug)
        .fetch_optional(conn)
        .await
}

pub async fn list_by_organizer(
    conn: &mut SqliteConnection,
    organizer_id: Uuid,
) -> Result<Vec<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>(&format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE organizer_id = ? ORDER BY start_at ASC"
    ))
    .bind(organizer_id)
    .fetch_all(conn)
    .await
}

/// Events still running or yet to start, soonest first.
pub async fn list_ending_after(
    conn: &mut SqliteConnection,
    now: DateTime<Utc>,
) -> Result<Vec<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>(&format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE end_at >= ? ORDER BY start_at ASC"
    ))
    .bind(now)
    .fetch_all(conn)
    .await
}

pub async fn delete_event(conn: &mut SqliteConnection, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM events WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
