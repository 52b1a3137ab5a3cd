use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::models::attachment::Attachment;

pub async fn insert_attachment(
    conn: &mut SqliteConnection,
    attachment: &Attachment,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO attachments (id, owner_id, file_name, content_type, size_bytes, \
         storage_key, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(attachment.id)
    .bind(attachment.owner_id)
    .bind(&attachment.file_name)
    .bind(&attachment.content_type)
    .bind(attachment.size_bytes)
    .bind(&attachment.storage_key)
    .bind(attachment.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn find_attachment(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<Option<Attachment>, sqlx::Error> {
    sqlx::query_as::<_, Attachment>(
        "SELECT id, owner_id, file_name, content_type, size_bytes, storage_key, created_at \
         FROM attachments WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// True when an event cover or a registration proof points at the attachment.
pub async fn is_in_use(conn: &mut SqliteConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM events WHERE cover_image_id = ?) \
         OR EXISTS(SELECT 1 FROM event_registrations WHERE proof_id = ?)",
    )
    .bind(id)
    .bind(id)
    .fetch_one(conn)
    .await
}

/// Deletes the row and hands back its storage key so the blob can be
/// removed once the surrounding transaction commits.
pub async fn delete_attachment(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("DELETE FROM attachments WHERE id = ? RETURNING storage_key")
        .bind(id)
        .fetch_optional(conn)
        .await
}
