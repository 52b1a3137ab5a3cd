use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::auth::Actor;
use crate::db::{attachments, Database};
use crate::media::MediaStore;
use crate::models::attachment::Attachment;
use crate::utils::error::AppError;

/// What an attachment is about to be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentUse {
    CoverImage,
    ProofOfPayment,
}

#[derive(Clone)]
pub struct MediaLibrary {
    db: Database,
    store: MediaStore,
    max_upload_bytes: usize,
}

impl MediaLibrary {
    pub fn new(db: Database, store: MediaStore, max_upload_bytes: usize) -> Self {
        Self {
            db,
            store,
            max_upload_bytes,
        }
    }

    pub async fn upload(
        &self,
        actor: &Actor,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<Attachment, AppError> {
        if bytes.is_empty() {
            return Err(AppError::ValidationError("Uploaded file is empty".to_string()));
        }
        if bytes.len() > self.max_upload_bytes {
            return Err(AppError::ValidationError(format!(
                "Uploaded file exceeds {} bytes",
                self.max_upload_bytes
            )));
        }
        let extension = extension_for(content_type).ok_or_else(|| {
            AppError::ValidationError(format!("Unsupported file type '{}'", content_type))
        })?;

        let storage_key = self.store.put(extension, bytes).await?;
        let attachment = Attachment {
            id: Uuid::new_v4(),
            owner_id: actor.user_id,
            file_name: sanitize_file_name(file_name),
            content_type: content_type.to_string(),
            size_bytes: bytes.len() as i64,
            storage_key,
            created_at: Utc::now(),
        };

        if let Err(e) = self.record(&attachment).await {
            self.store.purge(&[attachment.storage_key.clone()]).await;
            return Err(e);
        }

        tracing::info!(
            attachment_id = %attachment.id,
            owner_id = %attachment.owner_id,
            size_bytes = attachment.size_bytes,
            "Attachment uploaded"
        );
        Ok(attachment)
    }

    async fn record(&self, attachment: &Attachment) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;
        attachments::insert_attachment(&mut tx, attachment).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn open(&self, attachment_id: Uuid) -> Result<(Attachment, Vec<u8>), AppError> {
        let mut conn = self.db.pool().acquire().await?;
        let attachment = attachments::find_attachment(&mut conn, attachment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Attachment {}", attachment_id)))?;
        drop(conn);

        let bytes = self.store.get(&attachment.storage_key).await?;
        Ok((attachment, bytes))
    }
}

/// Checks that `attachment_id` names an unused upload of `actor` suitable
/// for `usage`.
pub async fn require_owned_attachment(
    conn: &mut SqliteConnection,
    actor: &Actor,
    attachment_id: Uuid,
    usage: AttachmentUse,
) -> Result<Attachment, AppError> {
    let attachment = attachments::find_attachment(&mut *conn, attachment_id)
        .await?
        .ok_or_else(|| {
            AppError::ValidationError(format!("Attachment {} does not exist", attachment_id))
        })?;

    if attachment.owner_id != actor.user_id && !actor.is_admin() {
        return Err(AppError::ValidationError(format!(
            "Attachment {} was not uploaded by you",
            attachment_id
        )));
    }
    if usage == AttachmentUse::CoverImage && !attachment.content_type.starts_with("image/") {
        return Err(AppError::ValidationError(
            "Cover image must be an image".to_string(),
        ));
    }
    // Cancelling an event deletes its attachments, so each one has a single user.
    if attachments::is_in_use(&mut *conn, attachment_id).await? {
        return Err(AppError::ValidationError(format!(
            "Attachment {} is already in use, upload it again",
            attachment_id
        )));
    }
    Ok(attachment)
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "application/pdf" => Some("pdf"),
        _ => None,
    }
}

fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if base.is_empty() {
        "upload".to_string()
    } else {
        base.chars().take(255).collect()
    }
}
