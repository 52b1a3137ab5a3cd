use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::auth::Actor;
use crate::handlers::parse_id;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::created;

const FILE_FIELD: &str = "file";

/// Accepts a multipart form with a single `file` part.
pub async fn upload(
    State(state): State<AppState>,
    actor: Actor,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::ValidationError(format!("Malformed upload: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::ValidationError(format!("Malformed upload: {}", e)))?;

        let attachment = state
            .media_library()
            .upload(&actor, &file_name, &content_type, &bytes)
            .await?;
        return Ok(created(attachment, "File uploaded"));
    }

    Err(AppError::ValidationError(format!(
        "Missing '{}' part in upload",
        FILE_FIELD
    )))
}

pub async fn download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let attachment_id = parse_id(&id, "Attachment")?;
    let (attachment, bytes) = state.media_library().open(attachment_id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, attachment.content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", attachment.file_name.replace('"', "")),
            ),
        ],
        bytes,
    )
        .into_response())
}
