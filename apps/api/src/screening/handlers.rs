use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::models::screening::JobDescription;
use crate::ranking::RankedResultSet;
use crate::screening::session::{SessionError, UploadSession, MAX_FILES};
use crate::state::AppState;

/// POST /screen
///
/// Multipart form: `files` (1–5 PDF/DOCX) and `jd_text`. The whole upload is validated
/// before any extraction starts.
pub async fn handle_screen(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<RankedResultSet>, AppError> {
    let mut session = UploadSession::new(state.config.max_upload_bytes);
    let mut jd_text: Option<String> = None;
    let mut file_parts = 0usize;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("files") => {
                file_parts += 1;
                if file_parts > MAX_FILES {
                    return Err(SessionError::TooManyFiles.into());
                }
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                session = session.add(&filename, bytes)?;
            }
            Some("jd_text") => jd_text = Some(field.text().await?),
            other => debug!("Ignoring multipart field {other:?}"),
        }
    }

    let jd_text = jd_text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("jd_text is required".to_string()))?;
    if session.is_empty() {
        return Err(AppError::Validation(
            "at least one resume file is required".to_string(),
        ));
    }

    info!("Screening request: {:?}", session.filenames());
    let screener = Arc::clone(&state.screener);
    let timeout = state.config.screen_timeout;
    let run = screener.screen(session.into_documents(), JobDescription::new(jd_text));

    // Dropping `run` on expiry aborts every in-flight task of the batch.
    let ranked = tokio::time::timeout(timeout, run)
        .await
        .map_err(|_| AppError::Timeout(timeout.as_secs()))?;

    Ok(Json(ranked))
}
