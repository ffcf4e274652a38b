//! Download endpoints
//!
//! Keyed downloads (`/download`, `/download-sed`, `/download-opensmile`) build
//! the path from query fields. `/download-file` takes an explicit relative path,
//! which is traversal-checked before it reaches the store.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::debug;
use vault_common::store::FileKind;
use vault_common::{ArtifactKey, Category, PathValidator};

use crate::{
    error::{ApiError, ApiResult},
    AppState,
};

/// Query for slotted downloads
#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub device_id: String,
    pub date: String,
    pub slot: String,
    /// Legacy field, accepted and ignored
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Query for path-addressed endpoints
#[derive(Debug, Deserialize)]
pub struct FilePathQuery {
    pub file_path: String,
}

/// Content type for a stored file name
pub fn content_type_for(name: &str) -> &'static str {
    match FileKind::from_name(name) {
        FileKind::Audio => "audio/wav",
        FileKind::Json => "application/json",
        FileKind::Other => "application/octet-stream",
    }
}

/// Attachment response carrying raw file bytes
pub fn attachment(bytes: Vec<u8>, file_name: &str) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", file_name.replace('"', "_"));
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type_for(file_name).to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Bytes::from(bytes),
    )
        .into_response()
}

async fn download_slot(
    state: &AppState,
    query: &SlotQuery,
    category: Category,
    not_found: impl FnOnce(&ArtifactKey) -> String,
) -> ApiResult<Response> {
    let key = ArtifactKey::slotted(&*query.device_id, &*query.date, category, &*query.slot)?;
    debug!(path = %key, "Keyed download");

    let bytes = state
        .store
        .get_artifact(&key)
        .await
        .map_err(|e| ApiError::from(e).not_found_as(not_found(&key)))?;

    Ok(attachment(bytes, &key.file_name()))
}

/// GET /download?device_id=&date=&slot=
///
/// Returns the raw WAV recording for one slot.
pub async fn download_audio(
    State(state): State<AppState>,
    Query(query): Query<SlotQuery>,
) -> ApiResult<Response> {
    download_slot(&state, &query, Category::Raw, |_| "File not found".to_string()).await
}

/// GET /download-sed?device_id=&date=&slot=
pub async fn download_sed(
    State(state): State<AppState>,
    Query(query): Query<SlotQuery>,
) -> ApiResult<Response> {
    download_slot(&state, &query, Category::Sed, |key| {
        format!("SED file not found: {}", key)
    })
    .await
}

/// GET /download-opensmile?device_id=&date=&slot=
pub async fn download_opensmile(
    State(state): State<AppState>,
    Query(query): Query<SlotQuery>,
) -> ApiResult<Response> {
    download_slot(&state, &query, Category::Opensmile, |key| {
        format!("OpenSMILE file not found: {}", key)
    })
    .await
}

/// GET /download-file?file_path=
///
/// Downloads any stored file by relative path.
pub async fn download_file(
    State(state): State<AppState>,
    Query(query): Query<FilePathQuery>,
) -> ApiResult<Response> {
    PathValidator::check_components(&query.file_path)?;

    let bytes = state
        .store
        .get(&query.file_path)
        .await
        .map_err(|e| ApiError::from(e).not_found_as("File not found"))?;

    let file_name = query
        .file_path
        .rsplit('/')
        .next()
        .unwrap_or(&query.file_path);

    Ok(attachment(bytes, file_name))
}

/// Build download routes
pub fn download_routes() -> Router<AppState> {
    Router::new()
        .route("/download", get(download_audio))
        .route("/download-sed", get(download_sed))
        .route("/download-opensmile", get(download_opensmile))
        .route("/download-file", get(download_file))
}
