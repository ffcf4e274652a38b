//! Upload endpoints
//!
//! All uploads are `multipart/form-data` with a `file` part plus text fields.
//! The target category is fixed by the route; clients only supply the
//! identifying fields. The legacy `user_id` and `timestamp` fields are
//! accepted and ignored.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Multipart, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::info;
use vault_common::{ArtifactKey, Category, PathValidator};

use crate::{
    error::{ApiError, ApiResult},
    AppState,
};

/// Header carrying the client-chosen relative path for audio uploads
pub const FILE_PATH_HEADER: &str = "x-file-path";

/// Upload success response
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    /// Absolute path of the stored file
    pub path: String,
    pub device_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<&'static str>,
}

struct UploadedFile {
    file_name: String,
    bytes: Bytes,
}

/// Text fields and the `file` part of a multipart upload
struct UploadForm {
    fields: HashMap<String, String>,
    file: Option<UploadedFile>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = Self {
            fields: HashMap::new(),
            file: None,
        };

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                form.file = Some(UploadedFile { file_name, bytes });
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    fn require(&self, name: &str) -> ApiResult<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::BadRequest(format!("Missing required field: {}", name)))
    }

    fn take_file(&mut self) -> ApiResult<UploadedFile> {
        self.file
            .take()
            .ok_or_else(|| ApiError::BadRequest("Missing required field: file".to_string()))
    }
}

/// How a keyed upload maps onto the store
struct UploadTarget {
    category: Category,
    /// Form field holding the `HH-MM` slot, for slotted categories
    slot_field: Option<&'static str>,
    json_only: bool,
    status: &'static str,
}

async fn store_keyed_upload(
    state: &AppState,
    multipart: Multipart,
    target: UploadTarget,
) -> ApiResult<Json<UploadResponse>> {
    let mut form = UploadForm::read(multipart).await?;

    let device_id = form.require("device_id")?.to_string();
    let date = form.require("date")?.to_string();
    let slot = match target.slot_field {
        Some(field) => Some(form.require(field)?.to_string()),
        None => None,
    };
    let file = form.take_file()?;

    if target.json_only && !file.file_name.ends_with(".json") {
        return Err(ApiError::BadRequest("Only .json files allowed".to_string()));
    }

    let key = ArtifactKey::new(&*device_id, date, target.category, slot)?;
    let saved = state.store.put_artifact(&key, &file.bytes).await?;

    info!(
        device_id = %device_id,
        category = %target.category,
        path = %saved.display(),
        bytes = file.bytes.len(),
        "Stored upload"
    );

    Ok(Json(UploadResponse {
        status: target.status,
        path: saved.display().to_string(),
        device_id,
        file_path: None,
        method: None,
    }))
}

/// POST /upload
///
/// Stores a WAV recording at the relative path given in `X-File-Path`,
/// which must be `device_id/YYYY-MM-DD/raw/HH-MM.wav`.
pub async fn upload_audio(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let file_path = headers
        .get(FILE_PATH_HEADER)
        .map(|v| {
            v.to_str()
                .map(str::to_string)
                .map_err(|_| ApiError::BadRequest("X-File-Path header is not valid text".to_string()))
        })
        .transpose()?
        .ok_or_else(|| {
            ApiError::BadRequest("X-File-Path header is required for audio file uploads".to_string())
        })?;

    let audio = PathValidator::validate_audio_path(&file_path)?;

    let mut form = UploadForm::read(multipart).await?;
    let device_id = form.require("device_id")?.to_string();
    let file = form.take_file()?;

    let saved = state.store.put_artifact(&audio.key()?, &file.bytes).await?;

    info!(
        device_id = %device_id,
        file_path = %file_path,
        path = %saved.display(),
        bytes = file.bytes.len(),
        "Stored audio upload"
    );

    Ok(Json(UploadResponse {
        status: "ok",
        path: saved.display().to_string(),
        device_id,
        file_path: Some(file_path),
        method: Some("client_specified"),
    }))
}

/// POST /upload-transcription
pub async fn upload_transcription(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    store_keyed_upload(
        &state,
        multipart,
        UploadTarget {
            category: Category::Transcriptions,
            slot_field: Some("time_block"),
            json_only: false,
            status: "success",
        },
    )
    .await
}

/// POST /upload-prompt
pub async fn upload_prompt(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    store_keyed_upload(&state, multipart, singleton_json(Category::Prompt)).await
}

/// POST /upload/analysis/emotion-timeline
pub async fn upload_emotion_timeline(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    store_keyed_upload(&state, multipart, singleton_json(Category::EmotionTimeline)).await
}

/// POST /upload/analysis/sed-timeline
pub async fn upload_sed_timeline(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    store_keyed_upload(&state, multipart, slotted_json(Category::Sed, "time_block")).await
}

/// POST /upload/analysis/sed-summary
pub async fn upload_sed_summary(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    store_keyed_upload(&state, multipart, singleton_json(Category::SedSummary)).await
}

/// POST /upload/analysis/opensmile-features
pub async fn upload_opensmile_features(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    store_keyed_upload(&state, multipart, slotted_json(Category::Opensmile, "time_slot")).await
}

/// POST /upload/analysis/opensmile-summary
pub async fn upload_opensmile_summary(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    store_keyed_upload(&state, multipart, singleton_json(Category::OpensmileSummary)).await
}

fn singleton_json(category: Category) -> UploadTarget {
    UploadTarget {
        category,
        slot_field: None,
        json_only: true,
        status: "ok",
    }
}

fn slotted_json(category: Category, slot_field: &'static str) -> UploadTarget {
    UploadTarget {
        category,
        slot_field: Some(slot_field),
        json_only: true,
        status: "ok",
    }
}

/// Build upload routes
pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_audio))
        .route("/upload-transcription", post(upload_transcription))
        .route("/upload-prompt", post(upload_prompt))
        .route("/upload/analysis/emotion-timeline", post(upload_emotion_timeline))
        .route("/upload/analysis/sed-timeline", post(upload_sed_timeline))
        .route("/upload/analysis/sed-summary", post(upload_sed_summary))
        .route("/upload/analysis/opensmile-features", post(upload_opensmile_features))
        .route("/upload/analysis/opensmile-summary", post(upload_opensmile_summary))
}
