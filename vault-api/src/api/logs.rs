//! Analysis fetch endpoints for dashboards
//!
//! Every route exists twice: under `/api/devices/:device_id/...` and under the
//! legacy `/api/users/:user_id/...`. Both bind the first path segment to the
//! same identifier and resolve to the same store path.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use tracing::debug;
use vault_common::store::SlotListing;
use vault_common::{ArtifactKey, Category};

use crate::{
    error::{ApiError, ApiResult},
    AppState,
};

async fn fetch_json(state: &AppState, key: ArtifactKey, not_found: String) -> ApiResult<Json<Value>> {
    debug!(path = %key, "Fetching analysis document");
    state
        .store
        .read_artifact_json(&key)
        .await
        .map(Json)
        .map_err(|e| ApiError::from(e).not_found_as(not_found))
}

/// GET /api/devices/:device_id/logs/:date/emotion-timeline
pub async fn get_emotion_timeline(
    State(state): State<AppState>,
    Path((device_id, date)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let key = ArtifactKey::singleton(device_id, date, Category::EmotionTimeline)?;
    fetch_json(&state, key, "Emotion timeline file not found".to_string()).await
}

/// GET /api/devices/:device_id/logs/:date/sed-summary
pub async fn get_sed_summary(
    State(state): State<AppState>,
    Path((device_id, date)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let key = ArtifactKey::singleton(device_id, date, Category::SedSummary)?;
    fetch_json(&state, key, "SED summary file not found".to_string()).await
}

/// GET /api/devices/:device_id/logs/:date/opensmile-summary
pub async fn get_opensmile_summary(
    State(state): State<AppState>,
    Path((device_id, date)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let key = ArtifactKey::singleton(device_id, date, Category::OpensmileSummary)?;
    fetch_json(&state, key, "OpenSMILE summary file not found".to_string()).await
}

/// GET /api/devices/:device_id/logs/:date/opensmile/:time_slot
pub async fn get_opensmile_features(
    State(state): State<AppState>,
    Path((device_id, date, time_slot)): Path<(String, String, String)>,
) -> ApiResult<Json<Value>> {
    let not_found = format!("OpenSMILE features file not found for slot {}", time_slot);
    let key = ArtifactKey::slotted(device_id, date, Category::Opensmile, time_slot)?;
    fetch_json(&state, key, not_found).await
}

/// GET /api/devices/:device_id/logs/:date/opensmile
///
/// Lists available feature slots in time order.
pub async fn list_opensmile_features(
    State(state): State<AppState>,
    Path((device_id, date)): Path<(String, String)>,
) -> ApiResult<Json<SlotListing>> {
    let listing = state
        .store
        .opensmile_slot_listing(&device_id, &date)
        .await?;
    Ok(Json(listing))
}

fn id_routes(prefix: &str) -> Router<AppState> {
    Router::new()
        .route(
            &format!("{}/logs/:date/emotion-timeline", prefix),
            get(get_emotion_timeline),
        )
        .route(
            &format!("{}/logs/:date/sed-summary", prefix),
            get(get_sed_summary),
        )
        .route(
            &format!("{}/logs/:date/opensmile-summary", prefix),
            get(get_opensmile_summary),
        )
        .route(
            &format!("{}/logs/:date/opensmile", prefix),
            get(list_opensmile_features),
        )
        .route(
            &format!("{}/logs/:date/opensmile/:time_slot", prefix),
            get(get_opensmile_features),
        )
}

/// Build analysis fetch routes, including the legacy `user_id` aliases
pub fn logs_routes() -> Router<AppState> {
    Router::new()
        .merge(id_routes("/api/devices/:device_id"))
        .merge(id_routes("/api/users/:user_id"))
}
