//! vault-api library - file exchange service for recordings and analysis results
//!
//! Exposes the router and state for the binary and for integration tests.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::trace::TraceLayer;
use vault_common::config::VaultConfig;
use vault_common::{ArtifactStore, TreeLister};

pub mod api;
pub mod error;

pub use crate::error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Store rooted at the configured base directory
    pub store: ArtifactStore,
    /// Resolved configuration, fixed at startup
    pub config: Arc<VaultConfig>,
}

impl AppState {
    pub fn new(config: VaultConfig) -> Self {
        Self {
            store: ArtifactStore::new(config.root_folder.clone()),
            config: Arc::new(config),
        }
    }

    pub fn tree_lister(&self) -> TreeLister {
        TreeLister::new(self.store.root())
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .merge(api::upload_routes())
        .merge(api::download_routes())
        .merge(api::logs_routes())
        .merge(api::status_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
