//! HTTP API handlers for vault-api

pub mod download;
pub mod health;
pub mod logs;
pub mod status;
pub mod upload;

pub use download::download_routes;
pub use health::health_routes;
pub use logs::logs_routes;
pub use status::status_routes;
pub use upload::upload_routes;
