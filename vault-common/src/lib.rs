//! # WatchMe Vault Common Library
//!
//! Shared code for the vault service:
//! - Error taxonomy
//! - Configuration loading and root folder resolution
//! - Path-keyed artifact store (key resolution, path validation, file I/O)
//! - Directory tree listing for the status page

pub mod config;
pub mod error;
pub mod store;

pub use error::{Error, Result};
pub use store::{ArtifactKey, ArtifactStore, Category, PathValidator, TreeLister};
