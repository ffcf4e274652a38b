//! Path-keyed artifact store
//!
//! - [`key`]: maps `(device_id, date, category, slot)` to a canonical relative path
//! - [`validator`]: shape and traversal checks for client-supplied paths
//! - [`artifact_store`]: file I/O beneath the configured root
//! - [`tree`]: ordered recursive listing for rendering

pub mod artifact_store;
pub mod key;
pub mod tree;
pub mod validator;

pub use artifact_store::{ArtifactStore, SlotListing};
pub use key::{category_dir, ArtifactKey, Category};
pub use tree::{FileKind, NodeKind, TreeLister, TreeNode};
pub use validator::{AudioPath, PathValidator, AUDIO_PATH_FORMAT};
