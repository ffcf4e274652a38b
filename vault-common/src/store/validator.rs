//! Validation of client-supplied relative paths
//!
//! Two checks exist:
//! - [`PathValidator::validate_audio_path`]: exact `device_id/YYYY-MM-DD/raw/HH-MM.wav`
//!   shape for the audio upload header
//! - [`PathValidator::check_components`]: per-segment traversal rejection for
//!   every caller-specified path
//!
//! Neither canonicalizes. Containment under the root, including symlink
//! escapes, is enforced afterwards by [`ArtifactStore::locate`](super::ArtifactStore::locate).

use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use super::key::{ArtifactKey, Category};
use crate::{Error, Result};

/// Expected audio path shape, as reported to clients
pub const AUDIO_PATH_FORMAT: &str = "device_id/YYYY-MM-DD/raw/HH-MM.wav";

/// Components of a validated audio upload path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPath {
    pub device_id: String,
    pub date: String,
    pub slot: String,
}

impl AudioPath {
    pub fn key(&self) -> Result<ArtifactKey> {
        ArtifactKey::slotted(&*self.device_id, &*self.date, Category::Raw, &*self.slot)
    }
}

/// Validator for caller-specified relative paths
pub struct PathValidator;

impl PathValidator {
    /// Validate the audio upload path and split it into its parts
    ///
    /// Hour and minute are not range-checked: `99-99` is accepted.
    pub fn validate_audio_path(path: &str) -> Result<AudioPath> {
        let parsed = parse_audio_path(path).ok_or_else(|| {
            warn!(path = %path, "Rejected audio path with invalid format");
            Error::Validation(format!(
                "Invalid file path format. Expected: {}",
                AUDIO_PATH_FORMAT
            ))
        })?;

        Self::check_components(path)?;
        Ok(parsed)
    }

    /// Reject traversal attempts in a `/`-separated relative path
    ///
    /// Rejects an empty path, a leading `/`, NUL bytes, and any segment that
    /// contains `..` or starts with `/` or `\`.
    pub fn check_components(path: &str) -> Result<()> {
        let rejected = path.is_empty()
            || path.starts_with('/')
            || path.contains('\0')
            || path
                .split('/')
                .any(|part| part.contains("..") || part.starts_with('/') || part.starts_with('\\'));

        if rejected {
            warn!(path = %path, "Rejected path with invalid components");
            return Err(Error::Validation(
                "Invalid path components detected".to_string(),
            ));
        }

        Ok(())
    }
}

/// Device, date and slot captured from an audio upload path
const AUDIO_PATH_PATTERN: &str =
    r"^([a-zA-Z0-9_-]+)/([0-9]{4}-[0-9]{2}-[0-9]{2})/raw/([0-9]{2}-[0-9]{2})\.wav$";

static AUDIO_PATH_RE: OnceLock<Option<Regex>> = OnceLock::new();

fn audio_path_regex() -> Option<&'static Regex> {
    AUDIO_PATH_RE
        .get_or_init(|| Regex::new(AUDIO_PATH_PATTERN).ok())
        .as_ref()
}

fn parse_audio_path(path: &str) -> Option<AudioPath> {
    let caps = audio_path_regex()?.captures(path)?;

    Some(AudioPath {
        device_id: caps.get(1)?.as_str().to_string(),
        date: caps.get(2)?.as_str().to_string(),
        slot: caps.get(3)?.as_str().to_string(),
    })
}
