//! Artifact keys and their canonical on-disk locations
//!
//! Layout beneath the store root:
//!
//! ```text
//! {device_id}/{date}/
//! ├── raw/{HH-MM}.wav
//! ├── transcriptions/{HH-MM}.json
//! ├── sed/{HH-MM}.json
//! ├── opensmile/{HH-MM}.json
//! ├── prompt/emotion-timeline_gpt_prompt.json
//! ├── emotion-timeline/emotion-timeline.json
//! ├── sed-summary/result.json
//! └── opensmile-summary/result.json
//! ```
//!
//! This module is the only place that turns identifying fields into paths.
//! Handlers pick the [`Category`] by route, never from client input.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Fixed vocabulary of artifact kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Recorded audio (WAV), one file per time slot
    Raw,
    /// Speech-to-text output, one file per time slot
    Transcriptions,
    /// Prompt built from the day's transcriptions
    Prompt,
    /// Emotion timeline for the whole day
    EmotionTimeline,
    /// Sound event detection output, one file per time slot
    Sed,
    /// Sound event detection summary for the whole day
    SedSummary,
    /// OpenSMILE acoustic features, one file per time slot
    Opensmile,
    /// OpenSMILE feature summary for the whole day
    OpensmileSummary,
}

impl Category {
    /// Directory name used on disk
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Transcriptions => "transcriptions",
            Self::Prompt => "prompt",
            Self::EmotionTimeline => "emotion-timeline",
            Self::Sed => "sed",
            Self::SedSummary => "sed-summary",
            Self::Opensmile => "opensmile",
            Self::OpensmileSummary => "opensmile-summary",
        }
    }

    pub const fn all() -> &'static [Self] {
        &[
            Self::Raw,
            Self::Transcriptions,
            Self::Prompt,
            Self::EmotionTimeline,
            Self::Sed,
            Self::SedSummary,
            Self::Opensmile,
            Self::OpensmileSummary,
        ]
    }

    /// Slotted categories hold one file per `HH-MM` time block
    pub const fn is_slotted(&self) -> bool {
        matches!(
            self,
            Self::Raw | Self::Transcriptions | Self::Sed | Self::Opensmile
        )
    }

    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Raw => "wav",
            _ => "json",
        }
    }

    /// File name for singleton categories, `None` for slotted ones
    pub const fn fixed_file_name(&self) -> Option<&'static str> {
        match self {
            Self::Prompt => Some("emotion-timeline_gpt_prompt.json"),
            Self::EmotionTimeline => Some("emotion-timeline.json"),
            Self::SedSummary | Self::OpensmileSummary => Some("result.json"),
            Self::Raw | Self::Transcriptions | Self::Sed | Self::Opensmile => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::Validation(format!("Unknown category: {}", s)))
    }
}

/// Identifies one stored artifact
///
/// `device_id`, `date` and `slot` are opaque here. Shape checks for
/// client-supplied paths live in [`PathValidator`](super::PathValidator) and
/// containment is enforced by [`ArtifactStore::locate`](super::ArtifactStore::locate).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    device_id: String,
    date: String,
    category: Category,
    slot: Option<String>,
}

impl ArtifactKey {
    /// Build a key, requiring a slot exactly when the category is slotted
    pub fn new(
        device_id: impl Into<String>,
        date: impl Into<String>,
        category: Category,
        slot: Option<String>,
    ) -> Result<Self> {
        match (category.is_slotted(), slot.is_some()) {
            (true, false) => {
                return Err(Error::Validation(format!(
                    "Category '{}' requires a time slot",
                    category
                )))
            }
            (false, true) => {
                return Err(Error::Validation(format!(
                    "Category '{}' does not take a time slot",
                    category
                )))
            }
            _ => {}
        }

        Ok(Self {
            device_id: device_id.into(),
            date: date.into(),
            category,
            slot,
        })
    }

    pub fn slotted(
        device_id: impl Into<String>,
        date: impl Into<String>,
        category: Category,
        slot: impl Into<String>,
    ) -> Result<Self> {
        Self::new(device_id, date, category, Some(slot.into()))
    }

    pub fn singleton(
        device_id: impl Into<String>,
        date: impl Into<String>,
        category: Category,
    ) -> Result<Self> {
        Self::new(device_id, date, category, None)
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn slot(&self) -> Option<&str> {
        self.slot.as_deref()
    }

    /// `{slot}.{ext}` for slotted categories, the fixed name otherwise
    pub fn file_name(&self) -> String {
        match (&self.slot, self.category.fixed_file_name()) {
            (Some(slot), _) => format!("{}.{}", slot, self.category.extension()),
            (None, Some(fixed)) => fixed.to_string(),
            // Unreachable through the constructors
            (None, None) => format!("unnamed.{}", self.category.extension()),
        }
    }

    /// `{device_id}/{date}/{category}`
    pub fn category_dir(&self) -> String {
        category_dir(&self.device_id, &self.date, self.category)
    }

    /// `{device_id}/{date}/{category}/{file_name}`, always `/`-separated
    pub fn relative_path(&self) -> String {
        format!("{}/{}", self.category_dir(), self.file_name())
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.relative_path())
    }
}

/// Directory holding every artifact of `category` for one device and date
pub fn category_dir(device_id: &str, date: &str, category: Category) -> String {
    format!("{}/{}/{}", device_id, date, category.as_str())
}
