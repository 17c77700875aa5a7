//! Construction parameters for a runtime.

use crate::checkpoint::CheckpointFormat;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU64;
use std::path::PathBuf;

/// Directory used for checkpoints when none is configured.
pub const DEFAULT_CHECKPOINT_DIR: &str = "./data";

/// Checkpoint configuration and resume source for a [`Runtime`](super::Runtime).
///
/// Missing fields take their defaults when deserialized, so a config file
/// only needs the values it changes.
///
/// # Example
///
/// ```rust
/// use statecraft::checkpoint::CheckpointFormat;
/// use statecraft::runtime::RuntimeConfig;
/// use std::num::NonZeroU64;
///
/// let config = RuntimeConfig::new()
///     .checkpoint_dir("/var/lib/turnstile")
///     .checkpoint_every(NonZeroU64::new(100).unwrap())
///     .format(CheckpointFormat::Json)
///     .keep_history();
///
/// assert!(!config.replace_checkpoint);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Directory holding checkpoint files, created on first write.
    pub checkpoint_dir: PathBuf,

    /// Checkpoint after every N processed events. `None` checkpoints only
    /// when a run ends.
    pub checkpoint_every: Option<NonZeroU64>,

    /// Overwrite one canonical file (`true`) or keep every snapshot.
    pub replace_checkpoint: bool,

    pub format: CheckpointFormat,

    /// Resume from this snapshot instead of starting fresh. When set, it
    /// supersedes every other construction input.
    pub resume_from: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: PathBuf::from(DEFAULT_CHECKPOINT_DIR),
            checkpoint_every: None,
            replace_checkpoint: true,
            format: CheckpointFormat::default(),
            resume_from: None,
        }
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn checkpoint_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.checkpoint_dir = dir.into();
        self
    }

    pub fn checkpoint_every(mut self, events: NonZeroU64) -> Self {
        self.checkpoint_every = Some(events);
        self
    }

    pub fn replace_checkpoint(mut self, replace: bool) -> Self {
        self.replace_checkpoint = replace;
        self
    }

    /// Write a new timestamped snapshot on every checkpoint.
    pub fn keep_history(self) -> Self {
        self.replace_checkpoint(false)
    }

    pub fn format(mut self, format: CheckpointFormat) -> Self {
        self.format = format;
        self
    }

    pub fn resume_from(mut self, path: impl Into<PathBuf>) -> Self {
        self.resume_from = Some(path.into());
        self
    }
}
