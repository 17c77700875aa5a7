//! Checkpoint and resume functionality for FSM runtimes.
//!
//! A [`Checkpoint`] captures exactly the resumable fields of a runtime:
//! the internal context, the user context, the processed-event count and
//! the checkpoint configuration. Snapshots are versioned, tagged records
//! written either as JSON (readable, diffable) or as compact binary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};

pub mod error;
pub mod store;

pub use error::CheckpointError;
pub use store::{canonical_path, history_path};

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// On-disk encoding of a checkpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointFormat {
    #[default]
    Binary,
    Json,
}

impl CheckpointFormat {
    /// File extension used for this format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Binary => "bin",
            Self::Json => "json",
        }
    }

    /// Infer the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "bin" => Some(Self::Binary),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Infer the format from file contents.
    fn sniff(bytes: &[u8]) -> Self {
        match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'{') => Self::Json,
            _ => Self::Binary,
        }
    }
}

/// Runtime-owned context fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalContext {
    pub current_state: String,
}

/// Serializable snapshot of a runtime.
/// Does NOT include states or callables; those come from the schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: String,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    /// FSM type name of the schema that produced it
    pub fsm_name: String,

    /// Reserved context fields
    pub context: InternalContext,

    /// User context data
    pub user_context: Map<String, Value>,

    /// Events processed so far
    pub events_processed: u64,

    /// Canonical checkpoint path of the runtime
    pub checkpoint_path: PathBuf,

    /// Checkpoint cadence in processed events
    pub checkpoint_every: Option<NonZeroU64>,

    /// Replace policy (`false` keeps a history of snapshots)
    pub replace_checkpoint: bool,
}

/// Binary layout. bincode is not self-describing, so the open user map
/// travels as embedded JSON text.
#[derive(Serialize, Deserialize)]
struct BinaryRecord {
    version: u32,
    id: String,
    timestamp: DateTime<Utc>,
    fsm_name: String,
    current_state: String,
    user_context: String,
    events_processed: u64,
    checkpoint_path: PathBuf,
    checkpoint_every: Option<NonZeroU64>,
    replace_checkpoint: bool,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

impl Checkpoint {
    /// Encode with the given format.
    pub fn encode(&self, format: CheckpointFormat) -> Result<Vec<u8>, CheckpointError> {
        match format {
            CheckpointFormat::Json => serde_json::to_vec_pretty(self).map_err(serialization_failed),
            CheckpointFormat::Binary => {
                let user_context = serde_json::to_string(&self.user_context)
                    .map_err(serialization_failed)?;
                let record = BinaryRecord {
                    version: self.version,
                    id: self.id.clone(),
                    timestamp: self.timestamp,
                    fsm_name: self.fsm_name.clone(),
                    current_state: self.context.current_state.clone(),
                    user_context,
                    events_processed: self.events_processed,
                    checkpoint_path: self.checkpoint_path.clone(),
                    checkpoint_every: self.checkpoint_every,
                    replace_checkpoint: self.replace_checkpoint,
                };
                bincode::serialize(&record).map_err(serialization_failed)
            }
        }
    }

    /// Decode bytes written by [`encode`](Self::encode).
    ///
    /// The version is checked before the rest of the record is read.
    pub fn decode(bytes: &[u8], format: CheckpointFormat) -> Result<Self, CheckpointError> {
        let found = match format {
            CheckpointFormat::Json => {
                serde_json::from_slice::<VersionProbe>(bytes)
                    .map_err(deserialization_failed)?
                    .version
            }
            CheckpointFormat::Binary => {
                bincode::deserialize::<u32>(bytes).map_err(deserialization_failed)?
            }
        };
        if found != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found,
                supported: CHECKPOINT_VERSION,
            });
        }

        match format {
            CheckpointFormat::Json => serde_json::from_slice(bytes).map_err(deserialization_failed),
            CheckpointFormat::Binary => {
                let record: BinaryRecord =
                    bincode::deserialize(bytes).map_err(deserialization_failed)?;
                let user_context =
                    serde_json::from_str(&record.user_context).map_err(deserialization_failed)?;
                Ok(Self {
                    version: record.version,
                    id: record.id,
                    timestamp: record.timestamp,
                    fsm_name: record.fsm_name,
                    context: InternalContext {
                        current_state: record.current_state,
                    },
                    user_context,
                    events_processed: record.events_processed,
                    checkpoint_path: record.checkpoint_path,
                    checkpoint_every: record.checkpoint_every,
                    replace_checkpoint: record.replace_checkpoint,
                })
            }
        }
    }

    /// Decode, choosing the format from the path extension or the contents.
    pub fn decode_for_path(path: &Path, bytes: &[u8]) -> Result<Self, CheckpointError> {
        let format =
            CheckpointFormat::from_path(path).unwrap_or_else(|| CheckpointFormat::sniff(bytes));
        Self::decode(bytes, format)
    }
}

fn serialization_failed(err: impl std::fmt::Display) -> CheckpointError {
    CheckpointError::SerializationFailed(err.to_string())
}

fn deserialization_failed(err: impl std::fmt::Display) -> CheckpointError {
    CheckpointError::DeserializationFailed(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Checkpoint {
        let mut user_context = Map::new();
        user_context.insert("value".to_string(), json!(2));
        user_context.insert("nested".to_string(), json!({"items": [1, 2, 3], "ok": true}));

        Checkpoint {
            version: CHECKPOINT_VERSION,
            id: "checkpoint-1".to_string(),
            timestamp: Utc::now(),
            fsm_name: "TestFsm".to_string(),
            context: InternalContext {
                current_state: "state_two".to_string(),
            },
            user_context,
            events_processed: 7,
            checkpoint_path: PathBuf::from("data/TestFsm_checkpoint.bin"),
            checkpoint_every: NonZeroU64::new(3),
            replace_checkpoint: true,
        }
    }

    #[test]
    fn binary_encoding_keeps_every_field() {
        let checkpoint = sample();
        let bytes = checkpoint.encode(CheckpointFormat::Binary).unwrap();

        let decoded = Checkpoint::decode(&bytes, CheckpointFormat::Binary).unwrap();
        assert_eq!(decoded, checkpoint);
    }

    #[test]
    fn json_encoding_is_tagged_and_readable() {
        let bytes = sample().encode(CheckpointFormat::Json).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["version"], json!(CHECKPOINT_VERSION));
        assert_eq!(value["context"]["current_state"], json!("state_two"));
        assert_eq!(value["user_context"]["value"], json!(2));
        assert_eq!(value["events_processed"], json!(7));
        assert_eq!(value["checkpoint_every"], json!(3));
        assert_eq!(value["replace_checkpoint"], json!(true));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let mut checkpoint = sample();
        checkpoint.version = CHECKPOINT_VERSION + 1;

        for format in [CheckpointFormat::Json, CheckpointFormat::Binary] {
            let bytes = checkpoint.encode(format).unwrap();
            let err = Checkpoint::decode(&bytes, format).unwrap_err();
            assert!(matches!(
                err,
                CheckpointError::UnsupportedVersion { found, supported }
                    if found == CHECKPOINT_VERSION + 1 && supported == CHECKPOINT_VERSION
            ));
        }
    }

    #[test]
    fn garbage_fails_to_decode() {
        let err = Checkpoint::decode(b"{not json", CheckpointFormat::Json).unwrap_err();
        assert!(matches!(err, CheckpointError::DeserializationFailed(_)));

        let err = Checkpoint::decode(&[1, 0], CheckpointFormat::Binary).unwrap_err();
        assert!(matches!(err, CheckpointError::DeserializationFailed(_)));
    }

    #[test]
    fn format_is_inferred_from_extension_or_contents() {
        assert_eq!(
            CheckpointFormat::from_path(Path::new("a/b_checkpoint.json")),
            Some(CheckpointFormat::Json)
        );
        assert_eq!(
            CheckpointFormat::from_path(Path::new("a/b_checkpoint.bin")),
            Some(CheckpointFormat::Binary)
        );
        assert_eq!(CheckpointFormat::from_path(Path::new("a/b_checkpoint")), None);

        let json = sample().encode(CheckpointFormat::Json).unwrap();
        let decoded = Checkpoint::decode_for_path(Path::new("snapshot"), &json).unwrap();
        assert_eq!(decoded.events_processed, 7);
    }
}
