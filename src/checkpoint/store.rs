//! File persistence for checkpoints.
//!
//! Each write goes to its own temporary file in the target directory, is
//! synced, and is then renamed into place, so a reader never observes a
//! partially written snapshot and concurrent writers never share a
//! temporary file.

use super::{Checkpoint, CheckpointError, CheckpointFormat};
use crate::core::Schema;
use chrono::{DateTime, Utc};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Path written under the replace policy: `<dir>/<Name>_checkpoint.<ext>`.
pub fn canonical_path(dir: &Path, fsm_name: &str, format: CheckpointFormat) -> PathBuf {
    dir.join(format!("{fsm_name}_checkpoint.{}", format.extension()))
}

/// Candidate path for one snapshot under the history policy:
/// `<dir>/<Name>_<timestamp>_checkpoint.<ext>`.
///
/// `attempt` 0 is the plain name; later attempts append `-<attempt>` to the
/// timestamp. [`Checkpoint::save_to_history`] walks the attempts until a
/// name is free.
pub fn history_path(
    dir: &Path,
    fsm_name: &str,
    format: CheckpointFormat,
    at: DateTime<Utc>,
    attempt: u32,
) -> PathBuf {
    let stamp = at.format("%Y-%m-%dT%H-%M-%S%.6fZ");
    let ext = format.extension();

    if attempt == 0 {
        dir.join(format!("{fsm_name}_{stamp}_checkpoint.{ext}"))
    } else {
        dir.join(format!("{fsm_name}_{stamp}-{attempt}_checkpoint.{ext}"))
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> CheckpointError + '_ {
    move |source| CheckpointError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Create the parent directory of `path` and a synced temporary file in it
/// holding `bytes`.
fn staged(path: &Path, bytes: &[u8]) -> Result<NamedTempFile, CheckpointError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(io_error(parent))?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(io_error(parent))?;
    tmp.write_all(bytes).map_err(io_error(tmp.path()))?;
    tmp.as_file().sync_all().map_err(io_error(tmp.path()))?;
    Ok(tmp)
}

/// Write `bytes` to `path` atomically, replacing any existing file and
/// creating the parent directory.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CheckpointError> {
    staged(path, bytes)?
        .persist(path)
        .map_err(|err| CheckpointError::Io {
            path: path.to_path_buf(),
            source: err.error,
        })?;
    Ok(())
}

impl Checkpoint {
    /// Encode and write the snapshot to `path`.
    pub fn save(&self, path: &Path, format: CheckpointFormat) -> Result<(), CheckpointError> {
        let bytes = self.encode(format)?;
        write_atomic(path, &bytes)
    }

    /// Encode and write a new history snapshot into `dir`, named after
    /// `fsm_name` and `at`.
    ///
    /// An existing snapshot is never replaced: if the name is taken, even
    /// by a concurrent writer, the next numeric suffix is tried. Returns the
    /// path written.
    pub fn save_to_history(
        &self,
        dir: &Path,
        format: CheckpointFormat,
        at: DateTime<Utc>,
    ) -> Result<PathBuf, CheckpointError> {
        let bytes = self.encode(format)?;
        let mut tmp = staged(&history_path(dir, &self.fsm_name, format, at, 0), &bytes)?;

        let mut attempt = 0;
        loop {
            let path = history_path(dir, &self.fsm_name, format, at, attempt);
            match tmp.persist_noclobber(&path) {
                Ok(_) => return Ok(path),
                Err(err) if err.error.kind() == ErrorKind::AlreadyExists => {
                    tmp = err.file;
                    attempt += 1;
                }
                Err(err) => {
                    return Err(CheckpointError::Io {
                        path,
                        source: err.error,
                    })
                }
            }
        }
    }

    /// Read the snapshot at `path`.
    pub fn load(path: &Path) -> Result<Self, CheckpointError> {
        if !path.exists() {
            return Err(CheckpointError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let bytes = fs::read(path).map_err(io_error(path))?;
        Self::decode_for_path(path, &bytes)
    }

    /// Read the snapshot at `path` and check it against `schema`.
    ///
    /// The recorded current state must be one of the schema's state names
    /// exactly as stored; the record is never patched.
    pub fn restore<E>(path: &Path, schema: &Schema<E>) -> Result<Self, CheckpointError> {
        let checkpoint = Self::load(path)?;

        let state = &checkpoint.context.current_state;
        if !schema.state_names().any(|name| name == state) {
            return Err(CheckpointError::UnknownState {
                state: state.clone(),
            });
        }

        if checkpoint.fsm_name != schema.name() {
            tracing::warn!(
                recorded = %checkpoint.fsm_name,
                schema = %schema.name(),
                path = %path.display(),
                "restoring checkpoint recorded by a different FSM type"
            );
        }

        tracing::info!(
            path = %path.display(),
            state = %state,
            events_processed = checkpoint.events_processed,
            "checkpoint restored"
        );
        Ok(checkpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SchemaBuilder;
    use crate::checkpoint::{InternalContext, CHECKPOINT_VERSION};
    use chrono::TimeZone;
    use serde_json::Map;

    fn checkpoint_at(state: &str, path: &Path) -> Checkpoint {
        Checkpoint {
            version: CHECKPOINT_VERSION,
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            fsm_name: "Light".to_string(),
            context: InternalContext {
                current_state: state.to_string(),
            },
            user_context: Map::new(),
            events_processed: 4,
            checkpoint_path: path.to_path_buf(),
            checkpoint_every: None,
            replace_checkpoint: true,
        }
    }

    fn light_schema() -> Schema<()> {
        SchemaBuilder::new("Light")
            .start_state("off")
            .state("on")
            .transition("off", ["on"], |_, _| "on")
            .transition("on", ["off"], |_, _| "off")
            .build()
            .unwrap()
    }

    #[test]
    fn canonical_path_is_derived_from_type_name() {
        let path = canonical_path(Path::new("./data"), "Light", CheckpointFormat::Binary);
        assert_eq!(path, Path::new("./data/Light_checkpoint.bin"));

        let path = canonical_path(Path::new("out"), "Light", CheckpointFormat::Json);
        assert_eq!(path, Path::new("out/Light_checkpoint.json"));
    }

    #[test]
    fn history_path_embeds_timestamp_and_attempt() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 5).unwrap();

        let first = history_path(Path::new("out"), "Light", CheckpointFormat::Json, at, 0);
        assert_eq!(
            first,
            Path::new("out/Light_2024-03-09T14-30-05.000000Z_checkpoint.json")
        );

        let retry = history_path(Path::new("out"), "Light", CheckpointFormat::Json, at, 2);
        assert_eq!(
            retry,
            Path::new("out/Light_2024-03-09T14-30-05.000000Z-2_checkpoint.json")
        );
    }

    #[test]
    fn save_to_history_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 5).unwrap();
        let checkpoint = checkpoint_at("on", &dir.path().join("Light_checkpoint.json"));

        let first = checkpoint
            .save_to_history(dir.path(), CheckpointFormat::Json, at)
            .unwrap();
        let second = checkpoint
            .save_to_history(dir.path(), CheckpointFormat::Json, at)
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(second, history_path(dir.path(), "Light", CheckpointFormat::Json, at, 1));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn concurrent_history_writers_keep_every_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 5).unwrap();
        let checkpoint = checkpoint_at("on", &dir.path().join("Light_checkpoint.bin"));

        let (checkpoint, target) = (&checkpoint, dir.path());
        let written: Vec<PathBuf> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(move || {
                        (0..10)
                            .map(|_| {
                                checkpoint
                                    .save_to_history(target, CheckpointFormat::Binary, at)
                                    .unwrap()
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| handle.join().unwrap())
                .collect()
        });

        let unique: std::collections::BTreeSet<_> = written.iter().collect();
        assert_eq!(unique.len(), 40);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 40);
    }

    #[test]
    fn concurrent_writers_to_one_path_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Light_checkpoint.bin");

        std::thread::scope(|scope| {
            for n in 0..4u8 {
                let path = &path;
                scope.spawn(move || {
                    for _ in 0..50 {
                        write_atomic(path, &[n; 64]).unwrap();
                    }
                });
            }
        });

        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 64);
        assert!(bytes.iter().all(|b| *b == bytes[0]));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn save_creates_directory_and_leaves_no_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        let path = nested.join("Light_checkpoint.bin");

        checkpoint_at("on", &path)
            .save(&path, CheckpointFormat::Binary)
            .unwrap();

        assert!(path.exists());
        assert_eq!(fs::read_dir(&nested).unwrap().count(), 1);
    }

    #[test]
    fn save_then_restore_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Light_checkpoint.json");
        let checkpoint = checkpoint_at("on", &path);

        checkpoint.save(&path, CheckpointFormat::Json).unwrap();
        let restored = Checkpoint::restore(&path, &light_schema()).unwrap();

        assert_eq!(restored, checkpoint);
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Checkpoint::load(&dir.path().join("absent.bin")).unwrap_err();

        assert!(matches!(err, CheckpointError::NotFound { .. }));
    }

    #[test]
    fn restore_rejects_unknown_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Light_checkpoint.bin");
        checkpoint_at("dimmed", &path)
            .save(&path, CheckpointFormat::Binary)
            .unwrap();

        let err = Checkpoint::restore(&path, &light_schema()).unwrap_err();
        assert!(matches!(err, CheckpointError::UnknownState { state } if state == "dimmed"));
    }

    #[test]
    fn restore_does_not_normalize_recorded_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Light_checkpoint.bin");
        checkpoint_at("ON", &path)
            .save(&path, CheckpointFormat::Binary)
            .unwrap();

        let err = Checkpoint::restore(&path, &light_schema()).unwrap_err();
        assert!(matches!(err, CheckpointError::UnknownState { .. }));
    }

    #[test]
    fn write_into_file_as_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let err = write_atomic(&blocker.join("Light_checkpoint.bin"), b"data").unwrap_err();
        assert!(matches!(err, CheckpointError::Io { .. }));
    }
}
