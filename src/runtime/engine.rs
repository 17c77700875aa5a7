//! Runtime that drives events through a schema.

use crate::checkpoint::{
    canonical_path, Checkpoint, CheckpointFormat, InternalContext, CHECKPOINT_VERSION,
};
use crate::core::{Context, Schema, State};
use crate::runtime::config::RuntimeConfig;
use crate::runtime::error::{ConstructionError, DispatchError};
use crate::runtime::interrupt::InterruptHandle;
use chrono::Utc;
use serde_json::{Map, Value};
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Why a drive loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The event source ran out
    Exhausted,

    /// An interrupt was requested
    Interrupted,
}

/// Status returned by [`Runtime::start`] once the final checkpoint is written.
///
/// The runtime never terminates the process; the caller decides what to do
/// with this.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOutcome {
    pub reason: StopReason,

    /// Total events processed by this runtime, including restored ones
    pub events_processed: u64,

    /// Where the final checkpoint went, or `None` if writing it failed
    pub final_checkpoint: Option<PathBuf>,
}

impl RunOutcome {
    pub fn was_interrupted(&self) -> bool {
        self.reason == StopReason::Interrupted
    }
}

/// One run of an FSM over a shared schema.
///
/// The runtime owns the context, counts processed events and writes
/// checkpoints. Any number of runtimes can share one schema.
///
/// # Example
///
/// ```rust
/// use statecraft::builder::SchemaBuilder;
/// use statecraft::runtime::{Runtime, RuntimeConfig};
/// use serde_json::{json, Map};
///
/// let schema = SchemaBuilder::<&str>::new("Echo")
///     .start_state("waiting")
///     .state("heard")
///     .transition("waiting", ["heard"], |_, _| "heard")
///     .transition("heard", ["heard"], |_, _| "heard")
///     .action("heard", |event, ctx| {
///         ctx.insert("last", *event).unwrap();
///     })
///     .build()
///     .unwrap();
///
/// let dir = std::env::temp_dir().join("statecraft-doc-echo");
/// let mut runtime =
///     Runtime::new(schema, Map::new(), RuntimeConfig::new().checkpoint_dir(&dir)).unwrap();
///
/// let outcome = runtime.start(["hello", "world"]).unwrap();
///
/// assert_eq!(outcome.events_processed, 2);
/// assert_eq!(runtime.context().get("last"), Some(&json!("world")));
/// # std::fs::remove_dir_all(&dir).ok();
/// ```
#[derive(Debug)]
pub struct Runtime<E> {
    schema: Arc<Schema<E>>,
    context: Context,
    events_processed: u64,
    checkpoint_path: PathBuf,
    checkpoint_every: Option<NonZeroU64>,
    replace_checkpoint: bool,
    format: CheckpointFormat,
    checkpoints_written: u64,
    interrupt: InterruptHandle,
}

impl<E> Runtime<E> {
    /// Create a runtime at the schema's start state.
    ///
    /// If `config.resume_from` is set the runtime is restored from that
    /// snapshot instead, and `user_context` and the rest of `config` are
    /// ignored.
    pub fn new(
        schema: impl Into<Arc<Schema<E>>>,
        user_context: Map<String, Value>,
        config: RuntimeConfig,
    ) -> Result<Self, ConstructionError> {
        let schema = schema.into();
        if let Some(path) = &config.resume_from {
            return Self::resume(schema, path);
        }

        let context = Context::new(schema.start_state_name(), user_context)?;
        let checkpoint_path =
            canonical_path(&config.checkpoint_dir, schema.name(), config.format);

        Ok(Self {
            schema,
            context,
            events_processed: 0,
            checkpoint_path,
            checkpoint_every: config.checkpoint_every,
            replace_checkpoint: config.replace_checkpoint,
            format: config.format,
            checkpoints_written: 0,
            interrupt: InterruptHandle::new(),
        })
    }

    /// Restore a runtime from the snapshot at `path`.
    ///
    /// Fails if the file is missing or unreadable, or if its current state
    /// is not a state of `schema`.
    pub fn resume(
        schema: impl Into<Arc<Schema<E>>>,
        path: impl AsRef<Path>,
    ) -> Result<Self, ConstructionError> {
        let schema = schema.into();
        let checkpoint = Checkpoint::restore(path.as_ref(), &*schema)?;

        let format =
            CheckpointFormat::from_path(&checkpoint.checkpoint_path).unwrap_or_default();
        let context = Context::new(checkpoint.context.current_state, checkpoint.user_context)?;

        Ok(Self {
            schema,
            context,
            events_processed: checkpoint.events_processed,
            checkpoint_path: checkpoint.checkpoint_path,
            checkpoint_every: checkpoint.checkpoint_every,
            replace_checkpoint: checkpoint.replace_checkpoint,
            format,
            checkpoints_written: 0,
            interrupt: InterruptHandle::new(),
        })
    }

    pub fn schema(&self) -> &Arc<Schema<E>> {
        &self.schema
    }

    /// Read-only view of the context.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The active state.
    pub fn current_state(&self) -> &State<E> {
        &self.schema[self.context.current_state()]
    }

    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    /// Canonical checkpoint path (the replace-policy target).
    pub fn checkpoint_path(&self) -> &Path {
        &self.checkpoint_path
    }

    pub fn checkpoint_every(&self) -> Option<NonZeroU64> {
        self.checkpoint_every
    }

    pub fn replace_checkpoint(&self) -> bool {
        self.replace_checkpoint
    }

    /// Checkpoints successfully written by this instance.
    pub fn checkpoints_written(&self) -> u64 {
        self.checkpoints_written
    }

    /// Handle for requesting a stop from outside the drive loop.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    /// Apply one event: transition, enter the next state, run its action.
    ///
    /// The returned name is accepted if it is any state of the schema; it
    /// does not have to be among the transition's declared destinations.
    pub fn step(&mut self, event: &E) -> Result<(), DispatchError> {
        let current = &self.schema[self.context.current_state()];
        let next_name = current.invoke_transition(event, &mut self.context);

        let Some(next) = self.schema.state(&next_name) else {
            return Err(DispatchError::UnknownNextState {
                from: current.name().to_string(),
                returned: next_name,
            });
        };

        self.context.set_current_state(next.name());
        next.invoke_action(event, &mut self.context);
        self.events_processed += 1;

        tracing::debug!(
            from = %current.name(),
            to = %next.name(),
            events_processed = self.events_processed,
            "event dispatched"
        );
        Ok(())
    }

    /// Drive the runtime until `events` is exhausted or an interrupt is
    /// requested, then write a final checkpoint.
    ///
    /// `events` is pulled lazily and may be unbounded. On a dispatch error
    /// the run stops immediately and no final checkpoint is written.
    pub fn start<I>(&mut self, events: I) -> Result<RunOutcome, DispatchError>
    where
        I: IntoIterator<Item = E>,
    {
        let mut events = events.into_iter();

        let reason = loop {
            if self.interrupt.take() {
                break StopReason::Interrupted;
            }
            let Some(event) = events.next() else {
                break StopReason::Exhausted;
            };

            if let Err(err) = self.step(&event) {
                self.interrupt.take();
                return Err(err);
            }

            if let Some(every) = self.checkpoint_every {
                if self.events_processed % every.get() == 0 {
                    self.create_checkpoint();
                }
            }
        };

        let final_checkpoint = self.create_checkpoint();
        self.interrupt.take();

        tracing::info!(
            fsm = %self.schema.name(),
            reason = ?reason,
            events_processed = self.events_processed,
            state = %self.context.current_state(),
            "run finished"
        );

        Ok(RunOutcome {
            reason,
            events_processed: self.events_processed,
            final_checkpoint,
        })
    }

    /// Snapshot of the resumable fields.
    pub fn snapshot(&self) -> Checkpoint {
        Checkpoint {
            version: CHECKPOINT_VERSION,
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            fsm_name: self.schema.name().to_string(),
            context: InternalContext {
                current_state: self.context.current_state().to_string(),
            },
            user_context: self.context.clone().into_user_data(),
            events_processed: self.events_processed,
            checkpoint_path: self.checkpoint_path.clone(),
            checkpoint_every: self.checkpoint_every,
            replace_checkpoint: self.replace_checkpoint,
        }
    }

    /// Write a checkpoint according to the replace policy.
    ///
    /// Write failures are logged and reported as `None`; the runtime keeps
    /// working either way.
    pub fn create_checkpoint(&mut self) -> Option<PathBuf> {
        let snapshot = self.snapshot();
        let written = if self.replace_checkpoint {
            snapshot
                .save(&self.checkpoint_path, self.format)
                .map(|()| self.checkpoint_path.clone())
        } else {
            let dir = self.checkpoint_path.parent().unwrap_or_else(|| Path::new(""));
            snapshot.save_to_history(dir, self.format, Utc::now())
        };

        match written {
            Ok(path) => {
                self.checkpoints_written += 1;
                tracing::debug!(
                    path = %path.display(),
                    events_processed = self.events_processed,
                    "checkpoint written"
                );
                Some(path)
            }
            Err(err) => {
                tracing::warn!(
                    checkpoint = %self.checkpoint_path.display(),
                    error = %err,
                    "failed to write checkpoint, continuing"
                );
                None
            }
        }
    }
}
