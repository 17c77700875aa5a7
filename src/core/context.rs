//! Context data shared by every action and transition of one run.
//!
//! A context has two regions: the reserved fields owned by the runtime
//! (currently only `current_state`) and the open user map that callables
//! read and write freely. Writes through the public API can never touch
//! a reserved key.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Keys owned by the runtime. User data must never contain them.
pub const RESERVED_KEYS: &[&str] = &["current_state"];

/// Returns `true` if `key` is owned by the runtime.
pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Errors raised when user data collides with the reserved region.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("Context key '{key}' is reserved by the runtime")]
    ReservedKey { key: String },
}

/// Mutable context passed by reference into every action and transition.
///
/// # Example
///
/// ```rust
/// use statecraft::core::Context;
/// use serde_json::{json, Map};
///
/// let mut ctx = Context::new("idle", Map::new()).unwrap();
/// ctx.insert("count", 1).unwrap();
///
/// assert_eq!(ctx.current_state(), "idle");
/// assert_eq!(ctx.get("count"), Some(&json!(1)));
/// assert!(ctx.insert("current_state", "busy").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Context {
    current_state: String,
    user: Map<String, Value>,
}

impl Context {
    /// Create a context positioned at `current_state` holding `user` data.
    ///
    /// Fails if `user` contains any reserved key.
    pub fn new(
        current_state: impl Into<String>,
        user: Map<String, Value>,
    ) -> Result<Self, ContextError> {
        if let Some(key) = user.keys().find(|key| is_reserved(key)) {
            return Err(ContextError::ReservedKey { key: key.clone() });
        }

        Ok(Self {
            current_state: current_state.into(),
            user,
        })
    }

    /// Name of the active state.
    pub fn current_state(&self) -> &str {
        &self.current_state
    }

    pub(crate) fn set_current_state(&mut self, name: impl Into<String>) {
        self.current_state = name.into();
    }

    /// Read a user value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.user.get(key)
    }

    /// Mutable access to a user value. Reserved keys are never present here.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.user.get_mut(key)
    }

    /// Write a user value, returning the previous one.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, ContextError> {
        let key = key.into();
        if is_reserved(&key) {
            return Err(ContextError::ReservedKey { key });
        }
        Ok(self.user.insert(key, value.into()))
    }

    /// Remove a user value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.user.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.user.contains_key(key)
    }

    /// The user region as a read-only map.
    pub fn user_data(&self) -> &Map<String, Value> {
        &self.user
    }

    pub(crate) fn into_user_data(self) -> Map<String, Value> {
        self.user
    }
}
