//! Type-safe identifier wrapper around [`Uuid`].
//!
//! Callers are short-lived anonymous workers; the ID exists so that log
//! lines and test assertions can tell concurrent callers apart without
//! leaking their generated callsign into every trace field.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a simulated caller within one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CallerId(pub Uuid);

impl CallerId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for CallerId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for CallerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for CallerId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<CallerId> for Uuid {
    fn from(id: CallerId) -> Self {
        id.0
    }
}
