//! Shared type definitions for the Pileup Field Day trainer.
//!
//! This crate is the single source of truth for the types that flow
//! between the operator surface, the round orchestrator, and the
//! simulated callers.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for caller identifiers
//! - [`enums`] -- Broadcast event kinds and caller phases
//! - [`structs`] -- Identity, broadcast event, and operator guess state

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{CallerPhase, EventKind};
pub use ids::CallerId;
pub use structs::{BroadcastEvent, GuessState, Identity};
