//! Concurrent caller engine for the Pileup Field Day trainer.
//!
//! A round of the simulation is a pileup: several independent caller
//! tasks answer the operator's CQ, each tracking its own exchange state
//! and scoring the operator's transcription against its true identity.
//! The operator's actions reach the callers through a single shared
//! broadcast cell; whichever caller the operator works to completion
//! publishes its identity as the round's resolved result.
//!
//! # Modules
//!
//! - [`net`] -- shared single-writer broadcast state ("the frequency")
//! - [`audio`] -- external Morse renderer interface and implementations
//! - [`caller`] -- the per-caller finite-state machine and polling loop
//! - [`round`] -- round lifecycle: spawn, broadcast, teardown, auto-CQ
//! - [`operator`] -- the operator's actions and guess updates

pub mod audio;
pub mod caller;
pub mod net;
pub mod operator;
pub mod round;

pub use audio::{MorseProcess, MorseRenderer, RecordingRenderer, RenderError, Transmission};
pub use caller::{Caller, CallerSettings};
pub use net::NetState;
pub use operator::OperatorPosition;
pub use round::RoundOrchestrator;
