//! Synchronous core of the Pileup Field Day trainer.
//!
//! Everything here is pure and single-threaded: identity generation,
//! the Morse transmission timing model, the copy-error scorer, and the
//! typed configuration. The concurrent caller engine in `pileup-sim`
//! builds on these.
//!
//! # Modules
//!
//! - [`config`] -- YAML configuration loading and validation
//! - [`identity`] -- callsign / class / section generation
//! - [`score`] -- Levenshtein-based copy-error scoring
//! - [`timing`] -- phrase transmission time estimation

pub mod config;
pub mod identity;
pub mod score;
pub mod timing;
