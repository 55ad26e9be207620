//! Core entity structs for the pileup exchange.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::EventKind;

/// A caller's generated contest identity.
///
/// Immutable for the lifetime of one caller. The same shape doubles as
/// the resolved-result record: whichever caller wins the round publishes
/// its identity so the trainer can grade the operator's copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// US amateur-radio callsign (prefix + call-area digit + suffix).
    pub callsign: String,
    /// Field Day class, a transmitter count plus category letter (e.g. "3A").
    pub class: String,
    /// ARRL section abbreviation consistent with the call-area digit.
    pub section: String,
}

impl Identity {
    /// The "class section" half of the exchange, as sent on the air.
    pub fn exchange(&self) -> String {
        format!("{} {}", self.class, self.section)
    }
}

impl core::fmt::Display for Identity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {} {}", self.callsign, self.class, self.section)
    }
}

/// The single shared event slot connecting the operator to all callers.
///
/// The `stamp` is a process-wide monotonically increasing sequence
/// number. Two CQ calls issued at different times carry different
/// stamps, so a caller that already reacted to one does not react to
/// the other twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastEvent {
    /// What the operator did.
    pub kind: EventKind,
    /// Sequence number disambiguating repeated identical kinds.
    pub stamp: u64,
    /// Wall-clock time the event was issued, for logs.
    pub issued_at: DateTime<Utc>,
}

impl BroadcastEvent {
    /// The event present before the operator has done anything.
    ///
    /// Stamp 0 is reserved for this idle event; real broadcasts start
    /// at 1, so a freshly spawned caller never mistakes the idle slot
    /// for an action.
    pub fn idle() -> Self {
        Self {
            kind: EventKind::Idle,
            stamp: 0,
            issued_at: Utc::now(),
        }
    }
}

/// The operator's current best-effort transcription of the exchange.
///
/// Updated by the input surface, read by every caller when scoring how
/// close the operator is to its true identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessState {
    /// What the operator believes the callsign is. May be `"?"`.
    pub callsign: String,
    /// What the operator believes the class is.
    pub class: String,
    /// What the operator believes the section is.
    pub section: String,
}
