//! Enumeration types for the pileup exchange protocol.

use serde::{Deserialize, Serialize};

/// The kind of event the operator has broadcast to all live callers.
///
/// Exactly one [`BroadcastEvent`](crate::BroadcastEvent) exists at a
/// time; the kind is a closed enumeration so that no caller ever has to
/// substring-match a free-form message (`ResendClass` and
/// `ResendSection` are distinct variants, not prefixes of each other).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// No operator action is pending. The initial state of a round.
    Idle,
    /// The operator called CQ, inviting any caller to answer.
    Cq,
    /// The operator sent a full report (callsign + exchange).
    Response,
    /// The operator echoed a partial or uncertain callsign copy.
    Partial,
    /// The operator asked for the contest class again.
    ResendClass,
    /// The operator asked for the section again.
    ResendSection,
    /// The operator confirmed the contact and asked "who's next".
    Qrz,
    /// The round is over; every caller must exit immediately.
    Die,
}

impl EventKind {
    /// Whether this kind terminates caller loops.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Die)
    }
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Idle => "IDLE",
            Self::Cq => "CQ",
            Self::Response => "RESPONSE",
            Self::Partial => "PARTIAL",
            Self::ResendClass => "RESENDCLASS",
            Self::ResendSection => "RESENDSECTION",
            Self::Qrz => "QRZ",
            Self::Die => "DIE",
        };
        write!(f, "{name}")
    }
}

/// Where a caller stands in its exchange with the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallerPhase {
    /// Waiting for a CQ call to answer.
    Cq,
    /// Answered a CQ; the operator is still working out the callsign.
    ResolvingCall,
    /// The operator has the callsign right; exchanging class/section.
    CallResolved,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_die_is_terminal() {
        assert!(EventKind::Die.is_terminal());
        assert!(!EventKind::Cq.is_terminal());
        assert!(!EventKind::Qrz.is_terminal());
        assert!(!EventKind::Idle.is_terminal());
    }

    #[test]
    fn resend_kinds_are_distinct() {
        assert_ne!(EventKind::ResendClass, EventKind::ResendSection);
        assert_eq!(EventKind::ResendClass.to_string(), "RESENDCLASS");
        assert_eq!(EventKind::ResendSection.to_string(), "RESENDSECTION");
    }
}
