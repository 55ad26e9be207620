//! Shared state of the simulated frequency.
//!
//! Three pieces of state connect the operator to the caller pool, each
//! with exactly one writer role:
//!
//! - the [`BroadcastEvent`] cell, written only through
//!   [`NetState::broadcast`] on behalf of operator actions and read by
//!   every caller on its own polling cadence;
//! - the [`GuessState`], written by the operator input surface;
//! - the resolved-result slot, written by whichever caller completes
//!   the exchange (last writer wins).
//!
//! The broadcast cell is a [`watch`] channel with retained latest-value
//! semantics: readers may observe a value up to one poll interval
//! stale, which the resolution protocol tolerates. The `call_resolved`
//! flag mirrors the round-wide "someone already holds the contact"
//! condition the caller state machine consults before re-asserting its
//! callsign.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Duration;

use tokio::time::Instant;

use chrono::Utc;
use pileup_types::{BroadcastEvent, EventKind, GuessState, Identity};
use tokio::sync::watch;
use tracing::{debug, info};

/// Shared frequency state.
///
/// Wrapped in an `Arc` and handed to every caller at spawn; there are
/// no process-wide globals.
#[derive(Debug)]
pub struct NetState {
    /// Latest-value broadcast cell for operator events.
    event_tx: watch::Sender<BroadcastEvent>,

    /// Monotonically increasing stamp source. Stamp 0 is the idle
    /// event; real broadcasts start at 1.
    next_stamp: AtomicU64,

    /// The operator's current transcription.
    guess: RwLock<GuessState>,

    /// The round's resolved caller, if any. Last writer wins.
    resolved: Mutex<Option<Identity>>,

    /// Whether some caller currently believes it holds the contact.
    call_resolved: AtomicBool,

    /// Process start, for idle-time bookkeeping.
    started: Instant,

    /// Milliseconds since `started` of the last broadcast.
    last_broadcast_ms: AtomicU64,
}

impl NetState {
    /// Create a fresh net with the idle event in the broadcast cell.
    pub fn new() -> Self {
        let (event_tx, _rx) = watch::channel(BroadcastEvent::idle());
        Self {
            event_tx,
            next_stamp: AtomicU64::new(0),
            guess: RwLock::new(GuessState::default()),
            resolved: Mutex::new(None),
            call_resolved: AtomicBool::new(false),
            started: Instant::now(),
            last_broadcast_ms: AtomicU64::new(0),
        }
    }

    // -----------------------------------------------------------------------
    // Broadcast cell
    // -----------------------------------------------------------------------

    /// Atomically replace the broadcast event with `{kind, next stamp}`.
    ///
    /// This is the only way operator intent reaches the callers.
    /// Returns the stamp assigned to the new event.
    pub fn broadcast(&self, kind: EventKind) -> u64 {
        let stamp = self
            .next_stamp
            .fetch_add(1, Ordering::AcqRel)
            .saturating_add(1);
        let event = BroadcastEvent {
            kind,
            stamp,
            issued_at: Utc::now(),
        };
        self.event_tx.send_replace(event);
        self.touch();
        debug!(%kind, stamp, "broadcast");
        stamp
    }

    /// Subscribe to the broadcast cell. The receiver always yields the
    /// latest event on [`watch::Receiver::borrow`].
    pub fn subscribe(&self) -> watch::Receiver<BroadcastEvent> {
        self.event_tx.subscribe()
    }

    /// The event currently in the cell.
    pub fn latest(&self) -> BroadcastEvent {
        self.event_tx.borrow().clone()
    }

    // -----------------------------------------------------------------------
    // Operator guess
    // -----------------------------------------------------------------------

    /// Replace the operator's transcription.
    pub fn set_guess(&self, guess: GuessState) {
        let mut slot = self.guess.write().unwrap_or_else(PoisonError::into_inner);
        *slot = guess;
    }

    /// The operator's current transcription.
    pub fn guess(&self) -> GuessState {
        self.guess
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // -----------------------------------------------------------------------
    // Resolved result
    // -----------------------------------------------------------------------

    /// Publish `identity` as the round's resolved caller and raise the
    /// round-wide resolved flag. Overwrites any earlier claim.
    pub fn claim_resolved(&self, identity: Identity) {
        info!(caller = %identity, "resolved slot written");
        let mut slot = self
            .resolved
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(identity);
        self.call_resolved.store(true, Ordering::Release);
    }

    /// The round's resolved caller, if any.
    pub fn resolved(&self) -> Option<Identity> {
        self.resolved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether some caller currently holds the contact.
    pub fn call_resolved(&self) -> bool {
        self.call_resolved.load(Ordering::Acquire)
    }

    /// Raise the round-wide resolved flag without publishing an
    /// identity. A caller concludes from a resend query that the
    /// operator already holds its callsign, but the contact itself is
    /// only published on confirmation.
    pub fn mark_resolved(&self) {
        self.call_resolved.store(true, Ordering::Release);
    }

    /// Lower the round-wide resolved flag (the operator's renewed
    /// partial query made the identity uncertain again).
    pub fn mark_unresolved(&self) {
        self.call_resolved.store(false, Ordering::Release);
    }

    /// Clear the per-round slots for a fresh pileup. Stamps keep
    /// counting so a caller from a previous round can never mistake a
    /// new event for one it already handled.
    pub fn reset_round(&self) {
        let mut slot = self
            .resolved
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = None;
        drop(slot);
        self.call_resolved.store(false, Ordering::Release);
        self.set_guess(GuessState::default());
    }

    // -----------------------------------------------------------------------
    // Idle tracking (auto-CQ)
    // -----------------------------------------------------------------------

    /// How long since the last broadcast.
    pub fn idle_elapsed(&self) -> Duration {
        let now_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let last_ms = self.last_broadcast_ms.load(Ordering::Acquire);
        Duration::from_millis(now_ms.saturating_sub(last_ms))
    }

    /// Record a broadcast for idle tracking.
    fn touch(&self) {
        let now_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.last_broadcast_ms.store(now_ms, Ordering::Release);
    }
}

impl Default for NetState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn identity(callsign: &str) -> Identity {
        Identity {
            callsign: String::from(callsign),
            class: String::from("1B"),
            section: String::from("ORG"),
        }
    }

    #[test]
    fn starts_idle_with_stamp_zero() {
        let net = NetState::new();
        let event = net.latest();
        assert_eq!(event.kind, EventKind::Idle);
        assert_eq!(event.stamp, 0);
        assert!(net.resolved().is_none());
        assert!(!net.call_resolved());
    }

    #[test]
    fn stamps_increase_monotonically() {
        let net = NetState::new();
        let first = net.broadcast(EventKind::Cq);
        let second = net.broadcast(EventKind::Cq);
        let third = net.broadcast(EventKind::Partial);
        assert!(first < second && second < third);
        assert_eq!(net.latest().stamp, third);
        assert_eq!(net.latest().kind, EventKind::Partial);
    }

    #[test]
    fn repeated_kinds_get_distinct_stamps() {
        let net = NetState::new();
        let a = net.broadcast(EventKind::Cq);
        let b = net.broadcast(EventKind::Cq);
        assert_ne!(a, b);
    }

    #[test]
    fn subscriber_sees_latest_value() {
        let net = NetState::new();
        let rx = net.subscribe();
        net.broadcast(EventKind::Response);
        assert_eq!(rx.borrow().kind, EventKind::Response);
    }

    #[test]
    fn resolved_slot_is_last_writer_wins() {
        let net = NetState::new();
        net.claim_resolved(identity("K6GTE"));
        net.claim_resolved(identity("W1AW"));
        assert_eq!(net.resolved().unwrap().callsign, "W1AW");
        assert!(net.call_resolved());
    }

    #[test]
    fn mark_resolved_raises_the_flag_without_a_slot() {
        let net = NetState::new();
        net.mark_resolved();
        assert!(net.call_resolved());
        assert!(net.resolved().is_none());
    }

    #[test]
    fn mark_unresolved_keeps_the_slot() {
        let net = NetState::new();
        net.claim_resolved(identity("K6GTE"));
        net.mark_unresolved();
        assert!(!net.call_resolved());
        assert!(net.resolved().is_some());
    }

    #[test]
    fn reset_round_clears_slots_but_not_stamps() {
        let net = NetState::new();
        let stamp = net.broadcast(EventKind::Cq);
        net.claim_resolved(identity("K6GTE"));
        net.set_guess(GuessState {
            callsign: String::from("K6GTE"),
            class: String::new(),
            section: String::new(),
        });

        net.reset_round();
        assert!(net.resolved().is_none());
        assert!(!net.call_resolved());
        assert!(net.guess().callsign.is_empty());

        let next = net.broadcast(EventKind::Cq);
        assert!(next > stamp, "stamps must keep counting across rounds");
    }

    #[test]
    fn guess_roundtrip() {
        let net = NetState::new();
        net.set_guess(GuessState {
            callsign: String::from("W6?"),
            class: String::from("3A"),
            section: String::from("EBA"),
        });
        let guess = net.guess();
        assert_eq!(guess.callsign, "W6?");
        assert_eq!(guess.class, "3A");
    }

    #[tokio::test]
    async fn broadcast_resets_idle_clock() {
        let net = NetState::new();
        net.broadcast(EventKind::Cq);
        assert!(net.idle_elapsed() < Duration::from_secs(1));
    }
}
