//! The simulated caller: one task, one identity, one state machine.
//!
//! A caller polls the shared broadcast cell on a fixed cadence and
//! reacts to each *new* event (by stamp) according to its exchange
//! phase. All transitions are gated on the copy error between the
//! operator's transcription and the caller's true identity, so several
//! callers with similar callsigns can all believe a partial is meant
//! for them, exactly like a real pileup.
//!
//! Loop shutdown is cooperative: the terminal event ends the loop on
//! the next poll regardless of stamps, so a caller never outlives its
//! round by more than one interval plus any in-flight transmission.

use std::sync::Arc;
use std::time::Duration;

use pileup_core::score::dissimilarity;
use pileup_core::timing::transmit_duration;
use pileup_types::{BroadcastEvent, CallerId, CallerPhase, EventKind, Identity};
use rand::Rng;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::audio::MorseRenderer;
use crate::net::NetState;

/// Exact-copy threshold. Distance 0 over a nonzero length is exactly
/// this value, so the comparison is precise, not approximate.
const EXACT: f64 = 0.0;

/// Worst copy error that still earns a callsign retransmission.
const RETRY_CALL_THRESHOLD: f64 = 0.8;

/// Worst copy error that still earns an exchange correction.
const CORRECT_REPORT_THRESHOLD: f64 = 0.5;

/// Copy error below which a resend query counts as "they have me".
const RESEND_ACCEPT_THRESHOLD: f64 = 0.25;

/// Per-caller transmission parameters, fixed at spawn.
#[derive(Debug, Clone, Copy)]
pub struct CallerSettings {
    /// Tone pitch in hertz, offset within the receiver bandwidth.
    pub tone_hz: u32,
    /// Sending speed in words per minute.
    pub speed_wpm: u32,
    /// Render volume, `0.0..=1.0`.
    pub volume: f32,
    /// How often the caller checks the broadcast cell.
    pub poll_interval: Duration,
}

/// One simulated station competing in the pileup.
#[derive(Debug)]
pub struct Caller<R> {
    id: CallerId,
    identity: Identity,
    settings: CallerSettings,
    renderer: Arc<R>,
    net: Arc<NetState>,
    events: watch::Receiver<BroadcastEvent>,
    phase: CallerPhase,
    last_stamp: u64,
}

impl<R: MorseRenderer> Caller<R> {
    /// Put a new caller on the frequency, subscribed but not yet
    /// running. Stamp 0 is the idle event, so a fresh caller reacts to
    /// the first real broadcast and nothing earlier.
    pub fn new(
        identity: Identity,
        settings: CallerSettings,
        renderer: Arc<R>,
        net: &Arc<NetState>,
    ) -> Self {
        Self {
            id: CallerId::new(),
            identity,
            settings,
            renderer,
            net: Arc::clone(net),
            events: net.subscribe(),
            phase: CallerPhase::Cq,
            last_stamp: 0,
        }
    }

    /// This caller's identifier, for logs and teardown bookkeeping.
    pub const fn id(&self) -> CallerId {
        self.id
    }

    /// This caller's true identity.
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Poll the broadcast cell until the terminal event arrives.
    ///
    /// Each tick reads the latest event; the terminal check comes
    /// before the stamp check so teardown is honored even for an event
    /// the caller would otherwise consider already handled.
    pub async fn run(mut self) {
        info!(id = %self.id, caller = %self.identity, wpm = self.settings.speed_wpm, "caller on frequency");
        let mut ticker = tokio::time::interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let event = self.events.borrow().clone();
            if event.kind.is_terminal() {
                debug!(id = %self.id, "caller leaving frequency");
                break;
            }
            if event.stamp == self.last_stamp {
                continue;
            }
            self.last_stamp = event.stamp;
            self.handle(event.kind).await;
        }
    }

    async fn handle(&mut self, kind: EventKind) {
        match kind {
            EventKind::Idle | EventKind::Die => {}
            EventKind::Cq => self.on_cq().await,
            EventKind::Partial => self.on_partial().await,
            EventKind::Response => self.on_response().await,
            EventKind::ResendClass => self.on_resend(EventKind::ResendClass).await,
            EventKind::ResendSection => self.on_resend(EventKind::ResendSection).await,
            EventKind::Qrz => self.on_qrz(),
        }
    }

    /// Answer a CQ after a short random delay so concurrent callers
    /// dogpile instead of transmitting in lockstep.
    async fn on_cq(&mut self) {
        let jitter_ms: u64 = rand::rng().random_range(100..=1000);
        tokio::time::sleep(Duration::from_millis(jitter_ms)).await;
        let callsign = self.identity.callsign.clone();
        self.transmit(&callsign).await;
        self.phase = CallerPhase::ResolvingCall;
    }

    /// The operator echoed a partial callsign copy.
    #[allow(clippy::float_cmp)]
    async fn on_partial(&mut self) {
        if self.phase == CallerPhase::CallResolved {
            // The operator is asking about the callsign again, so the
            // contact is no longer settled.
            self.phase = CallerPhase::ResolvingCall;
            self.net.mark_unresolved();
        }
        if self.phase != CallerPhase::ResolvingCall {
            return;
        }

        let guess = self.net.guess().callsign;
        let Some(copy_error) = self.copy_error(&guess) else {
            return;
        };

        if copy_error == EXACT {
            self.transmit("rr").await;
            self.phase = CallerPhase::CallResolved;
            self.net.claim_resolved(self.identity.clone());
        } else if !self.net.call_resolved() && self.partial_could_be_me(copy_error, &guess) {
            let callsign = self.identity.callsign.clone();
            self.transmit(&callsign).await;
        }
    }

    /// Whether a partial echo is close enough to keep competing: a
    /// near miss, a true substring of the callsign, or the operator's
    /// explicit "who is that" query.
    fn partial_could_be_me(&self, copy_error: f64, guess: &str) -> bool {
        copy_error < RETRY_CALL_THRESHOLD
            || guess == "?"
            || (!guess.is_empty() && self.identity.callsign.contains(guess))
    }

    /// The operator sent a full report.
    #[allow(clippy::float_cmp)]
    async fn on_response(&mut self) {
        match self.phase {
            CallerPhase::Cq => {}
            CallerPhase::ResolvingCall => {
                let guess = self.net.guess().callsign;
                let Some(copy_error) = self.copy_error(&guess) else {
                    return;
                };

                if copy_error == EXACT {
                    let phrase = format!("tu {}", self.identity.exchange());
                    self.transmit(&phrase).await;
                    self.phase = CallerPhase::CallResolved;
                    self.net.claim_resolved(self.identity.clone());
                } else if !self.net.call_resolved()
                    && (copy_error < CORRECT_REPORT_THRESHOLD
                        || (!guess.is_empty() && self.identity.callsign.contains(&guess)))
                {
                    // Close, but not mine. Correct the callsign and
                    // repeat the exchange.
                    let phrase =
                        format!("de {} {}", self.identity.callsign, self.identity.exchange());
                    self.transmit(&phrase).await;
                }
            }
            CallerPhase::CallResolved => {
                let phrase = format!("tu {}", self.identity.exchange());
                self.transmit(&phrase).await;
            }
        }
    }

    /// The operator asked for the class or section again. A caller
    /// still resolving takes a close-enough guess as proof the operator
    /// has its callsign, then answers like a resolved caller.
    async fn on_resend(&mut self, kind: EventKind) {
        if self.phase == CallerPhase::Cq {
            return;
        }
        if self.phase == CallerPhase::ResolvingCall {
            let guess = self.net.guess().callsign;
            let Some(copy_error) = self.copy_error(&guess) else {
                return;
            };
            if copy_error < RESEND_ACCEPT_THRESHOLD {
                self.phase = CallerPhase::CallResolved;
                self.net.mark_resolved();
            } else {
                return;
            }
        }

        let field = if kind == EventKind::ResendClass {
            self.identity.class.clone()
        } else {
            self.identity.section.clone()
        };
        self.transmit(&format!("{field} {field}")).await;
    }

    /// Confirmation. The resolved caller publishes its identity and
    /// leaves the slot for grading; everyone else ignores it.
    fn on_qrz(&mut self) {
        if self.phase == CallerPhase::CallResolved {
            self.net.claim_resolved(self.identity.clone());
        }
    }

    /// Render one phrase, bounded by its estimated transmission time.
    /// Render failures are logged and dropped; a missed transmission is
    /// part of the simulation, not a caller fault.
    async fn transmit(&self, phrase: &str) {
        let limit = match transmit_duration(phrase, self.settings.speed_wpm) {
            Ok(limit) => limit,
            Err(timing_error) => {
                error!(id = %self.id, %timing_error, phrase, "unrenderable phrase");
                return;
            }
        };
        debug!(id = %self.id, phrase, ?limit, "transmitting");
        if let Err(render_error) = self
            .renderer
            .render(
                self.settings.tone_hz,
                self.settings.speed_wpm,
                self.settings.volume,
                phrase,
                limit,
            )
            .await
        {
            warn!(id = %self.id, %render_error, phrase, "transmission lost");
        }
    }

    /// Copy error of the operator's callsign guess against this
    /// caller's true callsign.
    fn copy_error(&self, guess: &str) -> Option<f64> {
        match dissimilarity(&self.identity.callsign, guess) {
            Ok(copy_error) => Some(copy_error),
            Err(score_error) => {
                error!(id = %self.id, %score_error, "cannot score operator guess");
                None
            }
        }
    }
}
