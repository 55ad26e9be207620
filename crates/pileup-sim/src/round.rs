//! Round lifecycle: spawn a pileup, tear it down, start the next one.
//!
//! A round begins with a randomly sized batch of freshly generated
//! callers and ends when the operator confirms a contact (or gives up).
//! Teardown is cooperative first and forceful second: the terminal
//! event is broadcast, each caller gets a grace period to observe it on
//! its own polling cadence, and only stragglers are aborted. After
//! teardown the broadcast cell is returned to idle so the next round's
//! callers start from a clean frequency.
//!
//! An optional auto-CQ watchdog reissues CQ when the operator has been
//! idle too long, mirroring a real contester's "fill dead air" habit.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use pileup_core::config::{AudioConfig, CallerPoolConfig, RoundConfig, TrainerConfig};
use pileup_core::identity::generate_identity;
use pileup_types::{CallerId, EventKind, Identity};
use rand::Rng;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::audio::MorseRenderer;
use crate::caller::{Caller, CallerSettings};
use crate::net::NetState;

/// Bookkeeping for one running caller task.
#[derive(Debug)]
struct RunningCaller {
    id: CallerId,
    callsign: String,
    handle: JoinHandle<()>,
}

/// Owns the caller pool and the shared net for a training session.
#[derive(Debug)]
pub struct RoundOrchestrator<R> {
    net: Arc<NetState>,
    renderer: Arc<R>,
    audio: AudioConfig,
    callers: CallerPoolConfig,
    round: RoundConfig,
    pool: Vec<RunningCaller>,
    auto_cq: Option<JoinHandle<()>>,
}

impl<R: MorseRenderer> RoundOrchestrator<R> {
    /// Create an orchestrator with a fresh net and an empty pool.
    pub fn new(config: &TrainerConfig, renderer: Arc<R>) -> Self {
        Self {
            net: Arc::new(NetState::new()),
            renderer,
            audio: config.audio.clone(),
            callers: config.callers.clone(),
            round: config.round.clone(),
            pool: Vec::new(),
            auto_cq: None,
        }
    }

    /// The shared net, for wiring up the operator surface.
    pub const fn net(&self) -> &Arc<NetState> {
        &self.net
    }

    /// Number of caller tasks spawned for the current round.
    pub fn live_callers(&self) -> usize {
        self.pool.len()
    }

    /// Spawn a new pileup: a random batch of generated callers, sized
    /// between one and the configured maximum (further capped by
    /// available hardware parallelism).
    pub fn spawn_round(&mut self) -> usize {
        let parallelism = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        let cap = self
            .callers
            .max_callers
            .min(u32::try_from(parallelism).unwrap_or(u32::MAX))
            .max(1);

        let count = rand::rng().random_range(1..=cap);
        for _ in 0..count {
            match generate_identity(&mut rand::rng()) {
                Ok(identity) => self.spawn_caller(identity),
                Err(identity_error) => {
                    // A generated callsign always carries a call-area
                    // digit; reaching this is a generator defect.
                    warn!(%identity_error, "skipping malformed generated identity");
                }
            }
        }
        info!(count = self.pool.len(), "pileup spawned");
        self.pool.len()
    }

    /// Spawn one caller with a known identity. Speed and pitch are
    /// still randomized within the configured ranges.
    pub fn spawn_caller(&mut self, identity: Identity) {
        let mut rng = rand::rng();
        let speed_range = self.callers.min_speed_wpm..=self.callers.max_speed_wpm;
        let speed_wpm = rng.random_range(speed_range);
        let half_band = self.audio.bandwidth_hz / 2;
        let tone_hz = self
            .audio
            .side_tone_hz
            .saturating_sub(half_band)
            .saturating_add(rng.random_range(0..=self.audio.bandwidth_hz));

        let settings = CallerSettings {
            tone_hz,
            speed_wpm,
            volume: self.audio.volume,
            poll_interval: Duration::from_millis(self.round.poll_interval_ms),
        };
        let caller = Caller::new(identity, settings, Arc::clone(&self.renderer), &self.net);
        self.pool.push(RunningCaller {
            id: caller.id(),
            callsign: caller.identity().callsign.clone(),
            handle: tokio::spawn(caller.run()),
        });
    }

    /// Tear down the current pileup.
    ///
    /// Broadcasts the terminal event, waits up to the configured grace
    /// period for each caller to exit on its own, and aborts the ones
    /// that do not. Finally resets the net so the cell holds the idle
    /// event when the next round spawns.
    pub async fn end_round(&mut self) {
        if self.pool.is_empty() {
            self.net.reset_round();
            return;
        }

        self.net.broadcast(EventKind::Die);
        let grace = Duration::from_millis(self.round.die_grace_ms);

        for mut caller in self.pool.drain(..) {
            match tokio::time::timeout(grace, &mut caller.handle).await {
                Ok(_) => {}
                Err(_elapsed) => {
                    warn!(id = %caller.id, callsign = %caller.callsign, "caller missed teardown, aborting");
                    caller.handle.abort();
                }
            }
        }

        self.net.broadcast(EventKind::Idle);
        self.net.reset_round();
        info!("round torn down");
    }

    /// End the current round and spawn the next pileup.
    pub async fn next_round(&mut self) -> usize {
        self.end_round().await;
        self.spawn_round()
    }

    /// Start the idle watchdog that reissues CQ after the configured
    /// silence. A zero threshold disables it.
    pub fn start_auto_cq(&mut self) {
        if self.round.auto_cq_secs == 0 || self.auto_cq.is_some() {
            return;
        }
        let net = Arc::clone(&self.net);
        let threshold = Duration::from_secs(self.round.auto_cq_secs);
        self.auto_cq = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            loop {
                ticker.tick().await;
                if net.idle_elapsed() >= threshold {
                    info!("operator idle, reissuing CQ");
                    net.broadcast(EventKind::Cq);
                }
            }
        }));
    }

    /// Tear everything down, watchdog included.
    pub async fn shutdown(&mut self) {
        if let Some(watchdog) = self.auto_cq.take() {
            watchdog.abort();
        }
        self.end_round().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::audio::RecordingRenderer;

    fn identity(callsign: &str) -> Identity {
        Identity {
            callsign: String::from(callsign),
            class: String::from("2A"),
            section: String::from("EB"),
        }
    }

    fn config() -> TrainerConfig {
        let mut config = TrainerConfig::default();
        config.round.poll_interval_ms = 10;
        config.round.die_grace_ms = 200;
        config
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_secs(30)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn spawn_round_respects_the_cap() {
        let mut orchestrator =
            RoundOrchestrator::new(&config(), Arc::new(RecordingRenderer::new()));
        let count = orchestrator.spawn_round();
        assert!(count >= 1);
        assert!(count <= 3);
        assert_eq!(orchestrator.live_callers(), count);
        orchestrator.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_callers_answer_a_cq() {
        let renderer = Arc::new(RecordingRenderer::new());
        let mut orchestrator = RoundOrchestrator::new(&config(), Arc::clone(&renderer));
        orchestrator.spawn_caller(identity("K6GTE"));
        orchestrator.spawn_caller(identity("W1AW"));

        orchestrator.net().broadcast(EventKind::Cq);
        settle().await;

        let mut phrases = renderer.phrases();
        phrases.sort();
        assert_eq!(phrases, vec!["K6GTE", "W1AW"]);
        orchestrator.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_isolates_rounds() {
        let renderer = Arc::new(RecordingRenderer::new());
        let mut orchestrator = RoundOrchestrator::new(&config(), Arc::clone(&renderer));
        orchestrator.spawn_caller(identity("K6GTE"));
        orchestrator.net().broadcast(EventKind::Cq);
        settle().await;

        orchestrator.end_round().await;
        assert_eq!(orchestrator.live_callers(), 0);
        assert_eq!(orchestrator.net().latest().kind, EventKind::Idle);
        renderer.clear();

        orchestrator.spawn_caller(identity("W1AW"));
        orchestrator.net().broadcast(EventKind::Cq);
        settle().await;

        // Only the new round's caller is on the air.
        assert_eq!(renderer.phrases(), vec!["W1AW"]);
        orchestrator.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_clears_the_resolved_slot() {
        let renderer = Arc::new(RecordingRenderer::new());
        let mut orchestrator = RoundOrchestrator::new(&config(), Arc::clone(&renderer));
        orchestrator.spawn_caller(identity("K6GTE"));
        orchestrator.net().claim_resolved(identity("K6GTE"));

        orchestrator.end_round().await;
        assert!(orchestrator.net().resolved().is_none());
        assert!(!orchestrator.net().call_resolved());
    }

    #[tokio::test(start_paused = true)]
    async fn next_round_replaces_the_pool() {
        let renderer = Arc::new(RecordingRenderer::new());
        let mut orchestrator = RoundOrchestrator::new(&config(), Arc::clone(&renderer));
        orchestrator.spawn_caller(identity("K6GTE"));

        let count = orchestrator.next_round().await;
        assert!(count >= 1);
        assert_eq!(orchestrator.live_callers(), count);
        orchestrator.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn auto_cq_fires_after_idle_threshold() {
        let renderer = Arc::new(RecordingRenderer::new());
        let mut trainer_config = config();
        trainer_config.round.auto_cq_secs = 15;
        let mut orchestrator = RoundOrchestrator::new(&trainer_config, Arc::clone(&renderer));

        orchestrator.start_auto_cq();
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(orchestrator.net().latest().kind, EventKind::Cq);
        orchestrator.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn zero_threshold_disables_auto_cq() {
        let renderer = Arc::new(RecordingRenderer::new());
        let mut trainer_config = config();
        trainer_config.round.auto_cq_secs = 0;
        let mut orchestrator = RoundOrchestrator::new(&trainer_config, Arc::clone(&renderer));

        orchestrator.start_auto_cq();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(orchestrator.net().latest().kind, EventKind::Idle);
        orchestrator.shutdown().await;
    }
}
