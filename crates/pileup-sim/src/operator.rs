//! The operator's side of the frequency.
//!
//! Every operator action does two things in order: render the phrase
//! the operator would actually send on the air, then publish the
//! matching event to the broadcast cell so the caller pool can react.
//! Guess text is sanitized before it reaches the shared state, so
//! callers only ever score uppercase alphanumerics (plus the literal
//! `?` query).

use std::sync::Arc;

use pileup_core::config::{AudioConfig, StationConfig};
use pileup_core::timing::transmit_duration;
use pileup_types::{EventKind, GuessState, Identity};
use tracing::{debug, error, warn};

use crate::audio::MorseRenderer;
use crate::net::NetState;

/// The operator's station: their identity, their key, their copy.
#[derive(Debug)]
pub struct OperatorPosition<R> {
    station: StationConfig,
    audio: AudioConfig,
    renderer: Arc<R>,
    net: Arc<NetState>,
}

impl<R: MorseRenderer> OperatorPosition<R> {
    /// Put the operator on the given net.
    pub fn new(
        station: StationConfig,
        audio: AudioConfig,
        renderer: Arc<R>,
        net: &Arc<NetState>,
    ) -> Self {
        Self {
            station,
            audio,
            renderer,
            net: Arc::clone(net),
        }
    }

    /// The net this operator transmits on.
    pub const fn net(&self) -> &Arc<NetState> {
        &self.net
    }

    /// Call CQ and invite the pileup.
    pub async fn call_cq(&self) {
        let phrase = format!("CQ FD DE {}", self.station.callsign);
        self.transmit(&phrase).await;
        self.net.broadcast(EventKind::Cq);
    }

    /// Send a full report: the copied callsign plus the operator's own
    /// exchange.
    pub async fn send_report(&self) {
        let guess = self.net.guess();
        let phrase = format!(
            "{} {} {}",
            guess.callsign, self.station.class, self.station.section
        );
        self.transmit(&phrase).await;
        self.net.broadcast(EventKind::Response);
    }

    /// Echo the (possibly partial) callsign copy and ask the pileup
    /// who that was. An empty copy goes out as the bare `?` query.
    pub async fn ask_repeat_call(&self) {
        let guess = self.net.guess();
        let phrase = if guess.callsign.is_empty() {
            String::from("?")
        } else {
            guess.callsign
        };
        self.transmit(&phrase).await;
        self.net.broadcast(EventKind::Partial);
    }

    /// Ask the resolved caller to repeat its class.
    pub async fn ask_repeat_class(&self) {
        self.transmit("class?").await;
        self.net.broadcast(EventKind::ResendClass);
    }

    /// Ask the resolved caller to repeat its section.
    pub async fn ask_repeat_section(&self) {
        self.transmit("sect?").await;
        self.net.broadcast(EventKind::ResendSection);
    }

    /// Confirm the contact and invite the next caller. The winning
    /// caller publishes its identity on its next poll, so the resolved
    /// slot may lag this call by up to one poll interval.
    pub async fn confirm(&self) {
        self.transmit("tu qrz?").await;
        self.net.broadcast(EventKind::Qrz);
    }

    /// The identity of the caller that completed the exchange, once
    /// one has.
    pub fn resolved(&self) -> Option<Identity> {
        self.net.resolved()
    }

    /// Replace the operator's transcription. Each field is trimmed,
    /// uppercased, and stripped to alphanumerics plus `?`.
    pub fn update_guess(&self, callsign: &str, class: &str, section: &str) {
        self.net.set_guess(GuessState {
            callsign: sanitize(callsign),
            class: sanitize(class),
            section: sanitize(section),
        });
    }

    async fn transmit(&self, phrase: &str) {
        let limit = match transmit_duration(phrase, self.station.speed_wpm) {
            Ok(limit) => limit,
            Err(timing_error) => {
                error!(%timing_error, phrase, "unrenderable operator phrase");
                return;
            }
        };
        debug!(phrase, ?limit, "operator transmitting");
        if let Err(render_error) = self
            .renderer
            .render(
                self.audio.side_tone_hz,
                self.station.speed_wpm,
                self.audio.volume,
                phrase,
                limit,
            )
            .await
        {
            warn!(%render_error, phrase, "operator transmission lost");
        }
    }
}

/// Normalize raw operator input to what goes on the air: uppercase
/// ASCII alphanumerics, with `?` kept as the explicit query character.
fn sanitize(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|character| character.is_ascii_alphanumeric() || *character == '?')
        .map(|character| character.to_ascii_uppercase())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::audio::RecordingRenderer;

    fn operator(
        net: &Arc<NetState>,
        renderer: &Arc<RecordingRenderer>,
    ) -> OperatorPosition<RecordingRenderer> {
        OperatorPosition::new(
            StationConfig::default(),
            AudioConfig::default(),
            Arc::clone(renderer),
            net,
        )
    }

    #[test]
    fn sanitize_normalizes_raw_input() {
        assert_eq!(sanitize("  k6gte "), "K6GTE");
        assert_eq!(sanitize("k6-gte!"), "K6GTE");
        assert_eq!(sanitize("w6?"), "W6?");
        assert_eq!(sanitize("?"), "?");
        assert_eq!(sanitize("   "), "");
    }

    #[tokio::test]
    async fn cq_goes_on_the_air_then_on_the_net() {
        let net = Arc::new(NetState::new());
        let renderer = Arc::new(RecordingRenderer::new());
        let op = operator(&net, &renderer);

        op.call_cq().await;
        assert_eq!(renderer.phrases(), vec!["CQ FD DE N0CALL"]);
        assert_eq!(net.latest().kind, EventKind::Cq);
    }

    #[tokio::test]
    async fn report_combines_copy_and_own_exchange() {
        let net = Arc::new(NetState::new());
        let renderer = Arc::new(RecordingRenderer::new());
        let op = operator(&net, &renderer);

        op.update_guess("k6gte", "", "");
        op.send_report().await;
        assert_eq!(renderer.phrases(), vec!["K6GTE 1D MDC"]);
        assert_eq!(net.latest().kind, EventKind::Response);
    }

    #[tokio::test]
    async fn empty_copy_is_queried_as_question_mark() {
        let net = Arc::new(NetState::new());
        let renderer = Arc::new(RecordingRenderer::new());
        let op = operator(&net, &renderer);

        op.ask_repeat_call().await;
        assert_eq!(renderer.phrases(), vec!["?"]);
        assert_eq!(net.latest().kind, EventKind::Partial);
    }

    #[tokio::test]
    async fn partial_copy_is_echoed_verbatim() {
        let net = Arc::new(NetState::new());
        let renderer = Arc::new(RecordingRenderer::new());
        let op = operator(&net, &renderer);

        op.update_guess("k6g", "", "");
        op.ask_repeat_call().await;
        assert_eq!(renderer.phrases(), vec!["K6G"]);
        assert_eq!(net.guess().callsign, "K6G");
    }

    #[tokio::test]
    async fn resend_queries_use_distinct_events() {
        let net = Arc::new(NetState::new());
        let renderer = Arc::new(RecordingRenderer::new());
        let op = operator(&net, &renderer);

        op.ask_repeat_class().await;
        assert_eq!(net.latest().kind, EventKind::ResendClass);
        op.ask_repeat_section().await;
        assert_eq!(net.latest().kind, EventKind::ResendSection);
        assert_eq!(renderer.phrases(), vec!["class?", "sect?"]);
    }

    #[tokio::test]
    async fn confirm_broadcasts_qrz() {
        let net = Arc::new(NetState::new());
        let renderer = Arc::new(RecordingRenderer::new());
        let op = operator(&net, &renderer);

        op.confirm().await;
        assert_eq!(renderer.phrases(), vec!["tu qrz?"]);
        assert_eq!(net.latest().kind, EventKind::Qrz);
        assert!(op.resolved().is_none());
    }
}
