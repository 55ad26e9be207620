//! External Morse audio renderer interface.
//!
//! The trainer does not synthesize audio itself; it shells out to an
//! external renderer (the `morse` program) that plays a phrase as a
//! tone sequence and blocks for its real duration. Every call is
//! bounded by a timeout derived from the transmission timing model; a
//! timeout is a non-fatal miss that the caller logs and moves past.
//!
//! [`RecordingRenderer`] is the test double: it records what would have
//! been sent instead of making sound.

use std::future::Future;
use std::process::Stdio;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

/// Errors from a render call.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The renderer process could not be spawned or awaited.
    #[error("failed to run morse renderer: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The renderer did not finish within the transmission-time bound.
    #[error("renderer exceeded the {limit:?} transmission bound")]
    Timeout {
        /// The bound that was exceeded.
        limit: Duration,
    },
}

/// An external collaborator that renders a phrase as Morse audio.
///
/// Calls block the invoking task for the real transmission duration
/// (bounded by `limit`); they never block other callers or the
/// orchestrator.
pub trait MorseRenderer: Send + Sync + 'static {
    /// Render `phrase` at the given pitch, speed, and volume, giving up
    /// after `limit`.
    fn render(
        &self,
        tone_hz: u32,
        wpm: u32,
        volume: f32,
        phrase: &str,
        limit: Duration,
    ) -> impl Future<Output = Result<(), RenderError>> + Send;
}

/// Renderer that invokes the external `morse` program.
#[derive(Debug, Clone)]
pub struct MorseProcess {
    /// Program name or path to invoke.
    program: String,
}

impl MorseProcess {
    /// Use the `morse` program from `PATH`.
    pub fn new() -> Self {
        Self {
            program: String::from("morse"),
        }
    }

    /// Use a specific program name or path.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for MorseProcess {
    fn default() -> Self {
        Self::new()
    }
}

impl MorseRenderer for MorseProcess {
    fn render(
        &self,
        tone_hz: u32,
        wpm: u32,
        volume: f32,
        phrase: &str,
        limit: Duration,
    ) -> impl Future<Output = Result<(), RenderError>> + Send {
        async move {
            let mut command = Command::new(&self.program);
            command
                .arg("-f")
                .arg(tone_hz.to_string())
                .arg("-w")
                .arg(wpm.to_string())
                .arg("-v")
                .arg(volume.to_string())
                .arg(phrase)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                // The caller task owning this render may be aborted
                // during round teardown; the child must go with it.
                .kill_on_drop(true);

            let mut child = command.spawn()?;
            match tokio::time::timeout(limit, child.wait()).await {
                Err(_elapsed) => {
                    // Stop the tone; a render never outlives its bound.
                    if let Err(kill_error) = child.kill().await {
                        warn!(%kill_error, "failed to kill timed-out renderer");
                    }
                    Err(RenderError::Timeout { limit })
                }
                Ok(Err(source)) => Err(RenderError::Io { source }),
                Ok(Ok(status)) => {
                    if !status.success() {
                        // A non-zero exit is not a failed transmission;
                        // the tone may still have played.
                        debug!(?status, "morse renderer exited non-zero");
                    }
                    Ok(())
                }
            }
        }
    }
}

/// One recorded would-be transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transmission {
    /// The phrase that would have been rendered.
    pub phrase: String,
    /// Sending speed in words per minute.
    pub wpm: u32,
    /// Tone pitch in hertz.
    pub tone_hz: u32,
}

/// Test renderer that records transmissions instead of making sound.
///
/// An optional artificial delay simulates a slow or wedged renderer;
/// when the delay exceeds the caller's bound the render times out and
/// nothing is recorded, exactly like a real missed transmission.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    log: Mutex<Vec<Transmission>>,
    delay: Option<Duration>,
}

impl RecordingRenderer {
    /// A renderer that records instantly.
    pub const fn new() -> Self {
        Self {
            log: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// A renderer that takes `delay` per transmission.
    pub const fn with_delay(delay: Duration) -> Self {
        Self {
            log: Mutex::new(Vec::new()),
            delay: Some(delay),
        }
    }

    /// Everything transmitted so far.
    pub fn transmissions(&self) -> Vec<Transmission> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Just the phrases, in transmission order.
    pub fn phrases(&self) -> Vec<String> {
        self.transmissions()
            .into_iter()
            .map(|t| t.phrase)
            .collect()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl MorseRenderer for RecordingRenderer {
    fn render(
        &self,
        tone_hz: u32,
        wpm: u32,
        _volume: f32,
        phrase: &str,
        limit: Duration,
    ) -> impl Future<Output = Result<(), RenderError>> + Send {
        let phrase = phrase.to_owned();
        async move {
            if let Some(delay) = self.delay {
                if delay > limit {
                    tokio::time::sleep(limit).await;
                    return Err(RenderError::Timeout { limit });
                }
                tokio::time::sleep(delay).await;
            }
            self.log
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(Transmission {
                    phrase,
                    wpm,
                    tone_hz,
                });
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recording_renderer_records_in_order() {
        let renderer = RecordingRenderer::new();
        renderer
            .render(650, 20, 0.3, "K6GTE", Duration::from_secs(10))
            .await
            .unwrap();
        renderer
            .render(700, 25, 0.3, "rr", Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(renderer.phrases(), vec!["K6GTE", "rr"]);
        let first = renderer.transmissions().first().cloned().unwrap();
        assert_eq!(first.wpm, 20);
        assert_eq!(first.tone_hz, 650);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_renderer_times_out_and_records_nothing() {
        let renderer = RecordingRenderer::with_delay(Duration::from_secs(60));
        let result = renderer
            .render(650, 20, 0.3, "K6GTE", Duration::from_secs(5))
            .await;
        assert!(matches!(result, Err(RenderError::Timeout { .. })));
        assert!(renderer.phrases().is_empty());
    }

    #[tokio::test]
    async fn clear_discards_the_log() {
        let renderer = RecordingRenderer::new();
        renderer
            .render(650, 20, 0.3, "K6GTE", Duration::from_secs(10))
            .await
            .unwrap();
        renderer.clear();
        assert!(renderer.phrases().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timed_out_renderer_child_is_killed() {
        use std::os::unix::fs::PermissionsExt;

        let dir = std::env::temp_dir().join(format!("pileup-render-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let marker = dir.join("kept-playing");
        let script = dir.join("slow-morse.sh");
        std::fs::write(
            &script,
            format!("#!/bin/sh\nsleep 3\ntouch {}\n", marker.display()),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let renderer = MorseProcess::with_program(script.to_string_lossy().into_owned());
        let result = renderer
            .render(650, 20, 0.3, "K6GTE", Duration::from_secs(1))
            .await;
        assert!(matches!(result, Err(RenderError::Timeout { .. })));

        // A surviving child would reach the marker write here.
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(
            !marker.exists(),
            "renderer child outlived the transmission bound"
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn missing_program_is_an_io_error() {
        let renderer = MorseProcess::with_program("/nonexistent/morse-renderer");
        let result = renderer
            .render(650, 20, 0.3, "CQ", Duration::from_secs(5))
            .await;
        assert!(matches!(result, Err(RenderError::Io { .. })));
    }
}
