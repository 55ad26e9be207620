//! Interactive entry point for the Field Day pileup trainer.
//!
//! The trainer wires three pieces together: a pool of simulated caller
//! tasks, the shared broadcast net they poll, and the operator console
//! reading commands from stdin. Each console command becomes an on-air
//! operator action; the pileup reacts on its own cadence through the
//! external Morse renderer.
//!
//! ```text
//! stdin --> Command --> OperatorPosition --> NetState --> Caller pool
//!                                                           |
//!                               morse renderer  <-----------+
//! ```
//!
//! Logging a contact grades the operator's copy against the identity
//! the winning caller published, then spawns the next pileup.

mod command;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use pileup_core::config::TrainerConfig;
use pileup_sim::{MorseProcess, OperatorPosition, RoundOrchestrator};
use pileup_types::{GuessState, Identity};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::command::{Command, HELP, parse};

/// Application entry point.
///
/// Initializes logging, loads configuration (explicit path argument,
/// then `pileup.yaml` beside the binary, then built-in defaults),
/// spawns the first pileup, and runs the console loop until `quit`.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or stdin
/// fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("pileup-trainer starting");

    let config = load_config(std::env::args().nth(1))?;
    info!(
        station = config.station.callsign,
        max_callers = config.callers.max_callers,
        min_wpm = config.callers.min_speed_wpm,
        max_wpm = config.callers.max_speed_wpm,
        "configuration loaded"
    );

    let renderer = Arc::new(MorseProcess::new());
    let mut rounds = RoundOrchestrator::new(&config, Arc::clone(&renderer));
    let operator = OperatorPosition::new(
        config.station.clone(),
        config.audio.clone(),
        renderer,
        rounds.net(),
    );

    rounds.spawn_round();
    rounds.start_auto_cq();
    println!("{HELP}");
    println!("pileup on frequency -- call cq to start");

    // Long enough for the winning caller to observe QRZ and publish.
    let claim_lag = Duration::from_millis(config.round.poll_interval_ms.saturating_mul(3));

    let mut copy = GuessState::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(parsed) = parse(&line) else {
            if !line.trim().is_empty() {
                println!("unknown command (help lists them)");
            }
            continue;
        };

        match parsed {
            Command::Cq => operator.call_cq().await,
            Command::SetCall(text) => {
                copy.callsign = text;
                operator.update_guess(&copy.callsign, &copy.class, &copy.section);
            }
            Command::SetClass(text) => {
                copy.class = text;
                operator.update_guess(&copy.callsign, &copy.class, &copy.section);
            }
            Command::SetSection(text) => {
                copy.section = text;
                operator.update_guess(&copy.callsign, &copy.class, &copy.section);
            }
            Command::RepeatCall => operator.ask_repeat_call().await,
            Command::RepeatClass => operator.ask_repeat_class().await,
            Command::RepeatSection => operator.ask_repeat_section().await,
            Command::Report => operator.send_report().await,
            Command::Log => {
                operator.confirm().await;
                tokio::time::sleep(claim_lag).await;
                let graded = operator.net().guess();
                println!("{}", grade(operator.resolved().as_ref(), &graded));
                copy = GuessState::default();
                operator.update_guess("", "", "");
                rounds.next_round().await;
                println!("new pileup on frequency");
            }
            Command::Next => {
                copy = GuessState::default();
                operator.update_guess("", "", "");
                rounds.next_round().await;
                println!("new pileup on frequency");
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
        }
    }

    rounds.shutdown().await;
    info!("pileup-trainer stopped");
    Ok(())
}

/// Resolve the configuration: an explicit path argument must load; with
/// no argument, `pileup.yaml` is used if present, built-in defaults
/// otherwise.
fn load_config(path_arg: Option<String>) -> Result<TrainerConfig, pileup_core::config::ConfigError> {
    if let Some(path) = path_arg {
        return TrainerConfig::from_file(Path::new(&path));
    }
    let fallback = Path::new("pileup.yaml");
    if fallback.exists() {
        return TrainerConfig::from_file(fallback);
    }
    Ok(TrainerConfig::default())
}

/// Grade the operator's copy against the published contact.
fn grade(resolved: Option<&Identity>, copy: &GuessState) -> String {
    let Some(identity) = resolved else {
        return String::from("nothing to log -- no caller confirmed the contact");
    };
    if copy.callsign == identity.callsign
        && copy.class == identity.class
        && copy.section == identity.section
    {
        format!("good contact: {identity}")
    } else {
        format!(
            "busted copy: worked {identity}, logged {} {} {}",
            placeholder(&copy.callsign),
            placeholder(&copy.class),
            placeholder(&copy.section),
        )
    }
}

/// Show an empty copy field as a placeholder in the grade line.
const fn placeholder(field: &str) -> &str {
    if field.is_empty() { "?" } else { field }
}
