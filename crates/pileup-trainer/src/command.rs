//! The console command grammar.
//!
//! One line of input is one operator action. Commands that carry text
//! (`call`, `class`, `sect`) update the operator's copy; the rest map
//! one-to-one onto on-air actions.

/// One parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Call CQ.
    Cq,
    /// Update the callsign copy.
    SetCall(String),
    /// Update the class copy.
    SetClass(String),
    /// Update the section copy.
    SetSection(String),
    /// Echo the callsign copy and ask who that was.
    RepeatCall,
    /// Ask for the class again.
    RepeatClass,
    /// Ask for the section again.
    RepeatSection,
    /// Send the full report.
    Report,
    /// Confirm the contact, grade the copy, start the next round.
    Log,
    /// Dump this pileup and spawn a fresh one.
    Next,
    /// Show the command list.
    Help,
    /// Exit the trainer.
    Quit,
}

/// Parse one console line. Returns `None` for blank lines and
/// anything not in the grammar.
pub fn parse(line: &str) -> Option<Command> {
    let trimmed = line.trim();
    let (verb, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (trimmed, ""),
    };

    match verb.to_ascii_lowercase().as_str() {
        "cq" => Some(Command::Cq),
        "call" => Some(Command::SetCall(rest.to_owned())),
        "class" => Some(Command::SetClass(rest.to_owned())),
        "sect" => Some(Command::SetSection(rest.to_owned())),
        "agn" | "again" => Some(Command::RepeatCall),
        "class?" => Some(Command::RepeatClass),
        "sect?" => Some(Command::RepeatSection),
        "report" => Some(Command::Report),
        "log" => Some(Command::Log),
        "next" => Some(Command::Next),
        "help" | "?" => Some(Command::Help),
        "quit" | "exit" => Some(Command::Quit),
        _ => None,
    }
}

/// The help text shown at startup and on `help`.
pub const HELP: &str = "\
commands:
  cq             call CQ
  call <text>    set the callsign copy
  class <text>   set the class copy
  sect <text>    set the section copy
  agn            ask the pileup to repeat the callsign
  class?         ask for the class again
  sect?          ask for the section again
  report         send the full report
  log            confirm the contact, grade it, next pileup
  next           dump this pileup and spawn a new one
  help           show this list
  quit           exit";
