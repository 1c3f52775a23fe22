//! Commands sent to the engine

use std::fmt;

/// Name of the UCI option that weakens engine play
pub const SKILL_LEVEL_OPTION: &str = "Skill Level";

/// A single command line understood by a UCI engine
///
/// # Examples
///
/// ```
/// use uci_bridge::EngineCommand;
///
/// let go = EngineCommand::Go { depth: 12, movetime_ms: 1000 };
/// assert_eq!(go.to_string(), "go depth 12 movetime 1000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    /// Handshake request, answered by `uciok`
    Uci,
    /// Synchronisation ping, answered by `readyok`
    IsReady,
    /// Set a named engine option
    SetOption { name: String, value: String },
    /// Load a position from FEN
    Position { fen: String },
    /// Start searching with a depth cap and a time budget
    Go { depth: u32, movetime_ms: u64 },
    /// Halt the current search as soon as possible
    Stop,
}

impl EngineCommand {
    /// Build the `setoption` command for the skill level
    pub fn skill_level(level: u8) -> Self {
        EngineCommand::SetOption {
            name: SKILL_LEVEL_OPTION.to_string(),
            value: level.to_string(),
        }
    }
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineCommand::Uci => f.write_str("uci"),
            EngineCommand::IsReady => f.write_str("isready"),
            EngineCommand::SetOption { name, value } => {
                write!(f, "setoption name {} value {}", name, value)
            }
            EngineCommand::Position { fen } => write!(f, "position fen {}", fen),
            EngineCommand::Go { depth, movetime_ms } => {
                write!(f, "go depth {} movetime {}", depth, movetime_ms)
            }
            EngineCommand::Stop => f.write_str("stop"),
        }
    }
}
