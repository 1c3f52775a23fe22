//! Session manager for an external UCI chess engine
//!
//! Spawns an engine executable (typically Stockfish), performs the `uci`
//! handshake, applies a skill level and runs bounded analysis requests,
//! decoding the engine's progress lines into live telemetry.
//!
//! ## Module Organization
//!
//! - `protocol` - UCI command rendering and output parsing
//! - `session` - The [`EngineSession`] state machine
//! - `transport` - Process pipes and the scripted test transport
//! - `error` - [`BridgeError`] and [`BridgeResult`]

pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;

pub use error::{BridgeError, BridgeResult};
pub use protocol::{
    parse_line, EngineCommand, EngineEvent, Evaluation, InfoLine, Score, ScoreBound,
    SKILL_LEVEL_OPTION,
};
pub use session::{
    AnalysisRequest, EngineSession, EngineSnapshot, LogBuffer, LogDirection, LogEntry,
    SessionConfig, SessionPhase, SessionUpdate, SessionWarning, SkillClamp, SkillLevel,
    DEFAULT_LOG_CAPACITY, MAX_SKILL_LEVEL, MIN_SKILL_LEVEL,
};
pub use transport::{EngineTransport, ProcessTransport, TransportEvent};
#[cfg(any(test, feature = "test-utils"))]
pub use transport::{ScriptHandle, ScriptedTransport};
