//! Session phase, telemetry and diagnostics

use crate::protocol::{Evaluation, InfoLine};
use crate::session::skill::SkillClamp;

/// Lifecycle phase of an engine session
///
/// ```text
/// Starting ──uciok──▶ Ready ◀──bestmove / stop──▶ Analyzing
///     │                 │                             │
///     └──────── transport error ─────▶ Failed ◀───────┘
/// any ──dispose──▶ Disposed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// `uci` sent, waiting for `uciok`
    Starting,
    /// Idle and accepting analysis requests
    Ready,
    /// A search is in flight
    Analyzing,
    /// The transport failed; nothing is sent until restart
    Failed,
    /// The process was terminated; the session is inert
    Disposed,
}

impl SessionPhase {
    /// Whether the engine accepts commands in this phase
    pub fn is_ready(self) -> bool {
        matches!(self, SessionPhase::Ready | SessionPhase::Analyzing)
    }
}

/// Live telemetry of the current (or last) search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineSnapshot {
    pub best_move: Option<String>,
    pub ponder: Option<String>,
    pub evaluation: Option<Evaluation>,
    pub depth: u32,
    pub seldepth: u32,
    pub nodes: u64,
    pub nps: u64,
    pub pv: Vec<String>,
}

impl EngineSnapshot {
    /// Overwrite every field the info line carries
    pub(crate) fn apply_info(&mut self, info: &InfoLine) {
        if let Some(depth) = info.depth {
            self.depth = depth;
        }
        if let Some(seldepth) = info.seldepth {
            self.seldepth = seldepth;
        }
        if let Some(nodes) = info.nodes {
            self.nodes = nodes;
        }
        if let Some(nps) = info.nps {
            self.nps = nps;
        }
        if let Some(score) = info.score {
            self.evaluation = Some(score.to_evaluation());
        }
        if !info.pv.is_empty() {
            self.pv = info.pv.clone();
        }
    }
}

/// Non-fatal conditions recorded by the session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionWarning {
    /// A difficulty request was coerced into range
    DifficultyClamped(SkillClamp),
    /// The transport reported an error
    TransportFailure { message: String },
    /// A `bestmove` for a stopped or superseded search was discarded
    StaleBestMove { sequence: u64, best: Option<String> },
}

/// What handling one transport event changed
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// Handshake completed
    Ready,
    /// Telemetry of the active search changed
    Progress,
    /// The active search finished
    BestMove {
        sequence: u64,
        best: Option<String>,
    },
    /// A late result was discarded
    Stale { sequence: u64 },
    /// The transport failed
    Failed { message: String },
    /// The line changed nothing
    Ignored,
}
