//! Engine session manager
//!
//! [`EngineSession`] owns one engine transport and drives the UCI handshake,
//! analysis requests and difficulty changes. All state is written from the
//! task that owns the session, so no locking is involved: inbound events are
//! handed to the session either by [`EngineSession::pump`] (non-blocking) or
//! [`EngineSession::next_update`] (awaiting).
//!
//! # Request attribution
//!
//! A UCI engine answers every `go` with exactly one `bestmove`, in order.
//! Each `go` is therefore tagged with a sequence number and pushed onto a
//! FIFO of outstanding searches. A `bestmove` always answers the oldest
//! outstanding search, and `info` lines belong to it as well. Both are only
//! applied when that search is the active one; results of stopped or
//! superseded searches are discarded.
//!
//! # Lifecycle
//!
//! The session is an owned resource: dropping it (or calling
//! [`EngineSession::dispose`]) terminates the engine, after which nothing is
//! sent and nothing is applied. Independent sessions can coexist.

mod log;
mod skill;
mod state;
#[cfg(test)]
mod tests;

pub use log::{LogBuffer, LogDirection, LogEntry, DEFAULT_LOG_CAPACITY};
pub use skill::{SkillClamp, SkillLevel, MAX_SKILL_LEVEL, MIN_SKILL_LEVEL};
pub use state::{EngineSnapshot, SessionPhase, SessionUpdate, SessionWarning};

use crate::error::{BridgeError, BridgeResult};
use crate::protocol::{parse_line, EngineCommand, EngineEvent, Evaluation};
use crate::transport::{EngineTransport, ProcessTransport, TransportEvent};
use std::collections::VecDeque;
use std::ffi::OsStr;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Settings applied when a session is created
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Requested skill level; clamped into `[1, 20]`
    pub difficulty: i64,
    /// Number of protocol lines kept in the log
    pub log_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            difficulty: i64::from(SkillLevel::default().get()),
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }
}

/// One search handed to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub sequence: u64,
    pub fen: String,
    pub max_depth: u32,
    pub movetime_ms: u64,
}

/// Connection to one running engine
pub struct EngineSession<T: EngineTransport> {
    id: Uuid,
    transport: Option<T>,
    phase: SessionPhase,
    has_been_ready: bool,
    difficulty: SkillLevel,
    engine_name: Option<String>,
    snapshot: EngineSnapshot,
    next_sequence: u64,
    active: Option<AnalysisRequest>,
    outstanding: VecDeque<u64>,
    log: LogBuffer<LogEntry>,
    warnings: LogBuffer<SessionWarning>,
}

impl EngineSession<ProcessTransport> {
    /// Spawn an engine executable and start the handshake
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let mut session = EngineSession::spawn("stockfish", &[], SessionConfig::default())?;
    /// session.wait_until_ready(Duration::from_secs(5)).await?;
    /// session.analyze(&fen, 20, 1000)?;
    /// let best = session.wait_for_best_move(Duration::from_secs(5)).await?;
    /// ```
    pub fn spawn<S: AsRef<OsStr>>(
        program: S,
        args: &[String],
        config: SessionConfig,
    ) -> BridgeResult<Self> {
        let transport = ProcessTransport::spawn(program, args)?;
        Ok(Self::new(transport, config))
    }

    /// Replace a failed engine process with a fresh one
    pub fn respawn<S: AsRef<OsStr>>(&mut self, program: S, args: &[String]) -> BridgeResult<()> {
        let transport = ProcessTransport::spawn(program, args)?;
        self.restart(transport);
        Ok(())
    }
}

impl<T: EngineTransport> EngineSession<T> {
    /// Take ownership of a transport and send the handshake
    pub fn new(transport: T, config: SessionConfig) -> Self {
        let id = Uuid::new_v4();
        let mut warnings = LogBuffer::with_capacity(config.log_capacity);
        let (difficulty, clamp) = SkillLevel::clamp(config.difficulty);
        if let Some(clamp) = clamp {
            warn!(
                session = %id,
                "[ENGINE] Difficulty must be within 1-20; {} was adjusted to {}",
                clamp.requested, clamp.applied
            );
            warnings.push(SessionWarning::DifficultyClamped(clamp));
        }

        let mut session = Self {
            id,
            transport: Some(transport),
            phase: SessionPhase::Starting,
            has_been_ready: false,
            difficulty,
            engine_name: None,
            snapshot: EngineSnapshot::default(),
            next_sequence: 0,
            active: None,
            outstanding: VecDeque::new(),
            log: LogBuffer::with_capacity(config.log_capacity),
            warnings,
        };

        info!(session = %session.id, "[ENGINE] Session created, starting handshake");
        session.send(EngineCommand::Uci);
        session
    }

    /// Install a new transport and redo the handshake
    ///
    /// Used to recover from [`SessionPhase::Failed`]. The stored difficulty
    /// is re-applied once the new engine acknowledges the handshake.
    /// Difficulty changes stay accepted while the handshake is redone.
    pub fn restart(&mut self, transport: T) {
        if let Some(mut old) = self.transport.take() {
            old.terminate();
        }
        self.transport = Some(transport);
        self.phase = SessionPhase::Starting;
        self.engine_name = None;
        self.active = None;
        self.outstanding.clear();

        info!(session = %self.id, "[ENGINE] Transport replaced, restarting handshake");
        self.send(EngineCommand::Uci);
    }

    // ========================================================================
    // Requests
    // ========================================================================

    /// Start analysing a position
    ///
    /// Sends `position fen ...` followed by `go depth ... movetime ...` and
    /// returns the sequence number of the new request. While a search is
    /// already running it is stopped first and its result will be discarded.
    ///
    /// Rejected with [`BridgeError::NotReady`] before the handshake or after
    /// a transport failure; nothing is sent and no state changes.
    pub fn analyze(&mut self, fen: &str, max_depth: u32, movetime_ms: u64) -> BridgeResult<u64> {
        match self.phase {
            SessionPhase::Disposed => return Err(BridgeError::Disposed),
            SessionPhase::Starting | SessionPhase::Failed => {
                warn!(session = %self.id, "[ENGINE] Analysis requested but engine is not ready");
                return Err(BridgeError::NotReady);
            }
            SessionPhase::Analyzing => {
                if let Some(previous) = self.active.take() {
                    debug!(
                        session = %self.id,
                        "[ENGINE] Superseding request #{} with a new one",
                        previous.sequence
                    );
                }
                self.send(EngineCommand::Stop);
            }
            SessionPhase::Ready => {}
        }

        self.next_sequence += 1;
        let request = AnalysisRequest {
            sequence: self.next_sequence,
            fen: fen.to_string(),
            max_depth,
            movetime_ms,
        };

        self.snapshot = EngineSnapshot::default();
        self.send(EngineCommand::Position {
            fen: request.fen.clone(),
        });
        self.send(EngineCommand::Go {
            depth: max_depth,
            movetime_ms,
        });

        // A send failure above already moved us to Failed
        if self.phase == SessionPhase::Failed {
            return Err(BridgeError::transport("engine transport failed while starting analysis"));
        }

        info!(
            session = %self.id,
            "[ENGINE] Analysis #{} started (depth {}, {}ms)",
            request.sequence, max_depth, movetime_ms
        );
        let sequence = request.sequence;
        self.outstanding.push_back(sequence);
        self.active = Some(request);
        self.phase = SessionPhase::Analyzing;
        Ok(sequence)
    }

    /// Ask the engine to halt the running search
    ///
    /// Returns `false` (and sends nothing) when no search is in flight. The
    /// session returns to `Ready` immediately; a late `bestmove` for the
    /// stopped search is discarded.
    pub fn stop(&mut self) -> bool {
        if self.phase != SessionPhase::Analyzing {
            return false;
        }

        if let Some(request) = self.active.take() {
            info!(session = %self.id, "[ENGINE] Analysis #{} stopped", request.sequence);
        }
        self.send(EngineCommand::Stop);
        if self.phase == SessionPhase::Analyzing {
            self.phase = SessionPhase::Ready;
        }
        true
    }

    /// Change the engine skill level
    ///
    /// Accepted once the handshake has completed at least once; the value is
    /// clamped into `[1, 20]` (recording a warning when coerced) and sent as
    /// a `setoption` command. A running search is not interrupted. During a
    /// re-handshake after [`EngineSession::restart`] the value is stored and
    /// sent on `uciok`.
    pub fn set_difficulty(&mut self, level: i64) -> BridgeResult<SkillLevel> {
        match self.phase {
            SessionPhase::Disposed => return Err(BridgeError::Disposed),
            SessionPhase::Failed => return Err(BridgeError::NotReady),
            _ if !self.has_been_ready => {
                warn!(session = %self.id, "[ENGINE] Difficulty change requested before handshake");
                return Err(BridgeError::NotReady);
            }
            _ => {}
        }

        let (difficulty, clamp) = SkillLevel::clamp(level);
        if let Some(clamp) = clamp {
            warn!(
                session = %self.id,
                "[ENGINE] Difficulty must be within 1-20; {} was adjusted to {}",
                clamp.requested, clamp.applied
            );
            self.warnings.push(SessionWarning::DifficultyClamped(clamp));
        }

        self.difficulty = difficulty;
        if self.phase == SessionPhase::Starting {
            debug!(session = %self.id, "[ENGINE] Skill level {} queued until handshake", difficulty);
            return Ok(difficulty);
        }
        self.send(EngineCommand::skill_level(difficulty.get()));
        Ok(difficulty)
    }

    /// Send `isready`; the engine answers with `readyok`
    pub fn ping(&mut self) -> bool {
        if !self.phase.is_ready() {
            return false;
        }
        self.send(EngineCommand::IsReady)
    }

    // ========================================================================
    // Inbound
    // ========================================================================

    /// Apply one line of engine output
    pub fn handle_line(&mut self, line: &str) -> SessionUpdate {
        if self.phase == SessionPhase::Disposed {
            return SessionUpdate::Ignored;
        }

        self.log.push(LogEntry {
            direction: LogDirection::FromEngine,
            line: line.to_string(),
        });

        let Some(event) = parse_line(line) else {
            return SessionUpdate::Ignored;
        };

        match event {
            EngineEvent::UciOk => self.on_uciok(),
            EngineEvent::ReadyOk => {
                debug!(session = %self.id, "[ENGINE] readyok");
                SessionUpdate::Ignored
            }
            EngineEvent::Id { key, value } => {
                if key == "name" {
                    debug!(session = %self.id, "[ENGINE] Engine identifies as {}", value);
                    self.engine_name = Some(value);
                }
                SessionUpdate::Ignored
            }
            EngineEvent::Option { .. } => SessionUpdate::Ignored,
            EngineEvent::Info(info) => {
                if self.phase != SessionPhase::Analyzing || info.is_empty() {
                    return SessionUpdate::Ignored;
                }
                if !self.front_is_active() {
                    return SessionUpdate::Ignored;
                }
                self.snapshot.apply_info(&info);
                SessionUpdate::Progress
            }
            EngineEvent::BestMove { best, ponder } => self.on_bestmove(best, ponder),
        }
    }

    /// Apply one transport event
    pub fn handle_transport_event(&mut self, event: TransportEvent) -> SessionUpdate {
        match event {
            TransportEvent::Line(line) => self.handle_line(&line),
            TransportEvent::Error(message) => self.fail(message),
            TransportEvent::Closed => self.fail("engine process exited".to_string()),
        }
    }

    /// Apply a transport-level failure
    ///
    /// Readiness drops, the in-flight search is abandoned and every later
    /// command is suppressed until [`EngineSession::restart`].
    pub fn fail(&mut self, message: String) -> SessionUpdate {
        if matches!(self.phase, SessionPhase::Disposed | SessionPhase::Failed) {
            return SessionUpdate::Ignored;
        }

        error!(session = %self.id, "[ENGINE] Transport failure: {}", message);
        self.log.push(LogEntry {
            direction: LogDirection::Error,
            line: format!("Error: {}", message),
        });
        self.warnings.push(SessionWarning::TransportFailure {
            message: message.clone(),
        });
        self.phase = SessionPhase::Failed;
        self.active = None;
        self.outstanding.clear();
        SessionUpdate::Failed { message }
    }

    /// Drain every event the transport has already buffered
    pub fn pump(&mut self) -> Vec<SessionUpdate> {
        let mut updates = Vec::new();
        loop {
            if self.phase == SessionPhase::Disposed {
                break;
            }
            let Some(event) = self.transport.as_mut().and_then(|t| t.try_recv()) else {
                break;
            };
            updates.push(self.handle_transport_event(event));
        }
        updates
    }

    /// Wait for the next transport event and apply it
    ///
    /// Returns `None` once the transport is exhausted or the session has
    /// failed or been disposed.
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        if matches!(self.phase, SessionPhase::Disposed | SessionPhase::Failed) {
            return None;
        }
        let event = self.transport.as_mut()?.recv().await?;
        Some(self.handle_transport_event(event))
    }

    /// Wait until the handshake completes
    pub async fn wait_until_ready(&mut self, timeout: Duration) -> BridgeResult<()> {
        let wait = async {
            loop {
                if self.phase.is_ready() {
                    return Ok(());
                }
                match self.phase {
                    SessionPhase::Disposed => return Err(BridgeError::Disposed),
                    SessionPhase::Failed => return Err(BridgeError::NotReady),
                    _ => {}
                }
                if self.next_update().await.is_none() {
                    return Err(BridgeError::transport("engine closed before the handshake"));
                }
            }
        };
        tokio::time::timeout(timeout, wait)
            .await
            .map_err(|_| BridgeError::Timeout {
                millis: timeout.as_millis() as u64,
            })?
    }

    /// Wait until the active search finishes and return its best move
    pub async fn wait_for_best_move(&mut self, timeout: Duration) -> BridgeResult<Option<String>> {
        let sequence = self
            .active
            .as_ref()
            .map(|request| request.sequence)
            .ok_or(BridgeError::NotReady)?;

        let wait = async {
            loop {
                match self.next_update().await {
                    Some(SessionUpdate::BestMove { sequence: done, best }) if done == sequence => {
                        return Ok(best);
                    }
                    Some(SessionUpdate::Failed { message }) => {
                        return Err(BridgeError::Transport { message });
                    }
                    Some(_) => {}
                    None => {
                        return Err(BridgeError::transport("engine closed during analysis"));
                    }
                }
            }
        };
        tokio::time::timeout(timeout, wait)
            .await
            .map_err(|_| BridgeError::Timeout {
                millis: timeout.as_millis() as u64,
            })?
    }

    /// Terminate the engine and make the session inert
    ///
    /// Idempotent. After this call nothing is sent and inbound lines are
    /// ignored.
    pub fn dispose(&mut self) {
        if self.phase == SessionPhase::Disposed {
            return;
        }
        self.phase = SessionPhase::Disposed;
        self.active = None;
        self.outstanding.clear();
        if let Some(mut transport) = self.transport.take() {
            transport.terminate();
        }
        info!(session = %self.id, "[ENGINE] Session disposed");
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Whether the engine accepts commands right now
    pub fn is_ready(&self) -> bool {
        self.phase.is_ready()
    }

    pub fn is_analyzing(&self) -> bool {
        self.phase == SessionPhase::Analyzing
    }

    pub fn difficulty(&self) -> SkillLevel {
        self.difficulty
    }

    /// Engine name from `id name`, if reported
    pub fn engine_name(&self) -> Option<&str> {
        self.engine_name.as_deref()
    }

    pub fn snapshot(&self) -> &EngineSnapshot {
        &self.snapshot
    }

    pub fn best_move(&self) -> Option<&str> {
        self.snapshot.best_move.as_deref()
    }

    pub fn evaluation(&self) -> Option<Evaluation> {
        self.snapshot.evaluation
    }

    pub fn depth(&self) -> u32 {
        self.snapshot.depth
    }

    pub fn nodes(&self) -> u64 {
        self.snapshot.nodes
    }

    pub fn nps(&self) -> u64 {
        self.snapshot.nps
    }

    pub fn active_request(&self) -> Option<&AnalysisRequest> {
        self.active.as_ref()
    }

    /// Recent protocol traffic, oldest first
    pub fn log(&self) -> &LogBuffer<LogEntry> {
        &self.log
    }

    /// Recorded non-fatal conditions, oldest first
    pub fn warnings(&self) -> &LogBuffer<SessionWarning> {
        &self.warnings
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn on_uciok(&mut self) -> SessionUpdate {
        if self.phase != SessionPhase::Starting {
            return SessionUpdate::Ignored;
        }

        self.phase = SessionPhase::Ready;
        self.has_been_ready = true;
        info!(
            session = %self.id,
            "[ENGINE] Handshake complete, applying skill level {}",
            self.difficulty
        );
        self.send(EngineCommand::skill_level(self.difficulty.get()));
        SessionUpdate::Ready
    }

    fn on_bestmove(&mut self, best: Option<String>, ponder: Option<String>) -> SessionUpdate {
        let Some(sequence) = self.outstanding.pop_front() else {
            debug!(session = %self.id, "[ENGINE] Unsolicited bestmove ignored");
            return SessionUpdate::Ignored;
        };

        let is_active = self
            .active
            .as_ref()
            .is_some_and(|request| request.sequence == sequence);

        if !is_active || self.phase != SessionPhase::Analyzing {
            debug!(
                session = %self.id,
                "[ENGINE] Discarding bestmove {:?} of stale request #{}",
                best, sequence
            );
            self.warnings
                .push(SessionWarning::StaleBestMove { sequence, best });
            return SessionUpdate::Stale { sequence };
        }

        info!(
            session = %self.id,
            "[ENGINE] Analysis #{} finished: bestmove {} (depth {}, eval {})",
            sequence,
            best.as_deref().unwrap_or("(none)"),
            self.snapshot.depth,
            self.snapshot
                .evaluation
                .map(|e| e.to_string())
                .unwrap_or_else(|| "-".to_string())
        );
        self.snapshot.best_move = best.clone();
        self.snapshot.ponder = ponder;
        self.active = None;
        self.phase = SessionPhase::Ready;
        SessionUpdate::BestMove { sequence, best }
    }

    fn front_is_active(&self) -> bool {
        match (self.outstanding.front(), self.active.as_ref()) {
            (Some(front), Some(active)) => *front == active.sequence,
            _ => false,
        }
    }

    /// Write one command; returns whether it was handed to the transport
    fn send(&mut self, command: EngineCommand) -> bool {
        if matches!(self.phase, SessionPhase::Failed | SessionPhase::Disposed) {
            debug!(session = %self.id, "[ENGINE] Suppressed '{}'", command);
            return false;
        }
        let Some(transport) = self.transport.as_mut() else {
            return false;
        };

        let line = command.to_string();
        match transport.send(&line) {
            Ok(()) => {
                debug!(session = %self.id, "[ENGINE] > {}", line);
                self.log.push(LogEntry {
                    direction: LogDirection::ToEngine,
                    line,
                });
                true
            }
            Err(e) => {
                self.fail(e.to_string());
                false
            }
        }
    }
}

impl<T: EngineTransport> Drop for EngineSession<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T: EngineTransport> std::fmt::Debug for EngineSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineSession")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("difficulty", &self.difficulty)
            .field("active", &self.active)
            .field("outstanding", &self.outstanding)
            .finish()
    }
}
