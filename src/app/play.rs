//! Play screen
//!
//! Local mode alternates two human players on one board. Bot mode pairs the
//! human with the engine: after every human move the engine is asked for a
//! reply, and input stays locked until that reply has been played.

use crate::app::SearchLimits;
use crate::game::{GameState, MoveResult, TerminalReason};
use crate::rendering::{BoardView, Highlight, HighlightMap};
use shakmaty::{Color, Piece, Square};
use std::fmt;
use tracing::{debug, info, warn};
use uci_bridge::{BridgeResult, EngineSession, EngineTransport, SessionUpdate, SkillLevel};

/// Who plays the other side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PlayMode {
    /// Two humans at one board
    #[default]
    Local,
    /// Human versus the engine
    Bot,
}

impl fmt::Display for PlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayMode::Local => f.write_str("local"),
            PlayMode::Bot => f.write_str("bot"),
        }
    }
}

/// Result of a square click
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A piece was picked up; its legal targets
    Selected(Vec<Square>),
    /// The selection was dropped
    Deselected,
    /// The selected piece moved to the clicked square
    Moved(MoveResult),
    /// Input is locked or the click meant nothing
    Ignored,
}

/// Screen for playing a game
pub struct PlayScreen<T: EngineTransport> {
    mode: PlayMode,
    game: GameState,
    engine: Option<EngineSession<T>>,
    human: Color,
    limits: SearchLimits,
    selected: Option<Square>,
    pending_reply: Option<u64>,
    message: Option<String>,
}

impl<T: EngineTransport> PlayScreen<T> {
    /// Hot-seat game between two humans
    pub fn local() -> Self {
        Self {
            mode: PlayMode::Local,
            game: GameState::new(),
            engine: None,
            human: Color::White,
            limits: SearchLimits::default(),
            selected: None,
            pending_reply: None,
            message: None,
        }
    }

    /// Game against the engine; the human plays `human`
    ///
    /// When the engine has White it moves as soon as its handshake completes.
    pub fn against_engine(engine: EngineSession<T>, human: Color, limits: SearchLimits) -> Self {
        let mut screen = Self {
            mode: PlayMode::Bot,
            engine: Some(engine),
            human,
            limits,
            ..Self::local()
        };
        screen.request_engine_move();
        screen
    }

    // ========================================================================
    // Gestures
    // ========================================================================

    /// A piece was dragged from `from` and dropped on `to`
    ///
    /// Returns `false` when the drop must be reverted: input is locked, the
    /// dragged piece does not match the board, or the move is illegal.
    pub fn on_drop(&mut self, from: Square, to: Square, piece: Option<Piece>) -> bool {
        if !self.interaction_enabled() {
            debug!("[GAME] Drop {}{} ignored while input is locked", from, to);
            return false;
        }
        if piece.is_some() && piece != self.game.piece_at(from) {
            debug!("[GAME] Drop {}{} does not match the board", from, to);
            return false;
        }

        match self.game.apply_move(from, to, None) {
            Some(result) => {
                info!("[GAME] Move: {}", result.san);
                self.after_human_move();
                true
            }
            None => {
                info!("[GAME] Illegal move attempted: {}{}", from, to);
                false
            }
        }
    }

    /// A move typed as text, in SAN or long algebraic notation
    pub fn on_move_text(&mut self, text: &str) -> Option<MoveResult> {
        if !self.interaction_enabled() {
            debug!("[GAME] Move '{}' ignored while input is locked", text);
            return None;
        }
        match self.game.apply_notation(text) {
            Some(result) => {
                info!("[GAME] Move: {}", result.san);
                self.after_human_move();
                Some(result)
            }
            None => {
                info!("[GAME] Illegal move attempted: {}", text);
                None
            }
        }
    }

    /// A square was clicked
    ///
    /// The first click picks up one of the mover's pieces; a second click on
    /// one of its legal targets plays the move.
    pub fn on_square_click(&mut self, square: Square) -> ClickOutcome {
        if !self.interaction_enabled() {
            return ClickOutcome::Ignored;
        }

        if let Some(from) = self.selected {
            if from == square {
                self.selected = None;
                return ClickOutcome::Deselected;
            }
            if self.game.legal_moves(Some(from)).contains(&square) {
                self.selected = None;
                return match self.game.apply_move(from, square, None) {
                    Some(result) => {
                        info!("[GAME] Move: {}", result.san);
                        self.after_human_move();
                        ClickOutcome::Moved(result)
                    }
                    None => ClickOutcome::Ignored,
                };
            }
        }

        match self.game.piece_at(square) {
            Some(piece) if piece.color == self.game.turn() => {
                self.selected = Some(square);
                ClickOutcome::Selected(self.game.legal_moves(Some(square)))
            }
            _ if self.selected.take().is_some() => ClickOutcome::Deselected,
            _ => ClickOutcome::Ignored,
        }
    }

    /// Start over from the initial position
    pub fn new_game(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.stop();
        }
        self.game.reset();
        self.selected = None;
        self.pending_reply = None;
        self.message = None;
        info!("[GAME] New {} game", self.mode);
        self.request_engine_move();
    }

    /// Change the engine's skill level
    pub fn set_difficulty(&mut self, level: i64) -> Option<BridgeResult<SkillLevel>> {
        self.engine.as_mut().map(|engine| engine.set_difficulty(level))
    }

    // ========================================================================
    // Engine
    // ========================================================================

    /// Apply an update from the engine session
    ///
    /// Returns the engine's move when the update completed its reply.
    pub fn handle_engine_update(&mut self, update: SessionUpdate) -> Option<MoveResult> {
        match update {
            SessionUpdate::Ready => {
                self.request_engine_move();
                None
            }
            SessionUpdate::BestMove { sequence, best } if self.pending_reply == Some(sequence) => {
                self.pending_reply = None;
                let Some(uci) = best else {
                    warn!("[GAME] Engine returned no move");
                    return None;
                };
                match self.game.apply_uci(&uci) {
                    Some(result) => {
                        info!("[GAME] Engine played {}", result.san);
                        self.announce_game_over();
                        Some(result)
                    }
                    None => {
                        warn!("[GAME] Engine suggested illegal move {}", uci);
                        None
                    }
                }
            }
            SessionUpdate::Failed { message } => {
                self.pending_reply = None;
                self.message = Some(format!("Engine error: {}", message));
                None
            }
            _ => None,
        }
    }

    /// Apply every engine event that is already buffered
    pub fn pump_engine(&mut self) -> Vec<MoveResult> {
        let updates = match self.engine.as_mut() {
            Some(engine) => engine.pump(),
            None => return Vec::new(),
        };
        updates
            .into_iter()
            .filter_map(|update| self.handle_engine_update(update))
            .collect()
    }

    /// Wait for the next engine event
    ///
    /// Never resolves without an engine or after its output has ended.
    pub async fn next_engine_update(&mut self) -> SessionUpdate {
        if let Some(engine) = self.engine.as_mut() {
            if let Some(update) = engine.next_update().await {
                return update;
            }
        }
        std::future::pending::<SessionUpdate>().await
    }

    fn after_human_move(&mut self) {
        self.selected = None;
        if !self.announce_game_over() {
            self.request_engine_move();
        }
    }

    /// Ask the engine for a move when it is its turn
    fn request_engine_move(&mut self) -> bool {
        if self.mode != PlayMode::Bot
            || self.pending_reply.is_some()
            || self.game.is_terminal()
            || self.game.turn() == self.human
        {
            return false;
        }
        let Some(engine) = self.engine.as_mut() else {
            return false;
        };
        if !engine.is_ready() {
            debug!("[GAME] Engine reply deferred until the engine is ready");
            return false;
        }

        let fen = self.game.current_position().fen().to_string();
        match engine.analyze(&fen, self.limits.max_depth, self.limits.movetime_ms) {
            Ok(sequence) => {
                self.pending_reply = Some(sequence);
                true
            }
            Err(e) => {
                warn!("[GAME] Could not ask the engine for a move: {}", e);
                self.message = Some(e.to_string());
                false
            }
        }
    }

    fn announce_game_over(&mut self) -> bool {
        let reason = self.game.terminal_reason();
        if reason.is_game_over() {
            info!("[GAME] Game over: {}", reason);
            self.message = Some(reason.to_string());
            true
        } else {
            false
        }
    }

    // ========================================================================
    // View
    // ========================================================================

    /// Whether the board accepts gestures
    pub fn interaction_enabled(&self) -> bool {
        if self.game.is_terminal() {
            return false;
        }
        match self.mode {
            PlayMode::Local => true,
            PlayMode::Bot => self.game.turn() == self.human && self.pending_reply.is_none(),
        }
    }

    /// Selection, legal targets, last move and check
    pub fn highlights(&self) -> HighlightMap {
        let mut highlights = HighlightMap::new();
        if let Some((from, to)) = self.game.last_move() {
            highlights.insert(from, Highlight::LastMove);
            highlights.insert(to, Highlight::LastMove);
        }
        if let Some(selected) = self.selected {
            for target in self.game.legal_moves(Some(selected)) {
                highlights.insert(target, Highlight::LegalTarget);
            }
            highlights.insert(selected, Highlight::Selected);
        }
        if let Some(king) = self.game.current_position().checked_king() {
            highlights.insert(king, Highlight::Check);
        }
        highlights
    }

    pub fn render(&self, view: &mut dyn BoardView) {
        view.render(
            &self.game.current_position(),
            self.interaction_enabled(),
            &self.highlights(),
        );
    }

    /// One-line summary of whose turn it is or how the game ended
    pub fn status(&self) -> String {
        let reason = self.game.terminal_reason();
        if reason != TerminalReason::None {
            return reason.to_string();
        }
        if self.pending_reply.is_some() {
            return "Engine is thinking...".to_string();
        }
        let side = match self.game.turn() {
            Color::White => "White",
            Color::Black => "Black",
        };
        if self.game.is_check() {
            format!("{} to move (check)", side)
        } else {
            format!("{} to move", side)
        }
    }

    pub fn mode(&self) -> PlayMode {
        self.mode
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn human(&self) -> Color {
        self.human
    }

    pub fn selected(&self) -> Option<Square> {
        self.selected
    }

    /// Whether an engine reply is outstanding
    pub fn is_engine_thinking(&self) -> bool {
        self.pending_reply.is_some()
    }

    /// Last notice for the player (game over, engine errors)
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn engine(&self) -> Option<&EngineSession<T>> {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> Option<&mut EngineSession<T>> {
        self.engine.as_mut()
    }
}
