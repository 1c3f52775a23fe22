//! Analysis screen
//!
//! Imports a game record, steps through its positions and asks the engine
//! to evaluate the displayed one. Moving to another position or loading a
//! new record stops a running search and hides the previous result.

use crate::app::SearchLimits;
use crate::game::{GameRecordError, GameReview, GameState, NavDirection};
use crate::rendering::{BoardView, Highlight, HighlightMap};
use tracing::{info, warn};
use uci_bridge::{
    BridgeError, BridgeResult, EngineSession, EngineTransport, SessionPhase, SessionUpdate,
};

/// What [`AnalysisScreen::run_analysis`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisAction {
    /// A search of the displayed position started
    Started(u64),
    /// The running search was stopped
    Stopped,
}

/// Screen for reviewing and analysing a game
pub struct AnalysisScreen<T: EngineTransport> {
    engine: EngineSession<T>,
    limits: SearchLimits,
    review: GameReview,
    pgn_text: String,
    error: Option<String>,
    loading: bool,
    showing_analysis: bool,
}

impl<T: EngineTransport> AnalysisScreen<T> {
    pub fn new(engine: EngineSession<T>, limits: SearchLimits) -> Self {
        Self {
            engine,
            limits,
            review: GameReview::new(&GameState::new()),
            pgn_text: String::new(),
            error: None,
            loading: false,
            showing_analysis: false,
        }
    }

    /// Import a game record and display its final position
    ///
    /// On failure the error message is kept for display and the board shows
    /// the initial position with no moves.
    pub fn load_pgn(&mut self, text: &str) -> Result<usize, GameRecordError> {
        self.loading = true;
        self.pgn_text = text.to_string();
        self.clear_analysis();

        let mut game = GameState::new();
        let result = game.load_game_record(text);
        self.review = GameReview::new(&game);
        self.loading = false;

        match result {
            Ok(count) => {
                info!("[PGN] Game loaded for analysis ({} moves)", count);
                self.error = None;
                Ok(count)
            }
            Err(e) => {
                self.error = Some(format!("Invalid PGN: {}", e));
                Err(e)
            }
        }
    }

    /// Step through the game; returns whether the position changed
    pub fn navigate(&mut self, direction: NavDirection) -> bool {
        let changed = self.review.navigate(direction);
        if changed {
            self.clear_analysis();
        }
        changed
    }

    /// Start analysing the displayed position, or stop a running search
    ///
    /// Fails with [`BridgeError::NotReady`] (and an error message) while the
    /// engine is still starting or has failed.
    pub fn run_analysis(&mut self) -> BridgeResult<AnalysisAction> {
        if !self.engine.is_ready() {
            self.error = Some("Engine is not ready yet".to_string());
            return Err(BridgeError::NotReady);
        }
        if self.engine.is_analyzing() {
            self.engine.stop();
            return Ok(AnalysisAction::Stopped);
        }

        let fen = self.review.current().current_position().fen().to_string();
        match self
            .engine
            .analyze(&fen, self.limits.max_depth, self.limits.movetime_ms)
        {
            Ok(sequence) => {
                self.showing_analysis = true;
                self.error = None;
                Ok(AnalysisAction::Started(sequence))
            }
            Err(e) => {
                warn!("[ENGINE] Analysis could not start: {}", e);
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Change the engine's skill level
    pub fn set_difficulty(&mut self, level: i64) -> BridgeResult<()> {
        self.engine.set_difficulty(level).map(|_| ())
    }

    fn clear_analysis(&mut self) {
        if self.engine.is_analyzing() {
            self.engine.stop();
        }
        self.showing_analysis = false;
    }

    // ========================================================================
    // Engine
    // ========================================================================

    /// Apply every engine event that is already buffered
    pub fn pump_engine(&mut self) -> Vec<SessionUpdate> {
        self.engine.pump()
    }

    /// Wait for the next engine event
    ///
    /// Never resolves once the engine's output has ended.
    pub async fn next_engine_update(&mut self) -> SessionUpdate {
        match self.engine.next_update().await {
            Some(update) => update,
            None => std::future::pending::<SessionUpdate>().await,
        }
    }

    // ========================================================================
    // View
    // ========================================================================

    /// Engine state as one line of text
    pub fn status_text(&self) -> String {
        match self.engine.phase() {
            SessionPhase::Starting => return "Engine loading...".to_string(),
            SessionPhase::Failed => return "Engine unavailable".to_string(),
            SessionPhase::Disposed => return "Engine stopped".to_string(),
            SessionPhase::Ready | SessionPhase::Analyzing => {}
        }
        if !self.showing_analysis {
            return "Engine ready".to_string();
        }

        let snapshot = self.engine.snapshot();
        let eval = snapshot
            .evaluation
            .map(|e| e.to_string())
            .unwrap_or_else(|| "-".to_string());
        let mut text = format!(
            "Depth {} | Eval {} | {} nodes | {} nps",
            snapshot.depth, eval, snapshot.nodes, snapshot.nps
        );
        if let Some(best) = self.best_move_san() {
            text.push_str(&format!(" | Best {}", best));
        }
        if self.engine.is_analyzing() {
            text = format!("Analyzing... {}", text);
        }
        text
    }

    /// The engine's best move for the displayed position, in SAN
    pub fn best_move_san(&self) -> Option<String> {
        if !self.showing_analysis {
            return None;
        }
        let uci = self.engine.best_move()?;
        let mut game = self.review.current().clone();
        game.apply_uci(uci).map(|played| played.san)
    }

    pub fn render(&self, view: &mut dyn BoardView) {
        let game = self.review.current();
        let mut highlights = HighlightMap::new();
        if let Some((from, to)) = game.last_move() {
            highlights.insert(from, Highlight::LastMove);
            highlights.insert(to, Highlight::LastMove);
        }
        if let Some(king) = game.current_position().checked_king() {
            highlights.insert(king, Highlight::Check);
        }
        view.render(&game.current_position(), false, &highlights);
    }

    pub fn review(&self) -> &GameReview {
        &self.review
    }

    /// Game at the displayed position
    pub fn game(&self) -> &GameState {
        self.review.current()
    }

    /// Text of the last import attempt
    pub fn pgn_text(&self) -> &str {
        &self.pgn_text
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether the engine result for the displayed position is shown
    pub fn is_showing_analysis(&self) -> bool {
        self.showing_analysis
    }

    pub fn engine(&self) -> &EngineSession<T> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut EngineSession<T> {
        &mut self.engine
    }
}
