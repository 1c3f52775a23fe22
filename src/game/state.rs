//! Authoritative game state on top of `shakmaty`
//!
//! [`GameState`] owns the current position and the moves that led to it.
//! Every mutation goes through a legality check; illegal input yields `None`
//! and leaves the state untouched.

use crate::game::outcome::TerminalReason;
use crate::game::record::{find_tag, parse_game_record, write_pgn, Tag};
use crate::game::{GameError, GameRecordError, GameResult};
use chrono::{Local, NaiveDate};
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::{
    Board, CastlingMode, Chess, Color, EnPassantMode, Move, Piece, Position, Rank, Role, Square,
};
use std::fmt;
use tracing::{debug, info, warn};

/// Tags written first, in this order, by [`GameState::to_pgn`]
const SEVEN_TAG_ROSTER: [&str; 7] = ["Event", "Site", "Date", "Round", "White", "Black", "Result"];

/// Immutable snapshot of a position
///
/// Carries the FEN string plus the decoded board so views can render without
/// re-parsing.
#[derive(Debug, Clone)]
pub struct BoardPosition {
    fen: String,
    board: Board,
    turn: Color,
    checked_king: Option<Square>,
}

impl BoardPosition {
    pub(crate) fn from_chess(pos: &Chess) -> Self {
        let checked_king = if pos.is_check() {
            pos.board().king_of(pos.turn())
        } else {
            None
        };
        Self {
            fen: fen_of(pos),
            board: pos.board().clone(),
            turn: pos.turn(),
            checked_king,
        }
    }

    /// The standard starting position
    pub fn initial() -> Self {
        Self::from_chess(&Chess::default())
    }

    /// Parse and validate a FEN string
    pub fn from_fen(fen: &str) -> GameResult<Self> {
        Ok(Self::from_chess(&parse_fen(fen)?))
    }

    pub fn fen(&self) -> &str {
        &self.fen
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Side to move
    pub fn turn(&self) -> Color {
        self.turn
    }

    /// Square of the side to move's king when it is in check
    pub fn checked_king(&self) -> Option<Square> {
        self.checked_king
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board.piece_at(square)
    }
}

impl PartialEq for BoardPosition {
    fn eq(&self, other: &Self) -> bool {
        self.fen == other.fen
    }
}

impl Eq for BoardPosition {}

impl fmt::Display for BoardPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fen)
    }
}

/// A move that was played
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveResult {
    /// Standard algebraic notation with check suffix, e.g. `Nxf7+`
    pub san: String,
    /// Long algebraic notation, e.g. `g1f3` or `e7e8q`
    pub uci: String,
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
    pub captured: Option<Role>,
    pub promotion: Option<Role>,
    /// Position after the move
    pub position: BoardPosition,
}

#[derive(Debug, Clone)]
struct PlayedMove {
    san: String,
    uci: String,
    from: Square,
    to: Square,
}

/// Current game: position, history and imported headers
#[derive(Debug, Clone)]
pub struct GameState {
    start: Chess,
    position: Chess,
    played: Vec<PlayedMove>,
    /// One key per position reached, starting position included
    repetition: Vec<String>,
    headers: Vec<Tag>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::from_chess(Chess::default())
    }
}

impl GameState {
    /// New game from the standard starting position
    pub fn new() -> Self {
        Self::default()
    }

    /// New game from an arbitrary position
    pub fn from_fen(fen: &str) -> GameResult<Self> {
        Ok(Self::from_chess(parse_fen(fen)?))
    }

    fn from_chess(start: Chess) -> Self {
        Self {
            repetition: vec![repetition_key(&start)],
            position: start.clone(),
            start,
            played: Vec::new(),
            headers: Vec::new(),
        }
    }

    /// Same start position and headers, no moves played
    pub(crate) fn restarted(&self) -> GameState {
        let mut game = Self::from_chess(self.start.clone());
        game.headers = self.headers.clone();
        game
    }

    /// Back to the standard starting position, history and headers cleared
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    // ========================================================================
    // Moves
    // ========================================================================

    /// Play a move given by its origin and destination squares
    ///
    /// A pawn reaching the last rank without an explicit `promotion` becomes
    /// a queen. Castling is given as the king's two-square move (`e1` to
    /// `g1`). Returns `None` for illegal input.
    ///
    /// # Examples
    ///
    /// ```
    /// use chessdesk::game::GameState;
    /// use shakmaty::Square;
    ///
    /// let mut game = GameState::new();
    /// let played = game.apply_move(Square::E2, Square::E4, None).unwrap();
    /// assert_eq!(played.san, "e4");
    /// assert!(game.apply_move(Square::E4, Square::E6, None).is_none());
    /// ```
    pub fn apply_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Role>,
    ) -> Option<MoveResult> {
        let promotion = promotion.or_else(|| self.is_promotion_square(from, to).then_some(Role::Queen));
        let uci = UciMove::Normal {
            from,
            to,
            promotion,
        };
        match uci.to_move(&self.position) {
            Ok(m) => Some(self.play(&m)),
            Err(_) => {
                debug!("[GAME] Illegal move {}", uci);
                None
            }
        }
    }

    /// Play a move in long algebraic notation (`e2e4`, `e7e8q`)
    pub fn apply_uci(&mut self, text: &str) -> Option<MoveResult> {
        let uci: UciMove = text.trim().parse().ok()?;
        let m = uci.to_move(&self.position).ok()?;
        Some(self.play(&m))
    }

    /// Play a move in standard algebraic notation (`Nf3`, `exd5`, `O-O`)
    pub fn apply_san(&mut self, text: &str) -> Option<MoveResult> {
        let text = text.trim();
        let text = if text.starts_with("0-0") {
            text.replace('0', "O")
        } else {
            text.to_string()
        };
        let san: SanPlus = text.parse().ok()?;
        let m = san.san.to_move(&self.position).ok()?;
        Some(self.play(&m))
    }

    /// Play a move in either notation, SAN first
    pub fn apply_notation(&mut self, text: &str) -> Option<MoveResult> {
        self.apply_san(text).or_else(|| self.apply_uci(text))
    }

    fn play(&mut self, m: &Move) -> MoveResult {
        let (from, to) = match m.to_uci(CastlingMode::Standard) {
            UciMove::Normal { from, to, .. } => (from, to),
            _ => (m.from().unwrap_or_else(|| m.to()), m.to()),
        };
        let uci = m.to_uci(CastlingMode::Standard).to_string();
        let piece = Piece {
            color: self.position.turn(),
            role: m.role(),
        };

        let san = SanPlus::from_move_and_play_unchecked(&mut self.position, m).to_string();
        self.repetition.push(repetition_key(&self.position));
        self.played.push(PlayedMove {
            san: san.clone(),
            uci: uci.clone(),
            from,
            to,
        });

        debug!("[GAME] Played {} ({})", san, uci);
        MoveResult {
            san,
            uci,
            from,
            to,
            piece,
            captured: m.capture(),
            promotion: m.promotion(),
            position: BoardPosition::from_chess(&self.position),
        }
    }

    fn is_promotion_square(&self, from: Square, to: Square) -> bool {
        self.position.board().role_at(from) == Some(Role::Pawn)
            && matches!(to.rank(), Rank::First | Rank::Eighth)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn current_position(&self) -> BoardPosition {
        BoardPosition::from_chess(&self.position)
    }

    /// Position the game started from
    pub fn start_position(&self) -> BoardPosition {
        BoardPosition::from_chess(&self.start)
    }

    /// The underlying rules-library position
    pub fn position(&self) -> &Chess {
        &self.position
    }

    /// Destination squares of legal moves, optionally only from one square
    pub fn legal_moves(&self, from: Option<Square>) -> Vec<Square> {
        let mut targets: Vec<Square> = self
            .position
            .legal_moves()
            .iter()
            .filter_map(|m| match m.to_uci(CastlingMode::Standard) {
                UciMove::Normal { from: origin, to, .. }
                    if from.map_or(true, |square| square == origin) =>
                {
                    Some(to)
                }
                _ => None,
            })
            .collect();
        targets.sort_by_key(|square| u32::from(*square));
        targets.dedup();
        targets
    }

    /// Every legal move in long algebraic notation
    pub fn legal_moves_uci(&self) -> Vec<String> {
        self.position
            .legal_moves()
            .iter()
            .map(|m| m.to_uci(CastlingMode::Standard).to_string())
            .collect()
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.position.board().piece_at(square)
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal_reason().is_game_over()
    }

    /// Why the game ended, if it did
    pub fn terminal_reason(&self) -> TerminalReason {
        let pos = &self.position;
        if pos.is_checkmate() {
            return match pos.turn() {
                Color::White => TerminalReason::CheckmateBlack,
                Color::Black => TerminalReason::CheckmateWhite,
            };
        }
        if pos.is_stalemate() {
            return TerminalReason::Stalemate;
        }
        if pos.is_insufficient_material() {
            return TerminalReason::InsufficientMaterial;
        }
        if self.repetition_count() >= 3 {
            return TerminalReason::ThreefoldRepetition;
        }
        if pos.halfmoves() >= 100 {
            return TerminalReason::DrawOther;
        }
        TerminalReason::None
    }

    /// How often the current position has occurred
    pub fn repetition_count(&self) -> usize {
        match self.repetition.last() {
            Some(current) => self.repetition.iter().filter(|key| *key == current).count(),
            None => 0,
        }
    }

    pub fn is_check(&self) -> bool {
        self.position.is_check()
    }

    /// Side to move
    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    /// Moves played so far in SAN
    pub fn history(&self) -> Vec<String> {
        self.played.iter().map(|m| m.san.clone()).collect()
    }

    /// Moves played so far in long algebraic notation
    pub fn uci_history(&self) -> Vec<String> {
        self.played.iter().map(|m| m.uci.clone()).collect()
    }

    /// Origin and destination of the last move
    pub fn last_move(&self) -> Option<(Square, Square)> {
        self.played.last().map(|m| (m.from, m.to))
    }

    /// Number of half-moves played
    pub fn ply(&self) -> usize {
        self.played.len()
    }

    /// Header tags of an imported game
    pub fn headers(&self) -> &[Tag] {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_tag(&self.headers, name)
    }

    // ========================================================================
    // Game records
    // ========================================================================

    /// Replace the game with one read from PGN text
    ///
    /// Returns the number of moves imported. On failure the game is reset to
    /// the standard starting position with an empty history.
    pub fn load_game_record(&mut self, text: &str) -> Result<usize, GameRecordError> {
        match Self::replay_record(text) {
            Ok(game) => {
                *self = game;
                info!("[PGN] Loaded game with {} moves", self.ply());
                Ok(self.ply())
            }
            Err(e) => {
                warn!("[PGN] Failed to load game record: {}", e);
                self.reset();
                Err(e)
            }
        }
    }

    fn replay_record(text: &str) -> Result<GameState, GameRecordError> {
        let record = parse_game_record(text)?;

        let start = match record.tag("FEN") {
            Some(fen) => parse_chess(fen).map_err(|message| GameRecordError::InvalidStartPosition {
                fen: fen.to_string(),
                message,
            })?,
            None => Chess::default(),
        };

        let mut game = GameState::from_chess(start);
        game.headers = record.headers.clone();
        for (index, token) in record.move_tokens().into_iter().enumerate() {
            if game.apply_notation(&token).is_none() {
                return Err(GameRecordError::IllegalMove {
                    ply: index + 1,
                    token,
                });
            }
        }
        Ok(game)
    }

    /// Render the game as PGN dated today
    pub fn to_pgn(&self) -> String {
        self.to_pgn_dated(Local::now().date_naive())
    }

    /// Render the game as PGN with the given `Date` tag fallback
    ///
    /// The Seven Tag Roster comes first, taking imported values where they
    /// exist, followed by any other imported tags.
    pub fn to_pgn_dated(&self, date: NaiveDate) -> String {
        let reason = self.terminal_reason();
        let result = if reason.is_game_over() {
            reason.result_tag().to_string()
        } else {
            self.header("Result").unwrap_or("*").to_string()
        };

        let mut tags: Vec<Tag> = SEVEN_TAG_ROSTER
            .iter()
            .map(|name| {
                let value = match *name {
                    "Date" => self
                        .header(name)
                        .map(str::to_string)
                        .unwrap_or_else(|| date.format("%Y.%m.%d").to_string()),
                    "Result" => result.clone(),
                    "Event" => self.header(name).unwrap_or("Casual Game").to_string(),
                    _ => self.header(name).unwrap_or("?").to_string(),
                };
                Tag::new(*name, value)
            })
            .collect();

        for tag in &self.headers {
            let in_roster = SEVEN_TAG_ROSTER
                .iter()
                .any(|name| name.eq_ignore_ascii_case(&tag.name));
            if !in_roster {
                tags.push(tag.clone());
            }
        }

        let start_fen = fen_of(&self.start);
        if start_fen != fen_of(&Chess::default()) && find_tag(&tags, "FEN").is_none() {
            tags.push(Tag::new("SetUp", "1"));
            tags.push(Tag::new("FEN", start_fen));
        }

        write_pgn(
            &tags,
            self.start.fullmoves().get(),
            self.start.turn() == Color::Black,
            &self.history(),
            &result,
        )
    }
}

/// Parse a FEN string into a legal standard-chess position
pub fn parse_fen(fen: &str) -> GameResult<Chess> {
    parse_chess(fen).map_err(|message| GameError::InvalidPosition {
        fen: fen.to_string(),
        message,
    })
}

fn parse_chess(fen: &str) -> Result<Chess, String> {
    let setup: Fen = fen.trim().parse().map_err(|e: shakmaty::fen::ParseFenError| e.to_string())?;
    setup
        .into_position::<Chess>(CastlingMode::Standard)
        .map_err(|e| e.to_string())
}

fn fen_of(pos: &Chess) -> String {
    Fen::from_position(pos.clone(), EnPassantMode::Legal).to_string()
}

/// Placement, side to move, castling rights and en passant square
fn repetition_key(pos: &Chess) -> String {
    fen_of(pos).split(' ').take(4).collect::<Vec<_>>().join(" ")
}
