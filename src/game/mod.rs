//! Game module - chess rules, game records and history navigation
//!
//! Move legality is delegated to `shakmaty`; this module keeps the game
//! around it: the move history, termination, PGN import/export and review.
//!
//! # Module Structure
//!
//! - `state` - [`GameState`], [`MoveResult`] and [`BoardPosition`]
//! - `outcome` - [`TerminalReason`]
//! - `record` - PGN sanitizing, segmentation, tokenising and export
//! - `review` - [`GameReview`] cursor over an imported game
//! - `error` - [`GameError`] and [`GameRecordError`]

pub mod error;
pub mod outcome;
pub mod record;
pub mod review;
pub mod state;


pub use error::{GameError, GameRecordError, GameResult};
pub use outcome::TerminalReason;
pub use record::{GameRecord, Tag};
pub use review::{GameReview, NavDirection};
pub use state::{parse_fen, BoardPosition, GameState, MoveResult};

// Rules-library types that appear in this module's API
pub use shakmaty::{Color, Piece, Role, Square};
