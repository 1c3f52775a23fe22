//! Error types for game module
//!
//! Illegal moves are not errors: move application returns `None`. These
//! types cover malformed positions and game records.

/// Errors that can occur in game logic
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// A FEN string could not be turned into a legal position
    #[error("Invalid position '{fen}': {message}")]
    InvalidPosition { fen: String, message: String },
}

/// Result type alias for game operations
pub type GameResult<T> = Result<T, GameError>;

/// Reasons a game record (PGN) could not be imported
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameRecordError {
    /// Nothing usable was left after removing unsupported characters
    #[error("The game record contains no readable text after removing unsupported characters")]
    EmptyAfterSanitize,

    /// The `FEN` tag does not describe a legal position
    #[error("Invalid starting position '{fen}': {message}")]
    InvalidStartPosition { fen: String, message: String },

    /// A movetext token is not a legal move in the position it is played from
    #[error("Illegal or unreadable move '{token}' at ply {ply}")]
    IllegalMove { ply: usize, token: String },
}
