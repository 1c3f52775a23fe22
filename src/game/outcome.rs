//! Game termination tracking
//!
//! # Game Over Conditions
//!
//! ## Checkmate
//! - **CheckmateWhite**: White delivered mate (Black to move, in check, no legal moves)
//! - **CheckmateBlack**: Black delivered mate
//!
//! ## Draw Conditions
//! - **Stalemate**: Side to move has no legal moves but is NOT in check
//! - **InsufficientMaterial**: Neither player can deliver checkmate
//! - **ThreefoldRepetition**: The same position occurred three times
//! - **DrawOther**: Fifty moves by each side without a capture or pawn move

use shakmaty::Color;
use std::fmt;

/// Why a game ended, or `None` while it is still in progress
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminalReason {
    /// Game is still in progress
    #[default]
    None,
    /// White won by checkmate
    CheckmateWhite,
    /// Black won by checkmate
    CheckmateBlack,
    Stalemate,
    InsufficientMaterial,
    ThreefoldRepetition,
    /// Fifty-move rule
    DrawOther,
}

impl TerminalReason {
    /// Returns `true` for any state other than [`TerminalReason::None`]
    pub fn is_game_over(&self) -> bool {
        !matches!(self, TerminalReason::None)
    }

    /// Get the winner of the game, if there is one
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// match game.terminal_reason().winner() {
    ///     Some(Color::White) => println!("White wins!"),
    ///     Some(Color::Black) => println!("Black wins!"),
    ///     None => println!("It's a draw or game is still playing"),
    /// }
    /// ```
    pub fn winner(&self) -> Option<Color> {
        match self {
            TerminalReason::CheckmateWhite => Some(Color::White),
            TerminalReason::CheckmateBlack => Some(Color::Black),
            _ => None,
        }
    }

    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            TerminalReason::Stalemate
                | TerminalReason::InsufficientMaterial
                | TerminalReason::ThreefoldRepetition
                | TerminalReason::DrawOther
        )
    }

    /// Human-readable result message
    pub fn message(&self) -> &'static str {
        match self {
            TerminalReason::None => "Game in progress",
            TerminalReason::CheckmateWhite => "White wins by checkmate!",
            TerminalReason::CheckmateBlack => "Black wins by checkmate!",
            TerminalReason::Stalemate => "Draw by stalemate",
            TerminalReason::InsufficientMaterial => "Draw by insufficient material",
            TerminalReason::ThreefoldRepetition => "Draw by threefold repetition",
            TerminalReason::DrawOther => "Draw by the fifty-move rule",
        }
    }

    /// Value of the PGN `Result` tag
    pub fn result_tag(&self) -> &'static str {
        match self {
            TerminalReason::None => "*",
            TerminalReason::CheckmateWhite => "1-0",
            TerminalReason::CheckmateBlack => "0-1",
            _ => "1/2-1/2",
        }
    }
}

impl fmt::Display for TerminalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_progress_is_not_over() {
        let reason = TerminalReason::default();
        assert!(!reason.is_game_over());
        assert!(!reason.is_draw());
        assert_eq!(reason.winner(), None);
        assert_eq!(reason.result_tag(), "*");
    }

    #[test]
    fn test_checkmate_names_the_mating_side() {
        assert_eq!(TerminalReason::CheckmateWhite.winner(), Some(Color::White));
        assert_eq!(TerminalReason::CheckmateWhite.result_tag(), "1-0");
        assert_eq!(TerminalReason::CheckmateBlack.result_tag(), "0-1");
    }

    #[test]
    fn test_draws() {
        for reason in [
            TerminalReason::Stalemate,
            TerminalReason::InsufficientMaterial,
            TerminalReason::ThreefoldRepetition,
            TerminalReason::DrawOther,
        ] {
            assert!(reason.is_game_over());
            assert!(reason.is_draw());
            assert_eq!(reason.result_tag(), "1/2-1/2");
        }
    }
}
