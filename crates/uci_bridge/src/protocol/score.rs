//! Score and evaluation decoding
//!
//! Engines report either a centipawn value or a distance to mate. The two are
//! kept apart all the way to the display layer: a mate score is never folded
//! into a large number.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw score as reported on an `info` line
///
/// Centipawns: positive = side to move is better.
/// Mate: positive N = side to move mates in N, negative N = gets mated in N.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Score {
    Centipawns(i32),
    Mate(i32),
}

/// Whether the score is exact or only a search window bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScoreBound {
    #[default]
    Exact,
    Lower,
    Upper,
}

/// Evaluation exposed to consumers
///
/// Consumers must branch on the variant; `MateIn(3)` is not the number 3.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Evaluation {
    /// Pawn-equivalent value (centipawns / 100)
    Pawns(f64),
    /// Forced mate in N moves (negative when the side to move is mated)
    MateIn(i32),
}

impl Score {
    /// Convert to the consumer-facing evaluation
    pub fn to_evaluation(self) -> Evaluation {
        match self {
            Score::Centipawns(cp) => Evaluation::Pawns(f64::from(cp) / 100.0),
            Score::Mate(n) => Evaluation::MateIn(n),
        }
    }
}

impl Evaluation {
    /// True when the evaluation is a forced mate
    pub fn is_mate(&self) -> bool {
        matches!(self, Evaluation::MateIn(_))
    }
}

impl From<Score> for Evaluation {
    fn from(score: Score) -> Self {
        score.to_evaluation()
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Pawns(p) => write!(f, "{:+.2}", p),
            Evaluation::MateIn(n) => write!(f, "M{}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centipawns_become_pawns() {
        assert_eq!(Score::Centipawns(35).to_evaluation(), Evaluation::Pawns(0.35));
        assert_eq!(Score::Centipawns(-120).to_evaluation(), Evaluation::Pawns(-1.2));
    }

    #[test]
    fn test_mate_stays_tagged() {
        let eval = Score::Mate(3).to_evaluation();
        assert_eq!(eval, Evaluation::MateIn(3));
        assert!(eval.is_mate());
        assert_eq!(eval.to_string(), "M3");
    }

    #[test]
    fn test_display_pawns() {
        assert_eq!(Evaluation::Pawns(0.35).to_string(), "+0.35");
        assert_eq!(Evaluation::Pawns(-1.5).to_string(), "-1.50");
    }
}
