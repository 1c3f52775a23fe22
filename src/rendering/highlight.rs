//! Square highlights

use shakmaty::Square;
use std::collections::HashMap;

/// Why a square is highlighted
///
/// When several apply to one square the highest-ranked wins:
/// `Check` > `Selected` > `LegalTarget` > `LastMove`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Highlight {
    /// Origin or destination of the previous move
    LastMove,
    /// A square the selected piece may move to
    LegalTarget,
    /// The piece picked up by a click
    Selected,
    /// The king of the side to move, in check
    Check,
}

/// Highlight per square
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightMap {
    squares: HashMap<Square, Highlight>,
}

impl HighlightMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a square, keeping an existing higher-ranked highlight
    pub fn insert(&mut self, square: Square, highlight: Highlight) {
        let entry = self.squares.entry(square).or_insert(highlight);
        if highlight > *entry {
            *entry = highlight;
        }
    }

    pub fn get(&self, square: Square) -> Option<Highlight> {
        self.squares.get(&square).copied()
    }

    pub fn len(&self) -> usize {
        self.squares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.squares.is_empty()
    }

    /// Squares carrying `highlight`
    pub fn squares_with(&self, highlight: Highlight) -> Vec<Square> {
        let mut squares: Vec<Square> = self
            .squares
            .iter()
            .filter(|(_, h)| **h == highlight)
            .map(|(square, _)| *square)
            .collect();
        squares.sort_by_key(|square| u32::from(*square));
        squares
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_higher_highlight_wins() {
        let mut map = HighlightMap::new();
        map.insert(Square::E4, Highlight::LastMove);
        map.insert(Square::E4, Highlight::LegalTarget);
        map.insert(Square::E4, Highlight::LastMove);

        assert_eq!(map.get(Square::E4), Some(Highlight::LegalTarget));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_squares_with() {
        let mut map = HighlightMap::new();
        map.insert(Square::E4, Highlight::LegalTarget);
        map.insert(Square::E3, Highlight::LegalTarget);
        map.insert(Square::E2, Highlight::Selected);

        assert_eq!(map.squares_with(Highlight::LegalTarget), vec![Square::E3, Square::E4]);
        assert!(map.squares_with(Highlight::Check).is_empty());
    }
}
