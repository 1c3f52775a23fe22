//! Text board renderer
//!
//! Draws the board as eight lines of three-character cells, White at the
//! bottom unless flipped. Pieces use FEN letters; empty squares are `.`.
//!
//! ```text
//! 8  r  n  b  q  k  b  n  r
//! 7  p  p  p  p  p  p  p  p
//! ...
//! 2  P  P  P  P [P] P  P  P
//! 1  R  N  B  Q  K  B  N  R
//!    a  b  c  d  e  f  g  h
//! ```
//!
//! Highlight markers: `[x]` selected, ` * ` / `*x*` legal target,
//! `(x)` last move, `!x!` king in check.

use crate::game::BoardPosition;
use crate::rendering::{BoardView, Highlight, HighlightMap};
use shakmaty::{Color, Square};

const FILES: [char; 8] = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'];

/// [`BoardView`] that renders into a string
#[derive(Debug, Clone, Default)]
pub struct TextBoardView {
    flipped: bool,
    frame: String,
}

impl TextBoardView {
    pub fn new() -> Self {
        Self::default()
    }

    /// View with Black at the bottom
    pub fn flipped() -> Self {
        Self {
            flipped: true,
            frame: String::new(),
        }
    }

    pub fn set_flipped(&mut self, flipped: bool) {
        self.flipped = flipped;
    }

    pub fn flip(&mut self) {
        self.flipped = !self.flipped;
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    /// The most recently rendered board
    pub fn frame(&self) -> &str {
        &self.frame
    }

    fn cell(position: &BoardPosition, square: Square, highlight: Option<Highlight>) -> String {
        let piece = position.piece_at(square);
        let symbol = piece.map_or('.', |p| p.char());
        match highlight {
            None => format!(" {} ", symbol),
            Some(Highlight::Check) => format!("!{}!", symbol),
            Some(Highlight::Selected) => format!("[{}]", symbol),
            Some(Highlight::LegalTarget) if piece.is_none() => " * ".to_string(),
            Some(Highlight::LegalTarget) => format!("*{}*", symbol),
            Some(Highlight::LastMove) => format!("({})", symbol),
        }
    }
}

impl BoardView for TextBoardView {
    fn render(&mut self, position: &BoardPosition, interaction_enabled: bool, highlights: &HighlightMap) {
        let ranks: Vec<u32> = if self.flipped {
            (0..8).collect()
        } else {
            (0..8).rev().collect()
        };
        let files: Vec<u32> = if self.flipped {
            (0..8).rev().collect()
        } else {
            (0..8).collect()
        };

        let mut out = String::new();
        for rank in &ranks {
            let mut line = format!("{} ", rank + 1);
            for file in &files {
                let square = Square::new(rank * 8 + file);
                line.push_str(&Self::cell(position, square, highlights.get(square)));
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }

        let mut footer = String::from("  ");
        for file in &files {
            footer.push_str(&format!(" {} ", FILES[*file as usize]));
        }
        out.push_str(footer.trim_end());
        out.push('\n');

        let side = match position.turn() {
            Color::White => "White",
            Color::Black => "Black",
        };
        out.push_str(&format!("{} to move", side));
        if !interaction_enabled {
            out.push_str(" (input locked)");
        }
        out.push('\n');

        self.frame = out;
    }
}
