//! Rendering module - board view contract and the text renderer
//!
//! A [`BoardView`] draws a [`BoardPosition`] with per-square highlights. It
//! never decides legality: gestures are routed back to a controller in
//! `crate::app`, which applies them through the game state.
//!
//! - `highlight` - [`Highlight`] kinds and the [`HighlightMap`]
//! - `text` - [`TextBoardView`], an 8x8 terminal renderer

pub mod highlight;
pub mod text;

pub use highlight::{Highlight, HighlightMap};
pub use text::TextBoardView;

use crate::game::BoardPosition;

/// Something that can display a board
pub trait BoardView {
    /// Draw `position`; `interaction_enabled` tells whether gestures are accepted
    fn render(&mut self, position: &BoardPosition, interaction_enabled: bool, highlights: &HighlightMap);
}
