//! chessdesk - play and analyse chess against an external UCI engine
//!
//! ## Module Organization
//!
//! - `core` - Settings persistence and shared errors
//! - `game` - Game state, PGN import/export and review navigation
//! - `rendering` - Board view contract and the text renderer
//! - `app` - Play and analysis screens
//!
//! Engine process management lives in the `uci_bridge` crate.

pub mod app;
pub mod core;
pub mod game;
pub mod rendering;
