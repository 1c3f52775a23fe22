//! App module - the play and analysis screens
//!
//! Each screen owns its [`GameState`](crate::game::GameState) and, where it
//! needs one, an [`EngineSession`](uci_bridge::EngineSession). Screens are
//! driven by one task: gestures arrive as method calls and engine output is
//! fed in through `handle_engine_update`.
//!
//! - `play` - [`PlayScreen`], local hot-seat or versus the engine
//! - `analysis` - [`AnalysisScreen`], PGN import, navigation and analysis

pub mod analysis;
pub mod play;

pub use analysis::{AnalysisAction, AnalysisScreen};
pub use play::{ClickOutcome, PlayMode, PlayScreen};

use crate::core::AppSettings;

/// Bounds for one engine search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub max_depth: u32,
    pub movetime_ms: u64,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_depth: 20,
            movetime_ms: 1000,
        }
    }
}

impl SearchLimits {
    /// Limits for the engine's replies in play mode
    pub fn for_play(settings: &AppSettings) -> Self {
        Self {
            max_depth: settings.max_depth,
            movetime_ms: settings.thinking_time_ms,
        }
    }

    /// Limits for the analysis screen
    pub fn for_analysis(settings: &AppSettings) -> Self {
        Self {
            max_depth: settings.analysis_depth,
            movetime_ms: settings.thinking_time_ms,
        }
    }
}
