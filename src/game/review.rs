//! Step through an imported game
//!
//! [`GameReview`] keeps the full move list of a game and a cursor into it.
//! The cursor is `None` at the starting position and `Some(i)` after the
//! `i`-th half-move (zero based). Every step rebuilds the displayed position
//! by replaying from the start.

use crate::game::GameState;
use shakmaty::Color;
use tracing::warn;

/// Navigation commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
    First,
    Prev,
    Next,
    Last,
}

impl std::str::FromStr for NavDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" | "start" => Ok(NavDirection::First),
            "prev" | "previous" | "back" => Ok(NavDirection::Prev),
            "next" | "forward" => Ok(NavDirection::Next),
            "last" | "end" => Ok(NavDirection::Last),
            other => Err(format!("unknown direction '{}'", other)),
        }
    }
}

/// Cursor over the moves of a finished game
#[derive(Debug, Clone)]
pub struct GameReview {
    source: GameState,
    moves: Vec<String>,
    sans: Vec<String>,
    cursor: Option<usize>,
    current: GameState,
}

impl GameReview {
    /// Review `game`, starting at its final position
    pub fn new(game: &GameState) -> Self {
        let moves = game.uci_history();
        let cursor = moves.len().checked_sub(1);
        Self {
            sans: game.history(),
            moves,
            cursor,
            current: game.clone(),
            source: game.clone(),
        }
    }

    /// Move the cursor; returns whether the displayed position changed
    pub fn navigate(&mut self, direction: NavDirection) -> bool {
        let last = self.moves.len().checked_sub(1);
        let target = match direction {
            NavDirection::First => None,
            NavDirection::Prev => self.cursor.and_then(|i| i.checked_sub(1)),
            NavDirection::Next => match self.cursor {
                None => last.map(|_| 0),
                Some(i) if Some(i) < last => Some(i + 1),
                Some(i) => Some(i),
            },
            NavDirection::Last => last,
        };

        if target == self.cursor {
            return false;
        }
        self.seek(target);
        true
    }

    /// Jump to a specific cursor value, clamped to the game length
    pub fn seek(&mut self, cursor: Option<usize>) {
        let cursor = match (cursor, self.moves.len().checked_sub(1)) {
            (Some(i), Some(last)) => Some(i.min(last)),
            _ => None,
        };

        let mut game = self.source.restarted();
        let count = cursor.map_or(0, |i| i + 1);
        for uci in &self.moves[..count] {
            if game.apply_uci(uci).is_none() {
                warn!("[GAME] Replay stopped at unexpected move {}", uci);
                break;
            }
        }
        self.cursor = cursor;
        self.current = game;
    }

    /// Game at the cursor
    pub fn current(&self) -> &GameState {
        &self.current
    }

    /// The complete game under review
    pub fn game(&self) -> &GameState {
        &self.source
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn is_at_start(&self) -> bool {
        self.cursor.is_none()
    }

    pub fn is_at_end(&self) -> bool {
        self.cursor == self.moves.len().checked_sub(1)
    }

    /// Moves of the game in SAN
    pub fn moves(&self) -> &[String] {
        &self.sans
    }

    /// Label of the displayed ply, e.g. `12. Nf3` or `12... Nc6`
    pub fn label(&self) -> String {
        let Some(index) = self.cursor else {
            return "Start".to_string();
        };
        let start = self.source.start_position();
        let black_first = start.turn() == Color::Black;
        let first_fullmove = start
            .fen()
            .split(' ')
            .nth(5)
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(1);

        let offset = index + usize::from(black_first);
        let number = first_fullmove + offset / 2;
        let dots = if offset % 2 == 0 { "." } else { "..." };
        format!("{}{} {}", number, dots, self.sans[index])
    }
}
