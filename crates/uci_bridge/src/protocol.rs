//! UCI line protocol
//!
//! Outbound commands are typed values rendered to wire lines with `Display`;
//! inbound lines are parsed into a tagged [`EngineEvent`]. Lines the parser
//! does not recognise yield `None` and are ignored by the session.
//!
//! ## Module Organization
//!
//! - `command` - Commands sent to the engine
//! - `event` - Events parsed from engine output
//! - `score` - Score and evaluation decoding

mod command;
mod event;
mod score;

pub use command::{EngineCommand, SKILL_LEVEL_OPTION};
pub use event::{parse_line, EngineEvent, InfoLine};
pub use score::{Evaluation, Score, ScoreBound};
