//! Core module - application settings and shared error types
//!
//! - [`AppSettings`] - User preferences (engine path, difficulty, time budgets)
//! - [`CoreError`] / [`CoreResult`] - Errors raised while persisting them

pub mod error;
pub mod settings;

pub use error::{CoreError, CoreResult};
pub use settings::{settings_path, AppSettings};
