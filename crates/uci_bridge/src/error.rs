//! Error types for the engine bridge
//!
//! Covers process spawning, the pipe transport, and requests that the
//! session refuses because of its current phase.

use thiserror::Error;

/// Errors that can occur while talking to an engine process
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The engine executable could not be started
    #[error("Failed to spawn engine '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading from or writing to the engine pipes failed
    #[error("Engine transport error: {message}")]
    Transport { message: String },

    /// The engine has not completed the `uci` handshake yet
    #[error("Engine is not ready")]
    NotReady,

    /// The session has been disposed and accepts no further commands
    #[error("Engine session has been disposed")]
    Disposed,

    /// No `bestmove` arrived within the allotted time
    #[error("Timed out after {millis}ms waiting for the engine")]
    Timeout { millis: u64 },
}

impl BridgeError {
    pub(crate) fn transport(message: impl Into<String>) -> Self {
        BridgeError::Transport {
            message: message.into(),
        }
    }
}

/// Result type alias for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;
