//! Transports carrying protocol lines to and from an engine
//!
//! The session never touches pipes directly. It writes whole lines through
//! [`EngineTransport::send`] and consumes [`TransportEvent`]s, either by
//! draining what is already buffered or by awaiting the next one.
//!
//! - `process` - a real engine child process driven over stdin/stdout
//! - `scripted` - an in-memory transport for tests (feature `test-utils`)

mod process;
#[cfg(any(test, feature = "test-utils"))]
mod scripted;

pub use process::ProcessTransport;
#[cfg(any(test, feature = "test-utils"))]
pub use scripted::{ScriptHandle, ScriptedTransport};

use crate::error::BridgeResult;
use async_trait::async_trait;

/// Something that happened on the inbound side of a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// One line of engine output, without the line terminator
    Line(String),
    /// Reading or writing failed
    Error(String),
    /// The engine closed its output (process exited)
    Closed,
}

/// Bidirectional line channel to an engine
///
/// Lines handed to `send` must reach the engine in call order, and inbound
/// events must be yielded in the order the engine produced them.
#[async_trait]
pub trait EngineTransport: Send {
    /// Queue one command line for the engine
    fn send(&mut self, line: &str) -> BridgeResult<()>;

    /// Take the next buffered event without waiting
    fn try_recv(&mut self) -> Option<TransportEvent>;

    /// Wait for the next event; `None` once the transport has no more to give
    async fn recv(&mut self) -> Option<TransportEvent>;

    /// Forcibly stop the engine; later sends fail
    fn terminate(&mut self);
}
