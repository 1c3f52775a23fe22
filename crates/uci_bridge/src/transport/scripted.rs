//! In-memory transport for tests
//!
//! Records every line the session sends and replays queued engine output.
//! The [`ScriptHandle`] stays with the test while the transport itself is
//! moved into the session.

use super::{EngineTransport, TransportEvent};
use crate::error::{BridgeError, BridgeResult};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Script {
    sent: Vec<String>,
    incoming: VecDeque<TransportEvent>,
    terminated: bool,
    fail_sends: bool,
}

/// Transport that talks to a script instead of a process
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

/// Test-side view of a [`ScriptedTransport`]
#[derive(Debug, Clone)]
pub struct ScriptHandle {
    script: Arc<Mutex<Script>>,
}

fn lock(script: &Arc<Mutex<Script>>) -> MutexGuard<'_, Script> {
    // A panicking test thread must not hide the script from the assertions
    script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedTransport {
    /// Create a transport and the handle that drives it
    pub fn new() -> (Self, ScriptHandle) {
        let transport = Self::default();
        let handle = ScriptHandle {
            script: Arc::clone(&transport.script),
        };
        (transport, handle)
    }
}

impl ScriptHandle {
    /// Queue a line of engine output
    pub fn push_line(&self, line: &str) {
        lock(&self.script)
            .incoming
            .push_back(TransportEvent::Line(line.to_string()));
    }

    /// Queue a raw transport event
    pub fn push_event(&self, event: TransportEvent) {
        lock(&self.script).incoming.push_back(event);
    }

    /// Every line sent so far, oldest first
    pub fn sent(&self) -> Vec<String> {
        lock(&self.script).sent.clone()
    }

    /// Forget recorded lines
    pub fn clear_sent(&self) {
        lock(&self.script).sent.clear();
    }

    /// Make every later `send` fail
    pub fn fail_sends(&self) {
        lock(&self.script).fail_sends = true;
    }

    pub fn is_terminated(&self) -> bool {
        lock(&self.script).terminated
    }
}

#[async_trait]
impl EngineTransport for ScriptedTransport {
    fn send(&mut self, line: &str) -> BridgeResult<()> {
        let mut script = lock(&self.script);
        if script.terminated {
            return Err(BridgeError::Disposed);
        }
        if script.fail_sends {
            return Err(BridgeError::transport("scripted send failure"));
        }
        script.sent.push(line.to_string());
        Ok(())
    }

    fn try_recv(&mut self) -> Option<TransportEvent> {
        lock(&self.script).incoming.pop_front()
    }

    async fn recv(&mut self) -> Option<TransportEvent> {
        self.try_recv()
    }

    fn terminate(&mut self) {
        lock(&self.script).terminated = true;
    }
}
