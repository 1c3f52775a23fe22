//! Engine child process transport
//!
//! Spawns the engine with piped stdin/stdout. A writer task drains an
//! unbounded FIFO into stdin so `send` never blocks the caller, and a reader
//! task forwards every stdout line (or the failure that ended reading) as a
//! [`TransportEvent`]. When reading ends the writer stops too, so the
//! inbound channel closes after the final event.

use super::{EngineTransport, TransportEvent};
use crate::error::{BridgeError, BridgeResult};
use async_trait::async_trait;
use std::ffi::OsStr;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Transport backed by a spawned engine executable
///
/// Must be created from within a Tokio runtime. The child is killed when
/// [`EngineTransport::terminate`] is called or the transport is dropped.
#[derive(Debug)]
pub struct ProcessTransport {
    program: String,
    child: Option<Child>,
    outbound: Option<mpsc::UnboundedSender<String>>,
    inbound: mpsc::UnboundedReceiver<TransportEvent>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl ProcessTransport {
    /// Start `program` with `args` and wire up its pipes
    pub fn spawn<S: AsRef<OsStr>>(program: S, args: &[String]) -> BridgeResult<Self> {
        let program_name = program.as_ref().to_string_lossy().into_owned();

        let mut child = Command::new(program.as_ref())
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| BridgeError::Spawn {
                program: program_name.clone(),
                source,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BridgeError::transport("engine stdin was not captured"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BridgeError::transport("engine stdout was not captured"))?;

        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<TransportEvent>();

        // Dropped by the reader when the engine's output ends
        let (reader_done_tx, mut reader_done_rx) = oneshot::channel::<()>();

        let writer_events = inbound_tx.clone();
        let writer = tokio::spawn(async move {
            let mut stdin = stdin;
            loop {
                let line = tokio::select! {
                    biased;
                    _ = &mut reader_done_rx => break,
                    line = outbound_rx.recv() => match line {
                        Some(line) => line,
                        None => break,
                    },
                };
                let mut bytes = line.into_bytes();
                bytes.push(b'\n');
                let written = match stdin.write_all(&bytes).await {
                    Ok(()) => stdin.flush().await,
                    Err(e) => Err(e),
                };
                if let Err(e) = written {
                    let _ = writer_events.send(TransportEvent::Error(format!(
                        "failed to write to engine: {}",
                        e
                    )));
                    break;
                }
            }
        });

        let reader = tokio::spawn(async move {
            let _reader_done = reader_done_tx;
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if inbound_tx.send(TransportEvent::Line(line)).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        let _ = inbound_tx.send(TransportEvent::Closed);
                        break;
                    }
                    Err(e) => {
                        let _ = inbound_tx.send(TransportEvent::Error(format!(
                            "failed to read from engine: {}",
                            e
                        )));
                        break;
                    }
                }
            }
        });

        debug!("[ENGINE] Spawned '{}' (pid {:?})", program_name, child.id());

        Ok(Self {
            program: program_name,
            child: Some(child),
            outbound: Some(outbound_tx),
            inbound: inbound_rx,
            reader,
            writer,
        })
    }

    /// Name of the executable this transport started
    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl EngineTransport for ProcessTransport {
    fn send(&mut self, line: &str) -> BridgeResult<()> {
        let outbound = self.outbound.as_ref().ok_or(BridgeError::Disposed)?;
        outbound
            .send(line.to_string())
            .map_err(|_| BridgeError::transport("engine writer has stopped"))
    }

    fn try_recv(&mut self) -> Option<TransportEvent> {
        self.inbound.try_recv().ok()
    }

    async fn recv(&mut self) -> Option<TransportEvent> {
        self.inbound.recv().await
    }

    fn terminate(&mut self) {
        self.outbound = None;
        self.writer.abort();
        self.reader.abort();
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.start_kill() {
                warn!("[ENGINE] Failed to kill '{}': {}", self.program, e);
            }
        }
    }
}

impl Drop for ProcessTransport {
    fn drop(&mut self) {
        self.terminate();
    }
}
