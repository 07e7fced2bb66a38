//! Background receive loop for an open agent connection.
//!
//! The loop owns the read half of the WebSocket.  It routes every binary
//! message through [`decode_frame`] to the registered frame callback and logs
//! agent text messages.  It never restarts itself: when the socket closes or
//! errors it clears the connection's `open` flag and exits, and the next
//! connect or send notices.
//!
//! A malformed frame or a panicking callback drops that one frame only.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use deskwire_core::protocol::messages::AgentMessage;
use deskwire_core::decode_frame;
use futures_util::{Stream, StreamExt};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Consumer of decoded frames: `(payload, width, height)`.
pub type FrameCallback = Arc<dyn Fn(&[u8], u32, u32) + Send + Sync>;

/// The callback currently registered on a connection, swappable while the
/// loop runs.
pub type FrameSlot = Arc<RwLock<Option<FrameCallback>>>;

/// What the caller should do after one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Closed,
}

/// Handles one inbound message.
pub fn handle_message(msg: Message, slot: &FrameSlot) -> Flow {
    match msg {
        Message::Binary(data) => {
            handle_binary(&data, slot);
            Flow::Continue
        }
        Message::Text(text) => {
            handle_text(&text);
            Flow::Continue
        }
        Message::Close(frame) => {
            info!(?frame, "agent closed the connection");
            Flow::Closed
        }
        // Ping/pong replies are queued by tungstenite itself.
        _ => Flow::Continue,
    }
}

fn handle_binary(data: &[u8], slot: &FrameSlot) {
    let frame = match decode_frame(data) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, len = data.len(), "dropping malformed frame");
            return;
        }
    };

    let callback = slot.read().unwrap_or_else(|p| p.into_inner()).clone();
    let Some(callback) = callback else {
        debug!(width = frame.width, height = frame.height, "no frame callback, frame dropped");
        return;
    };

    let result = catch_unwind(AssertUnwindSafe(|| {
        callback(frame.payload, frame.width, frame.height)
    }));
    if result.is_err() {
        error!(width = frame.width, height = frame.height, "frame callback panicked, frame dropped");
    }
}

fn handle_text(text: &str) {
    match serde_json::from_str::<AgentMessage>(text) {
        Ok(AgentMessage::Hello { monitors }) => {
            info!(monitors = monitors.len(), "agent hello");
            debug!(?monitors, "agent monitor list");
        }
        Ok(AgentMessage::Unknown) => debug!(%text, "ignoring agent message"),
        Err(e) => debug!(error = %e, "ignoring non-JSON text message"),
    }
}

/// Reads `reader` until it ends, errors, yields a close frame, or `cancel`
/// fires.  Clears `open` on exit.
pub async fn run_receive_loop<S>(mut reader: S, slot: FrameSlot, open: Arc<AtomicBool>, cancel: CancellationToken)
where
    S: Stream<Item = Result<Message, WsError>> + Unpin,
{
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("receive loop cancelled");
                break;
            }
            next = reader.next() => next,
        };

        match next {
            Some(Ok(msg)) => {
                if handle_message(msg, &slot) == Flow::Closed {
                    break;
                }
            }
            Some(Err(e)) => {
                warn!(error = %e, "receive failed, stopping receive loop");
                break;
            }
            None => {
                info!("connection stream ended");
                break;
            }
        }
    }
    open.store(false, Ordering::Release);
}

/// Handle to a spawned receive loop.
pub struct ReceiveTask {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

impl ReceiveTask {
    pub fn spawn<S>(reader: S, slot: FrameSlot, open: Arc<AtomicBool>) -> Self
    where
        S: Stream<Item = Result<Message, WsError>> + Unpin + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_receive_loop(reader, slot, open, cancel.clone()));
        Self { handle, cancel }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancels the loop and waits until it has exited.
    pub async fn stop(self) {
        self.cancel.cancel();
        match self.handle.await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => {}
            Err(e) => error!(error = %e, "receive task ended abnormally"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
