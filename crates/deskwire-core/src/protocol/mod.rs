//! Wire protocol for the agent WebSocket.
//!
//! - [`frame`]    – inbound binary video frames (`OFRA` header).
//! - [`messages`] – outbound JSON input messages for both dialects, plus the
//!                  inbound JSON text messages the agent may send.
//! - [`dialect`]  – translation from input intents to outbound messages.

pub mod dialect;
pub mod frame;
pub mod messages;

pub use dialect::{dialect_for_url, Dialect, DialectKind, EncodeError, LegacyDialect, SessionDialect};
pub use frame::{decode_frame, FrameError, VideoFrame};
pub use messages::{AgentMessage, LegacyMessage, SessionMessage, WireMessage};
