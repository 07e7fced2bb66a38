//! # deskwire-core
//!
//! Shared library for the deskwire remote-desktop client containing the
//! input encoding dialects, the key-name translation table, and the inbound
//! video frame decoder.
//!
//! It has zero dependencies on sockets, async runtimes, or HTTP clients, so
//! everything here can be tested with plain `#[test]` functions.
//!
//! # Architecture overview
//!
//! A remote desktop agent accepts human input (pointer motion, clicks,
//! scrolling, keyboard chords) over a WebSocket and streams compressed video
//! frames back over the same connection.  Two generations of the agent speak
//! two different JSON vocabularies for input, called *dialects*:
//!
//! - **Legacy** – the first-generation fixed endpoint (`/api/v1/rd/session`), no
//!   session token, one coarse message per action.
//! - **Session-based** – a per-session URL handed out by the agent's REST API,
//!   with fine-grained down/up messages and Windows virtual-key codes.
//!
//! This crate defines:
//!
//! - **`domain`** – Input intents ([`InputEvent`], [`KeyCombo`]) and the
//!   [`Session`] token record.
//! - **`keymap`** – Key-name → virtual-key code table and the [`Modifier`] set.
//! - **`protocol`** – The [`Dialect`] trait with its two implementations, the
//!   outbound wire message shapes, and the 16-byte `OFRA` frame decoder.

pub mod domain;
pub mod keymap;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `deskwire_core::InputEvent` instead of `deskwire_core::domain::input::InputEvent`.
pub use domain::input::{ButtonAction, InputEvent, KeyCombo, PointerCommand};
pub use domain::session::{Endpoint, Session};
pub use keymap::{KeyCode, Modifier};
pub use protocol::dialect::{dialect_for_url, Dialect, DialectKind, EncodeError, LegacyDialect, SessionDialect};
pub use protocol::frame::{decode_frame, FrameError, VideoFrame, FRAME_HEADER_SIZE, FRAME_MAGIC};
pub use protocol::messages::WireMessage;
