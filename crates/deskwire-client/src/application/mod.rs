//! Application layer for the client.
//!
//! Contains use cases that depend only on traits and domain types; the
//! infrastructure layer supplies the implementations.
//!
//! - **`resolve_session`** – decides which session URL a connection should
//!   use, creating, reusing or giving up on sessions.

pub mod resolve_session;
