//! deskwire-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does deskwire-client do?
//!
//! It keeps one persistent WebSocket open to a remote desktop agent, relays
//! pointer and keyboard input over it, and hands every inbound video frame
//! header and payload to a caller-supplied callback.
//!
//! 1. A caller sends an input intent through [`ConnectionManager`].
//! 2. If no socket is open, the manager asks the [`SessionResolver`] for a
//!    session URL (reusing a cached one when possible) or falls back to the
//!    agent's legacy fixed endpoint.
//! 3. The endpoint URL fixes the input dialect for the connection's lifetime;
//!    the intent is encoded in that dialect and transmitted in order.
//! 4. A background receive loop decodes binary frames and invokes the frame
//!    callback until the socket closes or [`ConnectionManager::close`] is
//!    called.

/// Domain layer: configuration values.
pub mod domain;

/// Application layer: session resolution and its collaborator traits.
pub mod application;

/// Infrastructure layer: WebSocket, REST and config-file adapters.
pub mod infrastructure;

pub mod error;

pub use application::resolve_session::{ResolveError, SessionApi, SessionApiError, SessionResolver, SessionStore};
pub use domain::config::{ClientConfig, RetryPolicy};
pub use error::ClientError;
pub use infrastructure::connection::{ConnectionManager, ConnectionState};
pub use infrastructure::session_store::InMemorySessionStore;
