//! Domain layer for the client.
//!
//! Plain data with no I/O: the runtime configuration every other layer reads.
//! Input intents, sessions and dialects live in `deskwire_core`.

pub mod config;

pub use config::{ClientConfig, RetryPolicy};
