//! Infrastructure layer for the client.
//!
//! **Dependency rule**: this layer may depend on `application`, `domain` and
//! `deskwire_core`, but MUST NOT be imported by the `application` or domain
//! layers.
//!
//! # Sub-modules
//!
//! - **`connection`** – the [`connection::ConnectionManager`]: socket
//!   lifecycle, connect retries, dialect-aware sending.
//! - **`receive`** – background loop routing inbound frames to the callback.
//! - **`rest_api`** – reqwest-backed `SessionApi` talking to the agent's
//!   session REST endpoints.
//! - **`session_store`** – process-wide in-memory session cache.
//! - **`config_file`** – TOML configuration loader.

pub mod config_file;
pub mod connection;
pub mod receive;
pub mod rest_api;
pub mod session_store;
