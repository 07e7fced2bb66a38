//! Domain types for deskwire.
//!
//! Everything here is plain data: no I/O, no clocks read implicitly, no
//! global state.  Input intents are constructed per call and thrown away;
//! sessions are records handed around by the client's session resolver.

pub mod input;
pub mod session;

pub use input::{ButtonAction, InputEvent, KeyCombo, PointerCommand};
pub use session::{Endpoint, Session};
