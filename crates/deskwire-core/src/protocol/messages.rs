//! JSON message shapes exchanged with the agent.
//!
//! Outbound (client → agent), one JSON object per WebSocket text frame:
//!
//! ```json
//! {"type":"pointer","event":"move","dx":10.6,"dy":-3.2}      (legacy)
//! {"type":"keyboard","keys":["CTRL","C"]}                    (legacy)
//! {"type":"pointer_move","dx":11,"dy":-3}                    (session)
//! {"type":"pointer_button","button":"left","action":"down"}  (session)
//! {"type":"pointer_wheel","delta_x":0,"delta_y":-120}        (session)
//! {"type":"key","key_code":65,"action":"down","ctrl":true}   (session)
//! ```
//!
//! Inbound text frames are parsed as [`AgentMessage`]; binary frames are
//! video (see [`super::frame`]).

use serde::{Deserialize, Serialize};

use crate::domain::input::ButtonAction;

// ── Legacy dialect ────────────────────────────────────────────────────────────

/// Messages understood by the legacy fixed endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LegacyMessage {
    /// `{"type":"pointer","event":...}`; the pointer fields are flattened
    /// into the same object.
    Pointer(LegacyPointer),
    /// A whole chord in one message, modifiers first.
    Keyboard { keys: Vec<String> },
}

/// The `event` discriminated part of a legacy pointer message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LegacyPointer {
    Move { dx: f64, dy: f64 },
    Click { button: String },
    Scroll { dx: f64, dy: f64 },
}

// ── Session-based dialect ─────────────────────────────────────────────────────

/// Messages understood by session-based endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionMessage {
    PointerMove {
        dx: i32,
        dy: i32,
    },
    PointerButton {
        button: String,
        action: ButtonAction,
    },
    PointerWheel {
        delta_x: i32,
        delta_y: i32,
    },
    /// One key transition.  Modifier flags are only serialized when set.
    Key {
        key_code: u8,
        action: ButtonAction,
        #[serde(default, skip_serializing_if = "is_false")]
        ctrl: bool,
        #[serde(default, skip_serializing_if = "is_false")]
        alt: bool,
        #[serde(default, skip_serializing_if = "is_false")]
        shift: bool,
        #[serde(default, skip_serializing_if = "is_false")]
        win: bool,
    },
}

fn is_false(b: &bool) -> bool {
    !*b
}

// ── Either dialect ────────────────────────────────────────────────────────────

/// An outbound message in whichever dialect produced it.
///
/// Serializes transparently as the inner message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WireMessage {
    Legacy(LegacyMessage),
    Session(SessionMessage),
}

impl WireMessage {
    /// Renders the message as a single-line JSON document.
    ///
    /// Deltas are expected to be finite: the dialects reject NaN and
    /// infinities with [`crate::EncodeError::NonFiniteDelta`] before a
    /// message is built, since `serde_json` would write them as `null`.
    ///
    /// # Errors
    ///
    /// Propagates any `serde_json` serialization error.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<LegacyMessage> for WireMessage {
    fn from(m: LegacyMessage) -> Self {
        WireMessage::Legacy(m)
    }
}

impl From<SessionMessage> for WireMessage {
    fn from(m: SessionMessage) -> Self {
        WireMessage::Session(m)
    }
}

// ── Inbound ───────────────────────────────────────────────────────────────────

/// JSON text messages the agent sends on its own initiative.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentMessage {
    /// Greeting sent right after a session-based connection opens.
    Hello {
        /// Monitor descriptors; the layout is agent-defined and passed
        /// through as raw JSON.
        #[serde(default)]
        monitors: Vec<serde_json::Value>,
    },
    /// Any message type this client does not act on.
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dialect;
    use serde_json::json;

    fn value(msg: impl Into<WireMessage>) -> serde_json::Value {
        serde_json::from_str(&msg.into().to_json().unwrap()).unwrap()
    }

    #[test]
    fn test_legacy_pointer_move_is_flattened() {
        let v = value(LegacyMessage::Pointer(LegacyPointer::Move { dx: 10.6, dy: -3.2 }));
        assert_eq!(v, json!({"type":"pointer","event":"move","dx":10.6,"dy":-3.2}));
    }

    #[test]
    fn test_legacy_keyboard_shape() {
        let v = value(LegacyMessage::Keyboard {
            keys: vec!["CTRL".into(), "C".into()],
        });
        assert_eq!(v, json!({"type":"keyboard","keys":["CTRL","C"]}));
    }

    #[test]
    fn test_session_key_omits_unset_flags() {
        let v = value(SessionMessage::Key {
            key_code: 0x41,
            action: ButtonAction::Down,
            ctrl: true,
            alt: false,
            shift: false,
            win: false,
        });
        assert_eq!(v, json!({"type":"key","key_code":65,"action":"down","ctrl":true}));
    }

    #[test]
    fn test_session_wheel_uses_delta_field_names() {
        let v = value(SessionMessage::PointerWheel {
            delta_x: 0,
            delta_y: -120,
        });
        assert_eq!(v, json!({"type":"pointer_wheel","delta_x":0,"delta_y":-120}));
    }

    #[test]
    fn test_agent_hello_parses_monitors() {
        let msg: AgentMessage =
            serde_json::from_str(r#"{"type":"hello","monitors":[{"id":"\\\\.\\DISPLAY1"}]}"#)
                .unwrap();
        match msg {
            AgentMessage::Hello { monitors } => assert_eq!(monitors.len(), 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_agent_unknown_type_is_tolerated() {
        let msg: AgentMessage = serde_json::from_str(r#"{"type":"cursor","x":1}"#).unwrap();
        assert_eq!(msg, AgentMessage::Unknown);
    }

    #[test]
    fn test_non_finite_legacy_delta_is_rejected_before_serializing() {
        // Arrange
        let event = crate::InputEvent::Scroll {
            dx: f64::NAN,
            dy: 0.0,
        };

        // Act
        let result = crate::LegacyDialect.encode_event(&event);

        // Assert
        assert_eq!(result, Err(crate::EncodeError::NonFiniteDelta("dx")));
    }
}
