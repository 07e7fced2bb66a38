//! Abstract input intents: pointer events and keyboard chords.
//!
//! These types describe *what the user wants to happen* on the remote
//! desktop, independent of which dialect the agent speaks.  The
//! [`crate::protocol::dialect`] module turns them into wire messages.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::keymap::{self, KeyCode, Modifier};
use crate::protocol::dialect::{finite_deltas, EncodeError};

/// Direction of a pointer-button toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonAction {
    Down,
    Up,
}

impl ButtonAction {
    /// Parses `"down"` / `"up"` (case-insensitive).
    ///
    /// Anything else is logged and treated as [`ButtonAction::Down`]; a bad
    /// action string must never abort the event.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "down" => ButtonAction::Down,
            "up" => ButtonAction::Up,
            _ => {
                warn!("invalid button action {raw:?}, defaulting to \"down\"");
                ButtonAction::Down
            }
        }
    }

    /// Wire spelling of the action.
    pub fn as_str(self) -> &'static str {
        match self {
            ButtonAction::Down => "down",
            ButtonAction::Up => "up",
        }
    }
}

/// A single pointer intent.
///
/// Deltas are kept as `f64` because the legacy dialect forwards them
/// unchanged; the session dialect rounds them to integers.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Relative cursor motion.
    Move { dx: f64, dy: f64 },
    /// Press and release of a button.
    Click { button: String },
    /// Independent press or release of a button.
    ButtonToggle { button: String, action: ButtonAction },
    /// Wheel motion on both axes.
    Scroll { dx: f64, dy: f64 },
}

impl InputEvent {
    /// Short name used in log messages.
    pub fn kind(&self) -> &'static str {
        match self {
            InputEvent::Move { .. } => "move",
            InputEvent::Click { .. } => "click",
            InputEvent::ButtonToggle { .. } => "button",
            InputEvent::Scroll { .. } => "scroll",
        }
    }

    /// Checks that pointer deltas are finite numbers.
    pub fn validate(&self) -> Result<(), EncodeError> {
        match self {
            InputEvent::Move { dx, dy } | InputEvent::Scroll { dx, dy } => {
                finite_deltas(*dx, *dy).map(|_| ())
            }
            InputEvent::Click { .. } | InputEvent::ButtonToggle { .. } => Ok(()),
        }
    }
}

/// Loosely-typed pointer request, as received from a CLI, a service call or
/// a JSON document.
///
/// Convert it with [`InputEvent::try_from`], which enforces the fields each
/// kind requires.
///
/// ```rust
/// use deskwire_core::{InputEvent, PointerCommand};
///
/// let cmd: PointerCommand = serde_json::from_str(r#"{"kind":"move","dx":4,"dy":-2}"#).unwrap();
/// let event = InputEvent::try_from(cmd).unwrap();
/// assert_eq!(event, InputEvent::Move { dx: 4.0, dy: -2.0 });
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointerCommand {
    /// One of `move`, `click`, `button`, `scroll`.
    pub kind: String,
    #[serde(default)]
    pub dx: Option<f64>,
    #[serde(default)]
    pub dy: Option<f64>,
    #[serde(default)]
    pub button: Option<String>,
    /// Only meaningful for `button`; `"down"` when absent.
    #[serde(default)]
    pub action: Option<String>,
}

impl TryFrom<PointerCommand> for InputEvent {
    type Error = EncodeError;

    fn try_from(cmd: PointerCommand) -> Result<Self, Self::Error> {
        let deltas = |cmd: &PointerCommand| -> Result<(f64, f64), EncodeError> {
            let dx = cmd.dx.ok_or(EncodeError::MissingField("dx"))?;
            let dy = cmd.dy.ok_or(EncodeError::MissingField("dy"))?;
            finite_deltas(dx, dy)
        };

        match cmd.kind.trim().to_ascii_lowercase().as_str() {
            "move" => {
                let (dx, dy) = deltas(&cmd)?;
                Ok(InputEvent::Move { dx, dy })
            }
            "scroll" => {
                let (dx, dy) = deltas(&cmd)?;
                Ok(InputEvent::Scroll { dx, dy })
            }
            "click" => {
                let button = cmd.button.ok_or(EncodeError::MissingField("button"))?;
                Ok(InputEvent::Click { button })
            }
            "button" => {
                let button = cmd.button.ok_or(EncodeError::MissingField("button"))?;
                let action = cmd
                    .action
                    .as_deref()
                    .map(ButtonAction::parse_lenient)
                    .unwrap_or(ButtonAction::Down);
                Ok(InputEvent::ButtonToggle { button, action })
            }
            _ => Err(EncodeError::UnknownEventKind(cmd.kind)),
        }
    }
}

/// An ordered keyboard chord such as `["CTRL", "SHIFT", "A"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCombo {
    keys: Vec<String>,
}

/// A main (non-modifier) key that resolved to a code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    /// Upper-cased name as given by the caller.
    pub name: String,
    pub code: KeyCode,
}

/// A [`KeyCombo`] split into modifiers and main keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedCombo {
    /// Modifiers in first-occurrence order, duplicates collapsed.
    pub modifiers: Vec<Modifier>,
    /// Main keys in input order.
    pub main_keys: Vec<ResolvedKey>,
    /// Names that matched nothing in the key table.
    pub dropped: Vec<String>,
}

impl ClassifiedCombo {
    /// `true` when no key at all resolved.
    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty() && self.main_keys.is_empty()
    }

    pub fn has(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }
}

impl KeyCombo {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Splits the chord into modifiers and main keys.
    ///
    /// Unknown names are logged and collected in
    /// [`ClassifiedCombo::dropped`]; they never abort the rest of the chord.
    pub fn classify(&self) -> ClassifiedCombo {
        let mut out = ClassifiedCombo::default();
        for key in &self.keys {
            if let Some(modifier) = Modifier::from_name(key) {
                if !out.modifiers.contains(&modifier) {
                    out.modifiers.push(modifier);
                }
                continue;
            }
            match keymap::lookup(key) {
                Some(code) => out.main_keys.push(ResolvedKey {
                    name: key.trim().to_ascii_uppercase(),
                    code,
                }),
                None => {
                    warn!("unknown key name {key:?}, skipping");
                    out.dropped.push(key.clone());
                }
            }
        }
        out
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(kind: &str) -> PointerCommand {
        PointerCommand {
            kind: kind.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_move_command_with_deltas_converts() {
        // Arrange
        let c = PointerCommand {
            dx: Some(1.5),
            dy: Some(-2.0),
            ..cmd("move")
        };

        // Act
        let event = InputEvent::try_from(c).unwrap();

        // Assert
        assert_eq!(event, InputEvent::Move { dx: 1.5, dy: -2.0 });
    }

    #[test]
    fn test_move_command_without_dy_is_missing_field() {
        let c = PointerCommand {
            dx: Some(1.0),
            ..cmd("move")
        };
        assert_eq!(InputEvent::try_from(c), Err(EncodeError::MissingField("dy")));
    }

    #[test]
    fn test_move_command_with_infinite_delta_is_rejected() {
        let c = PointerCommand {
            dx: Some(2.0),
            dy: Some(f64::NEG_INFINITY),
            ..cmd("move")
        };
        assert_eq!(InputEvent::try_from(c), Err(EncodeError::NonFiniteDelta("dy")));
    }

    #[test]
    fn test_scroll_command_without_deltas_is_missing_dx() {
        assert_eq!(
            InputEvent::try_from(cmd("scroll")),
            Err(EncodeError::MissingField("dx"))
        );
    }

    #[test]
    fn test_click_command_requires_button() {
        assert_eq!(
            InputEvent::try_from(cmd("click")),
            Err(EncodeError::MissingField("button"))
        );
    }

    #[test]
    fn test_button_command_defaults_action_to_down() {
        let c = PointerCommand {
            button: Some("left".into()),
            ..cmd("button")
        };
        assert_eq!(
            InputEvent::try_from(c).unwrap(),
            InputEvent::ButtonToggle {
                button: "left".into(),
                action: ButtonAction::Down
            }
        );
    }

    #[test]
    fn test_button_command_with_garbage_action_defaults_to_down() {
        let c = PointerCommand {
            button: Some("right".into()),
            action: Some("sideways".into()),
            ..cmd("button")
        };
        let event = InputEvent::try_from(c).unwrap();
        assert!(matches!(
            event,
            InputEvent::ButtonToggle {
                action: ButtonAction::Down,
                ..
            }
        ));
    }

    #[test]
    fn test_button_command_up_is_preserved() {
        let c = PointerCommand {
            button: Some("left".into()),
            action: Some("UP".into()),
            ..cmd("button")
        };
        assert!(matches!(
            InputEvent::try_from(c).unwrap(),
            InputEvent::ButtonToggle {
                action: ButtonAction::Up,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        assert_eq!(
            InputEvent::try_from(cmd("teleport")),
            Err(EncodeError::UnknownEventKind("teleport".into()))
        );
    }

    #[test]
    fn test_classify_splits_modifiers_and_main_keys() {
        // Arrange
        let combo = KeyCombo::new(["a", "ctrl", "Shift", "F4"]);

        // Act
        let c = combo.classify();

        // Assert: modifiers in input order, main keys in input order
        assert_eq!(c.modifiers, vec![Modifier::Ctrl, Modifier::Shift]);
        let names: Vec<_> = c.main_keys.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["A", "F4"]);
        assert!(c.dropped.is_empty());
    }

    #[test]
    fn test_classify_drops_unknown_names_only() {
        let c = KeyCombo::new(["CTRL", "HYPER", "C"]).classify();
        assert_eq!(c.dropped, vec!["HYPER".to_string()]);
        assert_eq!(c.main_keys.len(), 1);
        assert!(c.has(Modifier::Ctrl));
    }

    #[test]
    fn test_classify_collapses_duplicate_modifiers() {
        let c = KeyCombo::new(["CTRL", "CONTROL", "V"]).classify();
        assert_eq!(c.modifiers, vec![Modifier::Ctrl]);
    }

    #[test]
    fn test_classify_all_unknown_is_empty() {
        let c = KeyCombo::new(["??", "NOPE"]).classify();
        assert!(c.is_empty());
        assert_eq!(c.dropped.len(), 2);
    }
}
