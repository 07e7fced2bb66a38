//! Input dialects: how abstract input intents become wire messages.
//!
//! The agent speaks one of two dialects, chosen by the URL a connection is
//! made to:
//!
//! | URL contains             | Dialect                      |
//! |--------------------------|------------------------------|
//! | `/api/v1/rd/session`     | [`LegacyDialect`]            |
//! | anything else            | [`SessionDialect`]           |
//!
//! Both implement [`Dialect`].  Encoding is pure: the same intent always
//! produces the same messages, and no I/O happens here.

use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::input::{ButtonAction, ClassifiedCombo, InputEvent, KeyCombo};
use crate::keymap::{KeyCode, Modifier};
use crate::protocol::messages::{LegacyMessage, LegacyPointer, SessionMessage, WireMessage};

/// Path fragment that identifies the legacy fixed endpoint.
pub const LEGACY_PATH: &str = "/api/v1/rd/session";

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors raised while turning input intents into wire messages.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncodeError {
    /// A pointer command of a known kind lacks a field it needs.
    #[error("pointer command is missing required field {0:?}")]
    MissingField(&'static str),

    /// A pointer command names a kind outside `move|click|button|scroll`.
    #[error("unknown pointer event kind {0:?}")]
    UnknownEventKind(String),

    /// A keyboard chord with no keys at all.
    #[error("key combination is empty")]
    EmptyKeyCombo,

    /// A pointer delta is NaN or infinite.
    #[error("pointer delta {0:?} is not a finite number")]
    NonFiniteDelta(&'static str),
}

/// Rejects NaN and infinite pointer deltas.
pub(crate) fn finite_deltas(dx: f64, dy: f64) -> Result<(f64, f64), EncodeError> {
    if !dx.is_finite() {
        return Err(EncodeError::NonFiniteDelta("dx"));
    }
    if !dy.is_finite() {
        return Err(EncodeError::NonFiniteDelta("dy"));
    }
    Ok((dx, dy))
}

// ── Dialect trait ─────────────────────────────────────────────────────────────

/// Which of the two input dialects applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialectKind {
    /// The fixed `/api/v1/rd/session` endpoint.
    Legacy,
    /// Endpoints handed out by the session REST API.
    SessionBased,
}

impl DialectKind {
    /// Selects the dialect for a WebSocket URL.
    pub fn from_url(url: &str) -> Self {
        if url.contains(LEGACY_PATH) {
            DialectKind::Legacy
        } else {
            DialectKind::SessionBased
        }
    }

    pub fn is_legacy(self) -> bool {
        self == DialectKind::Legacy
    }
}

/// Encodes input intents into the messages of one dialect.
///
/// Implementations are stateless and may be shared across tasks.
pub trait Dialect: Send + Sync {
    fn kind(&self) -> DialectKind;

    /// Encodes one pointer intent.
    ///
    /// Returns one message for most intents; a session-based click expands
    /// to a press followed by a release.
    fn encode_event(&self, event: &InputEvent) -> Result<Vec<WireMessage>, EncodeError>;

    /// Encodes a keyboard chord.
    ///
    /// Unknown key names are dropped.  A chord where nothing resolves
    /// encodes to no messages.
    ///
    /// # Errors
    ///
    /// [`EncodeError::EmptyKeyCombo`] when `combo` has no keys at all.
    fn encode_combo(&self, combo: &KeyCombo) -> Result<Vec<WireMessage>, EncodeError>;
}

/// Returns the dialect matching `url`.
pub fn dialect_for_url(url: &str) -> Box<dyn Dialect> {
    match DialectKind::from_url(url) {
        DialectKind::Legacy => Box::new(LegacyDialect),
        DialectKind::SessionBased => Box::new(SessionDialect),
    }
}

/// Shared first step of combo encoding for both dialects.
fn classify_non_empty(combo: &KeyCombo) -> Result<Option<ClassifiedCombo>, EncodeError> {
    if combo.is_empty() {
        return Err(EncodeError::EmptyKeyCombo);
    }
    let classified = combo.classify();
    if classified.is_empty() {
        warn!(keys = ?combo.keys(), "no key in combination resolved, nothing sent");
        return Ok(None);
    }
    Ok(Some(classified))
}

// ── Legacy ────────────────────────────────────────────────────────────────────

/// Dialect of the fixed legacy endpoint.
///
/// Pointer deltas are forwarded unchanged; a chord is one `keyboard`
/// message.  The legacy endpoint has no separate press/release, so a
/// [`InputEvent::ButtonToggle`] degrades to a click.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyDialect;

impl Dialect for LegacyDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Legacy
    }

    fn encode_event(&self, event: &InputEvent) -> Result<Vec<WireMessage>, EncodeError> {
        let pointer = match event {
            InputEvent::Move { dx, dy } => {
                let (dx, dy) = finite_deltas(*dx, *dy)?;
                LegacyPointer::Move { dx, dy }
            }
            InputEvent::Scroll { dx, dy } => {
                let (dx, dy) = finite_deltas(*dx, *dy)?;
                LegacyPointer::Scroll { dx, dy }
            }
            InputEvent::Click { button } => LegacyPointer::Click {
                button: button.to_ascii_lowercase(),
            },
            InputEvent::ButtonToggle { button, action } => {
                debug!(
                    button = %button,
                    action = action.as_str(),
                    "legacy endpoint has no button toggle, sending click"
                );
                LegacyPointer::Click {
                    button: button.to_ascii_lowercase(),
                }
            }
        };
        Ok(vec![LegacyMessage::Pointer(pointer).into()])
    }

    fn encode_combo(&self, combo: &KeyCombo) -> Result<Vec<WireMessage>, EncodeError> {
        let Some(classified) = classify_non_empty(combo)? else {
            return Ok(Vec::new());
        };

        let keys = classified
            .modifiers
            .iter()
            .map(|m| m.canonical_name().to_string())
            .chain(classified.main_keys.into_iter().map(|k| k.name))
            .collect();

        Ok(vec![LegacyMessage::Keyboard { keys }.into()])
    }
}

// ── Session-based ─────────────────────────────────────────────────────────────

/// Dialect of session-based endpoints.
///
/// Pointer deltas are rounded to integers (half away from zero).  Keys are
/// sent as individual down/up transitions carrying virtual-key codes and
/// the state of the chord's other modifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionDialect;

impl SessionDialect {
    fn button(button: &str, action: ButtonAction) -> WireMessage {
        SessionMessage::PointerButton {
            button: button.to_ascii_lowercase(),
            action,
        }
        .into()
    }

    /// One key transition.  A modifier never flags itself.
    fn key(code: KeyCode, action: ButtonAction, held: &[Modifier]) -> WireMessage {
        let flag = |m: Modifier| held.contains(&m) && m.key_code() != code;
        SessionMessage::Key {
            key_code: code.value(),
            action,
            ctrl: flag(Modifier::Ctrl),
            alt: flag(Modifier::Alt),
            shift: flag(Modifier::Shift),
            win: flag(Modifier::Win),
        }
        .into()
    }
}

/// Rounds half away from zero; finite values beyond `i32` saturate.
fn round_delta(v: f64) -> i32 {
    v.round() as i32
}

impl Dialect for SessionDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::SessionBased
    }

    fn encode_event(&self, event: &InputEvent) -> Result<Vec<WireMessage>, EncodeError> {
        let messages = match event {
            InputEvent::Move { dx, dy } => {
                let (dx, dy) = finite_deltas(*dx, *dy)?;
                vec![SessionMessage::PointerMove {
                    dx: round_delta(dx),
                    dy: round_delta(dy),
                }
                .into()]
            }
            InputEvent::Scroll { dx, dy } => {
                let (dx, dy) = finite_deltas(*dx, *dy)?;
                vec![SessionMessage::PointerWheel {
                    delta_x: round_delta(dx),
                    delta_y: round_delta(dy),
                }
                .into()]
            }
            InputEvent::Click { button } => vec![
                Self::button(button, ButtonAction::Down),
                Self::button(button, ButtonAction::Up),
            ],
            InputEvent::ButtonToggle { button, action } => vec![Self::button(button, *action)],
        };
        Ok(messages)
    }

    fn encode_combo(&self, combo: &KeyCombo) -> Result<Vec<WireMessage>, EncodeError> {
        let Some(classified) = classify_non_empty(combo)? else {
            return Ok(Vec::new());
        };
        let held = &classified.modifiers;

        // Press modifiers then main keys; release in exact reverse.
        let codes: Vec<KeyCode> = held
            .iter()
            .map(|m| m.key_code())
            .chain(classified.main_keys.iter().map(|k| k.code))
            .collect();

        let downs = codes.iter().map(|&c| Self::key(c, ButtonAction::Down, held));
        let ups = codes.iter().rev().map(|&c| Self::key(c, ButtonAction::Up, held));
        Ok(downs.chain(ups).collect())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
