//! Integration tests for the input dialects.
//!
//! These tests drive the public API the way the client crate does: pick a
//! dialect from a URL, encode intents, render every message to JSON and
//! inspect the documents the agent would receive.

use deskwire_core::{dialect_for_url, Dialect, DialectKind, EncodeError, InputEvent, KeyCombo, PointerCommand};
use serde_json::{json, Value};

const LEGACY_URL: &str = "ws://127.0.0.1:44325/api/v1/rd/session";
const SESSION_URL: &str = "ws://127.0.0.1:44325/ws/desktop?sess=abc&token=xyz";

/// Encodes with `dialect` and renders every message as a JSON value.
fn event_json(dialect: &dyn Dialect, event: InputEvent) -> Vec<Value> {
    dialect
        .encode_event(&event)
        .expect("encode must succeed")
        .iter()
        .map(|m| serde_json::from_str(&m.to_json().expect("serialize must succeed")).unwrap())
        .collect()
}

fn combo_json(dialect: &dyn Dialect, keys: &[&str]) -> Vec<Value> {
    dialect
        .encode_combo(&KeyCombo::new(keys.iter().copied()))
        .expect("encode must succeed")
        .iter()
        .map(|m| serde_json::from_str(&m.to_json().unwrap()).unwrap())
        .collect()
}

#[test]
fn test_url_selects_dialect() {
    assert_eq!(dialect_for_url(LEGACY_URL).kind(), DialectKind::Legacy);
    assert_eq!(dialect_for_url(SESSION_URL).kind(), DialectKind::SessionBased);
}

#[test]
fn test_session_ctrl_shift_a_emits_six_ordered_transitions() {
    // Arrange
    let dialect = dialect_for_url(SESSION_URL);

    // Act
    let out = combo_json(dialect.as_ref(), &["CTRL", "SHIFT", "A"]);

    // Assert: downs in order, ups in reverse, flags exclude the key itself
    assert_eq!(
        out,
        vec![
            json!({"type":"key","key_code":0x11,"action":"down","shift":true}),
            json!({"type":"key","key_code":0x10,"action":"down","ctrl":true}),
            json!({"type":"key","key_code":0x41,"action":"down","ctrl":true,"shift":true}),
            json!({"type":"key","key_code":0x41,"action":"up","ctrl":true,"shift":true}),
            json!({"type":"key","key_code":0x10,"action":"up","ctrl":true}),
            json!({"type":"key","key_code":0x11,"action":"up","shift":true}),
        ]
    );
}

#[test]
fn test_legacy_ctrl_shift_a_is_one_keyboard_message() {
    let out = combo_json(dialect_for_url(LEGACY_URL).as_ref(), &["shift", "a", "ctrl"]);
    assert_eq!(out, vec![json!({"type":"keyboard","keys":["SHIFT","CTRL","A"]})]);
}

#[test]
fn test_session_click_expands_to_down_then_up() {
    let out = event_json(
        dialect_for_url(SESSION_URL).as_ref(),
        InputEvent::Click {
            button: "left".into(),
        },
    );
    assert_eq!(
        out,
        vec![
            json!({"type":"pointer_button","button":"left","action":"down"}),
            json!({"type":"pointer_button","button":"left","action":"up"}),
        ]
    );
}

#[test]
fn test_legacy_click_is_single_message() {
    let out = event_json(
        dialect_for_url(LEGACY_URL).as_ref(),
        InputEvent::Click {
            button: "left".into(),
        },
    );
    assert_eq!(out, vec![json!({"type":"pointer","event":"click","button":"left"})]);
}

#[test]
fn test_move_is_rounded_only_by_session_dialect() {
    let event = InputEvent::Move { dx: 10.6, dy: -3.2 };

    let session = event_json(dialect_for_url(SESSION_URL).as_ref(), event.clone());
    let legacy = event_json(dialect_for_url(LEGACY_URL).as_ref(), event);

    assert_eq!(session, vec![json!({"type":"pointer_move","dx":11,"dy":-3})]);
    assert_eq!(
        legacy,
        vec![json!({"type":"pointer","event":"move","dx":10.6,"dy":-3.2})]
    );
}

#[test]
fn test_scroll_shapes_differ_per_dialect() {
    let event = InputEvent::Scroll { dx: 0.0, dy: -3.0 };

    let session = event_json(dialect_for_url(SESSION_URL).as_ref(), event.clone());
    let legacy = event_json(dialect_for_url(LEGACY_URL).as_ref(), event);

    assert_eq!(session, vec![json!({"type":"pointer_wheel","delta_x":0,"delta_y":-3})]);
    assert_eq!(
        legacy,
        vec![json!({"type":"pointer","event":"scroll","dx":0.0,"dy":-3.0})]
    );
}

#[test]
fn test_pointer_command_json_flows_into_session_dialect() {
    // Arrange: a loosely-typed request as a CLI or service call would send it
    let cmd: PointerCommand =
        serde_json::from_str(r#"{"kind":"button","button":"Right","action":"up"}"#).unwrap();

    // Act
    let event = InputEvent::try_from(cmd).unwrap();
    let out = event_json(dialect_for_url(SESSION_URL).as_ref(), event);

    // Assert
    assert_eq!(
        out,
        vec![json!({"type":"pointer_button","button":"right","action":"up"})]
    );
}

#[test]
fn test_empty_combo_is_rejected_by_both_dialects() {
    let empty = KeyCombo::new(Vec::<String>::new());
    for url in [LEGACY_URL, SESSION_URL] {
        assert_eq!(
            dialect_for_url(url).encode_combo(&empty),
            Err(EncodeError::EmptyKeyCombo),
            "{url}"
        );
    }
}

#[test]
fn test_every_session_message_is_single_line_json() {
    let dialect = dialect_for_url(SESSION_URL);
    let msgs = dialect
        .encode_combo(&KeyCombo::new(["WIN", "R"]))
        .unwrap();
    for m in msgs {
        let text = m.to_json().unwrap();
        assert!(!text.contains('\n'));
        assert!(text.starts_with('{'));
    }
}
