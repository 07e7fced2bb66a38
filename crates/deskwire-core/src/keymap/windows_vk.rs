//! Key name → Windows Virtual-Key (VK) code table.
//!
//! Reference: Windows Virtual-Key Codes (winuser.h).
//!
//! Letters and digits are not listed: their VK codes equal the ASCII code of
//! the upper-case character (`VK_A = 0x41`, `VK_0 = 0x30`), so they are
//! computed.  Everything else comes from [`NAMED_KEYS`].

use super::KeyCode;

pub const VK_SHIFT: KeyCode = KeyCode(0x10);
pub const VK_CONTROL: KeyCode = KeyCode(0x11);
/// Alt.
pub const VK_MENU: KeyCode = KeyCode(0x12);
pub const VK_LWIN: KeyCode = KeyCode(0x5B);

/// Named keys and their aliases.  Names are upper case.
const NAMED_KEYS: &[(&str, u8)] = &[
    // ── Editing / whitespace ──────────────────────────────────────────────────
    ("TAB", 0x09),
    ("ENTER", 0x0D),
    ("ESC", 0x1B),
    ("ESCAPE", 0x1B),
    ("SPACE", 0x20),
    ("BACKSPACE", 0x08),
    ("DEL", 0x2E),
    ("DELETE", 0x2E),
    ("INSERT", 0x2D),
    // ── Navigation ────────────────────────────────────────────────────────────
    ("HOME", 0x24),
    ("END", 0x23),
    ("PAGEUP", 0x21),
    ("PAGEDOWN", 0x22),
    ("UP", 0x26),
    ("DOWN", 0x28),
    ("LEFT", 0x25),
    ("RIGHT", 0x27),
    // ── Function keys (VK_F1=0x70 … VK_F12=0x7B) ─────────────────────────────
    ("F1", 0x70),
    ("F2", 0x71),
    ("F3", 0x72),
    ("F4", 0x73),
    ("F5", 0x74),
    ("F6", 0x75),
    ("F7", 0x76),
    ("F8", 0x77),
    ("F9", 0x78),
    ("F10", 0x79),
    ("F11", 0x7A),
    ("F12", 0x7B),
    // ── Modifiers ─────────────────────────────────────────────────────────────
    ("CTRL", 0x11),
    ("CONTROL", 0x11),
    ("ALT", 0x12),
    ("SHIFT", 0x10),
    ("WIN", 0x5B),
    ("WINDOWS", 0x5B),
];

/// Translates a key name to its VK code.
///
/// Matching is case-insensitive and ignores surrounding whitespace.
/// Returns `None` for names with no entry.
pub fn name_to_vk(name: &str) -> Option<KeyCode> {
    let upper = name.trim().to_ascii_uppercase();

    // Single letters and digits map to their own ASCII code.
    if let [c] = upper.as_bytes() {
        if c.is_ascii_uppercase() || c.is_ascii_digit() {
            return Some(KeyCode(*c));
        }
    }

    NAMED_KEYS
        .iter()
        .find(|(n, _)| *n == upper)
        .map(|&(_, vk)| KeyCode(vk))
}
