//! Key-name translation for keyboard chords.
//!
//! Callers name keys with short strings (`"CTRL"`, `"A"`, `"F5"`,
//! `"PAGEDOWN"`).  The session-based dialect needs Windows Virtual-Key
//! codes on the wire; the legacy dialect needs canonical names.  Both
//! directions are served from the table in [`windows_vk`].

pub mod windows_vk;

use std::fmt;

/// A Windows Virtual-Key code as sent in `{"type":"key","key_code":...}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(pub u8);

impl KeyCode {
    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

/// A key whose held state is flagged on co-occurring key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Ctrl,
    Alt,
    Shift,
    Win,
}

impl Modifier {
    /// All modifiers in flag order (`ctrl`, `alt`, `shift`, `win`).
    pub const ALL: [Modifier; 4] = [Modifier::Ctrl, Modifier::Alt, Modifier::Shift, Modifier::Win];

    /// Recognises modifier names and their aliases, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "CTRL" | "CONTROL" => Some(Modifier::Ctrl),
            "ALT" => Some(Modifier::Alt),
            "SHIFT" => Some(Modifier::Shift),
            "WIN" | "WINDOWS" => Some(Modifier::Win),
            _ => None,
        }
    }

    pub fn key_code(self) -> KeyCode {
        match self {
            Modifier::Ctrl => windows_vk::VK_CONTROL,
            Modifier::Alt => windows_vk::VK_MENU,
            Modifier::Shift => windows_vk::VK_SHIFT,
            Modifier::Win => windows_vk::VK_LWIN,
        }
    }

    /// Name used in legacy `keyboard` messages.
    pub fn canonical_name(self) -> &'static str {
        match self {
            Modifier::Ctrl => "CTRL",
            Modifier::Alt => "ALT",
            Modifier::Shift => "SHIFT",
            Modifier::Win => "WIN",
        }
    }
}

/// Resolves any key name (modifier or main key) to its virtual-key code.
///
/// Returns `None` for names outside the table.
pub fn lookup(name: &str) -> Option<KeyCode> {
    Modifier::from_name(name)
        .map(Modifier::key_code)
        .or_else(|| windows_vk::name_to_vk(name))
}
