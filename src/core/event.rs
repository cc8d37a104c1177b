//! Logical key events produced by the key decoder.
//!
//! A `KeyEvent` keeps the exact bytes it was decoded from, so the consumed
//! spans of a decoded stream always concatenate back to the input.

use bitflags::bitflags;

use super::keycode;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KeyModifiers: u8 {
        const SHIFT = 0x02;
        const CONTROL = 0x04;
        const ALT = 0x08;
        const META = 0x10;
        const SUPER = 0x80;
    }
}

impl KeyModifiers {
    pub const NONE: Self = Self::empty();
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CharKey {
    pub code: u32,
    /// Combining characters fused onto `code`, at most [`keycode::MAX_MCO`].
    pub composing: Vec<u32>,
}

impl CharKey {
    pub fn new(code: u32) -> Self {
        Self {
            code,
            composing: Vec::new(),
        }
    }

    pub fn as_char(&self) -> Option<char> {
        char::from_u32(self.code)
    }

    /// Printable text (Tab included); control characters are commands.
    pub fn is_text(&self) -> bool {
        self.code == 0x09 || (self.code >= 0x20 && self.code != 0x7F)
    }

    pub fn to_text(&self) -> String {
        std::iter::once(self.code)
            .chain(self.composing.iter().copied())
            .filter_map(char::from_u32)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialKey {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    Backspace,
    BackTab,
    /// F1..=F20.
    F(u8),
}

pub const MAX_FUNCTION_KEY: u8 = 20;

impl SpecialKey {
    /// Two-byte termcap name used after `K_SPECIAL`.
    pub fn termcap(self) -> Option<[u8; 2]> {
        let code = match self {
            SpecialKey::Up => *b"ku",
            SpecialKey::Down => *b"kd",
            SpecialKey::Left => *b"kl",
            SpecialKey::Right => *b"kr",
            SpecialKey::Home => *b"kh",
            SpecialKey::End => *b"@7",
            SpecialKey::PageUp => *b"kP",
            SpecialKey::PageDown => *b"kN",
            SpecialKey::Insert => *b"kI",
            SpecialKey::Delete => *b"kD",
            SpecialKey::Backspace => *b"kb",
            SpecialKey::BackTab => *b"kB",
            SpecialKey::F(n @ 1..=9) => [b'k', b'0' + n],
            SpecialKey::F(10) => *b"k;",
            SpecialKey::F(n @ 11..=19) => [b'F', b'0' + (n - 10)],
            SpecialKey::F(20) => *b"FA",
            SpecialKey::F(_) => return None,
        };
        Some(code)
    }

    pub fn from_termcap(code: [u8; 2]) -> Option<Self> {
        let key = match &code {
            b"ku" => SpecialKey::Up,
            b"kd" => SpecialKey::Down,
            b"kl" => SpecialKey::Left,
            b"kr" => SpecialKey::Right,
            b"kh" => SpecialKey::Home,
            b"@7" => SpecialKey::End,
            b"kP" => SpecialKey::PageUp,
            b"kN" => SpecialKey::PageDown,
            b"kI" => SpecialKey::Insert,
            b"kD" => SpecialKey::Delete,
            b"kb" => SpecialKey::Backspace,
            b"kB" => SpecialKey::BackTab,
            b"k;" => SpecialKey::F(10),
            b"FA" => SpecialKey::F(20),
            [b'k', d @ b'1'..=b'9'] => SpecialKey::F(d - b'0'),
            [b'F', d @ b'1'..=b'9'] => SpecialKey::F(d - b'0' + 10),
            _ => return None,
        };
        Some(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseAction {
    Down(MouseButton),
    Up,
    Drag(MouseButton),
    Moved,
    ScrollUp,
    ScrollDown,
    ScrollLeft,
    ScrollRight,
    /// Extended buttons: 1 = X1, 2 = X2.
    Extra(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MousePosition {
    pub x: u16,
    pub y: u16,
}

impl MousePosition {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseKey {
    pub action: MouseAction,
    pub clicks: u8,
    pub position: MousePosition,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyKind {
    Char(CharKey),
    Special(SpecialKey),
    Mouse(MouseKey),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    kind: KeyKind,
    modifiers: KeyModifiers,
    raw: Vec<u8>,
}

impl KeyEvent {
    pub(crate) fn from_parts(kind: KeyKind, modifiers: KeyModifiers, raw: Vec<u8>) -> Self {
        Self {
            kind,
            modifiers,
            raw,
        }
    }

    /// A single byte taken literally; the decoder's fallback for malformed input.
    pub fn literal_byte(byte: u8) -> Self {
        Self::from_parts(
            KeyKind::Char(CharKey::new(byte as u32)),
            KeyModifiers::NONE,
            vec![byte],
        )
    }

    pub fn kind(&self) -> &KeyKind {
        &self.kind
    }

    pub fn modifiers(&self) -> KeyModifiers {
        self.modifiers
    }

    /// Bytes consumed from the input stream for this event.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn byte_len(&self) -> usize {
        self.raw.len()
    }

    /// Bytes compared against mapping left-hand sides. Mouse reports drop
    /// their position so `<LeftMouse>` matches a click anywhere.
    pub fn map_bytes(&self) -> &[u8] {
        match self.kind {
            KeyKind::Mouse(_) => {
                let end = self.raw.len().saturating_sub(keycode::MOUSE_POSITION_LEN);
                &self.raw[..end]
            }
            _ => &self.raw,
        }
    }

    pub fn as_char(&self) -> Option<&CharKey> {
        match &self.kind {
            KeyKind::Char(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_mouse(&self) -> bool {
        matches!(self.kind, KeyKind::Mouse(_))
    }

    pub fn is_special(&self) -> bool {
        matches!(self.kind, KeyKind::Special(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/core/event.rs"]
mod tests;
