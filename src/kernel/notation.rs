//! `<...>` key notation for mapping definitions and listings.

use thiserror::Error;

use crate::core::encoding::Encoding;
use crate::core::event::{
    KeyKind, KeyModifiers, MouseAction, MouseButton, MouseKey, MousePosition, SpecialKey,
    MAX_FUNCTION_KEY,
};
use crate::core::keycode::{
    encode_char, encode_char_key, encode_modifier_prefix, encode_mouse, encode_special,
    MOUSE_CODE_MODIFIERS,
};
use crate::kernel::decoder::decode_mapping_side;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotationError {
    #[error("invalid character code in <Char-{0}>")]
    InvalidCharCode(String),
    #[error("invalid leader: {0:?}")]
    InvalidLeader(String),
}

#[derive(Debug, Clone)]
pub struct Notation {
    encoding: Encoding,
    leader: Vec<u8>,
}

impl Notation {
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            leader: vec![b'\\'],
        }
    }

    /// Sets `<Leader>`; the value itself may use notation (`"<Space>"`).
    pub fn with_leader(mut self, leader: &str) -> Result<Self, NotationError> {
        if leader.is_empty() || leader.to_ascii_lowercase().contains("<leader>") {
            return Err(NotationError::InvalidLeader(leader.to_string()));
        }
        let bytes = self.parse(leader)?;
        if bytes.is_empty() {
            return Err(NotationError::InvalidLeader(leader.to_string()));
        }
        self.leader = bytes;
        Ok(self)
    }

    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    pub fn leader(&self) -> &[u8] {
        &self.leader
    }

    /// Parses notation into canonical key bytes. Unknown `<name>` text is
    /// taken literally, `<` included.
    pub fn parse(&self, text: &str) -> Result<Vec<u8>, NotationError> {
        let mut out = Vec::with_capacity(text.len());
        let mut rest = text;
        while let Some(ch) = rest.chars().next() {
            if ch == '<' {
                if let Some(close) = rest[1..].find('>') {
                    let inner = &rest[1..1 + close];
                    if self.parse_bracketed(inner, &mut out)? {
                        rest = &rest[close + 2..];
                        continue;
                    }
                }
            }
            encode_char(ch as u32, &[], &self.encoding, &mut out);
            rest = &rest[ch.len_utf8()..];
        }
        Ok(out)
    }

    fn parse_bracketed(&self, inner: &str, out: &mut Vec<u8>) -> Result<bool, NotationError> {
        if inner.is_empty() {
            return Ok(false);
        }
        let mut modifiers = KeyModifiers::NONE;
        let mut clicks = 1u8;
        let mut name = inner;
        while name.len() > 2 && name.as_bytes()[1] == b'-' {
            match name.as_bytes()[0].to_ascii_uppercase() {
                b'C' => modifiers |= KeyModifiers::CONTROL,
                b'S' => modifiers |= KeyModifiers::SHIFT,
                b'A' | b'M' => modifiers |= KeyModifiers::ALT,
                b'T' => modifiers |= KeyModifiers::META,
                b'D' => modifiers |= KeyModifiers::SUPER,
                d @ b'2'..=b'4' => clicks = d - b'0',
                _ => break,
            }
            name = &name[2..];
        }

        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "nop" => return Ok(true),
            "leader" => {
                out.extend_from_slice(&self.leader);
                return Ok(true);
            }
            _ => {}
        }

        if let Some(digits) = lower.strip_prefix("char-") {
            let code = parse_char_code(digits)
                .ok_or_else(|| NotationError::InvalidCharCode(digits.to_string()))?;
            self.push_char(code, modifiers, out);
            return Ok(true);
        }

        if let Some(action) = mouse_action(&lower) {
            let mouse = MouseKey {
                action,
                clicks,
                position: MousePosition::default(),
            };
            encode_modifier_prefix(modifiers.difference(MOUSE_CODE_MODIFIERS), out);
            encode_mouse(&mouse, modifiers, false, out);
            return Ok(true);
        }
        if clicks != 1 {
            return Ok(false);
        }

        if let Some(code) = named_char(&lower) {
            if code == 0x09 && modifiers.contains(KeyModifiers::SHIFT) {
                let modifiers = modifiers.difference(KeyModifiers::SHIFT);
                encode_modifier_prefix(modifiers, out);
                encode_special(SpecialKey::BackTab, out);
            } else {
                self.push_char(code, modifiers, out);
            }
            return Ok(true);
        }

        if let Some(special) = special_key(&lower) {
            encode_modifier_prefix(modifiers, out);
            encode_special(special, out);
            return Ok(true);
        }

        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) if !modifiers.is_empty() => {
                self.push_char(ch as u32, modifiers, out);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn push_char(&self, code: u32, modifiers: KeyModifiers, out: &mut Vec<u8>) {
        encode_char_key(code, modifiers, &self.encoding, out);
    }
}

fn parse_char_code(digits: &str) -> Option<u32> {
    let code = if let Some(hex) = digits.strip_prefix("0x") {
        u32::from_str_radix(hex, 16).ok()?
    } else if digits.len() > 1 && digits.starts_with('0') {
        u32::from_str_radix(&digits[1..], 8).ok()?
    } else {
        digits.parse().ok()?
    };
    (code <= 0x7FFF_FFFF).then_some(code)
}

const NAMED_CHARS: &[(&str, u32)] = &[
    ("nul", 0x00),
    ("tab", 0x09),
    ("nl", 0x0A),
    ("newline", 0x0A),
    ("linefeed", 0x0A),
    ("lf", 0x0A),
    ("cr", 0x0D),
    ("return", 0x0D),
    ("enter", 0x0D),
    ("esc", 0x1B),
    ("space", 0x20),
    ("lt", 0x3C),
    ("bslash", 0x5C),
    ("bar", 0x7C),
];

fn named_char(name: &str) -> Option<u32> {
    NAMED_CHARS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, code)| *code)
}

fn special_key(name: &str) -> Option<SpecialKey> {
    let key = match name {
        "up" => SpecialKey::Up,
        "down" => SpecialKey::Down,
        "left" => SpecialKey::Left,
        "right" => SpecialKey::Right,
        "home" => SpecialKey::Home,
        "end" => SpecialKey::End,
        "pageup" => SpecialKey::PageUp,
        "pagedown" => SpecialKey::PageDown,
        "insert" | "ins" => SpecialKey::Insert,
        "del" | "delete" => SpecialKey::Delete,
        "bs" | "backspace" => SpecialKey::Backspace,
        _ => {
            let n: u8 = name.strip_prefix('f')?.parse().ok()?;
            if !(1..=MAX_FUNCTION_KEY).contains(&n) {
                return None;
            }
            SpecialKey::F(n)
        }
    };
    Some(key)
}

const MOUSE_NAMES: &[(&str, MouseAction)] = &[
    ("leftmouse", MouseAction::Down(MouseButton::Left)),
    ("middlemouse", MouseAction::Down(MouseButton::Middle)),
    ("rightmouse", MouseAction::Down(MouseButton::Right)),
    ("leftdrag", MouseAction::Drag(MouseButton::Left)),
    ("middledrag", MouseAction::Drag(MouseButton::Middle)),
    ("rightdrag", MouseAction::Drag(MouseButton::Right)),
    ("leftrelease", MouseAction::Up),
    ("middlerelease", MouseAction::Up),
    ("rightrelease", MouseAction::Up),
    ("scrollwheelup", MouseAction::ScrollUp),
    ("scrollwheeldown", MouseAction::ScrollDown),
    ("scrollwheelleft", MouseAction::ScrollLeft),
    ("scrollwheelright", MouseAction::ScrollRight),
    ("x1mouse", MouseAction::Extra(1)),
    ("x2mouse", MouseAction::Extra(2)),
    ("mousemove", MouseAction::Moved),
];

fn mouse_action(name: &str) -> Option<MouseAction> {
    MOUSE_NAMES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, action)| *action)
}

fn mouse_name(action: MouseAction) -> &'static str {
    match action {
        MouseAction::Down(MouseButton::Left) => "LeftMouse",
        MouseAction::Down(MouseButton::Middle) => "MiddleMouse",
        MouseAction::Down(MouseButton::Right) => "RightMouse",
        MouseAction::Drag(MouseButton::Left) => "LeftDrag",
        MouseAction::Drag(MouseButton::Middle) => "MiddleDrag",
        MouseAction::Drag(MouseButton::Right) => "RightDrag",
        // the release report does not say which button went up
        MouseAction::Up => "LeftRelease",
        MouseAction::ScrollUp => "ScrollWheelUp",
        MouseAction::ScrollDown => "ScrollWheelDown",
        MouseAction::ScrollLeft => "ScrollWheelLeft",
        MouseAction::ScrollRight => "ScrollWheelRight",
        MouseAction::Extra(2) => "X2Mouse",
        MouseAction::Extra(_) => "X1Mouse",
        MouseAction::Moved => "MouseMove",
    }
}

fn special_name(key: SpecialKey) -> String {
    match key {
        SpecialKey::Up => "Up".into(),
        SpecialKey::Down => "Down".into(),
        SpecialKey::Left => "Left".into(),
        SpecialKey::Right => "Right".into(),
        SpecialKey::Home => "Home".into(),
        SpecialKey::End => "End".into(),
        SpecialKey::PageUp => "PageUp".into(),
        SpecialKey::PageDown => "PageDown".into(),
        SpecialKey::Insert => "Insert".into(),
        SpecialKey::Delete => "Del".into(),
        SpecialKey::Backspace => "BS".into(),
        SpecialKey::BackTab => "S-Tab".into(),
        SpecialKey::F(n) => format!("F{n}"),
    }
}

fn char_name(code: u32) -> Option<String> {
    let name = match code {
        0x00 => "Nul",
        0x09 => "Tab",
        0x0A => "NL",
        0x0D => "CR",
        0x1B => "Esc",
        0x20 => "Space",
        0x3C => "lt",
        0x5C => "Bslash",
        0x7C => "Bar",
        0x7F => "C-?",
        0x01..=0x1A => return Some(format!("C-{}", (b'a' + code as u8 - 1) as char)),
        0x1C..=0x1F => return Some(format!("C-{}", (b'@' + code as u8) as char)),
        _ => return None,
    };
    Some(name.to_string())
}

fn modifier_prefix(modifiers: KeyModifiers) -> String {
    let mut out = String::new();
    for (flag, letter) in [
        (KeyModifiers::CONTROL, "C-"),
        (KeyModifiers::SHIFT, "S-"),
        (KeyModifiers::ALT, "A-"),
        (KeyModifiers::META, "T-"),
        (KeyModifiers::SUPER, "D-"),
    ] {
        if modifiers.contains(flag) {
            out.push_str(letter);
        }
    }
    out
}

fn render_key(kind: &KeyKind, modifiers: KeyModifiers) -> String {
    let prefix = modifier_prefix(modifiers);
    match kind {
        KeyKind::Char(c) => match char_name(c.code) {
            Some(name) => format!("<{prefix}{name}>"),
            None if prefix.is_empty() => c.to_text(),
            None => format!("<{prefix}{}>", c.to_text()),
        },
        KeyKind::Special(key) => format!("<{prefix}{}>", special_name(*key)),
        KeyKind::Mouse(mouse) => {
            let clicks = if mouse.clicks > 1 {
                format!("{}-", mouse.clicks)
            } else {
                String::new()
            };
            format!("<{prefix}{clicks}{}>", mouse_name(mouse.action))
        }
    }
}

/// Renders canonical key bytes (as stored in a mapping) back to notation.
pub fn render(bytes: &[u8], encoding: &Encoding) -> String {
    decode_mapping_side(bytes, encoding)
        .iter()
        .map(|event| render_key(event.kind(), event.modifiers()))
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/notation.rs"]
mod tests;
