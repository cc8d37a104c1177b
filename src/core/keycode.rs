//! Canonical byte form of keys.
//!
//! Plain characters are stored in the active encoding. Everything else starts
//! with `K_SPECIAL` followed by two bytes:
//!
//! - `K_SPECIAL KS_MODIFIER <mods>`: modifier prefix for the next key
//! - `K_SPECIAL KS_SPECIAL KE_FILLER`: a literal 0x80 byte
//! - `K_SPECIAL KS_MOUSE <code> <row:2> <col:2>`: mouse report
//! - `K_SPECIAL <termcap:2>`: special key
//!
//! Mouse code byte: bits 0-1 button, bits 2-4 modifiers, bits 5-7 select the
//! range (0-3 press with click count n+1, 4 drag, 5 wheel, 6 extended button,
//! 7 move).

use super::encoding::{Encoding, Family};
use super::event::{KeyKind, KeyModifiers, MouseAction, MouseButton, MouseKey, SpecialKey};

pub const K_SPECIAL: u8 = 0x80;
pub const KS_MODIFIER: u8 = 0xFC;
pub const KS_MOUSE: u8 = 0xFB;
pub const KS_SPECIAL: u8 = 0xFE;
pub const KE_FILLER: u8 = b'X';

pub const MOUSE_LEFT: u8 = 0x00;
pub const MOUSE_MIDDLE: u8 = 0x01;
pub const MOUSE_RIGHT: u8 = 0x02;
pub const MOUSE_RELEASE: u8 = 0x03;

pub const MOUSE_SHIFT: u8 = 0x04;
pub const MOUSE_ALT: u8 = 0x08;
pub const MOUSE_CTRL: u8 = 0x10;

const MOUSE_BUTTON_MASK: u8 = 0x03;
const MOUSE_RANGE_SHIFT: u8 = 5;
const RANGE_DRAG: u8 = 4;
const RANGE_WHEEL: u8 = 5;
const RANGE_EXTENDED: u8 = 6;
const RANGE_MOVE: u8 = 7;

pub const MAX_CLICKS: u8 = 4;
/// Header, code byte and two 16-bit coordinates.
pub const MOUSE_REPORT_LEN: usize = 7;
pub const MOUSE_POSITION_LEN: usize = 4;

/// Maximum number of combining characters fused onto one character.
pub const MAX_MCO: usize = 6;

const BAD_REPLACE: u8 = b'?';

pub fn mouse_code(action: MouseAction, clicks: u8, modifiers: KeyModifiers) -> u8 {
    let clicks = clicks.clamp(1, MAX_CLICKS) - 1;
    let base = match action {
        MouseAction::Down(button) => (clicks << MOUSE_RANGE_SHIFT) | button_bits(button),
        MouseAction::Up => (clicks << MOUSE_RANGE_SHIFT) | MOUSE_RELEASE,
        MouseAction::Drag(button) => (RANGE_DRAG << MOUSE_RANGE_SHIFT) | button_bits(button),
        MouseAction::ScrollUp => RANGE_WHEEL << MOUSE_RANGE_SHIFT,
        MouseAction::ScrollDown => (RANGE_WHEEL << MOUSE_RANGE_SHIFT) | 1,
        MouseAction::ScrollLeft => (RANGE_WHEEL << MOUSE_RANGE_SHIFT) | 2,
        MouseAction::ScrollRight => (RANGE_WHEEL << MOUSE_RANGE_SHIFT) | 3,
        MouseAction::Extra(n) => {
            (RANGE_EXTENDED << MOUSE_RANGE_SHIFT) | (n.saturating_sub(1) & MOUSE_BUTTON_MASK)
        }
        MouseAction::Moved => RANGE_MOVE << MOUSE_RANGE_SHIFT,
    };
    let mut mods = 0;
    if modifiers.contains(KeyModifiers::SHIFT) {
        mods |= MOUSE_SHIFT;
    }
    if modifiers.contains(KeyModifiers::ALT) {
        mods |= MOUSE_ALT;
    }
    if modifiers.contains(KeyModifiers::CONTROL) {
        mods |= MOUSE_CTRL;
    }
    base | mods
}

/// Unpacks a mouse code byte into (action, click count, modifiers).
pub fn parse_mouse_code(code: u8) -> (MouseAction, u8, KeyModifiers) {
    let button = code & MOUSE_BUTTON_MASK;
    let range = code >> MOUSE_RANGE_SHIFT;

    let mut modifiers = KeyModifiers::NONE;
    if code & MOUSE_SHIFT != 0 {
        modifiers |= KeyModifiers::SHIFT;
    }
    if code & MOUSE_ALT != 0 {
        modifiers |= KeyModifiers::ALT;
    }
    if code & MOUSE_CTRL != 0 {
        modifiers |= KeyModifiers::CONTROL;
    }

    let (action, clicks) = match range {
        0..=3 => {
            let clicks = range + 1;
            match bits_button(button) {
                Some(b) => (MouseAction::Down(b), clicks),
                None => (MouseAction::Up, clicks),
            }
        }
        RANGE_DRAG => match bits_button(button) {
            Some(b) => (MouseAction::Drag(b), 1),
            None => (MouseAction::Moved, 1),
        },
        RANGE_WHEEL => {
            let action = match button {
                0 => MouseAction::ScrollUp,
                1 => MouseAction::ScrollDown,
                2 => MouseAction::ScrollLeft,
                _ => MouseAction::ScrollRight,
            };
            (action, 1)
        }
        RANGE_EXTENDED => (MouseAction::Extra(button + 1), 1),
        _ => (MouseAction::Moved, 1),
    };
    (action, clicks, modifiers)
}

fn button_bits(button: MouseButton) -> u8 {
    match button {
        MouseButton::Left => MOUSE_LEFT,
        MouseButton::Middle => MOUSE_MIDDLE,
        MouseButton::Right => MOUSE_RIGHT,
    }
}

fn bits_button(bits: u8) -> Option<MouseButton> {
    match bits {
        MOUSE_LEFT => Some(MouseButton::Left),
        MOUSE_MIDDLE => Some(MouseButton::Middle),
        MOUSE_RIGHT => Some(MouseButton::Right),
        _ => None,
    }
}

/// Modifiers carried inside the mouse code byte rather than a prefix.
pub const MOUSE_CODE_MODIFIERS: KeyModifiers = KeyModifiers::SHIFT
    .union(KeyModifiers::ALT)
    .union(KeyModifiers::CONTROL);

pub fn encode_modifier_prefix(modifiers: KeyModifiers, out: &mut Vec<u8>) {
    if !modifiers.is_empty() {
        out.extend_from_slice(&[K_SPECIAL, KS_MODIFIER, modifiers.bits()]);
    }
}

pub fn encode_special(key: SpecialKey, out: &mut Vec<u8>) -> bool {
    match key.termcap() {
        Some([a, b]) => {
            out.extend_from_slice(&[K_SPECIAL, a, b]);
            true
        }
        None => false,
    }
}

pub fn encode_mouse(mouse: &MouseKey, modifiers: KeyModifiers, with_position: bool, out: &mut Vec<u8>) {
    out.extend_from_slice(&[
        K_SPECIAL,
        KS_MOUSE,
        mouse_code(mouse.action, mouse.clicks, modifiers),
    ]);
    if with_position {
        out.extend_from_slice(&mouse.position.y.to_be_bytes());
        out.extend_from_slice(&mouse.position.x.to_be_bytes());
    }
}

/// Encodes a character (plus composing characters) in `encoding`.
/// Characters the encoding cannot hold become `?`.
pub fn encode_char(code: u32, composing: &[u32], encoding: &Encoding, out: &mut Vec<u8>) {
    match encoding.family() {
        Family::Unicode => {
            utf8_encode(code, out);
            for &c in composing {
                utf8_encode(c, out);
            }
        }
        Family::DoubleByte => match code {
            0..=0xFF => push_byte(code as u8, out),
            0x100..=0xFFFF => out.extend_from_slice(&[(code >> 8) as u8, code as u8]),
            0x1_0000..=0xFF_FFFF => {
                out.extend_from_slice(&[(code >> 16) as u8, (code >> 8) as u8, code as u8])
            }
            _ => out.push(BAD_REPLACE),
        },
        Family::EightBit => match u8::try_from(code) {
            Ok(b) => push_byte(b, out),
            Err(_) => out.push(BAD_REPLACE),
        },
    }
}

fn push_byte(b: u8, out: &mut Vec<u8>) {
    if b == K_SPECIAL {
        out.extend_from_slice(&[K_SPECIAL, KS_SPECIAL, KE_FILLER]);
    } else {
        out.push(b);
    }
}

/// UTF-8 including the historical 5- and 6-byte forms (31-bit code points).
pub fn utf8_encode(code: u32, out: &mut Vec<u8>) {
    match code {
        0..=0x7F => out.push(code as u8),
        0x80..=0x7FF => out.extend_from_slice(&[0xC0 | (code >> 6) as u8, cont(code, 0)]),
        0x800..=0xFFFF => out.extend_from_slice(&[
            0xE0 | (code >> 12) as u8,
            cont(code, 6),
            cont(code, 0),
        ]),
        0x1_0000..=0x1F_FFFF => out.extend_from_slice(&[
            0xF0 | (code >> 18) as u8,
            cont(code, 12),
            cont(code, 6),
            cont(code, 0),
        ]),
        0x20_0000..=0x3FF_FFFF => out.extend_from_slice(&[
            0xF8 | (code >> 24) as u8,
            cont(code, 18),
            cont(code, 12),
            cont(code, 6),
            cont(code, 0),
        ]),
        _ => out.extend_from_slice(&[
            0xFC | ((code >> 30) & 0x01) as u8,
            cont(code, 24),
            cont(code, 18),
            cont(code, 12),
            cont(code, 6),
            cont(code, 0),
        ]),
    }
}

#[inline]
fn cont(code: u32, shift: u32) -> u8 {
    0x80 | ((code >> shift) & 0x3F) as u8
}

/// Encodes a character typed with `modifiers`, folding Shift into letter case
/// and Ctrl into control bytes where such a byte exists (`<C-a>` is 0x01).
pub fn encode_char_key(code: u32, mut modifiers: KeyModifiers, encoding: &Encoding, out: &mut Vec<u8>) {
    let mut code = code;
    if modifiers.contains(KeyModifiers::SHIFT) {
        if let Some(upper) = char::from_u32(code)
            .filter(char::is_ascii_alphabetic)
            .map(|c| c.to_ascii_uppercase())
        {
            code = upper as u32;
            modifiers.remove(KeyModifiers::SHIFT);
        }
    }
    if modifiers.contains(KeyModifiers::CONTROL) {
        if let Some(ctrl) = control_byte(code) {
            code = ctrl as u32;
            // <C-S-a> is the same byte as <C-a>
            modifiers.remove(KeyModifiers::CONTROL | KeyModifiers::SHIFT);
        }
    }
    encode_modifier_prefix(modifiers, out);
    encode_char(code, &[], encoding, out);
}

fn control_byte(code: u32) -> Option<u8> {
    let c = u8::try_from(code).ok()?;
    match c {
        b'?' => Some(0x7F),
        b'@'..=b'_' => Some(c & 0x1F),
        b'a'..=b'z' => Some(c.to_ascii_uppercase() & 0x1F),
        _ => None,
    }
}

/// Canonical bytes for a key; the decoder turns these back into the same key.
pub fn encode_key(kind: &KeyKind, modifiers: KeyModifiers, encoding: &Encoding) -> Vec<u8> {
    let mut out = Vec::with_capacity(8);
    match kind {
        KeyKind::Char(c) => {
            encode_modifier_prefix(modifiers, &mut out);
            encode_char(c.code, &c.composing, encoding, &mut out);
        }
        KeyKind::Special(key) => {
            encode_modifier_prefix(modifiers, &mut out);
            encode_special(*key, &mut out);
        }
        KeyKind::Mouse(mouse) => {
            encode_modifier_prefix(modifiers.difference(MOUSE_CODE_MODIFIERS), &mut out);
            encode_mouse(mouse, modifiers, true, &mut out);
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/core/keycode.rs"]
mod tests;
