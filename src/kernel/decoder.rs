//! Key decoder: canonical input bytes → key events.
//!
//! Decoding never fails. Malformed input degrades to single-byte characters;
//! a truncated trailing key yields `Decoded::Incomplete` and ends the sequence.

use std::time::Instant;

use unicode_width::UnicodeWidthChar;

use crate::core::encoding::{Encoding, Family};
use crate::core::event::{
    CharKey, KeyEvent, KeyKind, KeyModifiers, MouseKey, MousePosition, SpecialKey,
};
use crate::core::keycode::{
    parse_mouse_code, KE_FILLER, KS_MODIFIER, KS_MOUSE, KS_SPECIAL, K_SPECIAL, MAX_MCO,
    MOUSE_POSITION_LEN, MOUSE_REPORT_LEN,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Key(KeyEvent),
    /// The bytes from `offset` on are the start of a key that is not complete yet.
    Incomplete { offset: usize },
}

pub struct KeyDecoder<'a> {
    bytes: &'a [u8],
    pos: usize,
    encoding: &'a Encoding,
    done: bool,
}

pub fn decode<'a>(bytes: &'a [u8], encoding: &'a Encoding) -> KeyDecoder<'a> {
    KeyDecoder {
        bytes,
        pos: 0,
        encoding,
        done: false,
    }
}

impl KeyDecoder<'_> {
    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl Iterator for KeyDecoder<'_> {
    type Item = Decoded;

    fn next(&mut self) -> Option<Decoded> {
        if self.done || self.pos >= self.bytes.len() {
            return None;
        }
        match decode_one(&self.bytes[self.pos..], self.encoding) {
            Step::Key(event) => {
                self.pos += event.byte_len();
                Some(Decoded::Key(event))
            }
            Step::Incomplete => {
                self.done = true;
                Some(Decoded::Incomplete { offset: self.pos })
            }
        }
    }
}

/// Decodes a stored mapping side. Mouse keys there carry no position, and an
/// incomplete tail is taken as literal bytes.
pub fn decode_mapping_side(bytes: &[u8], encoding: &Encoding) -> Vec<KeyEvent> {
    let mut events = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let rest = &bytes[pos..];
        let mut i = 0;
        while rest.len() >= i + 3 && rest[i] == K_SPECIAL && rest[i + 1] == KS_MODIFIER {
            i += 3;
        }
        if rest.len() >= i + 3 && rest[i] == K_SPECIAL && rest[i + 1] == KS_MOUSE {
            let mut report = rest[..i + 3].to_vec();
            report.extend_from_slice(&[0; MOUSE_POSITION_LEN]);
            if let Step::Key(event) = decode_one(&report, encoding) {
                events.push(event);
            }
            pos += i + 3;
            continue;
        }
        match decode_one(rest, encoding) {
            Step::Key(event) => {
                pos += event.byte_len();
                events.push(event);
            }
            Step::Incomplete => {
                events.push(KeyEvent::literal_byte(rest[0]));
                pos += 1;
            }
        }
    }
    events
}

pub(crate) enum Step {
    Key(KeyEvent),
    Incomplete,
}

enum CharStep {
    Char { code: u32, len: usize },
    Incomplete,
    Invalid,
}

/// Decodes the key at the start of `input` (non-empty).
pub(crate) fn decode_one(input: &[u8], encoding: &Encoding) -> Step {
    let mut modifiers = KeyModifiers::NONE;
    let mut i = 0;

    while i < input.len() && input[i] == K_SPECIAL {
        if input.len() < i + 3 {
            return Step::Incomplete;
        }
        let (b1, b2) = (input[i + 1], input[i + 2]);
        match b1 {
            KS_MODIFIER => {
                modifiers |= KeyModifiers::from_bits_truncate(b2);
                i += 3;
            }
            KS_SPECIAL if b2 == KE_FILLER => {
                let kind = KeyKind::Char(CharKey::new(K_SPECIAL as u32));
                return key(kind, modifiers, &input[..i + 3]);
            }
            KS_MOUSE => {
                if input.len() < i + MOUSE_REPORT_LEN {
                    return Step::Incomplete;
                }
                let (action, clicks, code_mods) = parse_mouse_code(b2);
                let y = u16::from_be_bytes([input[i + 3], input[i + 4]]);
                let x = u16::from_be_bytes([input[i + 5], input[i + 6]]);
                let mouse = MouseKey {
                    action,
                    clicks,
                    position: MousePosition::new(x, y),
                };
                return key(
                    KeyKind::Mouse(mouse),
                    modifiers | code_mods,
                    &input[..i + MOUSE_REPORT_LEN],
                );
            }
            _ => match SpecialKey::from_termcap([b1, b2]) {
                Some(special) => {
                    return key(KeyKind::Special(special), modifiers, &input[..i + 3]);
                }
                None => return Step::Key(KeyEvent::literal_byte(input[0])),
            },
        }
    }

    if i >= input.len() {
        // modifier prefix without its key
        return Step::Incomplete;
    }

    let (code, len) = match decode_char(&input[i..], encoding) {
        CharStep::Char { code, len } => (code, len),
        CharStep::Incomplete => return Step::Incomplete,
        CharStep::Invalid => {
            let kind = KeyKind::Char(CharKey::new(input[i] as u32));
            return key(kind, modifiers, &input[..i + 1]);
        }
    };
    let mut end = i + len;
    let mut ch = CharKey::new(code);

    if encoding.family() == Family::Unicode {
        while ch.composing.len() < MAX_MCO && end < input.len() {
            match decode_char(&input[end..], encoding) {
                CharStep::Char { code, len } if is_composing(code) => {
                    ch.composing.push(code);
                    end += len;
                }
                _ => break,
            }
        }
    }

    key(KeyKind::Char(ch), modifiers, &input[..end])
}

fn key(kind: KeyKind, modifiers: KeyModifiers, raw: &[u8]) -> Step {
    Step::Key(KeyEvent::from_parts(kind, modifiers, raw.to_vec()))
}

fn is_composing(code: u32) -> bool {
    code >= 0x300
        && char::from_u32(code)
            .and_then(UnicodeWidthChar::width)
            .is_some_and(|w| w == 0)
}

const UTF8_MIN: [u32; 7] = [0, 0, 0x80, 0x800, 0x1_0000, 0x20_0000, 0x400_0000];

fn decode_char(input: &[u8], encoding: &Encoding) -> CharStep {
    let first = input[0];
    let len = encoding.byte_len(first);
    if len == 1 {
        return CharStep::Char {
            code: first as u32,
            len: 1,
        };
    }

    let available = input.len().min(len);
    match encoding.family() {
        Family::Unicode => {
            if input[1..available].iter().any(|b| b & 0xC0 != 0x80) {
                return CharStep::Invalid;
            }
            if available < len {
                return CharStep::Incomplete;
            }
            let lead_bits = 7 - len as u32;
            let mut code = (first as u32) & ((1 << lead_bits) - 1);
            for b in &input[1..len] {
                code = (code << 6) | (b & 0x3F) as u32;
            }
            if code < UTF8_MIN[len] {
                return CharStep::Invalid;
            }
            CharStep::Char { code, len }
        }
        Family::DoubleByte => {
            if input[1..available].iter().any(|b| *b == 0) {
                return CharStep::Invalid;
            }
            if available < len {
                return CharStep::Incomplete;
            }
            let code = input[..len]
                .iter()
                .fold(0u32, |acc, b| (acc << 8) | *b as u32);
            CharStep::Char { code, len }
        }
        Family::EightBit => CharStep::Char {
            code: first as u32,
            len: 1,
        },
    }
}

/// Incremental decoder that keeps an incomplete tail between feeds.
#[derive(Debug)]
pub struct StreamDecoder {
    encoding: Encoding,
    buf: Vec<u8>,
    incomplete_since: Option<Instant>,
}

impl StreamDecoder {
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            buf: Vec::new(),
            incomplete_since: None,
        }
    }

    pub fn feed(&mut self, bytes: &[u8], now: Instant) -> Vec<KeyEvent> {
        self.buf.extend_from_slice(bytes);
        let mut events = Vec::new();
        let consumed = drain_complete(&self.buf, &self.encoding, &mut events);
        self.buf.drain(..consumed);
        if self.buf.is_empty() {
            self.incomplete_since = None;
        } else if self.incomplete_since.is_none() {
            self.incomplete_since = Some(now);
        }
        events
    }

    /// Gives up on the buffered tail: its first byte becomes a literal
    /// character and the rest is decoded again.
    pub fn flush(&mut self) -> Vec<KeyEvent> {
        let mut events = Vec::new();
        while let Some(&first) = self.buf.first() {
            events.push(KeyEvent::literal_byte(first));
            self.buf.remove(0);
            let consumed = drain_complete(&self.buf, &self.encoding, &mut events);
            self.buf.drain(..consumed);
        }
        self.incomplete_since = None;
        events
    }

    pub fn pending_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn incomplete_since(&self) -> Option<Instant> {
        self.incomplete_since
    }

    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    /// Switches encoding; a buffered tail is flushed first.
    pub fn set_encoding(&mut self, encoding: Encoding) -> Vec<KeyEvent> {
        let flushed = self.flush();
        self.encoding = encoding;
        flushed
    }
}

fn drain_complete(buf: &[u8], encoding: &Encoding, out: &mut Vec<KeyEvent>) -> usize {
    let mut consumed = 0;
    for decoded in decode(buf, encoding) {
        match decoded {
            Decoded::Key(event) => {
                consumed += event.byte_len();
                out.push(event);
            }
            Decoded::Incomplete { offset } => consumed = offset,
        }
    }
    consumed
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/decoder.rs"]
mod tests;
