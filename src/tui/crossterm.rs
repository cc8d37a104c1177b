//! crossterm events → canonical key bytes.
//!
//! The terminal adapter never builds key events itself: it produces the
//! bytes the key decoder reads, so terminal input and mapping definitions
//! share one representation.

use std::time::{Duration, Instant};

use crate::core::encoding::Encoding;
use crate::core::event::{
    KeyKind, KeyModifiers, MouseAction, MouseButton, MouseKey, MousePosition, SpecialKey,
    MAX_FUNCTION_KEY,
};
use crate::core::keycode::{encode_char, encode_char_key, encode_key, MAX_CLICKS};

pub const DEFAULT_MULTI_CLICK: Duration = Duration::from_millis(500);

pub fn into_key_modifiers(mods: crossterm::event::KeyModifiers) -> KeyModifiers {
    let mut out = KeyModifiers::NONE;
    if mods.contains(crossterm::event::KeyModifiers::SHIFT) {
        out |= KeyModifiers::SHIFT;
    }
    if mods.contains(crossterm::event::KeyModifiers::CONTROL) {
        out |= KeyModifiers::CONTROL;
    }
    if mods.contains(crossterm::event::KeyModifiers::ALT) {
        out |= KeyModifiers::ALT;
    }
    if mods.contains(crossterm::event::KeyModifiers::META) {
        out |= KeyModifiers::META;
    }
    if mods.contains(crossterm::event::KeyModifiers::SUPER) {
        out |= KeyModifiers::SUPER;
    }
    out
}

/// Counts repeated presses of one button at one cell.
#[derive(Debug)]
pub struct ClickTracker {
    last_click: Option<(MouseButton, u16, u16, Instant)>,
    click_count: u8,
    interval: Duration,
}

impl ClickTracker {
    pub fn new(interval: Duration) -> Self {
        Self {
            last_click: None,
            click_count: 0,
            interval,
        }
    }

    /// Registers a press and returns its click count (1..=4).
    pub fn press(&mut self, button: MouseButton, x: u16, y: u16, now: Instant) -> u8 {
        self.click_count = match self.last_click {
            Some((lb, lx, ly, lt))
                if lb == button
                    && lx == x
                    && ly == y
                    && now.saturating_duration_since(lt) < self.interval =>
            {
                (self.click_count % MAX_CLICKS) + 1
            }
            _ => 1,
        };
        self.last_click = Some((button, x, y, now));
        self.click_count
    }

    /// Click count of the latest press, for the matching release.
    pub fn last_count(&self) -> u8 {
        self.click_count.max(1)
    }
}

impl Default for ClickTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MULTI_CLICK)
    }
}

/// Converts one terminal event; events without a key form (resize, focus,
/// key release) yield `None`.
pub fn encode_event(
    event: &crossterm::event::Event,
    clicks: &mut ClickTracker,
    now: Instant,
    encoding: &Encoding,
) -> Option<Vec<u8>> {
    match event {
        crossterm::event::Event::Key(key) => encode_key_event(key, encoding),
        crossterm::event::Event::Mouse(mouse) => Some(encode_mouse_event(mouse, clicks, now, encoding)),
        crossterm::event::Event::Paste(text) => {
            let mut out = Vec::with_capacity(text.len());
            for ch in text.chars() {
                encode_char(ch as u32, &[], encoding, &mut out);
            }
            Some(out)
        }
        crossterm::event::Event::Resize(..)
        | crossterm::event::Event::FocusGained
        | crossterm::event::Event::FocusLost => None,
    }
}

pub fn encode_key_event(event: &crossterm::event::KeyEvent, encoding: &Encoding) -> Option<Vec<u8>> {
    if event.kind == crossterm::event::KeyEventKind::Release {
        return None;
    }
    let mut modifiers = into_key_modifiers(event.modifiers);
    let mut out = Vec::with_capacity(4);
    let special = |key: SpecialKey, modifiers: KeyModifiers| {
        Some(encode_key(&KeyKind::Special(key), modifiers, encoding))
    };

    match event.code {
        crossterm::event::KeyCode::Char(ch) => {
            // the terminal already applied Shift to non-letters
            if !ch.is_ascii_alphabetic() && !ch.is_control() {
                modifiers.remove(KeyModifiers::SHIFT);
            }
            encode_char_key(ch as u32, modifiers, encoding, &mut out);
        }
        crossterm::event::KeyCode::Enter => encode_char_key(0x0D, modifiers, encoding, &mut out),
        crossterm::event::KeyCode::Tab => encode_char_key(0x09, modifiers, encoding, &mut out),
        crossterm::event::KeyCode::Esc => encode_char_key(0x1B, modifiers, encoding, &mut out),
        crossterm::event::KeyCode::Null => {
            encode_char_key(0x00, modifiers.difference(KeyModifiers::CONTROL), encoding, &mut out)
        }
        crossterm::event::KeyCode::BackTab => {
            return special(SpecialKey::BackTab, modifiers.difference(KeyModifiers::SHIFT));
        }
        crossterm::event::KeyCode::Backspace => return special(SpecialKey::Backspace, modifiers),
        crossterm::event::KeyCode::Delete => return special(SpecialKey::Delete, modifiers),
        crossterm::event::KeyCode::Insert => return special(SpecialKey::Insert, modifiers),
        crossterm::event::KeyCode::Up => return special(SpecialKey::Up, modifiers),
        crossterm::event::KeyCode::Down => return special(SpecialKey::Down, modifiers),
        crossterm::event::KeyCode::Left => return special(SpecialKey::Left, modifiers),
        crossterm::event::KeyCode::Right => return special(SpecialKey::Right, modifiers),
        crossterm::event::KeyCode::Home => return special(SpecialKey::Home, modifiers),
        crossterm::event::KeyCode::End => return special(SpecialKey::End, modifiers),
        crossterm::event::KeyCode::PageUp => return special(SpecialKey::PageUp, modifiers),
        crossterm::event::KeyCode::PageDown => return special(SpecialKey::PageDown, modifiers),
        crossterm::event::KeyCode::F(n) if (1..=MAX_FUNCTION_KEY).contains(&n) => {
            return special(SpecialKey::F(n), modifiers);
        }
        _ => return None,
    }
    Some(out)
}

fn into_mouse_button(button: crossterm::event::MouseButton) -> MouseButton {
    match button {
        crossterm::event::MouseButton::Left => MouseButton::Left,
        crossterm::event::MouseButton::Right => MouseButton::Right,
        crossterm::event::MouseButton::Middle => MouseButton::Middle,
    }
}

pub fn encode_mouse_event(
    event: &crossterm::event::MouseEvent,
    clicks: &mut ClickTracker,
    now: Instant,
    encoding: &Encoding,
) -> Vec<u8> {
    let (x, y) = (event.column, event.row);
    let (action, count) = match event.kind {
        crossterm::event::MouseEventKind::Down(button) => {
            let button = into_mouse_button(button);
            (MouseAction::Down(button), clicks.press(button, x, y, now))
        }
        crossterm::event::MouseEventKind::Up(_) => (MouseAction::Up, clicks.last_count()),
        crossterm::event::MouseEventKind::Drag(button) => {
            (MouseAction::Drag(into_mouse_button(button)), 1)
        }
        crossterm::event::MouseEventKind::Moved => (MouseAction::Moved, 1),
        crossterm::event::MouseEventKind::ScrollUp => (MouseAction::ScrollUp, 1),
        crossterm::event::MouseEventKind::ScrollDown => (MouseAction::ScrollDown, 1),
        crossterm::event::MouseEventKind::ScrollLeft => (MouseAction::ScrollLeft, 1),
        crossterm::event::MouseEventKind::ScrollRight => (MouseAction::ScrollRight, 1),
    };
    let mouse = MouseKey {
        action,
        clicks: count,
        position: MousePosition::new(x, y),
    };
    encode_key(
        &KeyKind::Mouse(mouse),
        into_key_modifiers(event.modifiers),
        encoding,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/tui/crossterm.rs"]
mod tests;
