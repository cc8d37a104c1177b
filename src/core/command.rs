//! Logical commands handed to the dispatcher.
//!
//! A command says which key was resolved, never what it does to text.

use compact_str::CompactString;

use super::event::{CharKey, KeyEvent, KeyKind, KeyModifiers, MouseKey, SpecialKey};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    Escape,
    Enter,
    Backspace,
    /// A character key outside text entry (Normal-mode commands, control keys).
    Key {
        key: CharKey,
        modifiers: KeyModifiers,
    },
    Special {
        key: SpecialKey,
        modifiers: KeyModifiers,
    },
    Mouse {
        mouse: MouseKey,
        modifiers: KeyModifiers,
    },
    /// Right-hand side bound to a registered function instead of keys.
    Function(CompactString),
}

impl Command {
    pub fn from_key(event: &KeyEvent) -> Self {
        let modifiers = event.modifiers();
        match event.kind() {
            KeyKind::Char(c) if modifiers.is_empty() && c.composing.is_empty() => match c.code {
                0x1B => Command::Escape,
                0x0D | 0x0A => Command::Enter,
                0x08 | 0x7F => Command::Backspace,
                _ => Command::Key {
                    key: c.clone(),
                    modifiers,
                },
            },
            KeyKind::Char(c) => Command::Key {
                key: c.clone(),
                modifiers,
            },
            KeyKind::Special(SpecialKey::Backspace) if modifiers.is_empty() => Command::Backspace,
            KeyKind::Special(key) => Command::Special {
                key: *key,
                modifiers,
            },
            KeyKind::Mouse(mouse) => Command::Mouse {
                mouse: *mouse,
                modifiers,
            },
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Command::Escape => "escape",
            Command::Enter => "enter",
            Command::Backspace => "backspace",
            Command::Key { .. } => "key",
            Command::Special { .. } => "special",
            Command::Mouse { .. } => "mouse",
            Command::Function(name) => name.as_str(),
        }
    }

    /// The plain character of a `Key` command without modifiers.
    pub fn plain_char(&self) -> Option<u32> {
        match self {
            Command::Key { key, modifiers } if modifiers.is_empty() => Some(key.code),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/core/command.rs"]
mod tests;
