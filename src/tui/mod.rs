//! Terminal integration (crossterm).
//!
//! Kept apart from `core`/`kernel` so the resolver builds without terminal crates.

pub mod crossterm;
pub mod terminal;

pub use self::crossterm::{encode_event, into_key_modifiers, ClickTracker};
pub use terminal::{RawTerminal, TerminalSource};
