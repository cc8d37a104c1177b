//! Core input types: encodings, key events, canonical key bytes, commands and modes.

pub mod command;
pub mod encoding;
pub mod event;
pub mod keycode;
pub mod mode;

pub use command::Command;
pub use encoding::{CodePage, Encoding, EncodingFlags, Endianness, Family};
pub use event::{
    CharKey, KeyEvent, KeyKind, KeyModifiers, MouseAction, MouseButton, MouseKey, MousePosition,
    SpecialKey,
};
pub use mode::{Facets, MapModes, Mode, ModeEffect, ModeError, PrimaryMode};
