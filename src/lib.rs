//! keyweave - modal editor input resolution
//!
//! Modules:
//! - core: encodings, key events, canonical key bytes, commands, modes
//! - kernel: decoder, notation, mapping table, typeahead, resolver, session, settings
//! - tui: crossterm adapter (feature `tui`)

pub mod core;
pub mod kernel;
#[cfg(feature = "tui")]
pub mod tui;
