//! Dispatcher seam: resolved input → mode effect.

use crate::core::command::Command;
use crate::core::event::SpecialKey;
use crate::core::mode::{Mode, ModeEffect, PrimaryMode};
use crate::kernel::resolver::{CancelReason, Resolution};

pub trait Dispatcher {
    /// Handles one resolution and reports how the mode should change.
    fn dispatch(&mut self, resolution: &Resolution, mode: &Mode) -> ModeEffect;
}

const CTRL_G: u32 = 0x07;
const CTRL_Q: u32 = 0x11;

/// Minimal dispatcher that only tracks mode switches on the usual keys.
#[derive(Debug, Default)]
pub struct ModeKeys {
    quit: bool,
}

impl ModeKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set once a literal Ctrl-Q has been dispatched.
    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    fn command_effect(&mut self, command: &Command, mode: &Mode) -> ModeEffect {
        if let Command::Key { key, modifiers } = command {
            if modifiers.is_empty() && key.code == CTRL_Q {
                self.quit = true;
                return ModeEffect::None;
            }
        }
        match (mode.primary(), command) {
            (PrimaryMode::Normal, Command::Escape) => ModeEffect::None,
            (_, Command::Escape) => ModeEffect::Normal,
            (PrimaryMode::Normal, _) => normal_key(command),
            (PrimaryMode::Visual, _) => match command.plain_char().and_then(char::from_u32) {
                Some('v' | 'V') => ModeEffect::Normal,
                Some(':') => ModeEffect::CommandLine,
                Some('c' | 's') => ModeEffect::Insert,
                _ if command.plain_char() == Some(CTRL_G) => {
                    if mode.is_select() {
                        ModeEffect::Visual
                    } else {
                        ModeEffect::Select
                    }
                }
                _ => ModeEffect::None,
            },
            // any complete motion or command ends the operator
            (PrimaryMode::OperatorPending, _) => ModeEffect::Normal,
            (PrimaryMode::CommandLine, Command::Enter) => ModeEffect::Normal,
            (PrimaryMode::CommandLine, _) => ModeEffect::None,
            (PrimaryMode::Insert, Command::Special { key: SpecialKey::Insert, modifiers })
                if modifiers.is_empty() =>
            {
                if mode.is_virtual_replace() {
                    ModeEffect::Insert
                } else {
                    ModeEffect::SetReplace(!mode.is_replace())
                }
            }
            (PrimaryMode::Insert, _) => ModeEffect::None,
        }
    }
}

fn normal_key(command: &Command) -> ModeEffect {
    match command.plain_char().and_then(char::from_u32) {
        Some('i' | 'a' | 'I' | 'A' | 'o' | 'O') => ModeEffect::Insert,
        Some('R') => ModeEffect::Replace,
        Some('v' | 'V') => ModeEffect::Visual,
        Some(':' | '/' | '?') => ModeEffect::CommandLine,
        Some('d' | 'c' | 'y' | '<' | '>' | '=') => ModeEffect::OperatorPending,
        _ => ModeEffect::None,
    }
}

impl Dispatcher for ModeKeys {
    fn dispatch(&mut self, resolution: &Resolution, mode: &Mode) -> ModeEffect {
        match resolution {
            Resolution::Command(command) => self.command_effect(command, mode),
            Resolution::Cancelled(CancelReason::Interrupted) if !mode.is_normal() => {
                ModeEffect::Normal
            }
            // typing over a selection replaces it
            Resolution::Character(_) if mode.is_select() => ModeEffect::Insert,
            Resolution::Character(_) | Resolution::NeedMoreInput { .. } | Resolution::Cancelled(_) => {
                ModeEffect::None
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/dispatch.rs"]
mod tests;
