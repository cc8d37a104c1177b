//! Typeahead queue: keys waiting for resolution.

use std::collections::VecDeque;
use std::time::Instant;

use crate::core::event::KeyEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemapPolicy {
    Allowed,
    /// Only script-local mappings may apply.
    ScriptOnly,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    Typed,
    Mapped(RemapPolicy),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedKey {
    pub event: KeyEvent,
    pub origin: Origin,
    /// When typed input arrived. `None` for mapping output and for keys
    /// queued without a timestamp; those count as arriving when popped.
    pub at: Option<Instant>,
}

impl QueuedKey {
    pub fn typed(event: KeyEvent, at: Option<Instant>) -> Self {
        Self {
            event,
            origin: Origin::Typed,
            at,
        }
    }

    pub fn mapped(event: KeyEvent, policy: RemapPolicy) -> Self {
        Self {
            event,
            origin: Origin::Mapped(policy),
            at: None,
        }
    }

    pub fn policy(&self) -> RemapPolicy {
        match self.origin {
            Origin::Typed => RemapPolicy::Allowed,
            Origin::Mapped(policy) => policy,
        }
    }

    pub fn is_typed(&self) -> bool {
        self.origin == Origin::Typed
    }
}

/// Deque of keys: typed input enters at the back, mapping output at the front.
#[derive(Debug, Default)]
pub struct Typeahead {
    keys: VecDeque<QueuedKey>,
}

impl Typeahead {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_typed(&mut self, event: KeyEvent, at: Option<Instant>) {
        self.keys.push_back(QueuedKey::typed(event, at));
    }

    /// Inserts `keys` at the head, keeping their order.
    pub fn push_front_all(&mut self, keys: Vec<QueuedKey>) {
        for key in keys.into_iter().rev() {
            self.keys.push_front(key);
        }
    }

    pub fn pop_front(&mut self) -> Option<QueuedKey> {
        self.keys.pop_front()
    }

    pub fn front(&self) -> Option<&QueuedKey> {
        self.keys.front()
    }

    /// Drops every key produced by mapping expansion; typed keys stay.
    pub fn discard_mapped(&mut self) -> usize {
        let before = self.keys.len();
        self.keys.retain(QueuedKey::is_typed);
        before - self.keys.len()
    }

    pub fn mapped_len(&self) -> usize {
        self.keys.iter().filter(|k| !k.is_typed()).count()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/typeahead.rs"]
mod tests;
