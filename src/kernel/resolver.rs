//! Key-sequence resolver.
//!
//! Pulls keys from the typeahead queue, matches the pending sequence against
//! the mapping table and either resolves it, expands a mapping back into the
//! queue head, or waits for more input until the ambiguity deadline.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::command::Command;
use crate::core::encoding::Encoding;
use crate::core::event::{CharKey, KeyEvent, KeyKind};
use crate::core::mode::{MapModes, Mode};
use crate::kernel::decoder::decode_mapping_side;
use crate::kernel::keymap::{
    BufferId, Lookup, LookupContext, MapRhs, MappingEntry, MappingTable, Remap,
};
use crate::kernel::notation::render;
use crate::kernel::typeahead::{QueuedKey, RemapPolicy, Typeahead};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);
pub const DEFAULT_MAX_DEPTH: usize = 1000;
/// Ctrl-C.
pub const DEFAULT_INTERRUPT_KEY: u8 = 0x03;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// How long an ambiguous sequence waits for more keys; `None` waits forever.
    pub timeout: Option<Duration>,
    pub max_depth: usize,
    pub interrupt_key: Option<Vec<u8>>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
            max_depth: DEFAULT_MAX_DEPTH,
            interrupt_key: Some(vec![DEFAULT_INTERRUPT_KEY]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelReason {
    RecursionLimit { depth: usize, lhs: String },
    Interrupted,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::RecursionLimit { depth, lhs } => {
                write!(f, "recursive mapping {lhs} exceeded depth {depth}")
            }
            CancelReason::Interrupted => f.write_str("interrupted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Command(Command),
    Character(CharKey),
    /// Nothing resolvable yet. With a deadline, pending keys are committed
    /// once it passes.
    NeedMoreInput { deadline: Option<Instant> },
    Cancelled(CancelReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverState {
    Idle,
    /// Pending keys form a prefix and queued keys remain to extend it.
    AwaitingInput { pending: usize },
    /// Mapping output is queued ahead of typed input.
    Expanding { remaining: usize, depth: usize },
    /// Pending keys form a prefix and the queue is empty.
    Blocked { deadline: Option<Instant> },
}

#[derive(Debug)]
pub struct Resolver {
    table: MappingTable,
    queue: Typeahead,
    encoding: Encoding,
    config: ResolverConfig,
    pending: Vec<QueuedKey>,
    last_key_at: Option<Instant>,
    expansions: usize,
}

impl Resolver {
    pub fn new(table: MappingTable, encoding: Encoding, config: ResolverConfig) -> Self {
        Self {
            table,
            queue: Typeahead::new(),
            encoding,
            config,
            pending: Vec::new(),
            last_key_at: None,
            expansions: 0,
        }
    }

    pub fn table(&self) -> &MappingTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut MappingTable {
        &mut self.table
    }

    pub fn queue(&self) -> &Typeahead {
        &self.queue
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    pub fn set_encoding(&mut self, encoding: Encoding) {
        self.encoding = encoding;
    }

    /// Queues a typed key behind everything already waiting. Without an
    /// arrival time it counts as arriving when it is polled.
    pub fn feed(&mut self, event: KeyEvent) {
        self.queue.push_typed(event, None);
    }

    pub fn feed_all(&mut self, events: impl IntoIterator<Item = KeyEvent>) {
        for event in events {
            self.feed(event);
        }
    }

    /// Queues a typed key that arrived at `at`.
    pub fn feed_at(&mut self, event: KeyEvent, at: Instant) {
        self.queue.push_typed(event, Some(at));
    }

    pub fn feed_all_at(&mut self, events: impl IntoIterator<Item = KeyEvent>, at: Instant) {
        for event in events {
            self.feed_at(event, at);
        }
    }

    pub fn pending(&self) -> &[QueuedKey] {
        &self.pending
    }

    pub fn state(&self) -> ResolverState {
        if !self.pending.is_empty() {
            if self.queue.is_empty() {
                ResolverState::Blocked {
                    deadline: self.deadline(),
                }
            } else {
                ResolverState::AwaitingInput {
                    pending: self.pending.len(),
                }
            }
        } else if self.queue.mapped_len() > 0 {
            ResolverState::Expanding {
                remaining: self.queue.mapped_len(),
                depth: self.expansions,
            }
        } else {
            ResolverState::Idle
        }
    }

    /// Drops pending keys and queued mapping output. Returns whether
    /// anything was discarded.
    pub fn interrupt(&mut self) -> bool {
        let pending = self.pending.len();
        let dropped = self.queue.discard_mapped();
        self.pending.clear();
        self.last_key_at = None;
        self.expansions = 0;
        tracing::debug!(pending, dropped, "input interrupted");
        pending + dropped > 0
    }

    /// Runs resolution until something can be handed out or more input is needed.
    pub fn poll(&mut self, mode: &Mode, buffer: Option<BufferId>, now: Instant) -> Resolution {
        let scope = mode.map_scope();
        loop {
            if let Some(deadline) = self.expired_deadline(now) {
                // keys that arrived before the deadline still extend the prefix
                let in_time = self
                    .queue
                    .front()
                    .is_some_and(|k| k.at.unwrap_or(now) <= deadline);
                if !in_time {
                    tracing::debug!(pending = %self.pending_notation(), "ambiguity timeout");
                    if let Some(resolution) = self.commit(mode, scope, buffer) {
                        return resolution;
                    }
                    continue;
                }
            }

            let Some(key) = self.queue.pop_front() else {
                let deadline = if self.pending.is_empty() {
                    None
                } else {
                    self.deadline()
                };
                return Resolution::NeedMoreInput { deadline };
            };

            if key.is_typed() && self.is_interrupt_key(&key.event) {
                self.interrupt();
                return Resolution::Cancelled(CancelReason::Interrupted);
            }

            match self.pending.first() {
                Some(head) if head.policy() != key.policy() => {
                    // keys with a different remap policy never extend the sequence
                    self.queue.push_front_all(vec![key]);
                    if let Some(resolution) = self.commit(mode, scope, buffer) {
                        return resolution;
                    }
                    continue;
                }
                Some(_) => {}
                None => {
                    if key.is_typed() {
                        self.expansions = 0;
                    }
                    if key.policy() == RemapPolicy::Never {
                        return literal(&key.event, mode);
                    }
                }
            }

            self.last_key_at = Some(key.at.unwrap_or(now));
            self.pending.push(key);

            let seq = self.pending_seq();
            let cx = self.context(scope, buffer);
            match self.table.lookup(&seq, &cx) {
                Lookup::Exact(entry) => {
                    self.pending.clear();
                    if let Some(resolution) = self.expand(&entry) {
                        return resolution;
                    }
                }
                Lookup::NoMatch => {
                    if let Some(resolution) = self.commit(mode, scope, buffer) {
                        return resolution;
                    }
                }
                Lookup::Partial | Lookup::ExactAndPartial(_) => {
                    tracing::trace!(pending = %self.pending_notation(), "ambiguous prefix");
                }
            }
        }
    }

    /// Commits the pending keys: the longest prefix that is a complete mapping
    /// expands, otherwise the first key resolves literally. The rest is requeued.
    fn commit(&mut self, mode: &Mode, scope: MapModes, buffer: Option<BufferId>) -> Option<Resolution> {
        let cx = self.context(scope, buffer);
        let mut pending = std::mem::take(&mut self.pending);
        self.last_key_at = None;
        if pending.is_empty() {
            return None;
        }

        let mut seq = Vec::new();
        let mut best: Option<(usize, Arc<MappingEntry>)> = None;
        for (i, key) in pending.iter().enumerate() {
            seq.extend_from_slice(key.event.map_bytes());
            if let Lookup::Exact(entry) | Lookup::ExactAndPartial(entry) = self.table.lookup(&seq, &cx) {
                best = Some((i + 1, entry));
            }
        }

        match best {
            Some((len, entry)) => {
                let rest = pending.split_off(len);
                self.queue.push_front_all(rest);
                self.expand(&entry)
            }
            None => {
                let rest = pending.split_off(1);
                self.queue.push_front_all(rest);
                pending.pop().map(|first| literal(&first.event, mode))
            }
        }
    }

    fn expand(&mut self, entry: &MappingEntry) -> Option<Resolution> {
        let rhs = match entry.rhs() {
            MapRhs::Function(name) => {
                tracing::debug!(lhs = %render(entry.lhs(), &self.encoding), function = %name, "mapping to function");
                return Some(Resolution::Command(Command::Function(name.clone())));
            }
            MapRhs::Keys(rhs) => rhs,
        };
        if rhs.is_empty() {
            tracing::debug!(lhs = %render(entry.lhs(), &self.encoding), "mapping to nothing");
            return None;
        }

        let policy = match entry.remap() {
            Remap::Yes => RemapPolicy::Allowed,
            Remap::Script => RemapPolicy::ScriptOnly,
            Remap::None => RemapPolicy::Never,
        };
        if policy != RemapPolicy::Never {
            self.expansions += 1;
            if self.expansions > self.config.max_depth {
                return Some(self.cancel_recursion(entry.lhs()));
            }
        }

        let lhs = entry.lhs();
        // `map x xy` must not remap the leading x again
        let skip_lhs = policy != RemapPolicy::Never && rhs.len() > lhs.len() && rhs.starts_with(lhs);
        let mut offset = 0;
        let keys: Vec<QueuedKey> = decode_mapping_side(rhs, &self.encoding)
            .into_iter()
            .map(|event| {
                let key_policy = if skip_lhs && offset < lhs.len() {
                    RemapPolicy::Never
                } else {
                    policy
                };
                offset += event.byte_len();
                QueuedKey::mapped(event, key_policy)
            })
            .collect();

        tracing::debug!(
            lhs = %render(lhs, &self.encoding),
            rhs = %render(rhs, &self.encoding),
            ?policy,
            depth = self.expansions,
            "mapping expanded"
        );
        self.queue.push_front_all(keys);
        None
    }

    fn cancel_recursion(&mut self, lhs: &[u8]) -> Resolution {
        let lhs = render(lhs, &self.encoding);
        let dropped = self.queue.discard_mapped();
        self.pending.clear();
        self.last_key_at = None;
        self.expansions = 0;
        let depth = self.config.max_depth;
        tracing::warn!(%lhs, depth, dropped, "recursive mapping cancelled");
        Resolution::Cancelled(CancelReason::RecursionLimit { depth, lhs })
    }

    fn context(&self, scope: MapModes, buffer: Option<BufferId>) -> LookupContext {
        LookupContext {
            modes: scope,
            buffer,
            script_only: self
                .pending
                .first()
                .is_some_and(|k| k.policy() == RemapPolicy::ScriptOnly),
        }
    }

    fn deadline(&self) -> Option<Instant> {
        self.config
            .timeout
            .zip(self.last_key_at)
            .map(|(timeout, at)| at + timeout)
    }

    fn expired_deadline(&self, now: Instant) -> Option<Instant> {
        if self.pending.is_empty() {
            return None;
        }
        self.deadline().filter(|d| now >= *d)
    }

    fn is_interrupt_key(&self, event: &KeyEvent) -> bool {
        self.config
            .interrupt_key
            .as_deref()
            .is_some_and(|key| key == event.map_bytes())
    }

    fn pending_seq(&self) -> Vec<u8> {
        self.pending
            .iter()
            .flat_map(|k| k.event.map_bytes().iter().copied())
            .collect()
    }

    fn pending_notation(&self) -> String {
        render(&self.pending_seq(), &self.encoding)
    }
}

/// Resolution of a key that no mapping applies to.
pub fn literal(event: &KeyEvent, mode: &Mode) -> Resolution {
    match event.kind() {
        KeyKind::Char(c) if mode.accepts_text() && event.modifiers().is_empty() && c.is_text() => {
            Resolution::Character(c.clone())
        }
        _ => Resolution::Command(Command::from_key(event)),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/resolver.rs"]
mod tests;
