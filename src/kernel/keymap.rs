//! Mapping table: lhs key bytes → replacement, per mode scope and buffer.

use std::sync::Arc;

use compact_str::CompactString;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::mode::MapModes;
use crate::kernel::notation::NotationError;

/// Longest accepted left-hand side, in bytes.
pub const MAXMAPLEN: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapScope {
    Global,
    Buffer(BufferId),
}

/// Whether the replacement may itself be remapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Remap {
    #[default]
    Yes,
    None,
    /// Only script-local mappings apply to the replacement.
    Script,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapRhs {
    Keys(Vec<u8>),
    Function(CompactString),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    lhs: Vec<u8>,
    rhs: MapRhs,
    modes: MapModes,
    remap: Remap,
    script_local: bool,
    nowait: bool,
    scope: MapScope,
}

impl MappingEntry {
    pub fn lhs(&self) -> &[u8] {
        &self.lhs
    }

    pub fn rhs(&self) -> &MapRhs {
        &self.rhs
    }

    pub fn modes(&self) -> MapModes {
        self.modes
    }

    pub fn remap(&self) -> Remap {
        self.remap
    }

    pub fn script_local(&self) -> bool {
        self.script_local
    }

    pub fn nowait(&self) -> bool {
        self.nowait
    }

    pub fn scope(&self) -> MapScope {
        self.scope
    }

    fn with_modes(&self, modes: MapModes) -> Self {
        Self {
            modes,
            ..self.clone()
        }
    }

    fn applies(&self, cx: &LookupContext) -> bool {
        if cx.script_only && !self.script_local {
            return false;
        }
        if self.modes.contains(MapModes::LANGMAP) && !cx.modes.contains(MapModes::LANGMAP) {
            return false;
        }
        self.modes
            .difference(MapModes::LANGMAP)
            .intersects(cx.modes.difference(MapModes::LANGMAP))
    }
}

/// Arguments of a mapping definition.
#[derive(Debug, Clone)]
pub struct MappingSpec {
    pub lhs: Vec<u8>,
    pub rhs: MapRhs,
    pub modes: MapModes,
    pub remap: Remap,
    pub script_local: bool,
    pub nowait: bool,
    pub unique: bool,
    pub scope: MapScope,
}

impl MappingSpec {
    pub fn new(lhs: impl Into<Vec<u8>>, rhs: impl Into<Vec<u8>>, modes: MapModes) -> Self {
        Self {
            lhs: lhs.into(),
            rhs: MapRhs::Keys(rhs.into()),
            modes,
            remap: Remap::Yes,
            script_local: false,
            nowait: false,
            unique: false,
            scope: MapScope::Global,
        }
    }

    pub fn function(lhs: impl Into<Vec<u8>>, name: &str, modes: MapModes) -> Self {
        Self {
            rhs: MapRhs::Function(CompactString::new(name)),
            ..Self::new(lhs, Vec::new(), modes)
        }
    }

    pub fn noremap(mut self) -> Self {
        self.remap = Remap::None;
        self
    }

    pub fn remap(mut self, remap: Remap) -> Self {
        self.remap = remap;
        self
    }

    pub fn script_local(mut self) -> Self {
        self.script_local = true;
        self
    }

    pub fn nowait(mut self) -> Self {
        self.nowait = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn buffer(mut self, buffer: BufferId) -> Self {
        self.scope = MapScope::Buffer(buffer);
        self
    }
}

/// How a buffer-local exact match competes with longer global mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocalPrecedence {
    /// A buffer-local exact match ignores longer global candidates.
    #[default]
    LocalExactWins,
    /// Local and global candidates are pooled; local wins only among exact matches.
    Merged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupContext {
    pub modes: MapModes,
    pub buffer: Option<BufferId>,
    /// Restrict to script-local entries (replacement of a `<script>` mapping).
    pub script_only: bool,
}

impl LookupContext {
    pub fn new(modes: MapModes, buffer: Option<BufferId>) -> Self {
        Self {
            modes,
            buffer,
            script_only: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    NoMatch,
    /// A longer entry starts with the sequence.
    Partial,
    Exact(Arc<MappingEntry>),
    /// The sequence is a complete entry and also the prefix of a longer one.
    ExactAndPartial(Arc<MappingEntry>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("empty left-hand side")]
    EmptyLhs,
    #[error("left-hand side is {len} bytes, limit is {max}")]
    LhsTooLong { len: usize, max: usize },
    #[error("mapping already exists for {}", String::from_utf8_lossy(.lhs))]
    AlreadyDefined { lhs: Vec<u8> },
    #[error("no such mapping: {}", String::from_utf8_lossy(.lhs))]
    NotFound { lhs: Vec<u8> },
    #[error("invalid mode letters: {0:?}")]
    InvalidModes(String),
    #[error(transparent)]
    Notation(#[from] NotationError),
}

type Buckets = FxHashMap<u8, Vec<Arc<MappingEntry>>>;

#[derive(Debug, Default)]
pub struct MappingTable {
    global: Buckets,
    buffers: FxHashMap<BufferId, Buckets>,
    precedence: LocalPrecedence,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_precedence(precedence: LocalPrecedence) -> Self {
        Self {
            precedence,
            ..Self::default()
        }
    }

    pub fn precedence(&self) -> LocalPrecedence {
        self.precedence
    }

    pub fn set_precedence(&mut self, precedence: LocalPrecedence) {
        self.precedence = precedence;
    }

    /// Adds a mapping. Existing entries with the same lhs lose the modes
    /// the new entry covers.
    pub fn define(&mut self, spec: MappingSpec) -> Result<Arc<MappingEntry>, MapError> {
        if spec.lhs.is_empty() {
            return Err(MapError::EmptyLhs);
        }
        if spec.lhs.len() > MAXMAPLEN {
            return Err(MapError::LhsTooLong {
                len: spec.lhs.len(),
                max: MAXMAPLEN,
            });
        }
        if spec.modes.is_empty() {
            return Err(MapError::InvalidModes(spec.modes.letters()));
        }

        if spec.unique && self.find_exact(&spec.lhs, spec.modes, spec.scope).is_some() {
            return Err(MapError::AlreadyDefined { lhs: spec.lhs });
        }

        let first = spec.lhs[0];
        let bucket = self.buckets_mut(spec.scope).entry(first).or_default();
        strip_modes(bucket, &spec.lhs, spec.modes);
        let entry = Arc::new(MappingEntry {
            lhs: spec.lhs,
            rhs: spec.rhs,
            modes: spec.modes,
            remap: spec.remap,
            script_local: spec.script_local,
            nowait: spec.nowait,
            scope: spec.scope,
        });
        bucket.push(entry.clone());

        tracing::debug!(
            lhs = ?String::from_utf8_lossy(&entry.lhs),
            modes = %entry.modes.letters(),
            scope = ?entry.scope,
            "mapping defined"
        );
        Ok(entry)
    }

    /// Removes `modes` from the entries mapping `lhs` in `scope`.
    pub fn undefine(&mut self, lhs: &[u8], modes: MapModes, scope: MapScope) -> Result<(), MapError> {
        let Some(&first) = lhs.first() else {
            return Err(MapError::EmptyLhs);
        };
        let not_found = || MapError::NotFound { lhs: lhs.to_vec() };
        let buckets = self.existing_buckets_mut(scope).ok_or_else(not_found)?;
        let bucket = buckets.get_mut(&first).ok_or_else(not_found)?;
        if !bucket
            .iter()
            .any(|e| e.lhs == lhs && e.modes.intersects(modes))
        {
            return Err(not_found());
        }
        strip_modes(bucket, lhs, modes);
        if bucket.is_empty() {
            buckets.remove(&first);
        }
        self.prune(scope);
        tracing::debug!(lhs = ?String::from_utf8_lossy(lhs), modes = %modes.letters(), ?scope, "mapping removed");
        Ok(())
    }

    /// Removes `modes` from every entry in `scope`.
    pub fn clear(&mut self, modes: MapModes, scope: MapScope) {
        let Some(buckets) = self.existing_buckets_mut(scope) else {
            return;
        };
        buckets.retain(|_, bucket| {
            *bucket = bucket
                .drain(..)
                .filter_map(|e| remaining(&e, modes))
                .collect();
            !bucket.is_empty()
        });
        self.prune(scope);
        tracing::debug!(modes = %modes.letters(), ?scope, "mappings cleared");
    }

    /// Drops all entries local to `buffer`; returns how many were removed.
    pub fn clear_buffer(&mut self, buffer: BufferId) -> usize {
        let removed = self
            .buffers
            .remove(&buffer)
            .map(|buckets| buckets.values().map(Vec::len).sum())
            .unwrap_or(0);
        if removed > 0 {
            tracing::debug!(buffer = buffer.0, removed, "buffer mappings dropped");
        }
        removed
    }

    pub fn lookup(&self, seq: &[u8], cx: &LookupContext) -> Lookup {
        let Some(&first) = seq.first() else {
            return Lookup::NoMatch;
        };

        let local: Vec<&Arc<MappingEntry>> = cx
            .buffer
            .and_then(|b| self.buffers.get(&b))
            .and_then(|buckets| buckets.get(&first))
            .map(|bucket| bucket.iter().filter(|e| e.applies(cx)).collect())
            .unwrap_or_default();
        let global: Vec<&Arc<MappingEntry>> = self
            .global
            .get(&first)
            .map(|bucket| {
                bucket
                    .iter()
                    .filter(|e| e.applies(cx))
                    .filter(|e| !local.iter().any(|l| l.lhs == e.lhs))
                    .collect()
            })
            .unwrap_or_default();

        let exact_in = |entries: &[&Arc<MappingEntry>]| {
            entries.iter().rev().find(|e| e.lhs == seq).map(|e| Arc::clone(e))
        };
        let partial_in = |entries: &[&Arc<MappingEntry>]| {
            entries
                .iter()
                .any(|e| e.lhs.len() > seq.len() && e.lhs.starts_with(seq))
        };

        let local_exact = exact_in(&local);
        let local_partial = partial_in(&local);

        let (exact, partial) = match (self.precedence, local_exact) {
            (LocalPrecedence::LocalExactWins, Some(entry)) => (Some(entry), local_partial),
            (_, local_exact) => (
                local_exact.or_else(|| exact_in(&global)),
                local_partial || partial_in(&global),
            ),
        };

        match (exact, partial) {
            (None, false) => Lookup::NoMatch,
            (None, true) => Lookup::Partial,
            (Some(entry), true) if !entry.nowait => Lookup::ExactAndPartial(entry),
            (Some(entry), _) => Lookup::Exact(entry),
        }
    }

    /// The entry mapping exactly `lhs` in `scope` for any of `modes`.
    pub fn find_exact(&self, lhs: &[u8], modes: MapModes, scope: MapScope) -> Option<Arc<MappingEntry>> {
        let buckets = match scope {
            MapScope::Global => &self.global,
            MapScope::Buffer(b) => self.buffers.get(&b)?,
        };
        buckets
            .get(lhs.first()?)?
            .iter()
            .rev()
            .find(|e| e.lhs == lhs && e.modes.intersects(modes))
            .cloned()
    }

    /// Listing: entries for any of `modes` whose lhs starts with `prefix`,
    /// buffer-local entries first, each group sorted by lhs.
    pub fn entries(
        &self,
        modes: MapModes,
        buffer: Option<BufferId>,
        prefix: &[u8],
    ) -> Vec<Arc<MappingEntry>> {
        let collect = |buckets: &Buckets| {
            let mut list: Vec<Arc<MappingEntry>> = buckets
                .values()
                .flatten()
                .filter(|e| e.modes.intersects(modes) && e.lhs.starts_with(prefix))
                .cloned()
                .collect();
            list.sort_by(|a, b| a.lhs.cmp(&b.lhs));
            list
        };
        let mut out = buffer
            .and_then(|b| self.buffers.get(&b))
            .map(collect)
            .unwrap_or_default();
        out.extend(collect(&self.global));
        out
    }

    pub fn len(&self) -> usize {
        let count = |buckets: &Buckets| buckets.values().map(Vec::len).sum::<usize>();
        count(&self.global) + self.buffers.values().map(count).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn buckets_mut(&mut self, scope: MapScope) -> &mut Buckets {
        match scope {
            MapScope::Global => &mut self.global,
            MapScope::Buffer(b) => self.buffers.entry(b).or_default(),
        }
    }

    fn existing_buckets_mut(&mut self, scope: MapScope) -> Option<&mut Buckets> {
        match scope {
            MapScope::Global => Some(&mut self.global),
            MapScope::Buffer(b) => self.buffers.get_mut(&b),
        }
    }

    fn prune(&mut self, scope: MapScope) {
        if let MapScope::Buffer(b) = scope {
            if self.buffers.get(&b).is_some_and(|buckets| buckets.is_empty()) {
                self.buffers.remove(&b);
            }
        }
    }
}

fn remaining(entry: &Arc<MappingEntry>, removed: MapModes) -> Option<Arc<MappingEntry>> {
    if !entry.modes.intersects(removed) {
        return Some(Arc::clone(entry));
    }
    let left = entry.modes.difference(removed);
    if left.is_empty() || left == MapModes::LANGMAP {
        None
    } else {
        Some(Arc::new(entry.with_modes(left)))
    }
}

fn strip_modes(bucket: &mut Vec<Arc<MappingEntry>>, lhs: &[u8], modes: MapModes) {
    *bucket = bucket
        .drain(..)
        .filter_map(|e| if e.lhs == lhs { remaining(&e, modes) } else { Some(e) })
        .collect();
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/keymap.rs"]
mod tests;
