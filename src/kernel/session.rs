//! Input session: byte source → decoder → resolver, with the current mode.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::core::encoding::Encoding;
use crate::core::mode::{MapModes, Mode, ModeEffect, ModeError};
use crate::kernel::decoder::StreamDecoder;
use crate::kernel::dispatch::Dispatcher;
use crate::kernel::keymap::{BufferId, MapError, MapScope, MappingEntry, MappingSpec, MappingTable};
use crate::kernel::resolver::{Resolution, Resolver, ResolverConfig};

pub const DEFAULT_KEY_TIMEOUT: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Mode(#[from] ModeError),
    #[error("input source closed")]
    SourceClosed,
    #[error("input error: {0}")]
    Io(#[from] std::io::Error),
}

/// A source of raw input bytes with one blocking wait.
pub trait InputSource {
    /// Waits for input until `deadline` (forever with `None`).
    /// `Ok(None)` means the deadline passed without input.
    fn wait(&mut self, deadline: Option<Instant>) -> Result<Option<Vec<u8>>, SessionError>;
}

pub struct ChannelSource {
    rx: Receiver<Vec<u8>>,
}

impl ChannelSource {
    pub fn new(rx: Receiver<Vec<u8>>) -> Self {
        Self { rx }
    }
}

impl InputSource for ChannelSource {
    fn wait(&mut self, deadline: Option<Instant>) -> Result<Option<Vec<u8>>, SessionError> {
        match deadline {
            None => self.rx.recv().map(Some).map_err(|_| SessionError::SourceClosed),
            Some(deadline) => {
                let timeout = deadline.saturating_duration_since(Instant::now());
                match self.rx.recv_timeout(timeout) {
                    Ok(bytes) => Ok(Some(bytes)),
                    Err(RecvTimeoutError::Timeout) => Ok(None),
                    Err(RecvTimeoutError::Disconnected) => Err(SessionError::SourceClosed),
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub encoding: Encoding,
    pub resolver: ResolverConfig,
    /// How long an incomplete key may wait for its remaining bytes; `None` waits forever.
    pub key_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            encoding: Encoding::utf8(),
            resolver: ResolverConfig::default(),
            key_timeout: Some(DEFAULT_KEY_TIMEOUT),
        }
    }
}

#[derive(Debug)]
pub struct InputSession {
    mode: Mode,
    resolver: Resolver,
    decoder: StreamDecoder,
    buffer: Option<BufferId>,
    key_timeout: Option<Duration>,
}

impl InputSession {
    pub fn new(config: SessionConfig, table: MappingTable) -> Self {
        Self {
            mode: Mode::normal(),
            resolver: Resolver::new(table, config.encoding.clone(), config.resolver),
            decoder: StreamDecoder::new(config.encoding),
            buffer: None,
            key_timeout: config.key_timeout,
        }
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn buffer(&self) -> Option<BufferId> {
        self.buffer
    }

    pub fn set_buffer(&mut self, buffer: Option<BufferId>) {
        self.buffer = buffer;
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn table(&self) -> &MappingTable {
        self.resolver.table()
    }

    pub fn encoding(&self) -> &Encoding {
        self.decoder.encoding()
    }

    /// Switches encoding; buffered partial input is flushed as literal bytes.
    pub fn set_encoding(&mut self, encoding: Encoding) {
        let flushed = self.decoder.set_encoding(encoding.clone());
        self.resolver.feed_all(flushed);
        self.resolver.set_encoding(encoding);
    }

    /// Accepts raw typed bytes received at `now`.
    pub fn feed(&mut self, bytes: &[u8], now: Instant) {
        let events = self.decoder.feed(bytes, now);
        self.resolver.feed_all_at(events, now);
    }

    /// Resolves what can be resolved at `now`.
    pub fn poll(&mut self, now: Instant) -> Resolution {
        let key_deadline = self.key_deadline();
        if key_deadline.is_some_and(|d| now >= d) {
            let since = self.decoder.incomplete_since().unwrap_or(now);
            let flushed = self.decoder.flush();
            tracing::debug!(keys = flushed.len(), "incomplete key flushed");
            self.resolver.feed_all_at(flushed, since);
        }

        match self.resolver.poll(&self.mode, self.buffer, now) {
            Resolution::NeedMoreInput { deadline } => Resolution::NeedMoreInput {
                deadline: earliest(deadline, self.key_deadline()),
            },
            other => other,
        }
    }

    /// Blocks on `source` until a resolution other than `NeedMoreInput` is ready.
    pub fn next<S: InputSource + ?Sized>(&mut self, source: &mut S) -> Result<Resolution, SessionError> {
        loop {
            match self.poll(Instant::now()) {
                Resolution::NeedMoreInput { deadline } => {
                    if let Some(bytes) = source.wait(deadline)? {
                        self.feed(&bytes, Instant::now());
                    }
                }
                resolution => return Ok(resolution),
            }
        }
    }

    /// Applies a mode effect. An invalid transition leaves the mode unchanged.
    pub fn apply(&mut self, effect: ModeEffect) -> Result<&Mode, SessionError> {
        let next = self.mode.transition(effect)?;
        if next != self.mode {
            tracing::debug!(from = self.mode.name(), to = next.name(), "mode changed");
        }
        self.mode = next;
        Ok(&self.mode)
    }

    /// Hands `resolution` to `dispatcher` and applies the effect it returns.
    pub fn dispatch<D: Dispatcher + ?Sized>(
        &mut self,
        resolution: &Resolution,
        dispatcher: &mut D,
    ) -> Result<&Mode, SessionError> {
        let effect = dispatcher.dispatch(resolution, &self.mode);
        self.apply(effect)
    }

    pub fn define(&mut self, spec: MappingSpec) -> Result<Arc<MappingEntry>, MapError> {
        self.resolver.table_mut().define(spec)
    }

    pub fn undefine(&mut self, lhs: &[u8], modes: MapModes, scope: MapScope) -> Result<(), MapError> {
        self.resolver.table_mut().undefine(lhs, modes, scope)
    }

    /// Drops the buffer's local mappings; the buffer stops being active.
    pub fn buffer_destroyed(&mut self, buffer: BufferId) -> usize {
        if self.buffer == Some(buffer) {
            self.buffer = None;
        }
        self.resolver.table_mut().clear_buffer(buffer)
    }

    pub fn interrupt(&mut self) -> bool {
        self.resolver.interrupt()
    }

    fn key_deadline(&self) -> Option<Instant> {
        self.decoder
            .incomplete_since()
            .zip(self.key_timeout)
            .map(|(since, timeout)| since + timeout)
    }
}

fn earliest(a: Option<Instant>, b: Option<Instant>) -> Option<Instant> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/session.rs"]
mod tests;
