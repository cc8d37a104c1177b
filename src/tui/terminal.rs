//! Raw-mode terminal as an input source.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::encoding::Encoding;
use crate::kernel::session::{InputSource, SessionError};
use crate::tui::crossterm::{encode_event, ClickTracker};

pub trait TerminalOps: Send + Sync + 'static {
    fn setup(&self) -> io::Result<()>;
    fn restore(&self) -> io::Result<()>;
}

/// Raw mode plus mouse reporting.
#[derive(Debug, Default)]
pub struct CrosstermTerminalOps;

impl TerminalOps for CrosstermTerminalOps {
    fn setup(&self) -> io::Result<()> {
        use crossterm::{event::EnableMouseCapture, execute, terminal::enable_raw_mode};

        enable_raw_mode()?;
        execute!(io::stdout(), EnableMouseCapture)?;
        Ok(())
    }

    fn restore(&self) -> io::Result<()> {
        use crossterm::{event::DisableMouseCapture, execute, terminal::disable_raw_mode};

        // try both steps even if one fails
        let capture = execute!(io::stdout(), DisableMouseCapture);
        let raw = disable_raw_mode();
        capture.and(raw)
    }
}

/// Puts the terminal in raw mode; restores it once, on `restore` or drop.
pub struct RawTerminal {
    restored: AtomicBool,
    ops: Arc<dyn TerminalOps>,
}

impl RawTerminal {
    pub fn enter() -> io::Result<Self> {
        Self::with_ops(Arc::new(CrosstermTerminalOps))
    }

    pub fn with_ops(ops: Arc<dyn TerminalOps>) -> io::Result<Self> {
        ops.setup()?;
        Ok(Self {
            restored: AtomicBool::new(false),
            ops,
        })
    }

    pub fn restore(&self) -> io::Result<()> {
        if self.restored.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.ops.restore()
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Reads crossterm events and hands them on as canonical key bytes.
pub struct TerminalSource {
    encoding: Encoding,
    clicks: ClickTracker,
}

impl TerminalSource {
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            clicks: ClickTracker::default(),
        }
    }
}

impl InputSource for TerminalSource {
    fn wait(&mut self, deadline: Option<Instant>) -> Result<Option<Vec<u8>>, SessionError> {
        loop {
            let ready = match deadline {
                None => true,
                Some(deadline) => {
                    let timeout = deadline.saturating_duration_since(Instant::now());
                    crossterm::event::poll(timeout.max(Duration::from_millis(1)))?
                }
            };
            if !ready {
                return Ok(None);
            }
            let event = crossterm::event::read()?;
            if let Some(bytes) = encode_event(&event, &mut self.clicks, Instant::now(), &self.encoding) {
                return Ok(Some(bytes));
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/tui/terminal.rs"]
mod tests;
