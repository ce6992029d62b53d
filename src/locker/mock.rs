use super::line::RelayLine;
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

/// Relay line that records every state change
#[derive(Debug, Clone, Default)]
pub struct MockRelayLine {
    history: Arc<Mutex<Vec<bool>>>,
    fail_writes: bool,
}

impl MockRelayLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// A line whose every write fails
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    /// States written so far, oldest first
    pub fn history(&self) -> Vec<bool> {
        self.history.lock().clone()
    }

    /// Last state written, `false` if never driven
    pub fn is_active(&self) -> bool {
        self.history.lock().last().copied().unwrap_or(false)
    }
}

impl RelayLine for MockRelayLine {
    fn set_active(&mut self, active: bool) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "mock relay write failure",
            ));
        }

        self.history.lock().push(active);
        Ok(())
    }
}
