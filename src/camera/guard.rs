use crate::error::CaptureError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

/// Why the guard refused a capture attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The previous accepted attempt started less than `min_interval` ago
    TooSoon,
    /// Another capture holds the permit
    Busy,
}

impl From<Rejection> for CaptureError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::TooSoon => CaptureError::TooSoon,
            Rejection::Busy => CaptureError::Busy,
        }
    }
}

/// Rate limiter and mutual exclusion in front of the capture tool.
///
/// An attempt is checked against the minimum interval first and only then
/// against the in-flight flag, so a request that is both early and
/// concurrent is reported as too soon.
pub struct CaptureGuard {
    min_interval: Duration,
    last_accepted: Mutex<Option<Instant>>,
    in_flight: Arc<AtomicBool>,
}

/// Exclusive right to run one capture. Released on drop.
#[derive(Debug)]
pub struct CapturePermit {
    in_flight: Arc<AtomicBool>,
    started_at: Instant,
}

impl CaptureGuard {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_accepted: Mutex::new(None),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Try to start a capture at `now` without waiting.
    pub fn try_begin(&self, now: Instant) -> Result<CapturePermit, Rejection> {
        // Held across both checks so the accepted timestamp and the
        // in-flight flag change together.
        let mut last_accepted = self.last_accepted.lock();

        if let Some(previous) = *last_accepted {
            if now.saturating_duration_since(previous) < self.min_interval {
                trace!(
                    "Capture rejected: previous attempt started {:?} ago",
                    now.saturating_duration_since(previous)
                );
                return Err(Rejection::TooSoon);
            }
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            trace!("Capture rejected: another capture is in flight");
            return Err(Rejection::Busy);
        }

        *last_accepted = Some(now);

        Ok(CapturePermit {
            in_flight: Arc::clone(&self.in_flight),
            started_at: now,
        })
    }

    /// Whether a permit is currently held
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Start of the most recent accepted attempt
    pub fn last_accepted(&self) -> Option<Instant> {
        *self.last_accepted.lock()
    }
}

impl CapturePermit {
    pub fn started_at(&self) -> Instant {
        self.started_at
    }
}

impl Drop for CapturePermit {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}
