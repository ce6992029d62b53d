use super::line::{RelayLine, SysfsRelayLine};
use crate::config::LockerConfig;
use crate::error::LockerError;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Lock actions exposed over HTTP
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LockerAction {
    /// Energise for the given time, then release
    PulseOpen(Duration),
    On,
    Off,
}

impl LockerAction {
    pub fn name(&self) -> &'static str {
        match self {
            LockerAction::PulseOpen(_) => "pulse_open",
            LockerAction::On => "on",
            LockerAction::Off => "off",
        }
    }
}

/// Whether the relay line could be bound at startup
pub enum RelayState {
    Available(Mutex<Box<dyn RelayLine>>),
    Unavailable,
}

/// The lock relay. Availability is decided once and never retried.
pub struct RelayAdapter {
    pin: u32,
    state: RelayState,
}

impl RelayAdapter {
    /// Bind the configured sysfs GPIO, falling back to `Unavailable` on any error
    pub fn open(config: &LockerConfig) -> Self {
        match SysfsRelayLine::open(&config.gpio_root, config.gpio_pin, config.active_low) {
            Ok(line) => {
                info!(
                    "Relay bound to GPIO {} (active {})",
                    config.gpio_pin,
                    if config.active_low { "low" } else { "high" }
                );
                Self::with_line(config.gpio_pin, line)
            }
            Err(e) => {
                let error = LockerError::Init {
                    pin: config.gpio_pin,
                    source: e,
                };
                warn!("{}; locker endpoints are disabled", error);
                Self::unavailable(config.gpio_pin)
            }
        }
    }

    pub fn with_line<L: RelayLine + 'static>(pin: u32, line: L) -> Self {
        Self {
            pin,
            state: RelayState::Available(Mutex::new(Box::new(line))),
        }
    }

    pub fn unavailable(pin: u32) -> Self {
        Self {
            pin,
            state: RelayState::Unavailable,
        }
    }

    pub fn pin(&self) -> u32 {
        self.pin
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state, RelayState::Available(_))
    }

    pub fn turn_on(&self) -> Result<(), LockerError> {
        self.set(true)
    }

    pub fn turn_off(&self) -> Result<(), LockerError> {
        self.set(false)
    }

    /// Energise, hold for `duration`, release. Blocks the calling thread.
    ///
    /// The release is attempted even if energising failed.
    pub fn pulse(&self, duration: Duration) -> Result<(), LockerError> {
        let on = self.turn_on();
        if on.is_ok() {
            std::thread::sleep(duration);
        }
        let off = self.turn_off();
        on.and(off)
    }

    /// Run `action` on the blocking pool.
    ///
    /// The worker finishes even if the caller is dropped, so a pulse always
    /// ends with the relay released.
    pub async fn perform(self: &Arc<Self>, action: LockerAction) -> Result<(), LockerError> {
        if !self.is_available() {
            return Err(LockerError::Unavailable);
        }

        let relay = Arc::clone(self);
        tokio::task::spawn_blocking(move || match action {
            LockerAction::PulseOpen(duration) => relay.pulse(duration),
            LockerAction::On => relay.turn_on(),
            LockerAction::Off => relay.turn_off(),
        })
        .await
        .map_err(|e| LockerError::Worker {
            details: e.to_string(),
        })??;

        info!("Locker action {} on GPIO {}", action.name(), self.pin);
        Ok(())
    }

    fn set(&self, active: bool) -> Result<(), LockerError> {
        match &self.state {
            RelayState::Available(line) => {
                line.lock()
                    .set_active(active)
                    .map_err(|e| LockerError::Write {
                        pin: self.pin,
                        source: e,
                    })?;
                debug!("Relay {}", if active { "on" } else { "off" });
                Ok(())
            }
            RelayState::Unavailable => Err(LockerError::Unavailable),
        }
    }
}
