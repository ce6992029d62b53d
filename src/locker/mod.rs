mod adapter;
mod line;
#[cfg(test)]
mod mock;

pub use adapter::{LockerAction, RelayAdapter, RelayState};
pub use line::{RelayLine, SysfsRelayLine};
#[cfg(test)]
pub use mock::MockRelayLine;
