pub mod app;
pub mod camera;
pub mod config;
pub mod error;
pub mod locker;
pub mod server;

pub use app::{Component, ComponentState, KioskOrchestrator, ShutdownReason};
pub use camera::{
    CameraService, CaptureGuard, CaptureInvoker, CaptureOutcome, CapturePermit, CaptureTool,
    PathCaptureTool, Rejection,
};
pub use config::KioskConfig;
pub use error::{CaptureError, KioskError, LockerError, Result, ServerError};
pub use locker::{LockerAction, RelayAdapter, RelayLine, SysfsRelayLine};
pub use server::{KioskServer, KioskServerBuilder};
