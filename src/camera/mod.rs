mod guard;
mod invoker;
#[cfg(test)]
mod mock;
mod service;

pub use guard::{CaptureGuard, CapturePermit, Rejection};
pub use invoker::{CaptureInvoker, CaptureTool, PathCaptureTool};
#[cfg(test)]
pub use mock::ScriptCaptureTool;
pub use service::{CameraService, CaptureOutcome};
