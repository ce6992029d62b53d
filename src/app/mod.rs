mod orchestrator;
mod runtime;
mod state;
mod types;


pub use orchestrator::KioskOrchestrator;
pub use types::{Component, ComponentState, ShutdownReason};
