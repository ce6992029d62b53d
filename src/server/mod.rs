mod handlers;
mod responses;
mod server;
#[cfg(test)]
mod tests;

pub use responses::{ApiError, ErrorBody};
pub use server::{router, KioskServer, KioskServerBuilder, ServerState};
