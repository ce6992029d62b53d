use super::{Component, ComponentState, KioskOrchestrator, ShutdownReason};
use crate::error::Result;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

impl KioskOrchestrator {
    /// Serve until a shutdown signal arrives, returning the process exit code.
    ///
    /// In-flight requests, including running captures and relay pulses, are
    /// drained before this returns.
    pub async fn run(&self) -> Result<i32> {
        info!("Kiosk service is running");

        self.setup_signal_handlers();

        self.set_component_state(Component::Server, ComponentState::Running)
            .await;

        let result = self.server.start(self.cancellation_token.clone()).await;

        match result {
            Ok(()) => {
                self.set_component_state(Component::Server, ComponentState::Stopped)
                    .await;
                match self.shutdown_reason().await {
                    Some(reason) => info!("Shutdown complete: {:?}", reason),
                    None => info!("Shutdown complete"),
                }
                Ok(0)
            }
            Err(e) => {
                error!("Kiosk server failed: {}", e);
                self.set_component_state(Component::Server, ComponentState::Failed)
                    .await;
                self.shutdown_reason
                    .lock()
                    .await
                    .get_or_insert(ShutdownReason::Error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Why the service stopped, once it has
    pub async fn shutdown_reason(&self) -> Option<ShutdownReason> {
        self.shutdown_reason.lock().await.clone()
    }

    /// Set up signal handlers for graceful shutdown
    fn setup_signal_handlers(&self) {
        // Handle SIGTERM (systemd stop) - Unix only
        #[cfg(unix)]
        {
            let reason = Arc::clone(&self.shutdown_reason);
            let token = self.cancellation_token.clone();
            tokio::spawn(async move {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        if sigterm.recv().await.is_some() {
                            info!("Received SIGTERM signal");
                            request_shutdown(&reason, &token, "SIGTERM").await;
                        }
                    }
                    Err(e) => warn!("Failed to register SIGTERM handler: {}", e),
                }
            });
        }

        // Handle SIGINT (Ctrl+C) - Cross-platform
        let reason = Arc::clone(&self.shutdown_reason);
        let token = self.cancellation_token.clone();
        tokio::spawn(async move {
            if let Ok(()) = signal::ctrl_c().await {
                info!("Received SIGINT signal (Ctrl+C)");
                request_shutdown(&reason, &token, "SIGINT").await;
            }
        });
    }
}

async fn request_shutdown(
    reason: &Mutex<Option<ShutdownReason>>,
    token: &CancellationToken,
    signal_name: &str,
) {
    reason
        .lock()
        .await
        .get_or_insert_with(|| ShutdownReason::Signal(signal_name.to_string()));
    token.cancel();
}
