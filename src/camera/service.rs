use super::guard::CaptureGuard;
use super::invoker::{CaptureInvoker, CaptureTool, PathCaptureTool};
use crate::config::CameraConfig;
use crate::error::CaptureError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Result of a successful capture
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOutcome {
    pub path: PathBuf,
    /// Unix seconds at completion, used to bust client caches
    pub timestamp: i64,
}

/// Guarded access to the still camera
pub struct CameraService {
    guard: CaptureGuard,
    invoker: Arc<CaptureInvoker>,
}

impl CameraService {
    pub fn new(
        tool: Arc<dyn CaptureTool>,
        image_path: impl Into<PathBuf>,
        min_interval: Duration,
    ) -> Self {
        Self {
            guard: CaptureGuard::new(min_interval),
            invoker: Arc::new(CaptureInvoker::new(tool, image_path)),
        }
    }

    /// Service probing the configured tools on `PATH`
    pub fn from_config(config: &CameraConfig) -> Self {
        Self::new(
            Arc::new(PathCaptureTool::from_config(config)),
            &config.image_path,
            config.min_interval(),
        )
    }

    /// Take a still if the guard allows it.
    ///
    /// The tool runs on the blocking pool and the permit travels with it, so
    /// the camera stays reserved until the process exits even if the caller
    /// goes away.
    pub async fn capture(&self) -> Result<CaptureOutcome, CaptureError> {
        let permit = self.guard.try_begin(Instant::now()).map_err(|rejection| {
            debug!("Capture request rejected: {:?}", rejection);
            CaptureError::from(rejection)
        })?;

        let invoker = Arc::clone(&self.invoker);
        let result = tokio::task::spawn_blocking(move || {
            let result = invoker.capture(&permit);
            drop(permit);
            result
        })
        .await
        .map_err(|e| CaptureError::Worker {
            details: e.to_string(),
        })?;

        match result {
            Ok(path) => {
                info!("Captured still to {}", path.display());
                Ok(CaptureOutcome {
                    path,
                    timestamp: chrono::Utc::now().timestamp(),
                })
            }
            Err(e) => {
                error!("Capture failed: {}", e);
                Err(e)
            }
        }
    }

    pub fn image_path(&self) -> &Path {
        self.invoker.image_path()
    }

    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }
}
