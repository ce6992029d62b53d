use crate::{
    camera::CameraService,
    config::ServerConfig,
    error::{KioskError, Result, ServerError},
    locker::RelayAdapter,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;

use super::handlers::{
    capture_handler, health_handler, image_handler, index_handler, locker_off_handler,
    locker_on_handler, locker_open_handler,
};

/// Shared state for the Axum server
#[derive(Clone)]
pub struct ServerState {
    pub(crate) camera: Arc<CameraService>,
    pub(crate) relay: Arc<RelayAdapter>,
    pub(crate) static_dir: PathBuf,
    pub(crate) pulse_duration: Duration,
}

impl ServerState {
    pub fn new(
        camera: Arc<CameraService>,
        relay: Arc<RelayAdapter>,
        static_dir: impl Into<PathBuf>,
        pulse_duration: Duration,
    ) -> Self {
        Self {
            camera,
            relay,
            static_dir: static_dir.into(),
            pulse_duration,
        }
    }
}

/// Build the kiosk router
pub fn router(state: ServerState, cors_permissive: bool) -> Router {
    let static_files = ServeDir::new(&state.static_dir);

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/image", get(image_handler))
        .route("/health", get(health_handler))
        .route("/api/camera/capture", post(capture_handler))
        .route("/api/locker/open/1", post(locker_open_handler))
        .route("/api/locker/on/1", post(locker_on_handler))
        .route("/api/locker/off/1", post(locker_off_handler))
        .nest_service("/static", static_files)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_permissive {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// HTTP front end for the camera and the locker relay
pub struct KioskServer {
    pub(crate) config: ServerConfig,
    pub(crate) state: ServerState,
}

impl KioskServer {
    pub fn new(config: ServerConfig, state: ServerState) -> Self {
        Self { config, state }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.config.ip, self.config.port)
    }

    pub fn router(&self) -> Router {
        router(self.state.clone(), self.config.cors_permissive)
    }

    /// Serve until `shutdown` is cancelled
    pub async fn start(&self, shutdown: CancellationToken) -> Result<()> {
        let addr = self.address();

        info!("Starting kiosk server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::BindFailed {
                address: addr.clone(),
                source: e,
            })?;

        info!("Kiosk server listening on {}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| ServerError::Serve {
                details: format!("Server error: {}", e),
            })?;

        info!("Kiosk server on {} stopped", addr);
        Ok(())
    }
}

/// Kiosk server builder for configuration
pub struct KioskServerBuilder {
    config: Option<ServerConfig>,
    camera: Option<Arc<CameraService>>,
    relay: Option<Arc<RelayAdapter>>,
    pulse_duration: Option<Duration>,
}

impl KioskServerBuilder {
    /// Create a new kiosk server builder
    pub fn new() -> Self {
        Self {
            config: None,
            camera: None,
            relay: None,
            pulse_duration: None,
        }
    }

    /// Set the server configuration
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the camera service
    pub fn camera(mut self, camera: Arc<CameraService>) -> Self {
        self.camera = Some(camera);
        self
    }

    /// Set the locker relay
    pub fn relay(mut self, relay: Arc<RelayAdapter>) -> Self {
        self.relay = Some(relay);
        self
    }

    /// Set how long an open pulse holds the relay
    pub fn pulse_duration(mut self, pulse_duration: Duration) -> Self {
        self.pulse_duration = Some(pulse_duration);
        self
    }

    /// Build the kiosk server
    pub fn build(self) -> Result<KioskServer> {
        let config = self
            .config
            .ok_or_else(|| KioskError::system("Server configuration is required"))?;

        let camera = self
            .camera
            .ok_or_else(|| KioskError::system("Camera service is required"))?;

        let relay = self
            .relay
            .ok_or_else(|| KioskError::system("Locker relay is required"))?;

        let pulse_duration = self
            .pulse_duration
            .ok_or_else(|| KioskError::system("Pulse duration is required"))?;

        let state = ServerState::new(camera, relay, &config.static_dir, pulse_duration);

        Ok(KioskServer::new(config, state))
    }
}

impl Default for KioskServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
