use super::types::{Component, ComponentState, ShutdownReason};
use crate::camera::CameraService;
use crate::config::KioskConfig;
use crate::error::Result;
use crate::locker::RelayAdapter;
use crate::server::{KioskServer, KioskServerBuilder};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Owns the kiosk components and drives the process lifecycle
pub struct KioskOrchestrator {
    pub(super) config: KioskConfig,
    pub(super) camera: Arc<CameraService>,
    pub(super) relay: Arc<RelayAdapter>,
    pub(super) server: KioskServer,

    // Lifecycle management
    pub(super) component_states: Arc<Mutex<HashMap<Component, ComponentState>>>,
    pub(super) shutdown_reason: Arc<Mutex<Option<ShutdownReason>>>,
    pub(super) cancellation_token: CancellationToken,
}

impl KioskOrchestrator {
    /// Create a new orchestrator with the given configuration.
    ///
    /// A relay that cannot be bound leaves the locker disabled; the camera
    /// side still comes up.
    pub async fn new(config: KioskConfig) -> Result<Self> {
        let relay = Arc::new(RelayAdapter::open(&config.locker));

        let camera = Arc::new(CameraService::from_config(&config.camera));
        info!(
            "Camera capture to {} (tools: {}, min interval {:?})",
            config.camera.image_path,
            config.camera.tools.join(", "),
            config.camera.min_interval()
        );

        let server = KioskServerBuilder::new()
            .config(config.server.clone())
            .camera(Arc::clone(&camera))
            .relay(Arc::clone(&relay))
            .pulse_duration(config.locker.pulse_duration())
            .build()?;

        Ok(Self {
            config,
            camera,
            relay,
            server,
            component_states: Arc::new(Mutex::new(HashMap::new())),
            shutdown_reason: Arc::new(Mutex::new(None)),
            cancellation_token: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &KioskConfig {
        &self.config
    }

    pub fn camera(&self) -> Arc<CameraService> {
        Arc::clone(&self.camera)
    }

    pub fn relay(&self) -> Arc<RelayAdapter> {
        Arc::clone(&self.relay)
    }

    /// Token that stops the server when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Register components ahead of `run`
    pub async fn initialize(&self) -> Result<()> {
        info!("Initializing kiosk components");

        self.set_component_state(Component::Camera, ComponentState::Running)
            .await;
        self.set_component_state(
            Component::Locker,
            if self.relay.is_available() {
                ComponentState::Running
            } else {
                ComponentState::Failed
            },
        )
        .await;
        self.set_component_state(Component::Server, ComponentState::Stopped)
            .await;

        info!("All components initialized");
        Ok(())
    }
}
