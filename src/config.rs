use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct KioskConfig {
    pub server: ServerConfig,
    pub camera: CameraConfig,
    pub locker: LockerConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// IP address to bind to
    #[serde(default = "default_server_ip")]
    pub ip: String,

    /// Port to listen on
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Directory holding index.html and the rest of the kiosk UI
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// Allow cross-origin calls from any origin
    #[serde(default = "default_cors_permissive")]
    pub cors_permissive: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CameraConfig {
    /// Where the latest still is written (overwritten on every capture)
    #[serde(default = "default_image_path")]
    pub image_path: String,

    /// Capture executables to probe on PATH, in order
    #[serde(default = "default_capture_tools")]
    pub tools: Vec<String>,

    /// Warm-up time handed to the capture tool, in milliseconds
    #[serde(default = "default_preview_ms")]
    pub preview_ms: u64,

    /// Minimum time between accepted capture requests, in seconds
    #[serde(default = "default_min_interval_seconds")]
    pub min_interval_seconds: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LockerConfig {
    /// BCM pin number of the relay line
    #[serde(default = "default_gpio_pin")]
    pub gpio_pin: u32,

    /// Relay is energised by driving the line low
    #[serde(default = "default_active_low")]
    pub active_low: bool,

    /// How long the relay is held on for an open pulse, in seconds
    #[serde(default = "default_pulse_seconds")]
    pub pulse_seconds: f64,

    /// Root of the sysfs GPIO interface
    #[serde(default = "default_gpio_root")]
    pub gpio_root: String,
}

impl CameraConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_secs_f64(self.min_interval_seconds)
    }
}

impl LockerConfig {
    pub fn pulse_duration(&self) -> Duration {
        Duration::from_secs_f64(self.pulse_seconds)
    }
}

impl KioskConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("kiosk.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("server.ip", default_server_ip())?
            .set_default("server.port", default_server_port())?
            .set_default("server.static_dir", default_static_dir())?
            .set_default("server.cors_permissive", default_cors_permissive())?
            .set_default("camera.image_path", default_image_path())?
            .set_default("camera.tools", default_capture_tools())?
            .set_default("camera.preview_ms", default_preview_ms())?
            .set_default(
                "camera.min_interval_seconds",
                default_min_interval_seconds(),
            )?
            .set_default("locker.gpio_pin", default_gpio_pin())?
            .set_default("locker.active_low", default_active_low())?
            .set_default("locker.pulse_seconds", default_pulse_seconds())?
            .set_default("locker.gpio_root", default_gpio_root())?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // KIOSK_SERVER__PORT=9000 style overrides
            .add_source(
                Environment::with_prefix("KIOSK")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: KioskConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if self.camera.image_path.trim().is_empty() {
            return Err(ConfigError::Message(
                "Camera image_path must not be empty".to_string(),
            ));
        }

        if self.camera.tools.iter().all(|tool| tool.trim().is_empty()) {
            return Err(ConfigError::Message(
                "At least one camera capture tool must be configured".to_string(),
            ));
        }

        if Duration::try_from_secs_f64(self.camera.min_interval_seconds).is_err() {
            return Err(ConfigError::Message(format!(
                "Camera min_interval_seconds must be a non-negative duration, got {}",
                self.camera.min_interval_seconds
            )));
        }

        match Duration::try_from_secs_f64(self.locker.pulse_seconds) {
            Ok(pulse) if !pulse.is_zero() => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Locker pulse_seconds must be a positive duration, got {}",
                    self.locker.pulse_seconds
                )))
            }
        }

        Ok(())
    }
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                ip: default_server_ip(),
                port: default_server_port(),
                static_dir: default_static_dir(),
                cors_permissive: default_cors_permissive(),
            },
            camera: CameraConfig {
                image_path: default_image_path(),
                tools: default_capture_tools(),
                preview_ms: default_preview_ms(),
                min_interval_seconds: default_min_interval_seconds(),
            },
            locker: LockerConfig {
                gpio_pin: default_gpio_pin(),
                active_low: default_active_low(),
                pulse_seconds: default_pulse_seconds(),
                gpio_root: default_gpio_root(),
            },
        }
    }
}

// Default value functions
fn default_server_ip() -> String {
    "0.0.0.0".to_string()
}
fn default_server_port() -> u16 {
    8000
}
fn default_static_dir() -> String {
    "./static".to_string()
}
fn default_cors_permissive() -> bool {
    true
}

fn default_image_path() -> String {
    "./latest.jpg".to_string()
}
fn default_capture_tools() -> Vec<String> {
    vec!["rpicam-still".to_string(), "libcamera-still".to_string()]
}
fn default_preview_ms() -> u64 {
    200
}
fn default_min_interval_seconds() -> f64 {
    0.8
}

fn default_gpio_pin() -> u32 {
    17
}
fn default_active_low() -> bool {
    true
}
fn default_pulse_seconds() -> f64 {
    1.0
}
fn default_gpio_root() -> String {
    "/sys/class/gpio".to_string()
}
