use thiserror::Error;

#[derive(Error, Debug)]
pub enum KioskError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Locker error: {0}")]
    Locker(#[from] LockerError),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    #[error("System error: {message}")]
    System { message: String },
}

/// Failures on the camera capture path
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("too many requests")]
    TooSoon,

    #[error("camera is busy")]
    Busy,

    #[error("{candidates} is not installed")]
    ToolNotFound { candidates: String },

    #[error("camera command failed")]
    Failed { stderr: String },

    #[error("failed to start capture tool {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("capture worker failed: {details}")]
    Worker { details: String },
}

/// Failures on the locker relay path
#[derive(Error, Debug)]
pub enum LockerError {
    #[error("GPIO not available")]
    Unavailable,

    #[error("failed to bind GPIO {pin}: {source}")]
    Init {
        pin: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to drive GPIO {pin}: {source}")]
    Write {
        pin: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("relay worker failed: {details}")]
    Worker { details: String },
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    BindFailed {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {details}")]
    Serve { details: String },
}

impl KioskError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }
}

impl CaptureError {
    /// Rejections come from the guard, everything else from the invocation
    pub fn is_rejection(&self) -> bool {
        matches!(self, CaptureError::TooSoon | CaptureError::Busy)
    }
}

pub type Result<T> = std::result::Result<T, KioskError>;
