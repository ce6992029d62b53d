use super::guard::CapturePermit;
use crate::config::CameraConfig;
use crate::error::CaptureError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Locates the external still-capture program and prepares its invocation
pub trait CaptureTool: Send + Sync {
    /// Command that writes one still to `output`, or `None` if no tool is installed
    fn find_command(&self, output: &Path) -> Option<Command>;

    /// Human readable list of the tools this strategy looks for
    fn describe(&self) -> String;
}

/// Looks up capture executables on `PATH` in a fixed order
#[derive(Debug, Clone)]
pub struct PathCaptureTool {
    candidates: Vec<String>,
    preview_ms: u64,
    search_path: Option<OsString>,
}

impl PathCaptureTool {
    pub fn new(candidates: Vec<String>, preview_ms: u64) -> Self {
        Self {
            candidates,
            preview_ms,
            search_path: None,
        }
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        Self::new(config.tools.clone(), config.preview_ms)
    }

    /// Search this path list instead of the process `PATH`
    pub fn with_search_path<S: Into<OsString>>(mut self, search_path: S) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    /// First candidate present on the search path
    pub fn locate(&self) -> Option<PathBuf> {
        let search_path = self
            .search_path
            .clone()
            .or_else(|| std::env::var_os("PATH"))?;

        self.candidates
            .iter()
            .filter(|name| !name.trim().is_empty())
            .find_map(|name| {
                std::env::split_paths(&search_path)
                    .map(|dir| dir.join(name))
                    .find(|candidate| is_executable(candidate))
            })
    }
}

impl CaptureTool for PathCaptureTool {
    fn find_command(&self, output: &Path) -> Option<Command> {
        let program = self.locate()?;
        debug!("Using capture tool {}", program.display());

        let mut command = Command::new(program);
        command
            .arg("-n")
            .arg("-t")
            .arg(self.preview_ms.to_string())
            .arg("-o")
            .arg(output);
        Some(command)
    }

    fn describe(&self) -> String {
        self.candidates.join(" or ")
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Runs the capture tool against the latest-image path
pub struct CaptureInvoker {
    tool: Arc<dyn CaptureTool>,
    image_path: PathBuf,
}

impl CaptureInvoker {
    pub fn new(tool: Arc<dyn CaptureTool>, image_path: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            image_path: image_path.into(),
        }
    }

    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    /// Take one still. Blocks until the tool exits.
    pub fn capture(&self, _permit: &CapturePermit) -> Result<PathBuf, CaptureError> {
        let mut command = self.tool.find_command(&self.image_path).ok_or_else(|| {
            CaptureError::ToolNotFound {
                candidates: self.tool.describe(),
            }
        })?;

        let program = command.get_program().to_string_lossy().into_owned();
        info!("Capturing still with {} to {}", program, self.image_path.display());

        let output = command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| CaptureError::Spawn {
                tool: program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("{} exited with {}: {}", program, output.status, stderr);
            return Err(CaptureError::Failed { stderr });
        }

        Ok(self.image_path.clone())
    }
}
