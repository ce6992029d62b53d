use super::invoker::CaptureTool;
use std::path::Path;
use std::process::Command;

/// Capture tool backed by a shell snippet.
///
/// The output path is passed to the script as `$1`.
#[derive(Debug, Clone)]
pub struct ScriptCaptureTool {
    script: String,
}

impl ScriptCaptureTool {
    pub fn new<S: Into<String>>(script: S) -> Self {
        Self {
            script: script.into(),
        }
    }
}

impl CaptureTool for ScriptCaptureTool {
    fn find_command(&self, output: &Path) -> Option<Command> {
        let mut command = Command::new("sh");
        command.arg("-c").arg(&self.script).arg("sh").arg(output);
        Some(command)
    }

    fn describe(&self) -> String {
        "script-still".to_string()
    }
}
