//! Run configuration.
//!
//! A JSON file can supply every setting; CLI flags override it field by field.

use std::path::{Path, PathBuf};

use goldfix_exec::{Capture, DEFAULT_SHARED_OUTPUT, ToolCommand, ToolMode};
use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

/// What to do with a golden file whose content differs from the tool output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaselinePolicy {
    /// Report mismatches, never write.
    #[default]
    Verify,
    /// Report mismatches and record the actual output as the new baseline.
    Update,
}

impl BaselinePolicy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Verify => "verify",
            Self::Update => "update",
        }
    }
}

/// How a non-zero tool exit status is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitPolicy {
    /// Abort the batch with [`HarnessError::ToolExit`].
    #[default]
    Fail,
    /// Ignore the status and compare whatever the capture holds.
    Ignore,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureKind {
    #[default]
    SharedFile,
    Stdout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Directory holding `<name>.in` / `<name>.out` pairs. The tool runs here.
    pub fixture_dir: PathBuf,
    pub tool: ToolCommand,
    pub mode: ToolMode,
    pub capture: CaptureKind,
    /// Shared output file, relative to `fixture_dir`.
    pub output_file: PathBuf,
    pub policy: BaselinePolicy,
    pub exit_policy: ExitPolicy,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            fixture_dir: PathBuf::from("."),
            tool: ToolCommand::default(),
            mode: ToolMode::default(),
            capture: CaptureKind::default(),
            output_file: PathBuf::from(DEFAULT_SHARED_OUTPUT),
            policy: BaselinePolicy::default(),
            exit_policy: ExitPolicy::default(),
        }
    }
}

impl HarnessConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, HarnessError> {
        let content = std::fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        Self::from_json(&content).map_err(|e| HarnessError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    #[must_use]
    pub fn capture(&self) -> Capture {
        match self.capture {
            CaptureKind::SharedFile => Capture::SharedFile(self.output_file.clone()),
            CaptureKind::Stdout => Capture::Stdout,
        }
    }
}
