//! External tool execution adapter for goldfix harness tooling.
//!
//! The harness never links against the compiler under test. It shells out to
//! it once per fixture and reads back whatever the tool produced, either from
//! the shared `output.txt` file the tool writes as a side effect or from its
//! standard output.

#![forbid(unsafe_code)]

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default location the compiler writes its listing to.
pub const DEFAULT_SHARED_OUTPUT: &str = "output.txt";

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("tool produced no output at {}", .path.display())]
    CaptureMissing { path: PathBuf },
    #[error("failed reading tool output {}: {source}", .path.display())]
    CaptureRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Compiler switch selecting which listing the tool prints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolMode {
    /// `-l`: token table.
    #[default]
    Lex,
    /// `-s`: expression parse tree.
    Syntax,
    /// `-t`: type check result.
    Types,
}

impl ToolMode {
    #[must_use]
    pub fn flag(self) -> &'static str {
        match self {
            Self::Lex => "-l",
            Self::Syntax => "-s",
            Self::Types => "-t",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lex => "lex",
            Self::Syntax => "syntax",
            Self::Types => "types",
        }
    }

    /// Accepts both the mode name and the raw compiler switch.
    #[must_use]
    pub fn from_str_loose(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "lex" | "l" | "-l" => Some(Self::Lex),
            "syntax" | "s" | "-s" => Some(Self::Syntax),
            "types" | "t" | "-t" => Some(Self::Types),
            _ => None,
        }
    }
}

/// Where the tool's result is read from after it exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capture {
    /// A fixed file the tool writes as a side effect, relative to the working
    /// directory unless absolute. Shared by every invocation.
    SharedFile(PathBuf),
    /// The tool's standard output, captured in memory per invocation.
    Stdout,
}

impl Default for Capture {
    fn default() -> Self {
        Self::SharedFile(PathBuf::from(DEFAULT_SHARED_OUTPUT))
    }
}

impl Capture {
    /// Path of the shared artifact inside `workdir`, if this capture uses one.
    #[must_use]
    pub fn shared_path(&self, workdir: &Path) -> Option<PathBuf> {
        match self {
            Self::SharedFile(path) => Some(workdir.join(path)),
            Self::Stdout => None,
        }
    }

    /// Read the result of `run` back from this capture location.
    pub fn read(&self, workdir: &Path, run: &ToolRun) -> Result<Vec<u8>, ExecError> {
        match self {
            Self::Stdout => Ok(run.stdout.clone().unwrap_or_default()),
            Self::SharedFile(path) => {
                let path = workdir.join(path);
                std::fs::read(&path).map_err(|source| {
                    if source.kind() == ErrorKind::NotFound {
                        ExecError::CaptureMissing { path }
                    } else {
                        ExecError::CaptureRead { path, source }
                    }
                })
            }
        }
    }
}

/// Command line used to reach the compiler artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    /// Executable to spawn (e.g. `java`).
    pub program: String,
    /// Arguments placed before the mode switch (e.g. `-jar pascal_compiler.jar`).
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for ToolCommand {
    fn default() -> Self {
        Self {
            program: String::from("java"),
            args: vec![String::from("-jar"), String::from("pascal_compiler.jar")],
        }
    }
}

impl ToolCommand {
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Full argument vector for one fixture: leading args, mode switch, input.
    #[must_use]
    pub fn argv(&self, mode: ToolMode, input: &str) -> Vec<OsString> {
        let mut argv: Vec<OsString> = self.args.iter().map(OsString::from).collect();
        argv.push(OsString::from(mode.flag()));
        argv.push(OsString::from(input));
        argv
    }

    /// Human-readable rendering for reports and logs.
    #[must_use]
    pub fn display(&self) -> String {
        let mut out = self.program.clone();
        for arg in &self.args {
            out.push(' ');
            out.push_str(arg);
        }
        out
    }

    /// Run the tool on `input` inside `workdir` and wait for it to exit.
    ///
    /// Blocks with no timeout. Stdout is kept only when `capture` asks for
    /// it; stderr passes through to the caller's terminal.
    pub fn run(
        &self,
        mode: ToolMode,
        input: &str,
        workdir: &Path,
        capture: &Capture,
    ) -> Result<ToolRun, ExecError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.argv(mode, input))
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit());

        let started = Instant::now();
        let launch_err = |source: std::io::Error| ExecError::Launch {
            program: self.program.clone(),
            source,
        };
        let run = match capture {
            Capture::Stdout => {
                let output = cmd.stdout(Stdio::piped()).output().map_err(launch_err)?;
                ToolRun {
                    exit_code: output.status.code(),
                    success: output.status.success(),
                    stdout: Some(output.stdout),
                    duration: started.elapsed(),
                }
            }
            Capture::SharedFile(_) => {
                let status = cmd.stdout(Stdio::null()).status().map_err(launch_err)?;
                ToolRun {
                    exit_code: status.code(),
                    success: status.success(),
                    stdout: None,
                    duration: started.elapsed(),
                }
            }
        };
        Ok(run)
    }
}

/// Outcome of a single tool process.
#[derive(Debug, Clone)]
pub struct ToolRun {
    /// Exit code; `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub success: bool,
    /// Captured standard output (only for [`Capture::Stdout`]).
    pub stdout: Option<Vec<u8>>,
    pub duration: Duration,
}
