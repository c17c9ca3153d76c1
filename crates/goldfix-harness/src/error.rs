//! Fatal harness errors.
//!
//! Anything surfacing here aborts the remaining batch. Golden mismatches are
//! not errors; they are reported through [`crate::VerificationResult`].

use std::path::PathBuf;

use goldfix_exec::ExecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("tool exited with {} on {fixture}", render_exit(.code))]
    ToolExit { fixture: String, code: Option<i32> },
    #[error("golden file {} does not exist", .path.display())]
    GoldenMissing { path: PathBuf },
    #[error("failed removing shared output {}: {source}", .path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },
}

impl HarnessError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn render_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => String::from("a signal"),
    }
}
