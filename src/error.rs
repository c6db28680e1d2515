//! Failure taxonomy for a single predictor invocation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::consts::BUILD_HINT;
use crate::events::Terminal;

/// The child process could not be started.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("Executable not found at: {}\n{}", .path.display(), BUILD_HINT)]
    NotFound { path: PathBuf },

    #[error("Failed to start process {}: {source}", .path.display())]
    Other {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Why an invocation did not produce a prediction.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error(transparent)]
    Spawn(#[from] SpawnError),

    /// Non-zero exit, or termination by signal when `code` is `None`.
    #[error("{}. Error: {message}", describe_exit(.code))]
    Execution { code: Option<i32>, message: String },

    #[error("Failed to parse JSON: {message}. Output: {output}")]
    Parse { message: String, output: String },

    /// The child ran cleanly but reported failure in its own result.
    #[error("{0}")]
    Application(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("Process exited with code {code}"),
        None => "Process terminated by signal".to_string(),
    }
}

impl InvokeError {
    /// The lifecycle state this failure ends in.
    pub fn terminal(&self) -> Terminal {
        match self {
            InvokeError::Spawn(_) => Terminal::SpawnFailed,
            InvokeError::Execution { .. } => Terminal::ExecutionFailed,
            InvokeError::Parse { .. } => Terminal::ParseFailed,
            InvokeError::Application(_) => Terminal::ApplicationFailed,
        }
    }
}

/// A request that cannot be turned into command-line arguments.
#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("area must be a finite number, got {0}")]
    NonFinite(f64),
}
