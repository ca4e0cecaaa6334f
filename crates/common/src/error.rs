//! Error types shared across Reelcut crates.

use std::path::PathBuf;

/// Top-level error type for Reelcut operations.
#[derive(Debug, thiserror::Error)]
pub enum ReelcutError {
    /// Input rejected before any external process is spawned.
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Probe error: {message}")]
    Probe { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Project error: {message}")]
    Project { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A required engine binary could not be located on any configured path.
    #[error("{tool} not found (searched {} location(s))", .searched.len())]
    ToolNotFound { tool: String, searched: Vec<PathBuf> },

    /// The external engine exited unsuccessfully.
    #[error("{} failed with {}: {}", program(.args), exit_label(.code), .stderr.trim())]
    ProcessFailed {
        code: Option<i32>,
        args: Vec<String>,
        stderr: String,
    },

    /// The run was stopped on request. Not a failure.
    #[error("Operation cancelled")]
    Cancelled,

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ReelcutError.
pub type ReelcutResult<T> = Result<T, ReelcutError>;

impl ReelcutError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn project(msg: impl Into<String>) -> Self {
        Self::Project {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

fn program(args: &[String]) -> &str {
    args.first().map(String::as_str).unwrap_or("process")
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}
