//! Error types and handling for `suite_runner`.
//!
//! Only configuration problems and unexpected I/O surface as errors to the
//! operator. Suite failures are data (`SuiteResult` with a failed status),
//! and auxiliary failures (coverage summaries, resume persistence) degrade
//! to empty output instead of propagating.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Supports `anyhow` integration for ad-hoc context
//! - Provides recovery hints for user-facing errors

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `suite_runner` operations.
#[derive(Error, Debug)]
pub enum RunnerError {
    // === Configuration Errors ===
    /// Configuration file or value error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A command-line or configuration value could not be interpreted.
    #[error("Invalid value for {flag}: {reason}")]
    InvalidArgument { flag: String, reason: String },

    /// The orchestration root does not exist or is not a directory.
    #[error("Root directory not found: '{path}'")]
    RootNotFound { path: PathBuf },

    // === Process Errors ===
    /// The suite's program could not be started for a reason other than
    /// it being absent from `PATH`.
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    // === Coverage Errors ===
    /// Coverage data store could not be loaded or analyzed.
    #[error("Coverage data error: {0}")]
    Coverage(String),

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Wrapped anyhow error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RunnerError {
    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::RootNotFound { .. } => Some("Pass --root pointing at the repository checkout"),
            Self::InvalidArgument { .. } => {
                Some("Quote extra arguments as one shell string, e.g. --backend-args \"-k smoke\"")
            }
            Self::Config(_) | Self::Yaml(_) => Some("Check suite-runner.yaml and SUITE_RUNNER_* variables"),
            _ => None,
        }
    }

    /// Get the process exit code for this error.
    ///
    /// Exit code 1 is reserved for "a suite failed", so operator errors use 2.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        2
    }

    /// Create an invalid-argument error for a specific flag or key.
    #[must_use]
    pub fn invalid_argument(flag: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            flag: flag.into(),
            reason: reason.into(),
        }
    }
}

/// Result type using `RunnerError`.
pub type Result<T> = std::result::Result<T, RunnerError>;
