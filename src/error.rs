//! Error types for kontinuous-deploy

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::template::TemplateError;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while rendering, persisting, applying or tearing down manifests
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("failed to write manifests to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read settings file {path}: {source}")]
    SettingsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("command failed: {message}")]
    CommandFailed { message: String },

    #[error("unrecognised ingress output for service {service}: {output:?}")]
    UnexpectedOutput { service: String, output: String },

    #[error("timed out after {waited:?} waiting for {description}")]
    PollTimeout {
        description: String,
        waited: Duration,
    },

    #[error("teardown failed: {}", join_failures(.failures))]
    TeardownFailed { failures: Vec<TeardownFailure> },

    #[error("validation error: {message}")]
    Validation { message: String },
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    pub fn command_failed(message: impl Into<String>) -> Self {
        Error::CommandFailed {
            message: message.into(),
        }
    }

    pub fn persist(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Persist {
            path: path.into(),
            source,
        }
    }
}

/// A batch file whose deletion failed during teardown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownFailure {
    pub path: PathBuf,
    pub reason: String,
}

impl fmt::Display for TeardownFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

fn join_failures(failures: &[TeardownFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
