//! Template error types

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur during template operations
#[derive(Debug)]
pub enum TemplateError {
    /// Template rendering failed (syntax error or undefined placeholder)
    Render(minijinja::Error),
    /// Override template file could not be read
    Load {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl TemplateError {
    /// Create a load error for an override template file
    pub fn load(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Load {
            path: path.into(),
            source,
        }
    }

    /// Whether the failure was a placeholder with no value in the context
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Render(e) if e.kind() == minijinja::ErrorKind::UndefinedError)
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render(e) => write!(f, "template render error: {:#}", e),
            Self::Load { path, source } => {
                write!(f, "failed to load template {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for TemplateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(e) => Some(e),
            Self::Load { source, .. } => Some(source),
        }
    }
}

impl From<minijinja::Error> for TemplateError {
    fn from(err: minijinja::Error) -> Self {
        Self::Render(err)
    }
}
