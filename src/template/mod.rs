//! Manifest templating
//!
//! Templates use minijinja's default `{{ ... }}` placeholder syntax. The
//! rendering context is a [`DeploymentConfig`]; placeholders whose value is
//! not known yet are undefined and fail the render.

mod context;
mod engine;
mod error;
mod filters;
mod renderer;
mod store;

pub use context::{DeploymentConfig, DeploymentConfigBuilder};
pub use engine::TemplateEngine;
pub use error::TemplateError;
pub use renderer::ManifestRenderer;
pub use store::{ManifestKind, TemplateStore};
