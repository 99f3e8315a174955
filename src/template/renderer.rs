//! Manifest renderer
//!
//! Pairs the template store with the engine: `render(kind, config)` looks up
//! the body for `kind` and fills it from the deployment config.

use tracing::debug;

use super::context::DeploymentConfig;
use super::engine::TemplateEngine;
use super::error::TemplateError;
use super::store::{ManifestKind, TemplateStore};

/// Renders manifests from a fixed template store
#[derive(Default)]
pub struct ManifestRenderer {
    store: TemplateStore,
    engine: TemplateEngine,
}

impl ManifestRenderer {
    pub fn new(store: TemplateStore) -> Self {
        Self {
            store,
            engine: TemplateEngine::new(),
        }
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    /// Render the manifest for one resource
    pub fn render(
        &self,
        kind: ManifestKind,
        config: &DeploymentConfig,
    ) -> Result<String, TemplateError> {
        debug!(
            template = %kind,
            overridden = self.store.is_overridden(kind),
            "Rendering manifest"
        );
        self.engine
            .render(kind.name(), self.store.get(kind), config)
    }

    /// Render several manifests, preserving order
    pub fn render_all(
        &self,
        kinds: &[ManifestKind],
        config: &DeploymentConfig,
    ) -> Result<Vec<String>, TemplateError> {
        kinds.iter().map(|kind| self.render(*kind, config)).collect()
    }
}
