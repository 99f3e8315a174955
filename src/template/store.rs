//! Manifest template store
//!
//! One template per logical resource. The built-in bodies are compiled into
//! the binary from `templates/`; an override directory may replace any of
//! them at start-up by providing a file with the same name.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use tracing::info;

use super::error::TemplateError;

const SECRET_TEMPLATE: &str = include_str!("../../templates/secret.yaml");
const MINIO_TEMPLATE: &str = include_str!("../../templates/minio.yaml");
const ETCD_TEMPLATE: &str = include_str!("../../templates/etcd.yaml");
const REGISTRY_TEMPLATE: &str = include_str!("../../templates/registry.yaml");
const KONTINUOUS_SERVICE_TEMPLATE: &str = include_str!("../../templates/kontinuous-service.yaml");
const KONTINUOUS_RC_TEMPLATE: &str = include_str!("../../templates/kontinuous-rc.yaml");
const DASHBOARD_SERVICE_TEMPLATE: &str = include_str!("../../templates/dashboard-service.yaml");
const DASHBOARD_RC_TEMPLATE: &str = include_str!("../../templates/dashboard-rc.yaml");

/// The resources a deployment renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ManifestKind {
    /// Secret wrapping the encoded credentials blob
    Secret,
    /// Minio object store (service + controller)
    ObjectStore,
    /// etcd key-value store (service + controller)
    KeyValueStore,
    /// Internal container registry (service + controller)
    Registry,
    /// Kontinuous API load-balanced service
    AppService,
    /// Kontinuous API replication controller
    AppController,
    /// Dashboard load-balanced service
    DashboardService,
    /// Dashboard replication controller
    DashboardController,
}

impl ManifestKind {
    /// Every manifest kind, in batch order
    pub const ALL: [ManifestKind; 8] = [
        ManifestKind::Secret,
        ManifestKind::ObjectStore,
        ManifestKind::KeyValueStore,
        ManifestKind::Registry,
        ManifestKind::AppService,
        ManifestKind::DashboardService,
        ManifestKind::AppController,
        ManifestKind::DashboardController,
    ];

    /// Template name, also the override file stem
    pub fn name(self) -> &'static str {
        match self {
            ManifestKind::Secret => "secret",
            ManifestKind::ObjectStore => "minio",
            ManifestKind::KeyValueStore => "etcd",
            ManifestKind::Registry => "registry",
            ManifestKind::AppService => "kontinuous-service",
            ManifestKind::AppController => "kontinuous-rc",
            ManifestKind::DashboardService => "dashboard-service",
            ManifestKind::DashboardController => "dashboard-rc",
        }
    }

    /// Whether the manifest embeds runtime-assigned ingress addresses
    pub fn needs_addresses(self) -> bool {
        matches!(
            self,
            ManifestKind::AppController | ManifestKind::DashboardController
        )
    }

    fn builtin(self) -> &'static str {
        match self {
            ManifestKind::Secret => SECRET_TEMPLATE,
            ManifestKind::ObjectStore => MINIO_TEMPLATE,
            ManifestKind::KeyValueStore => ETCD_TEMPLATE,
            ManifestKind::Registry => REGISTRY_TEMPLATE,
            ManifestKind::AppService => KONTINUOUS_SERVICE_TEMPLATE,
            ManifestKind::AppController => KONTINUOUS_RC_TEMPLATE,
            ManifestKind::DashboardService => DASHBOARD_SERVICE_TEMPLATE,
            ManifestKind::DashboardController => DASHBOARD_RC_TEMPLATE,
        }
    }
}

impl fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable mapping from manifest kind to template body
#[derive(Debug, Clone)]
pub struct TemplateStore {
    templates: BTreeMap<ManifestKind, Cow<'static, str>>,
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateStore {
    /// Store holding only the compiled-in templates
    pub fn builtin() -> Self {
        let templates = ManifestKind::ALL
            .into_iter()
            .map(|kind| (kind, Cow::Borrowed(kind.builtin())))
            .collect();
        Self { templates }
    }

    /// Built-in templates, replaced by `<dir>/<name>.yaml` where such a file exists
    ///
    /// Override bodies are syntax-checked here so a broken file fails at
    /// start-up rather than halfway through a deployment.
    pub fn with_overrides(dir: &Path) -> Result<Self, TemplateError> {
        let mut store = Self::builtin();

        for kind in ManifestKind::ALL {
            let path = dir.join(format!("{}.yaml", kind.name()));
            let body = match std::fs::read_to_string(&path) {
                Ok(body) => body,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(TemplateError::load(path, e)),
            };

            super::TemplateEngine::validate_syntax(kind.name(), &body)?;
            info!(template = %kind, path = %path.display(), "Using template override");
            store.templates.insert(kind, Cow::Owned(body));
        }

        Ok(store)
    }

    /// Template body for a manifest kind
    pub fn get(&self, kind: ManifestKind) -> &str {
        self.templates
            .get(&kind)
            .map(|body| body.as_ref())
            .unwrap_or_else(|| kind.builtin())
    }

    /// Whether the body for `kind` came from an override file
    pub fn is_overridden(&self, kind: ManifestKind) -> bool {
        matches!(self.templates.get(&kind), Some(Cow::Owned(_)))
    }
}
