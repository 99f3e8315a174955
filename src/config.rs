//! Deploy settings stored in an optional YAML file.
//!
//! The settings file resolution chain (highest priority first):
//! 1. Explicit `--config` flag
//! 2. `KONTINUOUS_DEPLOY_CONFIG` environment variable
//! 3. `~/.kontinuous/deploy.yaml`
//! 4. Built-in defaults
//!
//! Command-line flags override whatever the file sets.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::deploy::{BatchPaths, CONTROLLERS_FILE, SPECS_FILE};
use crate::kubectl::{IngressFormat, KubectlRunner};
use crate::poll::{PollPolicy, DEFAULT_POLL_INTERVAL};
use crate::template::{ManifestRenderer, TemplateStore};
use crate::{Error, Result};

const CONFIG_DIR_NAME: &str = ".kontinuous";
const CONFIG_FILE_NAME: &str = "deploy.yaml";
const CONFIG_ENV: &str = "KONTINUOUS_DEPLOY_CONFIG";

/// Settings for talking to the cluster and laying out batch files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// kubectl binary, looked up on `PATH` unless absolute
    pub kubectl: PathBuf,
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
    pub specs_file: PathBuf,
    pub controllers_file: PathBuf,
    pub poll_interval_secs: u64,
    /// Give up waiting for ingress addresses after this long
    pub max_wait_secs: Option<u64>,
    /// Kill any single kubectl invocation after this long
    pub command_timeout_secs: Option<u64>,
    /// Directory of `<name>.yaml` files replacing built-in templates
    pub templates_dir: Option<PathBuf>,
    pub ingress_format: IngressFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            kubectl: PathBuf::from("kubectl"),
            kubeconfig: None,
            context: None,
            specs_file: PathBuf::from(SPECS_FILE),
            controllers_file: PathBuf::from(CONTROLLERS_FILE),
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
            max_wait_secs: None,
            command_timeout_secs: None,
            templates_dir: None,
            ingress_format: IngressFormat::default(),
        }
    }
}

impl Settings {
    /// Parse settings from YAML; missing keys take their defaults
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Settings::default());
        }
        let settings: Settings = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(Error::validation("pollIntervalSecs must be at least 1"));
        }
        if self.specs_file == self.controllers_file {
            return Err(Error::validation(format!(
                "specsFile and controllersFile must differ (both are {})",
                self.specs_file.display()
            )));
        }
        Ok(())
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(self.poll_interval_secs),
            max_wait: self.max_wait_secs.map(Duration::from_secs),
        }
    }

    pub fn batch_paths(&self) -> BatchPaths {
        BatchPaths {
            specs: self.specs_file.clone(),
            controllers: self.controllers_file.clone(),
        }
    }

    pub fn kubectl_runner(&self) -> KubectlRunner {
        KubectlRunner::new(&self.kubectl)
            .with_kubeconfig(self.kubeconfig.clone())
            .with_context(self.context.clone())
            .with_timeout(self.command_timeout_secs.map(Duration::from_secs))
    }

    /// Built-in templates, with overrides applied when `templates_dir` is set
    pub fn renderer(&self) -> Result<ManifestRenderer> {
        let store = match self.templates_dir {
            Some(ref dir) => TemplateStore::with_overrides(dir)?,
            None => TemplateStore::builtin(),
        };
        Ok(ManifestRenderer::new(store))
    }
}

/// Resolve the settings file path using the priority chain.
///
/// Returns `None` when no file is configured and the default does not exist.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    resolve_from(
        explicit,
        std::env::var(CONFIG_ENV).ok(),
        dirs::home_dir(),
    )
}

fn resolve_from(
    explicit: Option<&Path>,
    env: Option<String>,
    home: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Some(path) = env {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let default = home?.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
    default.exists().then_some(default)
}

/// Load settings from the resolved file, or defaults when there is none.
///
/// A path given explicitly or through the environment must exist.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    let Some(path) = resolve_config_path(explicit) else {
        debug!("No settings file, using defaults");
        return Ok(Settings::default());
    };
    read_settings(&path)
}

fn read_settings(path: &Path) -> Result<Settings> {
    let data = std::fs::read_to_string(path).map_err(|source| Error::SettingsRead {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "Loaded settings file");
    Settings::from_yaml(&data)
}
