//! CLI commands

use std::path::PathBuf;

use clap::Args;

use crate::config::{load_settings, Settings};
use crate::deploy::Deployer;
use crate::kubectl::{IngressFormat, KubectlRunner};
use crate::template::DeploymentConfig;
use crate::Result;

pub mod deploy;
pub mod render;
pub mod teardown;

/// Options shared by every subcommand; each overrides the settings file
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Path to the settings file (default: $KONTINUOUS_DEPLOY_CONFIG or ~/.kontinuous/deploy.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// kubectl binary to invoke
    #[arg(long, global = true)]
    pub kubectl: Option<PathBuf>,

    /// Path to kubeconfig file passed to kubectl
    #[arg(long, global = true)]
    pub kubeconfig: Option<PathBuf>,

    /// kubeconfig context passed to kubectl
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// Where the first manifest batch is written
    #[arg(long, global = true)]
    pub specs_file: Option<PathBuf>,

    /// Where the controller batch is written
    #[arg(long, global = true)]
    pub controllers_file: Option<PathBuf>,

    /// Seconds between ingress address queries
    #[arg(long, global = true)]
    pub poll_interval_secs: Option<u64>,

    /// Give up waiting for an ingress address after this many seconds
    #[arg(long, global = true)]
    pub max_wait_secs: Option<u64>,

    /// Kill any kubectl invocation running longer than this many seconds
    #[arg(long, global = true)]
    pub command_timeout_secs: Option<u64>,

    /// Directory of template overrides (`<name>.yaml`)
    #[arg(long, global = true)]
    pub templates_dir: Option<PathBuf>,

    /// How to query service ingress status
    #[arg(long, value_enum, global = true)]
    pub ingress_format: Option<IngressFormat>,
}

impl SettingsArgs {
    /// Load the settings file and apply command-line overrides
    pub fn resolve(&self) -> Result<Settings> {
        let settings = load_settings(self.config.as_deref())?;
        let settings = self.apply(settings);
        settings.validate()?;
        Ok(settings)
    }

    fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(ref kubectl) = self.kubectl {
            settings.kubectl = kubectl.clone();
        }
        if self.kubeconfig.is_some() {
            settings.kubeconfig = self.kubeconfig.clone();
        }
        if self.context.is_some() {
            settings.context = self.context.clone();
        }
        if let Some(ref path) = self.specs_file {
            settings.specs_file = path.clone();
        }
        if let Some(ref path) = self.controllers_file {
            settings.controllers_file = path.clone();
        }
        if let Some(secs) = self.poll_interval_secs {
            settings.poll_interval_secs = secs;
        }
        if self.max_wait_secs.is_some() {
            settings.max_wait_secs = self.max_wait_secs;
        }
        if self.command_timeout_secs.is_some() {
            settings.command_timeout_secs = self.command_timeout_secs;
        }
        if self.templates_dir.is_some() {
            settings.templates_dir = self.templates_dir.clone();
        }
        if let Some(format) = self.ingress_format {
            settings.ingress_format = format;
        }
        settings
    }
}

/// Credentials and target namespace for one deployment
#[derive(Args, Debug, Clone)]
pub struct CredentialArgs {
    /// Namespace every resource is created in
    #[arg(long, env = "KONTINUOUS_NAMESPACE")]
    pub namespace: String,

    /// Object store access key
    #[arg(long, env = "S3_ACCESS_KEY", hide_env_values = true)]
    pub access_key: String,

    /// Object store secret key
    #[arg(long, env = "S3_SECRET_KEY", hide_env_values = true)]
    pub secret_key: String,

    /// Secret used by the API to sign auth tokens
    #[arg(long, env = "KONTINUOUS_AUTH_CODE", hide_env_values = true)]
    pub auth_code: String,

    /// GitHub OAuth application client ID
    #[arg(long, env = "GITHUB_CLIENT_ID")]
    pub client_id: String,

    /// GitHub OAuth application client secret
    #[arg(long, env = "GITHUB_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,
}

impl CredentialArgs {
    pub fn into_config(self) -> DeploymentConfig {
        DeploymentConfig::builder()
            .namespace(self.namespace)
            .access_key(self.access_key)
            .secret_key(self.secret_key)
            .auth_code(self.auth_code)
            .client_id(self.client_id)
            .client_secret(self.client_secret)
            .build()
    }
}

/// Deployer wired to the real kubectl as described by `settings`
pub fn build_deployer(settings: &Settings) -> Result<Deployer<KubectlRunner>> {
    Ok(Deployer::new(settings.kubectl_runner(), settings.renderer()?)
        .with_paths(settings.batch_paths())
        .with_poll_policy(settings.poll_policy())
        .with_ingress_format(settings.ingress_format))
}
