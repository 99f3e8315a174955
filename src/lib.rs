//! kontinuous-deploy - deploy the Kontinuous CI/CD stack with kubectl
//!
//! A deployment renders the Kontinuous resources from templates, writes them
//! to two batch files and applies them in two phases: everything that can be
//! rendered up front first, then the controllers that need the ingress
//! addresses assigned to the API and dashboard services.
//!
//! # Modules
//!
//! - [`template`] - Manifest templates and rendering
//! - [`secret`] - Credentials blob stored in the Kontinuous secret
//! - [`persist`] - Append-only batch files
//! - [`kubectl`] - External kubectl invocations
//! - [`ingress`] - Parsing of service ingress status
//! - [`poll`] - Waiting for ingress addresses
//! - [`deploy`] - Deployment and teardown orchestration
//! - [`config`] - Settings file
//! - [`commands`] - CLI subcommands

pub mod commands;
pub mod config;
pub mod deploy;
pub mod error;
pub mod ingress;
pub mod kubectl;
pub mod persist;
pub mod poll;
pub mod secret;
pub mod template;

pub use error::{Error, Result};

use clap::{Parser, Subcommand};

use commands::SettingsArgs;

/// kontinuous-deploy - Deploy Kontinuous onto a Kubernetes cluster
#[derive(Parser, Debug)]
#[command(name = "kontinuous-deploy")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub settings: SettingsArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render, write and apply every Kontinuous resource
    Deploy(commands::deploy::DeployArgs),
    /// Delete the resources listed in the batch files
    Teardown(commands::teardown::TeardownArgs),
    /// Print the manifests a deploy would write, without side effects
    Render(commands::render::RenderArgs),
}

impl Cli {
    /// Run the CLI command
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Deploy(args) => commands::deploy::run(args, &self.settings).await,
            Commands::Teardown(args) => commands::teardown::run(args, &self.settings).await,
            Commands::Render(args) => commands::render::run(args, &self.settings).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "kontinuous-deploy",
            "teardown",
            "--specs-file",
            "/var/tmp/specs.yml",
            "--context",
            "staging",
        ])
        .unwrap();

        assert!(matches!(cli.command, Commands::Teardown(_)));
        assert_eq!(
            cli.settings.specs_file.as_deref(),
            Some(std::path::Path::new("/var/tmp/specs.yml"))
        );
        assert_eq!(cli.settings.context.as_deref(), Some("staging"));
    }

    #[test]
    fn render_accepts_addresses() {
        let cli = Cli::try_parse_from([
            "kontinuous-deploy",
            "render",
            "--namespace",
            "demo",
            "--access-key",
            "AK",
            "--secret-key",
            "SK",
            "--auth-code",
            "AUTH",
            "--client-id",
            "CID",
            "--client-secret",
            "CSEC",
            "--kontinuous-ip",
            "10.0.0.1",
            "--dashboard-ip",
            "10.0.0.2",
            "--ingress-format",
            "json",
        ])
        .unwrap();

        match cli.command {
            Commands::Render(args) => {
                assert_eq!(args.credentials.namespace, "demo");
                assert_eq!(args.kontinuous_ip.as_deref(), Some("10.0.0.1"));
                assert_eq!(args.dashboard_ip.as_deref(), Some("10.0.0.2"));
            }
            other => panic!("expected render, got {:?}", other),
        }
        assert_eq!(
            cli.settings.ingress_format,
            Some(kubectl::IngressFormat::Json)
        );
    }
}
