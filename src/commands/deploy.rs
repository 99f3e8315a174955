//! Deploy command - render, write and apply every Kontinuous resource

use clap::Args;
use tracing::info;

use super::{build_deployer, CredentialArgs, SettingsArgs};
use crate::Result;

/// Deploy Kontinuous into a namespace
#[derive(Args, Debug)]
pub struct DeployArgs {
    #[command(flatten)]
    pub credentials: CredentialArgs,
}

pub async fn run(args: DeployArgs, settings: &SettingsArgs) -> Result<()> {
    let settings = settings.resolve()?;
    let deployer = build_deployer(&settings)?;

    let report = deployer.deploy(args.credentials.into_config()).await?;

    info!(
        specs = %report.paths.specs.display(),
        controllers = %report.paths.controllers.display(),
        "Manifests kept for teardown"
    );
    println!("Kontinuous deployed to namespace {}", report.namespace);
    println!("  API:       http://{}:8080", report.kontinuous_ip);
    println!("  Dashboard: http://{}:5000", report.dashboard_ip);
    Ok(())
}
