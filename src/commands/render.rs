//! Render command - print manifests without touching disk or cluster

use std::io::Write;

use clap::Args;

use super::{CredentialArgs, SettingsArgs};
use crate::deploy::{render_controllers, render_specs};
use crate::template::{DeploymentConfig, ManifestRenderer};
use crate::{Error, Result};

/// Print the manifests a deploy would write
#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub credentials: CredentialArgs,

    /// Address to use for the API service (renders controllers with --dashboard-ip)
    #[arg(long)]
    pub kontinuous_ip: Option<String>,

    /// Address to use for the dashboard service (renders controllers with --kontinuous-ip)
    #[arg(long)]
    pub dashboard_ip: Option<String>,
}

pub async fn run(args: RenderArgs, settings: &SettingsArgs) -> Result<()> {
    let settings = settings.resolve()?;
    let renderer = settings.renderer()?;

    let mut config = args.credentials.into_config();
    config.kontinuous_ip = args.kontinuous_ip;
    config.dashboard_ip = args.dashboard_ip;

    let stdout = std::io::stdout();
    write_manifests(&renderer, config, &mut stdout.lock())
}

/// Write the first batch, and the controllers when both addresses are known
fn write_manifests<W: Write>(
    renderer: &ManifestRenderer,
    mut config: DeploymentConfig,
    out: &mut W,
) -> Result<()> {
    config.validate()?;
    if config.kontinuous_ip.is_some() != config.dashboard_ip.is_some() {
        return Err(Error::validation(
            "--kontinuous-ip and --dashboard-ip must be given together",
        ));
    }

    let mut manifests = render_specs(renderer, &mut config)?;
    if config.has_addresses() {
        manifests.extend(render_controllers(renderer, &config)?);
    }

    for manifest in manifests {
        out.write_all(manifest.as_bytes())?;
    }
    out.flush()?;
    Ok(())
}
