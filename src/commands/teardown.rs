//! Teardown command - delete everything a previous deploy applied

use clap::Args;

use super::{build_deployer, SettingsArgs};
use crate::Result;

/// Delete the resources listed in both batch files
#[derive(Args, Debug)]
pub struct TeardownArgs {}

pub async fn run(_args: TeardownArgs, settings: &SettingsArgs) -> Result<()> {
    let settings = settings.resolve()?;
    build_deployer(&settings)?.teardown().await
}
