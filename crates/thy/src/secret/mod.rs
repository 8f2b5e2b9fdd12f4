use std::sync::Arc;

use clap::{Args, Subcommand};
use thy_api::{ApiError, HttpTransport, ResourceLocator};
use thy_cache::{bust_cache, SecretCache, SecretView};

use crate::{
    platform::Settings,
    render::{CommandOutput, CommandResult},
};

#[derive(Args, Clone, Debug)]
pub struct LocatorArgs {
    #[arg(value_name = "PATH", help = "Path of the secret, e.g. servers/db or servers:db.")]
    pub target: Option<String>,

    #[arg(long, help = "Path of the secret. Takes precedence over [PATH].")]
    pub path: Option<String>,

    #[arg(long, help = "Id of the secret.")]
    pub id: Option<String>,
}

impl LocatorArgs {
    fn locator(&self) -> Result<ResourceLocator, ApiError> {
        let path = self
            .path
            .clone()
            .filter(|p| !p.is_empty())
            .or_else(|| self.target.clone());
        ResourceLocator::new(path, self.id.clone())
    }
}

#[derive(Args, Clone, Debug)]
pub struct ReadArgs {
    #[command(flatten)]
    pub locator: LocatorArgs,

    #[arg(long = "version", value_name = "N", help = "Read a previous version of the secret.")]
    pub secret_version: Option<u32>,

    #[arg(long, help = "Read the secret for editing. Bypasses the cache.")]
    pub edit: bool,
}

#[derive(Subcommand, Clone, Debug)]
pub enum SecretCommand {
    #[command(long_about = "Read a secret, honoring the configured cache strategy.")]
    Read(ReadArgs),

    #[command(long_about = "Read the description of a secret, without its data.")]
    Describe(LocatorArgs),

    #[command(
        long_about = "Remove all cached secrets and descriptions of the profile from the local store."
    )]
    Bustcache,
}

impl SecretCommand {
    pub async fn run(self, settings: &Settings) -> CommandResult {
        match self {
            SecretCommand::Read(args) => {
                let locator = args.locator.locator()?;
                let view = args
                    .secret_version
                    .map_or(SecretView::Current, SecretView::Version);

                let body = secret_cache(settings)?
                    .read(&locator, args.edit, view)
                    .await?;
                Ok(CommandOutput::response(&body))
            }
            SecretCommand::Describe(args) => {
                let locator = args.locator()?;

                let body = secret_cache(settings)?.describe(&locator).await?;
                Ok(CommandOutput::response(&body))
            }
            SecretCommand::Bustcache => {
                bust_cache(settings.store()?.as_ref(), &settings.cache_scope()).await?;
                Ok(().into())
            }
        }
    }
}

fn secret_cache(settings: &Settings) -> color_eyre::eyre::Result<SecretCache> {
    let api = settings.api_configuration()?;
    let transport = HttpTransport::new(&api)?;

    Ok(SecretCache::new(
        settings.cache_config()?,
        settings.store()?,
        Arc::new(transport),
        api,
    ))
}
