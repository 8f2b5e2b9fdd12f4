use clap::Subcommand;
use serde::Serialize;

use crate::render::{CommandOutput, CommandResult};

mod config;

pub use config::{ConfigArgs, Profile, Settings};

#[derive(Subcommand, Clone)]
pub enum ConfigCommand {
    #[command(long_about = "Print the active profile after applying flags and environment.")]
    Read,
}

#[derive(Serialize)]
struct ProfileView {
    profile: String,
    #[serde(flatten)]
    settings: Profile,
}

impl ConfigCommand {
    pub fn run(self, settings: &Settings) -> CommandResult {
        match self {
            ConfigCommand::Read => Ok(CommandOutput::Object(Box::new(ProfileView {
                profile: settings.profile_name.clone(),
                settings: settings.profile.clone(),
            }))),
        }
    }
}
