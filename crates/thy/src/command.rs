use clap::{Parser, Subcommand};
use thy_cli::Color;

use crate::{
    platform::{ConfigArgs, ConfigCommand},
    render::Output,
    secret::SecretCommand,
};

#[derive(Parser, Clone)]
#[command(name = "thy", version, about = "Command line client for the thy secrets vault", long_about = None)]
pub struct Cli {
    // Optional as a workaround for https://github.com/clap-rs/clap/issues/3572
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short = 'o', long, global = true, value_enum, default_value_t = Output::JSON)]
    pub output: Output,

    #[arg(short = 'c', long, global = true, value_enum, default_value_t = Color::Auto)]
    pub color: Color,

    #[command(flatten)]
    pub config: ConfigArgs,

    #[arg(
        short = 'v',
        long,
        global = true,
        help = "Log requests and cache decisions to stderr."
    )]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        help = "Don't return anything to stdout."
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    #[command(long_about = "Read and describe secrets.")]
    Secret {
        #[command(subcommand)]
        command: SecretCommand,
    },

    #[command(long_about = "Inspect CLI settings.")]
    CliConfig {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    #[command(long_about = "Generate shell completions.")]
    Completion {
        #[arg(long, help = "The shell to generate completions for.")]
        shell: Option<clap_complete::Shell>,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "thy",
            "secret",
            "read",
            "servers/db",
            "--cache-strategy",
            "cache.server",
            "--cache-age",
            "5",
            "-o",
            "yaml",
        ])
        .unwrap();

        assert_eq!(cli.output, Output::YAML);
        assert_eq!(cli.config.cache_strategy.as_deref(), Some("cache.server"));
        assert_eq!(cli.config.cache_age, Some(5));
        assert!(matches!(
            cli.command,
            Some(Commands::Secret {
                command: SecretCommand::Read(_)
            })
        ));
    }
}
