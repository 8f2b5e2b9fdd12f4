#![doc = include_str!("../README.md")]

use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use color_eyre::eyre::Result;
use thy_cli::install_color_eyre;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    prelude::__tracing_subscriber_SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter,
};

use crate::{command::*, platform::Settings, render::CommandResult};

mod command;
mod platform;
mod render;
mod secret;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // the log level hierarchy is determined by:
    //    - if RUST_LOG is detected at runtime
    //    - if --verbose is passed
    //    - default to WARN
    let level = if cli.verbose {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        // parse directives from the RUST_LOG environment variable,
        // overriding the default directive for matching targets.
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    install_color_eyre(cli.color)?;
    let render_config = render::RenderConfig::new(&cli);

    let Some(command) = cli.command else {
        let mut cmd = Cli::command();
        cmd.print_help()?;
        return Ok(());
    };

    let result = process_commands(command, &cli.config).await;

    // Render the result of the command
    render_config.render_result(result)
}

async fn process_commands(command: Commands, config: &platform::ConfigArgs) -> CommandResult {
    match command {
        Commands::Secret { command } => {
            let settings = Settings::load(config)?;
            command.run(&settings).await
        }

        Commands::CliConfig { command } => {
            let settings = Settings::load(config)?;
            command.run(&settings)
        }

        Commands::Completion { shell } => {
            let Some(shell) = shell.or_else(Shell::from_env) else {
                return Ok(
                    "Couldn't autodetect a valid shell. Run `thy completion --help` for more info."
                        .into(),
                );
            };

            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(().into())
        }
    }
}
