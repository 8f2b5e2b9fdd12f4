use clap::ValueEnum;
use thy_cli::Color;
use tracing::debug;

use crate::command::Cli;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::upper_case_acronyms)]
pub(crate) enum Output {
    JSON,
    YAML,
    None,
}

pub enum CommandOutput {
    Plain(String),
    Object(Box<dyn erased_serde::Serialize>),
}
pub type CommandResult = color_eyre::eyre::Result<CommandOutput>;

impl From<&str> for CommandOutput {
    fn from(text: &str) -> Self {
        CommandOutput::Plain(text.to_owned())
    }
}
impl From<String> for CommandOutput {
    fn from(text: String) -> Self {
        CommandOutput::Plain(text)
    }
}
impl From<()> for CommandOutput {
    fn from(_: ()) -> Self {
        CommandOutput::Plain(String::new())
    }
}

impl CommandOutput {
    /// Wrap a raw API response body. JSON bodies are re-rendered in the chosen output format,
    /// anything else is printed as text.
    pub fn response(body: &[u8]) -> Self {
        match serde_json::from_slice::<serde_json::Value>(body) {
            Ok(value) => CommandOutput::Object(Box::new(value)),
            Err(_) => CommandOutput::Plain(String::from_utf8_lossy(body).into_owned()),
        }
    }
}

pub struct RenderConfig {
    pub output: Output,
    pub color: Color,
    pub quiet: bool,
}

impl RenderConfig {
    pub fn new(cli: &Cli) -> Self {
        Self {
            output: cli.output,
            color: cli.color,
            quiet: cli.quiet,
        }
    }

    pub fn render_result(&self, result: CommandResult) -> color_eyre::eyre::Result<()> {
        if self.quiet || self.output == Output::None {
            return result.map(|_| ());
        }

        fn pretty_print(language: &str, data: &str, color: Color) {
            if color.is_enabled() {
                let printed = bat::PrettyPrinter::new()
                    .input_from_bytes(data.as_bytes())
                    .language(language)
                    .print();
                if let Err(e) = printed {
                    debug!("Falling back to plain output: {e}");
                    print!("{}", data);
                }
            } else {
                print!("{}", data);
            }
        }

        match result {
            // Errors will be passed through to the caller, and rendered by the main function
            Err(e) => Err(e),

            Ok(CommandOutput::Plain(text)) if text.is_empty() => Ok(()),

            // Plain text is just output as is
            Ok(CommandOutput::Plain(text)) => {
                println!("{}", text);
                Ok(())
            }

            // For objects, we serialize them based on the output format,
            Ok(CommandOutput::Object(obj)) => {
                match self.output {
                    Output::JSON => {
                        let mut json = serde_json::to_string_pretty(&*obj)?;
                        // Yaml serialization adds a newline at the end, so we do the same
                        // here for consistency
                        json.push('\n');
                        pretty_print("json", &json, self.color);
                    }
                    Output::YAML => {
                        let yaml = serde_yaml::to_string(&*obj)?;
                        pretty_print("yaml", &yaml, self.color);
                    }
                    Output::None => {}
                }
                Ok(())
            }
        }
    }
}
