use clap::ValueEnum;
use color_eyre::{config::Theme, eyre::Result};

/// When to emit colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Color {
    /// Never color.
    No,
    /// Always color.
    Yes,
    /// Color when stdout is a terminal that supports it.
    Auto,
}

impl Color {
    /// Resolve `Auto` against the current stdout.
    pub fn is_enabled(self) -> bool {
        match self {
            Color::No => false,
            Color::Yes => true,
            Color::Auto => supports_color::on(supports_color::Stream::Stdout).is_some(),
        }
    }
}

/// Install the `color-eyre` error and panic hooks, colored only when `color` allows it.
pub fn install_color_eyre(color: Color) -> Result<()> {
    if color.is_enabled() {
        color_eyre::install()
    } else {
        color_eyre::config::HookBuilder::new()
            .theme(Theme::new())
            .install()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_choices_ignore_terminal() {
        assert!(Color::Yes.is_enabled());
        assert!(!Color::No.is_enabled());
    }

    #[test]
    fn test_parses_from_flag_values() {
        assert_eq!(Color::from_str("auto", true).unwrap(), Color::Auto);
        assert_eq!(Color::from_str("no", true).unwrap(), Color::No);
    }
}
