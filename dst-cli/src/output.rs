//! Output formatting shared by every subcommand.

use std::fmt;

use serde::Serialize;

/// Output format selection for all subcommands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Single JSON object on stdout.
    Json,
    /// Human-readable summary on stdout.
    #[default]
    Human,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Human => write!(f, "human"),
        }
    }
}

/// Write a successful result to stdout.
///
/// - **Json**: a single JSON object, no extraneous text.
/// - **Human**: the caller-supplied human-readable rendering.
pub fn emit<T: Serialize>(format: OutputFormat, value: &T, human: &str) {
    match format {
        OutputFormat::Json => match serde_json::to_string(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("error: failed to serialize output: {e}"),
        },
        OutputFormat::Human => println!("{human}"),
    }
}

/// Write an error to stdout (JSON mode, so the caller always gets valid
/// JSON on stdout) or stderr (human mode).
pub fn emit_error(format: OutputFormat, exit_code_num: u8, message: &str) {
    match format {
        OutputFormat::Json => {
            let obj = serde_json::json!({
                "error": message,
                "exit_code": exit_code_num,
            });
            println!(
                "{}",
                serde_json::to_string(&obj)
                    .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
            );
        }
        OutputFormat::Human => eprintln!("error: {message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_display() {
        assert_eq!(OutputFormat::Json.to_string(), "json");
        assert_eq!(OutputFormat::Human.to_string(), "human");
    }

    #[test]
    fn output_format_default_is_human() {
        assert_eq!(OutputFormat::default(), OutputFormat::Human);
    }
}
