//! `dst-cli`'s error type: `dst_core::DstError` plus the CLI-only
//! failure modes, with a two-tier (infrastructure vs. operational) exit
//! code split.

use std::path::PathBuf;
use std::process::ExitCode;

use dst_core::DstError;

/// All errors `dst-cli` can report.
#[derive(thiserror::Error, Debug)]
pub enum CliError {
    /// `--config` pointed at a file that doesn't parse as the expected
    /// TOML shape.
    #[error("failed to parse config file {path}: {source}")]
    ConfigParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to read config file {path}: {source}")]
    ConfigReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Any failure surfaced by `dst-core` itself.
    #[error(transparent)]
    Dst(#[from] DstError),
}

impl CliError {
    /// Map each error to its process exit code.
    ///
    /// - `2` — infrastructure error: bad CLI input, unreadable/malformed
    ///   config, or a `dst-core` error that isn't a normal diagnostic
    ///   outcome (`NotSupported`, `BadParameter`, `TransportFailure`,
    ///   `MemoryFailure`, an I/O passthrough).
    /// - `1` — operational outcome: the self-test or repair ran and
    ///   reported a real result the caller can act on (`Failure`,
    ///   `Aborted`, `AccessDenied`, `InProgress`).
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::ConfigParseError { .. } | CliError::ConfigReadError { .. } => {
                ExitCode::from(2)
            }
            CliError::Dst(err) => match err {
                DstError::Failure { .. }
                | DstError::Aborted { .. }
                | DstError::AccessDenied { .. }
                | DstError::InProgress { .. } => ExitCode::from(1),
                DstError::NotSupported { .. }
                | DstError::BadParameter { .. }
                | DstError::TransportFailure { .. }
                | DstError::MemoryFailure { .. }
                | DstError::Io(_) => ExitCode::from(2),
            },
        }
    }
}
