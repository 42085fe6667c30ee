//! TOML configuration for the repair knobs in `dst_core::RepairPolicy`.
//!
//! Every field is optional: a missing key falls back to the CLI flag
//! (and, if that's also unset, to `RepairPolicy::default()`).

use std::path::Path;

use dst_core::RepairPolicy;
use serde::Deserialize;

use crate::error::CliError;

#[derive(Debug, Default, Deserialize)]
pub struct RepairPolicyFile {
    pub force_passthrough: Option<bool>,
    pub auto_write_realloc: Option<bool>,
    pub auto_read_realloc: Option<bool>,
}

impl RepairPolicyFile {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::ConfigReadError {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| CliError::ConfigParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Layer this file's settings over `flags`: a value present here
    /// overrides the flag-derived default, a missing one defers to it.
    pub fn merge_over(&self, flags: RepairPolicy) -> RepairPolicy {
        RepairPolicy {
            force_passthrough: self.force_passthrough.unwrap_or(flags.force_passthrough),
            auto_write_realloc: self.auto_write_realloc.unwrap_or(flags.auto_write_realloc),
            auto_read_realloc: self.auto_read_realloc.unwrap_or(flags.auto_read_realloc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_defer_to_flags() {
        let file = RepairPolicyFile {
            force_passthrough: Some(true),
            auto_write_realloc: None,
            auto_read_realloc: None,
        };
        let flags = RepairPolicy {
            force_passthrough: false,
            auto_write_realloc: false,
            auto_read_realloc: true,
        };
        let merged = file.merge_over(flags);
        assert!(merged.force_passthrough);
        assert!(!merged.auto_write_realloc);
        assert!(merged.auto_read_realloc);
    }

    #[test]
    fn empty_file_is_a_pure_passthrough_of_flags() {
        let file = RepairPolicyFile::default();
        let flags = RepairPolicy {
            force_passthrough: true,
            auto_write_realloc: false,
            auto_read_realloc: false,
        };
        let merged = file.merge_over(flags);
        assert_eq!(merged.force_passthrough, flags.force_passthrough);
        assert_eq!(merged.auto_write_realloc, flags.auto_write_realloc);
        assert_eq!(merged.auto_read_realloc, flags.auto_read_realloc);
    }
}
