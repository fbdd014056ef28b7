//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! A [`MirrorConfig`] describes everything a mirroring store needs at
//! construction time: where the physical files live, how to reach the
//! hosted Git service, which repository and branch to push to, and which
//! commit-message policy to apply. There is no runtime reconfiguration;
//! the provider is rebuilt to change any of it.
//!
//! # Example
//!
//! ```no_run
//! use gitmirror::core::config::MirrorConfig;
//! use std::path::Path;
//!
//! let config = MirrorConfig::load(Path::new("/etc/gitmirror/config.toml")).unwrap();
//! let target = config.branch_target().unwrap();
//! println!("mirroring to {}", target.ref_name);
//! ```

pub mod schema;

pub use schema::{MessagePolicyKind, MirrorConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

impl MirrorConfig {
    /// Load and validate a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadError` if the file cannot be read,
    /// `ConfigError::ParseError` if it is not valid TOML for the schema,
    /// or `ConfigError::InvalidValue` if validation fails.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        let config: MirrorConfig =
            toml::from_str(&contents).map_err(|err| ConfigError::ParseError {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_round_trips_a_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            physical_root = "/srv/app"
            service_url = "https://dev.azure.com/acme/website"
            username = "builds@acme.example"
            pat = "s3cret"
            repository = "c7fd20a1-9821-40f1-9f0b-10bb1360f43a"
            repo_root = "/My.WebSite"
            environment = "staging"
            "#
        )
        .unwrap();

        let config = MirrorConfig::load(file.path()).unwrap();
        assert_eq!(config.repo_root, "/My.WebSite");
        assert_eq!(
            config.branch_target().unwrap().branch.as_str(),
            "forms/staging"
        );
    }

    #[test]
    fn load_reports_missing_file() {
        let err = MirrorConfig::load(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn load_reports_unknown_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "unknown_field = true").unwrap();

        let err = MirrorConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn load_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            physical_root = "/srv/app"
            service_url = "not-a-url"
            username = "u"
            pat = "p"
            repository = "repo"
            repo_root = "/Site"
            "#
        )
        .unwrap();

        let err = MirrorConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }
}
