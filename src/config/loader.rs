use crate::config::schema::{RewriteConfig, ValidationError};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Where a configuration was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    Inline,
    File(PathBuf),
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigOrigin::Inline => f.write_str("<inline>"),
            ConfigOrigin::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read rewrite config {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    /// Malformed TOML, a value of the wrong type, or a key outside
    /// `[runtime]` / `[wrappers]`.
    #[error("rewrite config {origin}: {source}")]
    Parse {
        origin: ConfigOrigin,
        source: toml_edit::de::Error,
    },

    #[error("rewrite config {origin} rejects {}:\n{source}", .source.fields().join(", "))]
    Invalid {
        origin: ConfigOrigin,
        source: ValidationError,
    },
}

pub fn load_from_str(input: &str) -> Result<RewriteConfig, ConfigError> {
    parse(input, ConfigOrigin::Inline)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<RewriteConfig, ConfigError> {
    let path = path.as_ref();
    let input = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&input, ConfigOrigin::File(path.to_path_buf()))
}

fn parse(input: &str, origin: ConfigOrigin) -> Result<RewriteConfig, ConfigError> {
    let config: RewriteConfig = match toml_edit::de::from_str(input) {
        Ok(config) => config,
        Err(source) => return Err(ConfigError::Parse { origin, source }),
    };
    if let Err(source) = config.validate() {
        return Err(ConfigError::Invalid { origin, source });
    }

    debug!(
        %origin,
        runtime = %config.runtime.import_path,
        alias = %config.runtime.alias,
        wrappers = %config.wrappers.file_name,
        "loaded rewrite config"
    );
    Ok(config)
}
