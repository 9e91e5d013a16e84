//! Errors loading and checking `plotwise.toml`

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0} (run `plotwise config init` to create one)")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid plotwise TOML: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for '{field}': {message}")]
    Validation { field: String, message: String },

    /// A `[models.*]` stage names an endpoint no `[[endpoints]]` entry defines.
    #[error("'{field}' uses endpoint '{endpoint}', but no [[endpoints]] entry has that name")]
    UnknownEndpoint { field: String, endpoint: String },
}
