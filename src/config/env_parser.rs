//! Environment variable parsing utilities for configuration.

use crate::errors::Error;
use std::path::PathBuf;

use super::paths;

pub const DATABASE_PATH_VAR: &str = "MNEMOS_DATABASE_PATH";
pub const SEMANTIC_WEIGHT_VAR: &str = "MNEMOS_SEMANTIC_WEIGHT";
pub const LEXICAL_WEIGHT_VAR: &str = "MNEMOS_LEXICAL_WEIGHT";
pub const MIN_SIMILARITY_VAR: &str = "MNEMOS_MIN_SIMILARITY";
pub const REQUEST_TIMEOUT_VAR: &str = "MNEMOS_REQUEST_TIMEOUT_SECS";

#[cfg(test)]
pub const ALL_VARS: [&str; 5] = [
    DATABASE_PATH_VAR,
    SEMANTIC_WEIGHT_VAR,
    LEXICAL_WEIGHT_VAR,
    MIN_SIMILARITY_VAR,
    REQUEST_TIMEOUT_VAR,
];

fn non_empty<'v>(name: &str, value: &'v str) -> Result<&'v str, Error> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Configuration(format!("{name} cannot be empty")));
    }
    Ok(trimmed)
}

/// Parse environment variable as a path, expanding tilde.
fn parse_env_path(name: &str, value: &str) -> Result<PathBuf, Error> {
    let value = non_empty(name, value)?;
    Ok(paths::expand_tilde_path(&PathBuf::from(value)))
}

/// Parse environment variable as a f64; range checks happen in validation.
fn parse_env_float(name: &str, value: &str) -> Result<f64, Error> {
    non_empty(name, value)?
        .parse()
        .map_err(|e| Error::Configuration(format!("Invalid {name} value: {e}")))
}

fn parse_env_u64(name: &str, value: &str) -> Result<u64, Error> {
    non_empty(name, value)?
        .parse()
        .map_err(|e| Error::Configuration(format!("Invalid {name} value: {e}")))
}

/// Overwrite `target` with the path in `name`, if set.
pub fn apply_path_override(name: &str, target: &mut PathBuf) -> Result<(), Error> {
    if let Ok(val) = std::env::var(name) {
        *target = parse_env_path(name, &val)?;
    }
    Ok(())
}

/// Overwrite `target` with the float in `name`, if set.
pub fn apply_float_override(name: &str, target: &mut f64) -> Result<(), Error> {
    if let Ok(val) = std::env::var(name) {
        *target = parse_env_float(name, &val)?;
    }
    Ok(())
}

/// Overwrite `target` with the integer in `name`, if set.
pub fn apply_u64_override(name: &str, target: &mut u64) -> Result<(), Error> {
    if let Ok(val) = std::env::var(name) {
        *target = parse_env_u64(name, &val)?;
    }
    Ok(())
}
