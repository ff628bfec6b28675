//! Environment variable overrides for configuration.

use crate::errors::Error;

use super::Config;
use super::env_parser::{
    DATABASE_PATH_VAR, LEXICAL_WEIGHT_VAR, MIN_SIMILARITY_VAR, REQUEST_TIMEOUT_VAR,
    SEMANTIC_WEIGHT_VAR, apply_float_override, apply_path_override, apply_u64_override,
};

/// Apply `MNEMOS_*` environment variable overrides to configuration.
pub fn apply_env_overrides(config: &mut Config) -> Result<(), Error> {
    apply_path_override(DATABASE_PATH_VAR, &mut config.database_path)?;
    apply_float_override(SEMANTIC_WEIGHT_VAR, &mut config.semantic_weight)?;
    apply_float_override(LEXICAL_WEIGHT_VAR, &mut config.lexical_weight)?;
    apply_float_override(MIN_SIMILARITY_VAR, &mut config.min_similarity)?;
    apply_u64_override(REQUEST_TIMEOUT_VAR, &mut config.request_timeout_secs)?;
    Ok(())
}
