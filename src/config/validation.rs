//! Configuration validation logic.

use crate::errors::Error;

use super::Config;

/// Validates configuration values.
pub struct ConfigValidator<'a> {
    config: &'a Config,
}

impl<'a> ConfigValidator<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Validate all configuration values for correctness and constraints.
    ///
    /// Checks that:
    /// - Blend weights are finite, non-negative and not both zero
    /// - Minimum similarity is finite and between -1.0 and 1.0
    /// - Request timeout is positive
    /// - Database path and provider base URLs are not empty
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if any validation check fails.
    pub fn validate(&self) -> Result<(), Error> {
        self.validate_weights()?;
        self.validate_min_similarity()?;
        self.validate_timeout()?;
        self.validate_database_path()?;
        self.validate_base_urls()?;

        Ok(())
    }

    fn validate_weights(&self) -> Result<(), Error> {
        let weights = [
            ("semantic_weight", self.config.semantic_weight),
            ("lexical_weight", self.config.lexical_weight),
        ];
        for (name, weight) in weights {
            if weight.is_nan() || weight.is_infinite() {
                return Err(Error::Configuration(format!(
                    "Invalid {name}: NaN and infinity are not allowed"
                )));
            }
            if weight < 0.0 {
                return Err(Error::Configuration(format!(
                    "Invalid {name}: {weight} (must not be negative)"
                )));
            }
        }

        if self.config.semantic_weight == 0.0 && self.config.lexical_weight == 0.0 {
            return Err(Error::Configuration(
                "semantic_weight and lexical_weight cannot both be zero".into(),
            ));
        }

        Ok(())
    }

    fn validate_min_similarity(&self) -> Result<(), Error> {
        let min_similarity = self.config.min_similarity;
        if min_similarity.is_nan() || min_similarity.is_infinite() {
            return Err(Error::Configuration(
                "Invalid min_similarity: NaN and infinity are not allowed".into(),
            ));
        }

        if !(-1.0..=1.0).contains(&min_similarity) {
            return Err(Error::Configuration(format!(
                "Invalid min_similarity: {min_similarity} (must be between -1.0 and 1.0)"
            )));
        }

        Ok(())
    }

    fn validate_timeout(&self) -> Result<(), Error> {
        if self.config.request_timeout_secs == 0 {
            return Err(Error::Configuration(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    fn validate_database_path(&self) -> Result<(), Error> {
        if self.config.database_path.as_os_str().is_empty() {
            return Err(Error::Configuration(
                "Database path cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_base_urls(&self) -> Result<(), Error> {
        let urls = [
            ("openai_base_url", &self.config.openai_base_url),
            ("gemini_base_url", &self.config.gemini_base_url),
            ("voyage_base_url", &self.config.voyage_base_url),
        ];
        for (name, url) in urls {
            if url.trim().is_empty() {
                return Err(Error::Configuration(format!("{name} cannot be empty")));
            }
        }
        Ok(())
    }
}
