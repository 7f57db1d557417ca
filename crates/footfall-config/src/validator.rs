//! Runtime validation of a loaded configuration.

use crate::defaults::MAX_PAGE_SIZE;
use crate::schema::Config;
use footfall_common::{FootfallError, Result};

impl Config {
    /// Validates the configuration.
    ///
    /// The API key is not checked here; it is supplied per run.
    pub fn validate(&self) -> Result<()> {
        let provider = &self.provider;

        let url = url::Url::parse(&provider.url).map_err(|e| {
            FootfallError::validation_field(format!("Provider URL is invalid: {e}"), "provider.url")
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FootfallError::validation_field(
                "Provider URL must use http or https",
                "provider.url",
            ));
        }

        if !(1..=300).contains(&provider.timeout_secs) {
            return Err(FootfallError::validation_field(
                "Timeout must be between 1 and 300 seconds",
                "provider.timeout_secs",
            ));
        }
        if provider.rate_limit_per_sec == 0 {
            return Err(FootfallError::validation_field(
                "Rate limit must be greater than 0",
                "provider.rate_limit_per_sec",
            ));
        }
        if provider.max_retries > 10 {
            return Err(FootfallError::validation_field(
                "Max retries cannot exceed 10",
                "provider.max_retries",
            ));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&provider.page_size) {
            return Err(FootfallError::validation_field(
                format!("Page size must be between 1 and {MAX_PAGE_SIZE}"),
                "provider.page_size",
            ));
        }
        if provider.max_pages == Some(0) {
            return Err(FootfallError::validation_field(
                "Max pages must be greater than 0 when set",
                "provider.max_pages",
            ));
        }
        if provider.max_records == Some(0) {
            return Err(FootfallError::validation_field(
                "Max records must be greater than 0 when set",
                "provider.max_records",
            ));
        }

        if self.region.city.trim().is_empty() {
            return Err(FootfallError::validation_field(
                "City cannot be empty",
                "region.city",
            ));
        }
        if self.region.region.trim().is_empty() {
            return Err(FootfallError::validation_field(
                "Region cannot be empty",
                "region.region",
            ));
        }

        if let Some(end) = self.range.end_date {
            if end < self.range.start_date {
                return Err(FootfallError::validation_field(
                    format!(
                        "End date {end} is before start date {}",
                        self.range.start_date
                    ),
                    "range.end_date",
                ));
            }
        }

        if self.analysis.brand_limit == 0 {
            return Err(FootfallError::validation_field(
                "Brand limit must be greater than 0",
                "analysis.brand_limit",
            ));
        }
        if self.cache.max_capacity == 0 {
            return Err(FootfallError::validation_field(
                "Cache capacity must be greater than 0",
                "cache.max_capacity",
            ));
        }

        Ok(())
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a configuration.
    pub fn validate(config: &Config) -> Result<()> {
        config.validate()
    }
}
