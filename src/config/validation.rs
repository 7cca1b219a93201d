//! Configuration validation.

use super::types::{
    AppConfig, CacheConfig, CodeReviewConfig, HostingConfig, ResponsivenessConfig, RetryConfig,
};

/// Error type for configuration validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The field that failed validation
    pub field: String,
    /// Description of the validation error
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

impl Validatable for AppConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.hosting.validate());
        errors.extend(self.cache.validate());
        errors.extend(self.retry.validate());
        errors.extend(self.responsiveness.validate());
        errors.extend(self.code_review.validate());

        if self.evaluation.deadline_secs == Some(0) {
            errors.push(ConfigError::new(
                "evaluation.deadline_secs",
                "Deadline must be at least 1 second",
            ));
        }

        errors
    }
}

impl Validatable for HostingConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if !(self.api_base.starts_with("https://") || self.api_base.starts_with("http://")) {
            errors.push(ConfigError::new(
                "hosting.api_base",
                format!("Expected an http(s) URL, got '{}'", self.api_base),
            ));
        }
        if self.timeout_secs == 0 {
            errors.push(ConfigError::new(
                "hosting.timeout_secs",
                "Timeout must be at least 1 second",
            ));
        }
        errors
    }
}

impl Validatable for CacheConfig {
    fn validate(&self) -> Vec<ConfigError> {
        if self.ttl_secs == 0 {
            vec![ConfigError::new("cache.ttl_secs", "TTL must be at least 1 second")]
        } else {
            Vec::new()
        }
    }
}

impl Validatable for RetryConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.initial_delay_ms > self.max_delay_ms {
            errors.push(ConfigError::new(
                "retry.initial_delay_ms",
                format!(
                    "Initial delay ({}ms) exceeds max delay ({}ms)",
                    self.initial_delay_ms, self.max_delay_ms
                ),
            ));
        }
        if self.code_review_retries > 10 || self.pinning_retries > 10 {
            errors.push(ConfigError::new(
                "retry",
                "At most 10 retries are allowed per request",
            ));
        }
        errors
    }
}

impl Validatable for ResponsivenessConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.max_issues == 0 {
            errors.push(ConfigError::new(
                "responsiveness.max_issues",
                "At least one issue must be sampled",
            ));
        }
        if self.lookback_days == 0 {
            errors.push(ConfigError::new(
                "responsiveness.lookback_days",
                "Look-back window must be at least 1 day",
            ));
        }
        errors
    }
}

impl Validatable for CodeReviewConfig {
    fn validate(&self) -> Vec<ConfigError> {
        if (1..=100).contains(&self.max_pull_requests) {
            Vec::new()
        } else {
            vec![ConfigError::new(
                "code_review.max_pull_requests",
                format!(
                    "Must be between 1 and 100, got {}",
                    self.max_pull_requests
                ),
            )]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().is_valid());
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let mut config = AppConfig::default();
        config.hosting.api_base = "ftp://example".to_string();
        config.retry.initial_delay_ms = 20_000;
        config.responsiveness.max_issues = 0;
        config.code_review.max_pull_requests = 0;
        config.evaluation.deadline_secs = Some(0);

        let fields: Vec<String> = config.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"hosting.api_base".to_string()));
        assert!(fields.contains(&"retry.initial_delay_ms".to_string()));
        assert!(fields.contains(&"responsiveness.max_issues".to_string()));
        assert!(fields.contains(&"code_review.max_pull_requests".to_string()));
        assert!(fields.contains(&"evaluation.deadline_secs".to_string()));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::new("cache.ttl_secs", "TTL must be at least 1 second");
        assert_eq!(err.to_string(), "cache.ttl_secs: TTL must be at least 1 second");
    }
}
