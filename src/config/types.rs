//! Configuration types for repo-trust.

use super::defaults::{
    DEFAULT_API_BASE, DEFAULT_CACHE_TTL_SECS, DEFAULT_CODE_REVIEW_RETRIES,
    DEFAULT_INITIAL_DELAY_MS, DEFAULT_LOOKBACK_DAYS, DEFAULT_MAX_DELAY_MS, DEFAULT_MAX_ISSUES,
    DEFAULT_MAX_PULL_REQUESTS, DEFAULT_PINNING_RETRIES, DEFAULT_REVIEW_INTERVAL_MS,
    DEFAULT_TIMEOUT_SECS,
};
use crate::retry::RetryPolicy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Top-level configuration
// ============================================================================

/// Complete repo-trust configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    /// Hosting API connection settings
    pub hosting: HostingConfig,
    /// Metric cache settings
    pub cache: CacheConfig,
    /// Rate-limit backoff settings
    pub retry: RetryConfig,
    /// Responsive maintainers metric settings
    pub responsiveness: ResponsivenessConfig,
    /// Code review metric settings
    pub code_review: CodeReviewConfig,
    /// Orchestration settings
    pub evaluation: EvaluationConfig,
}

impl AppConfig {
    /// Merge another config into this one, with `other` taking precedence
    /// wherever it differs from the defaults.
    pub fn merge(&mut self, other: &Self) {
        let defaults = Self::default();

        if other.hosting.api_base != defaults.hosting.api_base {
            self.hosting.api_base.clone_from(&other.hosting.api_base);
        }
        if other.hosting.token.is_some() {
            self.hosting.token.clone_from(&other.hosting.token);
        }
        if other.hosting.timeout_secs != defaults.hosting.timeout_secs {
            self.hosting.timeout_secs = other.hosting.timeout_secs;
        }
        if other.hosting.user_agent.is_some() {
            self.hosting.user_agent.clone_from(&other.hosting.user_agent);
        }

        if other.evaluation.deadline_secs.is_some() {
            self.evaluation.deadline_secs = other.evaluation.deadline_secs;
        }
        if !other.evaluation.parallel {
            self.evaluation.parallel = false;
        }
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Hosting API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct HostingConfig {
    /// API base URL (GitHub Enterprise installs use `https://host/api/v3`)
    pub api_base: String,
    /// Auth token; usually supplied via `GITHUB_TOKEN` instead of the file
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// HTTP timeout in seconds
    #[schemars(range(min = 1))]
    pub timeout_secs: u64,
    /// Override the default `repo-trust/<version>` user agent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl HostingConfig {
    /// HTTP timeout as a `Duration`.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HostingConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: None,
        }
    }
}

/// Metric cache settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CacheConfig {
    /// Time-to-live of a cached metric value, in seconds
    #[schemars(range(min = 1))]
    pub ttl_secs: u64,
    /// Cache the dependency pinning score even when the evaluation failed
    pub cache_failures: bool,
}

impl CacheConfig {
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            cache_failures: false,
        }
    }
}

/// Rate-limit backoff settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RetryConfig {
    /// First backoff delay in milliseconds
    pub initial_delay_ms: u64,
    /// Maximum backoff delay in milliseconds
    pub max_delay_ms: u64,
    /// Retries after a rate-limited code review request
    pub code_review_retries: u32,
    /// Retries after a rate-limited manifest request
    pub pinning_retries: u32,
}

impl RetryConfig {
    /// Backoff policy with the given retry budget.
    #[must_use]
    pub const fn policy(&self, max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            code_review_retries: DEFAULT_CODE_REVIEW_RETRIES,
            pinning_retries: DEFAULT_PINNING_RETRIES,
        }
    }
}

/// How sampled issues are picked from the fetched window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SampleStrategy {
    /// Take the most recent issues
    #[default]
    Sequential,
    /// Spread the sample evenly across the window
    Distributed,
}

/// Responsive maintainers metric settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ResponsivenessConfig {
    /// Maximum number of issues sampled
    #[schemars(range(min = 1))]
    pub max_issues: usize,
    /// How far back to look for issues, in days
    #[schemars(range(min = 1))]
    pub lookback_days: u32,
    /// Sampling strategy
    pub sample_strategy: SampleStrategy,
}

impl Default for ResponsivenessConfig {
    fn default() -> Self {
        Self {
            max_issues: DEFAULT_MAX_ISSUES,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            sample_strategy: SampleStrategy::Sequential,
        }
    }
}

/// Code review metric settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CodeReviewConfig {
    /// Most recently closed pull requests inspected (single page, max 100)
    #[schemars(range(min = 1, max = 100))]
    pub max_pull_requests: u8,
    /// Pause between review lookups, in milliseconds
    pub request_interval_ms: u64,
}

impl CodeReviewConfig {
    #[must_use]
    pub const fn request_interval(&self) -> Duration {
        Duration::from_millis(self.request_interval_ms)
    }
}

impl Default for CodeReviewConfig {
    fn default() -> Self {
        Self {
            max_pull_requests: DEFAULT_MAX_PULL_REQUESTS,
            request_interval_ms: DEFAULT_REVIEW_INTERVAL_MS,
        }
    }
}

/// Orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Run the seven evaluators concurrently
    pub parallel: bool,
    /// Abandon unfinished metrics after this many seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_secs: Option<u64>,
}

impl EvaluationConfig {
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            deadline_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_constants() {
        let config = AppConfig::default();
        assert_eq!(config.hosting.api_base, "https://api.github.com");
        assert_eq!(config.cache.ttl(), Duration::from_secs(3600));
        assert_eq!(config.retry.initial_delay_ms, 2000);
        assert_eq!(config.retry.max_delay_ms, 15_000);
        assert_eq!(config.retry.code_review_retries, 3);
        assert_eq!(config.retry.pinning_retries, 5);
        assert_eq!(config.responsiveness.max_issues, 50);
        assert_eq!(config.responsiveness.lookback_days, 30);
        assert_eq!(config.code_review.max_pull_requests, 30);
        assert!(config.evaluation.parallel);
        assert!(!config.cache.cache_failures);
    }

    #[test]
    fn test_token_is_never_serialized() {
        let mut config = AppConfig::default();
        config.hosting.token = Some("ghp_secret".to_string());
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("ghp_secret"));
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "responsiveness:\n  sample_strategy: distributed\n";
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config.responsiveness.sample_strategy,
            SampleStrategy::Distributed
        );
        assert_eq!(config.responsiveness.max_issues, 50);
        assert_eq!(config.retry.pinning_retries, 5);
    }

    #[test]
    fn test_merge_prefers_explicit_values() {
        let mut base = AppConfig::default();
        let mut cli = AppConfig::default();
        cli.hosting.token = Some("token".to_string());
        cli.evaluation.parallel = false;
        cli.evaluation.deadline_secs = Some(20);
        base.merge(&cli);
        assert_eq!(base.hosting.token.as_deref(), Some("token"));
        assert!(!base.evaluation.parallel);
        assert_eq!(base.evaluation.deadline(), Some(Duration::from_secs(20)));
    }

    #[test]
    fn test_retry_policy_from_config() {
        let policy = RetryConfig::default().policy(5);
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.initial_delay, Duration::from_millis(2000));
        assert_eq!(policy.max_delay, Duration::from_millis(15_000));
    }
}
