//! Default values for repo-trust configuration.

/// Default hosting API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Default HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Time-to-live of every cached metric value (1 hour).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// First backoff delay after a rate-limited response.
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 2000;

/// Ceiling on any single backoff delay.
pub const DEFAULT_MAX_DELAY_MS: u64 = 15_000;

/// Retries for the code review evaluator.
pub const DEFAULT_CODE_REVIEW_RETRIES: u32 = 3;

/// Retries for the dependency pinning evaluator.
pub const DEFAULT_PINNING_RETRIES: u32 = 5;

/// Issues sampled by the responsiveness evaluator.
pub const DEFAULT_MAX_ISSUES: usize = 50;

/// Look-back window of the responsiveness evaluator.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 30;

/// Closed pull requests inspected by the code review evaluator.
pub const DEFAULT_MAX_PULL_REQUESTS: u8 = 30;

/// Self-imposed pause between review lookups.
pub const DEFAULT_REVIEW_INTERVAL_MS: u64 = 1000;
