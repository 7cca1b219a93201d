//! Configuration module for repo-trust.
//!
//! - Type-safe configuration structures with documented defaults
//! - Validation for all configuration values
//! - YAML config file loading and discovery
//! - CLI argument merging
//!
//! # Configuration File
//!
//! Place a `.repo-trust.yaml` file in your working directory or
//! `~/.config/repo-trust/`:
//!
//! ```yaml
//! responsiveness:
//!   max_issues: 100
//!   sample_strategy: distributed
//! evaluation:
//!   deadline_secs: 120
//! ```

pub mod defaults;
pub mod file;
mod types;
mod validation;

pub use types::{
    AppConfig, CacheConfig, CodeReviewConfig, EvaluationConfig, HostingConfig,
    ResponsivenessConfig, RetryConfig, SampleStrategy,
};
pub use validation::{ConfigError, Validatable};

pub use file::{
    discover_config_file, generate_example_config, load_config_file, load_or_default,
    ConfigFileError,
};

/// Generate a JSON Schema for the `AppConfig` configuration format.
pub fn generate_json_schema() -> crate::error::Result<String> {
    let schema = schemars::schema_for!(AppConfig);
    Ok(serde_json::to_string_pretty(&schema)?)
}
