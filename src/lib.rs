//! **Repository trustworthiness scoring for package registries.**
//!
//! `repo-trust` queries a code-hosting API about one repository and condenses
//! what it finds into a [`ScoreCard`]: seven independent metrics in `[0, 1]`,
//! the time each took, and a weighted NetScore.
//!
//! ## Metrics
//!
//! | Metric | Signal | Weight |
//! |--------|--------|--------|
//! | Bus factor | share of commits held by the top contributor | 0.20 |
//! | Correctness | contributor volume, README, declared test script | 0.20 |
//! | Ramp-up | onboarding sections in the README | 0.20 |
//! | Responsive maintainers | time to first maintainer reply on issues | 0.20 |
//! | License | approved license in metadata or README | 0.10 |
//! | Dependency pinning | how tightly `package.json` pins versions | 0.05 |
//! | Code review | share of closed pull requests with a review | 0.05 |
//!
//! ## Failure model
//!
//! [`Scorer::evaluate`] fails only for an empty owner or repository name. A
//! metric that cannot be determined (rate limiting, network errors, missing
//! files, a passed deadline) records its default score instead, and the
//! scorecard keeps a per-metric [`MetricStatus`] saying why.
//!
//! ## Getting Started
//!
//! ```no_run
//! use std::sync::Arc;
//! use repo_trust::{AppConfig, GitHubClient, Scorer};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = AppConfig::default();
//!     config.hosting.token = std::env::var("GITHUB_TOKEN").ok();
//!
//!     let client = Arc::new(GitHubClient::new(&config.hosting)?);
//!     let scorer = Scorer::new(client, &config)?;
//!     let evaluation = scorer.evaluate("rust-lang", "regex")?;
//!
//!     println!("NetScore: {}", evaluation.scorecard.net_score());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `github` (default): the `reqwest`-based [`GitHubClient`], npm link
//!   resolution and the CLI handlers. Without it the crate is the pure scoring
//!   engine over any [`HostingApi`] implementation.

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
#![allow(
    // Counts and scores are small; usize/u64 to f64 never loses meaningful precision
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod cache;
pub mod cancel;
#[cfg(feature = "github")]
pub mod cli;
pub mod config;
pub mod error;
pub mod hosting;
pub mod metrics;
pub mod model;
pub mod resolve;
pub mod retry;
pub mod scoring;

// Re-export main types for convenience
pub use cache::{CacheStats, Clock, MaintainerCache, ManualClock, SystemClock, TtlCache};
pub use cancel::Cancellation;
pub use config::{AppConfig, ConfigError, Validatable};
pub use error::{ErrorContext, HostingErrorKind, NotFoundExt, Result, TrustError};
#[cfg(feature = "github")]
pub use hosting::GitHubClient;
pub use hosting::HostingApi;
pub use metrics::{EvalContext, MetricEvaluator, MetricKind, MetricOutcome};
pub use model::RepoRef;
pub use resolve::parse_repository_url;
#[cfg(feature = "github")]
pub use resolve::RegistryResolver;
pub use retry::RetryPolicy;
pub use scoring::{Evaluation, MetricResult, MetricStatus, PackageRating, ScoreCard, Scorer};
