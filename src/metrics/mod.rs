//! Repository quality metrics.
//!
//! Each metric is an independent [`MetricEvaluator`] that turns an
//! `owner/repo` into a score in `[0, 1]`. Evaluators never fail: problems are
//! logged and reported as [`MetricOutcome::Unknown`], which the scorecard
//! flattens to the metric's documented default.
//!
//! | Metric | NetScore weight | Default when unknown |
//! |--------|-----------------|----------------------|
//! | Bus factor | 0.20 | 0 |
//! | Correctness | 0.20 | 0 |
//! | Ramp-up | 0.20 | 0 |
//! | Responsive maintainers | 0.20 | 0.5 |
//! | License | 0.10 | 0 |
//! | Dependency pinning | 0.05 | 0 |
//! | Code review | 0.05 | 0 |

mod bus_factor;
mod code_review;
mod correctness;
mod license;
mod pinning;
mod ramp_up;
mod responsiveness;

pub use bus_factor::{bus_factor_score, BusFactor};
pub use code_review::CodeReview;
pub use correctness::{declares_test_script, Correctness};
pub use license::{is_approved_spdx_id, readme_mentions_approved_license, License};
pub use pinning::{classify_version_spec, merged_dependencies, pinning_score, DependencyPinning, PinKind};
pub use ramp_up::{ramp_up_score, RampUp};
pub use responsiveness::{
    responsiveness_score, sample_issues, time_score, ResponsiveMaintainers,
};

use crate::cache::CacheStats;
use crate::cancel::Cancellation;
use crate::error::{NotFoundExt, Result};
use crate::hosting::HostingApi;
use crate::model::RepoRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The package manifest inspected by the correctness and pinning metrics.
pub const MANIFEST_PATH: &str = "package.json";

/// The seven metrics, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKind {
    BusFactor,
    RampUp,
    Correctness,
    License,
    ResponsiveMaintainers,
    DependencyPinning,
    CodeReview,
}

impl MetricKind {
    /// All metrics in evaluation order.
    pub const ALL: [Self; 7] = [
        Self::BusFactor,
        Self::RampUp,
        Self::Correctness,
        Self::License,
        Self::ResponsiveMaintainers,
        Self::DependencyPinning,
        Self::CodeReview,
    ];

    /// Human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BusFactor => "Bus Factor",
            Self::RampUp => "Ramp Up",
            Self::Correctness => "Correctness",
            Self::License => "License",
            Self::ResponsiveMaintainers => "Responsive Maintainers",
            Self::DependencyPinning => "Dependency Pinning",
            Self::CodeReview => "Code Review",
        }
    }

    /// Weight in the NetScore. The weights sum to 1.0.
    #[must_use]
    pub const fn weight(self) -> f64 {
        match self {
            Self::BusFactor | Self::Correctness | Self::RampUp | Self::ResponsiveMaintainers => 0.2,
            Self::License => 0.1,
            Self::DependencyPinning | Self::CodeReview => 0.05,
        }
    }

    /// Score recorded when the metric could not be determined.
    ///
    /// Insufficient signal about maintainers is not proof of unresponsiveness,
    /// so that metric falls back to the midpoint.
    #[must_use]
    pub const fn failure_default(self) -> f64 {
        match self {
            Self::ResponsiveMaintainers => 0.5,
            _ => 0.0,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of one evaluator run.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricOutcome {
    /// The metric was determined
    Scored(f64),
    /// The metric could not be determined; the reason is kept for logging
    Unknown(String),
}

impl MetricOutcome {
    /// Flatten to a plain score, substituting the metric's default for
    /// unknown outcomes and clamping to `[0, 1]`.
    #[must_use]
    pub fn value_for(&self, kind: MetricKind) -> f64 {
        match self {
            Self::Scored(value) if value.is_finite() => value.clamp(0.0, 1.0),
            Self::Scored(_) | Self::Unknown(_) => kind.failure_default(),
        }
    }

    #[must_use]
    pub const fn is_scored(&self) -> bool {
        matches!(self, Self::Scored(_))
    }
}

/// Inputs shared by every evaluator during one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub repo: &'a RepoRef,
    /// README text fetched up front; `None` lets an evaluator fetch its own,
    /// `Some("")` means the repository has no readable README.
    pub readme: Option<&'a str>,
    pub cancel: &'a Cancellation,
}

/// A single repository quality metric.
pub trait MetricEvaluator: Send + Sync {
    /// Which metric this evaluator produces.
    fn kind(&self) -> MetricKind;

    /// Score the repository. Must not panic on hosting failures.
    fn evaluate(&self, ctx: &EvalContext<'_>) -> MetricOutcome;

    /// Statistics of this evaluator's cache, if it has one.
    fn cache_stats(&self) -> Option<CacheStats> {
        None
    }
}

/// Fetch and decode the README. A missing README is `Ok(None)`.
pub fn fetch_readme_text(
    client: &dyn HostingApi,
    repo: &RepoRef,
    cancel: &Cancellation,
) -> Result<Option<String>> {
    cancel.check("fetching README")?;
    match client.readme(repo).found()? {
        Some(file) => file.decode_text(),
        None => Ok(None),
    }
}

/// Round half away from zero to `places` decimals.
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
