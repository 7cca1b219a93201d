//! The aggregate result of one repository evaluation.

use crate::metrics::{round_to, MetricKind, MetricOutcome};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Marker for "not yet evaluated".
pub const UNSET: f64 = -1.0;

/// Decimals kept for every stored number.
const STORED_DECIMALS: i32 = 3;
/// Decimals of a measured latency, in seconds.
const LATENCY_DECIMALS: i32 = 5;

/// Convert a measured duration to seconds with microsecond precision.
#[must_use]
pub fn latency_secs(elapsed: Duration) -> f64 {
    round_to(elapsed.as_secs_f64(), LATENCY_DECIMALS)
}

/// A metric value and the time its evaluation took.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricResult {
    /// Score in `[0, 1]`, or `-1` before evaluation
    pub value: f64,
    /// Evaluation time in seconds, or `-1` before evaluation
    pub latency_secs: f64,
}

impl MetricResult {
    pub const UNSET: Self = Self {
        value: UNSET,
        latency_secs: UNSET,
    };

    /// Build a result, rounding both numbers to 3 decimals.
    #[must_use]
    pub fn new(value: f64, latency_secs: f64) -> Self {
        Self {
            value: round_to(value, STORED_DECIMALS),
            latency_secs: round_to(latency_secs, STORED_DECIMALS),
        }
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.value >= 0.0
    }
}

impl Default for MetricResult {
    fn default() -> Self {
        Self::UNSET
    }
}

/// How a metric's value came about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status", content = "reason")]
pub enum MetricStatus {
    /// Not evaluated yet
    #[default]
    Pending,
    /// The evaluator determined the value
    Scored,
    /// The evaluator could not determine the value; the default was recorded
    Unknown(String),
    /// The evaluation deadline passed first; the default was recorded
    TimedOut,
    /// The evaluator panicked; 0 was recorded
    Panicked(String),
}

/// Metric values, latencies and the derived NetScore for one repository.
///
/// Every stored number is rounded to 3 decimals when written. A fresh card
/// holds the `-1` sentinel everywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreCard {
    bus_factor: MetricResult,
    correctness: MetricResult,
    license: MetricResult,
    ramp_up: MetricResult,
    responsive_maintainers: MetricResult,
    dependency_pinning: MetricResult,
    code_review: MetricResult,
    net_score: f64,
    net_score_latency: f64,
    #[serde(skip)]
    statuses: IndexMap<MetricKind, MetricStatus>,
}

impl Default for ScoreCard {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreCard {
    /// A card with every field at the sentinel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bus_factor: MetricResult::UNSET,
            correctness: MetricResult::UNSET,
            license: MetricResult::UNSET,
            ramp_up: MetricResult::UNSET,
            responsive_maintainers: MetricResult::UNSET,
            dependency_pinning: MetricResult::UNSET,
            code_review: MetricResult::UNSET,
            net_score: UNSET,
            net_score_latency: UNSET,
            statuses: IndexMap::new(),
        }
    }

    fn slot_mut(&mut self, kind: MetricKind) -> &mut MetricResult {
        match kind {
            MetricKind::BusFactor => &mut self.bus_factor,
            MetricKind::Correctness => &mut self.correctness,
            MetricKind::License => &mut self.license,
            MetricKind::RampUp => &mut self.ramp_up,
            MetricKind::ResponsiveMaintainers => &mut self.responsive_maintainers,
            MetricKind::DependencyPinning => &mut self.dependency_pinning,
            MetricKind::CodeReview => &mut self.code_review,
        }
    }

    /// The stored result of one metric.
    #[must_use]
    pub const fn metric(&self, kind: MetricKind) -> MetricResult {
        match kind {
            MetricKind::BusFactor => self.bus_factor,
            MetricKind::Correctness => self.correctness,
            MetricKind::License => self.license,
            MetricKind::RampUp => self.ramp_up,
            MetricKind::ResponsiveMaintainers => self.responsive_maintainers,
            MetricKind::DependencyPinning => self.dependency_pinning,
            MetricKind::CodeReview => self.code_review,
        }
    }

    /// Store a metric value (clamped to `[0, 1]`) and its latency in seconds.
    pub fn set(&mut self, kind: MetricKind, value: f64, latency_secs: f64) {
        let value = if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            kind.failure_default()
        };
        *self.slot_mut(kind) = MetricResult::new(value, latency_secs);
    }

    /// Store an evaluator outcome, flattening unknown outcomes to the
    /// metric's default.
    pub fn record(&mut self, kind: MetricKind, outcome: &MetricOutcome, elapsed: Duration) {
        self.set(kind, outcome.value_for(kind), latency_secs(elapsed));
        let status = match outcome {
            MetricOutcome::Scored(_) => MetricStatus::Scored,
            MetricOutcome::Unknown(reason) => MetricStatus::Unknown(reason.clone()),
        };
        self.statuses.insert(kind, status);
    }

    /// Store the value for a metric that did not produce an outcome.
    pub fn record_failure(&mut self, kind: MetricKind, status: MetricStatus, elapsed: Duration) {
        let value = match status {
            MetricStatus::Panicked(_) => 0.0,
            _ => kind.failure_default(),
        };
        self.set(kind, value, latency_secs(elapsed));
        self.statuses.insert(kind, status);
    }

    /// Override the status of a recorded metric.
    pub fn set_status(&mut self, kind: MetricKind, status: MetricStatus) {
        self.statuses.insert(kind, status);
    }

    /// How the metric's value came about.
    #[must_use]
    pub fn status(&self, kind: MetricKind) -> MetricStatus {
        self.statuses.get(&kind).cloned().unwrap_or_default()
    }

    /// Weighted sum of the metric values. Unset metrics count as 0.
    #[must_use]
    pub fn weighted_sum(&self) -> f64 {
        MetricKind::ALL
            .iter()
            .map(|kind| self.metric(*kind).value.max(0.0) * kind.weight())
            .sum::<f64>()
            .clamp(0.0, 1.0)
    }

    /// Derive and store the NetScore.
    pub fn compute_net_score(&mut self) -> f64 {
        self.net_score = round_to(self.weighted_sum(), STORED_DECIMALS);
        self.net_score
    }

    /// Store the total evaluation latency.
    pub fn set_net_score_latency(&mut self, elapsed: Duration) {
        self.net_score_latency = round_to(latency_secs(elapsed), STORED_DECIMALS);
    }

    #[must_use]
    pub const fn net_score(&self) -> f64 {
        self.net_score
    }

    /// Total evaluation time in seconds.
    #[must_use]
    pub const fn net_score_latency(&self) -> f64 {
        self.net_score_latency
    }

    /// Whether every metric and the NetScore have been written.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.net_score >= 0.0 && MetricKind::ALL.iter().all(|k| self.metric(*k).is_set())
    }

    /// Metrics whose value is a default rather than a determination.
    #[must_use]
    pub fn undetermined(&self) -> Vec<MetricKind> {
        MetricKind::ALL
            .into_iter()
            .filter(|kind| !matches!(self.status(*kind), MetricStatus::Scored | MetricStatus::Pending))
            .collect()
    }

    /// Flatten to the registry's package rating shape.
    #[must_use]
    pub const fn to_rating(&self) -> PackageRating {
        PackageRating {
            bus_factor: self.bus_factor.value,
            bus_factor_latency: self.bus_factor.latency_secs,
            correctness: self.correctness.value,
            correctness_latency: self.correctness.latency_secs,
            ramp_up: self.ramp_up.value,
            ramp_up_latency: self.ramp_up.latency_secs,
            responsive_maintainer: self.responsive_maintainers.value,
            responsive_maintainer_latency: self.responsive_maintainers.latency_secs,
            license_score: self.license.value,
            license_score_latency: self.license.latency_secs,
            good_pinning_practice: self.dependency_pinning.value,
            good_pinning_practice_latency: self.dependency_pinning.latency_secs,
            pull_request: self.code_review.value,
            pull_request_latency: self.code_review.latency_secs,
            net_score: self.net_score,
            net_score_latency: self.net_score_latency,
        }
    }
}

/// Flat rating record as exposed by the package registry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PackageRating {
    pub bus_factor: f64,
    pub bus_factor_latency: f64,
    pub correctness: f64,
    pub correctness_latency: f64,
    pub ramp_up: f64,
    pub ramp_up_latency: f64,
    pub responsive_maintainer: f64,
    pub responsive_maintainer_latency: f64,
    pub license_score: f64,
    pub license_score_latency: f64,
    pub good_pinning_practice: f64,
    pub good_pinning_practice_latency: f64,
    pub pull_request: f64,
    pub pull_request_latency: f64,
    pub net_score: f64,
    pub net_score_latency: f64,
}
