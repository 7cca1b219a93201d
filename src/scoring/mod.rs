//! Scorecard and evaluation orchestration.

mod scorecard;
mod scorer;

pub use scorecard::{latency_secs, MetricResult, MetricStatus, PackageRating, ScoreCard, UNSET};
pub use scorer::{Evaluation, Scorer};
