//! Bus factor: how concentrated the commit history is in one person.

use super::{EvalContext, MetricEvaluator, MetricKind, MetricOutcome};
use crate::hosting::HostingApi;
use std::sync::Arc;

/// Contributors requested (a single page).
const CONTRIBUTOR_PAGE: u8 = 100;

/// Score tiers for the top contributor's share, highest share first.
const TIERS: [(f64, f64); 3] = [(0.8, 0.0), (0.6, 0.2), (0.4, 0.5)];

/// Score a contribution distribution.
///
/// The top contributor is taken as the maximum count rather than the first
/// entry, so the result does not depend on API ordering. An empty or
/// all-zero distribution scores 0.
#[must_use]
pub fn bus_factor_score(contributions: &[u64]) -> f64 {
    let total: u64 = contributions.iter().sum();
    let Some(top) = contributions.iter().copied().max() else {
        return 0.0;
    };
    if total == 0 {
        return 0.0;
    }

    let share = top as f64 / total as f64;
    TIERS
        .iter()
        .find(|(threshold, _)| share >= *threshold)
        .map_or(1.0, |(_, score)| *score)
}

/// Bus factor evaluator. One uncached request, no retry.
pub struct BusFactor {
    client: Arc<dyn HostingApi>,
}

impl BusFactor {
    pub fn new(client: Arc<dyn HostingApi>) -> Self {
        Self { client }
    }
}

impl MetricEvaluator for BusFactor {
    fn kind(&self) -> MetricKind {
        MetricKind::BusFactor
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> MetricOutcome {
        if let Err(e) = ctx.cancel.check("listing contributors") {
            return MetricOutcome::Unknown(e.to_string());
        }

        match self.client.list_contributors(ctx.repo, CONTRIBUTOR_PAGE) {
            Ok(contributors) => {
                let counts: Vec<u64> = contributors.iter().map(|c| c.contributions).collect();
                let score = bus_factor_score(&counts);
                tracing::debug!(
                    "{}: {} contributors, bus factor {score}",
                    ctx.repo,
                    counts.len()
                );
                MetricOutcome::Scored(score)
            }
            Err(e) => {
                tracing::warn!("{}: bus factor unavailable: {e}", ctx.repo);
                MetricOutcome::Unknown(e.to_string())
            }
        }
    }
}
