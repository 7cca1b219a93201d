//! Code review: the share of recently closed pull requests that received at
//! least one review.

use super::{EvalContext, MetricEvaluator, MetricKind, MetricOutcome};
use crate::cache::{CacheStats, TtlCache};
use crate::config::CodeReviewConfig;
use crate::error::{ErrorContext, Result};
use crate::hosting::{HostingApi, PullRequestQuery};
use crate::retry::RetryPolicy;
use std::sync::Arc;

/// Code review evaluator. Cached per `owner/repo/reviews`.
///
/// Review lookups run one at a time with a pause between them to stay under
/// the hosting service's secondary rate limits.
pub struct CodeReview {
    client: Arc<dyn HostingApi>,
    cache: TtlCache<f64>,
    retry: RetryPolicy,
    config: CodeReviewConfig,
}

impl CodeReview {
    pub fn new(
        client: Arc<dyn HostingApi>,
        cache: TtlCache<f64>,
        retry: RetryPolicy,
        config: CodeReviewConfig,
    ) -> Self {
        Self {
            client,
            cache,
            retry,
            config,
        }
    }

    fn compute(&self, ctx: &EvalContext<'_>) -> Result<f64> {
        let query = PullRequestQuery::recently_closed(self.config.max_pull_requests.max(1));
        let pulls = self
            .retry
            .run(ctx.cancel, "listing closed pull requests", || {
                self.client.list_pull_requests(ctx.repo, &query)
            })
            .with_context(|| format!("code review for {}", ctx.repo))?;

        if pulls.is_empty() {
            tracing::debug!("{}: no closed pull requests", ctx.repo);
            return Ok(1.0);
        }

        let mut reviewed = 0usize;
        for (index, pull) in pulls.iter().enumerate() {
            if index > 0 {
                ctx.cancel
                    .sleep(self.config.request_interval(), "pausing between review lookups")?;
            }

            let reviews = self.retry.run(ctx.cancel, "listing reviews", || {
                self.client.list_reviews(ctx.repo, pull.number)
            });
            match reviews {
                Ok(reviews) if !reviews.is_empty() => reviewed += 1,
                Ok(_) => {}
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    tracing::debug!(
                        "{}: PR #{} counted as unreviewed: {e}",
                        ctx.repo,
                        pull.number
                    );
                }
            }
        }

        tracing::debug!("{}: {reviewed}/{} pull requests reviewed", ctx.repo, pulls.len());
        Ok(reviewed as f64 / pulls.len() as f64)
    }
}

impl MetricEvaluator for CodeReview {
    fn kind(&self) -> MetricKind {
        MetricKind::CodeReview
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> MetricOutcome {
        let key = ctx.repo.subresource_key("reviews");
        if let Some(score) = self.cache.get(&key) {
            tracing::debug!("{key}: code review served from cache");
            return MetricOutcome::Scored(score);
        }

        match self.compute(ctx) {
            Ok(score) => {
                self.cache.insert(key, score);
                MetricOutcome::Scored(score)
            }
            Err(e) => {
                tracing::warn!("{}: code review unavailable: {e}", ctx.repo);
                MetricOutcome::Unknown(e.to_string())
            }
        }
    }

    fn cache_stats(&self) -> Option<CacheStats> {
        Some(self.cache.stats())
    }
}
