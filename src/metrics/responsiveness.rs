//! Responsive maintainers: how quickly maintainers first answer new issues.
//!
//! Issues from the lookback window are sampled, then every sampled issue is
//! inspected concurrently. The response time of an issue is the gap between
//! its creation and the first comment by a maintainer.

use super::{round_to, EvalContext, MetricEvaluator, MetricKind, MetricOutcome};
use crate::cache::{Clock, MaintainerCache};
use crate::config::{ResponsivenessConfig, SampleStrategy};
use crate::error::{Result, TrustError};
use crate::hosting::{HostingApi, Issue, IssueQuery, ItemState};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::sync::Arc;

/// Largest page the issues endpoint serves.
const MAX_PAGE_SIZE: usize = 100;
/// Hard stop on pagination.
const MAX_PAGES: u32 = 20;
/// Issues younger than this are too new to judge.
const MIN_ISSUE_AGE_HOURS: f64 = 24.0;
/// The distributed strategy fetches this many times `max_issues` to sample from.
const DISTRIBUTED_OVERSAMPLE: usize = 4;
/// Threads of the pool that looks up issue comments.
const ISSUE_WORKERS: usize = 8;
/// Score when no issue produced a maintainer response.
const NO_SIGNAL_SCORE: f64 = 0.5;

/// Upper bounds (hours) of the response-time buckets and their scores.
const TIME_BUCKETS: [(f64, f64); 5] = [
    (48.0, 1.0),
    (96.0, 0.9),
    (168.0, 0.8),
    (336.0, 0.6),
    (720.0, 0.4),
];
const SLOWEST_BUCKET_SCORE: f64 = 0.2;

const TIME_WEIGHT: f64 = 0.7;
const RATE_WEIGHT: f64 = 0.3;

/// Score an average first-response time in hours.
#[must_use]
pub fn time_score(average_hours: f64) -> f64 {
    TIME_BUCKETS
        .iter()
        .find(|(limit, _)| average_hours <= *limit)
        .map_or(SLOWEST_BUCKET_SCORE, |(_, score)| *score)
}

/// Combine average response time and response rate, rounded to 2 decimals.
#[must_use]
pub fn responsiveness_score(average_hours: f64, response_rate: f64) -> f64 {
    round_to(
        time_score(average_hours) * TIME_WEIGHT + response_rate.clamp(0.0, 1.0) * RATE_WEIGHT,
        2,
    )
}

/// Reduce `items` (newest first) to at most `max` entries.
///
/// `Sequential` keeps the newest; `Distributed` picks evenly spaced indices
/// `floor(i * len / max)` across the whole set.
#[must_use]
pub fn sample_issues<T>(items: Vec<T>, max: usize, strategy: SampleStrategy) -> Vec<T> {
    if items.len() <= max {
        return items;
    }
    match strategy {
        SampleStrategy::Sequential => items.into_iter().take(max).collect(),
        SampleStrategy::Distributed => {
            let len = items.len();
            let mut picks = (0..max).map(|i| i * len / max).peekable();
            items
                .into_iter()
                .enumerate()
                .filter_map(|(index, item)| {
                    if picks.peek() == Some(&index) {
                        picks.next();
                        Some(item)
                    } else {
                        None
                    }
                })
                .collect()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum IssueResponse {
    TooNew,
    Answered { hours: f64 },
    Unanswered,
}

/// Responsive maintainers evaluator.
///
/// Comment lookups run on the evaluator's own thread pool, so they never
/// share workers with other metrics.
pub struct ResponsiveMaintainers {
    client: Arc<dyn HostingApi>,
    clock: Arc<dyn Clock>,
    maintainers: Arc<MaintainerCache>,
    config: ResponsivenessConfig,
    pool: rayon::ThreadPool,
}

impl ResponsiveMaintainers {
    pub fn new(
        client: Arc<dyn HostingApi>,
        clock: Arc<dyn Clock>,
        maintainers: Arc<MaintainerCache>,
        config: ResponsivenessConfig,
    ) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(ISSUE_WORKERS)
            .thread_name(|i| format!("repo-trust-issues-{i}"))
            .build()
            .map_err(|e| TrustError::config(format!("failed to start issue lookup pool: {e}")))?;

        Ok(Self {
            client,
            clock,
            maintainers,
            config,
            pool,
        })
    }

    /// Page through issues created since `since` and sample them.
    fn collect_issues(&self, ctx: &EvalContext<'_>, since: DateTime<Utc>) -> Result<Vec<Issue>> {
        let max_issues = self.config.max_issues.max(1);
        let target = match self.config.sample_strategy {
            SampleStrategy::Sequential => max_issues,
            SampleStrategy::Distributed => max_issues.saturating_mul(DISTRIBUTED_OVERSAMPLE),
        };
        let per_page = target.min(MAX_PAGE_SIZE);

        let mut issues = Vec::new();
        for page in 1..=MAX_PAGES {
            ctx.cancel.check("listing issues")?;
            let query = IssueQuery {
                state: ItemState::All,
                since: Some(since),
                per_page: u8::try_from(per_page).unwrap_or(u8::MAX),
                page,
            };
            let batch = self.client.list_issues(ctx.repo, &query)?;
            let fetched = batch.len();
            // `since` filters on update time; newest-first creation order
            // means the first issue older than the window ends the scan.
            let reached_window_end = batch.iter().any(|issue| issue.created_at < since);

            issues.extend(
                batch
                    .into_iter()
                    .filter(|issue| !issue.is_pull_request() && issue.created_at >= since),
            );

            if fetched < per_page || reached_window_end || issues.len() >= target {
                break;
            }
        }

        issues.truncate(target);
        Ok(sample_issues(issues, max_issues, self.config.sample_strategy))
    }

    fn first_response(
        &self,
        ctx: &EvalContext<'_>,
        issue: &Issue,
        now: DateTime<Utc>,
    ) -> Result<IssueResponse> {
        if hours_between(issue.created_at, now) < MIN_ISSUE_AGE_HOURS {
            return Ok(IssueResponse::TooNew);
        }

        ctx.cancel.check("listing issue comments")?;
        let comments = self.client.list_issue_comments(ctx.repo, issue.number)?;
        let first = comments
            .iter()
            .filter(|comment| {
                comment.user.as_ref().is_some_and(|user| {
                    self.maintainers
                        .is_maintainer(ctx.repo, &user.login, comment.author_association)
                })
            })
            .min_by_key(|comment| comment.created_at);

        Ok(first.map_or(IssueResponse::Unanswered, |comment| IssueResponse::Answered {
            hours: hours_between(issue.created_at, comment.created_at).max(0.0),
        }))
    }

    fn score(&self, ctx: &EvalContext<'_>) -> Result<f64> {
        let now = self.clock.now();
        let since = now - chrono::Duration::days(i64::from(self.config.lookback_days));

        let issues = self.collect_issues(ctx, since)?;
        if issues.is_empty() {
            tracing::debug!("{}: no issues in the last {} days", ctx.repo, self.config.lookback_days);
            return Ok(1.0);
        }

        let responses = self.pool.install(|| {
            issues
                .par_iter()
                .map(|issue| self.first_response(ctx, issue, now))
                .collect::<Result<Vec<_>>>()
        })?;

        let hours: Vec<f64> = responses
            .iter()
            .filter_map(|r| match r {
                IssueResponse::Answered { hours } => Some(*hours),
                IssueResponse::TooNew | IssueResponse::Unanswered => None,
            })
            .collect();

        if hours.is_empty() {
            tracing::debug!(
                "{}: no maintainer responses among {} sampled issues",
                ctx.repo,
                issues.len()
            );
            return Ok(NO_SIGNAL_SCORE);
        }

        let average = hours.iter().sum::<f64>() / hours.len() as f64;
        // Too-new issues stay in the sample and count as unanswered
        let rate = hours.len() as f64 / issues.len() as f64;
        tracing::debug!(
            "{}: {}/{} issues answered, average {average:.1}h",
            ctx.repo,
            hours.len(),
            issues.len()
        );
        Ok(responsiveness_score(average, rate))
    }
}

impl MetricEvaluator for ResponsiveMaintainers {
    fn kind(&self) -> MetricKind {
        MetricKind::ResponsiveMaintainers
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> MetricOutcome {
        match self.score(ctx) {
            Ok(score) => MetricOutcome::Scored(score),
            Err(e) => {
                tracing::warn!("{}: maintainer responsiveness unavailable: {e}", ctx.repo);
                MetricOutcome::Unknown(e.to_string())
            }
        }
    }
}

fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_seconds() as f64 / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_buckets() {
        assert_eq!(time_score(0.5), 1.0);
        assert_eq!(time_score(48.0), 1.0);
        assert_eq!(time_score(48.1), 0.9);
        assert_eq!(time_score(168.0), 0.8);
        assert_eq!(time_score(300.0), 0.6);
        assert_eq!(time_score(720.0), 0.4);
        assert_eq!(time_score(721.0), 0.2);
    }

    #[test]
    fn test_combined_score() {
        assert_eq!(responsiveness_score(10.0, 1.0), 1.0);
        // 0.9 * 0.7 + 0.5 * 0.3 = 0.78
        assert_eq!(responsiveness_score(72.0, 0.5), 0.78);
        // 0.2 * 0.7 + 0.5 * 0.3 = 0.29
        assert_eq!(responsiveness_score(1000.0, 0.5), 0.29);
    }

    #[test]
    fn test_sequential_sample_keeps_newest() {
        let sampled = sample_issues((0..10).collect(), 3, SampleStrategy::Sequential);
        assert_eq!(sampled, vec![0, 1, 2]);
    }

    #[test]
    fn test_distributed_sample_spreads_evenly() {
        let sampled = sample_issues((0..12).collect(), 4, SampleStrategy::Distributed);
        assert_eq!(sampled, vec![0, 3, 6, 9]);

        let sampled = sample_issues((0..10).collect(), 3, SampleStrategy::Distributed);
        assert_eq!(sampled, vec![0, 3, 6]);
    }

    #[test]
    fn test_small_sets_are_untouched() {
        let sampled = sample_issues(vec![1, 2], 5, SampleStrategy::Distributed);
        assert_eq!(sampled, vec![1, 2]);
    }

    #[test]
    fn test_hours_between() {
        let a = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let b = DateTime::parse_from_rfc3339("2024-01-02T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(hours_between(a, b), 36.0);
    }
}
