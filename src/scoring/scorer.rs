//! Evaluation orchestrator.
//!
//! Runs the seven evaluators against one repository, times each of them,
//! isolates their failures and combines the results into a [`ScoreCard`].

use super::scorecard::{MetricStatus, ScoreCard};
use crate::cache::{CacheStats, Clock, MaintainerCache, SystemClock, TtlCache};
use crate::cancel::Cancellation;
use crate::config::AppConfig;
use crate::error::Result;
use crate::hosting::HostingApi;
use crate::metrics::{
    fetch_readme_text, BusFactor, CodeReview, Correctness, DependencyPinning, EvalContext, License,
    MetricEvaluator, MetricKind, MetricOutcome, RampUp, ResponsiveMaintainers,
};
use crate::model::RepoRef;
use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// The result of evaluating one repository.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub repository: RepoRef,
    pub scorecard: ScoreCard,
    /// Decoded README text, empty when there is none
    #[serde(skip)]
    pub readme: String,
}

impl Evaluation {
    /// Split into the scorecard and README text.
    #[must_use]
    pub fn into_parts(self) -> (ScoreCard, String) {
        (self.scorecard, self.readme)
    }
}

/// How one evaluator run ended.
enum MetricRun {
    Finished(MetricOutcome),
    Panicked(String),
    TimedOut,
}

/// Repository scorer.
///
/// Holds the evaluators and their caches; reuse one `Scorer` across
/// evaluations so cached facts are shared. Safe to use from several threads.
///
/// In parallel mode every evaluator of an evaluation gets its own named
/// thread, so one metric's work never runs nested inside another's.
pub struct Scorer {
    client: Arc<dyn HostingApi>,
    evaluators: Vec<Arc<dyn MetricEvaluator>>,
    parallel: bool,
    deadline: Option<Duration>,
}

impl Scorer {
    /// Create a scorer with the wall clock.
    pub fn new(client: Arc<dyn HostingApi>, config: &AppConfig) -> Result<Self> {
        Self::with_clock(client, config, Arc::new(SystemClock))
    }

    /// Create a scorer whose caches and issue windows use `clock`.
    pub fn with_clock(
        client: Arc<dyn HostingApi>,
        config: &AppConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let ttl = config.cache.ttl();
        let evaluators: Vec<Arc<dyn MetricEvaluator>> = vec![
            Arc::new(BusFactor::new(Arc::clone(&client))),
            Arc::new(RampUp::new(Arc::clone(&client))),
            Arc::new(Correctness::new(Arc::clone(&client))),
            Arc::new(License::new(Arc::clone(&client))),
            Arc::new(ResponsiveMaintainers::new(
                Arc::clone(&client),
                Arc::clone(&clock),
                Arc::new(MaintainerCache::new()),
                config.responsiveness.clone(),
            )?),
            Arc::new(
                DependencyPinning::new(
                    Arc::clone(&client),
                    TtlCache::new(ttl, Arc::clone(&clock)),
                    config.retry.policy(config.retry.pinning_retries),
                )
                .cache_failures(config.cache.cache_failures),
            ),
            Arc::new(CodeReview::new(
                Arc::clone(&client),
                TtlCache::new(ttl, Arc::clone(&clock)),
                config.retry.policy(config.retry.code_review_retries),
                config.code_review.clone(),
            )),
        ];

        Ok(Self {
            client,
            evaluators,
            parallel: config.evaluation.parallel,
            deadline: config.evaluation.deadline(),
        })
    }

    /// Replace the evaluator of the same kind.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: Arc<dyn MetricEvaluator>) -> Self {
        let kind = evaluator.kind();
        match self.evaluators.iter_mut().find(|e| e.kind() == kind) {
            Some(slot) => *slot = evaluator,
            None => self.evaluators.push(evaluator),
        }
        self
    }

    /// Run the evaluators concurrently (`true`) or one after another.
    #[must_use]
    pub const fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Give up on unfinished metrics after `deadline`.
    #[must_use]
    pub const fn deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Cache statistics of the caching evaluators.
    #[must_use]
    pub fn cache_stats(&self) -> Vec<(MetricKind, CacheStats)> {
        self.evaluators
            .iter()
            .filter_map(|e| e.cache_stats().map(|stats| (e.kind(), stats)))
            .collect()
    }

    /// Evaluate `owner/repo`.
    ///
    /// Fails only when `owner` or `repo` is empty; every other problem is
    /// absorbed into the affected metric's default score.
    pub fn evaluate(&self, owner: &str, repo: &str) -> Result<Evaluation> {
        self.evaluate_with_cancel(owner, repo, &Cancellation::new())
    }

    /// Evaluate `owner/repo`, giving up when `cancel` fires.
    pub fn evaluate_with_cancel(
        &self,
        owner: &str,
        repo: &str,
        cancel: &Cancellation,
    ) -> Result<Evaluation> {
        let repo = RepoRef::new(owner, repo)?;
        let started = Instant::now();
        let cancel = cancel.child(self.deadline);
        tracing::info!("Evaluating {repo}");

        let readme = match fetch_readme_text(self.client.as_ref(), &repo, &cancel) {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::info!("{repo}: no README");
                String::new()
            }
            Err(e) => {
                tracing::warn!("{repo}: README unavailable: {e}");
                String::new()
            }
        };

        let runs = if self.parallel {
            self.run_parallel(&repo, &readme, &cancel)
        } else {
            self.run_sequential(&repo, &readme, &cancel)
        };

        let mut scorecard = ScoreCard::new();
        for (kind, run, elapsed) in runs {
            match run {
                MetricRun::Finished(outcome) => {
                    scorecard.record(kind, &outcome, elapsed);
                    if !outcome.is_scored() && cancel.is_cancelled() {
                        scorecard.set_status(kind, MetricStatus::TimedOut);
                    }
                }
                MetricRun::Panicked(message) => {
                    tracing::error!("{repo}: {kind} evaluator panicked: {message}");
                    scorecard.record_failure(kind, MetricStatus::Panicked(message), elapsed);
                }
                MetricRun::TimedOut => {
                    tracing::warn!("{repo}: {kind} did not finish before the deadline");
                    scorecard.record_failure(kind, MetricStatus::TimedOut, elapsed);
                }
            }
            let result = scorecard.metric(kind);
            tracing::debug!(
                "{repo}: {kind} = {} ({}s)",
                result.value,
                result.latency_secs
            );
        }

        let net_score = scorecard.compute_net_score();
        scorecard.set_net_score_latency(started.elapsed());
        tracing::info!(
            "{repo}: NetScore {net_score} in {}s",
            scorecard.net_score_latency()
        );

        Ok(Evaluation {
            repository: repo,
            scorecard,
            readme,
        })
    }

    fn run_sequential(
        &self,
        repo: &RepoRef,
        readme: &str,
        cancel: &Cancellation,
    ) -> Vec<(MetricKind, MetricRun, Duration)> {
        let ctx = EvalContext {
            repo,
            readme: Some(readme),
            cancel,
        };
        self.evaluators
            .iter()
            .map(|evaluator| {
                let (run, elapsed) = run_evaluator(evaluator.as_ref(), &ctx);
                (evaluator.kind(), run, elapsed)
            })
            .collect()
    }

    /// Fan the evaluators out on their own threads and collect them until all
    /// have reported or the deadline passes. Threads still running at the
    /// deadline are detached and stop at their next cancellation check.
    fn run_parallel(
        &self,
        repo: &RepoRef,
        readme: &str,
        cancel: &Cancellation,
    ) -> Vec<(MetricKind, MetricRun, Duration)> {
        let started = Instant::now();
        let readme: Arc<str> = Arc::from(readme);
        let (tx, rx) = crossbeam_channel::unbounded();

        let mut slots: Vec<Option<(MetricRun, Duration)>> =
            self.evaluators.iter().map(|_| None).collect();
        let mut pending = slots.len();

        for (index, evaluator) in self.evaluators.iter().enumerate() {
            let tx = tx.clone();
            let worker = Arc::clone(evaluator);
            let target = repo.clone();
            let readme = Arc::clone(&readme);
            let cancel = cancel.clone();
            let spawned = thread::Builder::new()
                .name(format!("repo-trust-metric-{index}"))
                .spawn(move || {
                    let ctx = EvalContext {
                        repo: &target,
                        readme: Some(&*readme),
                        cancel: &cancel,
                    };
                    let (run, elapsed) = run_evaluator(worker.as_ref(), &ctx);
                    // The receiver is gone once the deadline has passed
                    let _ = tx.send((index, run, elapsed));
                });

            if let Err(e) = spawned {
                tracing::error!("{repo}: could not start {} evaluator: {e}", evaluator.kind());
                let outcome = MetricOutcome::Unknown(format!("evaluator thread not started: {e}"));
                slots[index] = Some((MetricRun::Finished(outcome), Duration::ZERO));
                pending -= 1;
            }
        }
        drop(tx);

        while pending > 0 {
            let received = match cancel.deadline() {
                Some(deadline) => rx.recv_deadline(deadline).ok(),
                None => rx.recv().ok(),
            };
            let Some((index, run, elapsed)) = received else {
                break;
            };
            if let Some(slot) = slots.get_mut(index) {
                *slot = Some((run, elapsed));
                pending -= 1;
            }
        }

        if pending > 0 {
            // Stop the stragglers at their next hosting call
            cancel.cancel();
        }

        self.evaluators
            .iter()
            .zip(slots)
            .map(|(evaluator, slot)| {
                let (run, elapsed) = slot.unwrap_or((MetricRun::TimedOut, started.elapsed()));
                (evaluator.kind(), run, elapsed)
            })
            .collect()
    }
}

/// Time one evaluator, converting a panic into a recorded failure.
fn run_evaluator(evaluator: &dyn MetricEvaluator, ctx: &EvalContext<'_>) -> (MetricRun, Duration) {
    let started = Instant::now();
    let run = match catch_unwind(AssertUnwindSafe(|| evaluator.evaluate(ctx))) {
        Ok(outcome) => MetricRun::Finished(outcome),
        Err(payload) => MetricRun::Panicked(panic_message(payload.as_ref())),
    };
    (run, started.elapsed())
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
