//! Direct evaluator tests against the in-memory hosting API.

mod common;

use common::{clock, hours_ago, now, op, repo, FakeHosting};
use repo_trust::config::{CodeReviewConfig, ResponsivenessConfig, SampleStrategy};
use repo_trust::hosting::AuthorAssociation;
use repo_trust::metrics::{
    BusFactor, CodeReview, Correctness, DependencyPinning, License, RampUp,
    ResponsiveMaintainers,
};
use repo_trust::{
    Cancellation, EvalContext, HostingErrorKind, MaintainerCache, MetricEvaluator, MetricOutcome,
    RetryPolicy, TtlCache,
};
use std::sync::Arc;
use std::time::Duration;

const TTL: Duration = Duration::from_secs(3600);

fn run(evaluator: &dyn MetricEvaluator, readme: Option<&str>) -> MetricOutcome {
    let repo = repo();
    let cancel = Cancellation::new();
    evaluator.evaluate(&EvalContext {
        repo: &repo,
        readme,
        cancel: &cancel,
    })
}

fn scored(outcome: MetricOutcome) -> f64 {
    match outcome {
        MetricOutcome::Scored(value) => value,
        MetricOutcome::Unknown(reason) => panic!("expected a score, got unknown: {reason}"),
    }
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

fn pinning(fake: &Arc<FakeHosting>, retries: u32) -> DependencyPinning {
    DependencyPinning::new(
        fake.clone(),
        TtlCache::new(TTL, clock()),
        RetryPolicy::immediate(retries),
    )
}

fn code_review(fake: &Arc<FakeHosting>) -> CodeReview {
    let config = CodeReviewConfig {
        request_interval_ms: 0,
        ..CodeReviewConfig::default()
    };
    CodeReview::new(
        fake.clone(),
        TtlCache::new(TTL, clock()),
        RetryPolicy::immediate(3),
        config,
    )
}

fn responsiveness(fake: &Arc<FakeHosting>, config: ResponsivenessConfig) -> ResponsiveMaintainers {
    ResponsiveMaintainers::new(fake.clone(), clock(), Arc::new(MaintainerCache::new()), config)
        .unwrap()
}

// ============================================================================
// Bus factor
// ============================================================================

#[test]
fn bus_factor_without_contributors_is_zero() {
    let fake = Arc::new(FakeHosting::new());
    assert_eq!(scored(run(&BusFactor::new(fake.clone()), None)), 0.0);
    assert_eq!(fake.calls(op::CONTRIBUTORS), 1);
}

#[test]
fn bus_factor_failure_is_unknown() {
    let fake = Arc::new(FakeHosting::new().failing(
        op::CONTRIBUTORS,
        HostingErrorKind::Network("timed out".to_string()),
    ));
    assert!(!run(&BusFactor::new(fake), None).is_scored());
}

// ============================================================================
// Dependency pinning
// ============================================================================

#[test]
fn pinning_retries_through_rate_limits() {
    let fake = Arc::new(
        FakeHosting::new()
            .with_manifest(serde_json::json!({"dependencies": {"a": "1.0.0"}}))
            .rate_limited(op::FILE, 2),
    );
    assert_eq!(scored(run(&pinning(&fake, 5), None)), 1.0);
    assert_eq!(fake.calls(op::FILE), 3);
}

#[test]
fn pinning_gives_up_after_retry_budget() {
    let fake = Arc::new(
        FakeHosting::new()
            .with_manifest(serde_json::json!({"dependencies": {"a": "1.0.0"}}))
            .rate_limited(op::FILE, 100),
    );
    let evaluator = pinning(&fake, 2);

    assert!(!run(&evaluator, None).is_scored());
    assert_eq!(fake.calls(op::FILE), 3);

    // Failures are not cached by default
    assert!(!run(&evaluator, None).is_scored());
    assert_eq!(fake.calls(op::FILE), 6);
}

#[test]
fn pinning_caches_failures_when_enabled() {
    let fake = Arc::new(FakeHosting::new().failing(op::FILE, HostingErrorKind::Status(502)));
    let evaluator = pinning(&fake, 2).cache_failures(true);

    assert!(!run(&evaluator, None).is_scored());
    assert_eq!(scored(run(&evaluator, None)), 0.0);
    assert_eq!(fake.calls(op::FILE), 1);
}

#[test]
fn pinning_missing_manifest_scores_zero_and_is_cached() {
    let fake = Arc::new(FakeHosting::new());
    let evaluator = pinning(&fake, 2);

    assert_eq!(scored(run(&evaluator, None)), 0.0);
    assert_eq!(scored(run(&evaluator, None)), 0.0);
    assert_eq!(fake.calls(op::FILE), 1);

    let stats = evaluator.cache_stats().unwrap();
    assert_eq!(stats.total_entries, 1);
    assert_eq!(stats.hits, 1);
}

#[test]
fn pinning_averages_across_sections() {
    let fake = Arc::new(FakeHosting::new().with_manifest(serde_json::json!({
        "dependencies": {"a": "^1.0.0"},
        "devDependencies": {"b": "~1.0.0"},
        "peerDependencies": {"c": ">=1.0.0 <2.0.0"}
    })));
    // caret 0.8, tilde 0.6, range 0.4
    assert_close(scored(run(&pinning(&fake, 0), None)), 0.6);
}

#[test]
fn pinning_rejects_malformed_manifest() {
    let fake = Arc::new(FakeHosting::new().with_file("package.json", "{ not json"));
    let evaluator = pinning(&fake, 0);
    assert!(!run(&evaluator, None).is_scored());
    assert_eq!(evaluator.cache_stats().unwrap().total_entries, 0);
}

// ============================================================================
// Code review
// ============================================================================

#[test]
fn code_review_counts_failed_lookups_as_unreviewed() {
    let fake = Arc::new(
        FakeHosting::new()
            .with_pull_requests(3)
            .with_reviews(1, 2)
            .with_review_failure(3, HostingErrorKind::Status(500)),
    );
    let value = scored(run(&code_review(&fake), None));
    assert_close(value, 1.0 / 3.0);
    assert_eq!(fake.calls(op::REVIEWS), 3);
}

#[test]
fn code_review_retries_rate_limited_lookups() {
    let fake = Arc::new(
        FakeHosting::new()
            .with_pull_requests(2)
            .with_reviews(1, 1)
            .with_reviews(2, 1)
            .rate_limited(op::REVIEWS, 1),
    );
    assert_eq!(scored(run(&code_review(&fake), None)), 1.0);
    assert_eq!(fake.calls(op::REVIEWS), 3);
}

#[test]
fn code_review_listing_failure_is_not_cached() {
    let fake = Arc::new(FakeHosting::new().failing(op::PULLS, HostingErrorKind::Status(500)));
    let evaluator = code_review(&fake);

    assert!(!run(&evaluator, None).is_scored());
    assert!(!run(&evaluator, None).is_scored());
    assert_eq!(fake.calls(op::PULLS), 2);
    assert_eq!(fake.calls(op::REVIEWS), 0);
}

#[test]
fn code_review_stops_when_cancelled() {
    let fake = Arc::new(FakeHosting::new().with_pull_requests(3));
    let evaluator = code_review(&fake);
    let repo = repo();
    let cancel = Cancellation::new();
    cancel.cancel();

    let outcome = evaluator.evaluate(&EvalContext {
        repo: &repo,
        readme: None,
        cancel: &cancel,
    });
    assert!(!outcome.is_scored());
    assert_eq!(fake.total_calls(), 0);
}

// ============================================================================
// Responsive maintainers
// ============================================================================

#[test]
fn responsiveness_mixed_issues() {
    let fake = Arc::new(
        FakeHosting::new()
            // Too new to judge
            .with_issue(1, hours_ago(10))
            // Answered by a maintainer after 8 hours
            .with_issue(2, hours_ago(100))
            .with_comment(2, "reporter", AuthorAssociation::None, hours_ago(95))
            .with_comment(2, "maint", AuthorAssociation::Member, hours_ago(90))
            .with_comment(2, "owner", AuthorAssociation::Owner, hours_ago(92))
            // Only a non-maintainer replied
            .with_issue(3, hours_ago(200))
            .with_comment(3, "stranger", AuthorAssociation::None, hours_ago(150))
            // Pull requests are not issues
            .with_pull_request_issue(4, hours_ago(50)),
    );
    let evaluator = responsiveness(&fake, ResponsivenessConfig::default());

    // First maintainer reply after 8h -> time 1.0, rate 1/3
    assert_close(scored(run(&evaluator, None)), 0.8);
    assert_eq!(fake.calls(op::COMMENTS), 2);
}

#[test]
fn responsiveness_rate_counts_too_new_issues() {
    let fake = Arc::new(
        FakeHosting::new()
            .with_issue(1, hours_ago(10))
            .with_issue(2, hours_ago(100))
            .with_comment(2, "maint", AuthorAssociation::Member, hours_ago(92)),
    );
    let evaluator = responsiveness(&fake, ResponsivenessConfig::default());

    // One answer among two sampled issues: 1.0 * 0.7 + 0.5 * 0.3
    assert_close(scored(run(&evaluator, None)), 0.85);
    // The young issue is never looked up
    assert_eq!(fake.calls(op::COMMENTS), 1);
}

#[test]
fn responsiveness_lookups_use_dedicated_pool() {
    let mut fake = FakeHosting::new();
    for number in 1..=10 {
        fake = fake.with_issue(number, hours_ago(48 + number as i64));
    }
    let fake = Arc::new(fake);
    let evaluator = responsiveness(&fake, ResponsivenessConfig::default());
    run(&evaluator, None);

    let threads = fake.comment_threads();
    assert_eq!(threads.len(), 10);
    assert!(
        threads.iter().all(|name| name.starts_with("repo-trust-issues-")),
        "{threads:?}"
    );
}

#[test]
fn responsiveness_without_issues_is_perfect() {
    let fake = Arc::new(FakeHosting::new());
    let evaluator = responsiveness(&fake, ResponsivenessConfig::default());
    assert_eq!(scored(run(&evaluator, None)), 1.0);
}

#[test]
fn responsiveness_ignores_issues_outside_window() {
    let fake = Arc::new(FakeHosting::new().with_issue(1, now() - chrono::Duration::days(40)));
    let evaluator = responsiveness(&fake, ResponsivenessConfig::default());
    assert_eq!(scored(run(&evaluator, None)), 1.0);
    assert_eq!(fake.calls(op::COMMENTS), 0);
}

#[test]
fn responsiveness_unanswered_issues_score_midpoint() {
    let fake = Arc::new(
        FakeHosting::new()
            .with_issue(1, hours_ago(48))
            .with_issue(2, hours_ago(72)),
    );
    let evaluator = responsiveness(&fake, ResponsivenessConfig::default());
    assert_eq!(scored(run(&evaluator, None)), 0.5);
}

#[test]
fn responsiveness_failure_is_unknown() {
    let fake = Arc::new(FakeHosting::new().failing(op::ISSUES, HostingErrorKind::Status(500)));
    let evaluator = responsiveness(&fake, ResponsivenessConfig::default());
    let outcome = run(&evaluator, None);
    assert!(!outcome.is_scored());
    assert_eq!(outcome.value_for(evaluator.kind()), 0.5);
}

#[test]
fn responsiveness_distributed_sampling() {
    let mut fake = FakeHosting::new();
    for number in 1..=12 {
        fake = fake.with_issue(number, hours_ago(30 + number as i64 * 10));
    }
    // Newest first: issues 1, 5 and 9 are sampled
    let fake = Arc::new(fake.with_comment(5, "owner", AuthorAssociation::Owner, hours_ago(56)));
    let config = ResponsivenessConfig {
        max_issues: 3,
        sample_strategy: SampleStrategy::Distributed,
        ..ResponsivenessConfig::default()
    };
    let evaluator = responsiveness(&fake, config);

    // 24h response -> time 1.0, rate 1/3
    assert_close(scored(run(&evaluator, None)), 0.8);
    assert_eq!(fake.calls(op::COMMENTS), 3);
    assert_eq!(fake.calls(op::ISSUES), 1);
}

// ============================================================================
// License
// ============================================================================

#[test]
fn license_declared_identifier_wins() {
    let fake = Arc::new(FakeHosting::new().with_license("Apache-2.0"));
    let outcome = run(&License::new(fake), Some("Released under the MIT license"));
    assert_eq!(scored(outcome), 0.0);

    let fake = Arc::new(FakeHosting::new().with_license("LGPL-2.1-only"));
    assert_eq!(scored(run(&License::new(fake), None)), 1.0);
}

#[test]
fn license_falls_back_to_readme() {
    let readme = Some("Licensed under the GNU Lesser General Public License v3");

    let fake = Arc::new(FakeHosting::new().with_metadata_without_license());
    assert_eq!(scored(run(&License::new(fake), readme)), 1.0);

    let fake = Arc::new(FakeHosting::new().with_license("NOASSERTION"));
    assert_eq!(scored(run(&License::new(fake), readme)), 1.0);

    let fake = Arc::new(FakeHosting::new().failing(op::REPOSITORY, HostingErrorKind::Status(500)));
    assert_eq!(scored(run(&License::new(fake), readme)), 1.0);

    let fake = Arc::new(FakeHosting::new().with_metadata_without_license());
    assert_eq!(scored(run(&License::new(fake), Some("GPL-3.0"))), 0.0);
}

// ============================================================================
// Ramp-up and correctness
// ============================================================================

#[test]
fn ramp_up_fetches_readme_without_context() {
    let fake = Arc::new(FakeHosting::new().with_readme("# Installation\n# Usage\n# Support"));
    let evaluator = RampUp::new(fake.clone());
    assert_close(scored(run(&evaluator, None)), 0.5);
    assert_eq!(fake.calls(op::README), 1);

    assert_eq!(scored(run(&evaluator, Some(""))), 0.0);
    assert_eq!(fake.calls(op::README), 1);
}

#[test]
fn ramp_up_readme_failure_is_unknown() {
    let fake = Arc::new(FakeHosting::new().failing(op::README, HostingErrorKind::Status(500)));
    assert!(!run(&RampUp::new(fake), None).is_scored());
}

#[test]
fn correctness_combines_signals() {
    let fake = Arc::new(
        FakeHosting::new()
            .with_contributors(&[5; 10])
            .with_manifest(serde_json::json!({"scripts": {"test": "mocha"}})),
    );
    assert_close(scored(run(&Correctness::new(fake), Some("# Widgets"))), 0.75);
}

#[test]
fn correctness_caps_contributor_signal() {
    let fake = Arc::new(FakeHosting::new().with_contributors(&[1; 100]));
    // 60 / 200, no README, no manifest
    assert_close(scored(run(&Correctness::new(fake), Some(""))), 0.3);
}

#[test]
fn correctness_treats_blank_readme_as_absent() {
    let manifest = serde_json::json!({"scripts": {"test": "mocha"}});
    let fake = Arc::new(
        FakeHosting::new()
            .with_contributors(&[5; 10])
            .with_manifest(manifest.clone()),
    );
    assert_close(scored(run(&Correctness::new(fake), Some("  \n\t\n"))), 0.55);

    let fake = Arc::new(
        FakeHosting::new()
            .with_contributors(&[5; 10])
            .with_readme("   \n")
            .with_manifest(manifest),
    );
    assert_close(scored(run(&Correctness::new(fake), None)), 0.55);
}

#[test]
fn correctness_is_unknown_only_when_every_check_fails() {
    let fake = Arc::new(
        FakeHosting::new()
            .failing(op::CONTRIBUTORS, HostingErrorKind::Status(500))
            .failing(op::README, HostingErrorKind::Status(500))
            .failing(op::FILE, HostingErrorKind::Status(500)),
    );
    assert!(!run(&Correctness::new(fake), None).is_scored());

    let fake = Arc::new(
        FakeHosting::new()
            .failing(op::CONTRIBUTORS, HostingErrorKind::Status(500))
            .failing(op::FILE, HostingErrorKind::Status(500)),
    );
    assert_eq!(scored(run(&Correctness::new(fake), Some("docs"))), 0.2);
}
