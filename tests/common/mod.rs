//! In-memory hosting API used by the integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use repo_trust::hosting::{
    AuthorAssociation, Contributor, FileContent, HostingApi, Issue, IssueComment, IssueQuery,
    LicenseInfo, PullRequest, PullRequestQuery, RepoMetadata, Review, User,
};
use repo_trust::{AppConfig, HostingErrorKind, ManualClock, RepoRef, Result, TrustError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Fixed "now" for every test.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn hours_ago(hours: i64) -> DateTime<Utc> {
    now() - ChronoDuration::hours(hours)
}

pub fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(now()))
}

/// Configuration without backoff or throttling delays.
pub fn fast_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.retry.initial_delay_ms = 0;
    config.retry.max_delay_ms = 0;
    config.code_review.request_interval_ms = 0;
    config
}

pub fn repo() -> RepoRef {
    RepoRef::new("octo", "widgets").unwrap()
}

/// Operations the fake counts and can fail.
pub mod op {
    pub const CONTRIBUTORS: &str = "contributors";
    pub const REPOSITORY: &str = "repository";
    pub const README: &str = "readme";
    pub const FILE: &str = "file";
    pub const PULLS: &str = "pulls";
    pub const REVIEWS: &str = "reviews";
    pub const ISSUES: &str = "issues";
    pub const COMMENTS: &str = "comments";
}

/// Scriptable hosting API. Unscripted resources are absent (404).
#[derive(Default)]
pub struct FakeHosting {
    contributors: Vec<Contributor>,
    metadata: Option<RepoMetadata>,
    readme: Option<String>,
    files: HashMap<String, String>,
    pull_requests: Vec<PullRequest>,
    reviews: HashMap<u64, usize>,
    review_failures: HashMap<u64, HostingErrorKind>,
    issues: Vec<Issue>,
    comments: HashMap<u64, Vec<IssueComment>>,
    failures: HashMap<&'static str, HostingErrorKind>,
    rate_limits: Mutex<HashMap<&'static str, usize>>,
    delay: Duration,
    calls: Mutex<HashMap<&'static str, usize>>,
    comment_threads: Mutex<Vec<String>>,
}

impl FakeHosting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contributors(mut self, counts: &[u64]) -> Self {
        self.contributors = counts
            .iter()
            .enumerate()
            .map(|(i, c)| Contributor {
                login: Some(format!("dev{i}")),
                contributions: *c,
            })
            .collect();
        self
    }

    pub fn with_license(mut self, spdx_id: &str) -> Self {
        self.metadata = Some(RepoMetadata {
            full_name: Some("octo/widgets".to_string()),
            default_branch: Some("main".to_string()),
            license: Some(LicenseInfo {
                key: Some(spdx_id.to_lowercase()),
                name: Some(spdx_id.to_string()),
                spdx_id: Some(spdx_id.to_string()),
            }),
        });
        self
    }

    pub fn with_metadata_without_license(mut self) -> Self {
        self.metadata = Some(RepoMetadata::default());
        self
    }

    pub fn with_readme(mut self, text: &str) -> Self {
        self.readme = Some(text.to_string());
        self
    }

    pub fn with_file(mut self, path: &str, text: &str) -> Self {
        self.files.insert(path.to_string(), text.to_string());
        self
    }

    pub fn with_manifest(self, json: serde_json::Value) -> Self {
        self.with_file("package.json", &json.to_string())
    }

    /// Closed pull requests numbered 1..=count.
    pub fn with_pull_requests(mut self, count: u64) -> Self {
        self.pull_requests = (1..=count)
            .map(|number| PullRequest {
                number,
                closed_at: Some(hours_ago(number as i64)),
                merged_at: None,
            })
            .collect();
        self
    }

    pub fn with_reviews(mut self, pull: u64, count: usize) -> Self {
        self.reviews.insert(pull, count);
        self
    }

    pub fn with_review_failure(mut self, pull: u64, kind: HostingErrorKind) -> Self {
        self.review_failures.insert(pull, kind);
        self
    }

    pub fn with_issue(mut self, number: u64, created_at: DateTime<Utc>) -> Self {
        self.issues.push(Issue {
            number,
            created_at,
            user: Some(User {
                login: "reporter".to_string(),
            }),
            pull_request: None,
        });
        self
    }

    pub fn with_pull_request_issue(mut self, number: u64, created_at: DateTime<Utc>) -> Self {
        self.issues.push(Issue {
            number,
            created_at,
            user: None,
            pull_request: Some(serde_json::json!({"url": "https://example.test"})),
        });
        self
    }

    pub fn with_comment(
        mut self,
        issue: u64,
        login: &str,
        association: AuthorAssociation,
        created_at: DateTime<Utc>,
    ) -> Self {
        let comments = self.comments.entry(issue).or_default();
        comments.push(IssueComment {
            id: comments.len() as u64 + 1,
            user: Some(User {
                login: login.to_string(),
            }),
            created_at,
            author_association: association,
        });
        self
    }

    /// Every call to `operation` fails with `kind`.
    pub fn failing(mut self, operation: &'static str, kind: HostingErrorKind) -> Self {
        self.failures.insert(operation, kind);
        self
    }

    /// The first `times` calls to `operation` are rate limited.
    pub fn rate_limited(self, operation: &'static str, times: usize) -> Self {
        self.rate_limits
            .lock()
            .unwrap()
            .insert(operation, times);
        self
    }

    /// Sleep this long inside every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self, operation: &'static str) -> usize {
        self.calls.lock().unwrap().get(operation).copied().unwrap_or(0)
    }

    /// Names of the threads that listed issue comments.
    pub fn comment_threads(&self) -> Vec<String> {
        self.comment_threads.lock().unwrap().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    fn enter(&self, operation: &'static str) -> Result<()> {
        *self.calls.lock().unwrap().entry(operation).or_insert(0) += 1;
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if let Some(kind) = self.failures.get(operation) {
            return Err(TrustError::hosting(operation, kind.clone()));
        }
        let mut limits = self.rate_limits.lock().unwrap();
        if let Some(remaining) = limits.get_mut(operation) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(TrustError::hosting(operation, HostingErrorKind::RateLimited(403)));
            }
        }
        Ok(())
    }

    fn not_found(operation: &str) -> TrustError {
        TrustError::hosting(operation, HostingErrorKind::NotFound)
    }
}

impl HostingApi for FakeHosting {
    fn list_contributors(&self, _repo: &RepoRef, per_page: u8) -> Result<Vec<Contributor>> {
        self.enter(op::CONTRIBUTORS)?;
        Ok(self
            .contributors
            .iter()
            .take(usize::from(per_page))
            .cloned()
            .collect())
    }

    fn repository(&self, _repo: &RepoRef) -> Result<RepoMetadata> {
        self.enter(op::REPOSITORY)?;
        self.metadata
            .clone()
            .ok_or_else(|| Self::not_found(op::REPOSITORY))
    }

    fn readme(&self, _repo: &RepoRef) -> Result<FileContent> {
        self.enter(op::README)?;
        self.readme
            .as_deref()
            .map(|text| FileContent::from_text("README.md", text))
            .ok_or_else(|| Self::not_found(op::README))
    }

    fn file_content(&self, _repo: &RepoRef, path: &str) -> Result<FileContent> {
        self.enter(op::FILE)?;
        self.files
            .get(path)
            .map(|text| FileContent::from_text(path, text))
            .ok_or_else(|| Self::not_found(op::FILE))
    }

    fn list_pull_requests(
        &self,
        _repo: &RepoRef,
        query: &PullRequestQuery,
    ) -> Result<Vec<PullRequest>> {
        self.enter(op::PULLS)?;
        Ok(self
            .pull_requests
            .iter()
            .take(usize::from(query.per_page))
            .cloned()
            .collect())
    }

    fn list_reviews(&self, _repo: &RepoRef, number: u64) -> Result<Vec<Review>> {
        self.enter(op::REVIEWS)?;
        if let Some(kind) = self.review_failures.get(&number) {
            return Err(TrustError::hosting(op::REVIEWS, kind.clone()));
        }
        let count = self.reviews.get(&number).copied().unwrap_or(0);
        Ok((0..count)
            .map(|i| Review {
                id: i as u64 + 1,
                state: Some("APPROVED".to_string()),
                user: None,
            })
            .collect())
    }

    fn list_issues(&self, _repo: &RepoRef, query: &IssueQuery) -> Result<Vec<Issue>> {
        self.enter(op::ISSUES)?;
        let mut issues = self.issues.clone();
        issues.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let per_page = usize::from(query.per_page);
        let skip = (query.page.saturating_sub(1) as usize) * per_page;
        Ok(issues.into_iter().skip(skip).take(per_page).collect())
    }

    fn list_issue_comments(&self, _repo: &RepoRef, number: u64) -> Result<Vec<IssueComment>> {
        self.enter(op::COMMENTS)?;
        let name = std::thread::current().name().unwrap_or_default().to_string();
        self.comment_threads.lock().unwrap().push(name);
        Ok(self.comments.get(&number).cloned().unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "Fake"
    }
}
