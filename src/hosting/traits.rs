//! The hosting API seam.
//!
//! Evaluators only ever talk to a [`HostingApi`]. The GitHub implementation
//! lives in [`super::GitHubClient`]; tests supply in-memory fakes.

use super::types::{
    Contributor, FileContent, Issue, IssueComment, IssueQuery, PullRequest, PullRequestQuery,
    RepoMetadata, Review,
};
use crate::error::Result;
use crate::model::RepoRef;

/// Operations the scoring engine needs from a code-hosting service.
///
/// Implementations report HTTP failures as
/// [`HostingErrorKind`](crate::error::HostingErrorKind): 403/429 as
/// `RateLimited`, 404 as `NotFound`. Interpreting a 404 as absence is the
/// caller's decision.
pub trait HostingApi: Send + Sync {
    /// List contributors, first page, up to `per_page` entries.
    fn list_contributors(&self, repo: &RepoRef, per_page: u8) -> Result<Vec<Contributor>>;

    /// Repository metadata (license block, default branch).
    fn repository(&self, repo: &RepoRef) -> Result<RepoMetadata>;

    /// The repository README (base64 payload).
    fn readme(&self, repo: &RepoRef) -> Result<FileContent>;

    /// An arbitrary file at `path` on the default branch.
    fn file_content(&self, repo: &RepoRef, path: &str) -> Result<FileContent>;

    /// One page of pull requests.
    fn list_pull_requests(&self, repo: &RepoRef, query: &PullRequestQuery)
        -> Result<Vec<PullRequest>>;

    /// Reviews submitted on pull request `number`.
    fn list_reviews(&self, repo: &RepoRef, number: u64) -> Result<Vec<Review>>;

    /// One page of issues, newest first.
    fn list_issues(&self, repo: &RepoRef, query: &IssueQuery) -> Result<Vec<Issue>>;

    /// Comments on issue `number`, oldest first.
    fn list_issue_comments(&self, repo: &RepoRef, number: u64) -> Result<Vec<IssueComment>>;

    /// Name of this backend (e.g. "GitHub").
    fn name(&self) -> &'static str;
}
