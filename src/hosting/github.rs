//! GitHub REST API client.

use super::traits::HostingApi;
use super::types::{
    Contributor, FileContent, Issue, IssueComment, IssueQuery, PullRequest, PullRequestQuery,
    RepoMetadata, Review,
};
use crate::config::HostingConfig;
use crate::error::{HostingErrorKind, Result, TrustError};
use crate::model::RepoRef;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

/// REST API version pinned in every request.
const API_VERSION: &str = "2022-11-28";

/// Blocking HTTP client for the GitHub REST API.
pub struct GitHubClient {
    client: Client,
    api_base: String,
}

/// Helper to convert reqwest errors to hosting errors
fn network_error(context: &str, err: reqwest::Error) -> TrustError {
    TrustError::hosting(context, HostingErrorKind::Network(err.to_string()))
}

impl GitHubClient {
    /// Create a client from the hosting configuration.
    pub fn new(config: &HostingConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

        if let Some(token) = config.token.as_deref().filter(|t| !t.trim().is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .map_err(|e| TrustError::config(format!("hosting.token is not a valid header: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        } else {
            tracing::warn!("No hosting API token configured; unauthenticated requests are heavily rate limited");
        }

        let user_agent = config.user_agent.clone().unwrap_or_else(|| {
            concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
        });

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(user_agent)
            .default_headers(headers)
            .build()
            .map_err(|e| network_error("Failed to create HTTP client", e))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn repo_url(&self, repo: &RepoRef, suffix: &str) -> String {
        format!("{}/repos/{}/{}{suffix}", self.api_base, repo.owner, repo.repo)
    }

    fn send(&self, context: &str, url: &str, query: &[(&str, String)]) -> Result<Response> {
        tracing::debug!("GET {url} {query:?}");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(|e| network_error(context, e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("{context}: GitHub returned {status}");
            return Err(TrustError::hosting(
                context,
                HostingErrorKind::from_status(status.as_u16()),
            ));
        }
        Ok(response)
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        context: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.send(context, url, query)?.json().map_err(|e| {
            TrustError::hosting(context, HostingErrorKind::InvalidResponse(e.to_string()))
        })
    }

    /// Like [`Self::get_json`], but an empty `204 No Content` body is an empty list.
    fn get_list<T: DeserializeOwned>(
        &self,
        context: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let response = self.send(context, url, query)?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        response.json().map_err(|e| {
            TrustError::hosting(context, HostingErrorKind::InvalidResponse(e.to_string()))
        })
    }
}

impl HostingApi for GitHubClient {
    fn list_contributors(&self, repo: &RepoRef, per_page: u8) -> Result<Vec<Contributor>> {
        self.get_list(
            "listing contributors",
            &self.repo_url(repo, "/contributors"),
            &[("per_page", per_page.to_string())],
        )
    }

    fn repository(&self, repo: &RepoRef) -> Result<RepoMetadata> {
        self.get_json("fetching repository metadata", &self.repo_url(repo, ""), &[])
    }

    fn readme(&self, repo: &RepoRef) -> Result<FileContent> {
        self.get_json("fetching README", &self.repo_url(repo, "/readme"), &[])
    }

    fn file_content(&self, repo: &RepoRef, path: &str) -> Result<FileContent> {
        let suffix = format!("/contents/{}", path.trim_start_matches('/'));
        self.get_json("fetching file content", &self.repo_url(repo, &suffix), &[])
    }

    fn list_pull_requests(
        &self,
        repo: &RepoRef,
        query: &PullRequestQuery,
    ) -> Result<Vec<PullRequest>> {
        self.get_list(
            "listing pull requests",
            &self.repo_url(repo, "/pulls"),
            &[
                ("state", query.state.as_str().to_string()),
                ("sort", query.sort.to_string()),
                ("direction", "desc".to_string()),
                ("per_page", query.per_page.to_string()),
                ("page", query.page.to_string()),
            ],
        )
    }

    fn list_reviews(&self, repo: &RepoRef, number: u64) -> Result<Vec<Review>> {
        self.get_list(
            "listing reviews",
            &self.repo_url(repo, &format!("/pulls/{number}/reviews")),
            &[("per_page", "100".to_string())],
        )
    }

    fn list_issues(&self, repo: &RepoRef, query: &IssueQuery) -> Result<Vec<Issue>> {
        let mut params = vec![
            ("state", query.state.as_str().to_string()),
            ("sort", "created".to_string()),
            ("direction", "desc".to_string()),
            ("per_page", query.per_page.to_string()),
            ("page", query.page.to_string()),
        ];
        if let Some(since) = query.since {
            params.push(("since", since.to_rfc3339()));
        }
        self.get_list("listing issues", &self.repo_url(repo, "/issues"), &params)
    }

    fn list_issue_comments(&self, repo: &RepoRef, number: u64) -> Result<Vec<IssueComment>> {
        self.get_list(
            "listing issue comments",
            &self.repo_url(repo, &format!("/issues/{number}/comments")),
            &[("per_page", "100".to_string())],
        )
    }

    fn name(&self) -> &'static str {
        "GitHub"
    }
}
