pub mod text;
pub mod types;

pub use types::{FetchedIssue, IssueSnapshot, RecentIssuesPage, RepoIssueQuery};

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use types::{IssueComment, IssueSummary, ISSUES_PER_PAGE};

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("Invalid repository URL: {0}")]
    InvalidUrl(String),

    #[error("Error fetching issue: {0}")]
    Status(u16),
}

/// Build a query from a repository URL by taking its last two path segments
/// as owner and repo.
///
/// Accepts full URLs (https://github.com/owner/repo), shorthand (owner/repo),
/// trailing slashes, a trailing ".git", and a query string or fragment, which
/// are dropped. Anything else is taken at face value: a URL with extra
/// segments such as /owner/repo/pull/3 resolves to owner "pull", repo "3"
/// and fails later at the API. Dot segments are rejected so the request path
/// cannot leave /repos/{owner}/{repo}.
pub fn parse_repo_url(
    url: &str,
    issue_number: u64,
    page: u32,
) -> Result<RepoIssueQuery, IssueError> {
    let invalid = || IssueError::InvalidUrl(url.to_string());

    let path = url
        .trim()
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');

    let mut segments = path.rsplit('/');
    let repo = segments.next().ok_or_else(invalid)?;
    let owner = segments.next().ok_or_else(invalid)?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);

    if [owner, repo]
        .iter()
        .any(|segment| matches!(*segment, "" | "." | ".."))
    {
        return Err(invalid());
    }

    Ok(RepoIssueQuery {
        repo_url: path.to_string(),
        owner: owner.to_string(),
        repo: repo.to_string(),
        issue_number,
        page: page.max(1),
    })
}

/// Thin GitHub REST client shared by every request. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(
        api_base: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, IssueError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("issue-triage/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, IssueError> {
        Self::new(
            config.github_api_base(),
            config.github.token.clone(),
            config.timeout(),
        )
    }

    /// GET a JSON document. Anything but 200 is reported as IssueError::Status.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, IssueError> {
        let mut request = self
            .http
            .get(format!("{}{}", self.api_base, path))
            .header("Accept", "application/vnd.github.v3+json")
            .query(query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(IssueError::Status(status.as_u16()));
        }
        Ok(response.json::<T>().await?)
    }
}

#[derive(Debug, Deserialize)]
struct IssueDetail {
    title: Option<String>,
    body: Option<String>,
}

/// Parse `repo_url` and fetch everything the dashboard needs for one issue.
pub async fn fetch(
    repo_url: &str,
    issue_number: u64,
    page: u32,
    client: &GitHubClient,
) -> Result<FetchedIssue, IssueError> {
    let query = parse_repo_url(repo_url, issue_number, page)?;
    debug!(owner = %query.owner, repo = %query.repo, issue = issue_number, page = query.page, "parsed repository URL");
    fetch_issue(query, client).await
}

/// Fetch the issue, its comments and one page of recent issues concurrently.
///
/// Only the issue itself is required: comments and the recent list fall back
/// to empty lists on any failure.
#[instrument(skip(query, client), fields(owner = %query.owner, repo = %query.repo, issue = query.issue_number, page = query.page))]
pub async fn fetch_issue(
    query: RepoIssueQuery,
    client: &GitHubClient,
) -> Result<FetchedIssue, IssueError> {
    let issue_path = format!(
        "/repos/{}/{}/issues/{}",
        query.owner, query.repo, query.issue_number
    );
    let comments_path = format!("{issue_path}/comments");
    let list_path = format!("/repos/{}/{}/issues", query.owner, query.repo);
    let list_query = [
        ("per_page", ISSUES_PER_PAGE.to_string()),
        ("state", "all".to_string()),
        ("sort", "updated".to_string()),
        ("page", query.page.to_string()),
    ];

    let (detail, comments, recent) = tokio::join!(
        client.get_json::<IssueDetail>(&issue_path, &[]),
        client.get_json::<Vec<IssueComment>>(&comments_path, &[]),
        client.get_json::<Vec<IssueSummary>>(&list_path, &list_query),
    );

    let detail = detail?;
    let comments = comments.unwrap_or_else(|e| {
        warn!(error = %e, "comments unavailable, continuing without them");
        Vec::new()
    });
    let recent = recent.unwrap_or_else(|e| {
        warn!(error = %e, "recent issues unavailable, continuing with an empty list");
        Vec::new()
    });
    debug!(comments = comments.len(), recent = recent.len(), "received issue data");

    let snapshot = IssueSnapshot {
        title: detail.title,
        body: detail.body,
        comments,
    };
    let full_text = text::flatten_issue(&snapshot);
    let recent = RecentIssuesPage {
        page: query.page,
        issues: recent,
    };

    Ok(FetchedIssue {
        query,
        snapshot,
        recent,
        full_text,
    })
}
