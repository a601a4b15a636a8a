use serde::{Deserialize, Serialize};

/// Issues requested per page of the sibling list.
pub const ISSUES_PER_PAGE: usize = 30;

/// Identifies one issue and the page of sibling issues to show next to it.
/// Built by parse_repo_url() in issue/mod.rs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoIssueQuery {
    /// Repository URL as submitted, minus trailing slashes, query and fragment
    pub repo_url: String,
    pub owner: String,
    pub repo: String,
    pub issue_number: u64,
    /// 1-based page of the recent issues list
    pub page: u32,
}

impl RepoIssueQuery {
    /// "owner/repo", as shown in the dashboard header.
    pub fn repo_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// A comment on the analyzed issue. Only the body is kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueComment {
    pub body: Option<String>,
}

/// The analyzed issue as returned by the GitHub API.
/// Title and body are nullable on the wire.
#[derive(Debug, Clone, Default)]
pub struct IssueSnapshot {
    pub title: Option<String>,
    pub body: Option<String>,
    /// Comments in the order GitHub returned them
    pub comments: Vec<IssueComment>,
}

/// Login of the user who opened an issue.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IssueAuthor {
    pub login: Option<String>,
}

/// One row of the recent issues list.
///
/// Every field is optional so that an odd record never costs us the page.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IssueSummary {
    pub number: Option<u64>,
    pub title: Option<String>,
    /// "open" or "closed"
    pub state: Option<String>,
    pub html_url: Option<String>,
    pub updated_at: Option<String>,
    pub user: Option<IssueAuthor>,
    pub comments: Option<u64>,
    /// Present when the entry is a pull request rather than an issue
    pub pull_request: Option<serde_json::Value>,
}

impl IssueSummary {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }

    pub fn author(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.login.as_deref())
    }
}

/// One page of sibling issues, tagged with the page that produced it.
#[derive(Debug, Clone, Default)]
pub struct RecentIssuesPage {
    pub page: u32,
    pub issues: Vec<IssueSummary>,
}

impl RecentIssuesPage {
    /// A full page means there may be another one after it.
    pub fn has_next(&self) -> bool {
        self.issues.len() >= ISSUES_PER_PAGE
    }
}

/// Everything the fetch stage produces for one request.
#[derive(Debug, Clone)]
pub struct FetchedIssue {
    pub query: RepoIssueQuery,
    pub snapshot: IssueSnapshot,
    pub recent: RecentIssuesPage,
    /// Title, body and comments flattened for the model prompt
    pub full_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_name() {
        let query = RepoIssueQuery {
            repo_url: "https://github.com/rust-lang/rust".to_string(),
            owner: "rust-lang".to_string(),
            repo: "rust".to_string(),
            issue_number: 1,
            page: 1,
        };
        assert_eq!(query.repo_name(), "rust-lang/rust");
    }

    #[test]
    fn test_summary_deserializes_sparse_record() {
        let summary: IssueSummary = serde_json::from_str(r#"{"number": 7}"#).unwrap();
        assert_eq!(summary.number, Some(7));
        assert!(summary.title.is_none());
        assert!(summary.author().is_none());
        assert!(!summary.is_pull_request());
    }

    #[test]
    fn test_summary_detects_pull_request() {
        let summary: IssueSummary = serde_json::from_str(
            r#"{"number": 8, "user": {"login": "octocat"}, "pull_request": {"url": "x"}}"#,
        )
        .unwrap();
        assert!(summary.is_pull_request());
        assert_eq!(summary.author(), Some("octocat"));
    }

    #[test]
    fn test_has_next_only_on_full_page() {
        let mut page = RecentIssuesPage {
            page: 1,
            issues: vec![IssueSummary::default(); ISSUES_PER_PAGE - 1],
        };
        assert!(!page.has_next());
        page.issues.push(IssueSummary::default());
        assert!(page.has_next());
    }
}
