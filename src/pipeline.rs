use tracing::{info, info_span, warn, Instrument};

use crate::analysis::TriageAnalyzer;
use crate::issue::{self, GitHubClient};
use crate::report::{self, DashboardViewModel, ErrorView};

/// Run one request end to end: fetch, analyze, normalize.
///
/// Only a failed fetch of the issue itself produces an ErrorView, and in that
/// case the model is never called. Every later failure ends up in the
/// dashboard's triage summary instead.
pub async fn run(
    github: &GitHubClient,
    analyzer: &TriageAnalyzer,
    repo_url: &str,
    issue_number: u64,
    page: u32,
) -> Result<DashboardViewModel, ErrorView> {
    let page = page.max(1);
    let span = info_span!("triage", repo_url = %repo_url, issue = issue_number, page);

    async move {
        info!("fetching issue from GitHub");
        let fetched = match issue::fetch(repo_url, issue_number, page, github).await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(error = %e, "issue fetch failed");
                return Err(ErrorView {
                    error: format!("Could not find issue: {e}"),
                });
            }
        };
        info!(
            comments = fetched.snapshot.comments.len(),
            recent = fetched.recent.issues.len(),
            "fetched issue"
        );

        info!("running AI analysis");
        let analysis_json = analyzer.analyze(&fetched.full_text).await;

        let dashboard = report::build(&fetched, &analysis_json, page);
        info!(issue_type = %dashboard.analysis.issue_type, priority = dashboard.analysis.priority_score, "done");
        Ok(dashboard)
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tests::{Reply, ScriptedGenerator};
    use crate::report::IssueType;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn github_for(server: &MockServer) -> GitHubClient {
        GitHubClient::new(server.base_url(), None, Duration::from_secs(5)).unwrap()
    }

    async fn mock_issue(server: &MockServer, comments_status: u16) {
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/org/repo/issues/7");
                then.status(200)
                    .json_body(json!({"title": "Login fails", "body": "500 on submit"}));
            })
            .await;
        server
            .mock_async(move |when, then| {
                when.method(GET).path("/repos/org/repo/issues/7/comments");
                then.status(comments_status)
                    .json_body(json!([{"body": "same here"}]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/org/repo/issues");
                then.status(200).json_body(json!([{"number": 7, "title": "Login fails"}]));
            })
            .await;
    }

    #[tokio::test]
    async fn test_run_renders_dashboard() {
        let server = MockServer::start_async().await;
        mock_issue(&server, 200).await;
        let generator = Arc::new(ScriptedGenerator::new().reply(
            "primary",
            Reply::Text("```json\n{\"summary\": \"Login broken\", \"type\": \"bug\", \"priority_score\": 5}\n```"),
        ));
        let analyzer = TriageAnalyzer::new(generator.clone(), "primary", "fallback");

        let dashboard = run(&github_for(&server), &analyzer, "https://github.com/org/repo", 7, 1)
            .await
            .unwrap();

        assert_eq!(dashboard.repo_name, "org/repo");
        assert_eq!(dashboard.issue_title.as_deref(), Some("Login fails"));
        assert_eq!(dashboard.analysis.summary, "Login broken");
        assert_eq!(dashboard.analysis.issue_type, IssueType::Bug);
        assert_eq!(dashboard.analysis.priority_score, 5);
        assert_eq!(dashboard.issues.len(), 1);

        let prompt = &generator.calls()[0].1;
        assert!(prompt.contains("Title: Login fails"));
        assert!(prompt.contains("Comment: same here"));
    }

    #[tokio::test]
    async fn test_run_fetch_failure_skips_analysis() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/org/repo/issues/7");
                then.status(404);
            })
            .await;
        let generator = Arc::new(ScriptedGenerator::new().reply("primary", Reply::Text("{}")));
        let analyzer = TriageAnalyzer::new(generator.clone(), "primary", "fallback");

        let err = run(&github_for(&server), &analyzer, "org/repo", 7, 1)
            .await
            .unwrap_err();

        assert_eq!(err.error, "Could not find issue: Error fetching issue: 404");
        assert!(generator.calls().is_empty());
    }

    #[tokio::test]
    async fn test_run_invalid_url_is_fetch_failure() {
        let generator = Arc::new(ScriptedGenerator::new());
        let analyzer = TriageAnalyzer::new(generator.clone(), "primary", "fallback");
        let github = GitHubClient::new("http://127.0.0.1:9", None, Duration::from_secs(1)).unwrap();

        let err = run(&github, &analyzer, "not-a-repo", 1, 1).await.unwrap_err();
        assert!(err.error.starts_with("Could not find issue: Invalid repository URL"));
        assert!(generator.calls().is_empty());
    }

    #[tokio::test]
    async fn test_run_comments_failure_still_renders() {
        let server = MockServer::start_async().await;
        mock_issue(&server, 500).await;
        let generator = Arc::new(ScriptedGenerator::new().reply("primary", Reply::Text("{}")));
        let analyzer = TriageAnalyzer::new(generator.clone(), "primary", "fallback");

        let dashboard = run(&github_for(&server), &analyzer, "org/repo", 7, 1).await;

        assert!(dashboard.is_ok());
        assert!(!generator.calls()[0].1.contains("Comment:"));
    }

    #[tokio::test]
    async fn test_run_analyzer_failure_degrades() {
        let server = MockServer::start_async().await;
        mock_issue(&server, 200).await;
        let generator = Arc::new(
            ScriptedGenerator::new()
                .reply("primary", Reply::Fail("unavailable"))
                .reply("fallback", Reply::Fail("quota exceeded")),
        );
        let analyzer = TriageAnalyzer::new(generator, "primary", "fallback");

        let dashboard = run(&github_for(&server), &analyzer, "org/repo", 7, 2)
            .await
            .unwrap();

        assert!(dashboard.analysis.summary.starts_with("AI Error: Model primary failed"));
        assert_eq!(dashboard.analysis.issue_type, IssueType::Other);
        assert_eq!(dashboard.analysis.priority_score, 0);
        assert_eq!(dashboard.page, 2);
    }
}
