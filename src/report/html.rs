//! HTML views for the web dashboard: the input form, the dashboard itself,
//! and the form again with an error banner.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use std::fmt::Write;

use super::types::{DashboardViewModel, ErrorView, MAX_PRIORITY};

const STYLE: &str = "\
body{font-family:-apple-system,Segoe UI,Helvetica,Arial,sans-serif;margin:0;background:#f6f8fa;color:#24292f}\
main{max-width:960px;margin:0 auto;padding:24px}\
.card{background:#fff;border:1px solid #d0d7de;border-radius:6px;padding:16px;margin-bottom:16px}\
.error{background:#ffebe9;border-color:#ff8182}\
.label{display:inline-block;background:#ddf4ff;border-radius:12px;padding:2px 8px;margin-right:4px;font-size:12px}\
.p4,.p5{color:#cf222e}.p3{color:#9a6700}.p1,.p2{color:#1a7f37}.p0{color:#57606a}\
table{width:100%;border-collapse:collapse}td{padding:6px;border-top:1px solid #d0d7de}\
.current{font-weight:bold}nav a{margin-right:12px}";

/// Escape text for use in element content and quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// GET /analyze link for `issue_number` at `page`, not yet HTML-escaped.
pub fn analyze_link(repo_url: &str, issue_number: u64, page: u32) -> String {
    format!(
        "/analyze?repo_url={}&issue_number={}&page={}",
        utf8_percent_encode(repo_url, NON_ALPHANUMERIC),
        issue_number,
        page
    )
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<main>\n{body}</main>\n</body>\n</html>\n",
        escape(title)
    )
}

fn form(repo_url: &str) -> String {
    format!(
        "<form class=\"card\" method=\"post\" action=\"/analyze\">\n\
         <label>Repository URL <input name=\"repo_url\" required placeholder=\"https://github.com/owner/repo\" value=\"{}\"></label>\n\
         <label>Issue number <input name=\"issue_number\" type=\"number\" min=\"1\" required></label>\n\
         <button type=\"submit\">Analyze</button>\n</form>\n",
        escape(repo_url)
    )
}

/// The landing page, optionally with an error banner above the form.
pub fn render_index(error: Option<&str>) -> String {
    let mut body = String::from("<h1>Issue Triage</h1>\n");
    if let Some(error) = error {
        let _ = writeln!(body, "<div class=\"card error\">{}</div>", escape(error));
    }
    body.push_str(&form(""));
    layout("Issue Triage", &body)
}

/// The landing page showing why the issue could not be loaded.
pub fn render_error(view: &ErrorView) -> String {
    render_index(Some(&view.error))
}

pub fn render_dashboard(dashboard: &DashboardViewModel) -> String {
    let analysis = &dashboard.analysis;
    let mut body = String::new();

    let _ = writeln!(
        body,
        "<h1>{} <small>#{}</small></h1>\n<p><a href=\"/\">New analysis</a> · {}</p>",
        escape(dashboard.issue_title.as_deref().unwrap_or("(untitled)")),
        dashboard.issue_number,
        escape(&dashboard.repo_name)
    );

    body.push_str("<section class=\"card\">\n<h2>AI Triage</h2>\n");
    let priority = if analysis.priority_score == 0 {
        "unknown".to_string()
    } else {
        format!("{}/{}", analysis.priority_score, MAX_PRIORITY)
    };
    let _ = writeln!(
        body,
        "<p><strong>Type:</strong> {} · <strong>Priority:</strong> <span class=\"p{}\">{}</span></p>",
        escape(analysis.issue_type.as_str()),
        analysis.priority_score,
        priority
    );
    let _ = writeln!(body, "<p><strong>Summary:</strong> {}</p>", escape(&analysis.summary));
    let _ = writeln!(
        body,
        "<p><strong>Impact:</strong> {}</p>",
        escape(&analysis.potential_impact)
    );
    body.push_str("<p>");
    for label in &analysis.suggested_labels {
        let _ = write!(body, "<span class=\"label\">{}</span>", escape(label));
    }
    body.push_str("</p>\n</section>\n");

    let _ = writeln!(
        body,
        "<section class=\"card\">\n<h2>Recent issues · page {}</h2>",
        dashboard.page
    );
    if dashboard.issues.is_empty() {
        body.push_str("<p>No issues on this page.</p>\n");
    } else {
        body.push_str("<table>\n");
        for issue in &dashboard.issues {
            let kind = if issue.is_pull_request() { "PR" } else { "Issue" };
            let title = escape(issue.title.as_deref().unwrap_or_default());
            let (class, number, title) = match issue.number {
                Some(number) => (
                    if number == dashboard.issue_number {
                        " class=\"current\""
                    } else {
                        ""
                    },
                    format!("#{number}"),
                    format!(
                        "<a href=\"{}\">{title}</a>",
                        escape(&analyze_link(&dashboard.repo_url, number, dashboard.page))
                    ),
                ),
                // Nothing to link to.
                None => ("", String::new(), title),
            };
            let _ = writeln!(
                body,
                "<tr{class}><td>{kind} {number}</td><td>{title}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(issue.state.as_deref().unwrap_or_default()),
                escape(issue.author().unwrap_or_default()),
                escape(issue.updated_at.as_deref().unwrap_or_default()),
            );
        }
        body.push_str("</table>\n");
    }

    body.push_str("<nav>");
    if dashboard.page > 1 {
        let _ = write!(
            body,
            "<a href=\"{}\">&larr; Previous</a>",
            escape(&analyze_link(
                &dashboard.repo_url,
                dashboard.issue_number,
                dashboard.page - 1
            ))
        );
    }
    if let Some(next) = dashboard
        .page
        .checked_add(1)
        .filter(|_| dashboard.has_next_page)
    {
        let _ = write!(
            body,
            "<a href=\"{}\">Next &rarr;</a>",
            escape(&analyze_link(&dashboard.repo_url, dashboard.issue_number, next))
        );
    }
    body.push_str("</nav>\n</section>\n");

    layout(&format!("{} #{}", dashboard.repo_name, dashboard.issue_number), &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::types::{IssueSummary, ISSUES_PER_PAGE};
    use crate::report::build;
    use crate::report::tests::sample_fetched;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape("<script>alert('x') & \"y\"</script>"),
            "&lt;script&gt;alert(&#39;x&#39;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_analyze_link_encodes_repo_url() {
        assert_eq!(
            analyze_link("https://github.com/org/repo", 5, 2),
            "/analyze?repo_url=https%3A%2F%2Fgithub%2Ecom%2Forg%2Frepo&issue_number=5&page=2"
        );
    }

    #[test]
    fn test_render_index_with_error() {
        let html = render_index(Some("Could not find issue: <404>"));
        assert!(html.contains("action=\"/analyze\""));
        assert!(html.contains("Could not find issue: &lt;404&gt;"));
        assert!(render_error(&ErrorView {
            error: "boom".to_string()
        })
        .contains("boom"));
    }

    #[test]
    fn test_render_dashboard_shows_triage() {
        let dashboard = build(
            &sample_fetched(1),
            r#"{"summary": "Crash <b>", "type": "bug", "priority_score": 4, "suggested_labels": ["crash"]}"#,
            1,
        );
        let html = render_dashboard(&dashboard);
        assert!(html.contains("Crash on startup"));
        assert!(html.contains("Crash &lt;b&gt;"));
        assert!(html.contains("<span class=\"p4\">4/5</span>"));
        assert!(html.contains("<span class=\"label\">crash</span>"));
        assert!(html.contains("<tr class=\"current\">"));
        assert!(!html.contains("Previous"));
        assert!(!html.contains("Next"));
    }

    #[test]
    fn test_render_dashboard_pagination_links() {
        let mut fetched = sample_fetched(2);
        fetched.recent.issues = (1..=ISSUES_PER_PAGE as u64)
            .map(|n| IssueSummary {
                number: Some(n),
                ..IssueSummary::default()
            })
            .collect();
        let html = render_dashboard(&build(&fetched, "{}", 2));
        assert!(html.contains("issue_number=42&amp;page=1\">&larr; Previous"));
        assert!(html.contains("issue_number=42&amp;page=3\">Next &rarr;"));
    }

    #[test]
    fn test_render_dashboard_degraded_analysis() {
        let html = render_dashboard(&build(&sample_fetched(1), "not json", 1));
        assert!(html.contains("Error parsing AI response"));
        assert!(html.contains("<span class=\"p0\">unknown</span>"));
    }

    #[test]
    fn test_render_dashboard_last_page_has_no_next_link() {
        let mut fetched = sample_fetched(u32::MAX);
        fetched.recent.issues = (1..=ISSUES_PER_PAGE as u64)
            .map(|n| IssueSummary {
                number: Some(n),
                ..IssueSummary::default()
            })
            .collect();
        let html = render_dashboard(&build(&fetched, "{}", u32::MAX));
        assert!(html.contains("&larr; Previous"));
        assert!(!html.contains("Next &rarr;"));
    }

    #[test]
    fn test_render_dashboard_keeps_unnumbered_issues() {
        let mut fetched = sample_fetched(1);
        fetched.recent.issues.push(IssueSummary {
            title: Some("Imported without a number".to_string()),
            ..IssueSummary::default()
        });
        let html = render_dashboard(&build(&fetched, "{}", 1));
        assert!(html.contains("<td>Issue </td><td>Imported without a number</td>"));
    }
}
