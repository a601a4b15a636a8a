pub mod html;
pub mod types;

pub use types::{DashboardViewModel, ErrorView, IssueType, TriageResult};

use crate::issue::FetchedIssue;
use colored::Colorize;
use serde_json::{Map, Value};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use types::MAX_PRIORITY;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// Turn the analyzer's JSON text into a TriageResult. Never fails.
///
/// Starts from TriageResult::default() and:
/// - on invalid JSON, or JSON that is not an object, puts the parse error in `summary`
/// - on an "error" key, puts "AI Error: {error}" in `summary`
/// - otherwise takes each known key whose value has the expected type and
///   keeps the default for the rest. Unknown keys are ignored.
pub fn normalize_analysis(analysis_json: &str) -> TriageResult {
    let mut analysis = TriageResult::default();

    let fields = match serde_json::from_str::<Value>(analysis_json) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => {
            warn!("AI response is not a JSON object");
            analysis.summary = "Error parsing AI response: expected a JSON object".to_string();
            return analysis;
        }
        Err(e) => {
            warn!(error = %e, "AI response is not valid JSON");
            analysis.summary = format!("Error parsing AI response: {e}");
            return analysis;
        }
    };

    if let Some(error) = fields.get("error") {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        analysis.summary = format!("AI Error: {message}");
        return analysis;
    }

    merge_fields(&mut analysis, &fields);
    analysis
}

fn merge_fields(analysis: &mut TriageResult, fields: &Map<String, Value>) {
    if let Some(summary) = fields.get("summary").and_then(Value::as_str) {
        analysis.summary = summary.to_string();
    }
    if let Some(issue_type) = fields
        .get("type")
        .and_then(Value::as_str)
        .and_then(IssueType::from_name)
    {
        analysis.issue_type = issue_type;
    }
    if let Some(score) = fields.get("priority_score").and_then(priority_from_value) {
        analysis.priority_score = score;
    }
    if let Some(labels) = fields.get("suggested_labels").and_then(labels_from_value) {
        analysis.suggested_labels = labels;
    }
    if let Some(impact) = fields.get("potential_impact").and_then(Value::as_str) {
        analysis.potential_impact = impact.to_string();
    }

    for key in fields.keys() {
        if !matches!(
            key.as_str(),
            "summary" | "type" | "priority_score" | "suggested_labels" | "potential_impact"
        ) {
            debug!(key = %key, "ignoring unknown key in AI response");
        }
    }
}

/// Integers 0..=5, including integral floats such as 4.0.
fn priority_from_value(value: &Value) -> Option<u8> {
    let score = match value.as_u64() {
        Some(n) => n,
        None => {
            let f = value.as_f64()?;
            if f.fract() != 0.0 || f < 0.0 {
                return None;
            }
            f as u64
        }
    };
    u8::try_from(score).ok().filter(|s| *s <= MAX_PRIORITY)
}

/// Only an array made entirely of strings is accepted.
fn labels_from_value(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

/// Merge fetched issue data with the analyzer's output into the dashboard
/// view-model. `page` is echoed back unchanged.
#[instrument(skip_all, fields(repo = %fetched.query.repo_name(), issue = fetched.query.issue_number, page = page))]
pub fn build(fetched: &FetchedIssue, analysis_json: &str, page: u32) -> DashboardViewModel {
    let analysis = normalize_analysis(analysis_json);
    debug!(issue_type = %analysis.issue_type, priority = analysis.priority_score, "normalized analysis");

    DashboardViewModel {
        repo_url: fetched.query.repo_url.clone(),
        repo_name: fetched.query.repo_name(),
        issue_number: fetched.query.issue_number,
        issue_title: fetched.snapshot.title.clone(),
        issues: fetched.recent.issues.clone(),
        has_next_page: fetched.recent.has_next(),
        analysis,
        page,
    }
}

/// Output the dashboard to terminal (default) or to a markdown file.
#[instrument(skip(dashboard), fields(repo = %dashboard.repo_name, issue = dashboard.issue_number))]
pub fn output(dashboard: &DashboardViewModel, output_path: Option<&Path>) -> Result<(), ReportError> {
    match output_path {
        None => {
            debug!("writing report to terminal");
            print_terminal_report(dashboard);
            Ok(())
        }
        Some(path) => {
            debug!(path = %path.display(), "writing report to file");
            write_markdown_report(dashboard, path)
        }
    }
}

/// Print the triage card and the recent issues list with colors.
///
/// Issue #42: "Crash on startup"
/// Repository: org/repo
///
/// ═══ AI Triage ═══
/// Type: bug | Priority: 4/5
/// ...
fn print_terminal_report(dashboard: &DashboardViewModel) {
    let analysis = &dashboard.analysis;
    println!();
    println!(
        "Issue #{}: \"{}\"",
        dashboard.issue_number,
        dashboard.issue_title.as_deref().unwrap_or_default()
    );
    println!("Repository: {}", dashboard.repo_name);
    println!();

    println!("═══ AI Triage ═══");
    println!(
        "Type: {} | Priority: {}",
        analysis.issue_type.to_string().bold(),
        colorize_priority(analysis.priority_score)
    );
    println!("Summary: {}", analysis.summary);
    println!("Impact: {}", analysis.potential_impact);
    println!("Labels: {}", analysis.suggested_labels.join(", "));
    println!();

    println!("═══ Recent Issues (page {}) ═══", dashboard.page);
    if dashboard.issues.is_empty() {
        println!("  No issues.");
    }
    for issue in &dashboard.issues {
        let number = issue.number.map(|n| format!("#{n}")).unwrap_or_default();
        let state = match issue.state.as_deref() {
            Some("open") => "open".green(),
            Some(state) => state.dimmed(),
            None => "".normal(),
        };
        println!(
            "  • {} [{}] {}",
            number,
            state,
            issue.title.as_deref().unwrap_or_default()
        );
    }
    println!();
}

/// Same content as the terminal report, in markdown.
fn write_markdown_report(dashboard: &DashboardViewModel, path: &Path) -> Result<(), ReportError> {
    let analysis = &dashboard.analysis;
    let mut md = String::new();
    md.push_str(&format!(
        "# Issue #{}: \"{}\"\n\n",
        dashboard.issue_number,
        dashboard.issue_title.as_deref().unwrap_or_default()
    ));
    md.push_str(&format!("**Repository:** {}\n\n", dashboard.repo_name));

    md.push_str("## AI Triage\n\n");
    md.push_str(&format!(
        "**Type:** {} | **Priority:** {}/{}\n\n",
        analysis.issue_type, analysis.priority_score, MAX_PRIORITY
    ));
    md.push_str(&format!("**Summary:** {}\n\n", analysis.summary));
    md.push_str(&format!("**Impact:** {}\n\n", analysis.potential_impact));
    let labels: Vec<String> = analysis
        .suggested_labels
        .iter()
        .map(|l| format!("`{l}`"))
        .collect();
    md.push_str(&format!("**Labels:** {}\n\n", labels.join(" ")));

    md.push_str(&format!("## Recent Issues (page {})\n\n", dashboard.page));
    if dashboard.issues.is_empty() {
        md.push_str("No issues.\n");
    }
    for issue in &dashboard.issues {
        let number = issue.number.map(|n| format!("#{n}")).unwrap_or_default();
        let title = issue.title.as_deref().unwrap_or_default();
        let line = match issue.html_url.as_deref() {
            Some(url) => format!("- [{number}]({url}) {title}"),
            None => format!("- {number} {title}"),
        };
        md.push_str(&line);
        if let Some(state) = issue.state.as_deref() {
            md.push_str(&format!(" ({state})"));
        }
        md.push('\n');
    }

    std::fs::write(path, md)?;
    Ok(())
}

/// 4-5 red, 3 yellow, 1-2 green, 0 unknown.
fn colorize_priority(score: u8) -> colored::ColoredString {
    let text = format!("{score}/{MAX_PRIORITY}");
    match score {
        0 => "unknown".dimmed(),
        4..=u8::MAX => text.red().bold(),
        3 => text.yellow().bold(),
        _ => text.green().bold(),
    }
}
