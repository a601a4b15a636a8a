use serde::Serialize;

use crate::issue::types::IssueSummary;

/// Issue category assigned by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Bug,
    FeatureRequest,
    Documentation,
    Question,
    #[default]
    Other,
}

impl IssueType {
    /// Parse the wire name ("bug", "feature_request", ...). Case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bug" => Some(IssueType::Bug),
            "feature_request" => Some(IssueType::FeatureRequest),
            "documentation" => Some(IssueType::Documentation),
            "question" => Some(IssueType::Question),
            "other" => Some(IssueType::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::Bug => "bug",
            IssueType::FeatureRequest => "feature_request",
            IssueType::Documentation => "documentation",
            IssueType::Question => "question",
            IssueType::Other => "other",
        }
    }
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Highest priority the model may assign. 0 means unknown.
pub const MAX_PRIORITY: u8 = 5;

/// Normalized triage of one issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriageResult {
    pub summary: String,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    /// 1 (lowest) to 5 (highest); 0 when analysis failed
    pub priority_score: u8,
    pub suggested_labels: Vec<String>,
    pub potential_impact: String,
}

impl Default for TriageResult {
    /// The record shown whenever the model's answer cannot be used.
    fn default() -> Self {
        Self {
            summary: "AI could not analyze this issue.".to_string(),
            issue_type: IssueType::Other,
            priority_score: 0,
            suggested_labels: vec!["error".to_string()],
            potential_impact: "Unknown".to_string(),
        }
    }
}

/// Everything the dashboard page renders.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardViewModel {
    /// Repository URL as submitted, reused in pagination links
    pub repo_url: String,
    /// "owner/repo"
    pub repo_name: String,
    pub issue_number: u64,
    pub issue_title: Option<String>,
    /// Recent issues for `page`
    pub issues: Vec<IssueSummary>,
    /// Whether the recent issues page was full
    pub has_next_page: bool,
    pub analysis: TriageResult,
    pub page: u32,
}

/// Shown instead of the dashboard when the issue itself could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorView {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_default() {
        let result = TriageResult::default();
        assert_eq!(result.summary, "AI could not analyze this issue.");
        assert_eq!(result.issue_type, IssueType::Other);
        assert_eq!(result.priority_score, 0);
        assert_eq!(result.suggested_labels, vec!["error".to_string()]);
        assert_eq!(result.potential_impact, "Unknown");
    }

    #[test]
    fn test_issue_type_names() {
        for name in ["bug", "feature_request", "documentation", "question", "other"] {
            let parsed = IssueType::from_name(name).unwrap();
            assert_eq!(parsed.to_string(), name);
        }
        assert!(IssueType::from_name("Bug").is_none());
        assert!(IssueType::from_name("enhancement").is_none());
    }

    #[test]
    fn test_triage_result_serializes_type_key() {
        let value = serde_json::to_value(TriageResult::default()).unwrap();
        assert_eq!(value["type"], "other");
        assert_eq!(value["priority_score"], 0);
    }
}
