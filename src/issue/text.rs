use super::types::IssueSnapshot;

/// Flatten an issue into the plain-text block fed to the model.
///
/// Layout:
///   Title: {title}
///
///   Body:
///   {body}
///
///   Comment: {comment body}      (one line per comment, in order)
///
/// Missing title, body or comment bodies render as empty strings.
pub fn flatten_issue(snapshot: &IssueSnapshot) -> String {
    let mut text = format!(
        "Title: {}\n\nBody:\n{}\n\n",
        snapshot.title.as_deref().unwrap_or_default(),
        snapshot.body.as_deref().unwrap_or_default(),
    );
    for comment in &snapshot.comments {
        text.push_str("Comment: ");
        text.push_str(comment.body.as_deref().unwrap_or_default());
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::types::IssueComment;

    fn snapshot(comments: Vec<&str>) -> IssueSnapshot {
        IssueSnapshot {
            title: Some("Crash on startup".to_string()),
            body: Some("It panics.".to_string()),
            comments: comments
                .into_iter()
                .map(|c| IssueComment {
                    body: Some(c.to_string()),
                })
                .collect(),
        }
    }

    #[test]
    fn test_flatten_without_comments() {
        let text = flatten_issue(&snapshot(vec![]));
        assert_eq!(text, "Title: Crash on startup\n\nBody:\nIt panics.\n\n");
        assert!(!text.contains("Comment:"));
    }

    #[test]
    fn test_flatten_keeps_comment_order() {
        let text = flatten_issue(&snapshot(vec!["first", "second"]));
        assert!(text.ends_with("Comment: first\nComment: second\n"));
    }

    #[test]
    fn test_flatten_missing_fields() {
        let snapshot = IssueSnapshot {
            title: None,
            body: None,
            comments: vec![IssueComment { body: None }],
        };
        assert_eq!(flatten_issue(&snapshot), "Title: \n\nBody:\n\n\nComment: \n");
    }
}
