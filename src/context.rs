//! Prompt composition and plain-text issue context.

use chrono::{DateTime, SecondsFormat, Utc};

/// An issue as seen by the agent: title, description and comment thread.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Issue {
    /// Issue title.
    pub title: String,
    /// Markdown description, empty when the issue has none.
    pub description: String,
    /// Comments in thread order.
    pub comments: Vec<IssueComment>,
}

/// One comment on an issue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueComment {
    /// Comment body.
    pub body: String,
    /// Creation time, when known.
    pub created_at: Option<DateTime<Utc>>,
    /// Comment author.
    pub author: CommentAuthor,
}

/// The author of a comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentAuthor {
    /// Preferred display name.
    pub display_name: String,
    /// Full name, used when there is no display name.
    pub name: String,
}

impl CommentAuthor {
    fn label(&self) -> &str {
        if !self.display_name.is_empty() {
            &self.display_name
        } else if !self.name.is_empty() {
            &self.name
        } else {
            "Unknown"
        }
    }
}

/// Renders title, description and comments into the text handed to agents.
///
/// Nothing is truncated: agents get the whole thread.
#[must_use]
pub fn build_issue_context(issue: &Issue) -> String {
    let mut out = format!("Title: {}\n", issue.title);

    if issue.description.is_empty() {
        out.push_str("Description: (none)\n");
    } else {
        out.push_str("Description:\n");
        out.push_str(&issue.description);
        out.push('\n');
    }

    if issue.comments.is_empty() {
        out.push_str("Comments: (none)\n");
        return out.trim().to_string();
    }

    out.push_str("Comments:\n");
    for (i, comment) in issue.comments.iter().enumerate() {
        let timestamp = comment.created_at.map_or_else(
            || "unknown time".to_string(),
            |ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true),
        );
        out.push_str(&format!("- {} at {timestamp}\n", comment.author.label()));
        out.push_str(&comment.body);
        out.push('\n');
        if i + 1 < issue.comments.len() {
            out.push('\n');
        }
    }

    out.trim().to_string()
}

/// Combines the user's instruction with the issue context into one prompt.
#[must_use]
pub fn compose_prompt(prompt: &str, issue_context: &str) -> String {
    [
        "Use the issue context below to respond to the instruction.",
        "",
        "Instruction:",
        prompt.trim(),
        "",
        "Issue Context:",
        issue_context.trim(),
    ]
    .join("\n")
    .trim()
    .to_string()
}
