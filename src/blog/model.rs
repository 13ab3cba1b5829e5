//! Domain views of the tracker's wire types.
//!
//! Pure translation only: no network, no state. A post's pinned status is
//! derived from its label set on demand rather than stored, so there is a
//! single source of truth for it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::github::types::{Comment, Issue, IssueState, IssueUser, Label};

/// Reserved label marking a post as featured.
pub const PINNED_LABEL: &str = "pinned";

#[derive(Debug, Clone, Serialize)]
pub struct Author {
    pub login: String,
    pub avatar_url: String,
}

impl From<IssueUser> for Author {
    fn from(user: IssueUser) -> Self {
        Self {
            login: user.login,
            avatar_url: user.avatar_url,
        }
    }
}

/// A label as rendered to clients: color carries a leading `#`.
#[derive(Debug, Clone, Serialize)]
pub struct LabelView {
    pub id: u64,
    pub name: String,
    pub color: String,
    pub description: Option<String>,
    #[serde(rename = "default")]
    pub is_default: bool,
}

impl From<Label> for LabelView {
    fn from(label: Label) -> Self {
        Self {
            id: label.id,
            name: label.name,
            color: display_color(&label.color),
            description: label.description,
            is_default: label.is_default,
        }
    }
}

/// A blog post backed by one tracker issue.
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub state: IssueState,
    pub comments: u64,
    pub labels: Vec<LabelView>,
    pub author: Option<Author>,
    pub html_url: String,
}

impl Post {
    /// Whether the post carries the reserved `pinned` label. Derived from
    /// the label set; there is no separate stored flag.
    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.labels.iter().any(|l| l.name == PINNED_LABEL)
    }
}

impl From<Issue> for Post {
    fn from(issue: Issue) -> Self {
        Self {
            number: issue.number,
            title: issue.title,
            body: issue.body.unwrap_or_default(),
            created_at: issue.created_at,
            updated_at: issue.updated_at,
            state: issue.state,
            comments: issue.comments,
            labels: issue.labels.into_iter().map(LabelView::from).collect(),
            author: issue.user.map(Author::from),
            html_url: issue.html_url,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: u64,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: Option<Author>,
    pub html_url: String,
}

impl From<Comment> for CommentView {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            body: comment.body,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
            author: comment.user.map(Author::from),
            html_url: comment.html_url,
        }
    }
}

/// Ensure a display color carries exactly one leading `#`.
fn display_color(color: &str) -> String {
    format!("#{}", color.trim_start_matches('#'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(name: &str) -> Label {
        Label {
            id: 1,
            name: name.to_string(),
            color: "ededed".to_string(),
            description: None,
            is_default: false,
        }
    }

    fn issue_with_labels(labels: Vec<Label>) -> Issue {
        Issue {
            number: 1,
            title: "Title".to_string(),
            body: Some("Body".to_string()),
            created_at: "2024-01-01T00:00:00Z".parse().unwrap(),
            updated_at: "2024-01-01T00:00:00Z".parse().unwrap(),
            html_url: "https://github.com/o/r/issues/1".to_string(),
            comments: 0,
            state: IssueState::Open,
            labels,
            user: None,
        }
    }

    #[test]
    fn test_pinned_is_derived_from_labels() {
        let pinned: Post = issue_with_labels(vec![label("news"), label("pinned")]).into();
        assert!(pinned.is_pinned());

        let plain: Post = issue_with_labels(vec![label("news")]).into();
        assert!(!plain.is_pinned());

        // Exact name only; a differently-cased label does not pin.
        let cased: Post = issue_with_labels(vec![label("Pinned")]).into();
        assert!(!cased.is_pinned());
    }

    #[test]
    fn test_null_body_becomes_empty_string() {
        let mut issue = issue_with_labels(vec![]);
        issue.body = None;
        let post: Post = issue.into();
        assert_eq!(post.body, "");
    }

    #[test]
    fn test_display_color_prepends_hash() {
        assert_eq!(display_color("ededed"), "#ededed");
        assert_eq!(display_color("#ededed"), "#ededed");
    }
}
