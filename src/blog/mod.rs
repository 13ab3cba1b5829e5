//! Blog operations over the issue tracker.
//!
//! Every read is a fresh remote fetch and every mutation is a single remote
//! call; nothing is cached and nothing is retried. Input validation runs
//! before any network traffic.

pub mod images;
pub mod model;

use tracing::{debug, info};

use crate::error::{BlockingPost, Error};
use crate::github::types::{IssuePatch, IssueState, Page, StateFilter};
use crate::github::GitHubClient;
use model::{CommentView, LabelView, Post, PINNED_LABEL};

/// The tracker rejects issue bodies longer than this many characters.
pub const MAX_BODY_CHARS: usize = 65_536;

/// The operation façade: blog verbs translated into tracker calls.
#[derive(Debug, Clone)]
pub struct BlogService {
    client: GitHubClient,
}

impl BlogService {
    #[must_use]
    pub fn new(client: GitHubClient) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn client(&self) -> &GitHubClient {
        &self.client
    }

    /// List posts, newest first, with pagination flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracker request fails.
    pub async fn list_posts(
        &self,
        state: StateFilter,
        page: u32,
        per_page: u32,
    ) -> Result<Page<Post>, Error> {
        let issues = self.client.list_issues(state, page, per_page).await?;
        Ok(issues.map(Post::from))
    }

    /// Fetch a single post.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the post does not exist.
    pub async fn get_post(&self, number: u64) -> Result<Post, Error> {
        check_number(number)?;
        let issue = self.client.get_issue(number).await?;
        Ok(issue.into())
    }

    /// Create a post. Title and body must be non-empty and the body must
    /// fit the tracker's length limit; both are checked before any remote
    /// call.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` on bad input, otherwise a normalized
    /// remote error.
    pub async fn create_post(
        &self,
        title: &str,
        body: &str,
        labels: Option<Vec<String>>,
    ) -> Result<Post, Error> {
        validate_content(title, body)?;
        let issue = self
            .client
            .create_issue(title, body, labels.as_deref())
            .await?;
        info!(number = issue.number, "post created");
        Ok(issue.into())
    }

    /// Replace a post's title, body, and labels.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` on bad input, `Error::NotFound` if the
    /// post is missing, otherwise a normalized remote error.
    pub async fn update_post(
        &self,
        number: u64,
        title: &str,
        body: &str,
        labels: Option<Vec<String>>,
    ) -> Result<Post, Error> {
        check_number(number)?;
        validate_content(title, body)?;
        let issue = self.client.update_issue(number, title, body, labels).await?;
        info!(number, "post updated");
        Ok(issue.into())
    }

    /// Transition a post between open and closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracker rejects the transition.
    pub async fn set_post_state(&self, number: u64, state: IssueState) -> Result<Post, Error> {
        check_number(number)?;
        let patch = IssuePatch {
            state: Some(state),
            ..IssuePatch::default()
        };
        let issue = self.client.update_issue_partial(number, &patch).await?;
        info!(number, state = state.as_str(), "post state changed");
        Ok(issue.into())
    }

    /// Add the reserved `pinned` label to a post; no-op when already
    /// present.
    ///
    /// The read and the write are separate tracker calls with no revision
    /// check, so two concurrent pin/unpin calls on the same post can
    /// interleave and the last write wins. This race is accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if either tracker call fails.
    pub async fn pin_post(&self, number: u64) -> Result<Post, Error> {
        check_number(number)?;
        let issue = self.client.get_issue(number).await?;
        let mut labels: Vec<String> = issue.labels.iter().map(|l| l.name.clone()).collect();
        if labels.iter().any(|n| n == PINNED_LABEL) {
            debug!(number, "post already pinned");
            return Ok(issue.into());
        }
        labels.push(PINNED_LABEL.to_string());
        let patch = IssuePatch {
            labels: Some(labels),
            ..IssuePatch::default()
        };
        let updated = self.client.update_issue_partial(number, &patch).await?;
        info!(number, "post pinned");
        Ok(updated.into())
    }

    /// Remove the reserved `pinned` label from a post; no-op when absent.
    /// Shares the unprotected read-modify-write shape of [`Self::pin_post`].
    ///
    /// # Errors
    ///
    /// Returns an error if either tracker call fails.
    pub async fn unpin_post(&self, number: u64) -> Result<Post, Error> {
        check_number(number)?;
        let issue = self.client.get_issue(number).await?;
        let labels: Vec<String> = issue.labels.iter().map(|l| l.name.clone()).collect();
        if !labels.iter().any(|n| n == PINNED_LABEL) {
            debug!(number, "post not pinned");
            return Ok(issue.into());
        }
        let remaining: Vec<String> = labels.into_iter().filter(|n| n != PINNED_LABEL).collect();
        let patch = IssuePatch {
            labels: Some(remaining),
            ..IssuePatch::default()
        };
        let updated = self.client.update_issue_partial(number, &patch).await?;
        info!(number, "post unpinned");
        Ok(updated.into())
    }

    /// List comments on a post, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracker request fails.
    pub async fn list_comments(
        &self,
        number: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Page<CommentView>, Error> {
        check_number(number)?;
        let comments = self.client.list_comments(number, page, per_page).await?;
        Ok(comments.map(CommentView::from))
    }

    /// Append a comment under the caller's own identity.
    ///
    /// # Errors
    ///
    /// Returns `Error::AuthRequired` when no token is supplied (no remote
    /// call is made), `Error::Validation` for an empty body.
    pub async fn create_comment(
        &self,
        number: u64,
        body: &str,
        user_token: Option<&str>,
    ) -> Result<CommentView, Error> {
        check_number(number)?;
        let Some(token) = user_token else {
            return Err(Error::AuthRequired(
                "Unauthorized - please sign in with GitHub to comment".to_string(),
            ));
        };
        let body = body.trim();
        if body.is_empty() {
            return Err(Error::Validation("Comment body is required".to_string()));
        }
        let client = self.client.with_token(token);
        let comment = client.create_comment(number, body).await?;
        info!(number, comment_id = comment.id, "comment created");
        Ok(comment.into())
    }

    /// Fetch all labels defined on the repository.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracker request fails.
    pub async fn list_labels(&self) -> Result<Vec<LabelView>, Error> {
        let labels = self.client.list_labels().await?;
        Ok(labels.into_iter().map(LabelView::from).collect())
    }

    /// Create a label. The reserved name `pinned` is rejected in any case
    /// variant.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for a missing name/color or a reserved
    /// name, otherwise a normalized remote error.
    pub async fn create_label(
        &self,
        name: &str,
        color: &str,
        description: Option<&str>,
    ) -> Result<LabelView, Error> {
        if name.is_empty() || color.is_empty() {
            return Err(Error::Validation("Name and color are required".to_string()));
        }
        if reserved_on_create(name) {
            return Err(Error::Validation(
                "Label name 'pinned' is reserved for system use".to_string(),
            ));
        }
        let label = self.client.create_label(name, color, description).await?;
        info!(label = %label.name, "label created");
        Ok(label.into())
    }

    /// Delete a label, refusing while any post still carries it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for a missing or reserved name,
    /// `Error::Conflict` listing the blocking posts when the label is in
    /// use, otherwise a normalized remote error.
    pub async fn delete_label(&self, name: &str) -> Result<(), Error> {
        if name.is_empty() {
            return Err(Error::Validation("Label name is required".to_string()));
        }
        if reserved_on_delete(name) {
            return Err(Error::Validation(
                "Cannot delete the 'pinned' label".to_string(),
            ));
        }
        let blocking = self.client.issues_by_label(name).await?;
        if !blocking.is_empty() {
            return Err(Error::Conflict {
                message: format!(
                    "Cannot delete label \"{name}\" because it is used by {} post(s)",
                    blocking.len()
                ),
                posts: blocking
                    .into_iter()
                    .map(|issue| BlockingPost {
                        number: issue.number,
                        title: issue.title,
                        url: issue.html_url,
                    })
                    .collect(),
            });
        }
        self.client.delete_label(name).await?;
        info!(label = name, "label deleted");
        Ok(())
    }
}

fn check_number(number: u64) -> Result<(), Error> {
    if number == 0 {
        return Err(Error::Validation("Invalid post number".to_string()));
    }
    Ok(())
}

fn validate_content(title: &str, body: &str) -> Result<(), Error> {
    if title.is_empty() || body.is_empty() {
        return Err(Error::Validation("Title and body are required".to_string()));
    }
    let chars = body.chars().count();
    if chars > MAX_BODY_CHARS {
        return Err(Error::Validation(format!(
            "Content is too long. Maximum allowed is {MAX_BODY_CHARS} characters, but received \
             {chars} characters."
        )));
    }
    Ok(())
}

/// Creation rejects every case variant of the reserved name, deletion only
/// the exact lowercase name. The asymmetry is long-standing behavior and
/// kept as-is.
fn reserved_on_create(name: &str) -> bool {
    name.to_lowercase() == PINNED_LABEL
}

fn reserved_on_delete(name: &str) -> bool {
    name == PINNED_LABEL
}
