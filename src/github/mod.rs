//! Client for the GitHub REST API of one configured repository.
//!
//! Owns URL construction, header composition, and decoding of responses
//! into the typed wire structs in [`types`]. Failures are normalized into
//! the crate error taxonomy here so callers never handle raw transport
//! errors.

pub mod types;

use std::time::Duration;

use reqwest::header;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::error::Error;
use types::{
    ApiErrorBody, Comment, ContentWriteResponse, Issue, IssuePatch, Label, Page, Repository,
    StateFilter,
};

const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("github-issue-blog/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct NewIssue<'a> {
    title: &'a str,
    body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    labels: Option<&'a [String]>,
}

#[derive(Debug, Serialize)]
struct NewLabel<'a> {
    name: &'a str,
    color: &'a str,
    description: &'a str,
}

#[derive(Debug, Serialize)]
struct NewComment<'a> {
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct ContentWrite<'a> {
    message: &'a str,
    /// Base64-encoded file content.
    content: &'a str,
}

/// Authenticated client for one `owner/repo`.
///
/// Holds no mutable state beyond its immutable configuration and is cheap
/// to clone.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    owner: String,
    repo: String,
    token: String,
    branch: String,
}

impl GitHubClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if owner, repo, or token is empty.
    /// No network call is attempted.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        if config.github_owner.is_empty()
            || config.github_repo.is_empty()
            || config.github_token.is_empty()
        {
            return Err(Error::Configuration(
                "GitHub configuration is missing. Set GITHUB_OWNER, GITHUB_REPO, and \
                 GITHUB_TOKEN environment variables."
                    .to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to build HTTP client");

        Ok(Self {
            http,
            api_url: config.github_api_url.trim_end_matches('/').to_string(),
            owner: config.github_owner.clone(),
            repo: config.github_repo.clone(),
            token: config.github_token.clone(),
            branch: config.github_branch.clone(),
        })
    }

    /// Derive a client for the same repository authenticated as another
    /// caller. Used to create comments under the commenting user's own
    /// identity.
    #[must_use]
    pub fn with_token(&self, token: &str) -> Self {
        Self {
            token: token.to_string(),
            ..self.clone()
        }
    }

    fn base_url(&self) -> String {
        format!("{}/repos/{}/{}", self.api_url, self.owner, self.repo)
    }

    /// Public raw-content URL for a file committed to the configured branch.
    #[must_use]
    pub fn raw_content_url(&self, path: &str) -> String {
        format!(
            "https://raw.githubusercontent.com/{}/{}/refs/heads/{}/{}",
            self.owner, self.repo, self.branch, path
        )
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    /// Check whether the configured token can push to the repository.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be fetched.
    pub async fn verify_permissions(&self) -> Result<bool, Error> {
        let response = self
            .request(Method::GET, &self.base_url())
            .send()
            .await
            .map_err(transport_error)?;
        let repo: Repository = read_json("Cannot access repository", response).await?;
        Ok(repo.permissions.unwrap_or_default().push)
    }

    /// List issues, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    pub async fn list_issues(
        &self,
        state: StateFilter,
        page: u32,
        per_page: u32,
    ) -> Result<Page<Issue>, Error> {
        let url = format!(
            "{}/issues?state={}&sort=created&direction=desc&page={page}&per_page={per_page}",
            self.base_url(),
            state.as_str()
        );
        debug!(url = %url, "listing issues");
        let response = self
            .request(Method::GET, &url)
            .send()
            .await
            .map_err(transport_error)?;
        let (has_next, has_prev) = page_flags(response.headers());
        let data: Vec<Issue> = read_json("Failed to list issues", response).await?;
        Ok(Page {
            data,
            page,
            per_page,
            has_next,
            has_prev,
        })
    }

    /// Fetch a single issue.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the issue does not exist.
    pub async fn get_issue(&self, number: u64) -> Result<Issue, Error> {
        let url = format!("{}/issues/{number}", self.base_url());
        let response = self
            .request(Method::GET, &url)
            .send()
            .await
            .map_err(transport_error)?;
        read_json("Failed to get issue", response).await
    }

    /// Create a new issue.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracker rejects the request.
    pub async fn create_issue(
        &self,
        title: &str,
        body: &str,
        labels: Option<&[String]>,
    ) -> Result<Issue, Error> {
        let url = format!("{}/issues", self.base_url());
        let payload = NewIssue {
            title,
            body,
            labels,
        };
        let response = self
            .request(Method::POST, &url)
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;
        read_json("Failed to create issue", response).await
    }

    /// Replace an issue's title, body, and labels.
    ///
    /// # Errors
    ///
    /// Returns an error if the issue is missing or the tracker rejects the
    /// update.
    pub async fn update_issue(
        &self,
        number: u64,
        title: &str,
        body: &str,
        labels: Option<Vec<String>>,
    ) -> Result<Issue, Error> {
        let patch = IssuePatch {
            title: Some(title.to_string()),
            body: Some(body.to_string()),
            state: None,
            labels,
        };
        self.update_issue_partial(number, &patch).await
    }

    /// Apply a partial update to an issue.
    ///
    /// # Errors
    ///
    /// Returns an error if the issue is missing or the tracker rejects the
    /// update.
    pub async fn update_issue_partial(
        &self,
        number: u64,
        patch: &IssuePatch,
    ) -> Result<Issue, Error> {
        let url = format!("{}/issues/{number}", self.base_url());
        let response = self
            .request(Method::PATCH, &url)
            .json(patch)
            .send()
            .await
            .map_err(transport_error)?;
        read_json("Failed to update issue", response).await
    }

    /// Fetch all issues carrying a label, in any state.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn issues_by_label(&self, label: &str) -> Result<Vec<Issue>, Error> {
        let url = format!(
            "{}/issues?labels={}&state=all&sort=created&direction=desc",
            self.base_url(),
            urlencoding::encode(label)
        );
        let response = self
            .request(Method::GET, &url)
            .send()
            .await
            .map_err(transport_error)?;
        read_json("Failed to get issues by label", response).await
    }

    /// Fetch all labels defined on the repository.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_labels(&self) -> Result<Vec<Label>, Error> {
        let url = format!("{}/labels", self.base_url());
        let response = self
            .request(Method::GET, &url)
            .send()
            .await
            .map_err(transport_error)?;
        read_json("Failed to list labels", response).await
    }

    /// Create a label. A leading `#` on the color is stripped before
    /// sending; the tracker expects bare hex.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracker rejects the label.
    pub async fn create_label(
        &self,
        name: &str,
        color: &str,
        description: Option<&str>,
    ) -> Result<Label, Error> {
        let url = format!("{}/labels", self.base_url());
        let payload = NewLabel {
            name,
            color: color.trim_start_matches('#'),
            description: description.unwrap_or(""),
        };
        let response = self
            .request(Method::POST, &url)
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;
        read_json("Failed to create label", response).await
    }

    /// Delete a label by name.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the label does not exist.
    pub async fn delete_label(&self, name: &str) -> Result<(), Error> {
        let url = format!("{}/labels/{}", self.base_url(), urlencoding::encode(name));
        let response = self
            .request(Method::DELETE, &url)
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(error_from_response("Failed to delete label", response).await);
        }
        Ok(())
    }

    /// List comments on an issue, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_comments(
        &self,
        number: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Page<Comment>, Error> {
        let url = format!(
            "{}/issues/{number}/comments?page={page}&per_page={per_page}&sort=created&direction=asc",
            self.base_url()
        );
        let response = self
            .request(Method::GET, &url)
            .send()
            .await
            .map_err(transport_error)?;
        let (has_next, has_prev) = page_flags(response.headers());
        let data: Vec<Comment> = read_json("Failed to list comments", response).await?;
        Ok(Page {
            data,
            page,
            per_page,
            has_next,
            has_prev,
        })
    }

    /// Append a comment to an issue.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracker rejects the comment.
    pub async fn create_comment(&self, number: u64, body: &str) -> Result<Comment, Error> {
        let url = format!("{}/issues/{number}/comments", self.base_url());
        let payload = NewComment { body };
        let response = self
            .request(Method::POST, &url)
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;
        read_json("Failed to create comment", response).await
    }

    /// Write a file to the repository via the contents API.
    ///
    /// A 403 here almost always means the token lacks write scope, which is
    /// the single most common operator mistake, so it gets its own error
    /// with remediation text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Permission` on 403, otherwise a normalized remote
    /// error on any non-2xx response.
    pub async fn put_content(
        &self,
        path: &str,
        content_base64: &str,
        message: &str,
    ) -> Result<ContentWriteResponse, Error> {
        let url = format!("{}/contents/{path}", self.base_url());
        let payload = ContentWrite {
            message,
            content: content_base64,
        };
        let response = self
            .request(Method::PUT, &url)
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;
        if response.status() == StatusCode::FORBIDDEN {
            return Err(Error::Permission(
                "Permission denied: the GitHub token needs 'contents: write' permission to \
                 upload images. Create a new token with 'repo' or 'contents: write' scope."
                    .to_string(),
            ));
        }
        read_json("Failed to upload image", response).await
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.api_url)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .finish_non_exhaustive()
    }
}

/// Decode a successful response, or normalize the failure.
async fn read_json<T: DeserializeOwned>(
    op: &'static str,
    response: reqwest::Response,
) -> Result<T, Error> {
    if !response.status().is_success() {
        return Err(error_from_response(op, response).await);
    }
    response.json().await.map_err(|e| Error::Remote {
        status: None,
        message: format!("{op}: failed to decode response: {e}"),
    })
}

/// Map a non-2xx response onto the taxonomy, preferring the tracker's own
/// error message when the body carries one.
async fn error_from_response(op: &str, response: reqwest::Response) -> Error {
    let status = response.status();
    let message = response
        .json::<ApiErrorBody>()
        .await
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });
    if status == StatusCode::NOT_FOUND {
        return Error::NotFound(format!("{op}: {message}"));
    }
    Error::Remote {
        status: Some(status.as_u16()),
        message: format!("{op}: {message}"),
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    Error::Remote {
        status: e.status().map(|s| s.as_u16()),
        message: format!("request failed: {e}"),
    }
}

/// Decode next/previous availability from the `Link` relation header.
fn page_flags(headers: &header::HeaderMap) -> (bool, bool) {
    let link = headers
        .get(header::LINK)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    (link.contains("rel=\"next\""), link.contains("rel=\"prev\""))
}
