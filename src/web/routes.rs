use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::{auth, AppState};
use crate::blog::images::PublishedImage;
use crate::blog::model::{CommentView, LabelView, Post};
use crate::error::Error;
use crate::github::types::{IssueState, Page, StateFilter};

/// Multipart envelope overhead on top of the image size limit.
const UPLOAD_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Create the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/:number", get(get_post).patch(update_post))
        .route("/posts/:number/state", patch(set_post_state))
        .route("/posts/:number/pin", patch(pin_post))
        .route("/posts/:number/unpin", patch(unpin_post))
        .route(
            "/posts/:number/comments",
            get(list_comments).post(create_comment),
        )
        .route(
            "/labels",
            get(list_labels).post(create_label).delete(delete_label),
        )
        .route("/upload-image", post(upload_image))
        .route("/auth/verify", post(auth::verify))
        .route("/healthz", get(health))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}

// ========== Post Routes ==========

#[derive(Debug, Deserialize)]
pub struct ListPostsParams {
    #[serde(default)]
    state: StateFilter,
    page: Option<u32>,
    per_page: Option<u32>,
}

async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListPostsParams>,
) -> Result<Json<Page<Post>>, Error> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(10).clamp(1, 100);
    let posts = state.blog.list_posts(params.state, page, per_page).await?;
    Ok(Json(posts))
}

#[derive(Debug, Deserialize)]
pub struct PostInput {
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
    labels: Option<Vec<String>>,
}

async fn create_post(
    State(state): State<AppState>,
    Json(input): Json<PostInput>,
) -> Result<Json<Post>, Error> {
    let post = state
        .blog
        .create_post(&input.title, &input.body, input.labels)
        .await?;
    Ok(Json(post))
}

async fn get_post(
    State(state): State<AppState>,
    Path(number): Path<u64>,
) -> Result<Json<Post>, Error> {
    let post = state.blog.get_post(number).await?;
    Ok(Json(post))
}

async fn update_post(
    State(state): State<AppState>,
    Path(number): Path<u64>,
    Json(input): Json<PostInput>,
) -> Result<Json<Post>, Error> {
    let post = state
        .blog
        .update_post(number, &input.title, &input.body, input.labels)
        .await?;
    Ok(Json(post))
}

#[derive(Debug, Deserialize)]
pub struct StateInput {
    state: IssueState,
}

async fn set_post_state(
    State(state): State<AppState>,
    Path(number): Path<u64>,
    Json(input): Json<StateInput>,
) -> Result<Json<Post>, Error> {
    let post = state.blog.set_post_state(number, input.state).await?;
    Ok(Json(post))
}

async fn pin_post(
    State(state): State<AppState>,
    Path(number): Path<u64>,
) -> Result<Json<Post>, Error> {
    let post = state.blog.pin_post(number).await?;
    Ok(Json(post))
}

async fn unpin_post(
    State(state): State<AppState>,
    Path(number): Path<u64>,
) -> Result<Json<Post>, Error> {
    let post = state.blog.unpin_post(number).await?;
    Ok(Json(post))
}

// ========== Comment Routes ==========

#[derive(Debug, Deserialize)]
pub struct ListCommentsParams {
    page: Option<u32>,
    per_page: Option<u32>,
}

async fn list_comments(
    State(state): State<AppState>,
    Path(number): Path<u64>,
    Query(params): Query<ListCommentsParams>,
) -> Result<Json<Page<CommentView>>, Error> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(30).clamp(1, 100);
    let comments = state.blog.list_comments(number, page, per_page).await?;
    Ok(Json(comments))
}

#[derive(Debug, Deserialize)]
pub struct CommentInput {
    #[serde(default)]
    body: String,
}

async fn create_comment(
    State(state): State<AppState>,
    Path(number): Path<u64>,
    headers: HeaderMap,
    Json(input): Json<CommentInput>,
) -> Result<Json<CommentView>, Error> {
    let token = bearer_token(&headers);
    let comment = state
        .blog
        .create_comment(number, &input.body, token.as_deref())
        .await?;
    Ok(Json(comment))
}

/// Extract a bearer token from the Authorization header, if present.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

// ========== Label Routes ==========

async fn list_labels(State(state): State<AppState>) -> Result<Json<Vec<LabelView>>, Error> {
    let labels = state.blog.list_labels().await?;
    Ok(Json(labels))
}

#[derive(Debug, Deserialize)]
pub struct LabelInput {
    #[serde(default)]
    name: String,
    #[serde(default)]
    color: String,
    description: Option<String>,
}

async fn create_label(
    State(state): State<AppState>,
    Json(input): Json<LabelInput>,
) -> Result<Json<LabelView>, Error> {
    let label = state
        .blog
        .create_label(&input.name, &input.color, input.description.as_deref())
        .await?;
    Ok(Json(label))
}

#[derive(Debug, Deserialize)]
pub struct DeleteLabelParams {
    #[serde(default)]
    name: String,
}

async fn delete_label(
    State(state): State<AppState>,
    Query(params): Query<DeleteLabelParams>,
) -> Result<Json<serde_json::Value>, Error> {
    state.blog.delete_label(&params.name).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": format!("Label \"{}\" deleted successfully", params.name),
    })))
}

// ========== Image Upload ==========

async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PublishedImage>, Error> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("Invalid multipart request: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| Error::Validation(format!("Failed to read file: {e}")))?;

        let published = state
            .blog
            .publish_image(&bytes, &content_type, &file_name)
            .await?;
        return Ok(Json(published));
    }

    Err(Error::Validation("No file provided".to_string()))
}

// ========== Health ==========

async fn health() -> &'static str {
    "OK"
}
