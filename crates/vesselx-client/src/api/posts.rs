use reqwest::Method;
use reqwest::multipart::{Form, Part};
use uuid::Uuid;

use vesselx_types::api::{Comment, CreateCommentRequest, CreatePostRequest, LikeResponse, Post};

use crate::error::ClientError;
use crate::http::{Http, RequestBody};

pub async fn fetch_feed(http: &Http) -> Result<Vec<Post>, ClientError> {
    http.get("/feed").await
}

pub async fn fetch_post(http: &Http, post_id: Uuid) -> Result<Post, ClientError> {
    http.get(&format!("/posts/{post_id}")).await
}

pub async fn create_post(http: &Http, req: &CreatePostRequest) -> Result<Post, ClientError> {
    http.post("/posts", req).await
}

/// Create a post with an attached media file. Goes out as a multipart form
/// (`text` field plus `media` file part), not JSON.
pub async fn create_post_with_media(
    http: &Http,
    text: &str,
    file_name: &str,
    media: Vec<u8>,
) -> Result<Post, ClientError> {
    let part = Part::bytes(media).file_name(file_name.to_string());
    let form = Form::new().text("text", text.to_string()).part("media", part);
    http.request(Method::POST, "/posts", RequestBody::Multipart(form))
        .await
}

pub async fn delete_post(http: &Http, post_id: Uuid) -> Result<(), ClientError> {
    http.delete_unit(&format!("/posts/{post_id}")).await
}

/// Toggle the like. The response carries the authoritative count, which the
/// caller uses to reconcile any optimistic update.
pub async fn toggle_like(http: &Http, post_id: Uuid) -> Result<LikeResponse, ClientError> {
    http.post(&format!("/posts/{post_id}/like"), &serde_json::json!({}))
        .await
}

pub async fn toggle_bookmark(http: &Http, post_id: Uuid) -> Result<(), ClientError> {
    http.post_unit(&format!("/posts/{post_id}/bookmark"), &serde_json::json!({}))
        .await
}

pub async fn fetch_bookmarks(http: &Http) -> Result<Vec<Post>, ClientError> {
    http.get("/bookmarks").await
}

pub async fn fetch_comments(http: &Http, post_id: Uuid) -> Result<Vec<Comment>, ClientError> {
    http.get(&format!("/posts/{post_id}/comments")).await
}

pub async fn add_comment(
    http: &Http,
    post_id: Uuid,
    req: &CreateCommentRequest,
) -> Result<Comment, ClientError> {
    http.post(&format!("/posts/{post_id}/comments"), req).await
}
