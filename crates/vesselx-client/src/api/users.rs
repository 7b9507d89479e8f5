use uuid::Uuid;

use vesselx_types::api::{FollowResponse, Post};
use vesselx_types::models::User;

use crate::error::ClientError;
use crate::http::Http;

pub async fn fetch_profile(http: &Http, user_id: Uuid) -> Result<User, ClientError> {
    http.get(&format!("/users/{user_id}")).await
}

pub async fn fetch_user_posts(http: &Http, user_id: Uuid) -> Result<Vec<Post>, ClientError> {
    http.get(&format!("/users/{user_id}/posts")).await
}

pub async fn search(http: &Http, query: &str) -> Result<Vec<User>, ClientError> {
    http.get_with_query("/users/search", &[("q", query)]).await
}

pub async fn toggle_follow(http: &Http, user_id: Uuid) -> Result<FollowResponse, ClientError> {
    http.post(&format!("/users/{user_id}/follow"), &serde_json::json!({}))
        .await
}

pub async fn fetch_followers(http: &Http, user_id: Uuid) -> Result<Vec<User>, ClientError> {
    http.get(&format!("/users/{user_id}/followers")).await
}

pub async fn fetch_following(http: &Http, user_id: Uuid) -> Result<Vec<User>, ClientError> {
    http.get(&format!("/users/{user_id}/following")).await
}
