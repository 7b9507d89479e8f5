use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use vesselx_types::api::{CreateGroupRequest, GroupList, InviteCodeResponse, MessagePage};
use vesselx_types::models::Group;

use crate::error::ClientError;
use crate::http::Http;

pub async fn fetch_groups(http: &Http) -> Result<GroupList, ClientError> {
    http.get("/groups").await
}

pub async fn fetch_group(http: &Http, group_id: Uuid) -> Result<Group, ClientError> {
    http.get(&format!("/groups/{group_id}")).await
}

pub async fn create_group(http: &Http, req: &CreateGroupRequest) -> Result<Group, ClientError> {
    http.post("/groups", req).await
}

pub async fn fetch_group_messages(
    http: &Http,
    group_id: Uuid,
    before: Option<DateTime<Utc>>,
) -> Result<MessagePage, ClientError> {
    let path = format!("/groups/{group_id}/messages");
    match before {
        Some(cursor) => {
            let cursor = cursor.to_rfc3339_opts(SecondsFormat::Millis, true);
            http.get_with_query(&path, &[("before", &cursor)]).await
        }
        None => http.get(&path).await,
    }
}

pub async fn mark_group_read(http: &Http, group_id: Uuid) -> Result<(), ClientError> {
    http.post_unit(&format!("/groups/{group_id}/read"), &serde_json::json!({}))
        .await
}

pub async fn add_member(http: &Http, group_id: Uuid, user_id: Uuid) -> Result<Group, ClientError> {
    http.post(
        &format!("/groups/{group_id}/members"),
        &serde_json::json!({ "user_id": user_id }),
    )
    .await
}

pub async fn remove_member(http: &Http, group_id: Uuid, user_id: Uuid) -> Result<(), ClientError> {
    http.delete_unit(&format!("/groups/{group_id}/members/{user_id}"))
        .await
}

pub async fn leave_group(http: &Http, group_id: Uuid) -> Result<(), ClientError> {
    http.post_unit(&format!("/groups/{group_id}/leave"), &serde_json::json!({}))
        .await
}

/// Mint (or fetch) the invite code for a private group. Admin only.
pub async fn invite_code(http: &Http, group_id: Uuid) -> Result<InviteCodeResponse, ClientError> {
    http.post(
        &format!("/groups/{group_id}/invite-code"),
        &serde_json::json!({}),
    )
    .await
}

pub async fn join_by_code(http: &Http, code: &str) -> Result<Group, ClientError> {
    http.post("/groups/join", &serde_json::json!({ "code": code }))
        .await
}
