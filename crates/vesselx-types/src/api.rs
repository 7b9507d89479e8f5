use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Conversation, Group, Message, User, UserRef};

// -- Auth --

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyResponse {
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordResetConfirm {
    pub token: String,
    pub password: String,
}

// -- Posts --

#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author: UserRef,
    pub text: String,
    pub media_url: Option<String>,
    pub like_count: u32,
    pub comment_count: u32,
    pub liked: bool,
    pub bookmarked: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePostRequest {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author: UserRef,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCommentRequest {
    pub text: String,
}

/// Server-confirmed like state, used to reconcile optimistic updates: the
/// response carries the authoritative count rather than a delta, so a REST
/// reply racing a gateway event for the same post converges on one value.
#[derive(Debug, Clone, Deserialize)]
pub struct LikeResponse {
    pub post_id: Uuid,
    pub liked: bool,
    pub like_count: u32,
}

// -- Users --

#[derive(Debug, Clone, Deserialize)]
pub struct FollowResponse {
    pub user_id: Uuid,
    pub following: bool,
}

// -- Conversations / groups --

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationList {
    pub conversations: Vec<Conversation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupList {
    pub groups: Vec<Group>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    /// Cursor for the next (older) page: pass as `before`
    pub next_before: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub private: bool,
    pub member_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InviteCodeResponse {
    pub group_id: Uuid,
    pub invite_code: String,
}

// -- AI assistant --

#[derive(Debug, Clone, Deserialize)]
pub struct AiConversation {
    pub id: Uuid,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AiMessageRequest {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiMessage {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: AiRole,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiRole {
    User,
    Assistant,
}

// -- Notifications / push --

#[derive(Debug, Clone, Deserialize)]
pub struct AppNotification {
    pub id: Uuid,
    pub kind: String,
    pub actor: Option<UserRef>,
    pub text: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub messages: bool,
    pub groups: bool,
    pub likes: bool,
    pub follows: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushPublicKeyResponse {
    pub public_key: String,
}
