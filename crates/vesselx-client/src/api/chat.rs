use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use vesselx_types::api::{ConversationList, GroupList, MessagePage};

use crate::error::ClientError;
use crate::http::Http;
use crate::unread::UnreadTotals;

pub async fn fetch_conversations(http: &Http) -> Result<ConversationList, ClientError> {
    http.get("/conversations").await
}

/// One page of direct-message history with a peer, newest first. Pass the
/// previous page's `next_before` cursor to walk backwards.
pub async fn fetch_messages(
    http: &Http,
    peer_id: Uuid,
    before: Option<DateTime<Utc>>,
) -> Result<MessagePage, ClientError> {
    let path = format!("/conversations/{peer_id}/messages");
    match before {
        Some(cursor) => {
            let cursor = cursor.to_rfc3339_opts(SecondsFormat::Millis, true);
            http.get_with_query(&path, &[("before", &cursor)]).await
        }
        None => http.get(&path).await,
    }
}

pub async fn mark_conversation_read(http: &Http, peer_id: Uuid) -> Result<(), ClientError> {
    http.post_unit(
        &format!("/conversations/{peer_id}/read"),
        &serde_json::json!({}),
    )
    .await
}

/// Server-reconciled unread totals at session start: sums the conversation
/// and group listings plus the unread notification count.
pub async fn fetch_unread_totals(http: &Http) -> Result<UnreadTotals, ClientError> {
    let conversations = fetch_conversations(http).await?;
    let groups: GroupList = http.get("/groups").await?;
    let unread_notifications: UnreadNotificationCount =
        http.get("/notifications/unread-count").await?;

    Ok(UnreadTotals::from_listings(
        &conversations.conversations,
        &groups.groups,
        unread_notifications.count,
    ))
}

#[derive(Debug, serde::Deserialize)]
struct UnreadNotificationCount {
    count: u32,
}
