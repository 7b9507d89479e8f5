use uuid::Uuid;

use vesselx_types::api::{AiConversation, AiMessage, AiMessageRequest};

use crate::error::ClientError;
use crate::http::Http;

pub async fn fetch_conversations(http: &Http) -> Result<Vec<AiConversation>, ClientError> {
    http.get("/assistant/conversations").await
}

pub async fn fetch_messages(
    http: &Http,
    conversation_id: Uuid,
) -> Result<Vec<AiMessage>, ClientError> {
    http.get(&format!("/assistant/conversations/{conversation_id}/messages"))
        .await
}

/// Send a prompt and wait for the assistant's reply. Passing no conversation
/// id starts a new thread; the reply's `conversation_id` names it.
pub async fn send_message(
    http: &Http,
    conversation_id: Option<Uuid>,
    req: &AiMessageRequest,
) -> Result<AiMessage, ClientError> {
    let path = match conversation_id {
        Some(id) => format!("/assistant/conversations/{id}/messages"),
        None => "/assistant/conversations".to_string(),
    };
    http.post(&path, req).await
}

pub async fn delete_conversation(http: &Http, conversation_id: Uuid) -> Result<(), ClientError> {
    http.delete_unit(&format!("/assistant/conversations/{conversation_id}"))
        .await
}
