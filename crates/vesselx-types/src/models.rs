use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Compact reference to a user. This is the one canonical "person" shape used
/// by messages, conversations, and gateway events — senders are never a bare
/// id in one place and a full profile in another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: Uuid,
    pub username: String,
}

impl From<&User> for UserRef {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

/// An authenticated session. Held in the application context, persisted to
/// local storage, destroyed on logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Message delivery lifecycle. Transitions are forward-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Delivered,
    Read,
}

impl DeliveryStatus {
    /// Apply a status update, ignoring regressions (a late `delivered` after
    /// `read` must not rewind the message).
    pub fn advance(self, next: DeliveryStatus) -> DeliveryStatus {
        if next > self { next } else { self }
    }
}

/// Where a message is addressed: a direct-message peer or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageTarget {
    Group { group_id: Uuid },
    Direct { recipient_id: Uuid },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    pub sender: UserRef,
    #[serde(flatten)]
    pub target: MessageTarget,
    pub created_at: DateTime<Utc>,
    pub status: DeliveryStatus,
}

/// A direct-message thread with one peer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub peer: UserRef,
    pub last_message: Option<Message>,
    pub unread_count: u32,
}

impl Conversation {
    /// Local read-acknowledgement. Idempotent: repeated calls leave the
    /// count at zero.
    pub fn mark_read(&mut self) {
        self.unread_count = 0;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub admin_id: Uuid,
    pub members: Vec<UserRef>,
    pub private: bool,
    pub invite_code: Option<String>,
    pub unread_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Default for Theme {
    fn default() -> Self {
        Theme::Light
    }
}

/// Browser-style push subscription material reported to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushSubscriptionInfo {
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_status_only_moves_forward() {
        assert_eq!(
            DeliveryStatus::Sent.advance(DeliveryStatus::Delivered),
            DeliveryStatus::Delivered
        );
        assert_eq!(
            DeliveryStatus::Delivered.advance(DeliveryStatus::Read),
            DeliveryStatus::Read
        );
        // Late `delivered` after `read` is ignored
        assert_eq!(
            DeliveryStatus::Read.advance(DeliveryStatus::Delivered),
            DeliveryStatus::Read
        );
        assert_eq!(
            DeliveryStatus::Read.advance(DeliveryStatus::Sent),
            DeliveryStatus::Read
        );
    }

    #[test]
    fn mark_read_is_idempotent() {
        let mut conv = Conversation {
            peer: UserRef {
                id: Uuid::new_v4(),
                username: "ada".into(),
            },
            last_message: None,
            unread_count: 7,
        };
        conv.mark_read();
        assert_eq!(conv.unread_count, 0);
        conv.mark_read();
        assert_eq!(conv.unread_count, 0);
    }

    #[test]
    fn message_target_round_trips() {
        let direct = MessageTarget::Direct {
            recipient_id: Uuid::new_v4(),
        };
        let json = serde_json::to_string(&direct).unwrap();
        assert!(json.contains("recipient_id"));
        let back: MessageTarget = serde_json::from_str(&json).unwrap();
        assert_eq!(back, direct);

        let group = MessageTarget::Group {
            group_id: Uuid::new_v4(),
        };
        let json = serde_json::to_string(&group).unwrap();
        assert!(json.contains("group_id"));
        let back: MessageTarget = serde_json::from_str(&json).unwrap();
        assert_eq!(back, group);
    }
}
