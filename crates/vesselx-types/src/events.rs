use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{DeliveryStatus, Message, UserRef};

/// Events delivered over the real-time gateway, server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayEvent {
    /// Server confirms the Join and will route events to this connection
    Ready { user_id: Uuid },

    /// A new direct message addressed to the local user
    DirectMessage { message: Message },

    /// A new message in a group the local user belongs to
    GroupMessage { message: Message },

    /// A direct-message peer started or stopped typing
    Typing { peer: UserRef, typing: bool },

    /// A group member started or stopped typing
    GroupTyping {
        group_id: Uuid,
        member: UserRef,
        typing: bool,
    },

    /// Delivery status of a previously sent message changed
    MessageStatus {
        message_id: Uuid,
        status: DeliveryStatus,
    },

    /// A user came online or went offline
    Presence { user_id: Uuid, online: bool },
}

/// Commands sent from client to server over the gateway. All of these are
/// fire-and-forget: the transport tracks no acknowledgements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayCommand {
    /// Announce the connection's identity so the server can route events to it
    Join { user_id: Uuid, token: String },

    SendDirectMessage { recipient_id: Uuid, text: String },

    SendGroupMessage { group_id: Uuid, text: String },

    /// Acknowledge everything in a direct conversation as read
    MarkDirectRead { peer_id: Uuid },

    /// Acknowledge everything in a group as read
    MarkGroupRead { group_id: Uuid },

    SetTyping { peer_id: Uuid, typing: bool },

    SetGroupTyping { group_id: Uuid, typing: bool },

    /// Start receiving this group's room-scoped events
    JoinGroupRoom { group_id: Uuid },

    LeaveGroupRoom { group_id: Uuid },
}
