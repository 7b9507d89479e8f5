use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Defaults applied when a push payload omits a field.
pub const DEFAULT_TITLE: &str = "VesselX";
pub const DEFAULT_ICON: &str = "/icons/icon-192.png";
pub const DEFAULT_BADGE: &str = "/icons/badge-72.png";
pub const DEFAULT_TAG: &str = "vesselx-notification";
pub const DEFAULT_URL: &str = "/";
pub const DEFAULT_VIBRATION: [u32; 3] = [200, 100, 200];

/// Inbound push payload. Every field is optional: the server may send as
/// little as `{}` and the worker must still show something sensible.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub conversation_id: Option<Uuid>,
    pub sender_id: Option<Uuid>,
    pub actions: Option<Vec<NotificationAction>>,
    pub tag: Option<String>,
}

impl PushPayload {
    /// Parse payload bytes, falling back to the empty payload on malformed
    /// input so a broken push still produces a default notification.
    pub fn parse(raw: &[u8]) -> PushPayload {
        serde_json::from_slice(raw).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

/// What the hosting runtime should display. `data_url` travels with the
/// notification so the click handler knows where to navigate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDescriptor {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub data_url: String,
    pub actions: Vec<NotificationAction>,
    pub vibration: Vec<u32>,
    /// Notification stays until the user dismisses it
    pub require_interaction: bool,
}

fn default_actions() -> Vec<NotificationAction> {
    vec![
        NotificationAction {
            action: "open".into(),
            title: "Open".into(),
        },
        NotificationAction {
            action: "close".into(),
            title: "Dismiss".into(),
        },
    ]
}

/// Build the notification for a push payload, applying the documented
/// defaults for every absent field.
pub fn build_notification(payload: &PushPayload) -> NotificationDescriptor {
    NotificationDescriptor {
        title: payload.title.clone().unwrap_or_else(|| DEFAULT_TITLE.into()),
        body: payload.body.clone().unwrap_or_default(),
        icon: payload.icon.clone().unwrap_or_else(|| DEFAULT_ICON.into()),
        badge: payload.badge.clone().unwrap_or_else(|| DEFAULT_BADGE.into()),
        tag: payload.tag.clone().unwrap_or_else(|| DEFAULT_TAG.into()),
        data_url: payload.url.clone().unwrap_or_else(|| DEFAULT_URL.into()),
        actions: payload.actions.clone().unwrap_or_else(default_actions),
        vibration: DEFAULT_VIBRATION.to_vec(),
        require_interaction: true,
    }
}
