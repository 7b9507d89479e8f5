use uuid::Uuid;

use vesselx_types::api::{AppNotification, NotificationSettings};

use crate::error::ClientError;
use crate::http::Http;

pub async fn fetch_notifications(http: &Http) -> Result<Vec<AppNotification>, ClientError> {
    http.get("/notifications").await
}

pub async fn mark_read(http: &Http, notification_id: Uuid) -> Result<(), ClientError> {
    http.post_unit(
        &format!("/notifications/{notification_id}/read"),
        &serde_json::json!({}),
    )
    .await
}

pub async fn mark_all_read(http: &Http) -> Result<(), ClientError> {
    http.post_unit("/notifications/read-all", &serde_json::json!({}))
        .await
}

pub async fn fetch_settings(http: &Http) -> Result<NotificationSettings, ClientError> {
    http.get("/notifications/settings").await
}

pub async fn update_settings(
    http: &Http,
    settings: &NotificationSettings,
) -> Result<NotificationSettings, ClientError> {
    http.put("/notifications/settings", settings).await
}
