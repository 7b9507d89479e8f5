use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use vesselx_push::NotificationDescriptor;
use vesselx_types::api::PushPublicKeyResponse;
use vesselx_types::models::PushSubscriptionInfo;

use crate::http::Http;

/// Notification permission as the platform reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
    /// Not yet asked
    Default,
}

/// The hosting runtime's notification and push machinery. A browser host
/// backs this with the service-worker and Push APIs; a native host with the
/// OS notification center; headless hosts use [`UnsupportedPlatform`].
pub trait PushPlatform: Send + Sync {
    fn supports_notifications(&self) -> bool;
    fn supports_push(&self) -> bool;

    /// Register the background worker that receives push events.
    fn register_worker(&self) -> Result<(), String>;

    fn permission(&self) -> Permission;

    /// Prompt the user. Returns the resulting permission.
    fn request_permission(&self) -> Permission;

    /// Create a push subscription authorized by the server's public key.
    fn create_subscription(&self, server_key: &str) -> Result<PushSubscriptionInfo, String>;

    /// Cancel any existing subscription. Returns whether one existed.
    fn cancel_subscription(&self) -> bool;

    /// Display through the background worker (works while unfocused).
    fn show_via_worker(&self, notification: &NotificationDescriptor) -> Result<(), String>;

    /// Display directly from the page/process.
    fn show_direct(&self, notification: &NotificationDescriptor) -> Result<(), String>;

    fn play_sound(&self);

    /// Whether the app window is currently in the background.
    fn is_backgrounded(&self) -> bool;
}

/// Platform with no notification support at all. Every capability check is
/// false and every display call is a no-op, which is exactly the graceful
/// degradation the client promises on such hosts.
pub struct UnsupportedPlatform;

impl PushPlatform for UnsupportedPlatform {
    fn supports_notifications(&self) -> bool {
        false
    }
    fn supports_push(&self) -> bool {
        false
    }
    fn register_worker(&self) -> Result<(), String> {
        Err("no background worker on this platform".into())
    }
    fn permission(&self) -> Permission {
        Permission::Denied
    }
    fn request_permission(&self) -> Permission {
        Permission::Denied
    }
    fn create_subscription(&self, _server_key: &str) -> Result<PushSubscriptionInfo, String> {
        Err("push not supported".into())
    }
    fn cancel_subscription(&self) -> bool {
        false
    }
    fn show_via_worker(&self, _notification: &NotificationDescriptor) -> Result<(), String> {
        Err("no background worker".into())
    }
    fn show_direct(&self, _notification: &NotificationDescriptor) -> Result<(), String> {
        Ok(())
    }
    fn play_sound(&self) {}
    fn is_backgrounded(&self) -> bool {
        false
    }
}

/// What the gateway needs from the notification side: a yes/no on whether an
/// OS notification would currently be seen, and the display/sound calls.
pub trait AlertSink: Send + Sync {
    /// Permission granted and the app is backgrounded.
    fn can_notify(&self) -> bool;
    fn notify(&self, notification: &NotificationDescriptor);
    fn play_sound(&self);
}

/// Bridges notification permission and the push subscription lifecycle to
/// the backend. All failures here are logged booleans — a broken push setup
/// degrades the experience, it never surfaces as a user-facing error.
pub struct PushManager {
    http: Http,
    platform: Arc<dyn PushPlatform>,
    worker_ready: AtomicBool,
    server_key: RwLock<Option<String>>,
}

impl PushManager {
    pub fn new(http: Http, platform: Arc<dyn PushPlatform>) -> Self {
        Self {
            http,
            platform,
            worker_ready: AtomicBool::new(false),
            server_key: RwLock::new(None),
        }
    }

    /// App-start lifecycle: register the worker, then fetch the server's
    /// push public key. Skipped entirely on platforms without push.
    pub async fn init(&self) {
        if !self.platform.supports_push() {
            info!("push not supported on this platform");
            return;
        }
        if let Err(e) = self.platform.register_worker() {
            warn!("background worker registration failed: {}", e);
            return;
        }
        self.worker_ready.store(true, Ordering::Release);

        match self
            .http
            .get::<PushPublicKeyResponse>("/push/public-key")
            .await
        {
            Ok(resp) => {
                *self.server_key.write().unwrap() = Some(resp.public_key);
            }
            Err(e) => warn!("failed to fetch push public key: {}", e),
        }
    }

    /// Prompt for notification permission. `false` when the platform has no
    /// notification support or the user declines.
    pub fn request_permission(&self) -> bool {
        if !self.platform.supports_notifications() {
            return false;
        }
        self.platform.request_permission() == Permission::Granted
    }

    /// Create a push subscription and report it to the server. Requires the
    /// worker and the server key to be ready.
    pub async fn subscribe_to_push(&self) -> bool {
        if !self.worker_ready.load(Ordering::Acquire) {
            warn!("cannot subscribe: background worker not ready");
            return false;
        }
        let Some(key) = self.server_key.read().unwrap().clone() else {
            warn!("cannot subscribe: push public key not available");
            return false;
        };

        let subscription = match self.platform.create_subscription(&key) {
            Ok(sub) => sub,
            Err(e) => {
                warn!("push subscription failed: {}", e);
                return false;
            }
        };

        match self
            .http
            .post_unit("/push/subscriptions", &subscription)
            .await
        {
            Ok(()) => {
                info!("push subscription registered");
                true
            }
            Err(e) => {
                warn!("failed to report push subscription: {}", e);
                false
            }
        }
    }

    /// Cancel any existing subscription and inform the server. Tolerant of
    /// there being nothing to cancel.
    pub async fn unsubscribe_from_push(&self) -> bool {
        if !self.platform.cancel_subscription() {
            debug!("no push subscription to cancel");
        }
        match self.http.delete_unit("/push/subscriptions").await {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to report push unsubscribe: {}", e);
                false
            }
        }
    }

    /// Show a local notification, preferring the worker route so it appears
    /// even when the window isn't focused. Silently does nothing without
    /// permission.
    pub fn show_local_notification(&self, notification: &NotificationDescriptor) {
        if self.platform.permission() != Permission::Granted {
            return;
        }
        if self.worker_ready.load(Ordering::Acquire) {
            if self.platform.show_via_worker(notification).is_ok() {
                return;
            }
            debug!("worker display failed, falling back to direct notification");
        }
        if let Err(e) = self.platform.show_direct(notification) {
            warn!("failed to show notification: {}", e);
        }
    }

    #[cfg(test)]
    fn force_worker_ready(&self) {
        self.worker_ready.store(true, Ordering::Release);
    }
}

impl AlertSink for PushManager {
    fn can_notify(&self) -> bool {
        self.platform.permission() == Permission::Granted && self.platform.is_backgrounded()
    }

    fn notify(&self, notification: &NotificationDescriptor) {
        self.show_local_notification(notification);
    }

    fn play_sound(&self) {
        self.platform.play_sound();
    }
}
