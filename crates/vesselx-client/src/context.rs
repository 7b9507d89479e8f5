use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use vesselx_types::models::{Session, Theme};

use crate::bus::{BusEvent, EventBus};
use crate::storage::KeyValueStore;

const KEY_SESSION: &str = "vesselx.session";
const KEY_THEME: &str = "vesselx.theme";
const KEY_SOUND: &str = "vesselx.sound";

/// Application context: the only shared mutable state in the client apart
/// from the unread counters. Session, theme, and sound preference live here
/// behind controlled mutation entry points, with persistence underneath —
/// no component reads ambient storage on its own.
#[derive(Clone)]
pub struct AppContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    session: RwLock<Option<Session>>,
    theme: RwLock<Theme>,
    sound_enabled: AtomicBool,
    store: Box<dyn KeyValueStore>,
    bus: EventBus,
}

impl AppContext {
    /// Build the context, restoring persisted state from the store.
    pub fn new(store: Box<dyn KeyValueStore>, bus: EventBus) -> Self {
        let session = store
            .get(KEY_SESSION)
            .and_then(|raw| match serde_json::from_str::<Session>(&raw) {
                Ok(session) => Some(session),
                Err(e) => {
                    warn!("discarding unreadable persisted session: {}", e);
                    None
                }
            });
        // Symmetric with set_theme's writer; anything else is treated as unset
        let theme = match store.get(KEY_THEME).as_deref() {
            Some("light") => Theme::Light,
            Some("dark") => Theme::Dark,
            _ => Theme::default(),
        };
        let sound_enabled = store
            .get(KEY_SOUND)
            .map(|raw| raw == "true")
            .unwrap_or(true);

        Self {
            inner: Arc::new(ContextInner {
                session: RwLock::new(session),
                theme: RwLock::new(theme),
                sound_enabled: AtomicBool::new(sound_enabled),
                store,
                bus,
            }),
        }
    }

    pub fn session(&self) -> Option<Session> {
        self.inner.session.read().unwrap().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.inner
            .session
            .read()
            .unwrap()
            .as_ref()
            .map(|s| s.token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.session.read().unwrap().is_some()
    }

    /// Login entry point: install and persist the session.
    pub fn set_session(&self, session: Session) {
        info!("session started for {}", session.user.username);
        match serde_json::to_string(&session) {
            Ok(json) => self.inner.store.set(KEY_SESSION, &json),
            Err(e) => warn!("failed to persist session: {}", e),
        }
        *self.inner.session.write().unwrap() = Some(session);
        self.inner.bus.publish(BusEvent::AuthChanged {
            authenticated: true,
        });
    }

    /// Logout entry point: drop and unpersist the session.
    pub fn clear_session(&self) {
        self.inner.store.remove(KEY_SESSION);
        *self.inner.session.write().unwrap() = None;
        self.inner.bus.publish(BusEvent::AuthChanged {
            authenticated: false,
        });
    }

    pub fn theme(&self) -> Theme {
        *self.inner.theme.read().unwrap()
    }

    pub fn set_theme(&self, theme: Theme) {
        let raw = match theme {
            Theme::Light => "light",
            Theme::Dark => "dark",
        };
        self.inner.store.set(KEY_THEME, raw);
        *self.inner.theme.write().unwrap() = theme;
        self.inner.bus.publish(BusEvent::ThemeChanged { theme });
    }

    pub fn sound_enabled(&self) -> bool {
        self.inner.sound_enabled.load(Ordering::Relaxed)
    }

    pub fn set_sound_enabled(&self, enabled: bool) {
        self.inner
            .store
            .set(KEY_SOUND, if enabled { "true" } else { "false" });
        self.inner.sound_enabled.store(enabled, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;
    use vesselx_types::models::User;

    use crate::storage::MemoryStore;

    fn session() -> Session {
        Session {
            token: "tok-123".into(),
            user: User {
                id: Uuid::new_v4(),
                username: "ada".into(),
                display_name: None,
                avatar_url: None,
                created_at: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn login_logout_publish_auth_changes() {
        let bus = EventBus::new();
        let ctx = AppContext::new(Box::new(MemoryStore::new()), bus.clone());
        let mut rx = bus.subscribe();

        ctx.set_session(session());
        assert!(ctx.is_authenticated());
        assert!(matches!(
            rx.recv().await.unwrap(),
            BusEvent::AuthChanged {
                authenticated: true
            }
        ));

        ctx.clear_session();
        assert!(!ctx.is_authenticated());
        assert!(ctx.token().is_none());
        assert!(matches!(
            rx.recv().await.unwrap(),
            BusEvent::AuthChanged {
                authenticated: false
            }
        ));
    }

    #[test]
    fn unrecognized_persisted_theme_falls_back_to_default() {
        let store = MemoryStore::new();
        store.set(KEY_THEME, "solarized");
        let ctx = AppContext::new(Box::new(store), EventBus::new());
        assert_eq!(ctx.theme(), Theme::Light);
    }

    #[test]
    fn session_survives_context_rebuild() {
        let store = Arc::new(MemoryStore::new());
        let s = session();

        struct Shared(Arc<MemoryStore>);
        impl KeyValueStore for Shared {
            fn get(&self, key: &str) -> Option<String> {
                self.0.get(key)
            }
            fn set(&self, key: &str, value: &str) {
                self.0.set(key, value)
            }
            fn remove(&self, key: &str) {
                self.0.remove(key)
            }
        }

        let ctx = AppContext::new(Box::new(Shared(store.clone())), EventBus::new());
        ctx.set_session(s.clone());
        ctx.set_theme(Theme::Dark);
        ctx.set_sound_enabled(false);

        let restored = AppContext::new(Box::new(Shared(store)), EventBus::new());
        assert_eq!(restored.token().as_deref(), Some("tok-123"));
        assert_eq!(restored.theme(), Theme::Dark);
        assert!(!restored.sound_enabled());
    }
}
