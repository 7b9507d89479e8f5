//! VesselX client runtime: authenticated REST access, the real-time gateway
//! connection, push notification plumbing, and the session-scoped state
//! (context, event bus, unread counters) that ties them together.
//!
//! [`VesselClient`] is the assembled whole; every piece is also usable on its
//! own for hosts that embed only part of the stack.

pub mod api;
pub mod bus;
pub mod config;
pub mod context;
pub mod error;
pub mod gateway;
pub mod http;
pub mod push;
pub mod storage;
pub mod unread;

use std::sync::Arc;

use tracing::{info, warn};

use vesselx_types::api::{AuthResponse, LoginRequest, RegisterRequest};
use vesselx_types::models::User;

pub use bus::{BusEvent, EventBus};
pub use config::ClientConfig;
pub use context::AppContext;
pub use error::ClientError;
pub use gateway::{Gateway, TransportState};
pub use http::Http;
pub use push::{AlertSink, Permission, PushManager, PushPlatform, UnsupportedPlatform};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use unread::{CounterKind, UnreadCounters, UnreadTotals};

/// The fully wired client. Construction is cheap and performs no I/O; a
/// session starts talking to the network only on login or session restore.
pub struct VesselClient {
    ctx: AppContext,
    bus: EventBus,
    http: Http,
    unread: UnreadCounters,
    push: Arc<PushManager>,
    gateway: Gateway,
}

impl VesselClient {
    pub fn new(
        config: ClientConfig,
        platform: Arc<dyn PushPlatform>,
        store: Box<dyn KeyValueStore>,
    ) -> Self {
        let bus = EventBus::new();
        let ctx = AppContext::new(store, bus.clone());
        let http = Http::new(config.api_url.clone(), ctx.clone());
        let unread = UnreadCounters::new(bus.clone());
        let push = Arc::new(PushManager::new(http.clone(), platform));
        let gateway = Gateway::new(
            config.gateway_url.clone(),
            ctx.clone(),
            bus.clone(),
            unread.clone(),
            push.clone(),
        );
        Self {
            ctx,
            bus,
            http,
            unread,
            push,
            gateway,
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn http(&self) -> &Http {
        &self.http
    }

    pub fn unread(&self) -> &UnreadCounters {
        &self.unread
    }

    pub fn push(&self) -> &PushManager {
        &self.push
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Authenticate with credentials, then bring the session up: gateway
    /// connection, push registration, server-reconciled unread counts.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let resp = api::auth::login(
            &self.http,
            &LoginRequest {
                email: email.into(),
                password: password.into(),
            },
        )
        .await?;
        self.install_session(resp).await
    }

    /// Create an account. The server logs the new user straight in.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ClientError> {
        let resp = api::auth::register(
            &self.http,
            &RegisterRequest {
                username: username.into(),
                email: email.into(),
                password: password.into(),
            },
        )
        .await?;
        self.install_session(resp).await
    }

    /// Revive a persisted session. `Ok(None)` means there was nothing to
    /// restore or the stored token is stale (and has been discarded); a
    /// transport failure propagates so the caller can retry while offline.
    pub async fn restore_session(&self) -> Result<Option<User>, ClientError> {
        if self.ctx.session().is_none() {
            return Ok(None);
        }
        match api::auth::verify(&self.http).await {
            Ok(resp) => {
                // Refresh the cached profile; the token stays as persisted
                if let Some(mut session) = self.ctx.session() {
                    session.user = resp.user.clone();
                    self.ctx.set_session(session);
                }
                self.start_session().await?;
                Ok(Some(resp.user))
            }
            Err(ClientError::Api { status, .. }) => {
                info!("persisted session rejected ({}), discarding", status);
                self.ctx.clear_session();
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Tear the session down. The server call is best-effort: logout always
    /// succeeds locally even when the network is gone.
    pub async fn logout(&self) {
        if let Err(e) = api::auth::logout(&self.http).await {
            warn!("server logout failed, clearing local session anyway: {}", e);
        }
        self.gateway.disconnect();
        self.unread.clear_all();
        self.ctx.clear_session();
    }

    async fn install_session(&self, resp: AuthResponse) -> Result<User, ClientError> {
        let user = resp.user.clone();
        self.ctx.set_session(vesselx_types::models::Session {
            token: resp.token,
            user: resp.user,
        });
        self.start_session().await?;
        Ok(user)
    }

    /// Session bring-up shared by login, register, and restore.
    async fn start_session(&self) -> Result<(), ClientError> {
        let session = self.ctx.session().ok_or(ClientError::NotAuthenticated)?;
        self.gateway.connect(session.user.id, session.token);
        self.push.init().await;

        match api::chat::fetch_unread_totals(&self.http).await {
            Ok(totals) => self.unread.initialize(totals),
            // Counters start at zero and converge via gateway events
            Err(e) => warn!("could not fetch initial unread totals: {}", e),
        }
        Ok(())
    }
}
