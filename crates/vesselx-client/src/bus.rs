use tokio::sync::broadcast;
use uuid::Uuid;

use vesselx_types::models::{DeliveryStatus, Theme, UserRef};

use crate::unread::CounterKind;

/// In-process signals components react to without being wired to each other.
/// These mirror the app's decoupled cross-component events one for one.
#[derive(Debug, Clone)]
pub enum BusEvent {
    AuthChanged { authenticated: bool },
    ThemeChanged { theme: Theme },
    UnreadCountUpdate { counter: CounterKind, value: u32 },
    TypingIndicator { peer: UserRef, typing: bool },
    GroupTypingIndicator {
        group_id: Uuid,
        member: UserRef,
        typing: bool,
    },
    MessageStatusUpdate {
        message_id: Uuid,
        status: DeliveryStatus,
    },
    UserStatusUpdate { user_id: Uuid, online: bool },
    OpenCreatePost,
}

/// Typed pub/sub bus. Publishing never blocks and never fails: with no
/// subscribers the event is simply dropped, same as an unheard DOM event.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<BusEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: BusEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
