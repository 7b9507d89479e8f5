use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use uuid::Uuid;

use vesselx_push::{NotificationDescriptor, PushPayload, build_notification};
use vesselx_types::events::{GatewayCommand, GatewayEvent};
use vesselx_types::models::MessageTarget;

use crate::bus::{BusEvent, EventBus};
use crate::context::AppContext;
use crate::push::AlertSink;
use crate::unread::{CounterKind, UnreadCounters};

/// Give up on a single connection attempt after this long.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Automatic reconnection stops after this many attempts; only an explicit
/// `connect` (a new login) starts the transport again.
const MAX_RECONNECT_ATTEMPTS: u32 = 5;

const RECONNECT_DELAY_FLOOR: Duration = Duration::from_secs(1);
const RECONNECT_DELAY_CEIL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Bounded backoff schedule: 1s, 2s, 4s, 5s, 5s. The attempt counter never
/// resets on a successful connection — six unexpected drops in a row leave
/// the transport terminally disconnected until an explicit reconnect.
struct ReconnectPolicy {
    attempts: u32,
}

impl ReconnectPolicy {
    fn new() -> Self {
        Self { attempts: 0 }
    }

    /// Delay before the next attempt, or `None` once the cap is reached.
    fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= MAX_RECONNECT_ATTEMPTS {
            return None;
        }
        self.attempts += 1;
        let doubled = RECONNECT_DELAY_FLOOR * 2u32.saturating_pow(self.attempts - 1);
        Some(doubled.min(RECONNECT_DELAY_CEIL))
    }
}

/// One long-lived connection per authenticated session, multiplexing message,
/// typing, delivery-status, and presence events. Inbound events fan out on a
/// broadcast channel (for views) and as bus events / counter bumps /
/// notifications per the event table; outbound operations are fire-and-forget.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    url: String,
    state: Mutex<TransportState>,
    events_tx: broadcast::Sender<GatewayEvent>,
    cmd_tx: Mutex<Option<mpsc::UnboundedSender<GatewayCommand>>>,
    /// Bumped on every connect; a connection task only cleans up if it still
    /// owns the current generation (a newer connect must not be clobbered).
    generation: AtomicU64,
    ctx: AppContext,
    bus: EventBus,
    unread: UnreadCounters,
    alerts: Arc<dyn AlertSink>,
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

impl Gateway {
    pub fn new(
        url: impl Into<String>,
        ctx: AppContext,
        bus: EventBus,
        unread: UnreadCounters,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        let (events_tx, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(GatewayInner {
                url: url.into(),
                state: Mutex::new(TransportState::Disconnected),
                events_tx,
                cmd_tx: Mutex::new(None),
                generation: AtomicU64::new(0),
                ctx,
                bus,
                unread,
                alerts,
            }),
        }
    }

    pub fn state(&self) -> TransportState {
        *self.inner.state.lock().unwrap()
    }

    /// Raw inbound event feed for views that track per-entity state.
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.inner.events_tx.subscribe()
    }

    /// Open the connection for this session. Idempotent: a call while the
    /// transport is anything but disconnected is a no-op.
    pub fn connect(&self, user_id: Uuid, token: impl Into<String>) {
        {
            let mut state = self.inner.state.lock().unwrap();
            if *state != TransportState::Disconnected {
                debug!("gateway connect ignored: transport is {:?}", *state);
                return;
            }
            *state = TransportState::Connecting;
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let (tx, rx) = mpsc::unbounded_channel();
        *self.inner.cmd_tx.lock().unwrap() = Some(tx);

        let inner = self.inner.clone();
        let token = token.into();
        tokio::spawn(async move {
            run_connection(inner, user_id, token, rx, generation).await;
        });
    }

    /// Tear the socket down. Called on logout; until the next explicit
    /// `connect` nothing reconnects.
    pub fn disconnect(&self) {
        // Dropping the sender ends the connection task's command loop
        self.inner.cmd_tx.lock().unwrap().take();
        *self.inner.state.lock().unwrap() = TransportState::Disconnected;
    }

    // -- Outbound operations (fire-and-forget) --

    pub fn send_direct_message(&self, recipient_id: Uuid, text: impl Into<String>) {
        self.send(GatewayCommand::SendDirectMessage {
            recipient_id,
            text: text.into(),
        });
    }

    pub fn send_group_message(&self, group_id: Uuid, text: impl Into<String>) {
        self.send(GatewayCommand::SendGroupMessage {
            group_id,
            text: text.into(),
        });
    }

    pub fn mark_direct_read(&self, peer_id: Uuid) {
        self.send(GatewayCommand::MarkDirectRead { peer_id });
    }

    pub fn mark_group_read(&self, group_id: Uuid) {
        self.send(GatewayCommand::MarkGroupRead { group_id });
    }

    pub fn set_typing(&self, peer_id: Uuid, typing: bool) {
        self.send(GatewayCommand::SetTyping { peer_id, typing });
    }

    pub fn set_group_typing(&self, group_id: Uuid, typing: bool) {
        self.send(GatewayCommand::SetGroupTyping { group_id, typing });
    }

    pub fn join_group_room(&self, group_id: Uuid) {
        self.send(GatewayCommand::JoinGroupRoom { group_id });
    }

    pub fn leave_group_room(&self, group_id: Uuid) {
        self.send(GatewayCommand::LeaveGroupRoom { group_id });
    }

    fn send(&self, cmd: GatewayCommand) {
        match &*self.inner.cmd_tx.lock().unwrap() {
            Some(tx) => {
                if tx.send(cmd).is_err() {
                    warn!("gateway command dropped: connection task gone");
                }
            }
            None => warn!("gateway command dropped: not connected"),
        }
    }
}

impl GatewayInner {
    fn set_state(&self, state: TransportState) {
        *self.state.lock().unwrap() = state;
    }

    /// A connection task owns the gateway only while its generation is
    /// current and the command sender it was spawned with is still installed.
    /// A stale task must not reconnect with an old identity or touch state.
    fn owned_by(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
            && self.cmd_tx.lock().unwrap().is_some()
    }

    /// Apply one inbound event: side effects per the event table, then
    /// rebroadcast the raw event to subscribers.
    fn handle_event(&self, event: GatewayEvent) {
        if let GatewayEvent::Ready { user_id } = &event {
            info!("gateway ready for user {}", user_id);
        }

        let local_user = self.ctx.session().map(|s| s.user.id);
        let effects = effects_for_event(
            &event,
            local_user,
            self.ctx.sound_enabled(),
            self.alerts.can_notify(),
        );
        for effect in effects {
            match effect {
                Effect::PlaySound => self.alerts.play_sound(),
                Effect::Notify(notification) => self.alerts.notify(&notification),
                Effect::Bump(kind) => {
                    self.unread.apply(kind, 1);
                }
                Effect::Publish(bus_event) => self.bus.publish(bus_event),
            }
        }

        let _ = self.events_tx.send(event);
    }
}

/// Connect-and-reconnect loop. Runs until an explicit disconnect or until
/// the reconnect attempts are exhausted.
async fn run_connection(
    inner: Arc<GatewayInner>,
    user_id: Uuid,
    token: String,
    mut cmd_rx: mpsc::UnboundedReceiver<GatewayCommand>,
    generation: u64,
) {
    let mut policy = ReconnectPolicy::new();

    loop {
        match tokio::time::timeout(CONNECT_TIMEOUT, connect_async(inner.url.as_str())).await {
            Ok(Ok((ws, _))) => {
                inner.set_state(TransportState::Connected);
                info!("gateway connected to {}", inner.url);

                match drive_connection(&inner, ws, user_id, &token, &mut cmd_rx).await {
                    DriveOutcome::Shutdown => break,
                    DriveOutcome::Lost => warn!("gateway connection lost"),
                }
            }
            Ok(Err(e)) => warn!("gateway connect failed: {}", e),
            Err(_) => warn!("gateway connect timed out after {:?}", CONNECT_TIMEOUT),
        }

        match policy.next_delay() {
            Some(delay) => {
                if !inner.owned_by(generation) {
                    break;
                }
                inner.set_state(TransportState::Reconnecting);
                info!(
                    "gateway reconnecting in {:?} (attempt {}/{})",
                    delay, policy.attempts, MAX_RECONNECT_ATTEMPTS
                );
                tokio::time::sleep(delay).await;
                // Explicit disconnect, or a newer connect, during the backoff
                if !inner.owned_by(generation) {
                    break;
                }
            }
            None => {
                warn!("gateway reconnect attempts exhausted, staying disconnected");
                break;
            }
        }
    }

    // Only clean up if a newer connect hasn't taken over
    if inner.generation.load(Ordering::Acquire) == generation {
        inner.cmd_tx.lock().unwrap().take();
        inner.set_state(TransportState::Disconnected);
    }
}

enum DriveOutcome {
    /// Explicit disconnect: stop for good
    Shutdown,
    /// Socket dropped out from under us: reconnect may follow
    Lost,
}

async fn drive_connection(
    inner: &GatewayInner,
    ws: WsStream,
    user_id: Uuid,
    token: &str,
    cmd_rx: &mut mpsc::UnboundedReceiver<GatewayCommand>,
) -> DriveOutcome {
    let (mut sink, mut stream) = ws.split();

    // Announce identity so the server routes this session's events here
    let join = GatewayCommand::Join {
        user_id,
        token: token.to_string(),
    };
    if !send_command(&mut sink, &join).await {
        return DriveOutcome::Lost;
    }

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(cmd) => {
                    if !send_command(&mut sink, &cmd).await {
                        return DriveOutcome::Lost;
                    }
                }
                // Sender dropped: explicit disconnect
                None => {
                    let _ = sink.send(Message::Close(None)).await;
                    return DriveOutcome::Shutdown;
                }
            },
            msg = next_event(&mut stream) => match msg {
                Some(event) => inner.handle_event(event),
                None => return DriveOutcome::Lost,
            },
        }
    }
}

async fn send_command(
    sink: &mut SplitSink<WsStream, Message>,
    cmd: &GatewayCommand,
) -> bool {
    let text = serde_json::to_string(cmd).unwrap();
    sink.send(Message::Text(text.into())).await.is_ok()
}

/// Pull the next parseable event off the stream. `None` means the connection
/// is gone; unparseable frames are logged and skipped.
async fn next_event(stream: &mut SplitStream<WsStream>) -> Option<GatewayEvent> {
    loop {
        match stream.next().await? {
            Ok(Message::Text(text)) => match serde_json::from_str::<GatewayEvent>(&text) {
                Ok(event) => return Some(event),
                Err(e) => {
                    warn!("bad gateway event: {} -- raw: {}", e, truncate_for_log(&text));
                }
            },
            Ok(Message::Close(_)) => return None,
            Ok(_) => {}
            Err(e) => {
                warn!("gateway stream error: {}", e);
                return None;
            }
        }
    }
}

const RAW_LOG_LIMIT: usize = 200;

/// Cap a raw frame for the log, backing up to a char boundary so a
/// multibyte character straddling the limit can't panic the slice.
fn truncate_for_log(text: &str) -> &str {
    if text.len() <= RAW_LOG_LIMIT {
        return text;
    }
    let mut end = RAW_LOG_LIMIT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Local effect of one inbound event.
#[derive(Debug)]
enum Effect {
    PlaySound,
    Notify(NotificationDescriptor),
    Bump(CounterKind),
    Publish(BusEvent),
}

/// The event table: map an inbound gateway event to its local effects.
/// Pure — all ambient inputs (local user, sound preference, whether an OS
/// notification would be seen) arrive as arguments.
fn effects_for_event(
    event: &GatewayEvent,
    local_user: Option<Uuid>,
    sound_enabled: bool,
    can_notify: bool,
) -> Vec<Effect> {
    let mut effects = Vec::new();
    match event {
        GatewayEvent::Ready { .. } => {}

        GatewayEvent::DirectMessage { message } => {
            if sound_enabled {
                effects.push(Effect::PlaySound);
            }
            if can_notify {
                effects.push(Effect::Notify(build_notification(&PushPayload {
                    title: Some(message.sender.username.clone()),
                    body: Some(message.text.clone()),
                    tag: Some(format!("dm-{}", message.sender.id)),
                    url: Some(format!("/messages/{}", message.sender.id)),
                    kind: Some("dm".into()),
                    sender_id: Some(message.sender.id),
                    ..Default::default()
                })));
            }
            effects.push(Effect::Bump(CounterKind::Messages));
        }

        GatewayEvent::GroupMessage { message } => {
            // Own messages echoed back by the room produce no local effects
            if local_user == Some(message.sender.id) {
                return effects;
            }
            let group_id = match message.target {
                MessageTarget::Group { group_id } => Some(group_id),
                MessageTarget::Direct { .. } => None,
            };
            if sound_enabled {
                effects.push(Effect::PlaySound);
            }
            if can_notify {
                effects.push(Effect::Notify(build_notification(&PushPayload {
                    title: Some(message.sender.username.clone()),
                    body: Some(message.text.clone()),
                    tag: group_id.map(|g| format!("group-{g}")),
                    url: group_id.map(|g| format!("/groups/{g}")),
                    kind: Some("group".into()),
                    sender_id: Some(message.sender.id),
                    conversation_id: group_id,
                    ..Default::default()
                })));
            }
            effects.push(Effect::Bump(CounterKind::Groups));
        }

        GatewayEvent::Typing { peer, typing } => {
            effects.push(Effect::Publish(BusEvent::TypingIndicator {
                peer: peer.clone(),
                typing: *typing,
            }));
        }

        GatewayEvent::GroupTyping {
            group_id,
            member,
            typing,
        } => {
            effects.push(Effect::Publish(BusEvent::GroupTypingIndicator {
                group_id: *group_id,
                member: member.clone(),
                typing: *typing,
            }));
        }

        GatewayEvent::MessageStatus { message_id, status } => {
            effects.push(Effect::Publish(BusEvent::MessageStatusUpdate {
                message_id: *message_id,
                status: *status,
            }));
        }

        GatewayEvent::Presence { user_id, online } => {
            effects.push(Effect::Publish(BusEvent::UserStatusUpdate {
                user_id: *user_id,
                online: *online,
            }));
        }
    }
    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex as StdMutex;
    use vesselx_types::models::{DeliveryStatus, Message, Session, User, UserRef};

    use crate::storage::MemoryStore;

    fn dm(sender_id: Uuid, text: &str) -> GatewayEvent {
        GatewayEvent::DirectMessage {
            message: Message {
                id: Uuid::new_v4(),
                text: text.into(),
                sender: UserRef {
                    id: sender_id,
                    username: "ada".into(),
                },
                target: MessageTarget::Direct {
                    recipient_id: Uuid::new_v4(),
                },
                created_at: Utc::now(),
                status: DeliveryStatus::Sent,
            },
        }
    }

    fn group_msg(sender_id: Uuid, group_id: Uuid) -> GatewayEvent {
        GatewayEvent::GroupMessage {
            message: Message {
                id: Uuid::new_v4(),
                text: "yo".into(),
                sender: UserRef {
                    id: sender_id,
                    username: "ada".into(),
                },
                target: MessageTarget::Group { group_id },
                created_at: Utc::now(),
                status: DeliveryStatus::Sent,
            },
        }
    }

    #[test]
    fn reconnect_delays_double_then_clamp() {
        let mut policy = ReconnectPolicy::new();
        let delays: Vec<u64> = std::iter::from_fn(|| policy.next_delay())
            .map(|d| d.as_secs())
            .collect();
        assert_eq!(delays, vec![1, 2, 4, 5, 5]);
    }

    #[test]
    fn reconnect_stops_after_cap() {
        let mut policy = ReconnectPolicy::new();
        for _ in 0..MAX_RECONNECT_ATTEMPTS {
            assert!(policy.next_delay().is_some());
        }
        // Sixth drop: no further automatic attempt
        assert!(policy.next_delay().is_none());
        assert!(policy.next_delay().is_none());
    }

    #[test]
    fn dm_event_bumps_counter_and_notifies_with_dm_tag() {
        let sender = Uuid::new_v4();
        let effects = effects_for_event(&dm(sender, "T"), Some(Uuid::new_v4()), true, true);

        assert!(matches!(effects[0], Effect::PlaySound));
        let notification = effects
            .iter()
            .find_map(|e| match e {
                Effect::Notify(n) => Some(n),
                _ => None,
            })
            .expect("dm should notify");
        assert_eq!(notification.body, "T");
        assert_eq!(notification.tag, format!("dm-{sender}"));
        assert!(
            effects
                .iter()
                .any(|e| matches!(e, Effect::Bump(CounterKind::Messages)))
        );
    }

    #[test]
    fn dm_respects_sound_and_notify_gates() {
        let effects = effects_for_event(&dm(Uuid::new_v4(), "T"), None, false, false);
        assert_eq!(effects.len(), 1);
        assert!(matches!(effects[0], Effect::Bump(CounterKind::Messages)));
    }

    #[test]
    fn own_group_message_is_fully_suppressed() {
        let me = Uuid::new_v4();
        let effects = effects_for_event(&group_msg(me, Uuid::new_v4()), Some(me), true, true);
        assert!(effects.is_empty());
    }

    #[test]
    fn peer_group_message_bumps_groups_counter() {
        let group_id = Uuid::new_v4();
        let effects =
            effects_for_event(&group_msg(Uuid::new_v4(), group_id), Some(Uuid::new_v4()), false, true);
        let notification = effects
            .iter()
            .find_map(|e| match e {
                Effect::Notify(n) => Some(n),
                _ => None,
            })
            .expect("group message should notify");
        assert_eq!(notification.tag, format!("group-{group_id}"));
        assert!(
            effects
                .iter()
                .any(|e| matches!(e, Effect::Bump(CounterKind::Groups)))
        );
    }

    #[test]
    fn status_and_presence_become_bus_events() {
        let effects = effects_for_event(
            &GatewayEvent::MessageStatus {
                message_id: Uuid::new_v4(),
                status: DeliveryStatus::Read,
            },
            None,
            true,
            true,
        );
        assert!(matches!(
            effects[..],
            [Effect::Publish(BusEvent::MessageStatusUpdate { .. })]
        ));

        let effects = effects_for_event(
            &GatewayEvent::Presence {
                user_id: Uuid::new_v4(),
                online: false,
            },
            None,
            true,
            true,
        );
        assert!(matches!(
            effects[..],
            [Effect::Publish(BusEvent::UserStatusUpdate { online: false, .. })]
        ));
    }

    // -- handle_event integration: counters + notifications end to end --

    struct RecordingSink {
        can_notify: bool,
        notifications: StdMutex<Vec<NotificationDescriptor>>,
        sounds: StdMutex<u32>,
    }

    impl AlertSink for RecordingSink {
        fn can_notify(&self) -> bool {
            self.can_notify
        }
        fn notify(&self, n: &NotificationDescriptor) {
            self.notifications.lock().unwrap().push(n.clone());
        }
        fn play_sound(&self) {
            *self.sounds.lock().unwrap() += 1;
        }
    }

    fn gateway_with_sink(sink: Arc<RecordingSink>) -> (Gateway, UnreadCounters) {
        let bus = EventBus::new();
        let ctx = AppContext::new(Box::new(MemoryStore::new()), bus.clone());
        ctx.set_session(Session {
            token: "tok".into(),
            user: User {
                id: Uuid::new_v4(),
                username: "me".into(),
                display_name: None,
                avatar_url: None,
                created_at: Utc::now(),
            },
        });
        let unread = UnreadCounters::new(bus.clone());
        let gateway = Gateway::new("ws://localhost:1/gateway", ctx, bus, unread.clone(), sink);
        (gateway, unread)
    }

    #[tokio::test]
    async fn incoming_dm_increments_messages_and_shows_notification() {
        let sink = Arc::new(RecordingSink {
            can_notify: true,
            notifications: StdMutex::new(vec![]),
            sounds: StdMutex::new(0),
        });
        let (gateway, unread) = gateway_with_sink(sink.clone());
        assert_eq!(unread.get(CounterKind::Messages), 0);

        let sender = Uuid::new_v4();
        gateway.inner.handle_event(dm(sender, "T"));

        assert_eq!(unread.get(CounterKind::Messages), 1);
        let shown = sink.notifications.lock().unwrap();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].body, "T");
        assert_eq!(shown[0].tag, format!("dm-{sender}"));
    }

    #[tokio::test]
    async fn inbound_events_rebroadcast_to_subscribers() {
        let sink = Arc::new(RecordingSink {
            can_notify: false,
            notifications: StdMutex::new(vec![]),
            sounds: StdMutex::new(0),
        });
        let (gateway, _) = gateway_with_sink(sink);
        let mut rx = gateway.subscribe();

        gateway.inner.handle_event(GatewayEvent::Presence {
            user_id: Uuid::new_v4(),
            online: true,
        });

        assert!(matches!(
            rx.recv().await.unwrap(),
            GatewayEvent::Presence { online: true, .. }
        ));
    }

    #[test]
    fn raw_frame_log_truncates_on_char_boundary() {
        // Two-byte 'é' straddles the limit: bytes 199..201
        let mut frame = "a".repeat(RAW_LOG_LIMIT - 1);
        frame.push('é');
        frame.push_str("trailing garbage");

        let cut = truncate_for_log(&frame);
        assert_eq!(cut.len(), RAW_LOG_LIMIT - 1);
        assert!(frame.starts_with(cut));

        let short = "not json at all {{";
        assert_eq!(truncate_for_log(short), short);
    }

    #[tokio::test]
    async fn stale_generation_loses_ownership_after_reconnect() {
        let sink = Arc::new(RecordingSink {
            can_notify: false,
            notifications: StdMutex::new(vec![]),
            sounds: StdMutex::new(0),
        });
        let (gateway, _) = gateway_with_sink(sink);

        gateway.connect(Uuid::new_v4(), "tok-1");
        let first = gateway.inner.generation.load(Ordering::Acquire);
        assert!(gateway.inner.owned_by(first));

        // Disconnect revokes ownership even before the task notices
        gateway.disconnect();
        assert!(!gateway.inner.owned_by(first));

        // A fresh connect must not hand ownership back to the old task
        gateway.connect(Uuid::new_v4(), "tok-2");
        let second = gateway.inner.generation.load(Ordering::Acquire);
        assert!(!gateway.inner.owned_by(first));
        assert!(gateway.inner.owned_by(second));
    }

    #[test]
    fn initial_state_is_disconnected() {
        let sink = Arc::new(RecordingSink {
            can_notify: false,
            notifications: StdMutex::new(vec![]),
            sounds: StdMutex::new(0),
        });
        let (gateway, _) = gateway_with_sink(sink);
        assert_eq!(gateway.state(), TransportState::Disconnected);
    }
}
