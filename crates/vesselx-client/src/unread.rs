use std::sync::{Arc, Mutex};

use vesselx_types::models::{Conversation, Group};

use crate::bus::{BusEvent, EventBus};

/// The three unread categories the client tracks for the whole process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    Messages,
    Groups,
    Notifications,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnreadTotals {
    pub messages: u32,
    pub groups: u32,
    pub notifications: u32,
}

impl UnreadTotals {
    /// Server-reconciled starting point: sum the per-conversation and
    /// per-group unread counts from the listings.
    pub fn from_listings(
        conversations: &[Conversation],
        groups: &[Group],
        notifications: u32,
    ) -> Self {
        Self {
            messages: conversations.iter().map(|c| c.unread_count).sum(),
            groups: groups.iter().map(|g| g.unread_count).sum(),
            notifications,
        }
    }

    fn get(&self, kind: CounterKind) -> u32 {
        match kind {
            CounterKind::Messages => self.messages,
            CounterKind::Groups => self.groups,
            CounterKind::Notifications => self.notifications,
        }
    }

    fn set(&mut self, kind: CounterKind, value: u32) {
        match kind {
            CounterKind::Messages => self.messages = value,
            CounterKind::Groups => self.groups = value,
            CounterKind::Notifications => self.notifications = value,
        }
    }
}

/// Process-wide unread counters, alive for the span of one session.
/// Any component may apply a signed delta; results clamp at zero. Every
/// change fans out as an `UnreadCountUpdate` bus event.
#[derive(Clone)]
pub struct UnreadCounters {
    totals: Arc<Mutex<UnreadTotals>>,
    bus: EventBus,
}

impl UnreadCounters {
    pub fn new(bus: EventBus) -> Self {
        Self {
            totals: Arc::new(Mutex::new(UnreadTotals::default())),
            bus,
        }
    }

    /// Replace all counters with server-fetched totals (session start).
    pub fn initialize(&self, totals: UnreadTotals) {
        *self.totals.lock().unwrap() = totals;
        for kind in [
            CounterKind::Messages,
            CounterKind::Groups,
            CounterKind::Notifications,
        ] {
            self.bus.publish(BusEvent::UnreadCountUpdate {
                counter: kind,
                value: totals.get(kind),
            });
        }
    }

    /// Apply a signed delta, clamped at zero. Returns the new value.
    pub fn apply(&self, kind: CounterKind, delta: i64) -> u32 {
        let value = {
            let mut totals = self.totals.lock().unwrap();
            let current = totals.get(kind);
            let next = if delta.is_negative() {
                current.saturating_sub(delta.unsigned_abs().min(u32::MAX as u64) as u32)
            } else {
                current.saturating_add(delta.min(u32::MAX as i64) as u32)
            };
            totals.set(kind, next);
            next
        };
        self.bus.publish(BusEvent::UnreadCountUpdate {
            counter: kind,
            value,
        });
        value
    }

    /// The user acknowledged everything in this category.
    pub fn reset(&self, kind: CounterKind) {
        self.totals.lock().unwrap().set(kind, 0);
        self.bus.publish(BusEvent::UnreadCountUpdate {
            counter: kind,
            value: 0,
        });
    }

    /// Session teardown: discard all counters.
    pub fn clear_all(&self) {
        self.initialize(UnreadTotals::default());
    }

    pub fn get(&self, kind: CounterKind) -> u32 {
        self.totals.lock().unwrap().get(kind)
    }

    pub fn snapshot(&self) -> UnreadTotals {
        *self.totals.lock().unwrap()
    }
}
