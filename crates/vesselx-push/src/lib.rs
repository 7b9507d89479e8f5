//! Background-worker push handling, independent of the hosting runtime.
//!
//! Two operations make up the worker contract: turn an inbound push payload
//! into a notification descriptor (applying defaults for every absent field),
//! and decide what a notification click should do (dismiss, focus an existing
//! window, or open a new one). Both are pure — the hosting runtime supplies
//! the payload bytes and the list of open windows, and executes the outcome.

pub mod click;
pub mod payload;

pub use click::{ClickOutcome, resolve_click};
pub use payload::{
    NotificationAction, NotificationDescriptor, PushPayload, build_notification,
};
