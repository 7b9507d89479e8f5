//! Thin REST endpoint bindings. Each function maps one server route onto the
//! shared [`Http`](crate::http::Http) wrapper; no module here keeps state.

pub mod assistant;
pub mod auth;
pub mod chat;
pub mod groups;
pub mod notifications;
pub mod posts;
pub mod users;
