//! Store events: the re-render signal a view layer subscribes to.
//!
//! Events are broadcast after the corresponding state change (and its
//! persistence write) has settled.

use uuid::Uuid;

use crate::domain::router::RouteState;

/// Severity of a transient, auto-dismissing notice (the toast surface).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

#[derive(Clone, Debug)]
pub enum StoreEvent {
    CartChanged,
    WishlistChanged,
    RouteChanged(RouteState),
    OrderPlaced { order_id: Uuid, chat_url: String },
    Notice(Notice),
}
