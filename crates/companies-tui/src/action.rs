//! All possible UI actions. Actions are the sole mechanism for state mutation.

use std::sync::Arc;

use companies_core::ViewState;

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A transient message shown above the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Lifecycle ────────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Data ─────────────────────────────────────────────────────────
    /// A new projected state from the feed.
    StateUpdated(Arc<ViewState>),
    /// Drop the subscription and open a fresh one.
    Resubscribe,

    // ── Interaction ──────────────────────────────────────────────────
    /// Hand a webpage to the system opener, verbatim.
    OpenLink(String),
    ToggleHelp,
    Notify(Notification),
}
