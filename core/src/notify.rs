//! Notification surface: status toasts keyed by a stable id so one toast can
//! be updated in place across the phases of a payment.

use std::time::Duration;

/// Success toasts close after 5 seconds.
pub const SUCCESS_DURATION: Duration = Duration::from_secs(5);
/// Failure toasts stay visible for 8 seconds.
pub const FAILURE_DURATION: Duration = Duration::from_secs(8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Pending,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: String,
    pub kind: ToastKind,
    pub title: String,
    pub description: String,
    /// Block-explorer link, when a transaction hash is known.
    pub link: Option<String>,
    /// `None` keeps the toast open until it is replaced.
    pub duration: Option<Duration>,
}

impl Toast {
    pub fn pending(id: &str, title: &str, description: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            kind: ToastKind::Pending,
            title: title.to_string(),
            description: description.into(),
            link: None,
            duration: None,
        }
    }

    pub fn success(id: &str, title: &str, description: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            kind: ToastKind::Success,
            title: title.to_string(),
            description: description.into(),
            link: None,
            duration: Some(SUCCESS_DURATION),
        }
    }

    pub fn error(id: &str, title: &str, description: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            kind: ToastKind::Error,
            title: title.to_string(),
            description: description.into(),
            link: None,
            duration: Some(FAILURE_DURATION),
        }
    }

    pub fn with_link(mut self, link: Option<String>) -> Self {
        self.link = link;
        self
    }
}

/// Receives toasts. A toast with an id that is already shown replaces it.
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

/// Notifier that only logs; used when no UI surface is attached.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, toast: Toast) {
        match toast.kind {
            ToastKind::Error => {
                tracing::warn!(id = %toast.id, title = %toast.title, "{}", toast.description)
            }
            _ => tracing::info!(id = %toast.id, title = %toast.title, "{}", toast.description),
        }
    }
}
