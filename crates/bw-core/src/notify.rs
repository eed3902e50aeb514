use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::debug;

/// How long a toast stays visible without manual dismissal
pub const AUTO_DISMISS: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

/// One toast, alive from publish until dismissal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    Posted(Notification),
    Dismissed(u64),
}

/// Process-wide toast channel
///
/// Decouples service-layer success/error signaling from whatever renders the
/// toasts. Publication order is display order; identical rapid-fire messages
/// are not de-duplicated. Every toast auto-dismisses after [`AUTO_DISMISS`]
/// and may be dismissed manually before that; either way dismissal is
/// idempotent.
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    /// Active toasts in publication order
    active: Mutex<Vec<Notification>>,
    next_id: AtomicU64,
    sender: broadcast::Sender<NotificationEvent>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(Inner {
                active: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
                sender,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.inner.sender.subscribe()
    }

    /// Publish a toast and schedule its auto-dismissal
    ///
    /// Must be called from within a tokio runtime; the dismiss timer runs as
    /// a spawned task.
    pub fn publish(&self, message: impl Into<String>, kind: NotificationKind) -> u64 {
        let notification = Notification {
            id: self.inner.next_id.fetch_add(1, Ordering::Relaxed),
            message: message.into(),
            kind,
        };
        let id = notification.id;

        self.inner
            .active
            .lock()
            .expect("notification lock poisoned")
            .push(notification.clone());
        let _ = self
            .inner
            .sender
            .send(NotificationEvent::Posted(notification));

        let center = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(AUTO_DISMISS).await;
            center.dismiss(id);
        });

        id
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.publish(message, NotificationKind::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.publish(message, NotificationKind::Error)
    }

    pub fn warning(&self, message: impl Into<String>) -> u64 {
        self.publish(message, NotificationKind::Warning)
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.publish(message, NotificationKind::Info)
    }

    /// Dismiss a toast; returns false when it was already gone
    pub fn dismiss(&self, id: u64) -> bool {
        let mut active = self
            .inner
            .active
            .lock()
            .expect("notification lock poisoned");

        let Some(index) = active.iter().position(|n| n.id == id) else {
            debug!("Toast {} already dismissed", id);
            return false;
        };

        active.remove(index);
        drop(active);

        let _ = self.inner.sender.send(NotificationEvent::Dismissed(id));
        true
    }

    /// Currently visible toasts, oldest first
    pub fn active(&self) -> Vec<Notification> {
        self.inner
            .active
            .lock()
            .expect("notification lock poisoned")
            .clone()
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}
