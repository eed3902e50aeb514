use tokio::sync::broadcast;

use bw_auth::Session;

/// Auth state carried on the auth-changed event
///
/// Listeners get the fields they render from directly instead of re-reading
/// the session store on every signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub authenticated: bool,
    pub is_admin: bool,
    pub username: Option<String>,
}

impl AuthSnapshot {
    pub fn from_session(session: &Session) -> Self {
        Self {
            authenticated: session.is_authenticated(),
            is_admin: session.is_admin,
            username: session.profile().map(|p| p.username.clone()),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            is_admin: false,
            username: None,
        }
    }
}

/// Application-wide events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The session was populated, refreshed or cleared
    AuthChanged(AuthSnapshot),
    /// Cart contents changed
    CartUpdated { item_count: usize },
}

/// Process-wide typed event channel
///
/// Fire-and-forget: publishing never blocks and never fails, even with no
/// subscribers. A subscription lives as long as its receiver; dropping the
/// receiver unsubscribes. Slow subscribers miss events rather than applying
/// backpressure.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: AppEvent) {
        // A send error only means nobody is listening right now
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_reach_every_subscriber() {
        let bus = EventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(AppEvent::CartUpdated { item_count: 2 });

        assert_eq!(
            first.recv().await.unwrap(),
            AppEvent::CartUpdated { item_count: 2 }
        );
        assert_eq!(
            second.recv().await.unwrap(),
            AppEvent::CartUpdated { item_count: 2 }
        );
    }

    #[tokio::test]
    async fn publishing_without_subscribers_is_a_no_op() {
        let bus = EventBus::new();
        bus.publish(AppEvent::AuthChanged(AuthSnapshot::anonymous()));
    }

    #[tokio::test]
    async fn dropped_receivers_stop_listening() {
        let bus = EventBus::new();
        let first = bus.subscribe();
        drop(first);

        bus.publish(AppEvent::CartUpdated { item_count: 1 });

        let mut late = bus.subscribe();
        // Subscribing after the publish sees nothing; the channel is not a log.
        assert!(matches!(
            late.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));
    }
}
