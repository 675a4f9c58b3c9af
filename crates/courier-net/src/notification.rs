//! Application-wide notifications posted by the API manager.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use courier_core::Notification;
use parking_lot::Mutex;

/// Handle returned by [`NotificationCenter::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

type Listener = Arc<dyn Fn(Notification) + Send + Sync>;

/// Delivers [`Notification`]s to subscribed listeners.
///
/// Listeners run synchronously, in subscription order, on the task that
/// posted the notification. The subscriber list is not locked while they run,
/// so a listener may subscribe or unsubscribe.
#[derive(Clone, Default)]
pub struct NotificationCenter {
    listeners: Arc<Mutex<Vec<(SubscriptionId, Listener)>>>,
}

impl NotificationCenter {
    /// Create an empty notification center.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for every notification.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(Notification) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Number of registered listeners.
    pub fn subscriber_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Deliver `notification` to every listener.
    pub fn post(&self, notification: Notification) {
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        tracing::info!(
            target: courier_core::logging::targets::MANAGER,
            notification = notification.name(),
            listeners = listeners.len(),
            "posting notification"
        );

        for listener in listeners {
            listener(notification);
        }
    }
}

impl std::fmt::Debug for NotificationCenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationCenter")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
