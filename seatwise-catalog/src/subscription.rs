use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use seatwise_shared::FlightNotice;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    #[error("Subscriber {0} rejected the notice")]
    Rejected(String),
    #[error("Subscriber {0} is unavailable")]
    Unavailable(String),
}

/// Sink for flight notices. Implemented by passengers.
pub trait Subscriber: Send + Sync {
    /// Identity used to make subscribe/unsubscribe idempotent.
    fn subscriber_key(&self) -> &str;

    fn notify(&self, notice: &FlightNotice) -> Result<(), NotifyError>;
}

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    pub failed: usize,
}

/// Ordered list of weak subscriber references.
///
/// The flight never keeps a passenger alive; entries whose passenger has been
/// dropped are pruned on the next broadcast or subscribe.
#[derive(Default)]
pub struct SubscriberList {
    entries: Mutex<Vec<(String, Weak<dyn Subscriber>)>>,
}

impl SubscriberList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if a subscriber with the same key is already present.
    pub fn subscribe<S: Subscriber + 'static>(&self, subscriber: &Arc<S>) -> bool {
        let key = subscriber.subscriber_key().to_string();
        let mut entries = self.entries.lock();
        entries.retain(|(_, weak)| weak.strong_count() > 0);
        if entries.iter().any(|(existing, _)| *existing == key) {
            return false;
        }
        let weak: Weak<dyn Subscriber> = Arc::downgrade(subscriber) as Weak<dyn Subscriber>;
        entries.push((key, weak));
        true
    }

    /// Returns false if no subscriber with that key was present.
    pub fn unsubscribe(&self, key: &str) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(existing, _)| existing != key);
        entries.len() != before
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .iter()
            .any(|(existing, weak)| existing == key && weak.strong_count() > 0)
    }

    /// Number of live subscribers.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver a notice to every live subscriber in subscription order.
    ///
    /// The list lock is not held while subscribers run, so a subscriber may
    /// subscribe or unsubscribe from inside `notify`.
    pub fn broadcast(&self, notice: &FlightNotice) -> Delivery {
        let live: Vec<(String, Arc<dyn Subscriber>)> = {
            let mut entries = self.entries.lock();
            entries.retain(|(_, weak)| weak.strong_count() > 0);
            entries
                .iter()
                .filter_map(|(key, weak)| weak.upgrade().map(|s| (key.clone(), s)))
                .collect()
        };

        let mut delivery = Delivery::default();
        for (key, subscriber) in live {
            match subscriber.notify(notice) {
                Ok(()) => delivery.delivered += 1,
                Err(err) => {
                    delivery.failed += 1;
                    warn!(subscriber = %key, flight = %notice.flight_number, error = %err, "notice delivery failed");
                }
            }
        }
        debug!(
            flight = %notice.flight_number,
            delivered = delivery.delivered,
            failed = delivery.failed,
            "notice broadcast"
        );
        delivery
    }
}

impl std::fmt::Debug for SubscriberList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<String> = self.entries.lock().iter().map(|(k, _)| k.clone()).collect();
        f.debug_struct("SubscriberList").field("keys", &keys).finish()
    }
}
