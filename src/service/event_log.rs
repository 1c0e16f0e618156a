use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

/// Default number of entries kept before the oldest are dropped
pub const DEFAULT_LOG_CAPACITY: usize = 500;

/// Outcome class of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Info,
    Success,
    Error,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Info => write!(f, "info"),
            MessageKind::Success => write!(f, "success"),
            MessageKind::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogMessage {
    pub timestamp: DateTime<Utc>,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
}

/// Ordered, bounded log of operation outcomes
///
/// Subscribers always observe the complete sequence, never a delta.
#[derive(Debug)]
pub struct EventLog {
    capacity: usize,
    entries: watch::Sender<Vec<LogMessage>>,
    /// Bumped on every change, while the sequence is locked for writing
    revision: AtomicU64,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        let (entries, _) = watch::channel(Vec::new());
        Self {
            capacity: capacity.max(1),
            entries,
            revision: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an entry and notify subscribers
    pub fn publish(&self, text: impl Into<String>, kind: MessageKind) {
        let message = LogMessage {
            timestamp: Utc::now(),
            text: text.into(),
            kind,
        };

        match kind {
            MessageKind::Info | MessageKind::Success => {
                tracing::info!(kind = %kind, "{}", message.text)
            }
            MessageKind::Error => tracing::warn!(kind = %kind, "{}", message.text),
        }

        let capacity = self.capacity;
        self.entries.send_modify(|entries| {
            entries.push(message);
            if entries.len() > capacity {
                let excess = entries.len() - capacity;
                entries.drain(..excess);
            }
            self.revision.fetch_add(1, Ordering::Release);
        });
    }

    pub fn info(&self, text: impl Into<String>) {
        self.publish(text, MessageKind::Info);
    }

    pub fn success(&self, text: impl Into<String>) {
        self.publish(text, MessageKind::Success);
    }

    pub fn error(&self, text: impl Into<String>) {
        self.publish(text, MessageKind::Error);
    }

    /// Drop every entry and notify subscribers
    pub fn clear(&self) {
        self.entries.send_modify(|entries| {
            entries.clear();
            self.revision.fetch_add(1, Ordering::Release);
        });
    }

    pub fn snapshot(&self) -> Vec<LogMessage> {
        self.entries.borrow().clone()
    }

    /// Current entries together with the revision they belong to
    pub fn view(&self) -> (u64, Vec<LogMessage>) {
        let entries = self.entries.borrow();
        (self.revision.load(Ordering::Acquire), entries.clone())
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<LogMessage>> {
        self.entries.subscribe()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_appends_in_order() {
        let log = EventLog::default();

        log.info("Parking mount...");
        log.success("Mount parked");

        let entries = log.snapshot();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "Parking mount...");
        assert_eq!(entries[0].kind, MessageKind::Info);
        assert_eq!(entries[1].kind, MessageKind::Success);
        assert!(entries[0].timestamp <= entries[1].timestamp);
    }

    #[test]
    fn test_clear_then_publish() {
        let log = EventLog::default();
        for i in 0..10 {
            log.info(format!("entry {}", i));
        }

        log.clear();
        assert!(log.is_empty());

        log.error("Slew failed: Mount not connected");
        assert_eq!(log.len(), 1);
        assert_eq!(log.snapshot()[0].kind, MessageKind::Error);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let log = EventLog::new(3);
        for i in 0..5 {
            log.info(format!("entry {}", i));
        }

        let texts: Vec<_> = log.snapshot().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["entry 2", "entry 3", "entry 4"]);
    }

    #[test]
    fn test_zero_capacity_keeps_latest() {
        let log = EventLog::new(0);
        log.info("a");
        log.info("b");

        assert_eq!(log.capacity(), 1);
        assert_eq!(log.snapshot()[0].text, "b");
    }

    #[tokio::test]
    async fn test_subscribers_see_whole_sequence() {
        let log = EventLog::default();
        let mut rx = log.subscribe();

        log.info("first");
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);

        log.success("second");
        rx.changed().await.unwrap();
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].text, "first");

        log.clear();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_empty());
    }

    #[test]
    fn test_revision_tracks_every_change() {
        let log = EventLog::new(2);
        assert_eq!(log.view(), (0, Vec::new()));

        log.info("a");
        log.info("b");
        log.info("c");
        let (revision, entries) = log.view();
        assert_eq!(revision, 3);
        assert_eq!(entries.len(), 2);

        log.clear();
        assert_eq!(log.revision(), 4);
    }

    #[test]
    fn test_serialized_type_field() {
        let log = EventLog::default();
        log.success("Target set successfully");

        let json = serde_json::to_value(log.snapshot()).unwrap();
        assert_eq!(json[0]["type"], "success");
        assert_eq!(json[0]["text"], "Target set successfully");
    }
}
