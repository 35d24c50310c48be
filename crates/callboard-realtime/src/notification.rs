//! User-visible notifications raised by the real-time core.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// A notification for the dashboard user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique notification ID.
    pub id: String,
    /// Severity class.
    pub level: NotificationLevel,
    /// Brief title.
    pub title: String,
    /// Notification body/description.
    pub body: String,
    /// When the notification was created (Unix timestamp).
    pub created_at: u64,
    /// Additional metadata.
    #[serde(default)]
    pub metadata: NotificationMetadata,
}

impl Notification {
    /// Create a new notification.
    pub fn new(
        level: NotificationLevel,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            level,
            title: title.into(),
            body: body.into(),
            created_at: Self::now(),
            metadata: NotificationMetadata::default(),
        }
    }

    /// Success-style notification.
    pub fn success(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, title, body)
    }

    /// Informational notification.
    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, title, body)
    }

    /// Error notification.
    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, title, body)
    }

    /// Set metadata.
    pub fn with_metadata(mut self, metadata: NotificationMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    fn now() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Notification classification; rendering is up to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    /// Something good happened.
    Success,
    /// Neutral information.
    Info,
    /// Something needs attention.
    Error,
}

impl NotificationLevel {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            NotificationLevel::Success => "Success",
            NotificationLevel::Info => "Info",
            NotificationLevel::Error => "Error",
        }
    }
}

/// Additional metadata for notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMetadata {
    /// Call the notification refers to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    /// Agent the notification refers to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

/// Destination for notifications.
pub trait NotificationSink: Send + Sync {
    /// Raise a notification.
    fn notify(&self, notification: Notification);
}

/// Notifications kept by [`NotificationLog`] unless configured otherwise.
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 500;

/// Sink that keeps the most recent notifications in memory.
///
/// Once `capacity` entries are held the oldest is dropped. Counts cover every
/// notification ever raised, including dropped ones.
#[derive(Debug)]
pub struct NotificationLog {
    capacity: usize,
    inner: RwLock<NotificationHistory>,
}

#[derive(Debug, Default)]
struct NotificationHistory {
    entries: VecDeque<Notification>,
    total: usize,
    by_level: HashMap<NotificationLevel, usize>,
}

impl Default for NotificationLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_NOTIFICATION_CAPACITY)
    }
}

impl NotificationLog {
    /// Create an empty log with the default capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty log retaining at most `capacity` notifications.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            inner: RwLock::new(NotificationHistory::default()),
        }
    }

    /// Maximum number of retained notifications.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Retained notifications, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.read().entries.iter().cloned().collect()
    }

    /// The `limit` most recent notifications, newest first.
    pub fn recent(&self, limit: usize) -> Vec<Notification> {
        self.inner
            .read()
            .entries
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Number of notifications ever raised at `level`.
    pub fn count(&self, level: NotificationLevel) -> usize {
        self.inner.read().by_level.get(&level).copied().unwrap_or(0)
    }

    /// Number of notifications ever raised.
    pub fn len(&self) -> usize {
        self.inner.read().total
    }

    /// Number of notifications currently retained.
    pub fn retained(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Whether nothing has been raised.
    pub fn is_empty(&self) -> bool {
        self.inner.read().total == 0
    }
}

impl NotificationSink for NotificationLog {
    fn notify(&self, notification: Notification) {
        let mut inner = self.inner.write();
        inner.total += 1;
        *inner.by_level.entry(notification.level).or_insert(0) += 1;
        inner.entries.push_back(notification);
        while inner.entries.len() > self.capacity {
            inner.entries.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_creation() {
        let notification = Notification::success("Call started", "Call call_1 started");

        assert!(!notification.id.is_empty());
        assert_eq!(notification.level, NotificationLevel::Success);
        assert_eq!(notification.body, "Call call_1 started");
        assert!(notification.created_at > 0);
    }

    #[test]
    fn test_notification_metadata_serialization() {
        let notification =
            Notification::info("Call ended", "").with_metadata(NotificationMetadata {
                call_id: Some("call_7".to_string()),
                agent_id: None,
            });

        let json = serde_json::to_string(&notification).unwrap();
        assert!(json.contains("\"level\":\"info\""));
        assert!(json.contains("\"call_id\":\"call_7\""));
        assert!(!json.contains("agent_id"));
    }

    #[test]
    fn test_notification_log() {
        let log = NotificationLog::new();
        assert!(log.is_empty());

        log.notify(Notification::success("a", ""));
        log.notify(Notification::error("b", ""));
        log.notify(Notification::info("c", ""));

        assert_eq!(log.len(), 3);
        assert_eq!(log.count(NotificationLevel::Error), 1);

        let recent = log.recent(2);
        assert_eq!(recent[0].title, "c");
        assert_eq!(recent[1].title, "b");
    }

    #[test]
    fn test_notification_log_drops_oldest() {
        let log = NotificationLog::with_capacity(3);
        for i in 0..5 {
            log.notify(Notification::info(format!("n{}", i), ""));
        }
        log.notify(Notification::error("n5", ""));

        assert_eq!(log.len(), 6);
        assert_eq!(log.retained(), 3);
        assert_eq!(log.count(NotificationLevel::Info), 5);
        assert_eq!(log.count(NotificationLevel::Error), 1);
        assert_eq!(log.count(NotificationLevel::Success), 0);

        let titles: Vec<String> = log.notifications().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["n3", "n4", "n5"]);
        assert_eq!(log.recent(10).len(), 3);
        assert_eq!(log.recent(1)[0].title, "n5");
    }

    #[test]
    fn test_level_label() {
        assert_eq!(NotificationLevel::Success.label(), "Success");
        assert_eq!(NotificationLevel::Error.label(), "Error");
    }
}
