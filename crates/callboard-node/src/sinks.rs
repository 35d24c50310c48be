//! Cache and notification sinks used by the node.
//!
//! The node has no dashboard attached, so invalidations and notifications are
//! logged and kept in memory for the status API.

use callboard_realtime::{
    InvalidationLog, Notification, NotificationLevel, NotificationLog, NotificationSink,
    QueryCache, QueryKey,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Records invalidation requests and logs each one.
#[derive(Debug, Clone)]
pub struct LoggedCache {
    log: Arc<InvalidationLog>,
}

impl LoggedCache {
    pub fn new(log: Arc<InvalidationLog>) -> Self {
        Self { log }
    }
}

impl QueryCache for LoggedCache {
    fn invalidate(&self, key: QueryKey) {
        debug!(query = %key, "Query invalidated");
        self.log.invalidate(key);
    }
}

/// Records notifications and logs each one at a matching level.
#[derive(Debug, Clone)]
pub struct LoggedNotifier {
    log: Arc<NotificationLog>,
}

impl LoggedNotifier {
    pub fn new(log: Arc<NotificationLog>) -> Self {
        Self { log }
    }
}

impl NotificationSink for LoggedNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => warn!(
                title = %notification.title,
                body = %notification.body,
                "Notification"
            ),
            level => info!(
                level = level.label(),
                title = %notification.title,
                body = %notification.body,
                "Notification"
            ),
        }
        self.log.notify(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sinks_record() {
        let invalidations = Arc::new(InvalidationLog::new());
        let notifications = Arc::new(NotificationLog::new());

        LoggedCache::new(invalidations.clone()).invalidate(QueryKey::Agents);
        LoggedNotifier::new(notifications.clone())
            .notify(Notification::error("Connection lost", "gave up"));

        assert_eq!(invalidations.requests(), vec![QueryKey::Agents]);
        assert_eq!(notifications.count(NotificationLevel::Error), 1);
    }
}
