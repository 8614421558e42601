//! # Notifications
//!
//! Short-lived toasts shown to the attendant: "Venda realizada", "out of
//! stock", "invalid manager code" and so on. Each one expires on its own
//! after a fixed TTL; there is no manual dismissal.
//!
//! The queue never reads the clock. Callers pass `now`, which keeps expiry
//! deterministic under test.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::NOTIFICATION_TTL_SECS;

/// Visible notifications kept at once. Older ones are dropped first.
const MAX_VISIBLE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Notification {
    #[ts(as = "String")]
    pub id: Uuid,
    pub message: String,
    pub severity: Severity,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub expires_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Per-session notification queue.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    ttl: Duration,
    items: Vec<Notification>,
}

impl Default for NotificationQueue {
    fn default() -> Self {
        NotificationQueue::new(Duration::seconds(NOTIFICATION_TTL_SECS))
    }
}

impl NotificationQueue {
    pub fn new(ttl: Duration) -> Self {
        NotificationQueue {
            ttl,
            items: Vec::new(),
        }
    }

    /// Queues a notification that expires `ttl` after `now`.
    pub fn push(
        &mut self,
        message: impl Into<String>,
        severity: Severity,
        now: DateTime<Utc>,
    ) -> &Notification {
        self.prune(now);
        if self.items.len() >= MAX_VISIBLE {
            self.items.remove(0);
        }

        self.items.push(Notification {
            id: Uuid::new_v4(),
            message: message.into(),
            severity,
            created_at: now,
            expires_at: now + self.ttl,
        });

        let last = self.items.len() - 1;
        &self.items[last]
    }

    pub fn success(&mut self, message: impl Into<String>, now: DateTime<Utc>) {
        self.push(message, Severity::Success, now);
    }

    pub fn error(&mut self, message: impl Into<String>, now: DateTime<Utc>) {
        self.push(message, Severity::Error, now);
    }

    pub fn info(&mut self, message: impl Into<String>, now: DateTime<Utc>) {
        self.push(message, Severity::Info, now);
    }

    /// Drops expired notifications and returns the rest, oldest first.
    pub fn active(&mut self, now: DateTime<Utc>) -> Vec<Notification> {
        self.prune(now);
        self.items.clone()
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        self.items.retain(|n| !n.is_expired(now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notifications_expire_after_ttl() {
        let mut queue = NotificationQueue::default();
        let t0 = Utc::now();

        queue.success("Venda realizada com sucesso!", t0);
        assert_eq!(queue.active(t0 + Duration::seconds(2)).len(), 1);
        assert!(queue.active(t0 + Duration::seconds(3)).is_empty());
    }

    #[test]
    fn test_queue_keeps_latest_five() {
        let mut queue = NotificationQueue::new(Duration::seconds(60));
        let t0 = Utc::now();

        for i in 0..7 {
            queue.info(format!("msg {i}"), t0);
        }

        let active = queue.active(t0);
        assert_eq!(active.len(), 5);
        assert_eq!(active[0].message, "msg 2");
        assert_eq!(active[4].message, "msg 6");
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Error).unwrap(), "\"error\"");
    }
}
