use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Capacity of the notification channel; slow subscribers lose the oldest
const NOTIFICATION_BUFFER: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Transient user-facing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    pub timestamp: DateTime<Utc>,
}

/// Broadcasts notifications to every subscribed presentation layer
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTIFICATION_BUFFER);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn info(&self, message: impl Into<String>) {
        self.send(message.into(), NotificationLevel::Info);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(message.into(), NotificationLevel::Error);
    }

    fn send(&self, message: String, level: NotificationLevel) {
        match level {
            NotificationLevel::Info => info!("{}", message),
            NotificationLevel::Error => warn!("{}", message),
        }
        // No subscribers is fine
        let _ = self.tx.send(Notification {
            message,
            level,
            timestamp: Utc::now(),
        });
    }
}
