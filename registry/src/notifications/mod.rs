//! Notice bus
//!
//! Transient success/error notices published after each registry mutation.
//! Subscribers pick a level or `NoticeLevel::All` and get a bounded channel.
//! Publishing never blocks: a full or closed channel drops the notice for
//! that subscriber only.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Channel buffer size for bounded channels
const CHANNEL_BUFFER_SIZE: usize = 100;

/// How long a notice stays visible unless configured otherwise
pub const DEFAULT_DISMISS_AFTER: Duration = Duration::from_millis(3000);

/// Notice severity, also used as the subscription key
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
    /// Subscribe to every level
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    #[serde(rename = "dismiss_after_ms", serialize_with = "as_millis")]
    pub dismiss_after: Duration,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Publish/subscribe hub for notices
pub struct NoticeBus {
    channels: Arc<Mutex<HashMap<NoticeLevel, Vec<mpsc::Sender<Notice>>>>>,
    dismiss_after: Duration,
}

impl NoticeBus {
    pub fn new() -> Self {
        Self::with_dismiss_after(DEFAULT_DISMISS_AFTER)
    }

    pub fn with_dismiss_after(dismiss_after: Duration) -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            dismiss_after,
        }
    }

    pub fn dismiss_after(&self) -> Duration {
        self.dismiss_after
    }

    /// Subscribe to one notice level, or `NoticeLevel::All`
    pub fn subscribe(&self, level: NoticeLevel) -> mpsc::Receiver<Notice> {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels.entry(level).or_default().push(tx);
        rx
    }

    /// Send a notice to the subscribers of its level and of `All`
    pub fn publish(&self, notice: Notice) {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());

        for key in [notice.level, NoticeLevel::All] {
            if let Some(subscribers) = channels.get_mut(&key) {
                subscribers.retain(|tx| !tx.is_closed());
                for tx in subscribers.iter() {
                    if tx.try_send(notice.clone()).is_err() {
                        debug!("Dropped notice for a full subscriber");
                    }
                }
            }
        }
    }

    pub fn success(&self, message: impl Into<String>) {
        self.publish(Notice {
            level: NoticeLevel::Success,
            message: message.into(),
            dismiss_after: self.dismiss_after,
        });
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(Notice {
            level: NoticeLevel::Error,
            message: message.into(),
            dismiss_after: self.dismiss_after,
        });
    }
}

impl Default for NoticeBus {
    fn default() -> Self {
        Self::new()
    }
}
