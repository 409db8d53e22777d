//! Notification sinks.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::DispatchError;
use crate::outbound::Outbound;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[default]
    Basic,
}

/// One native alert, shaped like `{type, iconUrl, title, message}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub icon_url: String,
    pub title: String,
    pub message: String,
}

/// Opaque handle returned by a sink.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub String);

impl NotificationId {
    /// `zepwatch-<unix ms>-<seq>`.
    pub(crate) fn generate(seq: &AtomicU64) -> Self {
        let n = seq.fetch_add(1, Ordering::Relaxed);
        Self(format!("zepwatch-{}-{n}", chrono::Utc::now().timestamp_millis()))
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Something that can show a notification. Enables mock injection for
/// testing.
pub trait NotificationSink: Send + Sync {
    fn create(&self, notification: &Notification) -> Result<NotificationId, DispatchError>;
}

impl<T: NotificationSink + ?Sized> NotificationSink for &T {
    fn create(&self, notification: &Notification) -> Result<NotificationId, DispatchError> {
        (**self).create(notification)
    }
}

impl<T: NotificationSink + ?Sized> NotificationSink for Arc<T> {
    fn create(&self, notification: &Notification) -> Result<NotificationId, DispatchError> {
        (**self).create(notification)
    }
}

/// Hands notifications back to the host bridge, which renders them.
#[derive(Debug)]
pub struct HostSink {
    tx: mpsc::UnboundedSender<Outbound>,
    seq: AtomicU64,
}

impl HostSink {
    pub fn new(tx: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            tx,
            seq: AtomicU64::new(0),
        }
    }
}

impl NotificationSink for HostSink {
    fn create(&self, notification: &Notification) -> Result<NotificationId, DispatchError> {
        let id = NotificationId::generate(&self.seq);
        self.tx
            .send(Outbound::Notification {
                id: id.clone(),
                notification: notification.clone(),
            })
            .map_err(|_| DispatchError::Closed)?;
        Ok(id)
    }
}
