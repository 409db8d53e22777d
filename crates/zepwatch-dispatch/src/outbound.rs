//! Messages written back to the host bridge, one JSON object per line.

use serde::{Deserialize, Serialize};

use crate::focus::FocusRequest;
use crate::sink::{Notification, NotificationId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    /// Show a notification (host sink only).
    Notification {
        id: NotificationId,
        notification: Notification,
    },
    /// Bring a tab and its window to the front.
    Focus(FocusRequest),
}
