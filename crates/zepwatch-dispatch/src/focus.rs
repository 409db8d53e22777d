//! Notification click → tab refocus routing.

use serde::{Deserialize, Serialize};

pub const DEFAULT_TAB_URL_PREFIX: &str = "https://zep.us/";

/// One browser tab as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    pub id: i64,
    pub window_id: i64,
    pub url: String,
}

/// Focus `window_id`, then activate `tab_id` inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusRequest {
    pub window_id: i64,
    pub tab_id: i64,
}

/// The host's most recent tab list.
#[derive(Debug, Clone)]
pub struct TabDirectory {
    url_prefix: String,
    tabs: Vec<TabInfo>,
}

impl TabDirectory {
    pub fn new(url_prefix: impl Into<String>) -> Self {
        Self {
            url_prefix: url_prefix.into(),
            tabs: Vec::new(),
        }
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Replace the whole list; the host always sends a full snapshot.
    pub fn replace(&mut self, tabs: Vec<TabInfo>) {
        self.tabs = tabs;
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Target for a notification click: the first matching tab in host
    /// order. No recency ordering.
    pub fn on_notification_clicked(&self) -> Option<FocusRequest> {
        let tab = self
            .tabs
            .iter()
            .find(|tab| tab.url.starts_with(&self.url_prefix))?;
        Some(FocusRequest {
            window_id: tab.window_id,
            tab_id: tab.id,
        })
    }
}

impl Default for TabDirectory {
    fn default() -> Self {
        Self::new(DEFAULT_TAB_URL_PREFIX)
    }
}
