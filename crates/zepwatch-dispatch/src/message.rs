//! The notify message passed from the detection pipeline to the dispatcher.

use serde::{Deserialize, Serialize};
use zepwatch_core::NotifyRequest;

/// Title used when the payload's title is blank.
pub const DEFAULT_TITLE: &str = "ZEP";
/// Body used when the payload's body is blank.
pub const DEFAULT_BODY: &str = "새 메시지가 도착했어요";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyPayload {
    pub title: String,
    pub body: String,
}

impl NotifyPayload {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Trimmed copy with blank fields replaced by the defaults.
    pub fn with_defaults(&self) -> Self {
        fn or_default(value: &str, default: &str) -> String {
            match value.trim() {
                "" => default.to_owned(),
                trimmed => trimmed.to_owned(),
            }
        }
        Self {
            title: or_default(&self.title, DEFAULT_TITLE),
            body: or_default(&self.body, DEFAULT_BODY),
        }
    }
}

impl From<NotifyRequest> for NotifyPayload {
    fn from(req: NotifyRequest) -> Self {
        Self {
            title: req.title,
            body: req.body,
        }
    }
}

/// `{"type": "NOTIFY", "payload": {...}}` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum RuntimeMessage {
    #[serde(rename = "NOTIFY", alias = "ZEP_NOTIFY")]
    Notify(NotifyPayload),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_shape() {
        let msg = RuntimeMessage::Notify(NotifyPayload::new("Bob", "hi"));
        let value = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(
            value,
            json!({"type": "NOTIFY", "payload": {"title": "Bob", "body": "hi"}})
        );
    }

    #[test]
    fn accepts_legacy_type_and_missing_fields() {
        let msg: RuntimeMessage =
            serde_json::from_value(json!({"type": "ZEP_NOTIFY", "payload": {"title": "Bob"}}))
                .expect("deserialize");
        assert_eq!(msg, RuntimeMessage::Notify(NotifyPayload::new("Bob", "")));
    }

    #[test]
    fn blank_fields_take_defaults() {
        let p = NotifyPayload::new("  ", "\n").with_defaults();
        assert_eq!(p.title, DEFAULT_TITLE);
        assert_eq!(p.body, DEFAULT_BODY);
    }

    #[test]
    fn fields_are_trimmed() {
        let p = NotifyPayload::new(" Bob ", " hello there ").with_defaults();
        assert_eq!(p, NotifyPayload::new("Bob", "hello there"));
    }
}
