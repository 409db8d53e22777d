//! Event classifier and the render-tree contract it depends on.
//!
//! The chat surface marks its structure with `data-sentry-*` attributes.
//! Extraction only works while these markers match the live page exactly.

use crate::dom::{Document, Element, Marker};
use crate::normalize::normalize_name;
use crate::types::MessageEvent;

/// Message container ("bubble").
pub const BUBBLE: Marker = Marker::any(&[("data-sentry-element", "BubbleWrapper")]);

/// Sender label inside a bubble.
pub const SENDER: Marker = Marker::any(&[("data-sentry-component", "SenderName")]);

/// Message content region inside a bubble.
pub const CONTENT: Marker = Marker::any(&[("data-sentry-element", "MessageContent")]);

const PARAGRAPH: Marker = Marker::tag("p", &[]);

/// Active chat tab toggle and its label, e.g.
/// `button[role=radio][data-state=on] span[data-sentry-component=ChatTabItemContent]`.
pub const ACTIVE_TAB_LABEL: [Marker; 2] = [
    Marker::tag("button", &[("role", "radio"), ("data-state", "on")]),
    Marker::tag("span", &[("data-sentry-component", "ChatTabItemContent")]),
];

/// Label of the private conversation tab.
pub const PRIVATE_TAB_LABEL: &str = "Private";

/// Extract `(sender, body)` from a bubble.
///
/// The body prefers the first paragraph inside the content region and falls
/// back to the region's whole text. Returns `None` unless both are non-empty.
pub fn extract_message(bubble: &Element) -> Option<MessageEvent> {
    let sender = bubble
        .query_first(&[SENDER])
        .map(|label| normalize_name(&label.text_content()))
        .unwrap_or_default();

    let content = bubble.query_first(&[CONTENT]);
    let paragraph = content
        .as_ref()
        .and_then(|region| region.query_first(&[PARAGRAPH]))
        .map(|p| p.text_content().trim().to_owned())
        .filter(|text| !text.is_empty());
    let body = paragraph
        .or_else(|| {
            content
                .as_ref()
                .map(|region| region.text_content().trim().to_owned())
        })
        .unwrap_or_default();

    if sender.is_empty() || body.is_empty() {
        return None;
    }
    Some(MessageEvent { sender, body })
}

/// Whether the private conversation tab is the active chat tab.
pub fn is_private_tab_on(doc: &Document) -> bool {
    doc.query_first(&ACTIVE_TAB_LABEL)
        .is_some_and(|label| label.text_content().trim() == PRIVATE_TAB_LABEL)
}
