//! Host bridge input: one JSON object per stdin line.
//!
//! ```text
//! {"type":"snapshot","root":{"tag":"body","children":[...]}}
//! {"type":"mutations","records":[{"op":"append","parent":"chat","nodes":[...]}]}
//! {"type":"ui","target":"nick","kind":"input","value":"Alice"}
//! {"type":"tabs","tabs":[{"id":4,"windowId":2,"url":"https://zep.us/play"}]}
//! {"type":"notification_clicked"}
//! ```

use serde::Deserialize;
use thiserror::Error;
use zepwatch_core::{Document, DomError, MutationBatch, NodeSpec, UiEventKind};
use zepwatch_dispatch::TabInfo;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("malformed feed line: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Dom(#[from] DomError),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// The whole current tree. Replaces the document.
    Snapshot { root: NodeSpec },
    /// One observer callback's worth of changes.
    Mutations { records: Vec<MutationOp> },
    Ui {
        target: String,
        kind: UiEventKind,
        #[serde(default)]
        key: Option<String>,
        /// Current value of the target, for input/change events.
        #[serde(default)]
        value: Option<String>,
    },
    Tabs { tabs: Vec<TabInfo> },
    NotificationClicked {
        #[serde(default)]
        id: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MutationOp {
    Append {
        /// `None` appends under the root.
        #[serde(default)]
        parent: Option<String>,
        nodes: Vec<NodeSpec>,
    },
    Remove { id: String },
    SetAttr { id: String, name: String, value: String },
    SetText { id: String, text: String },
}

pub fn parse_line(line: &str) -> Result<HostEvent, FeedError> {
    Ok(serde_json::from_str(line)?)
}

/// Apply `ops` to `doc` in order and collect the appended subtrees.
///
/// A failing op is logged and skipped; the rest of the batch still applies.
pub fn apply_mutations(doc: &mut Document, ops: Vec<MutationOp>) -> MutationBatch {
    let mut batch = MutationBatch::new();
    for op in ops {
        let result = match op {
            MutationOp::Append { parent, nodes } => doc
                .append(parent.as_deref(), &nodes)
                .map(|added| batch.push(added)),
            MutationOp::Remove { id } => doc.remove(&id),
            MutationOp::SetAttr { id, name, value } => doc.set_attr(&id, &name, &value),
            MutationOp::SetText { id, text } => doc.set_text(&id, &text),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "skipping mutation");
        }
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn parses_every_event_type() {
        let lines = [
            r#"{"type":"snapshot","root":{"tag":"body"}}"#,
            r#"{"type":"mutations","records":[{"op":"remove","id":"x"}]}"#,
            r#"{"type":"ui","target":"nick","kind":"keydown","key":"Enter"}"#,
            r#"{"type":"tabs","tabs":[]}"#,
            r#"{"type":"notification_clicked"}"#,
        ];
        for line in lines {
            parse_line(line).expect(line);
        }
    }

    #[test]
    fn rejects_unknown_type() {
        assert!(matches!(
            parse_line(r#"{"type":"resize"}"#),
            Err(FeedError::Json(_))
        ));
        assert!(parse_line("not json").is_err());
    }

    #[test]
    fn appended_nodes_form_the_batch() {
        let root = NodeSpec::new("body").child(NodeSpec::new("main").with_id("chat"));
        let mut doc = Document::from_spec(&root).expect("tree");
        let event = parse_line(
            r#"{"type":"mutations","records":[
                {"op":"append","parent":"chat","nodes":[{"tag":"div","id":"m1","text":"a"}]},
                {"op":"set_text","id":"m1","text":"b"},
                {"op":"append","parent":"chat","nodes":[{"tag":"div","id":"m2"}]}
            ]}"#,
        )
        .expect("parse");
        let HostEvent::Mutations { records } = event else {
            panic!("expected mutations");
        };
        let batch = apply_mutations(&mut doc, records);
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[0].added[0].id(), Some("m1"));
        assert_eq!(
            doc.get("m1").map(|el| el.text_content()),
            Some("b".to_owned())
        );
    }

    #[test]
    fn bad_op_does_not_abort_batch() {
        let mut doc = Document::new();
        let ops = vec![
            MutationOp::Remove { id: "ghost".into() },
            MutationOp::Append {
                parent: None,
                nodes: vec![NodeSpec::new("div").with_id("ok")],
            },
        ];
        let batch = apply_mutations(&mut doc, ops);
        assert_eq!(batch.records.len(), 1);
        assert!(doc.get("ok").is_some());
    }

    #[test]
    fn rejected_append_leaves_no_unreported_nodes() {
        let root = NodeSpec::new("body")
            .child(NodeSpec::new("main").with_id("chat"))
            .child(NodeSpec::new("div").with_id("dup"));
        let mut doc = Document::from_spec(&root).expect("tree");
        let ops = vec![
            MutationOp::Append {
                parent: Some("chat".into()),
                nodes: vec![
                    NodeSpec::new("div").with_id("m1"),
                    NodeSpec::new("div").with_id("dup"),
                ],
            },
            MutationOp::Append {
                parent: Some("chat".into()),
                nodes: vec![NodeSpec::new("div").with_id("m1")],
            },
        ];
        let batch = apply_mutations(&mut doc, ops);
        // Every node in the tree under `chat` was reported exactly once.
        let chat = doc.get("chat").expect("chat");
        assert_eq!(chat.children().len(), 1);
        assert_eq!(batch.records.len(), 1);
        assert!(Rc::ptr_eq(&batch.records[0].added[0], &chat.children()[0]));
    }
}
