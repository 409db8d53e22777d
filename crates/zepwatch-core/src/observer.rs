//! Stream observer: turns render-tree mutation batches into candidate
//! message containers.
//!
//! The feed contract is deliberately small: each batch lists subtrees that
//! were appended, in feed order, with no re-delivery guarantee beyond what
//! the host provides. All dedup lives in the pipeline's dedup engine.

use std::collections::HashSet;
use std::rc::Rc;

use crate::classify::BUBBLE;
use crate::dom::{Element, Marker};

/// Subtrees appended by one mutation.
#[derive(Debug, Clone, Default)]
pub struct MutationRecord {
    pub added: Vec<Rc<Element>>,
}

/// One delivery from the render feed.
#[derive(Debug, Clone, Default)]
pub struct MutationBatch {
    pub records: Vec<MutationRecord>,
}

impl MutationBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, added: Vec<Rc<Element>>) {
        self.records.push(MutationRecord { added });
    }

    pub fn is_empty(&self) -> bool {
        self.records.iter().all(|r| r.added.is_empty())
    }
}

/// Candidate message containers in `batch`, in feed order.
pub fn collect_candidates(batch: &MutationBatch) -> Vec<Rc<Element>> {
    collect_matching(batch, &BUBBLE)
}

/// Elements matching `marker` among the appended subtrees.
///
/// An appended element that matches is taken as is; otherwise its matching
/// descendants are taken in document order. No element appears twice.
pub fn collect_matching(batch: &MutationBatch, marker: &Marker) -> Vec<Rc<Element>> {
    let mut visited: HashSet<*const Element> = HashSet::new();
    let mut out = Vec::new();
    for record in &batch.records {
        for node in &record.added {
            if node.matches(marker) {
                if visited.insert(Rc::as_ptr(node)) {
                    out.push(Rc::clone(node));
                }
                continue;
            }
            for descendant in node.query_all(std::slice::from_ref(marker)) {
                if visited.insert(Rc::as_ptr(&descendant)) {
                    out.push(descendant);
                }
            }
        }
    }
    out
}
