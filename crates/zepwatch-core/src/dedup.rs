//! Two-layer dedup engine.
//!
//! - [`SeenSet`]: element-identity layer. An element handled once is never
//!   handled again, whatever the outcome was.
//! - [`SignatureLru`]: content layer. Two different elements carrying the
//!   same `(sender, body)` notify at most once while the signature is retained.

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use indexmap::IndexSet;

use crate::dom::Element;
use crate::types::Signature;

/// Signatures retained by the content layer.
pub const SIGNATURE_LRU_CAPACITY: usize = 200;

/// Inserts between sweeps of dead entries from the seen set.
const PURGE_INTERVAL: usize = 512;

// ─── SeenSet ─────────────────────────────────────────────────────

/// Non-owning membership set over render-tree elements.
///
/// Entries are keyed by allocation address and hold only a `Weak`, so the
/// set never keeps an element alive. A `Weak` does pin the allocation
/// itself, so an address cannot be recycled while its entry exists; dead
/// entries are swept every few hundred inserts to release those.
#[derive(Debug, Default)]
pub struct SeenSet {
    entries: HashMap<usize, Weak<Element>>,
    inserts_since_purge: usize,
}

fn addr(element: &Rc<Element>) -> usize {
    Rc::as_ptr(element) as usize
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, element: &Rc<Element>) -> bool {
        self.entries.contains_key(&addr(element))
    }

    /// Mark `element` seen. Returns `true` if it was not seen before.
    pub fn insert(&mut self, element: &Rc<Element>) -> bool {
        if self.contains(element) {
            return false;
        }
        self.entries.insert(addr(element), Rc::downgrade(element));
        self.inserts_since_purge += 1;
        if self.inserts_since_purge >= PURGE_INTERVAL {
            self.purge_dead();
        }
        true
    }

    /// Drop entries whose element has been freed. Returns how many were removed.
    pub fn purge_dead(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, weak| weak.strong_count() > 0);
        self.inserts_since_purge = 0;
        before - self.entries.len()
    }

    /// Number of tracked entries, dead ones not yet purged included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ─── SignatureLru ────────────────────────────────────────────────

/// Bounded insertion-ordered set of recent signatures; oldest evicted first.
///
/// Membership checks do not refresh an entry's position.
#[derive(Debug, Clone)]
pub struct SignatureLru {
    entries: IndexSet<Signature>,
    capacity: usize,
}

impl SignatureLru {
    pub fn new() -> Self {
        Self::with_capacity(SIGNATURE_LRU_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexSet::with_capacity(capacity.saturating_add(1)),
            capacity,
        }
    }

    pub fn contains(&self, signature: &Signature) -> bool {
        self.entries.contains(signature)
    }

    /// Record `signature`, evicting the oldest entry beyond capacity.
    ///
    /// Returns the evicted signature, if any.
    pub fn insert(&mut self, signature: Signature) -> Option<Signature> {
        self.entries.insert(signature);
        if self.entries.len() > self.capacity {
            return self.entries.shift_remove_index(0);
        }
        None
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for SignatureLru {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────
