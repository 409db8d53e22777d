//! Self-identity inference from the profile-entry form.
//!
//! The chat surface asks for a nickname in a one-time profile form. Once the
//! form shows up, [`ProfileHook`] latches onto its nickname input (and the
//! confirm button, when present) exactly once. UI events on those controls
//! commit a value, and [`IdentityResolver`] keeps the normalized name.
//!
//! Input discovery order:
//! 1. `input[placeholder="Enter your nickname"]`
//! 2. `input[data-sentry-element="Input"]`
//! 3. the first `input` under the nearest ancestor of a known profile heading

use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::dom::{Document, Element, Marker};
use crate::normalize::normalize_name;
use crate::types::Identity;

pub const NICKNAME_INPUT: Marker = Marker::tag("input", &[("placeholder", "Enter your nickname")]);

pub const NICKNAME_INPUT_FALLBACK: Marker =
    Marker::tag("input", &[("data-sentry-element", "Input")]);

/// Visible headings of the profile-entry form.
pub const PROFILE_HEADINGS: &[&str] = &["Create profile", "프로필 만들기"];

/// Confirm button label, compared trimmed and lower-cased.
const CONFIRM_LABEL: &str = "enter";

const INPUT: Marker = Marker::tag("input", &[]);
const BUTTON: Marker = Marker::tag("button", &[]);

// ─── UI events ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiEventKind {
    Input,
    Change,
    KeyDown,
    Click,
}

/// A user interaction on a render-tree element. For `Input`/`Change` the
/// element's value has already been updated when the event is delivered.
#[derive(Debug, Clone, Copy)]
pub struct UiEvent<'a> {
    pub target: &'a Rc<Element>,
    pub kind: UiEventKind,
    /// Key name for `KeyDown`.
    pub key: Option<&'a str>,
}

// ─── ProfileHook ─────────────────────────────────────────────────

#[derive(Debug)]
struct HookedForm {
    input: Weak<Element>,
    confirm: Option<Weak<Element>>,
}

/// One-shot attachment to the nickname form.
#[derive(Debug, Default)]
pub struct ProfileHook {
    hooked: Option<HookedForm>,
}

impl ProfileHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a form was ever attached. The latch survives the form
    /// leaving the tree.
    pub fn is_hooked(&self) -> bool {
        self.hooked.is_some()
    }

    /// Look for the nickname form and attach to it.
    ///
    /// Latching: once attached this is a no-op returning `true`, even after
    /// the form is removed, so later inputs elsewhere on the page are never
    /// mistaken for the nickname field. Returns `false` while the form has
    /// not shown up yet, which is a normal steady state.
    pub fn try_hook(&mut self, doc: &Document) -> bool {
        if self.is_hooked() {
            return true;
        }
        let Some(input) = find_nickname_input(doc) else {
            return false;
        };
        let confirm = doc
            .query_all(&[BUTTON])
            .into_iter()
            .find(|button| button.text_content().trim().to_lowercase() == CONFIRM_LABEL);

        tracing::info!(
            input_id = input.id().unwrap_or("-"),
            has_confirm = confirm.is_some(),
            "nickname hook attached"
        );
        self.hooked = Some(HookedForm {
            input: Rc::downgrade(&input),
            confirm: confirm.as_ref().map(Rc::downgrade),
        });
        true
    }

    /// The value committed by `event`, if it is a commit on the hooked form:
    /// input, change or Enter on the nickname input, or a confirm click.
    pub fn on_ui_event(&self, event: &UiEvent<'_>) -> Option<String> {
        let form = self.hooked.as_ref()?;
        let input = form.input.upgrade()?;
        let on_input = Rc::ptr_eq(event.target, &input);
        let committed = match event.kind {
            UiEventKind::Input | UiEventKind::Change => on_input,
            UiEventKind::KeyDown => on_input && event.key == Some("Enter"),
            UiEventKind::Click => form
                .confirm
                .as_ref()
                .and_then(Weak::upgrade)
                .is_some_and(|button| Rc::ptr_eq(event.target, &button)),
        };
        committed.then(|| input.value())
    }
}

fn find_nickname_input(doc: &Document) -> Option<Rc<Element>> {
    doc.query_first(&[NICKNAME_INPUT])
        .or_else(|| doc.query_first(&[NICKNAME_INPUT_FALLBACK]))
        .or_else(|| find_input_near_heading(doc))
}

fn find_input_near_heading(doc: &Document) -> Option<Rc<Element>> {
    let heading = doc.root().descendants().into_iter().find(|el| {
        let text = el.own_text();
        let text = text.trim();
        PROFILE_HEADINGS
            .iter()
            .any(|heading| text.eq_ignore_ascii_case(heading))
    })?;
    let mut cursor = heading.parent();
    while let Some(ancestor) = cursor {
        if let Some(input) = ancestor.query_first(&[INPUT]) {
            return Some(input);
        }
        cursor = ancestor.parent();
    }
    None
}

// ─── IdentityResolver ────────────────────────────────────────────

/// Holds the learned self identity.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    identity: Identity,
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Apply the identity read from persistence at startup.
    ///
    /// The load races early events; a name committed in this session before
    /// the load resolved is newer and wins.
    pub fn load_persisted(&mut self, stored: Option<&str>) {
        if matches!(self.identity, Identity::Learned(_)) {
            return;
        }
        self.apply_external(stored);
    }

    /// Replace the identity after an external change to persistence.
    pub fn apply_external(&mut self, stored: Option<&str>) {
        self.identity = match stored.map(normalize_name) {
            Some(name) if !name.is_empty() => Identity::Learned(name),
            _ => Identity::Unknown,
        };
    }

    /// Commit a nickname typed into the profile form.
    ///
    /// Returns the normalized name when it differs from the current identity
    /// and must be persisted; `None` for blank or unchanged values.
    pub fn commit(&mut self, raw: &str) -> Option<String> {
        let name = normalize_name(raw);
        if name.is_empty() || self.identity.is_self(&name) {
            return None;
        }
        tracing::info!(name = %name, "self name learned");
        self.identity = Identity::Learned(name.clone());
        Some(name)
    }
}

// ─── Tests ───────────────────────────────────────────────────────
