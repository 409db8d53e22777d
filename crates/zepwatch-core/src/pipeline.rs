//! Pipeline context: the single owner of all detection state.
//!
//! Constructed when observation starts and dropped with the host context.
//! Batches are handled one at a time on one thread, so nothing here locks.

use std::rc::Rc;

use crate::classify::{BUBBLE, extract_message, is_private_tab_on};
use crate::dedup::{SeenSet, SignatureLru};
use crate::dom::{Document, Element};
use crate::identity::{IdentityResolver, ProfileHook, UiEvent};
use crate::observer::{MutationBatch, collect_candidates};
use crate::rate_limit::RateLimiter;
use crate::settings::Settings;
use crate::types::{Decision, Identity, NotifyRequest, SkipReason};
use crate::warmup::{WarmupGate, WarmupState};

#[derive(Debug)]
pub struct PipelineContext {
    settings: Settings,
    identity: IdentityResolver,
    profile_hook: ProfileHook,
    warmup: WarmupGate,
    seen: SeenSet,
    signatures: SignatureLru,
    limiter: RateLimiter,
}

impl PipelineContext {
    /// Start a pipeline at `started_at_ms` with a warm-up window of `warmup_ms`.
    pub fn new(settings: Settings, started_at_ms: u64, warmup_ms: u64) -> Self {
        Self {
            settings,
            identity: IdentityResolver::new(),
            profile_hook: ProfileHook::new(),
            warmup: WarmupGate::new(started_at_ms, warmup_ms),
            seen: SeenSet::new(),
            signatures: SignatureLru::new(),
            limiter: RateLimiter::new(),
        }
    }

    // ── settings & identity ──────────────────────────────────────

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Swap in a new settings snapshot.
    pub fn replace_settings(&mut self, settings: Settings) {
        if settings != self.settings {
            tracing::info!(?settings, "settings updated");
        }
        self.settings = settings;
    }

    pub fn identity(&self) -> &Identity {
        self.identity.identity()
    }

    /// Apply the identity loaded from persistence at startup.
    pub fn load_identity(&mut self, stored: Option<&str>) {
        self.identity.load_persisted(stored);
    }

    /// Apply an identity change reported by persistence.
    pub fn apply_external_identity(&mut self, stored: Option<&str>) {
        self.identity.apply_external(stored);
    }

    /// Route a UI event to the profile hook. Returns a newly learned name
    /// that the caller must persist.
    pub fn on_ui_event(&mut self, event: &UiEvent<'_>) -> Option<String> {
        let value = self.profile_hook.on_ui_event(event)?;
        self.identity.commit(&value)
    }

    pub fn is_profile_hooked(&self) -> bool {
        self.profile_hook.is_hooked()
    }

    // ── warm-up ──────────────────────────────────────────────────

    pub fn warmup_deadline_ms(&self) -> u64 {
        self.warmup.deadline_ms()
    }

    /// Advance time-driven state to `now_ms`.
    pub fn tick(&mut self, now_ms: u64) -> WarmupState {
        self.warmup.poll(now_ms)
    }

    // ── observation ──────────────────────────────────────────────

    /// Mark every container already in `doc` as seen, without classifying.
    /// Only containers appended afterwards are live candidates.
    pub fn prime(&mut self, doc: &Document) -> usize {
        let existing = doc.query_all(&[BUBBLE]);
        let primed = existing.iter().filter(|el| self.seen.insert(el)).count();
        tracing::info!(primed, "primed existing messages");
        primed
    }

    /// Handle one mutation batch: retry the profile hook, then run every
    /// candidate container through [`handle`](Self::handle) in feed order.
    pub fn observe(
        &mut self,
        doc: &Document,
        batch: &MutationBatch,
        now_ms: u64,
    ) -> Vec<Decision> {
        self.profile_hook.try_hook(doc);
        collect_candidates(batch)
            .iter()
            .map(|element| self.handle(doc, element, now_ms))
            .collect()
    }

    /// Decide whether `element` warrants a notification.
    ///
    /// First match wins, and the element is marked seen before any check so
    /// every outcome is final for it: already seen, private-only policy,
    /// classification, warm-up, self-authored, recent signature, cooldown.
    pub fn handle(&mut self, doc: &Document, element: &Rc<Element>, now_ms: u64) -> Decision {
        let decision = self.decide(doc, element, now_ms);
        self.log_decision(element, &decision);
        decision
    }

    fn decide(&mut self, doc: &Document, element: &Rc<Element>, now_ms: u64) -> Decision {
        if !self.seen.insert(element) {
            return Decision::Skip(SkipReason::AlreadySeen);
        }
        if self.settings.only_when_private_on && !is_private_tab_on(doc) {
            return Decision::Skip(SkipReason::NotPrivate);
        }
        let Some(message) = extract_message(element) else {
            return Decision::Skip(SkipReason::Unclassified);
        };
        if self.warmup.poll(now_ms) != WarmupState::Ready {
            return Decision::Skip(SkipReason::WarmingUp);
        }
        if self.identity.identity().is_self(&message.sender) {
            return Decision::Skip(SkipReason::SelfAuthored);
        }
        let signature = message.signature();
        if self.signatures.contains(&signature) {
            return Decision::Skip(SkipReason::DuplicateSignature);
        }
        if !self.limiter.try_acquire(now_ms, self.settings.cooldown_ms) {
            return Decision::Skip(SkipReason::Cooldown);
        }
        self.signatures.insert(signature);
        Decision::Notify(NotifyRequest {
            title: message.sender,
            body: message.body,
        })
    }

    fn log_decision(&self, element: &Element, decision: &Decision) {
        let node = element.id().unwrap_or("-");
        match decision {
            Decision::Notify(req) if self.settings.debug => {
                tracing::info!(node, title = %req.title, "notify");
            }
            Decision::Notify(req) => {
                tracing::debug!(node, title = %req.title, "notify");
            }
            Decision::Skip(reason) if self.settings.debug => {
                tracing::info!(node, %reason, "skip");
            }
            Decision::Skip(reason) => {
                tracing::debug!(node, %reason, "skip");
            }
        }
    }

    // ── introspection ────────────────────────────────────────────

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }
}
