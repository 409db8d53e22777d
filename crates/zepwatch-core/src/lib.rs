//! zepwatch-core: chat render-event detection pipeline.
//! Turns appended render-tree elements into deduplicated, rate-limited
//! notify decisions and learns the local user's display name.
//!
//! Pure, synchronous and IO-free. Every time-dependent operation takes an
//! explicit `now_ms` so callers (and tests) own the clock.

pub mod classify;
pub mod dedup;
pub mod dom;
pub mod identity;
pub mod normalize;
pub mod observer;
pub mod pipeline;
pub mod rate_limit;
pub mod settings;
pub mod types;
pub mod warmup;

pub use dom::{Document, DomError, Element, Marker, NodeSpec};
pub use identity::{IdentityResolver, ProfileHook, UiEvent, UiEventKind};
pub use observer::{MutationBatch, MutationRecord};
pub use pipeline::PipelineContext;
pub use settings::Settings;
pub use types::{Decision, Identity, MessageEvent, NotifyRequest, Signature, SkipReason};
