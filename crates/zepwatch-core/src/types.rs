use std::fmt;

use serde::{Deserialize, Serialize};

// ─── Message Event ───────────────────────────────────────────────

/// A chat message extracted from one rendered container.
///
/// Both fields are non-empty; the classifier yields nothing otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Normalized display name of the author.
    pub sender: String,
    /// Trimmed message text.
    pub body: String,
}

impl MessageEvent {
    pub fn signature(&self) -> Signature {
        Signature::of(&self.sender, &self.body)
    }
}

// ─── Signature ───────────────────────────────────────────────────

/// Content-derived dedup key, `sender::body`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    pub fn of(sender: &str, body: &str) -> Self {
        Self(format!("{sender}::{body}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── Identity ────────────────────────────────────────────────────

/// The local user's display name, as far as the pipeline knows it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Identity {
    /// Not loaded from persistence yet, or never learned. The self-filter
    /// never matches in this state.
    #[default]
    Unknown,
    Learned(String),
}

impl Identity {
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Unknown => None,
            Self::Learned(name) => Some(name),
        }
    }

    /// Whether `sender` is the local user.
    pub fn is_self(&self, sender: &str) -> bool {
        self.name().is_some_and(|name| name == sender)
    }
}

// ─── Decisions ───────────────────────────────────────────────────

/// A notification the dispatcher should emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyRequest {
    pub title: String,
    pub body: String,
}

/// Why an element was marked seen without notifying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Already handled earlier (or primed at startup).
    AlreadySeen,
    /// Private-only policy is on and the private tab is not active.
    NotPrivate,
    /// Sender or body missing.
    Unclassified,
    /// Inside the startup warm-up window.
    WarmingUp,
    /// Authored by the local user.
    SelfAuthored,
    /// Same sender and body notified recently.
    DuplicateSignature,
    /// Inside the cooldown after the previous notification.
    Cooldown,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AlreadySeen => "already_seen",
            Self::NotPrivate => "not_private",
            Self::Unclassified => "unclassified",
            Self::WarmingUp => "warming_up",
            Self::SelfAuthored => "self_authored",
            Self::DuplicateSignature => "duplicate_signature",
            Self::Cooldown => "cooldown",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of handling one candidate element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Notify(NotifyRequest),
    Skip(SkipReason),
}

impl Decision {
    pub fn is_notify(&self) -> bool {
        matches!(self, Self::Notify(_))
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Self::Notify(_) => None,
            Self::Skip(reason) => Some(*reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_joins_sender_and_body() {
        let event = MessageEvent {
            sender: "Bob".into(),
            body: "hello".into(),
        };
        assert_eq!(event.signature().as_str(), "Bob::hello");
    }

    #[test]
    fn unknown_identity_never_matches() {
        assert!(!Identity::Unknown.is_self(""));
        assert!(!Identity::Unknown.is_self("Alice"));
    }

    #[test]
    fn learned_identity_matches_exactly() {
        let me = Identity::Learned("Alice".into());
        assert!(me.is_self("Alice"));
        assert!(!me.is_self("alice"));
        assert_eq!(me.name(), Some("Alice"));
    }

    #[test]
    fn skip_reason_serializes_snake_case() {
        let json = serde_json::to_string(&SkipReason::DuplicateSignature).expect("serialize");
        assert_eq!(json, "\"duplicate_signature\"");
    }
}
