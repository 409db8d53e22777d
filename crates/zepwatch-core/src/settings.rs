//! User-configurable settings snapshot.

use serde::{Deserialize, Serialize};

/// Default minimum spacing between notifications.
pub const DEFAULT_COOLDOWN_MS: u64 = 1500;

/// Immutable settings snapshot. Replaced wholesale on every external change,
/// never patched field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Notify only while the private conversation tab is active.
    pub only_when_private_on: bool,
    /// Minimum spacing between notifications; `0` disables the limit.
    pub cooldown_ms: u64,
    /// Log every pipeline decision at info level.
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            only_when_private_on: true,
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            debug: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert!(s.only_when_private_on);
        assert_eq!(s.cooldown_ms, 1500);
        assert!(!s.debug);
    }

    #[test]
    fn camel_case_round_trip_with_missing_fields() {
        let s: Settings = serde_json::from_str(r#"{"cooldownMs": 0}"#).expect("json");
        assert_eq!(s.cooldown_ms, 0);
        assert!(s.only_when_private_on);

        let json = serde_json::to_value(s).expect("serialize");
        assert_eq!(json["onlyWhenPrivateOn"], true);
        assert_eq!(json["cooldownMs"], 0);
    }
}
