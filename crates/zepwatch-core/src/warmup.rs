//! Startup warm-up gate.
//!
//! The chat surface replays recent history when a room is joined. Everything
//! rendered during the warm-up window is treated as history: marked seen,
//! never notified.
//!
//! Two states, `WarmingUp → Ready`, one transition, triggered by elapsed
//! time only (never by event volume).

use serde::{Deserialize, Serialize};

/// Default warm-up window measured from pipeline start.
pub const DEFAULT_WARMUP_MS: u64 = 2500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarmupState {
    WarmingUp,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarmupGate {
    started_at_ms: u64,
    delay_ms: u64,
    state: WarmupState,
}

impl WarmupGate {
    pub fn new(started_at_ms: u64, delay_ms: u64) -> Self {
        Self {
            started_at_ms,
            delay_ms,
            state: WarmupState::WarmingUp,
        }
    }

    /// Epoch ms at which the gate opens.
    pub fn deadline_ms(&self) -> u64 {
        self.started_at_ms.saturating_add(self.delay_ms)
    }

    /// Advance the gate to `now_ms` and return the resulting state.
    ///
    /// Once `Ready`, stays `Ready` even if `now_ms` goes backwards.
    pub fn poll(&mut self, now_ms: u64) -> WarmupState {
        if self.state == WarmupState::WarmingUp && now_ms >= self.deadline_ms() {
            self.state = WarmupState::Ready;
            tracing::info!(
                warmup_ms = self.delay_ms,
                "warm-up elapsed, notifications ready"
            );
        }
        self.state
    }

    pub fn state(&self) -> WarmupState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == WarmupState::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_warming_up() {
        let gate = WarmupGate::new(1_000, DEFAULT_WARMUP_MS);
        assert_eq!(gate.state(), WarmupState::WarmingUp);
        assert_eq!(gate.deadline_ms(), 3_500);
    }

    #[test]
    fn opens_exactly_at_deadline() {
        let mut gate = WarmupGate::new(1_000, 2_500);
        assert_eq!(gate.poll(3_499), WarmupState::WarmingUp);
        assert_eq!(gate.poll(3_500), WarmupState::Ready);
    }

    #[test]
    fn never_reverts() {
        let mut gate = WarmupGate::new(1_000, 2_500);
        assert!(gate.poll(10_000) == WarmupState::Ready);
        assert_eq!(gate.poll(0), WarmupState::Ready);
        assert!(gate.is_ready());
    }

    #[test]
    fn zero_delay_is_ready_immediately() {
        let mut gate = WarmupGate::new(500, 0);
        assert_eq!(gate.poll(500), WarmupState::Ready);
    }
}
