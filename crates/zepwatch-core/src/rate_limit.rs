//! Global notification cooldown.

/// Minimum spacing between successive notify decisions.
///
/// The timestamp advances as soon as a permit is granted, before anything is
/// dispatched, so two events handled in the same tick cannot both pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimiter {
    last_notified_at_ms: Option<u64>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a permit at `now_ms`. A `cooldown_ms` of zero disables limiting.
    pub fn try_acquire(&mut self, now_ms: u64, cooldown_ms: u64) -> bool {
        let permitted = match self.last_notified_at_ms {
            None => true,
            Some(_) if cooldown_ms == 0 => true,
            Some(last) => now_ms.saturating_sub(last) >= cooldown_ms,
        };
        if permitted {
            self.last_notified_at_ms = Some(now_ms);
        }
        permitted
    }

    pub fn last_notified_at_ms(&self) -> Option<u64> {
        self.last_notified_at_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn first_request_is_permitted() {
        let mut limiter = RateLimiter::new();
        assert!(limiter.try_acquire(0, 1500));
        assert_eq!(limiter.last_notified_at_ms(), Some(0));
    }

    #[test]
    fn within_cooldown_is_refused() {
        let mut limiter = RateLimiter::new();
        assert!(limiter.try_acquire(10_000, 1500));
        assert!(!limiter.try_acquire(11_000, 1500));
        // Refusal does not move the window.
        assert_eq!(limiter.last_notified_at_ms(), Some(10_000));
    }

    #[test]
    fn boundary_is_inclusive() {
        let mut limiter = RateLimiter::new();
        assert!(limiter.try_acquire(10_000, 1500));
        assert!(limiter.try_acquire(11_500, 1500));
    }

    #[test]
    fn past_cooldown_is_permitted() {
        let mut limiter = RateLimiter::new();
        assert!(limiter.try_acquire(10_000, 1500));
        assert!(limiter.try_acquire(11_600, 1500));
    }

    #[test]
    fn same_tick_only_one_passes() {
        let mut limiter = RateLimiter::new();
        assert!(limiter.try_acquire(5_000, 1500));
        assert!(!limiter.try_acquire(5_000, 1500));
    }

    #[test]
    fn zero_cooldown_disables_limiting() {
        let mut limiter = RateLimiter::new();
        assert!(limiter.try_acquire(5_000, 0));
        assert!(limiter.try_acquire(5_000, 0));
        assert!(limiter.try_acquire(5_001, 0));
    }

    #[test]
    fn clock_going_backwards_is_refused() {
        let mut limiter = RateLimiter::new();
        assert!(limiter.try_acquire(10_000, 1500));
        assert!(!limiter.try_acquire(9_000, 1500));
    }

    proptest! {
        #[test]
        fn permits_are_spaced_by_cooldown(
            cooldown in 1u64..5_000,
            mut times in proptest::collection::vec(0u64..100_000, 1..60),
        ) {
            times.sort_unstable();
            let mut limiter = RateLimiter::new();
            let granted: Vec<u64> = times
                .iter()
                .copied()
                .filter(|t| limiter.try_acquire(*t, cooldown))
                .collect();
            prop_assert!(!granted.is_empty());
            for pair in granted.windows(2) {
                prop_assert!(pair[1] - pair[0] >= cooldown);
            }
        }
    }
}
