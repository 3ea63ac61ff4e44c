//! Per-client fixed-window throttle for paste creation.
//!
//! Each client key carries a counter and at most one scheduled reset. The
//! first admitted request after a reset schedules the next one at
//! `now + window`; later requests in the window never move it. A due reset is
//! applied the next time the key is touched (or by [`RateLimiter::sweep`]),
//! so no timer task is needed and callers never wait on a reset.
//!
//! Because windows are fixed, up to `2 * limit` requests can be admitted
//! around a reset boundary.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Longest window honoured; larger values are clamped so resets stay representable.
pub const MAX_WINDOW: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy)]
struct RateLimiterEntry {
    count: u32,
    /// `Some` while a reset is scheduled for this key.
    reset_at: Option<Instant>,
}

impl RateLimiterEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.reset_at.map_or(true, |reset_at| now >= reset_at)
    }
}

/// Tracks create attempts per client key.
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    max_tracked: usize,
    entries: Mutex<HashMap<String, RateLimiterEntry>>,
}

impl RateLimiter {
    /// Build a limiter admitting `limit` requests per key per `window`.
    ///
    /// A `limit` of zero disables limiting. At most `max_tracked` keys are
    /// kept (minimum one). `window` is clamped to [`MAX_WINDOW`].
    pub fn new(limit: u32, window: Duration, max_tracked: usize) -> Self {
        if window > MAX_WINDOW {
            tracing::warn!(
                "Rate-limit window of {}s is too large; using {}s",
                window.as_secs(),
                MAX_WINDOW.as_secs()
            );
        }
        Self {
            limit,
            window: window.min(MAX_WINDOW),
            max_tracked: max_tracked.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, RateLimiterEntry>> {
        // Counters stay consistent even if a holder panicked mid-update.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a create attempt for `client_key`.
    ///
    /// # Returns
    /// `true` when the attempt is admitted, `false` when the key has used its
    /// allowance for the current window.
    pub fn allow(&self, client_key: &str) -> bool {
        self.allow_at(client_key, Instant::now())
    }

    pub(crate) fn allow_at(&self, client_key: &str, now: Instant) -> bool {
        if self.limit == 0 {
            return true;
        }

        let mut entries = self.entries();
        if !entries.contains_key(client_key) && entries.len() >= self.max_tracked {
            Self::make_room(&mut entries, self.max_tracked, now);
        }

        let entry = entries
            .entry(client_key.to_string())
            .or_insert(RateLimiterEntry {
                count: 0,
                reset_at: None,
            });

        if entry.reset_at.is_some_and(|reset_at| now >= reset_at) {
            entry.count = 0;
            entry.reset_at = None;
        }

        if entry.count >= self.limit {
            return false;
        }

        entry.count += 1;
        if entry.reset_at.is_none() {
            entry.reset_at = Some(now + self.window);
        }
        true
    }

    fn make_room(entries: &mut HashMap<String, RateLimiterEntry>, max_tracked: usize, now: Instant) {
        entries.retain(|_, entry| !entry.is_expired(now));
        if entries.len() < max_tracked {
            return;
        }

        let oldest = entries
            .iter()
            .min_by_key(|(_, entry)| entry.reset_at)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            tracing::warn!(
                "Rate limiter tracking {} clients; evicting '{}'",
                entries.len(),
                key
            );
            entries.remove(&key);
        }
    }

    /// Drop every entry whose window has ended.
    ///
    /// Expired entries are equivalent to absent ones, so this only frees
    /// memory.
    ///
    /// # Returns
    /// Number of entries removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub(crate) fn sweep_at(&self, now: Instant) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Number of client keys currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.entries().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    const WINDOW: Duration = Duration::from_secs(60);

    #[test]
    fn request_past_the_limit_is_denied_within_window() {
        let limiter = RateLimiter::new(3, WINDOW, 100);
        let start = Instant::now();
        for i in 0..3 {
            assert!(limiter.allow_at("10.0.0.1", start + Duration::from_secs(i)));
        }
        assert!(!limiter.allow_at("10.0.0.1", start + Duration::from_secs(5)));
    }

    #[test]
    fn allowance_returns_after_window_elapses() {
        let limiter = RateLimiter::new(1, WINDOW, 100);
        let start = Instant::now();
        assert!(limiter.allow_at("10.0.0.1", start));
        assert!(!limiter.allow_at("10.0.0.1", start + WINDOW - Duration::from_millis(1)));
        assert!(limiter.allow_at("10.0.0.1", start + WINDOW));
    }

    #[test]
    fn later_requests_do_not_move_the_scheduled_reset() {
        let limiter = RateLimiter::new(2, WINDOW, 100);
        let start = Instant::now();
        assert!(limiter.allow_at("k", start));
        assert!(limiter.allow_at("k", start + Duration::from_secs(50)));
        assert!(!limiter.allow_at("k", start + Duration::from_secs(59)));
        // Reset was scheduled by the first request, not the second.
        assert!(limiter.allow_at("k", start + Duration::from_secs(60)));
    }

    #[test]
    fn fixed_window_admits_up_to_twice_the_limit_across_a_boundary() {
        let limiter = RateLimiter::new(2, WINDOW, 100);
        let start = Instant::now();
        assert!(limiter.allow_at("k", start));
        assert!(limiter.allow_at("k", start + Duration::from_secs(59)));
        assert!(limiter.allow_at("k", start + Duration::from_secs(60)));
        assert!(limiter.allow_at("k", start + Duration::from_secs(61)));
        assert!(!limiter.allow_at("k", start + Duration::from_secs(62)));
    }

    #[test]
    fn keys_are_counted_independently() {
        let limiter = RateLimiter::new(1, WINDOW, 100);
        let now = Instant::now();
        assert!(limiter.allow_at("a", now));
        assert!(limiter.allow_at("b", now));
        assert!(!limiter.allow_at("a", now));
    }

    #[test]
    fn zero_limit_disables_throttling() {
        let limiter = RateLimiter::new(0, WINDOW, 1);
        for _ in 0..100 {
            assert!(limiter.allow("anyone"));
        }
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn tracked_clients_are_bounded() {
        let limiter = RateLimiter::new(1, WINDOW, 2);
        let start = Instant::now();
        assert!(limiter.allow_at("a", start));
        assert!(limiter.allow_at("b", start + Duration::from_secs(1)));
        assert!(limiter.allow_at("c", start + Duration::from_secs(2)));
        assert_eq!(limiter.tracked_clients(), 2);
        // "a" had the earliest reset and was evicted; "b" is still limited.
        assert!(!limiter.allow_at("b", start + Duration::from_secs(3)));
    }

    #[test]
    fn full_map_prefers_dropping_expired_entries() {
        let limiter = RateLimiter::new(1, WINDOW, 2);
        let start = Instant::now();
        assert!(limiter.allow_at("old", start));
        assert!(limiter.allow_at("fresh", start + Duration::from_secs(30)));
        assert!(limiter.allow_at("new", start + Duration::from_secs(61)));
        assert!(!limiter.allow_at("fresh", start + Duration::from_secs(62)));
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn sweep_removes_only_expired_entries() {
        let limiter = RateLimiter::new(5, WINDOW, 100);
        let start = Instant::now();
        limiter.allow_at("early", start);
        limiter.allow_at("late", start + Duration::from_secs(30));
        assert_eq!(limiter.sweep_at(start + Duration::from_secs(61)), 1);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn oversized_window_is_clamped_instead_of_overflowing() {
        let config = crate::Config::from_lookup(|name| {
            (name == "RATE_WINDOW_SECS").then(|| u64::MAX.to_string())
        });
        assert_eq!(config.rate_window(), Duration::from_secs(u64::MAX));

        let limiter = RateLimiter::new(1, config.rate_window(), 100);
        let start = Instant::now();
        assert!(limiter.allow_at("203.0.113.1", start));
        assert!(!limiter.allow_at("203.0.113.1", start + Duration::from_secs(3600)));
        assert!(limiter.allow_at("203.0.113.1", start + MAX_WINDOW));
    }

    #[test]
    fn concurrent_requests_from_one_client_never_exceed_limit() {
        let limiter = Arc::new(RateLimiter::new(10, WINDOW, 100));
        let workers = 32;
        let barrier = Arc::new(Barrier::new(workers));
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let limiter = limiter.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    limiter.allow("203.0.113.9")
                })
            })
            .collect();
        let admitted = handles
            .into_iter()
            .map(|handle| handle.join().expect("worker join"))
            .filter(|allowed| *allowed)
            .count();
        assert_eq!(admitted, 10);
    }
}
