//! Per-user sliding-window rate limiting for chat messages (§3, rate-limit entry).
//!
//! A single mutex covers the whole table — the entry count is small (one per
//! active chatter) and the window check itself is O(window size), so finer
//! locking would not pay for its complexity.

use std::collections::HashMap;
use std::env;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Configurable rate limit values, read from environment variables with
/// sensible defaults.
///
/// - `RATE_LIMIT_MESSAGES` — max chat messages per window per user (default: 5)
/// - `RATE_LIMIT_WINDOW_MS` — sliding window length in milliseconds (default: 10000)
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub messages_max: usize,
    pub messages_window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            messages_max: 5,
            messages_window: Duration::from_millis(10_000),
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = env::var("RATE_LIMIT_MESSAGES")
            && let Ok(n) = val.parse::<usize>()
        {
            config.messages_max = n;
        }
        if let Ok(val) = env::var("RATE_LIMIT_WINDOW_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            config.messages_window = Duration::from_millis(ms);
        }

        config
    }
}

/// Sliding-window counter keyed by `userId`.
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Vec<Instant>>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        RateLimiter {
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true if `user_id` is allowed to send another message right
    /// now, and records the attempt either way the entry is retained for the
    /// window so a rejected attempt doesn't reset the clock.
    pub fn check(&self, user_id: &str, config: &RateLimitConfig) -> bool {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let entries = windows.entry(user_id.to_string()).or_default();
        entries.retain(|t| now.duration_since(*t) < config.messages_window);

        if entries.len() >= config.messages_max {
            return false;
        }

        entries.push(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_configured_max_then_rejects() {
        let limiter = RateLimiter::new();
        let config = RateLimitConfig {
            messages_max: 5,
            messages_window: Duration::from_secs(10),
        };

        for _ in 0..5 {
            assert!(limiter.check("u1", &config));
        }
        assert!(!limiter.check("u1", &config));
    }

    #[test]
    fn limits_are_independent_per_user() {
        let limiter = RateLimiter::new();
        let config = RateLimitConfig {
            messages_max: 1,
            messages_window: Duration::from_secs(10),
        };

        assert!(limiter.check("u1", &config));
        assert!(limiter.check("u2", &config));
        assert!(!limiter.check("u1", &config));
    }

    #[test]
    fn window_expiry_frees_capacity() {
        let limiter = RateLimiter::new();
        let config = RateLimitConfig {
            messages_max: 1,
            messages_window: Duration::from_millis(20),
        };

        assert!(limiter.check("u1", &config));
        assert!(!limiter.check("u1", &config));
        std::thread::sleep(Duration::from_millis(30));
        assert!(limiter.check("u1", &config));
    }
}
