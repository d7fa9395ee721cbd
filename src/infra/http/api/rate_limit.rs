use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Sliding-window request limiter shared across the JSON endpoints.
/// Buckets are keyed by caller and route so one hot path cannot starve
/// the rest of the API for that caller.
#[derive(Debug, Clone)]
pub struct ApiRateLimiter {
    window: Duration,
    max_requests: u32,
    buckets: Arc<DashMap<String, Vec<Instant>>>,
}

impl ApiRateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            buckets: Arc::new(DashMap::new()),
        }
    }

    /// Records one request and reports whether it fit in the window,
    /// together with how many more would.
    pub fn allow(&self, key: &str, route: &str) -> (bool, u32) {
        let bucket_key = format!("{key}:{route}");
        let now = Instant::now();
        let window = self.window;

        let mut entry = self.buckets.entry(bucket_key).or_default();
        entry.retain(|instant| now.duration_since(*instant) < window);

        let remaining = self.max_requests.saturating_sub(entry.len() as u32);
        if remaining == 0 {
            return (false, 0);
        }

        entry.push(now);
        // after push, one fewer slot remains
        (true, remaining.saturating_sub(1))
    }

    pub fn retry_after_secs(&self) -> u64 {
        self.window.as_secs().max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_and_then_refuses() {
        let limiter = ApiRateLimiter::new(Duration::from_secs(60), 3);

        assert_eq!(limiter.allow("10.0.0.1", "/api/search"), (true, 2));
        assert_eq!(limiter.allow("10.0.0.1", "/api/search"), (true, 1));
        assert_eq!(limiter.allow("10.0.0.1", "/api/search"), (true, 0));
        assert_eq!(limiter.allow("10.0.0.1", "/api/search"), (false, 0));
    }

    #[test]
    fn buckets_are_per_caller_and_route() {
        let limiter = ApiRateLimiter::new(Duration::from_secs(60), 1);

        assert_eq!(limiter.allow("10.0.0.1", "/api/search"), (true, 0));
        assert_eq!(limiter.allow("10.0.0.1", "/api/stats"), (true, 0));
        assert_eq!(limiter.allow("10.0.0.2", "/api/search"), (true, 0));
        assert_eq!(limiter.allow("10.0.0.1", "/api/search"), (false, 0));
    }

    #[test]
    fn window_expiry_frees_slots() {
        let limiter = ApiRateLimiter::new(Duration::from_millis(10), 1);

        assert_eq!(limiter.allow("10.0.0.1", "/api/featured"), (true, 0));
        assert_eq!(limiter.allow("10.0.0.1", "/api/featured"), (false, 0));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(limiter.allow("10.0.0.1", "/api/featured"), (true, 0));
    }
}
