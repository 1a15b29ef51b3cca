//! Fixed-window rate limiter for mutating API calls, keyed by caller.

use crate::config::RateLimitConfig;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

struct CallerWindow {
    count: u32,
    window_start: Instant,
}

#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<DashMap<String, CallerWindow>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_secs),
        }
    }

    /// Counts one request. Returns `true` if it is allowed, `false` if rate-limited.
    pub fn check(&self, caller: &str) -> bool {
        let now = Instant::now();
        let mut entry = self
            .windows
            .entry(caller.to_owned())
            .or_insert_with(|| CallerWindow {
                count: 0,
                window_start: now,
            });

        // Reset window if expired
        if now.duration_since(entry.window_start) >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        entry.count <= self.max_requests
    }

    /// Seconds until `caller` may try again. Zero if not currently limited.
    pub fn retry_after(&self, caller: &str) -> u64 {
        let Some(entry) = self.windows.get(caller) else {
            return 0;
        };
        if entry.count <= self.max_requests {
            return 0;
        }
        let elapsed = Instant::now().duration_since(entry.window_start);
        self.window.saturating_sub(elapsed).as_secs().max(1)
    }

    /// Drops windows that have expired.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.windows
            .retain(|_, entry| now.duration_since(entry.window_start) < self.window);
    }

    /// Runs [`cleanup`](Self::cleanup) once per window until `token` is cancelled.
    pub fn spawn_cleanup(&self, token: CancellationToken) -> JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(limiter.window);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => limiter.cleanup(),
                }
            }
            debug!("Rate limiter cleanup stopped");
        })
    }

    pub fn tracked_callers(&self) -> usize {
        self.windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            max_requests,
            window_secs,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_limit_resets_with_window() {
        let limiter = limiter(2, 60);
        assert!(limiter.check("owner-1"));
        assert!(limiter.check("owner-1"));
        assert!(!limiter.check("owner-1"));
        assert!(limiter.retry_after("owner-1") > 0);

        // Other callers are unaffected.
        assert!(limiter.check("owner-2"));

        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(limiter.check("owner-1"));
        assert_eq!(limiter.retry_after("owner-1"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_drops_expired_windows() {
        let limiter = limiter(5, 10);
        limiter.check("a");
        tokio::time::advance(Duration::from_secs(11)).await;
        limiter.check("b");

        limiter.cleanup();
        assert_eq!(limiter.windows.len(), 1);
        assert!(limiter.windows.contains_key("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_cleanup_forgets_idle_callers() {
        let limiter = limiter(5, 10);
        let token = CancellationToken::new();
        let cleanup = limiter.spawn_cleanup(token.clone());

        for i in 0..500 {
            limiter.check(&format!("caller-{}", i));
        }
        assert_eq!(limiter.tracked_callers(), 500);

        // Two windows later every caller has been idle longer than a window.
        tokio::time::sleep(Duration::from_secs(21)).await;
        assert_eq!(limiter.tracked_callers(), 0);

        token.cancel();
        cleanup.await.unwrap();
    }
}
