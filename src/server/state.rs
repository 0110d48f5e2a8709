//! Server state and rate limiting.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::driver::SessionDriver;
use crate::transport::WsConnector;

/// Application state shared across handlers
pub struct AppState {
    /// Resolved configuration
    pub config: Config,
    /// Session driver for the generation service
    pub driver: SessionDriver,
    /// Per-client limiter for generation requests
    pub limiter: RateLimiter,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(config: Config) -> Self {
        let connector = WsConnector::new().with_connect_timeout(config.service.connect_timeout());
        let driver = SessionDriver::new(config.service.endpoint.clone())
            .with_deadline(config.service.deadline())
            .with_connector(Arc::new(connector));

        Self::with_driver(config, driver)
    }

    /// Create state around an existing driver
    pub fn with_driver(config: Config, driver: SessionDriver) -> Self {
        let limiter = RateLimiter::new(
            config.server.rate_limit_max,
            config.server.rate_limit_window(),
        );

        Self {
            config,
            driver,
            limiter,
            start_time: Instant::now(),
        }
    }

    /// Drop expired rate-limit windows once per window until aborted
    pub fn spawn_limiter_cleanup(self: &Arc<Self>) -> JoinHandle<()> {
        let state = Arc::clone(self);
        let period = state
            .config
            .server
            .rate_limit_window()
            .max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = state.limiter.cleanup().await;
                if removed > 0 {
                    tracing::debug!(removed, "Pruned expired rate limit windows");
                }
            }
        })
    }

    /// Get server uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Request admitted
    Allowed {
        /// Requests left in the current window
        remaining: u32,
    },
    /// Request rejected
    Limited {
        /// Time until the window resets
        retry_after: Duration,
    },
}

/// Fixed-window request limiter keyed by client address
pub struct RateLimiter {
    /// Active windows by client
    windows: Arc<RwLock<HashMap<IpAddr, Window>>>,
    /// Requests allowed per window
    max: u32,
    /// Window length
    window: Duration,
}

/// Window entry with metadata
struct Window {
    /// Window start
    started: Instant,
    /// Requests admitted in this window
    count: u32,
}

impl RateLimiter {
    /// Create a limiter allowing `max` requests per `window`
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
            max,
            window,
        }
    }

    /// Record a request from `client` and decide whether to admit it
    pub async fn check(&self, client: IpAddr) -> RateDecision {
        let mut windows = self.windows.write().await;
        let now = Instant::now();

        let entry = windows.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count >= self.max {
            let retry_after = self.window.saturating_sub(now.duration_since(entry.started));
            return RateDecision::Limited { retry_after };
        }

        entry.count += 1;
        RateDecision::Allowed {
            remaining: self.max - entry.count,
        }
    }

    /// Get number of tracked clients
    pub async fn count(&self) -> usize {
        self.windows.read().await.len()
    }

    /// Drop windows that have expired
    pub async fn cleanup(&self) -> usize {
        let mut windows = self.windows.write().await;
        let before = windows.len();

        windows.retain(|_, entry| entry.started.elapsed() < self.window);

        before - windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([10, 0, 0, last])
    }

    #[tokio::test]
    async fn test_limit_per_client() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));

        assert_eq!(
            limiter.check(ip(1)).await,
            RateDecision::Allowed { remaining: 1 }
        );
        assert_eq!(
            limiter.check(ip(1)).await,
            RateDecision::Allowed { remaining: 0 }
        );
        assert!(matches!(
            limiter.check(ip(1)).await,
            RateDecision::Limited { .. }
        ));

        // Other clients are unaffected
        assert_eq!(
            limiter.check(ip(2)).await,
            RateDecision::Allowed { remaining: 1 }
        );
        assert_eq!(limiter.count().await, 2);
    }

    #[tokio::test]
    async fn test_window_resets() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20));

        assert!(matches!(
            limiter.check(ip(1)).await,
            RateDecision::Allowed { .. }
        ));
        assert!(matches!(
            limiter.check(ip(1)).await,
            RateDecision::Limited { .. }
        ));

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(matches!(
            limiter.check(ip(1)).await,
            RateDecision::Allowed { .. }
        ));
    }

    #[tokio::test]
    async fn test_cleanup() {
        let limiter = RateLimiter::new(5, Duration::from_millis(10));
        limiter.check(ip(1)).await;
        limiter.check(ip(2)).await;

        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(limiter.cleanup().await, 2);
        assert_eq!(limiter.count().await, 0);
    }

    #[tokio::test]
    async fn test_background_cleanup_prunes_windows() {
        let mut config = Config::default();
        config.server.rate_limit_window_secs = 1;
        let state = Arc::new(AppState::new(config));

        state.limiter.check(ip(1)).await;
        state.limiter.check(ip(2)).await;
        assert_eq!(state.limiter.count().await, 2);

        let task = state.spawn_limiter_cleanup();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        task.abort();

        assert_eq!(state.limiter.count().await, 0);
    }

    #[test]
    fn test_state_uses_configured_deadline() {
        let mut config = Config::default();
        config.service.deadline_secs = 42;
        config.service.endpoint = "ws://127.0.0.1:1".to_string();

        let state = AppState::new(config);
        assert_eq!(state.driver.deadline(), Duration::from_secs(42));
        assert_eq!(state.driver.endpoint(), "ws://127.0.0.1:1");
    }
}
