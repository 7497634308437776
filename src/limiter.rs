//! Request pacing with a sliding window and multiplicative backoff.
//!
//! A [`RateLimiter`] enforces a per-minute request budget and an adaptive
//! inter-request delay. [`RateLimiter::wait`] delays the caller until the
//! next request is safe to issue; it never fails. After an engine signals
//! "too many requests", [`RateLimiter::backoff`] grows the delay
//! multiplicatively up to a configured ceiling; the delay falls back to its
//! floor when a fresh window opens.
//!
//! One limiter paces one fetcher. State lives behind a single async mutex,
//! so a waiting caller never delays another limiter instance. The clock is
//! `tokio::time`, which keeps tests with a paused runtime deterministic.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Length of the request-counting window.
const WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct LimiterState {
    current_delay: Duration,
    last_request: Option<Instant>,
    request_count: u32,
    window_start: Instant,
}

/// Sliding-window rate limiter with multiplicative backoff.
#[derive(Debug)]
pub struct RateLimiter {
    requests_per_minute: u32,
    min_delay: Duration,
    max_delay: Duration,
    backoff_factor: f64,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    /// Create a limiter.
    ///
    /// `requests_per_minute` caps the window budget; `min_delay` is the
    /// floor of the adaptive inter-request delay, `max_delay` its ceiling,
    /// and `backoff_factor` the multiplier applied by [`backoff`].
    ///
    /// [`backoff`]: RateLimiter::backoff
    pub fn new(
        requests_per_minute: u32,
        min_delay: Duration,
        max_delay: Duration,
        backoff_factor: f64,
    ) -> Self {
        Self {
            requests_per_minute,
            min_delay,
            max_delay,
            backoff_factor,
            state: Mutex::new(LimiterState {
                current_delay: min_delay,
                last_request: None,
                request_count: 0,
                window_start: Instant::now(),
            }),
        }
    }

    /// Delay the caller until the next request is safe, then record it.
    ///
    /// A fresh window resets the request count and restores the delay
    /// floor. An exhausted window budget sleeps out the window remainder.
    /// The adaptive delay is then enforced against the previous request.
    pub async fn wait(&self) {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        if now.duration_since(state.window_start) >= WINDOW {
            state.window_start = now;
            state.request_count = 0;
            state.current_delay = self.min_delay;
        }

        if state.request_count >= self.requests_per_minute {
            let elapsed = now.duration_since(state.window_start);
            if elapsed < WINDOW {
                sleep(WINDOW - elapsed).await;
            }
            state.window_start = Instant::now();
            state.request_count = 0;
        }

        if let Some(last) = state.last_request {
            let since_last = last.elapsed();
            if since_last < state.current_delay {
                sleep(state.current_delay - since_last).await;
            }
        }

        state.last_request = Some(Instant::now());
        state.request_count += 1;
    }

    /// Grow the inter-request delay after a too-many-requests signal.
    ///
    /// Multiplies the current delay by the backoff factor, capped at the
    /// configured maximum.
    pub async fn backoff(&self) {
        let mut state = self.state.lock().await;
        let grown = state.current_delay.mul_f64(self.backoff_factor);
        state.current_delay = grown.min(self.max_delay);
    }

    /// Restore the limiter to its initial state.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.current_delay = self.min_delay;
        state.last_request = None;
        state.request_count = 0;
        state.window_start = Instant::now();
    }

    /// The adaptive delay currently enforced between requests.
    pub async fn current_delay(&self) -> Duration {
        self.state.lock().await.current_delay
    }

    /// Requests still available in the current window.
    pub async fn remaining_requests(&self) -> u32 {
        let state = self.state.lock().await;
        if state.window_start.elapsed() >= WINDOW {
            return self.requests_per_minute;
        }
        self.requests_per_minute.saturating_sub(state.request_count)
    }
}

impl Default for RateLimiter {
    /// 10 requests per minute, 1 s delay floor, 60 s ceiling, doubling backoff.
    fn default() -> Self {
        Self::new(
            10,
            Duration::from_secs(1),
            Duration::from_secs(60),
            2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_limiter(rpm: u32) -> RateLimiter {
        RateLimiter::new(rpm, Duration::ZERO, Duration::from_secs(8), 2.0)
    }

    #[tokio::test(start_paused = true)]
    async fn within_budget_does_not_block() {
        let limiter = fast_limiter(5);
        let start = Instant::now();
        for _ in 0..5 {
            limiter.wait().await;
        }
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(limiter.remaining_requests().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_window_blocks_until_rollover() {
        let limiter = fast_limiter(3);
        for _ in 0..3 {
            limiter.wait().await;
        }
        let start = Instant::now();
        limiter.wait().await;
        // The fourth call must have slept out the window remainder.
        assert!(start.elapsed() >= Duration::from_secs(59));
        assert_eq!(limiter.remaining_requests().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn adaptive_delay_enforced_between_requests() {
        let limiter = RateLimiter::new(100, Duration::from_secs(2), Duration::from_secs(60), 2.0);
        limiter.wait().await;
        let start = Instant::now();
        limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn backoff_grows_delay_multiplicatively() {
        let limiter = fast_limiter(10);
        let before = limiter.current_delay().await;
        limiter.backoff().await;
        let after = limiter.current_delay().await;
        assert!(after > before || before == Duration::ZERO);

        let limiter =
            RateLimiter::new(10, Duration::from_secs(1), Duration::from_secs(60), 2.0);
        limiter.backoff().await;
        assert_eq!(limiter.current_delay().await, Duration::from_secs(2));
        limiter.backoff().await;
        assert_eq!(limiter.current_delay().await, Duration::from_secs(4));
    }

    #[tokio::test]
    async fn backoff_caps_at_max_delay() {
        let limiter = RateLimiter::new(10, Duration::from_secs(1), Duration::from_secs(5), 10.0);
        limiter.backoff().await;
        assert_eq!(limiter.current_delay().await, Duration::from_secs(5));
        limiter.backoff().await;
        assert_eq!(limiter.current_delay().await, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_window_restores_delay_floor() {
        let limiter = RateLimiter::new(10, Duration::from_secs(1), Duration::from_secs(60), 2.0);
        limiter.backoff().await;
        assert_eq!(limiter.current_delay().await, Duration::from_secs(2));

        // Roll past the window; the next wait resets the delay.
        sleep(Duration::from_secs(61)).await;
        limiter.wait().await;
        assert_eq!(limiter.current_delay().await, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn reset_restores_initial_state() {
        let limiter = RateLimiter::new(2, Duration::from_secs(1), Duration::from_secs(60), 2.0);
        limiter.backoff().await;
        limiter.reset().await;
        assert_eq!(limiter.current_delay().await, Duration::from_secs(1));
        assert_eq!(limiter.remaining_requests().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn remaining_requests_counts_down() {
        let limiter = fast_limiter(4);
        assert_eq!(limiter.remaining_requests().await, 4);
        limiter.wait().await;
        limiter.wait().await;
        assert_eq!(limiter.remaining_requests().await, 2);
    }

    #[tokio::test]
    async fn default_limiter_is_ten_per_minute() {
        let limiter = RateLimiter::default();
        assert_eq!(limiter.remaining_requests().await, 10);
        assert_eq!(limiter.current_delay().await, Duration::from_secs(1));
    }
}
