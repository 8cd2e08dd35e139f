use std::time::{Duration, Instant};

/// Token bucket guarding a single socket against command floods.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    tokens: u32,
    max_tokens: u32,
    refill_rate: Duration,
    last_refill: Instant,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::new_with_limits(30, Duration::from_secs(2))
    }

    pub fn new_with_limits(max_tokens: u32, refill_rate: Duration) -> Self {
        Self {
            tokens: max_tokens,
            max_tokens,
            refill_rate,
            last_refill: Instant::now(),
        }
    }

    pub async fn check_rate_limit(&mut self) -> bool {
        self.refill_tokens();

        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    fn refill_tokens(&mut self) {
        let now = Instant::now();
        let time_passed = now.duration_since(self.last_refill);

        if time_passed >= self.refill_rate {
            let tokens_to_add = (time_passed.as_secs() / self.refill_rate.as_secs()) as u32;
            self.tokens = (self.tokens + tokens_to_add).min(self.max_tokens);
            self.last_refill = now;
        }
    }

    pub fn get_remaining_tokens(&mut self) -> u32 {
        self.refill_tokens();
        self.tokens
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bucket_drains_and_blocks() {
        let mut limiter = RateLimiter::new_with_limits(3, Duration::from_secs(60));

        assert!(limiter.check_rate_limit().await);
        assert!(limiter.check_rate_limit().await);
        assert!(limiter.check_rate_limit().await);
        assert!(!limiter.check_rate_limit().await);
        assert_eq!(limiter.get_remaining_tokens(), 0);
    }
}
