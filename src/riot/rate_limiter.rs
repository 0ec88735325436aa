//! Token bucket shared by every caller of the Riot API.
//!
//! The bucket is reset to full capacity once the refill window has elapsed
//! since the previous reset. There is no gradual refill: a window either
//! grants `max_tokens` permits or blocks.

use std::num::NonZeroU32;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

#[derive(Debug)]
struct Bucket {
    tokens: u32,
    last_refill: Instant,
}

#[derive(Debug)]
pub struct RateLimiter {
    max_tokens: u32,
    refill_window: Duration,
    bucket: Mutex<Bucket>,
    refilled: Condvar,
}

impl RateLimiter {
    pub fn new(max_tokens: NonZeroU32, refill_window: Duration) -> Self {
        Self {
            max_tokens: max_tokens.get(),
            refill_window,
            bucket: Mutex::new(Bucket {
                tokens: max_tokens.get(),
                last_refill: Instant::now(),
            }),
            refilled: Condvar::new(),
        }
    }

    /// Block the calling thread until a permit is available and take it.
    pub fn acquire(&self) {
        let mut bucket = self.lock();

        loop {
            self.refill(&mut bucket);

            if bucket.tokens > 0 {
                bucket.tokens -= 1;
                return;
            }

            let wait = self
                .refill_window
                .saturating_sub(bucket.last_refill.elapsed());
            debug!(wait_ms = wait.as_millis() as u64, "🛰️ Throttling Riot API request");

            bucket = self
                .refilled
                .wait_timeout(bucket, wait)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|poisoned| poisoned.into_inner().0);
        }
    }

    /// Permits left in the current window.
    pub fn available(&self) -> u32 {
        let mut bucket = self.lock();
        self.refill(&mut bucket);
        bucket.tokens
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    fn refill(&self, bucket: &mut Bucket) {
        if bucket.last_refill.elapsed() >= self.refill_window {
            bucket.tokens = self.max_tokens;
            bucket.last_refill = Instant::now();
            self.refilled.notify_all();
        }
    }

    fn lock(&self) -> MutexGuard<'_, Bucket> {
        self.bucket.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
