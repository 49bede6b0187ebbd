use std::cell::Cell;
use std::thread;
use std::time::{Duration, Instant};

/// Enforces a minimum gap between consecutive requests of one client
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    last: Cell<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last: Cell::new(None),
        }
    }

    /// Block until at least `delay` has passed since the previous call
    pub fn wait(&self) {
        if let Some(last) = self.last.get() {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                thread::sleep(self.delay - elapsed);
            }
        }
        self.last.set(Some(Instant::now()));
    }
}
