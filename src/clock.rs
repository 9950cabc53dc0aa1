use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Issues request timestamps in milliseconds since the Unix epoch.
///
/// Every value handed out by one clock is strictly greater than the previous
/// one. When two requests arrive within the same millisecond, or the wall
/// clock steps backwards, the later request gets `last + 1`.
#[derive(Debug, Default)]
pub struct RequestClock {
    last: AtomicU64,
}

impl RequestClock {
    /// Creates a clock that has not issued any timestamp yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next request timestamp.
    pub fn next_ms(&self) -> u64 {
        let now = wall_clock_ms();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(observed) => last = observed,
            }
        }
    }
}

fn wall_clock_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
