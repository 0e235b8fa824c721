use std::time::Instant;

/// Millisecond counter since boot.
///
/// The value is deliberately truncated to `u32` so it behaves like a 32-bit
/// hardware tick counter and wraps after roughly 49.7 days. Consumers must
/// compare timestamps with `wrapping_sub`.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> u32 {
        // truncation is the wraparound
        self.origin.elapsed().as_millis() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::MonotonicClock;

    #[test]
    fn test_now_ms_is_monotonic() {
        let clock = MonotonicClock::start();
        let a = clock.now_ms();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let b = clock.now_ms();
        assert!(b.wrapping_sub(a) >= 5);
    }
}
