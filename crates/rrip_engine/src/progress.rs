use std::time::{Duration, Instant};

pub const MIN_PROGRESS_INTERVAL: Duration = Duration::from_millis(500);
pub const MIN_PROGRESS_BYTES: u64 = 10 * 1024;

/// Rate limits progress notifications: one is due only when both enough time
/// and enough bytes have passed since the previous one.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    min_interval: Duration,
    min_bytes: u64,
    last_emit: Option<Instant>,
    last_total: u64,
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::new(MIN_PROGRESS_INTERVAL, MIN_PROGRESS_BYTES)
    }
}

impl ProgressThrottle {
    pub fn new(min_interval: Duration, min_bytes: u64) -> Self {
        Self {
            min_interval,
            min_bytes,
            last_emit: None,
            last_total: 0,
        }
    }

    /// Record the running total; returns true when a notification is due.
    pub fn update(&mut self, total: u64) -> bool {
        self.update_at(total, Instant::now())
    }

    pub fn update_at(&mut self, total: u64, now: Instant) -> bool {
        if total.saturating_sub(self.last_total) <= self.min_bytes {
            return false;
        }
        let due = self
            .last_emit
            .map_or(true, |last| now.saturating_duration_since(last) > self.min_interval);
        if due {
            self.last_emit = Some(now);
            self.last_total = total;
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_large_write_is_reported() {
        let mut throttle = ProgressThrottle::default();
        assert!(!throttle.update_at(MIN_PROGRESS_BYTES, Instant::now()));
        assert!(throttle.update_at(MIN_PROGRESS_BYTES + 1, Instant::now()));
    }

    #[test]
    fn needs_both_time_and_bytes() {
        let start = Instant::now();
        let mut throttle = ProgressThrottle::new(Duration::from_millis(500), 100);
        assert!(throttle.update_at(200, start));

        // Enough bytes, too soon.
        assert!(!throttle.update_at(1_000, start + Duration::from_millis(100)));
        // Enough time, too few bytes since the last report.
        assert!(!throttle.update_at(250, start + Duration::from_secs(2)));
        // Both.
        assert!(throttle.update_at(1_000, start + Duration::from_secs(2)));
    }
}
