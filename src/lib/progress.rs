//! Progress logging at regular record intervals.

use log::info;

/// Logs a progress line every time the running count crosses a multiple of the interval.
///
/// ```
/// use fgtrim_lib::progress::ProgressTracker;
///
/// let mut tracker = ProgressTracker::new("Processed records").with_interval(100);
/// for _ in 0..250 {
///     tracker.log_if_needed(1); // logs at 100 and 200
/// }
/// tracker.log_final(); // logs "Processed records 250 (complete)"
/// assert_eq!(tracker.count(), 250);
/// ```
#[derive(Debug)]
pub struct ProgressTracker {
    interval: u64,
    message: String,
    count: u64,
}

impl ProgressTracker {
    /// Creates a tracker with a count of 0 and an interval of 1,000,000.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { interval: 1_000_000, message: message.into(), count: 0 }
    }

    /// Sets the logging interval (a zero interval is treated as 1).
    #[must_use]
    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval.max(1);
        self
    }

    /// Adds to the count, logging once per interval boundary crossed.
    ///
    /// Returns `true` if the count now sits exactly on an interval boundary.
    pub fn log_if_needed(&mut self, additional: u64) -> bool {
        let prev = self.count;
        self.count += additional;

        for i in (prev / self.interval + 1)..=(self.count / self.interval) {
            info!("{} {}", self.message, i * self.interval);
        }

        self.count > 0 && self.count.is_multiple_of(self.interval)
    }

    /// Logs the final count unless it was already logged as an interval boundary.
    pub fn log_final(&mut self) {
        if !self.log_if_needed(0) && self.count > 0 {
            info!("{} {} (complete)", self.message, self.count);
        }
    }

    /// Items counted so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }
}
