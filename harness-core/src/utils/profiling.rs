use std::time::Duration;

use memory_stats::memory_stats;

/// Reported durations never drop below this floor.
pub const MIN_REPORTED_DURATION: Duration = Duration::from_millis(1);

pub fn clamp_duration(elapsed: Duration) -> Duration {
    elapsed.max(MIN_REPORTED_DURATION)
}

/// Mean of `total` over `iterations` runs, in whole nanoseconds.
pub fn mean_duration(total: Duration, iterations: usize) -> Duration {
    let mean = total.as_nanos() / iterations.max(1) as u128;
    Duration::from_nanos(u64::try_from(mean).unwrap_or(u64::MAX))
}

/// Running maximum of the process' resident memory.
///
/// Sampling is best effort: platforms without a reading leave the peak unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryTracker {
    peak: u64,
}

impl MemoryTracker {
    pub fn new() -> Self {
        let mut tracker = Self::default();
        tracker.sample();
        tracker
    }

    /// Takes a reading and returns the peak observed so far, in bytes.
    pub fn sample(&mut self) -> u64 {
        if let Some(usage) = memory_stats() {
            self.peak = self.peak.max(usage.physical_mem as u64);
        } else {
            tracing::debug!("memory usage is unavailable on this platform");
        }
        self.peak
    }

    pub fn peak(&self) -> u64 {
        self.peak
    }
}

pub fn bytes_to_mb(bytes: u64) -> u64 {
    bytes / (1024 * 1024)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_durations_are_clamped() {
        assert_eq!(clamp_duration(Duration::ZERO), MIN_REPORTED_DURATION);
        assert_eq!(
            clamp_duration(Duration::from_micros(999)),
            MIN_REPORTED_DURATION
        );
        assert_eq!(
            clamp_duration(Duration::from_millis(7)),
            Duration::from_millis(7)
        );
    }

    #[test]
    fn mean_handles_counts_beyond_u32() {
        let total = Duration::from_secs(1 << 33);
        assert_eq!(mean_duration(total, 1 << 33), Duration::from_secs(1));
        assert_eq!(mean_duration(total, (1 << 32) + 1).as_secs(), 1);
        assert_eq!(
            mean_duration(Duration::from_millis(10), 4),
            Duration::from_micros(2500)
        );
        assert_eq!(mean_duration(Duration::from_millis(3), 0), Duration::from_millis(3));
    }

    #[test]
    fn peak_never_decreases() {
        let mut tracker = MemoryTracker::new();
        let first = tracker.sample();
        let ballast = vec![1u8; 8 << 20];
        let second = tracker.sample();
        drop(ballast);
        let third = tracker.sample();
        assert!(second >= first);
        assert!(third >= second);
        assert_eq!(tracker.peak(), third);
    }
}
