use std::time::Duration;

/// Interval accumulator.
///
/// Elapsed time is added with [`accumulate`](Self::accumulate) and drained one
/// interval at a time with [`consume`](Self::consume). Leftover time below one
/// interval is kept.
///
/// A zero interval is a caller error: `ready()` would then always hold.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Timer {
    interval: Duration,
    accumulator: Duration,
    cycles: u64,
}

impl Timer {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            accumulator: Duration::ZERO,
            cycles: 0,
        }
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time accumulated and not yet drained.
    #[inline]
    pub fn accumulator(&self) -> Duration {
        self.accumulator
    }

    /// Intervals drained so far.
    #[inline]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// At least one whole interval has accumulated.
    #[inline]
    pub fn ready(&self) -> bool {
        self.accumulator >= self.interval
    }

    /// Time left until the next interval completes; zero when already ready.
    #[inline]
    pub fn remaining(&self) -> Duration {
        self.interval.saturating_sub(self.accumulator)
    }

    #[inline]
    pub fn accumulate(&mut self, delta: Duration) {
        self.accumulator += delta;
    }

    /// Drops all accumulated time. The cycle count is kept.
    #[inline]
    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
    }

    /// Drains one interval if ready. Returns whether an interval was drained.
    #[inline]
    pub fn consume(&mut self) -> bool {
        if !self.ready() {
            return false;
        }
        self.accumulator -= self.interval;
        self.cycles += 1;
        true
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL)
    }
}
