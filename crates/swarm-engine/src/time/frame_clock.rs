use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Wall-clock time elapsed since the previous tick.
    pub dt: Duration,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// Delta time is reported unclamped in both directions: consecutive ticks
/// always sum to the wall-clock time between the first baseline and the last
/// tick, so a fixed-step consumer neither loses nor gains simulation time.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Creates a clock whose baseline is `start`.
    pub fn starting_at(start: Instant) -> Self {
        Self {
            last: start,
            frame_index: 0,
        }
    }

    /// Resets the clock baseline.
    ///
    /// Time before the reset is never reported.
    pub fn reset(&mut self) {
        self.reset_at(Instant::now());
    }

    pub fn reset_at(&mut self, now: Instant) {
        self.last = now;
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Advances the clock to `now`.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now.saturating_duration_since(self.last);
        self.last = now;

        let ft = FrameTime {
            dt,
            now,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::FixedTimestep;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    /// Ticks a fresh clock at each cumulative offset and drains into a 10 ms step.
    fn steps_for(frames: &[Duration]) -> (u64, Duration) {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        let mut fixed = FixedTimestep::new(ms(10));

        let mut at = t0;
        for &frame in frames {
            at += frame;
            fixed.accumulate(clock.tick_at(at).dt);
            fixed.drain(|_| {});
        }
        (fixed.steps(), fixed.leftover())
    }

    #[test]
    fn tick_reports_elapsed_time() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);

        let a = clock.tick_at(t0 + ms(16));
        let b = clock.tick_at(t0 + ms(20));

        assert_eq!(a.dt, ms(16));
        assert_eq!(b.dt, ms(4));
        assert_eq!((a.frame_index, b.frame_index), (0, 1));
    }

    #[test]
    fn long_frames_are_reported_in_full() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        assert_eq!(clock.tick_at(t0 + Duration::from_secs(5)).dt, Duration::from_secs(5));
    }

    #[test]
    fn zero_length_frames_stay_zero() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        assert_eq!(clock.tick_at(t0).dt, Duration::ZERO);
    }

    #[test]
    fn step_count_does_not_depend_on_frame_split() {
        let one_long = steps_for(&[ms(1000)]);
        let four_short = steps_for(&[ms(250); 4]);
        let uneven = steps_for(&[ms(3), ms(997)]);

        assert_eq!(one_long, (100, Duration::ZERO));
        assert_eq!(one_long, four_short);
        assert_eq!(one_long, uneven);
    }

    #[test]
    fn reset_skips_time_before_it() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        clock.reset_at(t0 + ms(800));
        assert_eq!(clock.tick_at(t0 + ms(816)).dt, ms(16));
    }
}
