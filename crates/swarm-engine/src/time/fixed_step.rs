use std::time::Duration;

use super::Timer;

/// Fixed-step simulation driver.
///
/// Measured frame time is accumulated and drained in whole `step`s. Leftover
/// time below one step carries over to the next frame, so the number of steps
/// taken only depends on the total elapsed time, not on how it was split
/// across frames.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FixedTimestep {
    timer: Timer,
}

impl FixedTimestep {
    /// `step` must be non-zero.
    pub fn new(step: Duration) -> Self {
        debug_assert!(!step.is_zero(), "fixed step must be non-zero");
        Self {
            timer: Timer::new(step),
        }
    }

    #[inline]
    pub fn step(&self) -> Duration {
        self.timer.interval()
    }

    /// Total steps drained so far.
    #[inline]
    pub fn steps(&self) -> u64 {
        self.timer.cycles()
    }

    /// Accumulated time not yet drained.
    #[inline]
    pub fn leftover(&self) -> Duration {
        self.timer.accumulator()
    }

    /// Fraction of a step sitting in the accumulator, in `[0, 1)` after draining.
    ///
    /// Renderers can use this to interpolate between the last two simulation states.
    #[inline]
    pub fn alpha(&self) -> f64 {
        self.timer.accumulator().as_secs_f64() / self.timer.interval().as_secs_f64()
    }

    #[inline]
    pub fn accumulate(&mut self, frame_time: Duration) {
        self.timer.accumulate(frame_time);
    }

    /// Drains one step if a whole step is available.
    #[inline]
    pub fn next_step(&mut self) -> bool {
        self.timer.consume()
    }

    /// Runs `step_fn` once per whole step available and returns how many ran.
    pub fn drain(&mut self, mut step_fn: impl FnMut(Duration)) -> u32 {
        let step = self.step();
        let mut ran = 0;
        while self.next_step() {
            step_fn(step);
            ran += 1;
        }
        ran
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn run(step: Duration, frames: &[Duration]) -> (u64, Duration) {
        let mut fixed = FixedTimestep::new(step);
        let mut ticks = 0u64;
        for &frame in frames {
            fixed.accumulate(frame);
            fixed.drain(|dt| {
                assert_eq!(dt, step);
                ticks += 1;
            });
        }
        assert_eq!(ticks, fixed.steps());
        (ticks, fixed.leftover())
    }

    #[test]
    fn step_count_is_independent_of_frame_split() {
        let step = ms(10);

        let coarse = [ms(95)];
        let fine = [ms(3); 31].into_iter().chain([ms(2)]).collect::<Vec<_>>();
        let uneven = [ms(1), ms(44), ms(0), ms(17), ms(33)];

        assert_eq!(run(step, &coarse), (9, ms(5)));
        assert_eq!(run(step, &fine), (9, ms(5)));
        assert_eq!(run(step, &uneven), (9, ms(5)));
    }

    #[test]
    fn slow_frame_runs_several_steps() {
        let mut fixed = FixedTimestep::new(ms(10));
        fixed.accumulate(ms(35));
        assert_eq!(fixed.drain(|_| {}), 3);
        assert_eq!(fixed.leftover(), ms(5));
    }

    #[test]
    fn fast_frame_runs_no_step() {
        let mut fixed = FixedTimestep::new(ms(10));
        fixed.accumulate(ms(4));
        assert_eq!(fixed.drain(|_| {}), 0);
        assert_eq!(fixed.leftover(), ms(4));
    }

    #[test]
    fn alpha_is_leftover_fraction() {
        let mut fixed = FixedTimestep::new(ms(10));
        fixed.accumulate(ms(25));
        fixed.drain(|_| {});
        assert!((fixed.alpha() - 0.5).abs() < 1e-9);
    }
}
