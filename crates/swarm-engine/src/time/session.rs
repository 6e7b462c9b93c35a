use std::fmt;
use std::time::{Duration, Instant};

use super::Timer;

/// Periodic frames-per-second sampler.
///
/// Frames are counted as they are rendered. Once the measurement interval has
/// elapsed (as reported by the accumulated frame times), the rate is computed
/// against the real time since the previous measurement.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    measurement_start: Instant,
    frames: u32,
    last_measurement: f64,
    timer: Timer,
}

impl FpsCounter {
    pub const MEASUREMENT_INTERVAL: Duration = Duration::from_millis(300);

    pub fn starting_at(start: Instant, interval: Duration) -> Self {
        Self {
            measurement_start: start,
            frames: 0,
            last_measurement: 0.0,
            timer: Timer::new(interval),
        }
    }

    /// Most recent rate; zero until the first interval completes.
    #[inline]
    pub fn last_measurement(&self) -> f64 {
        self.last_measurement
    }

    /// Frames counted in the current measurement window.
    #[inline]
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Measurement intervals elapsed so far.
    #[inline]
    pub fn cycles(&self) -> u64 {
        self.timer.cycles()
    }

    /// Counts one rendered frame. Returns the new rate when a measurement was taken.
    pub fn record_frame_at(&mut self, frame_time: Duration, now: Instant) -> Option<f64> {
        self.frames += 1;
        self.timer.accumulate(frame_time);
        if !self.timer.ready() {
            return None;
        }

        let elapsed = now
            .saturating_duration_since(self.measurement_start)
            .as_secs_f64();
        if elapsed > 0.0 {
            self.last_measurement = f64::from(self.frames) / elapsed;
        }

        self.measurement_start = now;
        self.frames = 0;
        while self.timer.consume() {}

        Some(self.last_measurement)
    }
}

/// Run statistics for one execution of the main loop.
#[derive(Debug, Clone)]
pub struct Session {
    frames: u64,
    ticks: u64,
    start: Instant,
    fps: FpsCounter,
}

impl Session {
    pub fn new() -> Self {
        Self::starting_at(Instant::now(), FpsCounter::MEASUREMENT_INTERVAL)
    }

    pub fn with_fps_interval(interval: Duration) -> Self {
        Self::starting_at(Instant::now(), interval)
    }

    pub fn starting_at(start: Instant, fps_interval: Duration) -> Self {
        Self {
            frames: 0,
            ticks: 0,
            start,
            fps: FpsCounter::starting_at(start, fps_interval),
        }
    }

    /// Rendered frames.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Simulation steps.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[inline]
    pub fn fps(&self) -> &FpsCounter {
        &self.fps
    }

    pub fn running_time(&self) -> Duration {
        self.running_time_at(Instant::now())
    }

    pub fn running_time_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.start)
    }

    /// Records one simulation step.
    #[inline]
    pub fn update(&mut self, _step: Duration) {
        self.ticks += 1;
    }

    /// Records one rendered frame that took `frame_time` of wall-clock time.
    pub fn render(&mut self, frame_time: Duration) {
        self.render_at(frame_time, Instant::now());
    }

    pub fn render_at(&mut self, frame_time: Duration, now: Instant) {
        self.frames += 1;
        self.fps.record_frame_at(frame_time, now);
    }

    pub fn summary(&self) -> SessionSummary {
        self.summary_at(Instant::now())
    }

    pub fn summary_at(&self, now: Instant) -> SessionSummary {
        SessionSummary {
            elapsed: self.running_time_at(now),
            frames: self.frames,
            ticks: self.ticks,
        }
    }

    /// Logs the aggregate statistics at info level.
    pub fn log_summary(&self) {
        let summary = self.summary();
        log::info!("session info:");
        log::info!("  elapsed time: {}", summary.elapsed_hms());
        log::info!("  total frames: {}", summary.frames);
        log::info!("  total ticks:  {}", summary.ticks);
        log::info!("  average fps:  {:.2}", summary.average_fps());
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of a session's totals.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SessionSummary {
    pub elapsed: Duration,
    pub frames: u64,
    pub ticks: u64,
}

impl SessionSummary {
    /// Frames per second over the whole session; zero when no time has elapsed.
    pub fn average_fps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 { self.frames as f64 / secs } else { 0.0 }
    }

    /// Elapsed time as `HH:MM:SS.ss`.
    pub fn elapsed_hms(&self) -> String {
        let total = self.elapsed.as_secs_f64();
        let hours = (total / 3600.0) as u64;
        let minutes = ((total - hours as f64 * 3600.0) / 60.0) as u64;
        let seconds = total - hours as f64 * 3600.0 - minutes as f64 * 60.0;
        format!("{hours:02}:{minutes:02}:{seconds:05.2}")
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} elapsed, {} frames, {} ticks, {:.2} fps average",
            self.elapsed_hms(),
            self.frames,
            self.ticks,
            self.average_fps()
        )
    }
}
