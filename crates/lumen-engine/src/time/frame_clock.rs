use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time since the previous tick, in seconds. Clamped.
    pub dt: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Time since the clock was created. Not clamped; this is what schedulers compare.
    pub elapsed: Duration,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Per-window frame clock.
///
/// Delta time is clamped so a stalled or minimized window does not hand a
/// huge `dt` to the next frame.
#[derive(Debug, Clone)]
pub struct FrameClock {
    origin: Instant,
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        let now = Instant::now();
        Self {
            origin: now,
            last: now,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Resets the delta baseline. `elapsed` keeps counting from creation.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Time since creation, without advancing the clock.
    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    /// Instant at which [`elapsed`](Self::elapsed) reaches `elapsed`.
    pub fn instant_at(&self, elapsed: Duration) -> Instant {
        self.origin + elapsed
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            now,
            elapsed: now.saturating_duration_since(self.origin),
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

    #[test]
    fn dt_is_clamped_but_elapsed_is_not() {
        let mut clock = FrameClock::new();
        let start = clock.origin;

        let first = clock.tick_at(start + Duration::from_secs(2));
        assert_eq!(first.dt, 0.25);
        assert_eq!(first.elapsed, Duration::from_secs(2));
        assert_eq!(first.frame_index, 0);

        let second = clock.tick_at(start + Duration::from_secs(2));
        assert!(second.dt > 0.0);
        assert_eq!(second.frame_index, 1);
    }

    #[test]
    fn deadlines_map_back_to_instants() {
        let mut clock = FrameClock::new();
        let at = clock.instant_at(Duration::from_millis(60));
        assert_eq!(clock.tick_at(at).elapsed, Duration::from_millis(60));
    }
}
