use std::time::{Duration, Instant};

/// Timing snapshot handed to per-frame callbacks.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,

    /// Seconds since the clock was created. Suitable for animation uniforms.
    pub elapsed: f32,

    /// Zero-based index of the frame being prepared.
    pub frame_index: u64,
}

/// Produces one `FrameTime` per rendered frame.
///
/// Delta time is capped so that a stall (debugger, minimized window) does not
/// feed a huge step into animations.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    frame_index: u64,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_max_dt(Duration::from_millis(250))
    }

    pub fn with_max_dt(dt_max: Duration) -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            frame_index: 0,
            dt_max,
        }
    }

    /// Advances the clock.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now.saturating_duration_since(self.last).min(self.dt_max);
        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed: now.saturating_duration_since(self.start).as_secs_f32(),
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
    fn frame_index_counts_from_zero() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick().frame_index, 0);
        assert_eq!(clock.tick().frame_index, 1);
    }

    #[test]
    fn dt_is_capped_but_elapsed_is_not() {
        let mut clock = FrameClock::with_max_dt(Duration::from_millis(100));
        let later = clock.start + Duration::from_secs(2);
        let ft = clock.tick_at(later);
        assert!((ft.dt - 0.1).abs() < 1e-6);
        assert!((ft.elapsed - 2.0).abs() < 1e-6);
    }
}
