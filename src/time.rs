use std::time::Instant;

/// Milliseconds on the host's monotonic clock. Every stage entry point takes one.
pub type Millis = f64;

/// Wall clock for drivers that do not get timestamps from their host.
pub struct FrameClock {
    start: Instant,
    last: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self { start: now, last: now }
    }

    pub fn tick(&mut self) -> Millis {
        self.last = Instant::now();
        self.now_ms()
    }

    pub fn now_ms(&self) -> Millis {
        self.last.duration_since(self.start).as_secs_f64() * 1000.0
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Derives per-frame delta seconds from host timestamps.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameDelta {
    last: Option<Millis>,
}

impl FrameDelta {
    /// Returns seconds since the previous sample; the first sample and clock regressions yield 0.
    pub fn sample(&mut self, now: Millis) -> f32 {
        let delta = match self.last {
            Some(prev) if now > prev => ((now - prev) / 1000.0) as f32,
            _ => 0.0,
        };
        self.last = Some(now);
        delta
    }
}
