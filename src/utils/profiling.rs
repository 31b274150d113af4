use std::time::{Duration, Instant};

use log::debug;

/// Per-effect recording time for one frame.
#[derive(Debug, Clone, Default)]
pub struct StackProfiler {
    pub effects: Vec<(&'static str, Duration)>,
    pub composite_time: Duration,
    pub total_frame_time: Duration,

    pub effects_rendered: usize,
    pub effects_skipped: usize,
}

impl StackProfiler {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn record(&mut self, name: &'static str, duration: Duration) {
        self.effects.push((name, duration));
        self.effects_rendered += 1;
    }

    pub fn report(&self) {
        let total_us = self.total_frame_time.as_micros() as f32;
        if total_us < 1.0 {
            return;
        }

        debug!(
            "post-processing: {} rendered, {} skipped, {:.3} ms total",
            self.effects_rendered,
            self.effects_skipped,
            self.total_frame_time.as_secs_f32() * 1000.0
        );
        for (name, duration) in &self.effects {
            debug!(
                "  {:<16} {:.3} ms ({:.1}%)",
                name,
                duration.as_secs_f32() * 1000.0,
                (duration.as_micros() as f32 / total_us) * 100.0
            );
        }
        debug!(
            "  {:<16} {:.3} ms",
            "composite",
            self.composite_time.as_secs_f32() * 1000.0
        );
    }
}

pub struct ScopedTimer<'a> {
    start: Instant,
    output: &'a mut Duration,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(output: &'a mut Duration) -> Self {
        Self {
            start: Instant::now(),
            output,
        }
    }
}

impl<'a> Drop for ScopedTimer<'a> {
    fn drop(&mut self) {
        *self.output += self.start.elapsed();
    }
}
