//! Trace spans around recording sections and the per-frame budget check.

use std::time::{Duration, Instant};

use log::{log_enabled, trace, warn, Level};

/// Logs entry and exit of a recording section at trace level.
///
/// The clock only starts when trace logging is enabled.
pub struct TraceSpan {
    label: &'static str,
    start: Option<Instant>,
}

impl TraceSpan {
    pub fn enter(label: &'static str) -> Self {
        let start = log_enabled!(Level::Trace).then(|| {
            trace!("enter {label}");
            Instant::now()
        });
        Self { label, start }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl Drop for TraceSpan {
    fn drop(&mut self) {
        if let Some(start) = self.start {
            trace!("exit {} after {} us", self.label, start.elapsed().as_micros());
        }
    }
}

/// Warns when recording a frame took longer than `budget_ms`. Returns whether it did.
pub fn warn_if_frame_budget_exceeded(duration: Duration, budget_ms: f32) -> bool {
    let elapsed_ms = duration.as_secs_f32() * 1000.0;
    let exceeded = elapsed_ms > budget_ms;
    if exceeded {
        warn!("post-processing recording took {elapsed_ms:.2} ms, budget is {budget_ms:.2} ms");
    }
    exceeded
}
