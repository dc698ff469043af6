use log::{log_enabled, warn, Level};
use std::time::Instant;

/// Scoped timer that traces how long a simulation phase took.
pub struct ScopedTimer<'a> {
    label: &'a str,
    start: Instant,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(label: &'a str) -> Self {
        if log_enabled!(Level::Trace) {
            log::trace!("⏱️ start {label}");
        }
        Self {
            label,
            start: Instant::now(),
        }
    }
}

impl<'a> Drop for ScopedTimer<'a> {
    fn drop(&mut self) {
        if log_enabled!(Level::Trace) {
            let elapsed = self.start.elapsed();
            log::trace!("⏱️ end {} ({} µs)", self.label, elapsed.as_micros());
        }
    }
}

/// Warns once when a simulator crosses into the diverged state.
///
/// Returns the new flag value so callers can write `self.diverged = report_divergence(...)`.
pub fn report_divergence(name: &str, was_diverged: bool, diverged: bool, detail: f32) -> bool {
    if diverged && !was_diverged {
        warn!("{name} diverged (indicator {detail:.3e}); results are no longer physical");
    }
    was_diverged || diverged
}
