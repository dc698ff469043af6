use std::time::{Duration, Instant};

/// Accumulated timing data for the fixed-step loop.
#[derive(Debug, Default, Clone, Copy)]
pub struct StepProfiler {
    pub simulation_time: Duration,
    pub total_frame_time: Duration,
    pub frames: u64,
    pub substeps: u64,
    pub dropped_time: f32,
}

impl StepProfiler {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn average_substep(&self) -> Duration {
        if self.substeps == 0 {
            return Duration::ZERO;
        }
        self.simulation_time / self.substeps as u32
    }

    pub fn report(&self) {
        if self.frames == 0 {
            return;
        }

        log::info!(
            "--- Step Profile --- frames: {}, substeps: {} ({:.1} per frame)",
            self.frames,
            self.substeps,
            self.substeps as f32 / self.frames as f32
        );
        log::info!(
            "  Total:    {:.2} ms",
            self.total_frame_time.as_secs_f32() * 1000.0
        );
        log::info!(
            "  Simulate: {:.2} ms ({:.1} µs per substep)",
            self.simulation_time.as_secs_f32() * 1000.0,
            self.average_substep().as_secs_f32() * 1e6
        );
        if self.dropped_time > 0.0 {
            log::info!("  Dropped:  {:.3} s of simulated time", self.dropped_time);
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_timer_accumulates_into_target() {
        let mut total = Duration::ZERO;
        {
            let _timer = ScopedTimer::new(&mut total);
            std::thread::sleep(Duration::from_millis(2));
        }
        assert!(total >= Duration::from_millis(2));
    }
}
