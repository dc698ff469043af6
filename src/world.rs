use crate::{
    config::{DEFAULT_MAX_SUBSTEPS, DEFAULT_TIME_STEP},
    error::{ensure_positive, Result, SimError},
    utils::{
        logging::ScopedTimer,
        profiling::{self, StepProfiler},
    },
};

/// A simulator advanced by one explicit step per call.
pub trait Simulation: Send {
    /// Accumulates forces and integrates the state over `dt` seconds.
    fn update(&mut self, dt: f32);

    /// Whether explicit integration has blown up since the last reset.
    fn has_diverged(&self) -> bool;

    fn reset_divergence(&mut self);

    fn name(&self) -> &'static str;
}

/// Drives one [`Simulation`] with a fixed timestep, independent of the frame rate.
///
/// Elapsed wall time is accumulated and consumed in `time_step` chunks; leftover time
/// smaller than one step carries over to the next call.
#[derive(Debug)]
pub struct PhysicsWorld<S: Simulation> {
    simulation: S,
    time_step: f32,
    time_accumulated: f32,
    max_substeps: u32,
    paused: bool,
    profiler: StepProfiler,
}

impl<S: Simulation> PhysicsWorld<S> {
    pub fn new(simulation: S, time_step: f32) -> Result<Self> {
        ensure_positive("time_step", time_step)?;
        Ok(Self {
            simulation,
            time_step,
            time_accumulated: 0.0,
            max_substeps: DEFAULT_MAX_SUBSTEPS,
            paused: false,
            profiler: StepProfiler::default(),
        })
    }

    /// World using [`DEFAULT_TIME_STEP`].
    pub fn with_default_step(simulation: S) -> Self {
        Self {
            simulation,
            time_step: DEFAULT_TIME_STEP,
            time_accumulated: 0.0,
            max_substeps: DEFAULT_MAX_SUBSTEPS,
            paused: false,
            profiler: StepProfiler::default(),
        }
    }

    pub fn simulation(&self) -> &S {
        &self.simulation
    }

    pub fn simulation_mut(&mut self) -> &mut S {
        &mut self.simulation
    }

    pub fn into_simulation(self) -> S {
        self.simulation
    }

    pub fn time_step(&self) -> f32 {
        self.time_step
    }

    pub fn set_time_step(&mut self, time_step: f32) -> Result<()> {
        ensure_positive("time_step", time_step)?;
        self.time_step = time_step;
        Ok(())
    }

    pub fn set_max_substeps(&mut self, max_substeps: u32) -> Result<()> {
        if max_substeps == 0 {
            return Err(SimError::invalid("max_substeps", "must be positive"));
        }
        self.max_substeps = max_substeps;
        Ok(())
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn profiler(&self) -> &StepProfiler {
        &self.profiler
    }

    pub fn reset_profiler(&mut self) {
        self.profiler.reset();
    }

    /// Runs exactly one fixed step, ignoring the accumulator and the pause flag.
    pub fn step_once(&mut self) {
        let _timer = profiling::ScopedTimer::new(&mut self.profiler.simulation_time);
        self.simulation.update(self.time_step);
        self.profiler.substeps += 1;
    }

    /// Advances by `elapsed` seconds of wall time and returns the number of sub-steps run.
    pub fn step(&mut self, elapsed: f32) -> u32 {
        if self.paused || !(elapsed > 0.0) {
            return 0;
        }

        let frame_timer = std::time::Instant::now();
        self.time_accumulated += elapsed;
        let mut substeps = 0;
        {
            let _timer = ScopedTimer::new(self.simulation.name());
            let _profile = profiling::ScopedTimer::new(&mut self.profiler.simulation_time);
            while self.time_accumulated >= self.time_step && substeps < self.max_substeps {
                self.time_accumulated -= self.time_step;
                self.simulation.update(self.time_step);
                substeps += 1;
            }
        }

        if self.time_accumulated >= self.time_step {
            log::debug!(
                "{}: sub-step cap {} reached, dropping {:.4} s",
                self.simulation.name(),
                self.max_substeps,
                self.time_accumulated
            );
            self.profiler.dropped_time += self.time_accumulated;
            self.time_accumulated = 0.0;
        }

        self.profiler.frames += 1;
        self.profiler.substeps += u64::from(substeps);
        self.profiler.total_frame_time += frame_timer.elapsed();
        substeps
    }

    pub fn has_diverged(&self) -> bool {
        self.simulation.has_diverged()
    }
}
