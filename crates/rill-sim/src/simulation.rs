use std::time::Duration;

use glam::{IVec2, UVec2};
use log::{debug, info};

use crate::{
    cell::Cell,
    clock::SimulationClock,
    config::{ConfigError, SimulationBuilder, SimulationConfig},
    flow::substep,
    grid::{GridBuffer, GridStore},
    mover::move_obstacles,
    obstacle::{ObstacleId, ObstacleSet},
    source::SourceParams,
    FrameView, Surface,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverState {
    /// Buffers hold nothing meaningful yet.
    Uninitialized,
    /// Buffers hold the initial condition; no tick has run.
    Initialized,
    Running,
}

/// What a call to [`Simulation::advance`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub ticked: bool,
    pub rendered: bool,
}

/// The simulation driver.
///
/// Owns both grid buffers and decides which one is read and which is written each sub-step,
/// tracks obstacle targets, the source pulse and the fixed-timestep clock.
pub struct Simulation {
    config: SimulationConfig,
    state: DriverState,
    grids: GridStore,
    /// Obstacle positions as of the last completed move pass.
    previous: ObstacleSet,
    /// Obstacle positions the next tick moves towards.
    current: ObstacleSet,
    source: SourceParams,
    /// Clock time at which the running pulse ends.
    pulse_deadline: Option<Duration>,
    last_count: Option<u64>,
    clock: SimulationClock,
    steps: u64,
    ticks: u64,
}

impl Simulation {
    #[allow(clippy::new_ret_no_self)]
    #[inline(always)]
    pub fn new() -> SimulationBuilder {
        SimulationBuilder::default()
    }

    /// Creates an uninitialized simulation, failing fast on an invalid configuration.
    pub fn with_config(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut obstacles = ObstacleSet::new();
        for spec in &config.obstacles {
            // Validation guarantees the set has room.
            obstacles.add(spec.to_rect(config.grid_size));
        }

        Ok(Self {
            state: DriverState::Uninitialized,
            grids: GridStore::new(config.grid_size),
            previous: obstacles.clone(),
            current: obstacles,
            source: SourceParams::new(config.source_center, config.source_radius),
            pulse_deadline: None,
            last_count: None,
            clock: SimulationClock::new(config.timestep),
            steps: 0,
            ticks: 0,
            config,
        })
    }

    #[inline(always)]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    #[inline(always)]
    pub fn state(&self) -> DriverState {
        self.state
    }

    #[inline(always)]
    pub fn grid_size(&self) -> u32 {
        self.config.grid_size
    }

    /// The most recently completed buffer.
    #[inline(always)]
    pub fn grid(&self) -> &GridBuffer {
        self.grids.latest()
    }

    #[inline(always)]
    pub fn grids(&self) -> &GridStore {
        &self.grids
    }

    /// Obstacle targets for the next tick.
    #[inline(always)]
    pub fn obstacles(&self) -> &ObstacleSet {
        &self.current
    }

    #[inline(always)]
    pub fn source(&self) -> &SourceParams {
        &self.source
    }

    #[inline(always)]
    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// Sub-steps run since initialization.
    #[inline(always)]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    #[inline(always)]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// A read-only view of the latest buffer and the obstacles, as handed to a [`Surface`].
    pub fn frame(&self) -> FrameView<'_> {
        FrameView {
            grid: self.grids.latest(),
            obstacles: &self.current,
            tick: self.ticks,
        }
    }

    /// Fills both buffers with the initial condition: the lower half of the grid holds water
    /// whose density grows with depth, everything else is empty.
    pub fn initialize(&mut self) {
        let initial = initial_grid(self.config.grid_size, &self.current);
        self.reset_grids(&initial);
    }

    /// Initializes both buffers from `grid`, which must match the configured size.
    pub fn initialize_with(&mut self, grid: &GridBuffer) -> Result<(), ConfigError> {
        if grid.size() != self.config.grid_size {
            return Err(ConfigError::GridSizeMismatch {
                expected: self.config.grid_size,
                found: grid.size(),
            });
        }

        self.reset_grids(grid);
        Ok(())
    }

    fn reset_grids(&mut self, grid: &GridBuffer) {
        self.grids.reset_to(grid);
        self.previous = self.current.clone();
        self.steps = 0;
        self.ticks = 0;
        self.state = DriverState::Initialized;

        info!(
            "initialized {n}x{n} grid holding {:.2} units of liquid",
            grid.total_density(),
            n = self.config.grid_size,
        );
    }

    /// Drops all simulation state. The next tick starts over from the initial condition.
    pub fn dispose(&mut self) {
        self.grids.clear();
        self.clock.reset();
        self.source.intensity = 0.0;
        self.pulse_deadline = None;
        self.last_count = None;
        self.steps = 0;
        self.ticks = 0;
        self.state = DriverState::Uninitialized;

        info!("disposed simulation");
    }

    /// Reports the host's current count. Only an increase over the previously observed value
    /// starts a pulse; the first observation just sets the baseline.
    ///
    /// Returns whether a pulse was started.
    pub fn observe_count(&mut self, count: u64) -> bool {
        let increased = matches!(self.last_count, Some(last) if count > last);
        self.last_count = Some(count);

        if increased {
            self.notify_count_increased();
        }

        increased
    }

    /// Starts (or restarts) a source pulse that ends `pulse_duration` from now on the
    /// simulation clock.
    pub fn notify_count_increased(&mut self) {
        self.source.intensity = self.config.pulse_intensity;
        self.pulse_deadline = Some(self.clock.elapsed() + self.config.pulse_duration);

        debug!("source pulse started at {:?}", self.clock.elapsed());
    }

    /// Sets where an obstacle should be after the next tick.
    pub fn move_obstacle(&mut self, id: ObstacleId, center: UVec2) -> bool {
        self.current.set_center(id, center)
    }

    pub fn set_obstacle_enabled(&mut self, id: ObstacleId, enabled: bool) -> bool {
        self.current.set_enabled(id, enabled)
    }

    /// Feeds `dt` of real time into the clock. When a timestep has accumulated, runs one tick
    /// and draws the result into `surface`.
    ///
    /// A surface that cannot draw this frame is skipped; the simulation keeps going.
    pub fn advance<S: Surface + ?Sized>(&mut self, dt: Duration, surface: &mut S) -> TickReport {
        if self.state == DriverState::Uninitialized {
            self.initialize();
        }

        let due = self.clock.advance(dt);
        self.expire_pulse();

        if !due {
            return TickReport::default();
        }

        self.tick();

        let rendered = match surface.draw(self.frame()) {
            Ok(()) => true,
            Err(err) => {
                debug!("skipping render of tick {}: {err}", self.ticks);
                false
            }
        };

        TickReport {
            ticked: true,
            rendered,
        }
    }

    /// Runs one tick: the obstacle move pass if any obstacle target changed, then
    /// `steps_per_tick` sub-steps.
    pub fn tick(&mut self) {
        if self.state == DriverState::Uninitialized {
            self.initialize();
        }
        self.expire_pulse();

        if self.current.moved_since(&self.previous) {
            let step_time = self.step_time();
            let relocation = move_obstacles(self.grids.input_mut(), &self.previous, &self.current, step_time);

            info!(
                "moved {} obstacle(s), relocating {:.3} units of liquid",
                relocation.moved, relocation.density,
            );
        }
        self.previous = self.current.clone();

        for _ in 0..self.config.steps_per_tick {
            self.step();
        }

        self.ticks += 1;
        self.state = DriverState::Running;
    }

    /// Runs a single sub-step and swaps the buffer roles.
    pub fn step(&mut self) {
        let step_time = self.step_time();
        let (input, output) = self.grids.split();

        substep(input, output, &self.current, &self.source, step_time);

        self.grids.swap();
        self.steps += 1;
    }

    #[inline]
    fn step_time(&self) -> f32 {
        (self.steps % self.config.seed_period as u64) as f32
    }

    fn expire_pulse(&mut self) {
        if let Some(deadline) = self.pulse_deadline {
            if self.clock.elapsed() >= deadline {
                self.source.intensity = 0.0;
                self.pulse_deadline = None;

                debug!("source pulse ended at {:?}", self.clock.elapsed());
            }
        }
    }
}

/// Builds the starting grid: water in the lower half of the grid, deepest at the bottom, and
/// nothing inside obstacles.
pub fn initial_grid(size: u32, obstacles: &ObstacleSet) -> GridBuffer {
    let mut grid = GridBuffer::new(size);
    let half = size as f32 / 2.0;

    for y in 0..(size / 2) as i32 {
        let depth = 1.0 - y as f32 / half;

        for x in 0..size as i32 {
            let p = IVec2::new(x, y);
            if obstacles.is_inside(p) {
                continue;
            }

            grid.write(p, Cell::with_density(depth));
        }
    }

    grid
}
