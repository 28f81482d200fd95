use std::time::Duration;

use glam::{UVec2, Vec2};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    grid::MAX_GRID_SIZE,
    obstacle::{Rect, MAX_OBSTACLES},
    simulation::Simulation,
};

/// An obstacle laid out in fractions of the grid, resolved to cells once the grid size is known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleSpec {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub enabled: bool,
}

impl ObstacleSpec {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            enabled: true,
        }
    }

    pub fn to_rect(&self, grid_size: u32) -> Rect {
        let n = grid_size as f32;
        let center = UVec2::new((self.x * n).round() as u32, (self.y * n).round() as u32);
        let size = UVec2::new((self.width * n).round() as u32, (self.height * n).round() as u32);

        Rect {
            center,
            size,
            enabled: self.enabled,
        }
    }
}

/// Two side walls and a floor.
pub const DEFAULT_OBSTACLES: [ObstacleSpec; MAX_OBSTACLES] = [
    ObstacleSpec::new(0.0, 0.5, 0.05, 1.0),
    ObstacleSpec::new(1.0, 0.5, 0.1, 1.0),
    ObstacleSpec::new(0.5, 0.0, 1.0, 0.2),
];

/// Validated simulation parameters. Fixed for the lifetime of a [`Simulation`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub grid_size: u32,
    pub steps_per_tick: u32,
    pub timestep: Duration,
    pub obstacles: SmallVec<[ObstacleSpec; MAX_OBSTACLES]>,
    pub source_center: Vec2,
    pub source_radius: f32,
    pub pulse_intensity: f32,
    pub pulse_duration: Duration,
    pub seed_period: u32,
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size == 0 {
            return Err(ConfigError::EmptyGrid);
        }

        if self.grid_size > MAX_GRID_SIZE {
            return Err(ConfigError::GridTooLarge {
                size: self.grid_size,
                max: MAX_GRID_SIZE,
            });
        }

        if self.steps_per_tick == 0 {
            return Err(ConfigError::NoSubsteps);
        }

        if self.timestep.is_zero() {
            return Err(ConfigError::ZeroTimestep);
        }

        if self.obstacles.len() > MAX_OBSTACLES {
            return Err(ConfigError::TooManyObstacles {
                count: self.obstacles.len(),
                max: MAX_OBSTACLES,
            });
        }

        let unit = 0.0..=1.0;
        if !unit.contains(&self.source_center.x) || !unit.contains(&self.source_center.y) {
            return Err(ConfigError::SourceOutOfBounds(self.source_center));
        }

        if self.seed_period == 0 {
            return Err(ConfigError::ZeroSeedPeriod);
        }

        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid_size: 16,
            steps_per_tick: 128,
            timestep: Duration::from_millis(50),
            obstacles: SmallVec::from_slice(&DEFAULT_OBSTACLES),
            source_center: Vec2::new(0.5, 0.9),
            source_radius: 0.05,
            pulse_intensity: 0.1,
            pulse_duration: Duration::from_secs(1),
            seed_period: 1000,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("grid size must be at least 1")]
    EmptyGrid,
    #[error("grid size {size} exceeds the maximum of {max}")]
    GridTooLarge { size: u32, max: u32 },
    #[error("at least one sub-step per tick is required")]
    NoSubsteps,
    #[error("timestep must be non-zero")]
    ZeroTimestep,
    #[error("{count} obstacles given, at most {max} are supported")]
    TooManyObstacles { count: usize, max: usize },
    #[error("source center {0} lies outside the unit square")]
    SourceOutOfBounds(Vec2),
    #[error("seed period must be non-zero")]
    ZeroSeedPeriod,
    #[error("initial grid has size {found}, expected {expected}")]
    GridSizeMismatch { expected: u32, found: u32 },
}

#[derive(Debug, Clone, Default)]
pub struct SimulationBuilder {
    config: SimulationConfig,
}

impl SimulationBuilder {
    /// The side length of the grid, in cells.
    ///
    /// Defaults to `16`. At most `64`.
    pub fn grid_size(mut self, grid_size: u32) -> Self {
        self.config.grid_size = grid_size;
        self
    }

    /// The number of sub-steps run back to back every tick.
    ///
    /// Defaults to `128`.
    pub fn steps_per_tick(mut self, steps_per_tick: u32) -> Self {
        self.config.steps_per_tick = steps_per_tick;
        self
    }

    /// The real time between ticks.
    ///
    /// Defaults to `50ms`.
    pub fn timestep(mut self, timestep: Duration) -> Self {
        self.config.timestep = timestep;
        self
    }

    /// Replaces the obstacle layout.
    ///
    /// Defaults to two side walls and a floor.
    pub fn obstacles(mut self, obstacles: &[ObstacleSpec]) -> Self {
        self.config.obstacles = SmallVec::from_slice(obstacles);
        self
    }

    /// The center of the source, as a fraction of the grid.
    ///
    /// Defaults to `(0.5, 0.9)`.
    pub fn source_center(mut self, center: Vec2) -> Self {
        self.config.source_center = center;
        self
    }

    /// The radius of the source, as a fraction of the grid side. Never smaller than one cell.
    ///
    /// Defaults to `0.05`.
    pub fn source_radius(mut self, radius: f32) -> Self {
        self.config.source_radius = radius;
        self
    }

    /// The minimum density the source holds while a pulse is active.
    ///
    /// Defaults to `0.1`.
    pub fn pulse_intensity(mut self, intensity: f32) -> Self {
        self.config.pulse_intensity = intensity;
        self
    }

    /// How long a pulse lasts.
    ///
    /// Defaults to `1s`.
    pub fn pulse_duration(mut self, duration: Duration) -> Self {
        self.config.pulse_duration = duration;
        self
    }

    /// The period of the step time fed into the tie-breaking random stream.
    ///
    /// Defaults to `1000`.
    pub fn seed_period(mut self, period: u32) -> Self {
        self.config.seed_period = period;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn build(self) -> Result<Simulation, ConfigError> {
        Simulation::with_config(self.config)
    }
}
