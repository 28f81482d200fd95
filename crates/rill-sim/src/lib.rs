use thiserror::Error;

pub mod cell;
pub mod clock;
pub mod config;
pub mod flow;
pub mod grid;
pub mod mover;
pub mod obstacle;
pub mod rng;
pub mod simulation;
pub mod source;

pub use cell::Cell;
pub use config::{ConfigError, ObstacleSpec, SimulationBuilder, SimulationConfig};
pub use grid::{GridBuffer, GridStore, MAX_GRID_SIZE};
pub use obstacle::{ObstacleId, ObstacleSet, Rect, MAX_OBSTACLES};
pub use simulation::{DriverState, Simulation, TickReport};

/// What a [`Surface`] gets to draw: the latest completed buffer and the obstacle layout.
#[derive(Clone, Copy)]
pub struct FrameView<'a> {
    pub grid: &'a GridBuffer,
    pub obstacles: &'a ObstacleSet,
    /// Number of ticks completed when the frame was taken.
    pub tick: u64,
}

/// Something the simulation draws into once per tick.
pub trait Surface {
    fn draw(&mut self, frame: FrameView<'_>) -> Result<(), SurfaceError>;
}

/// Draws nothing. For running the simulation without any output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Headless;

impl Surface for Headless {
    fn draw(&mut self, _frame: FrameView<'_>) -> Result<(), SurfaceError> {
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("no drawable surface is available this frame")]
    Unavailable,
}
