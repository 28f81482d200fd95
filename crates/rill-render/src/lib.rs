//! CPU renderer for the density grid.
//!
//! The whole viewport is one quad; every pixel samples the cell under it and maps it through a
//! fixed color ramp.

pub mod frame;
pub mod palette;

pub use frame::{rasterize, rasterize_into, sample_cell, write_ppm, FrameTarget, CHANNELS};
pub use palette::shade;
