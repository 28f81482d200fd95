use bytemuck::{Pod, Zeroable};
use glam::{IVec2, Vec2};

/// A single grid element.
///
/// The layout matches a `vec4<f32>` of `(velocity.x, velocity.y, density, unused)` so a whole
/// buffer can be uploaded to a storage binding or written to disk as-is.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Cell {
    /// Outgoing flow direction. Always one of the four unit offsets or zero.
    pub velocity: Vec2,
    /// Amount of liquid held by the cell.
    pub density: f32,
    pub reserved: f32,
}

impl Cell {
    pub const EMPTY: Cell = Cell {
        velocity: Vec2::ZERO,
        density: 0.0,
        reserved: 0.0,
    };

    #[inline]
    pub fn with_density(density: f32) -> Self {
        Self {
            density,
            ..Self::EMPTY
        }
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// The offset of the cell this one flows into, rounded to the nearest cell.
    #[inline]
    pub fn direction(&self) -> IVec2 {
        self.velocity.round().as_ivec2()
    }
}
