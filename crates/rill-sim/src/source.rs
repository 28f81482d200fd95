use glam::{IVec2, Vec2};

/// The circular region that injects liquid when the tracked count goes up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceParams {
    /// Center of the source, as a fraction of the grid in `[0, 1]²`.
    pub center: Vec2,
    /// Radius of the source, as a fraction of the grid side.
    pub radius: f32,
    /// Minimum density held by every cell inside the source. `0` while no pulse is active.
    pub intensity: f32,
}

impl SourceParams {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self {
            center,
            radius,
            intensity: 0.0,
        }
    }

    /// The density a cell at `p` may not drop below this sub-step.
    #[inline]
    pub fn minimum_inflow(&self, p: IVec2, grid_size: u32) -> f32 {
        let grid_size = grid_size as f32;
        let radius = f32::max(1.0, self.radius * grid_size);
        let center = self.center * grid_size;

        if (p.as_vec2() - center).length() < radius {
            self.intensity
        } else {
            0.0
        }
    }
}

impl Default for SourceParams {
    fn default() -> Self {
        Self::new(Vec2::new(0.5, 0.9), 0.05)
    }
}
