//! The per-cell update rule.
//!
//! Every sub-step reads a frozen input buffer and writes a distinct output buffer. Each cell first
//! picks the cheapest direction to flow in, then gathers the mass it keeps plus whatever its four
//! neighbors send into it. A source cell computes its outflow exactly the way its destination
//! does, so no mass is lost. A cell pointing off the grid or into an obstacle keeps everything.

use glam::{IVec2, Vec2};
use ndarray::Zip;
use smallvec::{smallvec, SmallVec};

use crate::{cell::Cell, grid::GridBuffer, obstacle::ObstacleSet, rng::CellRng, source::SourceParams};

/// Extra cost of flowing one cell upwards (and the saving of flowing one cell downwards).
pub const GRAVITY_COST: f32 = 0.5;
/// Cells slower than this send no flow.
pub const STASIS_SPEED: f32 = 0.5;
pub const BASE_OUTFLOW: f32 = 0.3;
/// How strongly the density difference between source and destination drives outflow.
pub const OUTFLOW_GRADIENT: f32 = 0.1;
pub const MIN_OUTFLOW: f32 = 0.01;

/// Neighbor offsets, in tie-breaking priority order.
pub const NEIGHBOR_OFFSETS: [IVec2; 4] = [
    IVec2::new(0, 1),
    IVec2::new(0, -1),
    IVec2::new(1, 0),
    IVec2::new(-1, 0),
];

const MAX_DIRECTION_CHOICES: usize = 4;

/// Resolves cells against one frozen buffer and obstacle layout.
#[derive(Clone, Copy)]
pub struct FlowResolver<'a> {
    input: &'a GridBuffer,
    obstacles: &'a ObstacleSet,
}

impl<'a> FlowResolver<'a> {
    pub fn new(input: &'a GridBuffer, obstacles: &'a ObstacleSet) -> Self {
        Self { input, obstacles }
    }

    /// Whether liquid may flow into `p`: on the grid and outside every enabled obstacle.
    #[inline]
    pub fn is_valid_flow_out(&self, p: IVec2) -> bool {
        self.input.is_valid_coord(p) && !self.obstacles.is_inside(p)
    }

    /// Picks the direction the cell at `p` flows in next.
    ///
    /// Cells inside an obstacle never move.
    pub fn velocity(&self, p: IVec2, rng: &mut CellRng) -> Vec2 {
        if self.obstacles.is_inside(p) {
            return Vec2::ZERO;
        }

        let mut least_cost = self.input.read(p).density;

        // Directions of the same cost; one is chosen at random at the end.
        let mut choices: SmallVec<[IVec2; MAX_DIRECTION_CHOICES]> = smallvec![IVec2::ZERO];

        for offset in NEIGHBOR_OFFSETS {
            let neighbor = p + offset;
            if !self.is_valid_flow_out(neighbor) {
                continue;
            }

            let cost = self.input.read(neighbor).density + offset.y as f32 * GRAVITY_COST;

            if cost == least_cost {
                if choices.len() < MAX_DIRECTION_CHOICES {
                    choices.push(offset);
                }
            } else if cost < least_cost {
                least_cost = cost;
                choices.clear();
                choices.push(offset);
            }
        }

        choices[rng.pick(choices.len())].as_vec2()
    }

    /// Where the cell at `p` sends liquid this sub-step, and how much.
    ///
    /// `None` when the cell is too slow to flow, or points off the grid or into an obstacle.
    /// Velocities are picked against the previous obstacle layout, so the latter happens for
    /// one sub-step after an obstacle moves onto the cell's target.
    #[inline]
    pub fn outflow(&self, p: IVec2) -> Option<(IVec2, f32)> {
        let src = self.input.read(p);
        if src.speed() < STASIS_SPEED {
            return None;
        }

        let dest = p + src.direction();
        if !self.is_valid_flow_out(dest) {
            return None;
        }
        let dest_density = self.input.read(dest).density;

        let amount = (BASE_OUTFLOW + OUTFLOW_GRADIENT * (src.density - dest_density))
            .max(MIN_OUTFLOW)
            .min(src.density)
            .max(0.0);

        Some((dest, amount))
    }

    /// Density of the cell at `p` after this sub-step, before any source clamping.
    pub fn density(&self, p: IVec2) -> f32 {
        let own = self.input.read(p).density;

        let mut density = match self.outflow(p) {
            Some((_, amount)) => own - amount,
            None => own,
        };

        for offset in NEIGHBOR_OFFSETS {
            let neighbor = p + offset;
            if !self.input.is_valid_coord(neighbor) {
                continue;
            }

            if let Some((dest, amount)) = self.outflow(neighbor) {
                if dest == p {
                    density += amount;
                }
            }
        }

        density
    }

    /// Computes the output cell for `p`.
    pub fn resolve(&self, p: IVec2, source: &SourceParams, step_time: f32) -> Cell {
        let mut rng = CellRng::new(self.input.index(p), step_time);
        let mut next = self.input.read(p);

        next.velocity = self.velocity(p, &mut rng);

        let min_inflow = source.minimum_inflow(p, self.input.size());
        next.density = self.density(p).max(min_inflow).max(0.0);

        next
    }
}

/// Runs one sub-step, filling `output` entirely from `input`.
pub fn substep(
    input: &GridBuffer,
    output: &mut GridBuffer,
    obstacles: &ObstacleSet,
    source: &SourceParams,
    step_time: f32,
) {
    debug_assert_eq!(input.size(), output.size());

    let resolver = FlowResolver::new(input, obstacles);
    let resolve = |(y, x): (usize, usize), out: &mut Cell| {
        *out = resolver.resolve(IVec2::new(x as i32, y as i32), source, step_time);
    };

    #[cfg(feature = "parallel")]
    Zip::indexed(output.cells_mut()).par_for_each(resolve);

    #[cfg(not(feature = "parallel"))]
    Zip::indexed(output.cells_mut()).for_each(resolve);
}

#[cfg(test)]
mod tests {
    use glam::UVec2;

    use crate::obstacle::Rect;

    use super::*;

    const EPS: f32 = 1e-6;

    fn grid_with(size: u32, cells: &[(IVec2, Cell)]) -> GridBuffer {
        let mut grid = GridBuffer::new(size);
        for &(p, cell) in cells {
            grid.write(p, cell);
        }
        grid
    }

    #[test]
    fn prefers_lowest_cost_direction() {
        let grid = grid_with(4, &[(IVec2::new(0, 0), Cell::with_density(5.0))]);
        let obstacles = ObstacleSet::new();
        let resolver = FlowResolver::new(&grid, &obstacles);

        // Up costs 0.5, right costs 0.0, down and left are off the grid.
        let mut rng = CellRng::new(0, 0.0);
        assert_eq!(resolver.velocity(IVec2::new(0, 0), &mut rng), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn gravity_pulls_down() {
        let grid = grid_with(4, &[(IVec2::new(1, 2), Cell::with_density(1.0))]);
        let obstacles = ObstacleSet::new();
        let resolver = FlowResolver::new(&grid, &obstacles);

        let mut rng = CellRng::new(9, 0.0);
        assert_eq!(resolver.velocity(IVec2::new(1, 2), &mut rng), Vec2::new(0.0, -1.0));
    }

    #[test]
    fn never_points_into_obstacles() {
        let grid = grid_with(4, &[(IVec2::new(1, 2), Cell::with_density(1.0))]);
        let mut obstacles = ObstacleSet::new();
        obstacles.add(Rect::new(UVec2::new(1, 1), UVec2::new(0, 0)));
        let resolver = FlowResolver::new(&grid, &obstacles);

        for t in 0..16 {
            let mut rng = CellRng::new(9, t as f32);
            let v = resolver.velocity(IVec2::new(1, 2), &mut rng);
            assert_ne!(v, Vec2::new(0.0, -1.0));
        }
    }

    #[test]
    fn ties_keep_only_equal_cost_candidates() {
        // Flat, empty field: staying, right and left all cost 0, down is off the grid.
        let grid = GridBuffer::new(4);
        let obstacles = ObstacleSet::new();
        let resolver = FlowResolver::new(&grid, &obstacles);

        for t in 0..32 {
            let mut rng = CellRng::new(1, t as f32);
            let v = resolver.velocity(IVec2::new(1, 0), &mut rng);
            assert!(
                v == Vec2::ZERO || v == Vec2::X || v == Vec2::NEG_X,
                "unexpected direction {v}"
            );
        }
    }

    #[test]
    fn outflow_moves_mass_to_destination() {
        let source = Cell {
            velocity: Vec2::X,
            density: 5.0,
            reserved: 0.0,
        };
        let grid = grid_with(4, &[(IVec2::new(0, 0), source)]);
        let obstacles = ObstacleSet::new();
        let resolver = FlowResolver::new(&grid, &obstacles);

        let (dest, amount) = resolver.outflow(IVec2::new(0, 0)).unwrap();
        assert_eq!(dest, IVec2::new(1, 0));
        assert!((amount - 0.8).abs() < EPS);

        assert!((resolver.density(IVec2::new(0, 0)) - 4.2).abs() < EPS);
        assert!((resolver.density(IVec2::new(1, 0)) - 0.8).abs() < EPS);
        assert_eq!(resolver.density(IVec2::new(0, 1)), 0.0);
    }

    #[test]
    fn outflow_never_exceeds_source() {
        let source = Cell {
            velocity: Vec2::NEG_Y,
            density: 0.005,
            reserved: 0.0,
        };
        let grid = grid_with(4, &[(IVec2::new(2, 2), source), (IVec2::new(2, 1), Cell::with_density(3.0))]);
        let obstacles = ObstacleSet::new();
        let resolver = FlowResolver::new(&grid, &obstacles);

        let (_, amount) = resolver.outflow(IVec2::new(2, 2)).unwrap();
        assert_eq!(amount, 0.005);
        assert_eq!(resolver.density(IVec2::new(2, 2)), 0.0);
    }

    #[test]
    fn slow_cells_keep_their_mass() {
        let grid = grid_with(4, &[(IVec2::new(2, 2), Cell::with_density(2.0))]);
        let obstacles = ObstacleSet::new();
        let resolver = FlowResolver::new(&grid, &obstacles);

        assert_eq!(resolver.outflow(IVec2::new(2, 2)), None);
        assert_eq!(resolver.density(IVec2::new(2, 2)), 2.0);
    }

    #[test]
    fn off_grid_destination_keeps_mass() {
        let source = Cell {
            velocity: Vec2::NEG_X,
            density: 1.0,
            reserved: 0.0,
        };
        let grid = grid_with(4, &[(IVec2::new(0, 2), source)]);
        let obstacles = ObstacleSet::new();
        let resolver = FlowResolver::new(&grid, &obstacles);

        assert_eq!(resolver.outflow(IVec2::new(0, 2)), None);
        assert_eq!(resolver.density(IVec2::new(0, 2)), 1.0);
    }

    #[test]
    fn obstacle_destination_keeps_mass() {
        let source = Cell {
            velocity: Vec2::NEG_Y,
            density: 1.5,
            reserved: 0.0,
        };
        let grid = grid_with(4, &[(IVec2::new(2, 2), source)]);
        let mut obstacles = ObstacleSet::new();
        obstacles.add(Rect::new(UVec2::new(2, 1), UVec2::new(0, 0)));
        let resolver = FlowResolver::new(&grid, &obstacles);

        assert_eq!(resolver.outflow(IVec2::new(2, 2)), None);
        assert_eq!(resolver.density(IVec2::new(2, 2)), 1.5);
        assert_eq!(resolver.density(IVec2::new(2, 1)), 0.0);
    }

    #[test]
    fn outflow_falls_to_floor_against_deeper_destination() {
        let obstacles = ObstacleSet::new();
        let source = Cell {
            velocity: Vec2::X,
            density: 1.0,
            reserved: 0.0,
        };

        let mut last = f32::INFINITY;
        for dest_density in [0.0, 1.0, 2.0, 3.0, 4.0, 8.0] {
            let grid = grid_with(4, &[(IVec2::new(1, 1), source), (IVec2::new(2, 1), Cell::with_density(dest_density))]);
            let resolver = FlowResolver::new(&grid, &obstacles);

            let (_, amount) = resolver.outflow(IVec2::new(1, 1)).unwrap();
            assert!(amount <= last, "outflow rose to {amount} at destination density {dest_density}");
            assert!(amount >= MIN_OUTFLOW);
            last = amount;
        }

        // 0.3 + 0.1 * (1 - 8) is negative, so only the floor is left.
        assert_eq!(last, MIN_OUTFLOW);
    }

    #[test]
    fn substep_matches_per_cell_resolve() {
        let size = 12;
        let mut input = GridBuffer::new(size);
        for (i, cell) in input.cells_mut().iter_mut().enumerate() {
            *cell = Cell {
                velocity: if i % 5 == 0 { Vec2::ZERO } else { NEIGHBOR_OFFSETS[i % 4].as_vec2() },
                density: ((i * 7) % 11) as f32 * 0.25,
                reserved: 0.0,
            };
        }

        let mut obstacles = ObstacleSet::new();
        obstacles.add(Rect::new(UVec2::new(6, 0), UVec2::new(12, 2)));
        obstacles.add(Rect::new(UVec2::new(4, 7), UVec2::new(2, 2)));

        let mut source = SourceParams::new(Vec2::new(0.5, 0.75), 0.1);
        source.intensity = 0.1;

        let resolver = FlowResolver::new(&input, &obstacles);
        let mut expected = GridBuffer::new(size);
        for (p, _) in input.iter() {
            expected.write(p, resolver.resolve(p, &source, 17.0));
        }

        // Runs in parallel with the `parallel` feature, in order without it.
        let mut output = GridBuffer::new(size);
        substep(&input, &mut output, &obstacles, &source, 17.0);

        assert_eq!(output, expected);
    }

    #[test]
    fn substep_conserves_mass_without_source() {
        let mut input = GridBuffer::new(8);
        for (i, cell) in input.cells_mut().iter_mut().enumerate() {
            let direction = NEIGHBOR_OFFSETS[i % 4].as_vec2();
            *cell = Cell {
                velocity: if i % 3 == 0 { Vec2::ZERO } else { direction },
                density: (i % 7) as f32 * 0.5,
                reserved: 0.0,
            };
        }

        // Keep the border still so nothing points off the grid.
        for y in 0..8 {
            for x in 0..8 {
                if x == 0 || y == 0 || x == 7 || y == 7 {
                    let p = IVec2::new(x, y);
                    let density = input.read(p).density;
                    input.write(p, Cell::with_density(density));
                }
            }
        }

        let mut output = GridBuffer::new(8);
        substep(&input, &mut output, &ObstacleSet::new(), &SourceParams::default(), 3.0);

        let before = input.total_density();
        let after = output.total_density();
        assert!((before - after).abs() < 1e-3, "mass changed from {before} to {after}");
        assert!(output.cells().iter().all(|c| c.density >= 0.0));
    }

    #[test]
    fn substep_applies_source_clamp() {
        let input = GridBuffer::new(16);
        let mut output = GridBuffer::new(16);
        let source = SourceParams {
            intensity: 0.1,
            ..SourceParams::default()
        };

        substep(&input, &mut output, &ObstacleSet::new(), &source, 0.0);

        assert!(output.read(IVec2::new(8, 14)).density >= 0.1);
        assert_eq!(output.read(IVec2::new(2, 2)).density, 0.0);
    }
}
