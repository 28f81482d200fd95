use glam::IVec2;
use log::warn;

use crate::{
    flow::FlowResolver,
    grid::GridBuffer,
    obstacle::{Bounds, ObstacleSet},
    rng::CellRng,
};

/// What an obstacle move pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Relocation {
    /// Number of obstacles whose center changed.
    pub moved: usize,
    /// Total density swept out of the obstacles' new footprints.
    pub density: f32,
}

/// Pushes liquid out of the way of obstacles that moved from `previous` to `current`.
///
/// Runs in place on `grid`. For every enabled obstacle whose center changed, the band of cells
/// swept by its leading edge is emptied and the swept density is added to the first cell past
/// the new edge, row by row (or column by column). The columns just outside the new left and
/// right edges then get their velocities recomputed so nothing flows into the obstacle on the
/// next sub-step.
pub fn move_obstacles(
    grid: &mut GridBuffer,
    previous: &ObstacleSet,
    current: &ObstacleSet,
    step_time: f32,
) -> Relocation {
    let mut relocation = Relocation::default();

    for (prev, next) in previous.iter().zip(current.iter()) {
        if !prev.enabled || !next.enabled || prev.center == next.center {
            continue;
        }

        let diff = next.center.as_ivec2() - prev.center.as_ivec2();
        let old = prev.bounds();
        // The size never changes, so the new footprint is the old box at the new center.
        let new = prev.bounds_at(next.center);

        relocation.moved += 1;

        if diff.x > 0 {
            for y in old.min.y..=old.max.y {
                let band = (old.max.x..=new.max.x).map(|x| IVec2::new(x, y));
                relocation.density += sweep(grid, band, IVec2::new(new.max.x + 1, y));
            }
        }

        if diff.x < 0 {
            for y in old.min.y..=old.max.y {
                let band = (new.min.x..old.min.x).map(|x| IVec2::new(x, y));
                relocation.density += sweep(grid, band, IVec2::new(new.min.x - 1, y));
            }
        }

        if diff.y > 0 {
            for x in old.min.x..=old.max.x {
                let band = (old.max.y..=new.max.y).map(|y| IVec2::new(x, y));
                relocation.density += sweep(grid, band, IVec2::new(x, new.max.y + 1));
            }
        }

        if diff.y < 0 {
            for x in old.min.x..=old.max.x {
                let band = (new.min.y..old.min.y).map(|y| IVec2::new(x, y));
                relocation.density += sweep(grid, band, IVec2::new(x, new.min.y - 1));
            }
        }

        redirect_edges(grid, current, new, step_time);
    }

    relocation
}

/// Empties `band` and adds its total density to `target`.
///
/// If `target` is off the grid the band is left untouched, so no liquid disappears.
fn sweep(grid: &mut GridBuffer, band: impl Iterator<Item = IVec2>, target: IVec2) -> f32 {
    if !grid.is_valid_coord(target) {
        warn!("obstacle pushed liquid towards {target}, which is off the grid; leaving it in place");
        return 0.0;
    }

    let mut swept = 0.0;

    for p in band {
        if let Some(cell) = grid.get_mut(p) {
            swept += cell.density;
            cell.density = 0.0;
        }
    }

    grid.add_density(target, swept);
    swept
}

/// Recomputes velocities in the columns just outside the left and right edges of `bounds`.
fn redirect_edges(grid: &mut GridBuffer, obstacles: &ObstacleSet, bounds: Bounds, step_time: f32) {
    let size = grid.size() as i32;
    let rows = bounds.min.y.max(1)..=bounds.max.y.min(size - 2);
    let columns = [bounds.min.x - 1, bounds.max.x + 1];

    let resolver = FlowResolver::new(grid, obstacles);
    let mut updates = Vec::with_capacity(2 * rows.clone().count());

    for x in columns {
        for y in rows.clone() {
            let p = IVec2::new(x, y);
            if !grid.is_valid_coord(p) {
                continue;
            }

            let mut rng = CellRng::new(grid.index(p), step_time);
            updates.push((p, resolver.velocity(p, &mut rng)));
        }
    }

    for (p, velocity) in updates {
        let mut cell = grid.read(p);
        cell.velocity = velocity;
        grid.write(p, cell);
    }
}
