use bevy::prelude::*;
use rill_sim::{ObstacleId, Simulation};

use crate::{
    overlay::StatusLine,
    texture::{spawn_grid_view, GridTexture},
};

/// Runs a simulation against real frame time and draws every tick.
pub struct LivePlugin;

impl Plugin for LivePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TrackedCount>()
            .init_resource::<SelectedObstacle>()
            .add_systems(Startup, setup)
            .add_systems(
                Update,
                (
                    (count_input, obstacle_input),
                    advance_simulation,
                    update_status,
                )
                    .chain(),
            );
    }
}

#[derive(Resource)]
pub struct LiveSimulation(pub Simulation);

/// The count tracked on behalf of the host. Only increases start a source pulse.
#[derive(Resource, Default)]
pub struct TrackedCount(pub u64);

#[derive(Resource, Default)]
struct SelectedObstacle(ObstacleId);

fn setup(mut commands: Commands, mut images: ResMut<Assets<Image>>, mut sim: ResMut<LiveSimulation>) {
    sim.0.initialize();

    let texture = spawn_grid_view(&mut commands, &mut images, sim.0.grid_size());
    commands.insert_resource(texture);

    info!(
        "live simulation ready: {n}x{n} grid, {} sub-steps per tick",
        sim.0.config().steps_per_tick,
        n = sim.0.grid_size(),
    );
}

fn count_input(
    keys: Res<ButtonInput<KeyCode>>,
    mut count: ResMut<TrackedCount>,
    mut sim: ResMut<LiveSimulation>,
) {
    if keys.just_pressed(KeyCode::Space) {
        count.0 += 1;
    }

    sim.0.observe_count(count.0);
}

fn obstacle_input(
    keys: Res<ButtonInput<KeyCode>>,
    mut selected: ResMut<SelectedObstacle>,
    mut sim: ResMut<LiveSimulation>,
) {
    let count = sim.0.obstacles().len();
    if count == 0 {
        return;
    }

    if keys.just_pressed(KeyCode::Tab) {
        selected.0 = ObstacleId((selected.0 .0 + 1) % count);
    }

    let step = [
        (KeyCode::ArrowLeft, IVec2::NEG_X),
        (KeyCode::ArrowRight, IVec2::X),
        (KeyCode::ArrowDown, IVec2::NEG_Y),
        (KeyCode::ArrowUp, IVec2::Y),
    ]
    .into_iter()
    .filter(|(key, _)| keys.just_pressed(*key))
    .fold(IVec2::ZERO, |acc, (_, d)| acc + d);

    if step == IVec2::ZERO {
        return;
    }

    let grid_size = sim.0.grid_size();
    let Some(center) = sim.0.obstacles().get(selected.0).map(|rect| rect.center) else {
        return;
    };

    let target = step_center(center, step, grid_size);
    sim.0.move_obstacle(selected.0, target);
}

fn advance_simulation(
    time: Res<Time>,
    mut sim: ResMut<LiveSimulation>,
    mut texture: ResMut<GridTexture>,
    mut images: ResMut<Assets<Image>>,
) {
    let mut surface = texture.surface(&mut images);
    sim.0.advance(time.delta(), &mut surface);
}

fn update_status(
    sim: Res<LiveSimulation>,
    count: Res<TrackedCount>,
    selected: Res<SelectedObstacle>,
    mut status: ResMut<StatusLine>,
) {
    let line = format!(
        "count {} | obstacle {} | tick {} | liquid {:.1}",
        count.0,
        selected.0 .0,
        sim.0.ticks(),
        sim.0.grid().total_density(),
    );

    status.set_if_neq(StatusLine(line));
}

/// Moves `center` by `step`, keeping it within `0..=grid_size` on both axes.
fn step_center(center: UVec2, step: IVec2, grid_size: u32) -> UVec2 {
    let max = IVec2::splat(grid_size as i32);
    (center.as_ivec2() + step).clamp(IVec2::ZERO, max).as_uvec2()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obstacles_stay_on_the_grid() {
        assert_eq!(step_center(UVec2::new(0, 3), IVec2::NEG_X, 16), UVec2::new(0, 3));
        assert_eq!(step_center(UVec2::new(16, 3), IVec2::X, 16), UVec2::new(16, 3));
        assert_eq!(step_center(UVec2::new(4, 3), IVec2::new(1, -1), 16), UVec2::new(5, 2));
    }
}
