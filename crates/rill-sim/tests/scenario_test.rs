//! Small hand-checked scenarios.
//!
//! Each one sets up a tiny grid, runs one or two sub-steps (or a single obstacle move pass) and
//! compares against values worked out by hand.

use glam::{IVec2, UVec2, Vec2};
use rill_sim::{
    mover::move_obstacles,
    obstacle::{ObstacleSet, Rect},
    Cell, GridBuffer, ObstacleId, ObstacleSpec, Simulation,
};

const EPS: f32 = 1e-5;

fn open_simulation(size: u32) -> Simulation {
    Simulation::new()
        .grid_size(size)
        .steps_per_tick(1)
        .obstacles(&[])
        .build()
        .unwrap()
}

/// A single heavy cell in the corner settles on its direction in the first sub-step and starts
/// emptying into it on the second, since flow always follows the velocity of the input buffer.
#[test]
fn test_corner_cell_flows_to_cheapest_neighbor() {
    let mut sim = open_simulation(4);

    let mut grid = GridBuffer::new(4);
    grid.write(IVec2::new(0, 0), Cell::with_density(5.0));
    sim.initialize_with(&grid).unwrap();

    sim.step();

    // Down and left are off the grid, up costs 0.5 and right costs 0.
    let corner = sim.grid().read(IVec2::new(0, 0));
    assert_eq!(corner.velocity, Vec2::X);
    assert_eq!(corner.density, 5.0);

    sim.step();

    let corner = sim.grid().read(IVec2::new(0, 0)).density;
    let right = sim.grid().read(IVec2::new(1, 0)).density;
    assert!((corner - 4.2).abs() < EPS, "corner kept {corner}");
    assert!((right - 0.8).abs() < EPS, "neighbor received {right}");
    assert!((sim.grid().total_density() - 5.0).abs() < EPS);
}

#[test]
fn test_corner_cell_with_velocity_flows_in_one_step() {
    let mut sim = open_simulation(4);

    let mut grid = GridBuffer::new(4);
    grid.write(
        IVec2::new(0, 0),
        Cell {
            velocity: Vec2::X,
            density: 5.0,
            reserved: 0.0,
        },
    );
    sim.initialize_with(&grid).unwrap();

    sim.step();

    let corner = sim.grid().read(IVec2::new(0, 0)).density;
    let right = sim.grid().read(IVec2::new(1, 0)).density;
    assert!((corner - 4.2).abs() < EPS, "corner kept {corner}");
    assert!((right - 0.8).abs() < EPS, "neighbor received {right}");
    assert_eq!(sim.grid().read(IVec2::new(0, 1)).density, 0.0);
}

/// Moving a 3x3 box two cells to the right empties the vacated band and dumps it into the
/// column just past the new right edge.
#[test]
fn test_obstacle_push_relocates_band() {
    let mut grid = GridBuffer::new(8);
    grid.write(IVec2::new(3, 2), Cell::with_density(3.0));
    grid.write(IVec2::new(5, 2), Cell::with_density(0.5));
    grid.write(IVec2::new(6, 2), Cell::with_density(0.25));

    let mut previous = ObstacleSet::new();
    previous.add(Rect::new(UVec2::new(2, 2), UVec2::new(2, 2)));
    let mut current = previous.clone();
    current.set_center(ObstacleId(0), UVec2::new(4, 2));

    move_obstacles(&mut grid, &previous, &current, 0.0);

    assert_eq!(grid.read(IVec2::new(3, 2)).density, 0.0);
    assert_eq!(grid.read(IVec2::new(5, 2)).density, 0.0);
    // next_max_x = 5, so the band lands in column 6 on top of what was already there.
    assert_eq!(grid.read(IVec2::new(6, 2)).density, 3.75);
}

#[test]
fn test_obstacle_push_through_driver() {
    let mut sim = Simulation::new()
        .grid_size(8)
        .steps_per_tick(1)
        .obstacles(&[ObstacleSpec::new(0.25, 0.25, 0.25, 0.25)])
        .build()
        .unwrap();

    let mut grid = GridBuffer::new(8);
    grid.write(IVec2::new(3, 2), Cell::with_density(3.0));
    sim.initialize_with(&grid).unwrap();

    assert_eq!(sim.obstacles().get(ObstacleId(0)).unwrap().center, UVec2::new(2, 2));

    sim.move_obstacle(ObstacleId(0), UVec2::new(4, 2));
    sim.tick();

    let grid = sim.grid();
    assert_eq!(grid.read(IVec2::new(3, 2)).density, 0.0);
    assert!((grid.total_density() - 3.0).abs() < EPS);

    // The obstacle now covers x in 3..=5; nothing inside it holds liquid or moves.
    for y in 1..=3 {
        for x in 3..=5 {
            let cell = grid.read(IVec2::new(x, y));
            assert_eq!(cell.density, 0.0, "({x}, {y}) holds liquid");
            assert_eq!(cell.velocity, Vec2::ZERO, "({x}, {y}) moves");
        }
    }
}
