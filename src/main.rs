use std::{path::PathBuf, process::ExitCode, time::Duration};

use clap::{Args, Parser, Subcommand};
use log::error;
use rill_sim::{Simulation, SimulationBuilder};
use run::RunSettings;

mod run;

#[derive(Parser)]
#[command(version, about = "Grid-based water simulation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the simulation headless and record every rendered tick.
    Run(RunArgs),
    /// Open a window running the simulation live.
    Live(SimArgs),
    /// Play back a recording.
    View {
        /// Directory written by `rill run`.
        path: PathBuf,
    },
}

#[derive(Args, Clone)]
struct SimArgs {
    /// Side length of the grid, in cells (at most 64).
    #[arg(long, default_value_t = 16)]
    grid_size: u32,
    /// Sub-steps per tick.
    #[arg(long, default_value_t = 128)]
    steps_per_tick: u32,
    /// Milliseconds of real time between ticks.
    #[arg(long, default_value_t = 50)]
    timestep_ms: u64,
}

impl SimArgs {
    fn builder(&self) -> SimulationBuilder {
        Simulation::new()
            .grid_size(self.grid_size)
            .steps_per_tick(self.steps_per_tick)
            .timestep(Duration::from_millis(self.timestep_ms))
    }
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    sim: SimArgs,
    /// Length of the run in seconds of simulated real time.
    #[arg(long, default_value_t = 10.0)]
    seconds: f32,
    /// Frames fed into the simulation clock per second.
    #[arg(long, default_value_t = 60)]
    fps: u32,
    /// Bump the tracked count every this many seconds, starting a source pulse.
    #[arg(long)]
    pulse_every: Option<f32>,
    /// Directory to record into. Must not exist yet.
    #[arg(short, long, default_value = "output")]
    output: PathBuf,
    /// Also dump every rendered tick as a PPM image.
    #[arg(long)]
    snapshots: bool,
    /// Side length of the PPM snapshots, in pixels.
    #[arg(long, default_value_t = 512)]
    resolution: usize,
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run(args) => run::run(RunSettings {
            builder: args.sim.builder(),
            seconds: args.seconds,
            fps: args.fps,
            pulse_every: args.pulse_every,
            output: args.output,
            snapshots: args.snapshots,
            resolution: args.resolution,
        }),
        Command::Live(args) => rill_view::view_live(args.builder().config().clone()).map_err(Into::into),
        Command::View { path } => rill_view::view_recording(path).map_err(Into::into),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
