use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use indicatif::{ProgressBar, ProgressIterator, ProgressStyle};
use log::{error, info};
use rill_io::{DecodingError, EncodingError, FluidDataEncoder};
use rill_render::FrameTarget;
use rill_sim::{clock::SimulationClock, ConfigError, FrameView, SimulationBuilder, Surface, SurfaceError};
use thiserror::Error;

pub struct RunSettings {
    pub builder: SimulationBuilder,
    pub seconds: f32,
    pub fps: u32,
    pub pulse_every: Option<f32>,
    pub output: PathBuf,
    pub snapshots: bool,
    pub resolution: usize,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to record: {0}")]
    Encoding(#[from] EncodingError),
    #[error("failed to read recording: {0}")]
    Decoding(#[from] DecodingError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("frame rate must be at least 1")]
    ZeroFps,
    #[error("pulse period must be a positive number of seconds, got {0}")]
    InvalidPulsePeriod(f32),
}

/// Writes every tick it is handed into the recording, and optionally a PPM snapshot of it.
struct Recorder {
    encoder: FluidDataEncoder,
    snapshots: Option<(FrameTarget, PathBuf)>,
    failure: Option<RunError>,
}

impl Recorder {
    fn snapshot(target: &mut FrameTarget, dir: &Path, view: FrameView<'_>) -> Result<(), RunError> {
        if target.draw(view).is_ok() {
            target.save_ppm(dir.join(format!("{:05}.ppm", view.tick)))?;
        }

        Ok(())
    }
}

impl Surface for Recorder {
    fn draw(&mut self, view: FrameView<'_>) -> Result<(), SurfaceError> {
        let mut result = self.encoder.encode_frame(view).map_err(RunError::from);

        if result.is_ok() {
            if let Some((target, dir)) = &mut self.snapshots {
                result = Self::snapshot(target, dir, view);
            }
        }

        result.map_err(|err| {
            self.failure.get_or_insert(err);
            SurfaceError::Unavailable
        })
    }
}

pub fn run(settings: RunSettings) -> Result<(), RunError> {
    if settings.fps == 0 {
        return Err(RunError::ZeroFps);
    }

    let pulse_period = match settings.pulse_every {
        Some(seconds) => match Duration::try_from_secs_f32(seconds) {
            Ok(period) if !period.is_zero() => Some(period),
            _ => return Err(RunError::InvalidPulsePeriod(seconds)),
        },
        None => None,
    };

    let mut sim = settings.builder.build()?;
    sim.initialize();

    let dt = Duration::from_secs(1) / settings.fps;
    let frames = (settings.seconds * settings.fps as f32).round() as u64;

    // The clock is deterministic, so the number of recorded ticks is known up front.
    let ticks = {
        let mut clock = SimulationClock::new(sim.config().timestep);
        (0..frames).filter(|_| clock.advance(dt)).count() as u64
    };
    let recording_fps = (Duration::from_secs(1).as_secs_f32() / sim.config().timestep.as_secs_f32()).round() as u32;

    let mut encoder = FluidDataEncoder::new(settings.output.clone(), ticks, recording_fps)?;
    encoder.encode_metadata(&sim)?;

    let snapshots = if settings.snapshots {
        let dir = settings.output.join("snapshots");
        fs::create_dir(&dir)?;
        Some((FrameTarget::new(settings.resolution, settings.resolution), dir))
    } else {
        None
    };

    let mut recorder = Recorder {
        encoder,
        snapshots,
        failure: None,
    };

    let mut next_pulse = pulse_period;
    let mut count = 0;
    sim.observe_count(count);

    let bar_template = "Running Simulation {spinner:.green} [{elapsed}] [{bar:50.white/white}] {pos}/{len} ({eta})";
    let style = ProgressStyle::with_template(bar_template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let progress = ProgressBar::new(frames).with_style(style);

    for _ in (0..frames).progress_with(progress) {
        if let (Some(period), Some(at)) = (pulse_period, next_pulse) {
            if sim.clock().elapsed() >= at {
                count += 1;
                sim.observe_count(count);
                next_pulse = Some(at + period);
            }
        }

        sim.advance(dt, &mut recorder);

        if let Some(err) = recorder.failure.take() {
            error!("stopping after tick {}", sim.ticks());
            return Err(err);
        }
    }

    info!(
        "recorded {} ticks ({} sub-steps) into {}, {:.2} units of liquid left",
        recorder.encoder.frames_written(),
        sim.steps(),
        settings.output.display(),
        sim.grid().total_density(),
    );

    Ok(())
}
