#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]

use std::path::PathBuf;

use bevy::prelude::*;
use indicatif::{ProgressBar, ProgressStyle};
use live::{LivePlugin, LiveSimulation};
use overlay::StatusOverlayPlugin;
use playback::{PlaybackPlugin, Recording};
use rill_io::{DecodingError, FluidDataDecoder};
use rill_sim::{ConfigError, Simulation, SimulationConfig};

pub mod live;
pub mod overlay;
pub mod playback;
pub mod texture;

fn window_plugins(title: &str) -> impl PluginGroup {
    DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: title.to_string(),
            resolution: (720.0, 720.0).into(),
            ..default()
        }),
        ..default()
    })
}

/// Opens a window running the simulation live.
///
/// Space bumps the tracked count, Tab cycles the selected obstacle and the arrow keys move it.
pub fn view_live(config: SimulationConfig) -> Result<(), ConfigError> {
    let sim = Simulation::with_config(config)?;

    App::new()
        .add_plugins((window_plugins("rill"), StatusOverlayPlugin::default()))
        .insert_resource(ClearColor(Color::BLACK))
        .insert_resource(LiveSimulation(sim))
        .add_plugins(LivePlugin)
        .run();

    Ok(())
}

/// Loads a whole recording into memory and opens a window playing it back.
pub fn view_recording(path: PathBuf) -> Result<(), DecodingError> {
    let mut decoder = FluidDataDecoder::new(path);
    let metadata = decoder.decode_metadata()?;

    let bar_template = "Loading {spinner:.green} [{elapsed}] [{bar:50.white/white}] {pos}/{len} ({eta})";
    let style = ProgressStyle::with_template(bar_template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let progress = ProgressBar::new(metadata.num_frames).with_style(style);

    let mut frames = Vec::with_capacity(metadata.num_frames as usize);
    while let Some(frame) = decoder.decode_frame()? {
        frames.push(frame);
        progress.inc(1);
    }
    progress.finish();

    App::new()
        .add_plugins((window_plugins("rill playback"), StatusOverlayPlugin::default()))
        .insert_resource(ClearColor(Color::BLACK))
        .insert_resource(Recording { metadata, frames })
        .add_plugins(PlaybackPlugin)
        .run();

    Ok(())
}
