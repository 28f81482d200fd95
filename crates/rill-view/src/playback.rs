use std::time::Duration;

use bevy::prelude::*;
use rill_io::{FluidFrameData, FluidMetadata};
use rill_sim::Surface;

use crate::{
    overlay::StatusLine,
    texture::{spawn_grid_view, GridTexture},
};

/// Plays a decoded recording back at its recorded frame rate. Space toggles play and pause.
pub struct PlaybackPlugin;

impl Plugin for PlaybackPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<PlaybackState>()
            .init_resource::<PlaybackFrame>()
            .add_systems(Startup, setup)
            .add_systems(
                Update,
                (
                    change_state_playing.run_if(in_state(PlaybackState::Paused)),
                    change_state_paused.run_if(in_state(PlaybackState::Playing)),
                    progress_playback.run_if(in_state(PlaybackState::Playing)),
                    show_frame.run_if(resource_changed::<PlaybackFrame>),
                    update_status,
                )
                    .chain(),
            );
    }
}

#[derive(Resource)]
pub struct Recording {
    pub metadata: FluidMetadata,
    pub frames: Vec<FluidFrameData>,
}

#[derive(Resource, Default)]
struct PlaybackFrame {
    index: usize,
    timer: Timer,
}

#[derive(States, Clone, PartialEq, Eq, Hash, Debug, Default)]
enum PlaybackState {
    Playing,
    #[default]
    Paused,
}

fn setup(
    mut commands: Commands,
    mut images: ResMut<Assets<Image>>,
    recording: Res<Recording>,
    mut frame: ResMut<PlaybackFrame>,
) {
    let texture = spawn_grid_view(&mut commands, &mut images, recording.metadata.grid_size);
    commands.insert_resource(texture);

    let fps = recording.metadata.fps.max(1);
    frame.timer = Timer::new(Duration::from_secs(1) / fps, TimerMode::Repeating);

    info!(
        "loaded {} frames of a {n}x{n} grid at {fps} fps",
        recording.frames.len(),
        n = recording.metadata.grid_size,
    );
}

fn change_state_playing(
    keys: Res<ButtonInput<KeyCode>>,
    mut next_state: ResMut<NextState<PlaybackState>>,
) {
    if keys.just_pressed(KeyCode::Space) {
        next_state.set(PlaybackState::Playing);
    }
}

fn change_state_paused(
    keys: Res<ButtonInput<KeyCode>>,
    mut next_state: ResMut<NextState<PlaybackState>>,
) {
    if keys.just_pressed(KeyCode::Space) {
        next_state.set(PlaybackState::Paused);
    }
}

fn progress_playback(
    time: Res<Time>,
    recording: Res<Recording>,
    mut frame: ResMut<PlaybackFrame>,
    mut next_state: ResMut<NextState<PlaybackState>>,
) {
    frame.timer.tick(time.delta());

    let steps = frame.timer.times_finished_this_tick() as usize;
    if steps == 0 {
        return;
    }

    let next = frame.index + steps;
    if next >= recording.frames.len() {
        next_state.set(PlaybackState::Paused);
        frame.index = 0;
        return;
    }

    frame.index = next;
}

fn show_frame(
    recording: Res<Recording>,
    frame: Res<PlaybackFrame>,
    mut texture: ResMut<GridTexture>,
    mut images: ResMut<Assets<Image>>,
) {
    let Some(data) = recording.frames.get(frame.index) else {
        return;
    };

    if let Err(err) = texture.surface(&mut images).draw(data.view()) {
        debug!("skipping frame {}: {err}", frame.index);
    }
}

fn update_status(
    recording: Res<Recording>,
    frame: Res<PlaybackFrame>,
    state: Res<State<PlaybackState>>,
    mut status: ResMut<StatusLine>,
) {
    let line = format!(
        "frame {}/{} ({:?})",
        frame.index + 1,
        recording.frames.len(),
        state.get(),
    );

    status.set_if_neq(StatusLine(line));
}
