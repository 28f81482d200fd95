use bevy::{
    diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin},
    prelude::*,
};

const OVERLAY_ZINDEX: i32 = i32::MAX - 32;

/// Shows the frame rate and a status line in the top left corner.
#[derive(Default)]
pub struct StatusOverlayPlugin {
    pub config: StatusOverlayConfig,
}

impl Plugin for StatusOverlayPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<FrameTimeDiagnosticsPlugin>() {
            app.add_plugins(FrameTimeDiagnosticsPlugin);
        }

        app.insert_resource(self.config.clone())
            .init_resource::<StatusLine>()
            .add_systems(Startup, setup)
            .add_systems(
                Update,
                (
                    toggle_display.run_if(resource_changed::<StatusOverlayConfig>),
                    update_fps,
                    update_status.run_if(resource_changed::<StatusLine>),
                ),
            );
    }
}

#[derive(Resource, Clone)]
pub struct StatusOverlayConfig {
    pub text_config: TextFont,
    pub text_color: Color,
    pub enabled: bool,
}

impl Default for StatusOverlayConfig {
    fn default() -> Self {
        StatusOverlayConfig {
            text_config: TextFont {
                font: Handle::<Font>::default(),
                font_size: 20.0,
                ..Default::default()
            },
            text_color: Color::WHITE,
            enabled: true,
        }
    }
}

/// Free-form text shown under the frame rate. Front-ends overwrite it every frame.
#[derive(Resource, Default, PartialEq)]
pub struct StatusLine(pub String);

#[derive(Component)]
struct FpsText;

#[derive(Component)]
struct StatusText;

fn setup(mut commands: Commands, config: Res<StatusOverlayConfig>) {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                flex_direction: FlexDirection::Column,
                ..Default::default()
            },
            GlobalZIndex(OVERLAY_ZINDEX),
        ))
        .with_children(|parent| {
            parent
                .spawn((
                    Text::new("FPS: "),
                    config.text_config.clone(),
                    TextColor(config.text_color),
                    FpsText,
                ))
                .with_child((TextSpan::default(), config.text_config.clone()));

            parent.spawn((
                Text::default(),
                config.text_config.clone(),
                TextColor(config.text_color),
                StatusText,
            ));
        });
}

fn update_fps(
    diagnostic: Res<DiagnosticsStore>,
    query: Query<Entity, With<FpsText>>,
    mut writer: TextUiWriter,
) {
    let Some(value) = diagnostic
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|fps| fps.smoothed())
    else {
        return;
    };

    for entity in &query {
        *writer.text(entity, 1) = format!("{value:.1}");
    }
}

fn update_status(
    status: Res<StatusLine>,
    query: Query<Entity, With<StatusText>>,
    mut writer: TextUiWriter,
) {
    for entity in &query {
        *writer.text(entity, 0) = status.0.clone();
    }
}

fn toggle_display(
    config: Res<StatusOverlayConfig>,
    mut query: Query<&mut Visibility, Or<(With<FpsText>, With<StatusText>)>>,
) {
    for mut visibility in &mut query {
        visibility.set_if_neq(match config.enabled {
            true => Visibility::Visible,
            false => Visibility::Hidden,
        });
    }
}
