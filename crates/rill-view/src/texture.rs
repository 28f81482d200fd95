use bevy::{
    image::ImageSampler,
    prelude::*,
    render::{
        camera::ScalingMode,
        render_asset::RenderAssetUsages,
        render_resource::{Extent3d, TextureDimension, TextureFormat},
    },
};
use ndarray::Array3;
use rill_render::{rasterize_into, CHANNELS};
use rill_sim::{FrameView, Surface, SurfaceError};

/// The texture the grid is drawn into, one texel per cell, stretched over a unit quad.
#[derive(Resource)]
pub struct GridTexture {
    pub handle: Handle<Image>,
    frame: Array3<u8>,
}

impl GridTexture {
    /// Returns a [`Surface`] drawing into the texture, if it is still loaded.
    pub fn surface<'a>(&'a mut self, images: &'a mut Assets<Image>) -> ImageSurface<'a> {
        ImageSurface {
            image: images.get_mut(&self.handle),
            frame: &mut self.frame,
        }
    }
}

pub struct ImageSurface<'a> {
    image: Option<&'a mut Image>,
    frame: &'a mut Array3<u8>,
}

impl Surface for ImageSurface<'_> {
    fn draw(&mut self, view: FrameView<'_>) -> Result<(), SurfaceError> {
        let Some(image) = self.image.as_deref_mut() else {
            return Err(SurfaceError::Unavailable);
        };

        rasterize_into(view, self.frame);

        let Some(pixels) = self.frame.as_slice() else {
            return Err(SurfaceError::Unavailable);
        };

        if image.data.len() != pixels.len() {
            return Err(SurfaceError::Unavailable);
        }

        image.data.copy_from_slice(pixels);

        Ok(())
    }
}

/// Spawns the camera and the sprite showing a `grid_size` square texture.
pub fn spawn_grid_view(commands: &mut Commands, images: &mut Assets<Image>, grid_size: u32) -> GridTexture {
    let extent = Extent3d {
        width: grid_size,
        height: grid_size,
        depth_or_array_layers: 1,
    };

    let mut image = Image::new_fill(
        extent,
        TextureDimension::D2,
        &[0; CHANNELS],
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    );
    image.sampler = ImageSampler::nearest();

    let handle = images.add(image);

    commands.spawn((
        Camera2d,
        OrthographicProjection {
            scaling_mode: ScalingMode::AutoMin { min_width: 1.0, min_height: 1.0 },
            ..OrthographicProjection::default_2d()
        },
    ));

    commands.spawn(Sprite {
        image: handle.clone(),
        custom_size: Some(Vec2::ONE),
        ..default()
    });

    let n = grid_size as usize;

    GridTexture {
        handle,
        frame: Array3::zeros((n, n, CHANNELS)),
    }
}
