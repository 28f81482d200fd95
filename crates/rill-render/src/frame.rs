use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use glam::IVec2;
use log::trace;
use ndarray::{s, Array3, ArrayView3};
use rill_sim::{FrameView, Surface, SurfaceError};

use crate::palette::{shade, to_rgba8};

/// Number of channels in a rasterized frame.
pub const CHANNELS: usize = 4;

/// Rasterizes a whole frame covering the viewport into a `height x width x RGBA` image.
///
/// Row 0 of the image is the top of the viewport, which shows the highest grid row. Each pixel
/// samples the cell under its center.
pub fn rasterize(view: FrameView<'_>, width: usize, height: usize) -> Array3<u8> {
    let mut frame = Array3::zeros((height, width, CHANNELS));
    rasterize_into(view, &mut frame);
    frame
}

/// Like [`rasterize`], reusing the dimensions and storage of `frame`.
pub fn rasterize_into(view: FrameView<'_>, frame: &mut Array3<u8>) {
    let (height, width, _) = frame.dim();
    let grid_size = view.grid.size();

    for py in 0..height {
        let v = 1.0 - (py as f32 + 0.5) / height as f32;

        for px in 0..width {
            let u = (px as f32 + 0.5) / width as f32;
            let p = sample_cell(u, v, grid_size);

            let density = view.grid.read(p).density;
            let rgba = to_rgba8(shade(density, view.obstacles.is_inside(p)));

            frame.slice_mut(s![py, px, ..]).assign(&ndarray::arr1(&rgba));
        }
    }
}

/// The cell under the viewport position `(u, v)`, both in `[0, 1]` with `v` pointing up.
pub fn sample_cell(u: f32, v: f32, grid_size: u32) -> IVec2 {
    let n = grid_size as f32;
    let max = grid_size as i32 - 1;

    IVec2::new(
        ((u * n) as i32).clamp(0, max),
        ((v * n) as i32).clamp(0, max),
    )
}

/// A [`Surface`] that rasterizes every frame it is handed into an owned RGBA image.
pub struct FrameTarget {
    frame: Array3<u8>,
    frames_drawn: u64,
    last_tick: Option<u64>,
}

impl FrameTarget {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            frame: Array3::zeros((height, width, CHANNELS)),
            frames_drawn: 0,
            last_tick: None,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.frame.dim().1
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.frame.dim().0
    }

    /// The most recently drawn frame.
    pub fn frame(&self) -> ArrayView3<'_, u8> {
        self.frame.view()
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// The tick of the simulation shown in the current frame.
    pub fn last_tick(&self) -> Option<u64> {
        self.last_tick
    }

    pub fn save_ppm<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        write_ppm(self.frame.view(), writer)
    }
}

impl Surface for FrameTarget {
    fn draw(&mut self, view: FrameView<'_>) -> Result<(), SurfaceError> {
        if self.frame.is_empty() {
            return Err(SurfaceError::Unavailable);
        }

        rasterize_into(view, &mut self.frame);
        self.frames_drawn += 1;
        self.last_tick = Some(view.tick);

        trace!("rasterized tick {} into {}x{}", view.tick, self.width(), self.height());

        Ok(())
    }
}

/// Writes an RGBA frame as a binary PPM, compositing it over black.
pub fn write_ppm<W: Write>(frame: ArrayView3<'_, u8>, mut writer: W) -> io::Result<()> {
    let (height, width, channels) = frame.dim();
    debug_assert_eq!(channels, CHANNELS);

    write!(writer, "P6\n{width} {height}\n255\n")?;

    let mut row = Vec::with_capacity(width * 3);
    for y in 0..height {
        row.clear();

        for x in 0..width {
            let alpha = frame[(y, x, 3)] as u32;
            for c in 0..3 {
                let value = frame[(y, x, c)] as u32 * alpha / 255;
                row.push(value as u8);
            }
        }

        writer.write_all(&row)?;
    }

    writer.flush()
}
