use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use log::debug;
use rill_sim::{FrameView, Simulation, MAX_OBSTACLES};
use thiserror::Error;

use crate::{frame_path, ObstacleRecord, FORMAT_VERSION, MAGIC, METADATA_FILE};

pub struct FluidDataEncoder {
    /// The path to the directory into which the fluid data will be placed.
    path: PathBuf,
    num_frames: u64,
    fps: u32,
    grid_size: Option<u32>,
    current_frame: u64,
}

impl FluidDataEncoder {
    /// Creates the recording directory. Fails if it already exists.
    pub fn new(path: PathBuf, num_frames: u64, fps: u32) -> Result<FluidDataEncoder, EncodingError> {
        if num_frames == 0 {
            return Err(EncodingError::EmptyRecording);
        }

        std::fs::create_dir(&path)?;

        Ok(Self {
            path,
            num_frames,
            fps,
            grid_size: None,
            current_frame: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.current_frame
    }

    pub fn num_frames(&self) -> u64 {
        self.num_frames
    }

    pub fn encode_metadata(&mut self, sim: &Simulation) -> Result<(), EncodingError> {
        let obstacles = sim.obstacles();
        if obstacles.len() > MAX_OBSTACLES {
            return Err(EncodingError::TooManyObstacles(obstacles.len()));
        }

        let path = self.path.join(METADATA_FILE);
        let mut writer = BufWriter::new(File::create(path)?);

        writer.write_all(&MAGIC)?;
        writer.write_all(&[FORMAT_VERSION])?;
        writer.write_all(&sim.grid_size().to_ne_bytes())?;
        writer.write_all(&self.fps.to_ne_bytes())?;
        writer.write_all(&self.num_frames.to_ne_bytes())?;

        writer.write_all(&[obstacles.len() as u8])?;
        for record in obstacles.iter().map(ObstacleRecord::from) {
            writer.write_all(bytemuck::bytes_of(&record.center.to_array()))?;
            writer.write_all(bytemuck::bytes_of(&record.size.to_array()))?;
            writer.write_all(&[record.enabled as u8])?;
        }

        writer.flush()?;
        self.grid_size = Some(sim.grid_size());

        debug!("wrote metadata for {} frames to {}", self.num_frames, self.path.display());

        Ok(())
    }

    pub fn encode_frame(&mut self, view: FrameView<'_>) -> Result<(), EncodingError> {
        let Some(grid_size) = self.grid_size else {
            return Err(EncodingError::MissingMetadata);
        };

        if view.grid.size() != grid_size {
            return Err(EncodingError::GridSizeMismatch {
                expected: grid_size,
                found: view.grid.size(),
            });
        }

        if self.current_frame >= self.num_frames {
            return Err(EncodingError::TooManyFrames(self.num_frames));
        }

        let path = frame_path(&self.path, self.current_frame, self.num_frames);
        let mut writer = BufWriter::new(File::create(path)?);

        for rect in view.obstacles.iter() {
            writer.write_all(bytemuck::bytes_of(&rect.center.to_array()))?;
        }

        for cell in view.grid.cells().iter() {
            writer.write_all(bytemuck::bytes_of(cell))?;
        }

        writer.flush()?;
        self.current_frame += 1;

        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("a recording needs at least one frame")]
    EmptyRecording,
    #[error("metadata must be written before any frame")]
    MissingMetadata,
    #[error("all {0} frames have already been written")]
    TooManyFrames(u64),
    #[error("{0} obstacles cannot be recorded")]
    TooManyObstacles(usize),
    #[error("frame has grid size {found}, recording has {expected}")]
    GridSizeMismatch { expected: u32, found: u32 },
}
