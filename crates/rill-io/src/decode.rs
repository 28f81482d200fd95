use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use bytemuck::{Pod, Zeroable};
use glam::UVec2;
use rill_sim::{Cell, GridBuffer, MAX_GRID_SIZE, MAX_OBSTACLES};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{frame_path, FluidFrameData, FluidMetadata, ObstacleRecord, FORMAT_VERSION, MAGIC, METADATA_FILE};

pub struct FluidDataDecoder {
    /// The path to the directory in which the fluid data resides.
    path: PathBuf,
    metadata: Option<FluidMetadata>,
    current_frame: u64,
}

impl FluidDataDecoder {
    pub fn new(path: PathBuf) -> FluidDataDecoder {
        Self {
            path,
            metadata: None,
            current_frame: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The metadata read by the last call to [`decode_metadata`](Self::decode_metadata).
    pub fn metadata(&self) -> Option<&FluidMetadata> {
        self.metadata.as_ref()
    }

    fn read_value<T: Pod, R: Read>(reader: &mut R) -> Result<T, DecodingError> {
        let mut value = T::zeroed();
        reader.read_exact(bytemuck::bytes_of_mut(&mut value))?;
        Ok(value)
    }

    fn read_uvec2<R: Read>(reader: &mut R) -> Result<UVec2, DecodingError> {
        let [x, y] = Self::read_value::<[u32; 2], _>(reader)?;
        Ok(UVec2::new(x, y))
    }

    pub fn decode_metadata(&mut self) -> Result<FluidMetadata, DecodingError> {
        let path = self.path.join(METADATA_FILE);
        let mut reader = BufReader::new(File::open(path)?);

        let magic = Self::read_value::<[u8; 4], _>(&mut reader)?;
        if magic != MAGIC {
            return Err(DecodingError::BadMagic(magic));
        }

        let version = Self::read_value::<u8, _>(&mut reader)?;
        if version != FORMAT_VERSION {
            return Err(DecodingError::UnsupportedVersion(version));
        }

        let grid_size = Self::read_value::<u32, _>(&mut reader)?;
        if grid_size == 0 || grid_size > MAX_GRID_SIZE {
            return Err(DecodingError::InvalidGridSize(grid_size));
        }

        let fps = Self::read_value::<u32, _>(&mut reader)?;
        let num_frames = Self::read_value::<u64, _>(&mut reader)?;

        let count = Self::read_value::<u8, _>(&mut reader)? as usize;
        if count > MAX_OBSTACLES {
            return Err(DecodingError::TooManyObstacles(count));
        }

        let mut obstacles = SmallVec::new();
        for _ in 0..count {
            let center = Self::read_uvec2(&mut reader)?;
            let size = Self::read_uvec2(&mut reader)?;
            let enabled = Self::read_value::<u8, _>(&mut reader)? != 0;

            obstacles.push(ObstacleRecord { center, size, enabled });
        }

        let metadata = FluidMetadata {
            version,
            grid_size,
            fps,
            num_frames,
            obstacles,
        };

        self.metadata = Some(metadata.clone());
        self.current_frame = 0;

        Ok(metadata)
    }

    /// Reads the next frame, or `None` once every frame has been read.
    pub fn decode_frame(&mut self) -> Result<Option<FluidFrameData>, DecodingError> {
        let Some(metadata) = &self.metadata else {
            return Err(DecodingError::MissingMetadata);
        };

        if self.current_frame >= metadata.num_frames {
            return Ok(None);
        }

        let path = frame_path(&self.path, self.current_frame, metadata.num_frames);
        let mut reader = BufReader::new(File::open(path)?);

        let mut centers: SmallVec<[UVec2; MAX_OBSTACLES]> = SmallVec::new();
        for _ in 0..metadata.obstacles.len() {
            centers.push(Self::read_uvec2(&mut reader)?);
        }

        let n = metadata.grid_size as usize;
        let mut cells = vec![Cell::zeroed(); n * n];
        reader.read_exact(bytemuck::cast_slice_mut(&mut cells))?;

        let grid = GridBuffer::from_cells(metadata.grid_size, cells)
            .ok_or(DecodingError::InvalidGridSize(metadata.grid_size))?;

        let frame = FluidFrameData {
            index: self.current_frame,
            obstacles: metadata.obstacles_at(&centers),
            grid,
        };

        self.current_frame += 1;

        Ok(Some(frame))
    }

    /// Rewinds to the first frame.
    pub fn reset(&mut self) {
        self.current_frame = 0;
    }
}

#[derive(Debug, Error)]
pub enum DecodingError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("not a recording: bad magic {0:?}")]
    BadMagic([u8; 4]),
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),
    #[error("invalid grid size {0}")]
    InvalidGridSize(u32),
    #[error("{0} obstacles recorded, at most 3 are supported")]
    TooManyObstacles(usize),
    #[error("metadata must be decoded before any frame")]
    MissingMetadata,
}
