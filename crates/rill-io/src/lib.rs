//! On-disk recordings of a simulation run.
//!
//! A recording is a directory holding a `_meta` file and one `.dat` file per frame, numbered from
//! zero and zero padded to a common width. All values are native-endian.

use std::path::{Path, PathBuf};

use glam::UVec2;
use rill_sim::{FrameView, GridBuffer, ObstacleSet, Rect};
use smallvec::SmallVec;

pub mod decode;
pub mod encode;

pub use decode::{DecodingError, FluidDataDecoder};
pub use encode::{EncodingError, FluidDataEncoder};

pub const MAGIC: [u8; 4] = *b"RILL";
pub const FORMAT_VERSION: u8 = 1;

/// Name of the file describing the whole recording.
pub const METADATA_FILE: &str = "_meta";

/// Path of the file holding `frame`, zero padded to the digit count of the last frame index.
pub fn frame_path(dir: &Path, frame: u64, num_frames: u64) -> PathBuf {
    let max_digits = num_frames.saturating_sub(1).checked_ilog10().unwrap_or(0) + 1;
    let digits = frame.checked_ilog10().unwrap_or(0) + 1;
    let zeros = max_digits.saturating_sub(digits);

    dir.join(format!("{}{frame}.dat", "0".repeat(zeros as usize)))
}

/// An obstacle as it was laid out when the recording started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObstacleRecord {
    pub center: UVec2,
    pub size: UVec2,
    pub enabled: bool,
}

impl From<&Rect> for ObstacleRecord {
    fn from(rect: &Rect) -> Self {
        Self {
            center: rect.center,
            size: rect.size,
            enabled: rect.enabled,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FluidMetadata {
    pub version: u8,
    pub grid_size: u32,
    pub fps: u32,
    pub num_frames: u64,
    pub obstacles: SmallVec<[ObstacleRecord; 3]>,
}

impl FluidMetadata {
    /// Rebuilds the obstacle set with every obstacle moved to the matching entry of `centers`.
    pub fn obstacles_at(&self, centers: &[UVec2]) -> ObstacleSet {
        let mut set = ObstacleSet::new();

        for (record, &center) in self.obstacles.iter().zip(centers) {
            let mut rect = Rect::new(center, record.size);
            rect.enabled = record.enabled;
            set.add(rect);
        }

        set
    }
}

/// One recorded frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FluidFrameData {
    pub index: u64,
    pub obstacles: ObstacleSet,
    pub grid: GridBuffer,
}

impl FluidFrameData {
    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            grid: &self.grid,
            obstacles: &self.obstacles,
            tick: self.index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_paths_are_zero_padded() {
        let dir = Path::new("out");

        assert_eq!(frame_path(dir, 0, 1), dir.join("0.dat"));
        assert_eq!(frame_path(dir, 7, 100), dir.join("07.dat"));
        assert_eq!(frame_path(dir, 42, 1000), dir.join("042.dat"));
        assert_eq!(frame_path(dir, 999, 1000), dir.join("999.dat"));
    }

    #[test]
    fn empty_recording_has_single_digit_paths() {
        assert_eq!(frame_path(Path::new("out"), 0, 0), Path::new("out").join("0.dat"));
    }
}
