use glam::{IVec2, UVec2};
use smallvec::SmallVec;

pub mod rect;

pub use rect::Rect;

/// How many obstacles a simulation can hold.
pub const MAX_OBSTACLES: usize = 3;

/// An inclusive range of grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds {
    pub min: IVec2,
    pub max: IVec2,
}

impl Bounds {
    #[inline]
    pub fn contains(&self, p: IVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObstacleId(pub usize);

/// A fixed-capacity list of box obstacles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObstacleSet {
    obstacles: SmallVec<[Rect; MAX_OBSTACLES]>,
}

impl ObstacleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an obstacle to the set, returning its ID, or `None` if the set is full.
    pub fn add(&mut self, obstacle: Rect) -> Option<ObstacleId> {
        if self.obstacles.len() >= MAX_OBSTACLES {
            return None;
        }

        self.obstacles.push(obstacle);
        Some(ObstacleId(self.obstacles.len() - 1))
    }

    #[inline]
    pub fn get(&self, id: ObstacleId) -> Option<&Rect> {
        self.obstacles.get(id.0)
    }

    /// Moves an obstacle, returning `false` if no obstacle has the given ID.
    pub fn set_center(&mut self, id: ObstacleId, center: UVec2) -> bool {
        match self.obstacles.get_mut(id.0) {
            Some(obstacle) => {
                obstacle.set_center(center);
                true
            }
            None => false,
        }
    }

    pub fn set_enabled(&mut self, id: ObstacleId, enabled: bool) -> bool {
        match self.obstacles.get_mut(id.0) {
            Some(obstacle) => {
                obstacle.enabled = enabled;
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rect> {
        self.obstacles.iter()
    }

    /// Whether `p` lies inside any enabled obstacle.
    #[inline]
    pub fn is_inside(&self, p: IVec2) -> bool {
        self.obstacles.iter().any(|o| o.contains(p))
    }

    /// Whether any enabled obstacle sits somewhere other than in `previous`.
    pub fn moved_since(&self, previous: &ObstacleSet) -> bool {
        self.obstacles
            .iter()
            .zip(previous.obstacles.iter())
            .any(|(current, previous)| current.enabled && previous.enabled && current.center != previous.center)
    }
}
