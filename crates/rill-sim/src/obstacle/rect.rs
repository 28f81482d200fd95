use glam::{IVec2, UVec2};

use super::Bounds;

/// An axis-aligned box obstacle in grid-cell coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub center: UVec2,
    /// Never changes once the obstacle is created; only `center` moves.
    pub size: UVec2,
    pub enabled: bool,
}

impl Rect {
    pub fn new(center: UVec2, size: UVec2) -> Self {
        Rect {
            center,
            size,
            enabled: true,
        }
    }

    /// Sets the center of the box. The change is picked up by the next tick.
    pub fn set_center(&mut self, center: UVec2) {
        self.center = center;
    }

    #[inline]
    pub fn bounds(&self) -> Bounds {
        self.bounds_at(self.center)
    }

    /// The cells this box would cover if it were centered at `center`.
    #[inline]
    pub fn bounds_at(&self, center: UVec2) -> Bounds {
        let center = center.as_ivec2();
        let half = (self.size / 2).as_ivec2();

        Bounds {
            min: (center - half).max(IVec2::ZERO),
            max: (center + half).max(IVec2::ZERO),
        }
    }

    #[inline]
    pub fn contains(&self, p: IVec2) -> bool {
        self.enabled && self.bounds().contains(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_inclusive_and_clamped() {
        let rect = Rect::new(UVec2::new(2, 2), UVec2::new(2, 2));
        let bounds = rect.bounds();

        assert_eq!(bounds.min, IVec2::new(1, 1));
        assert_eq!(bounds.max, IVec2::new(3, 3));
        assert!(rect.contains(IVec2::new(3, 3)));
        assert!(!rect.contains(IVec2::new(4, 3)));

        let wall = Rect::new(UVec2::new(0, 8), UVec2::new(1, 16));
        assert_eq!(wall.bounds().min, IVec2::new(0, 0));
        assert_eq!(wall.bounds().max, IVec2::new(0, 16));
    }

    #[test]
    fn disabled_rect_contains_nothing() {
        let mut rect = Rect::new(UVec2::new(2, 2), UVec2::new(2, 2));
        rect.enabled = false;

        assert!(!rect.contains(IVec2::new(2, 2)));
    }
}
