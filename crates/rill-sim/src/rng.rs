use glam::Vec2;

/// Hash-based pseudo-random stream used to break ties between equally cheap flow directions.
///
/// Seeded per cell per sub-step from `(cell_index, step_time)`, so every cell draws from its own
/// reproducible stream no matter in which order (or on how many threads) cells are resolved.
/// Not suitable for anything but visual jitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRng {
    seed: Vec2,
}

impl CellRng {
    #[inline]
    pub fn new(cell_index: usize, step_time: f32) -> Self {
        Self {
            seed: Vec2::new(cell_index as f32, step_time),
        }
    }

    /// Next value in `[0, 1)`.
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        let a = self.seed.dot(Vec2::new(23.140_779, 232.616_9));
        let b = self.seed.dot(Vec2::new(54.478_565, 345.841_53));
        self.seed.x = fract(a.cos() * 136.8168);
        self.seed.y = fract(b.cos() * 534.7645);
        self.seed.y
    }

    /// Uniform index in `0..n`. `n` must be non-zero.
    #[inline]
    pub fn pick(&mut self, n: usize) -> usize {
        ((self.next_f32() * n as f32) as usize).min(n - 1)
    }
}

#[inline]
fn fract(v: f32) -> f32 {
    // Tiny negative inputs round up to exactly 1.0 in f32.
    let f = v - v.floor();
    if f >= 1.0 { 0.0 } else { f }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_is_reproducible() {
        let mut a = CellRng::new(17, 412.0);
        let mut b = CellRng::new(17, 412.0);

        for _ in 0..8 {
            assert_eq!(a.next_f32(), b.next_f32());
        }
    }

    #[test]
    fn values_stay_in_unit_range() {
        for index in 0..256 {
            let mut rng = CellRng::new(index, 37.0);
            let v = rng.next_f32();
            assert!((0.0..1.0).contains(&v), "value {v} out of range for cell {index}");
        }
    }

    #[test]
    fn pick_covers_every_choice() {
        let mut seen = [false; 4];

        for index in 0..1024 {
            let mut rng = CellRng::new(index, 5.0);
            seen[rng.pick(4)] = true;
        }

        assert!(seen.iter().all(|&s| s), "some choices were never picked: {seen:?}");
    }
}
