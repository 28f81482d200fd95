use glam::IVec2;
use ndarray::Array2;

use crate::cell::Cell;

/// Largest supported grid side, in cells.
pub const MAX_GRID_SIZE: u32 = 64;

/// A square buffer of cells.
///
/// Cells are stored indexed `[(y, x)]` so the standard layout is row-major, matching
/// `index = x + y * size`. Row `0` is the bottom of the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridBuffer {
    size: u32,
    cells: Array2<Cell>,
}

impl GridBuffer {
    pub fn new(size: u32) -> Self {
        let n = size as usize;

        Self {
            size,
            cells: Array2::from_elem((n, n), Cell::EMPTY),
        }
    }

    /// Builds a buffer from row-major cells. Returns `None` if `cells` does not hold exactly
    /// `size * size` elements.
    pub fn from_cells(size: u32, cells: Vec<Cell>) -> Option<Self> {
        let n = size as usize;
        let cells = Array2::from_shape_vec((n, n), cells).ok()?;

        Some(Self { size, cells })
    }

    /// Side length of the grid, in cells.
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn is_valid_coord(&self, p: IVec2) -> bool {
        let n = self.size as i32;
        p.x >= 0 && p.x < n && p.y >= 0 && p.y < n
    }

    #[inline]
    pub fn index(&self, p: IVec2) -> usize {
        (p.x + p.y * self.size as i32) as usize
    }

    /// Reads a cell. `p` must be a valid coordinate.
    #[inline]
    pub fn read(&self, p: IVec2) -> Cell {
        self.cells[(p.y as usize, p.x as usize)]
    }

    /// Writes a cell. `p` must be a valid coordinate.
    #[inline]
    pub fn write(&mut self, p: IVec2, cell: Cell) {
        self.cells[(p.y as usize, p.x as usize)] = cell;
    }

    #[inline]
    pub fn get(&self, p: IVec2) -> Option<&Cell> {
        if !self.is_valid_coord(p) {
            return None;
        }

        self.cells.get((p.y as usize, p.x as usize))
    }

    #[inline]
    pub fn get_mut(&mut self, p: IVec2) -> Option<&mut Cell> {
        if !self.is_valid_coord(p) {
            return None;
        }

        self.cells.get_mut((p.y as usize, p.x as usize))
    }

    /// Adds to the density already stored at `p` instead of overwriting it.
    #[inline]
    pub fn add_density(&mut self, p: IVec2, amount: f32) {
        self.cells[(p.y as usize, p.x as usize)].density += amount;
    }

    pub fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    pub fn copy_from(&mut self, other: &GridBuffer) {
        self.cells.assign(&other.cells);
    }

    /// The raw cell array, indexed `[(y, x)]`.
    #[inline]
    pub fn cells(&self) -> &Array2<Cell> {
        &self.cells
    }

    #[inline]
    pub fn cells_mut(&mut self) -> &mut Array2<Cell> {
        &mut self.cells
    }

    /// Iterates over all cells in row-major order together with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (IVec2, &Cell)> {
        self.cells
            .indexed_iter()
            .map(|((y, x), cell)| (IVec2::new(x as i32, y as i32), cell))
    }

    pub fn total_density(&self) -> f32 {
        self.cells.iter().map(|c| c.density).sum()
    }
}

/// Which of the two buffers is read during the next sub-step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Role {
    #[default]
    AlphaInput,
    BetaInput,
}

impl Role {
    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            Role::AlphaInput => Role::BetaInput,
            Role::BetaInput => Role::AlphaInput,
        }
    }
}

/// The two ping-pong buffers.
///
/// Each sub-step reads the input buffer and writes the output buffer, then [`GridStore::swap`]
/// turns the freshly written buffer into the next input. After a swap the input buffer is
/// therefore always the most recently completed one.
#[derive(Debug, Clone)]
pub struct GridStore {
    alpha: GridBuffer,
    beta: GridBuffer,
    role: Role,
}

impl GridStore {
    pub fn new(size: u32) -> Self {
        Self {
            alpha: GridBuffer::new(size),
            beta: GridBuffer::new(size),
            role: Role::default(),
        }
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.alpha.size()
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    #[inline]
    pub fn alpha(&self) -> &GridBuffer {
        &self.alpha
    }

    #[inline]
    pub fn beta(&self) -> &GridBuffer {
        &self.beta
    }

    #[inline]
    pub fn input(&self) -> &GridBuffer {
        match self.role {
            Role::AlphaInput => &self.alpha,
            Role::BetaInput => &self.beta,
        }
    }

    /// Mutable access to the input buffer, for passes that run in place between sub-steps.
    #[inline]
    pub fn input_mut(&mut self) -> &mut GridBuffer {
        match self.role {
            Role::AlphaInput => &mut self.alpha,
            Role::BetaInput => &mut self.beta,
        }
    }

    /// Splits the store into the frozen input and the output of the next sub-step.
    #[inline]
    pub fn split(&mut self) -> (&GridBuffer, &mut GridBuffer) {
        match self.role {
            Role::AlphaInput => (&self.alpha, &mut self.beta),
            Role::BetaInput => (&self.beta, &mut self.alpha),
        }
    }

    #[inline]
    pub fn swap(&mut self) {
        self.role = self.role.flipped();
    }

    /// The most recently completed buffer.
    #[inline]
    pub fn latest(&self) -> &GridBuffer {
        self.input()
    }

    /// Writes `initial` into both buffers and resets the roles.
    pub fn reset_to(&mut self, initial: &GridBuffer) {
        self.alpha.copy_from(initial);
        self.beta.copy_from(initial);
        self.role = Role::default();
    }

    pub fn clear(&mut self) {
        self.alpha.fill(Cell::EMPTY);
        self.beta.fill(Cell::EMPTY);
        self.role = Role::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_is_row_major() {
        let mut grid = GridBuffer::new(4);
        grid.write(IVec2::new(1, 2), Cell::with_density(7.0));

        assert_eq!(grid.index(IVec2::new(1, 2)), 9);
        let (p, cell) = grid.iter().nth(9).unwrap();
        assert_eq!(p, IVec2::new(1, 2));
        assert_eq!(cell.density, 7.0);
    }

    #[test]
    fn valid_coords() {
        let grid = GridBuffer::new(4);

        assert!(grid.is_valid_coord(IVec2::new(0, 0)));
        assert!(grid.is_valid_coord(IVec2::new(3, 3)));
        assert!(!grid.is_valid_coord(IVec2::new(-1, 0)));
        assert!(!grid.is_valid_coord(IVec2::new(0, 4)));
        assert!(grid.get(IVec2::new(4, 0)).is_none());
    }

    #[test]
    fn add_density_accumulates() {
        let mut grid = GridBuffer::new(2);
        grid.write(IVec2::new(1, 1), Cell::with_density(1.5));
        grid.add_density(IVec2::new(1, 1), 2.0);

        assert_eq!(grid.read(IVec2::new(1, 1)).density, 3.5);
    }

    #[test]
    fn swap_alternates_buffers() {
        let mut store = GridStore::new(2);

        {
            let (input, output) = store.split();
            assert_eq!(input.total_density(), 0.0);
            output.write(IVec2::ZERO, Cell::with_density(1.0));
        }
        assert_eq!(store.role(), Role::AlphaInput);
        assert_eq!(store.input().total_density(), 0.0);

        store.swap();
        assert_eq!(store.role(), Role::BetaInput);
        assert_eq!(store.latest().read(IVec2::ZERO).density, 1.0);
        assert_eq!(store.beta().read(IVec2::ZERO).density, 1.0);
        assert_eq!(store.alpha().read(IVec2::ZERO).density, 0.0);
    }

    #[test]
    fn from_cells_checks_length() {
        assert!(GridBuffer::from_cells(2, vec![Cell::EMPTY; 3]).is_none());
        assert!(GridBuffer::from_cells(2, vec![Cell::EMPTY; 4]).is_some());
    }
}
