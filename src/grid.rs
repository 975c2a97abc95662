// grid.rs - Arena: the fully populated boolean grid of one generation

/// Cell coordinate, `x` is the column and `y` the row.
pub type Coord = (usize, usize);

/// Moore neighbourhood offsets, self excluded.
const NEIGHBOURS: [(isize, isize); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1,  0),          (1,  0),
    (-1,  1), (0,  1), (1,  1),
];

/// Row-major grid of cell states. Every cell is always defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arena {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl Arena {
    /// All-dead arena of the given dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, cells: vec![false; width * height] }
    }

    /// Builds an arena and marks every seed coordinate alive.
    ///
    /// Returns the first seed coordinate outside the arena, if any. Callers
    /// validate seeds up front so this never silently drops a cell.
    pub fn from_seed(width: usize, height: usize, seed: &[Coord]) -> Result<Self, Coord> {
        let mut arena = Self::new(width, height);
        for &(x, y) in seed {
            if !arena.set(x, y, true) {
                return Err((x, y));
            }
        }
        Ok(arena)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        self.in_bounds(x, y).then(|| y * self.width + x)
    }

    /// Cell state, `None` outside the arena.
    pub fn get(&self, x: usize, y: usize) -> Option<bool> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// Alive check that treats everything outside the arena as dead.
    pub fn is_alive(&self, x: usize, y: usize) -> bool {
        self.get(x, y).unwrap_or(false)
    }

    /// Sets a cell. Returns `false` (and changes nothing) outside the arena.
    pub fn set(&mut self, x: usize, y: usize, alive: bool) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.cells[i] = alive;
                true
            }
            None => false,
        }
    }

    /// Flips a cell and returns its new state.
    pub fn toggle(&mut self, x: usize, y: usize) -> Option<bool> {
        let i = self.index(x, y)?;
        self.cells[i] = !self.cells[i];
        Some(self.cells[i])
    }

    /// Living cells among the in-bounds Moore neighbours. No wraparound.
    pub fn live_neighbours(&self, x: usize, y: usize) -> u8 {
        NEIGHBOURS
            .iter()
            .filter_map(|&(dx, dy)| {
                let nx = x.checked_add_signed(dx)?;
                let ny = y.checked_add_signed(dy)?;
                self.get(nx, ny)
            })
            .filter(|&alive| alive)
            .count() as u8
    }

    /// Coordinates of every living cell, row by row.
    pub fn live_cells(&self) -> impl Iterator<Item = Coord> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &alive)| alive)
            .map(|(i, _)| (i % self.width, i / self.width))
    }

    pub fn population(&self) -> usize {
        self.cells.iter().filter(|&&alive| alive).count()
    }

    /// Every coordinate of the arena, row by row.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + use<> {
        let (width, height) = (self.width, self.height);
        (0..height).flat_map(move |y| (0..width).map(move |x| (x, y)))
    }
}
