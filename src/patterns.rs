// patterns.rs - Named patterns a level may offer in its library

/// Cells are `(dx, dy)` offsets from the placement anchor.
pub struct Pattern {
    pub name: &'static str,
    pub cells: &'static [(usize, usize)],
}

pub const PATTERNS: &[Pattern] = &[
    Pattern {
        name: "block",
        cells: &[(0, 0), (1, 0), (0, 1), (1, 1)],
    },
    Pattern {
        name: "blinker",
        cells: &[(0, 0), (1, 0), (2, 0)],
    },
    Pattern {
        name: "glider",
        cells: &[(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)],
    },
    Pattern {
        name: "toad",
        cells: &[(1, 0), (2, 0), (3, 0), (0, 1), (1, 1), (2, 1)],
    },
    Pattern {
        name: "beacon",
        cells: &[(0, 0), (1, 0), (0, 1), (1, 1), (2, 2), (3, 2), (2, 3), (3, 3)],
    },
    Pattern {
        name: "r-pentomino",
        cells: &[(1, 0), (2, 0), (0, 1), (1, 1), (1, 2)],
    },
];

pub fn find(name: &str) -> Option<&'static Pattern> {
    PATTERNS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

impl Pattern {
    /// Absolute coordinates when anchored at `(x, y)`, or `None` for a
    /// cell that would land past `usize::MAX`.
    pub fn placed_at(&self, x: usize, y: usize) -> impl Iterator<Item = Option<(usize, usize)>> + use<> {
        let cells: &'static [(usize, usize)] = self.cells;
        cells
            .iter()
            .map(move |&(dx, dy)| Some((x.checked_add(dx)?, y.checked_add(dy)?)))
    }
}
