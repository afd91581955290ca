use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Offsets of the 8-connected (Moore) neighborhood.
const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// One grid square: a rule-specific state plus the countdown of the
/// state's internal sub-phase (incubation or infectious window).
///
/// The timer is always 0 for states without a sub-phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cell<S> {
    pub state: S,
    pub timer: u32,
}

/// Rectangular arrangement of cells, `rows x cols`, with rows as the
/// outer index. Dimensions are fixed for the grid's lifetime; resizing
/// means building a new grid.
///
/// Edges truncate: cells on the border simply have fewer neighbors, the
/// grid does not wrap around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grid<S> {
    rows: usize,
    cols: usize,
    cells: Vec<Vec<Cell<S>>>,
}

impl<S: Copy + Eq + Default> Grid<S> {
    /// Creates a grid with every cell in the default state.
    pub fn new(rows: usize, cols: usize) -> Result<Self, EngineError> {
        if rows == 0 || cols == 0 {
            return Err(EngineError::InvalidDimensions { rows, cols });
        }
        Ok(Self {
            rows,
            cols,
            cells: vec![vec![Cell::default(); cols]; rows],
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn check_bounds(&self, row: usize, col: usize) -> Result<(), EngineError> {
        if row >= self.rows || col >= self.cols {
            return Err(EngineError::OutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(())
    }

    /// Returns the cell at `(row, col)`, rejecting coordinates outside
    /// the grid.
    pub fn get(&self, row: usize, col: usize) -> Result<Cell<S>, EngineError> {
        self.check_bounds(row, col)?;
        Ok(self.cells[row][col])
    }

    /// Unchecked read. Panics outside the grid; prefer [`Grid::get`] for
    /// caller-supplied coordinates.
    pub fn cell(&self, row: usize, col: usize) -> &Cell<S> {
        &self.cells[row][col]
    }

    /// Unchecked write access. Panics outside the grid.
    pub fn cell_mut(&mut self, row: usize, col: usize) -> &mut Cell<S> {
        &mut self.cells[row][col]
    }

    /// Manual paint: sets the state and discards any pending countdown.
    pub fn set(&mut self, row: usize, col: usize, state: S) -> Result<(), EngineError> {
        self.set_cell(row, col, Cell { state, timer: 0 })
    }

    /// Full-cell write, timer included.
    pub fn set_cell(&mut self, row: usize, col: usize, cell: Cell<S>) -> Result<(), EngineError> {
        self.check_bounds(row, col)?;
        self.cells[row][col] = cell;
        Ok(())
    }

    /// In-bounds Moore neighbor coordinates of `(row, col)`, center
    /// excluded.
    pub fn neighbors(&self, row: usize, col: usize) -> impl Iterator<Item = (usize, usize)> {
        let (rows, cols) = (self.rows, self.cols);
        NEIGHBOR_OFFSETS.iter().filter_map(move |&(dr, dc)| {
            let nr = row.checked_add_signed(dr)?;
            let nc = col.checked_add_signed(dc)?;
            (nr < rows && nc < cols).then_some((nr, nc))
        })
    }

    /// Counts Moore neighbors whose state satisfies `predicate`.
    ///
    /// Neighbors outside the grid are skipped; a center outside the grid
    /// is an error.
    pub fn count_neighbors(
        &self,
        row: usize,
        col: usize,
        predicate: impl Fn(S) -> bool,
    ) -> Result<usize, EngineError> {
        self.check_bounds(row, col)?;
        Ok(self
            .neighbors(row, col)
            .filter(|&(nr, nc)| predicate(self.cells[nr][nc].state))
            .count())
    }

    /// Row-major iteration over every cell.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &Cell<S>)> {
        self.cells.iter().enumerate().flat_map(|(r, row)| {
            row.iter().enumerate().map(move |(c, cell)| (r, c, cell))
        })
    }

    /// Number of cells currently in `state`.
    pub fn population(&self, state: S) -> usize {
        self.cells().filter(|(_, _, cell)| cell.state == state).count()
    }

    /// Sets every cell to `state` with a zeroed timer.
    pub fn fill(&mut self, state: S) {
        for row in &mut self.cells {
            for cell in row {
                *cell = Cell { state, timer: 0 };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::CellState::{self, Alive};

    fn all_alive(rows: usize, cols: usize) -> Grid<CellState> {
        let mut grid = Grid::new(rows, cols).unwrap();
        grid.fill(Alive);
        grid
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert_eq!(
            Grid::<CellState>::new(0, 5),
            Err(EngineError::InvalidDimensions { rows: 0, cols: 5 })
        );
        assert_eq!(
            Grid::<CellState>::new(5, 0),
            Err(EngineError::InvalidDimensions { rows: 5, cols: 0 })
        );
    }

    #[test]
    fn get_and_set_reject_out_of_bounds() {
        let mut grid = Grid::<CellState>::new(3, 4).unwrap();
        let err = EngineError::OutOfBounds {
            row: 3,
            col: 0,
            rows: 3,
            cols: 4,
        };
        assert_eq!(grid.get(3, 0), Err(err.clone()));
        assert_eq!(grid.set(3, 0, Alive), Err(err));
        assert!(grid.get(2, 4).is_err());
        assert!(grid.count_neighbors(2, 4, |s| s == Alive).is_err());
    }

    #[test]
    fn center_of_full_grid_has_eight_live_neighbors() {
        let grid = all_alive(3, 3);
        assert_eq!(grid.count_neighbors(1, 1, |s| s == Alive).unwrap(), 8);
    }

    #[test]
    fn corner_of_full_grid_has_three_live_neighbors() {
        let grid = all_alive(3, 3);
        assert_eq!(grid.count_neighbors(0, 0, |s| s == Alive).unwrap(), 3);
        assert_eq!(grid.count_neighbors(2, 2, |s| s == Alive).unwrap(), 3);
    }

    #[test]
    fn edge_of_full_grid_has_five_live_neighbors() {
        let grid = all_alive(3, 3);
        assert_eq!(grid.count_neighbors(0, 1, |s| s == Alive).unwrap(), 5);
    }

    #[test]
    fn set_discards_pending_timer() {
        let mut grid = Grid::<CellState>::new(2, 2).unwrap();
        grid.set_cell(0, 0, Cell { state: Alive, timer: 4 }).unwrap();
        assert_eq!(grid.get(0, 0).unwrap().timer, 4);
        grid.set(0, 0, Alive).unwrap();
        assert_eq!(grid.get(0, 0).unwrap().timer, 0);
    }

    #[test]
    fn cells_iterates_row_major() {
        let mut grid = Grid::<CellState>::new(2, 3).unwrap();
        grid.set(1, 2, Alive).unwrap();
        let coords: Vec<_> = grid.cells().map(|(r, c, _)| (r, c)).collect();
        assert_eq!(coords, vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]);
        assert_eq!(grid.population(Alive), 1);
        assert_eq!(grid.population(CellState::Dead), 5);
    }
}
