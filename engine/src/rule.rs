use std::fmt::Debug;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::grid::{Cell, Grid};

/// A planned exchange of two cells' contents for the upcoming generation.
pub type Swap = ((usize, usize), (usize, usize));

/// A pluggable per-cell transition policy.
///
/// Implementations read exclusively from the frozen previous-generation
/// grid they are handed; the grid under construction is owned by the
/// engine and never visible mid-step.
pub trait Rule {
    /// Cell state set. `Default` is the quiescent state that `reset`
    /// fills with and that seeding treats as empty.
    type State: Copy + Eq + Default + Debug;

    /// Computes the successor of the cell at `(row, col)` from the
    /// previous grid.
    fn transition<G: Rng>(
        &self,
        prev: &Grid<Self::State>,
        row: usize,
        col: usize,
        rng: &mut G,
    ) -> Cell<Self::State>;

    /// Collects mobility swap pairs from the previous grid. Cells named
    /// in a pair are exchanged verbatim into the next grid and skip
    /// [`Rule::transition`] for the step. The default has no mobility.
    fn plan_swaps<G: Rng>(&self, prev: &Grid<Self::State>, rng: &mut G) -> Vec<Swap> {
        let _ = (prev, rng);
        Vec::new()
    }
}

/// Cell states for the life-like rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellState {
    #[default]
    Dead,
    Alive,
}

/// Deterministic life-like rule: birth and survival decided by the
/// live-neighbor count. Defaults to Conway's B3/S23.
///
/// A pure function of state and neighbor count; it never draws
/// randomness and leaves every timer at 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeRule {
    birth: Vec<u8>,
    survival: Vec<u8>,
}

impl LifeRule {
    /// Conway's Game of Life, B3/S23.
    pub fn conway() -> Self {
        Self::new(&[3], &[2, 3])
    }

    /// Custom birth and survival neighbor counts.
    pub fn new(birth: &[u8], survival: &[u8]) -> Self {
        Self {
            birth: birth.to_vec(),
            survival: survival.to_vec(),
        }
    }
}

impl Default for LifeRule {
    fn default() -> Self {
        Self::conway()
    }
}

impl Rule for LifeRule {
    type State = CellState;

    fn transition<G: Rng>(
        &self,
        prev: &Grid<CellState>,
        row: usize,
        col: usize,
        _rng: &mut G,
    ) -> Cell<CellState> {
        let alive = prev
            .neighbors(row, col)
            .filter(|&(r, c)| prev.cell(r, c).state == CellState::Alive)
            .count() as u8;
        let survives = match prev.cell(row, col).state {
            CellState::Alive => self.survival.contains(&alive),
            CellState::Dead => self.birth.contains(&alive),
        };
        Cell {
            state: if survives { CellState::Alive } else { CellState::Dead },
            timer: 0,
        }
    }
}
