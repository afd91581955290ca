use std::mem;

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::EngineError;
use crate::grid::{Cell, Grid};
use crate::history::History;
use crate::rule::Rule;
use crate::seird::{Parameters, SeirdRule};

/// Owns the grid, the active rule, the undo history and the random
/// source, and advances the automaton one generation at a time.
///
/// All neighbor reads during a step observe the frozen previous
/// generation; the next grid is materialized alongside it and committed
/// only once every cell is decided. Nothing outside the engine can
/// mutate the grid mid-step.
#[derive(Debug)]
pub struct Engine<R: Rule, G: Rng = StdRng> {
    grid: Grid<R::State>,
    rule: R,
    history: History<R::State>,
    rng: G,
    generation: u64,
}

impl<R: Rule> Engine<R> {
    /// Engine with an OS-seeded generator.
    pub fn new(rows: usize, cols: usize, rule: R) -> Result<Self, EngineError> {
        Self::with_rng(rows, cols, rule, StdRng::from_os_rng())
    }
}

impl<R: Rule, G: Rng> Engine<R, G> {
    /// Engine with an injected generator; seed it for reproducible runs.
    pub fn with_rng(rows: usize, cols: usize, rule: R, rng: G) -> Result<Self, EngineError> {
        Ok(Self {
            grid: Grid::new(rows, cols)?,
            rule,
            history: History::new(),
            rng,
            generation: 0,
        })
    }

    /// Advances one generation.
    ///
    /// The current grid is deep-copied onto the history stack, mobility
    /// swaps are planned against it, and every remaining cell's successor
    /// is computed from it alone before the new grid replaces it.
    pub fn step(&mut self) {
        let (rows, cols) = self.grid.dimensions();
        let prev = self.grid.clone();
        let swaps = self.rule.plan_swaps(&prev, &mut self.rng);

        let mut swapped = vec![false; rows * cols];
        for &((ar, ac), (br, bc)) in &swaps {
            swapped[ar * cols + ac] = true;
            swapped[br * cols + bc] = true;
        }

        let mut next = prev.clone();
        for row in 0..rows {
            for col in 0..cols {
                if swapped[row * cols + col] {
                    continue;
                }
                *next.cell_mut(row, col) = self.rule.transition(&prev, row, col, &mut self.rng);
            }
        }
        for &((ar, ac), (br, bc)) in &swaps {
            *next.cell_mut(ar, ac) = *prev.cell(br, bc);
            *next.cell_mut(br, bc) = *prev.cell(ar, ac);
        }

        self.history.push(mem::replace(&mut self.grid, next));
        self.generation += 1;
        debug!("advanced to generation {}", self.generation);
    }

    /// Restores the previous generation. Returns `false` when there is
    /// nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some(grid) => {
                self.grid = grid;
                self.generation = self.generation.saturating_sub(1);
                true
            }
            None => false,
        }
    }

    /// Clears the grid back to the default state and empties the history.
    pub fn reset(&mut self) {
        self.grid.fill(R::State::default());
        self.history.clear();
        self.generation = 0;
        debug!("reset to an empty grid");
    }

    /// Scatters `count` cells of `state` over default-state coordinates.
    ///
    /// Occupied coordinates are resampled, bounded by a `20 * count`
    /// attempt budget, so a saturated grid yields fewer placements rather
    /// than an error. Returns the number actually placed.
    pub fn seed_random(&mut self, state: R::State, count: usize) -> usize {
        let (rows, cols) = self.grid.dimensions();
        let budget = count.saturating_mul(20);
        let mut placed = 0;
        for _ in 0..budget {
            if placed == count {
                break;
            }
            let row = self.rng.random_range(0..rows);
            let col = self.rng.random_range(0..cols);
            if self.grid.cell(row, col).state != R::State::default() {
                continue;
            }
            *self.grid.cell_mut(row, col) = Cell { state, timer: 0 };
            placed += 1;
        }
        if placed < count {
            warn!("placed {placed} of {count} requested cells before the retry budget ran out");
        }
        placed
    }

    /// Manual paint of a single cell; any pending countdown is discarded.
    pub fn edit_cell(&mut self, row: usize, col: usize, state: R::State) -> Result<(), EngineError> {
        self.grid.set(row, col, state)
    }

    pub fn get_state(&self, row: usize, col: usize) -> Result<R::State, EngineError> {
        Ok(self.grid.get(row, col)?.state)
    }

    pub fn dimensions(&self) -> (usize, usize) {
        self.grid.dimensions()
    }

    /// Steps taken since construction or the last reset, net of undos.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn grid(&self) -> &Grid<R::State> {
        &self.grid
    }

    /// Row-major iteration over every cell, for rendering or export.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &Cell<R::State>)> {
        self.grid.cells()
    }

    pub fn population(&self, state: R::State) -> usize {
        self.grid.population(state)
    }

    pub fn rule(&self) -> &R {
        &self.rule
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Caps the undo depth; 0 (the default) keeps every snapshot.
    pub fn set_history_limit(&mut self, limit: usize) {
        self.history.set_limit(limit);
    }

    /// Deep copy of the current grid, for collaborators that advance the
    /// engine and put it back afterwards.
    pub fn snapshot(&self) -> Grid<R::State> {
        self.grid.clone()
    }

    /// Replaces the current grid with a snapshot of matching dimensions.
    ///
    /// The history stack is left alone: entries pushed since the snapshot
    /// was taken remain undoable.
    pub fn restore(&mut self, snapshot: Grid<R::State>) -> Result<(), EngineError> {
        let (rows, cols) = snapshot.dimensions();
        let (expected_rows, expected_cols) = self.grid.dimensions();
        if (rows, cols) != (expected_rows, expected_cols) {
            return Err(EngineError::SnapshotShape {
                rows,
                cols,
                expected_rows,
                expected_cols,
            });
        }
        self.grid = snapshot;
        Ok(())
    }
}

impl<G: Rng> Engine<SeirdRule, G> {
    /// Swaps in a new parameter set, effective from the next step.
    pub fn set_parameters(&mut self, params: Parameters) -> Result<(), EngineError> {
        self.rule.set_parameters(params)
    }

    pub fn parameters(&self) -> &Parameters {
        self.rule.parameters()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::rule::{CellState, LifeRule};
    use crate::seird::Compartment;

    fn seird_engine(seed: u64) -> Engine<SeirdRule, StdRng> {
        let params = Parameters {
            infection_probability: 0.5,
            recovery_probability: 0.4,
            mortality_probability: 0.1,
            incubation_period: 2,
            infectious_period: 3,
            mobility_rate: 0.2,
        };
        let mut engine = Engine::with_rng(
            8,
            8,
            SeirdRule::new(params).unwrap(),
            StdRng::seed_from_u64(seed),
        )
        .unwrap();
        engine.seed_random(Compartment::Infected, 6);
        engine
    }

    #[test]
    fn undo_round_trip_restores_the_starting_grid() {
        let mut engine = seird_engine(11);
        let before = engine.grid().clone();
        for _ in 0..5 {
            engine.step();
        }
        for _ in 0..5 {
            assert!(engine.undo());
        }
        assert_eq!(engine.grid(), &before);
        assert_eq!(engine.generation(), 0);
    }

    #[test]
    fn undo_round_trip_holds_for_the_life_rule() {
        let mut engine =
            Engine::with_rng(6, 6, LifeRule::conway(), StdRng::seed_from_u64(3)).unwrap();
        engine.seed_random(CellState::Alive, 10);
        let before = engine.grid().clone();
        for _ in 0..4 {
            engine.step();
        }
        for _ in 0..4 {
            assert!(engine.undo());
        }
        assert_eq!(engine.grid(), &before);
    }

    #[test]
    fn undo_on_empty_history_is_a_quiet_no_op() {
        let mut engine = seird_engine(11);
        assert!(!engine.undo());
        assert_eq!(engine.generation(), 0);
    }

    #[test]
    fn reset_is_idempotent_and_clears_history() {
        let mut engine = seird_engine(11);
        for _ in 0..3 {
            engine.step();
        }
        engine.reset();
        let once = engine.grid().clone();
        assert_eq!(engine.history_len(), 0);
        assert_eq!(engine.generation(), 0);
        assert_eq!(engine.population(Compartment::Susceptible), 64);

        engine.reset();
        assert_eq!(engine.grid(), &once);
        assert_eq!(engine.history_len(), 0);
    }

    #[test]
    fn oversubscribed_seeding_stops_at_the_available_cells() {
        let mut engine = Engine::with_rng(
            2,
            2,
            SeirdRule::default(),
            StdRng::seed_from_u64(5),
        )
        .unwrap();
        let placed = engine.seed_random(Compartment::Infected, 50);
        assert!(placed <= 4);
        assert_eq!(engine.population(Compartment::Infected), placed);
        assert_eq!(engine.population(Compartment::Susceptible), 4 - placed);
    }

    #[test]
    fn seeding_skips_occupied_cells() {
        let mut engine = seird_engine(11);
        let infected = engine.population(Compartment::Infected);
        assert_eq!(infected, 6);
        let placed = engine.seed_random(Compartment::Recovered, 10);
        assert_eq!(placed, 10);
        assert_eq!(engine.population(Compartment::Infected), 6);
        assert_eq!(engine.population(Compartment::Recovered), 10);
    }

    #[test]
    fn set_parameters_validates_and_replaces() {
        let mut engine = seird_engine(11);
        let mut params = engine.parameters().clone();
        params.mortality_probability = 2.0;
        assert_eq!(
            engine.set_parameters(params),
            Err(EngineError::InvalidParameter {
                name: "mortality_probability",
                value: 2.0,
            })
        );

        let replacement = Parameters {
            mobility_rate: 0.0,
            ..Parameters::default()
        };
        engine.set_parameters(replacement.clone()).unwrap();
        assert_eq!(engine.parameters(), &replacement);
    }

    #[test]
    fn snapshot_restore_round_trips() {
        let mut engine = seird_engine(11);
        let backup = engine.snapshot();
        for _ in 0..4 {
            engine.step();
        }
        engine.restore(backup.clone()).unwrap();
        assert_eq!(engine.grid(), &backup);
    }

    #[test]
    fn restore_rejects_mismatched_dimensions() {
        let mut engine = seird_engine(11);
        let foreign = Grid::<Compartment>::new(3, 3).unwrap();
        assert_eq!(
            engine.restore(foreign),
            Err(EngineError::SnapshotShape {
                rows: 3,
                cols: 3,
                expected_rows: 8,
                expected_cols: 8,
            })
        );
    }

    #[test]
    fn history_limit_caps_undo_depth() {
        let mut engine = seird_engine(11);
        engine.set_history_limit(2);
        for _ in 0..5 {
            engine.step();
        }
        assert_eq!(engine.history_len(), 2);
        assert!(engine.undo());
        assert!(engine.undo());
        assert!(!engine.undo());
    }

    #[test]
    fn edit_cell_rejects_out_of_bounds() {
        let mut engine = seird_engine(11);
        assert!(engine.edit_cell(8, 0, Compartment::Infected).is_err());
        assert!(engine.get_state(0, 8).is_err());
    }

    proptest! {
        #[test]
        fn undo_always_rewinds_any_stochastic_run(seed in any::<u64>(), steps in 1usize..8) {
            let mut engine = seird_engine(seed);
            let before = engine.grid().clone();
            for _ in 0..steps {
                engine.step();
            }
            for _ in 0..steps {
                prop_assert!(engine.undo());
            }
            prop_assert_eq!(engine.grid(), &before);
        }
    }
}
