use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::grid::{Cell, Grid};
use crate::rule::{Rule, Swap};

/// SEIRD compartments. Every cell occupies exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Compartment {
    #[default]
    Susceptible,
    Exposed,
    Infected,
    Recovered,
    Dead,
}

/// Epidemic parameters, uniform across the grid.
///
/// Probabilities are per step (mortality, recovery, mobility) or per
/// infectious contact (infection); periods are measured in steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// Chance that a single infectious contact transmits, per step.
    pub infection_probability: f64,
    /// Chance of recovering once the infectious window has run out.
    pub recovery_probability: f64,
    /// Chance of dying on any step while infected.
    pub mortality_probability: f64,
    /// Steps spent exposed before becoming infectious.
    pub incubation_period: u32,
    /// Steps spent infectious before a recovery roll.
    pub infectious_period: u32,
    /// Chance a cell trades places with a random neighbor, per step.
    pub mobility_rate: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            infection_probability: 0.3,
            recovery_probability: 0.6,
            mortality_probability: 0.02,
            incubation_period: 3,
            infectious_period: 5,
            mobility_rate: 0.0,
        }
    }
}

impl Parameters {
    /// Rejects values outside their documented ranges; nothing is
    /// clamped. Probabilities must lie in [0, 1] and the infectious
    /// window must last at least one step.
    pub fn validate(&self) -> Result<(), EngineError> {
        for (name, value) in [
            ("infection_probability", self.infection_probability),
            ("recovery_probability", self.recovery_probability),
            ("mortality_probability", self.mortality_probability),
            ("mobility_rate", self.mobility_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::InvalidParameter { name, value });
            }
        }
        if self.infectious_period == 0 {
            return Err(EngineError::InvalidParameter {
                name: "infectious_period",
                value: 0.0,
            });
        }
        Ok(())
    }
}

/// Stochastic SEIRD rule: probabilistic infection, timer-driven
/// incubation and infectious windows, a per-step mortality roll, and
/// optional mobility swaps.
///
/// Transitions are not reversible and stepping twice is not stepping
/// once twice as hard; undo support comes from the engine's history
/// snapshots, not from inverting the rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeirdRule {
    params: Parameters,
}

impl SeirdRule {
    /// Builds the rule, validating the parameter set.
    pub fn new(params: Parameters) -> Result<Self, EngineError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    pub(crate) fn set_parameters(&mut self, params: Parameters) -> Result<(), EngineError> {
        params.validate()?;
        self.params = params;
        Ok(())
    }
}

impl Default for SeirdRule {
    fn default() -> Self {
        Self {
            params: Parameters::default(),
        }
    }
}

impl Rule for SeirdRule {
    type State = Compartment;

    fn transition<G: Rng>(
        &self,
        prev: &Grid<Compartment>,
        row: usize,
        col: usize,
        rng: &mut G,
    ) -> Cell<Compartment> {
        let cell = *prev.cell(row, col);
        let p = &self.params;
        match cell.state {
            Compartment::Susceptible => {
                let infectious = prev
                    .neighbors(row, col)
                    .filter(|&(r, c)| prev.cell(r, c).state == Compartment::Infected)
                    .count();
                if infectious > 0 {
                    // Complement of escaping every infectious contact
                    // independently.
                    let infection =
                        1.0 - (1.0 - p.infection_probability).powi(infectious as i32);
                    if rng.random::<f64>() < infection {
                        return Cell {
                            state: Compartment::Exposed,
                            timer: p.incubation_period,
                        };
                    }
                }
                Cell {
                    state: Compartment::Susceptible,
                    timer: 0,
                }
            }
            Compartment::Exposed => {
                if cell.timer <= 1 {
                    Cell {
                        state: Compartment::Infected,
                        timer: p.infectious_period,
                    }
                } else {
                    Cell {
                        state: Compartment::Exposed,
                        timer: cell.timer - 1,
                    }
                }
            }
            Compartment::Infected => {
                // Mortality is rolled every step, before the timer is
                // consulted.
                if rng.random::<f64>() < p.mortality_probability {
                    return Cell {
                        state: Compartment::Dead,
                        timer: 0,
                    };
                }
                if cell.timer <= 1 {
                    if rng.random::<f64>() < p.recovery_probability {
                        Cell {
                            state: Compartment::Recovered,
                            timer: 0,
                        }
                    } else {
                        // A failed recovery re-arms the full infectious
                        // window.
                        Cell {
                            state: Compartment::Infected,
                            timer: p.infectious_period,
                        }
                    }
                } else {
                    Cell {
                        state: Compartment::Infected,
                        timer: cell.timer - 1,
                    }
                }
            }
            // Absorbing states: no reinfection, no revival.
            Compartment::Recovered | Compartment::Dead => Cell {
                state: cell.state,
                timer: 0,
            },
        }
    }

    /// Scans the frozen grid row-major. A cell that has not already been
    /// claimed by an earlier swap rolls mobility; on success it picks one
    /// uniformly random in-bounds neighbor. If that partner is still
    /// unclaimed the pair is recorded and both cells are done for the
    /// step; a claimed partner means no move, and the cell is processed
    /// by the rule as usual.
    fn plan_swaps<G: Rng>(&self, prev: &Grid<Compartment>, rng: &mut G) -> Vec<Swap> {
        if self.params.mobility_rate <= 0.0 {
            return Vec::new();
        }
        let (rows, cols) = prev.dimensions();
        let mut claimed = vec![false; rows * cols];
        let mut swaps = Vec::new();
        for row in 0..rows {
            for col in 0..cols {
                if claimed[row * cols + col] {
                    continue;
                }
                if rng.random::<f64>() >= self.params.mobility_rate {
                    continue;
                }
                let neighbors: Vec<_> = prev.neighbors(row, col).collect();
                if neighbors.is_empty() {
                    continue;
                }
                let (nr, nc) = neighbors[rng.random_range(0..neighbors.len())];
                if claimed[nr * cols + nc] {
                    continue;
                }
                claimed[row * cols + col] = true;
                claimed[nr * cols + nc] = true;
                swaps.push(((row, col), (nr, nc)));
            }
        }
        swaps
    }
}
