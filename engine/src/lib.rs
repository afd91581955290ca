/**
* A susceptible cell can catch the disease from infected neighbors.
* An exposed cell incubates for a while before becoming infectious.
* An infected cell may die on any step, and may recover once its
* infectious window runs out.
* Recovered and dead cells stay that way.
*
* The classic birth/survival rules are available too, so the same grid,
* history and seeding machinery also runs Conway's Game of Life.
*/

pub mod engine;
pub mod error;
pub mod grid;
pub mod history;
pub mod rule;
pub mod seird;

pub use crate::engine::Engine;
pub use crate::error::EngineError;
pub use crate::grid::{Cell, Grid};
pub use crate::history::History;
pub use crate::rule::{CellState, LifeRule, Rule, Swap};
pub use crate::seird::{Compartment, Parameters, SeirdRule};
