use std::env;
use std::fs;

use anyhow::Context;
use engine::{Compartment, Engine, Parameters, SeirdRule};
use serde::Serialize;

const GRID_ROWS: usize = 60;
const GRID_COLS: usize = 60;
const GENERATIONS: u64 = 120;
const INITIAL_INFECTED: usize = 12;
const LOG_EVERY: u64 = 10;

/// Per-generation compartment counts, the batch run's unit of output.
#[derive(Debug, Serialize)]
struct Census {
    generation: u64,
    susceptible: usize,
    exposed: usize,
    infected: usize,
    recovered: usize,
    dead: usize,
}

impl Census {
    fn of(engine: &Engine<SeirdRule>) -> Self {
        let mut census = Census {
            generation: engine.generation(),
            susceptible: 0,
            exposed: 0,
            infected: 0,
            recovered: 0,
            dead: 0,
        };
        for (_, _, cell) in engine.cells() {
            match cell.state {
                Compartment::Susceptible => census.susceptible += 1,
                Compartment::Exposed => census.exposed += 1,
                Compartment::Infected => census.infected += 1,
                Compartment::Recovered => census.recovered += 1,
                Compartment::Dead => census.dead += 1,
            }
        }
        census
    }
}

fn load_parameters() -> anyhow::Result<Parameters> {
    match env::args().nth(1) {
        Some(path) => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("read parameter file {path}"))?;
            let params = serde_json::from_str(&text)
                .with_context(|| format!("parse parameter file {path}"))?;
            Ok(params)
        }
        None => Ok(Parameters::default()),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let params = load_parameters()?;
    let rule = SeirdRule::new(params).context("invalid parameters")?;
    let mut engine = Engine::new(GRID_ROWS, GRID_COLS, rule).context("build engine")?;

    let placed = engine.seed_random(Compartment::Infected, INITIAL_INFECTED);
    log::info!("seeded {placed} infected cells on a {GRID_ROWS}x{GRID_COLS} grid");

    // The run advances the live grid; keep a backup so it can be put
    // back once the census series has been recorded.
    let backup = engine.snapshot();

    let mut censuses = Vec::with_capacity(GENERATIONS as usize + 1);
    censuses.push(Census::of(&engine));
    for _ in 0..GENERATIONS {
        engine.step();
        let census = Census::of(&engine);
        if engine.generation() % LOG_EVERY == 0 {
            log::info!(
                "generation {}: {} infected, {} recovered, {} dead",
                census.generation,
                census.infected,
                census.recovered,
                census.dead
            );
        }
        censuses.push(census);
    }

    engine
        .restore(backup)
        .context("restore pre-run snapshot")?;
    log::info!("grid restored to its pre-run state");

    println!("{}", serde_json::to_string_pretty(&censuses)?);
    Ok(())
}
