use std::{
    fs,
    io::{self, BufRead},
    path::PathBuf,
};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::Serialize;

use crucible::{
    crucible::{outcome, solver, Outcome, RunLimits},
    Grid,
};

/// Find the path with the least heat loss through a grid of city blocks.
///
/// Input is one row of digits per line. After a blank line, an input may list
/// known answers as `<min> <max> <cost|none>`, which the result is checked
/// against.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Input file, read from stdin if not given
    input: Option<PathBuf>,

    /// Cells a crucible must move in a straight line before it can turn
    #[arg(long, default_value_t = 1)]
    min_run: usize,

    /// Cells a crucible may move in a straight line before it has to turn
    #[arg(long, default_value_t = 3)]
    max_run: usize,

    /// Ultra crucible, shorthand for --min-run 4 --max-run 10
    #[arg(long, conflicts_with_all = ["min_run", "max_run"])]
    ultra: bool,

    /// Give up after expanding this many states
    #[arg(long)]
    max_states: Option<usize>,

    /// Draw the grid with the route taken
    #[arg(long)]
    show_route: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn limits(&self) -> Result<RunLimits> {
        if self.ultra {
            return Ok(RunLimits::ULTRA);
        }

        Ok(RunLimits::new(self.min_run, self.max_run)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Known {
    limits: RunLimits,
    cost: Option<u64>,
}

// Known answers follow the grid, one `min max cost` per line
fn read_known<R: BufRead>(reader: &mut R) -> Result<Vec<Known>> {
    let mut known = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts = line.split_whitespace().collect::<Vec<_>>();
        let [min, max, cost] = parts[..] else {
            return Err(anyhow!("Invalid known answer: {line:?}"));
        };

        let limits = RunLimits::new(min.parse()?, max.parse()?)?;
        let cost = match cost {
            "none" | "-" => None,
            cost => Some(cost.parse()?),
        };

        known.push(Known { limits, cost });
    }

    Ok(known)
}

fn load(input: &str) -> Result<(Grid, Vec<Known>)> {
    let mut reader = input.as_bytes();

    let grid = Grid::read(&mut reader)?;
    let known = read_known(&mut reader)?;

    Ok((grid, known))
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct Report {
    found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    cost: Option<u64>,
}

impl From<&Outcome> for Report {
    fn from(outcome: &Outcome) -> Self {
        Report {
            found: outcome.cost().is_some(),
            cost: outcome.cost(),
        }
    }
}

fn solve(grid: &Grid, limits: RunLimits, max_states: Option<usize>) -> Result<Outcome> {
    let mut solver = solver(grid, limits);

    while let Some(state) = solver.next() {
        let state = state?;

        if solver.states_checked() % 100000 == 0 {
            log::info!("{solver}, state: {}", solver.stringify(&state));
        }

        if let Some(max_states) = max_states {
            if solver.states_checked() >= max_states && solver.get_solution().is_none() {
                return Err(anyhow!(
                    "No solution found after {} states in {} seconds",
                    solver.states_checked(),
                    solver.time_spent()
                ));
            }
        }
    }

    log::info!(
        "Finished after {} states in {} seconds",
        solver.states_checked(),
        solver.time_spent()
    );

    Ok(outcome(&solver)?)
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let limits = args.limits()?;

    let input = match &args.input {
        Some(file) => fs::read_to_string(file)
            .with_context(|| format!("Error reading file {}", file.display()))?,
        None => io::read_to_string(io::stdin()).context("Error reading stdin")?,
    };
    log::info!("Read {} bytes", input.len());

    let (grid, known) = load(&input)?;
    log::info!(
        "Loaded {}x{} grid, limits {}..={}:\n{}",
        grid.width(),
        grid.height(),
        limits.min(),
        limits.max(),
        grid.stringify(&[])
    );

    let outcome = solve(&grid, limits, args.max_states)?;

    if let Outcome::Found(route) = &outcome {
        log::info!("Route: {}", route.steps.iter().map(|s| char::from(*s)).collect::<String>());
        for state in route.states.iter() {
            log::debug!("  {state:?}");
        }
    }

    if args.json {
        println!("{}", serde_json::to_string(&Report::from(&outcome))?);
    } else {
        match &outcome {
            Outcome::Found(route) => println!("Heat loss: {}", route.cost),
            Outcome::Unreachable => println!("No path to the target found"),
        }
    }

    if args.show_route {
        if let Outcome::Found(route) = &outcome {
            println!("{}", grid.stringify(&route.cells()));
        }
    }

    // Check against known answers
    for known in known.iter().filter(|k| k.limits == limits) {
        if known.cost != outcome.cost() {
            log::warn!(
                "Result {:?} does not match known answer {:?}",
                outcome.cost(),
                known.cost
            );
        }
    }

    Ok(())
}
