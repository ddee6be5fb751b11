//! Minimum heat loss for a crucible that must keep moving straight for a
//! while before it can turn, and must turn before it has gone too far.
//!
//! The search state is the product of grid position, current heading and
//! how many cells in a row the crucible has moved along that heading. Each
//! step costs the value of the cell being entered; the start cell is free.

use crate::direction::Direction;
use crate::error::SolveError;
use crate::grid::Grid;
use crate::point::Point;
use crate::{Solver, State};

/// How many cells in a row a crucible must (`min`) and may (`max`) travel
/// before it turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunLimits {
    min: usize,
    max: usize,
}

impl RunLimits {
    /// Free to turn at any time, at most 3 cells straight.
    pub const NORMAL: RunLimits = RunLimits { min: 1, max: 3 };

    /// At least 4 and at most 10 cells straight.
    pub const ULTRA: RunLimits = RunLimits { min: 4, max: 10 };

    pub fn new(min: usize, max: usize) -> Result<RunLimits, SolveError> {
        if min == 0 || min > max {
            return Err(SolveError::InvalidRunLimits { min, max });
        }

        Ok(RunLimits { min, max })
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn contains(&self, run: usize) -> bool {
        self.min <= run && run <= self.max
    }
}

/// Read-only data for a single solve.
#[derive(Debug, Clone)]
pub struct City<'a> {
    grid: &'a Grid,
    limits: RunLimits,
    target: Point,
}

impl<'a> City<'a> {
    pub fn new(grid: &'a Grid, limits: RunLimits) -> City<'a> {
        City {
            grid,
            limits,
            target: grid.corner(),
        }
    }

    pub fn grid(&self) -> &Grid {
        self.grid
    }

    pub fn limits(&self) -> RunLimits {
        self.limits
    }

    pub fn target(&self) -> Point {
        self.target
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Crucible {
    pub position: Point,
    /// `None` only before the first move.
    pub heading: Option<Direction>,
    /// Cells moved in a row along `heading`.
    pub run: usize,
}

impl Crucible {
    pub fn start(position: Point) -> Crucible {
        Crucible {
            position,
            heading: None,
            run: 0,
        }
    }

    fn advance(&self, direction: Direction) -> Crucible {
        let run = if self.heading == Some(direction) {
            self.run + 1
        } else {
            1
        };

        Crucible {
            position: self.position + direction.into(),
            heading: Some(direction),
            run,
        }
    }

    // Headings the crucible may move along next, before bounds are considered
    fn headings(&self, limits: RunLimits) -> Vec<Direction> {
        match self.heading {
            None => Direction::all(),
            Some(heading) if self.run < limits.min => vec![heading],
            Some(heading) => {
                let mut headings = heading.turns().to_vec();
                if self.run < limits.max {
                    headings.push(heading);
                }
                headings
            }
        }
    }

    fn check(&self, city: &City) -> Result<(), SolveError> {
        let well_formed = match self.heading {
            None => self.run == 0,
            Some(_) => 1 <= self.run && self.run <= city.limits.max,
        };

        if !well_formed || !city.grid.contains(self.position) {
            return Err(SolveError::InvalidState(format!("{self:?}")));
        }

        Ok(())
    }
}

impl<'a> State<City<'a>, Direction> for Crucible {
    fn next_states(
        &self,
        city: &City<'a>,
    ) -> Result<Vec<(u64, Direction, Crucible)>, SolveError> {
        let mut next_states = Vec::new();

        for direction in self.headings(city.limits) {
            let next = self.advance(direction);

            // Leaving the grid is simply not a move
            let Some(cost) = city.grid.get(next.position) else {
                continue;
            };

            next.check(city)?;
            next_states.push((cost as u64, direction, next));
        }

        log::trace!("{} -> {} next states", self.stringify(city), next_states.len());
        Ok(next_states)
    }

    fn is_solved(&self, city: &City<'a>) -> bool {
        self.position == city.target && city.limits.contains(self.run)
    }

    fn stringify(&self, city: &City<'a>) -> String {
        let heading = self.heading.map(char::from).unwrap_or('.');
        let cost = city.grid.get(self.position).unwrap_or_default();
        format!("{}:{}:{}[{}]", self.position, heading, self.run, cost)
    }
}

/// The cheapest way found to the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub cost: u64,
    /// Heading of each move, in order.
    pub steps: Vec<Direction>,
    /// Every state visited, from the start to the target.
    pub states: Vec<Crucible>,
}

impl Route {
    /// Each entered cell along with the heading it was entered with.
    pub fn cells(&self) -> Vec<(Point, Direction)> {
        self.states
            .iter()
            .filter_map(|state| state.heading.map(|heading| (state.position, heading)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Found(Route),
    Unreachable,
}

impl Outcome {
    pub fn cost(&self) -> Option<u64> {
        match self {
            Outcome::Found(route) => Some(route.cost),
            Outcome::Unreachable => None,
        }
    }
}

pub type CrucibleSolver<'a> = Solver<City<'a>, Crucible, Direction>;

pub fn solver(grid: &Grid, limits: RunLimits) -> CrucibleSolver<'_> {
    Solver::new(City::new(grid, limits), Crucible::start(grid.origin()))
}

/// Read the outcome of a solver that has been run until it stopped.
pub fn outcome(solver: &CrucibleSolver) -> Result<Outcome, SolveError> {
    let Some(solution) = solver.get_solution() else {
        return Ok(Outcome::Unreachable);
    };

    let start = Crucible::start(solver.global().grid.origin());
    let missing = || SolveError::InvalidState(format!("no route back from {solution:?}"));

    let cost = solver.cost(&solution).ok_or_else(missing)?;
    let steps = solver.path(&start, &solution).ok_or_else(missing)?;
    let states = solver.route(&solution).ok_or_else(missing)?;

    Ok(Outcome::Found(Route {
        cost,
        steps,
        states,
    }))
}

/// Minimum total cost from the top-left to the bottom-right of `grid`.
pub fn solve(grid: &Grid, limits: RunLimits) -> Result<Outcome, SolveError> {
    let mut solver = solver(grid, limits);

    for state in &mut solver {
        state?;
    }

    log::debug!("{solver}");
    outcome(&solver)
}

#[cfg(test)]
mod test_crucible {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    const EXAMPLE: &str = "\
2413432311323
3215453535623
3255245654254
3446585845452
4546657867536
1438598798454
4457876987766
3637877979653
4654967986887
4564679986453
1224686865563
2546548887735
4322674655533";

    const UNFORTUNATE: &str = "\
111111111111
999999999991
999999999991
999999999991
999999999991";

    fn grid(input: &str) -> Grid {
        Grid::read(&mut std::io::Cursor::new(input)).unwrap()
    }

    fn random_grid(rng: &mut StdRng, width: usize, height: usize) -> Vec<Vec<u32>> {
        (0..height)
            .map(|_| (0..width).map(|_| rng.gen_range(0..=9)).collect())
            .collect()
    }

    fn cost(grid: &Grid, min: usize, max: usize) -> Option<u64> {
        solve(grid, RunLimits::new(min, max).unwrap()).unwrap().cost()
    }

    #[test]
    fn test_example_normal() {
        assert_eq!(cost(&grid(EXAMPLE), 1, 3), Some(102));
    }

    #[test]
    fn test_example_ultra() {
        assert_eq!(solve(&grid(EXAMPLE), RunLimits::ULTRA).unwrap().cost(), Some(94));
    }

    #[test]
    fn test_unfortunate_ultra() {
        assert_eq!(cost(&grid(UNFORTUNATE), 4, 10), Some(71));
    }

    #[test]
    fn test_two_by_two() {
        let grid = Grid::new(vec![vec![1, 2], vec![3, 4]]).unwrap();

        let Outcome::Found(route) = solve(&grid, RunLimits::new(1, 1).unwrap()).unwrap() else {
            panic!("expected a route");
        };

        assert_eq!(route.cost, 2 + 4);
        assert_eq!(route.steps, vec![Direction::Right, Direction::Down]);
        assert_eq!(route.states.first(), Some(&Crucible::start(Point::ORIGIN)));
        assert_eq!(
            route.cells(),
            vec![
                (Point::new(1, 0), Direction::Right),
                (Point::new(1, 1), Direction::Down),
            ]
        );
    }

    #[test]
    fn test_start_cell_is_free() {
        let grid = Grid::new(vec![vec![9, 1], vec![1, 1]]).unwrap();
        assert_eq!(cost(&grid, 1, 3), Some(2));
    }

    #[test]
    fn test_short_line_is_unreachable() {
        for min in 1..6 {
            for len in 2..=min {
                let row = Grid::new(vec![vec![1; len]]).unwrap();
                let column = Grid::new(vec![vec![1]; len]).unwrap();

                assert_eq!(cost(&row, min, 10), None, "row of {len}, min {min}");
                assert_eq!(cost(&column, min, 10), None, "column of {len}, min {min}");
            }
        }
    }

    #[test]
    fn test_line_exactly_long_enough() {
        let row = Grid::new(vec![vec![1, 2, 3, 4, 5]]).unwrap();
        assert_eq!(cost(&row, 4, 4), Some(14));
        assert_eq!(cost(&row, 1, 3), None);
    }

    #[test]
    fn test_min_run_too_long_everywhere() {
        let grid = grid("123\n456\n789");
        assert_eq!(cost(&grid, 3, 5), None);
    }

    #[test]
    fn test_cannot_stop_short_of_min_run() {
        // Reaching the corner needs a turn, the last leg is too short for min 3
        let grid = grid("1111\n1111\n1111");
        assert_eq!(cost(&grid, 3, 3), None);
        assert_eq!(cost(&grid, 2, 3), Some(5));
    }

    #[test]
    fn test_uniform_cost_is_manhattan() {
        for (width, height) in [(2, 2), (5, 3), (1, 9), (13, 13), (20, 7)] {
            let grid = Grid::new(vec![vec![1; width]; height]).unwrap();
            let distance = grid.origin().manhattan_distance(grid.corner()) as u64;
            assert_eq!(cost(&grid, 1, 100), Some(distance), "{width}x{height}");
        }
    }

    #[test]
    fn test_zero_cost_cells() {
        let grid = Grid::new(vec![vec![0; 6]; 6]).unwrap();
        assert_eq!(cost(&grid, 1, 3), Some(0));
        assert_eq!(cost(&grid, 4, 10), Some(0));
    }

    #[test]
    fn test_route_obeys_limits() {
        let grid = grid(EXAMPLE);

        for limits in [RunLimits::NORMAL, RunLimits::ULTRA] {
            let Outcome::Found(route) = solve(&grid, limits).unwrap() else {
                panic!("expected a route");
            };

            // Replay the route and recompute its cost
            let mut position = grid.origin();
            let mut total = 0;
            for step in route.steps.iter() {
                position = position + (*step).into();
                total += grid.get(position).unwrap() as u64;
            }
            assert_eq!(position, grid.corner());
            assert_eq!(total, route.cost);

            // Split into straight legs, each within limits
            let mut legs = vec![];
            for step in route.steps.iter() {
                match legs.last_mut() {
                    Some((heading, len)) if heading == step => *len += 1,
                    _ => legs.push((*step, 1usize)),
                }
            }
            for (i, (_, len)) in legs.iter().enumerate() {
                assert!(*len <= limits.max());
                assert!(*len >= limits.min(), "leg {i} is {len} long");
            }
            for pair in legs.windows(2) {
                assert_ne!(pair[0].0.flip(), pair[1].0, "reversed");
            }
        }
    }

    #[test]
    fn test_idempotent() {
        let mut rng = StdRng::seed_from_u64(17);

        for _ in 0..10 {
            let grid = Grid::new(random_grid(&mut rng, 9, 7)).unwrap();
            for limits in [RunLimits::NORMAL, RunLimits::ULTRA] {
                assert_eq!(solve(&grid, limits).unwrap(), solve(&grid, limits).unwrap());
            }
        }
    }

    #[test]
    fn test_monotonic() {
        let mut rng = StdRng::seed_from_u64(2023);

        for _ in 0..25 {
            let width = rng.gen_range(2..10);
            let height = rng.gen_range(2..10);
            let mut rows = random_grid(&mut rng, width, height);
            let limits = [RunLimits::NORMAL, RunLimits::ULTRA][rng.gen_range(0..2)];

            let before = cost(&Grid::new(rows.clone()).unwrap(), limits.min(), limits.max());

            let (x, y) = (rng.gen_range(0..width), rng.gen_range(0..height));
            rows[y][x] += rng.gen_range(1..5);
            let after = cost(&Grid::new(rows).unwrap(), limits.min(), limits.max());

            match (before, after) {
                (Some(before), Some(after)) => assert!(after >= before),
                (None, None) => {}
                _ => panic!("reachability changed with cost"),
            }
        }
    }

    #[test]
    fn test_invalid_limits() {
        assert_eq!(
            RunLimits::new(0, 3),
            Err(SolveError::InvalidRunLimits { min: 0, max: 3 })
        );
        assert_eq!(
            RunLimits::new(4, 3),
            Err(SolveError::InvalidRunLimits { min: 4, max: 3 })
        );
        assert!(RunLimits::new(3, 3).is_ok());
    }

    #[test]
    fn test_headings() {
        let limits = RunLimits::ULTRA;
        let moving = |heading, run| Crucible {
            position: Point::ORIGIN,
            heading: Some(heading),
            run,
        };

        assert_eq!(Crucible::start(Point::ORIGIN).headings(limits).len(), 4);
        assert_eq!(moving(Direction::Right, 3).headings(limits), vec![Direction::Right]);
        assert_eq!(
            moving(Direction::Right, 4).headings(limits),
            vec![Direction::Up, Direction::Down, Direction::Right]
        );
        assert_eq!(
            moving(Direction::Down, 10).headings(limits),
            vec![Direction::Left, Direction::Right]
        );
    }

    #[test]
    fn test_check_rejects_malformed_states() {
        let grid = grid("123\n456");
        let city = City::new(&grid, RunLimits::NORMAL);

        let no_run = Crucible {
            position: Point::ORIGIN,
            heading: Some(Direction::Right),
            run: 0,
        };
        let too_long = Crucible { run: 4, ..no_run };
        let moving_start = Crucible {
            heading: None,
            run: 1,
            ..no_run
        };

        for state in [no_run, too_long, moving_start] {
            assert!(matches!(state.check(&city), Err(SolveError::InvalidState(_))));
        }
        assert_eq!(Crucible { run: 3, ..no_run }.check(&city), Ok(()));
    }

    #[test]
    fn test_stringify() {
        let grid = grid("123\n456");
        let city = City::new(&grid, RunLimits::NORMAL);
        let state = Crucible::start(Point::ORIGIN).advance(Direction::Right);

        assert_eq!(state.stringify(&city), "0:1:>:1[2]");
    }
}
