use core::fmt::Debug;
use std::cmp::Reverse;
use std::fmt;
use std::hash::Hash;
use std::time::Instant;

use fxhash::{FxHashMap, FxHashSet};
use priority_queue::PriorityQueue;

pub mod crucible;
pub mod direction;
pub mod error;
pub mod grid;
pub mod point;

pub use direction::Direction;
pub use error::SolveError;
pub use grid::Grid;
pub use point::Point;

/// A node in an implicit search graph.
///
/// `G` is read-only data shared by every state (the map), `St` labels the edge
/// taken between two states so a solution can be replayed.
pub trait State<G, St>: Clone + Eq + Hash {
    /// Every state reachable in one step, with the (non-negative) cost of that step.
    fn next_states(&self, global: &G) -> Result<Vec<(u64, St, Self)>, SolveError>
    where
        Self: Sized;

    fn is_solved(&self, global: &G) -> bool;

    fn stringify(&self, global: &G) -> String;
}

// Best known way to reach a state
#[derive(Debug, Clone)]
struct Record<S, St> {
    cost: u64,
    from: Option<(S, St)>,
}

/// Best-first (Dijkstra) search over a [`State`] graph.
///
/// Iterating the solver expands one state per call, cheapest first. It stops
/// once a solved state is expanded; since step costs are non-negative, that
/// state is the cheapest solution there is.
#[derive(Debug)]
pub struct Solver<G, S: State<G, St>, St> {
    global_state: G,
    to_check: PriorityQueue<S, Reverse<u64>>,
    records: FxHashMap<S, Record<S, St>>,
    checked: FxHashSet<S>,
    solution: Option<S>,
    time_spent: f32,
}

impl<G, S, St> Solver<G, S, St>
where
    S: State<G, St>,
    St: Clone,
{
    pub fn new(global_state: G, initial_state: S) -> Solver<G, S, St> {
        let mut to_check = PriorityQueue::new();
        to_check.push(initial_state.clone(), Reverse(0));

        let mut records = FxHashMap::default();
        records.insert(initial_state, Record { cost: 0, from: None });

        Solver {
            global_state,
            to_check,
            records,
            checked: FxHashSet::default(),
            solution: None,
            time_spent: 0 as f32,
        }
    }

    pub fn states_checked(&self) -> usize {
        self.checked.len()
    }

    pub fn in_queue(&self) -> usize {
        self.to_check.len()
    }

    pub fn time_spent(&self) -> f32 {
        self.time_spent
    }

    pub fn global(&self) -> &G {
        &self.global_state
    }

    pub fn get_solution(&self) -> Option<S> {
        self.solution.clone()
    }

    /// Lowest cost found so far for `state`, `None` if it was never reached.
    pub fn cost(&self, state: &S) -> Option<u64> {
        self.records.get(state).map(|record| record.cost)
    }

    /// Every state from the initial one to `state`, inclusive.
    pub fn route(&self, state: &S) -> Option<Vec<S>> {
        let mut route = vec![state.clone()];
        let mut current = state;

        while let Some((previous, _)) = &self.records.get(current)?.from {
            route.push(previous.clone());
            current = previous;
        }

        route.reverse();
        Some(route)
    }

    /// The steps taken from `initial_state` to reach `solved_state`.
    pub fn path(&self, initial_state: &S, solved_state: &S) -> Option<Vec<St>> {
        let mut path = Vec::new();
        let mut current = solved_state;

        while current != initial_state {
            let (previous, step) = self.records.get(current)?.from.as_ref()?;
            path.push(step.clone());
            current = previous;
        }

        path.reverse();
        Some(path)
    }

    pub fn stringify(&self, state: &S) -> String {
        state.stringify(&self.global_state)
    }
}

// Each item is the state just expanded; iteration ends when the queue drains
// or right after a solution is expanded
impl<G, S, St> Iterator for Solver<G, S, St>
where
    S: State<G, St> + Debug,
    St: Clone,
{
    type Item = Result<S, SolveError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.solution.is_some() {
            return None;
        }

        let start = Instant::now();

        let (current_state, Reverse(current_cost)) = self.to_check.pop()?;
        self.checked.insert(current_state.clone());

        if self.checked.len() % 100000 == 0 {
            tracing::debug!(
                "[DEBUG] checked: {}, queue: {}, cost: {}, time: {}",
                self.checked.len(),
                self.to_check.len(),
                current_cost,
                self.time_spent + start.elapsed().as_secs_f32()
            );
        }

        if current_state.is_solved(&self.global_state) {
            self.solution = Some(current_state.clone());
            self.time_spent += start.elapsed().as_secs_f32();
            return Some(Ok(current_state));
        }

        let next_states = match current_state.next_states(&self.global_state) {
            Ok(next_states) => next_states,
            Err(err) => {
                self.time_spent += start.elapsed().as_secs_f32();
                return Some(Err(err));
            }
        };

        for (step_cost, step, next_state) in next_states {
            if self.checked.contains(&next_state) {
                continue;
            }

            let next_cost = current_cost + step_cost;
            if let Some(record) = self.records.get(&next_state) {
                if record.cost <= next_cost {
                    continue;
                }
            }

            self.records.insert(
                next_state.clone(),
                Record {
                    cost: next_cost,
                    from: Some((current_state.clone(), step)),
                },
            );
            self.to_check.push(next_state, Reverse(next_cost));
        }

        self.time_spent += start.elapsed().as_secs_f32();
        Some(Ok(current_state))
    }
}

impl<G, S, St> fmt::Display for Solver<G, S, St>
where
    S: State<G, St>,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Solver<{} checked, {} in queue, {} reached, {:.3} seconds>",
            self.checked.len(),
            self.to_check.len(),
            self.records.len(),
            self.time_spent
        )
    }
}
