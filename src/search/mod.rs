//! Grid pathfinding with replayable traces.
//!
//! BFS, DFS, Dijkstra and A* share one driver (`explore`) and differ only in
//! the frontier they hand it. The local and evolutionary searches live in
//! `local` and `genetic` and produce the same `Outcome`.

pub mod genetic;
pub mod local;

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::fmt;
use std::str::FromStr;

use log::{debug, warn};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::geometry::{Heuristic, Movement, Position};
use crate::grid::Grid;
use crate::trace::{SearchStep, StepKind, Stopwatch, Termination, Trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    #[serde(rename = "astar")]
    AStar,
    Bfs,
    Dfs,
    Dijkstra,
    HillClimbing,
    SimulatedAnnealing,
    Genetic,
}

impl Algorithm {
    pub const ALL: [Algorithm; 7] = [
        Algorithm::AStar,
        Algorithm::Bfs,
        Algorithm::Dfs,
        Algorithm::Dijkstra,
        Algorithm::HillClimbing,
        Algorithm::SimulatedAnnealing,
        Algorithm::Genetic,
    ];

    /// Wire identifier, as accepted by `FromStr` and serde.
    pub const fn id(self) -> &'static str {
        match self {
            Algorithm::AStar => "astar",
            Algorithm::Bfs => "bfs",
            Algorithm::Dfs => "dfs",
            Algorithm::Dijkstra => "dijkstra",
            Algorithm::HillClimbing => "hill_climbing",
            Algorithm::SimulatedAnnealing => "simulated_annealing",
            Algorithm::Genetic => "genetic",
        }
    }

    /// Whether the algorithm returns a minimum-cost path (A* given an admissible heuristic).
    pub const fn is_optimal(self) -> bool {
        matches!(self, Algorithm::AStar | Algorithm::Bfs | Algorithm::Dijkstra)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Algorithm {
    type Err = EngineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|algorithm| algorithm.id() == s)
            .ok_or_else(|| EngineError::UnknownAlgorithm(s.to_string()))
    }
}

/// Per-call knobs that are not part of the grid itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub heuristic: Heuristic,
    pub movement: Movement,
    /// Seed for the stochastic algorithms; ignored by the others.
    pub seed: u64,
}

/// A pathfinding request as received from a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub algorithm: Algorithm,
    pub grid: Grid,
    pub start: Position,
    pub goal: Position,
    #[serde(default)]
    pub heuristic: Heuristic,
    #[serde(default)]
    pub movement: Movement,
    #[serde(default)]
    pub seed: u64,
}

impl SearchRequest {
    pub fn options(&self) -> SearchOptions {
        SearchOptions {
            heuristic: self.heuristic,
            movement: self.movement,
            seed: self.seed,
        }
    }

    pub fn run(&self, config: &EngineConfig) -> Result<SearchResult> {
        run_search(
            self.algorithm,
            &self.grid,
            self.start,
            self.goal,
            &self.options(),
            config,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub algorithm: Algorithm,
    pub path_found: bool,
    /// Start-to-goal route; empty when no path was found.
    pub path: Vec<Position>,
    pub path_cost: f64,
    pub steps: Vec<SearchStep>,
    pub nodes_explored: usize,
    pub termination: Termination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generations: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub trace_truncated: bool,
    /// Wall-clock milliseconds.
    pub execution_time: f64,
}

/// What an individual algorithm hands back to `run_search`.
pub(crate) struct Outcome {
    path: Vec<Position>,
    trace: Trace<SearchStep>,
    nodes_explored: usize,
    termination: Termination,
    generations: Option<usize>,
    message: Option<String>,
}

impl Outcome {
    pub(crate) fn found(path: Vec<Position>, trace: Trace<SearchStep>, nodes_explored: usize) -> Self {
        Self {
            path,
            trace,
            nodes_explored,
            termination: Termination::Solved,
            generations: None,
            message: None,
        }
    }

    pub(crate) fn failed(
        trace: Trace<SearchStep>,
        nodes_explored: usize,
        termination: Termination,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: Vec::new(),
            trace,
            nodes_explored,
            termination,
            generations: None,
            message: Some(message.into()),
        }
    }

    pub(crate) fn with_generations(mut self, generations: usize) -> Self {
        self.generations = Some(generations);
        self
    }
}

/// Runs one pathfinding algorithm over `grid` from `start` to `goal`.
///
/// Endpoints outside the grid or on a wall are rejected before any search.
/// A search that fails or stops at a cap is still `Ok`, with
/// `path_found == false` and the full exploration trace.
pub fn run_search(
    algorithm: Algorithm,
    grid: &Grid,
    start: Position,
    goal: Position,
    options: &SearchOptions,
    config: &EngineConfig,
) -> Result<SearchResult> {
    grid.check_endpoints(start, goal)?;
    config.validate()?;

    debug!(
        "{algorithm}: {}x{} grid, {start} -> {goal}, {:?}",
        grid.rows(),
        grid.cols(),
        options.movement
    );
    let stopwatch = Stopwatch::start();
    let limits = &config.limits;

    let mut outcome = match algorithm {
        Algorithm::Bfs => explore(grid, start, goal, options, Fifo::default(), limits.max_trace_steps),
        Algorithm::Dfs => explore(grid, start, goal, options, Lifo::default(), limits.max_trace_steps),
        Algorithm::Dijkstra => explore(
            grid,
            start,
            goal,
            options,
            Priority::uniform_cost(),
            limits.max_trace_steps,
        ),
        Algorithm::AStar => explore(
            grid,
            start,
            goal,
            options,
            Priority::informed(options.heuristic),
            limits.max_trace_steps,
        ),
        Algorithm::HillClimbing => local::hill_climbing(grid, start, goal, options, limits),
        Algorithm::SimulatedAnnealing => {
            local::simulated_annealing(grid, start, goal, options, &config.annealing, limits)
        }
        Algorithm::Genetic => genetic::evolve(grid, start, goal, options, &config.genetic, limits),
    };

    let path_found = outcome.termination.is_solved();
    for &pos in &outcome.path {
        outcome.trace.record_final(SearchStep::new(StepKind::Path, pos));
    }
    let path_cost = path_cost(&outcome.path, options.movement);

    if outcome.termination == Termination::CapReached {
        warn!("{algorithm} stopped at its cap after {} nodes", outcome.nodes_explored);
    }
    let execution_time = stopwatch.elapsed_ms();
    debug!(
        "{algorithm}: {:?}, {} nodes, {} steps traced, cost {path_cost}, {execution_time:.3} ms",
        outcome.termination,
        outcome.nodes_explored,
        outcome.trace.total()
    );

    Ok(SearchResult {
        algorithm,
        path_found,
        path: outcome.path,
        path_cost,
        trace_truncated: outcome.trace.is_truncated(),
        steps: outcome.trace.into_steps(),
        nodes_explored: outcome.nodes_explored,
        termination: outcome.termination,
        generations: outcome.generations,
        message: outcome.message,
        execution_time,
    })
}

/// Sum of move costs along a path.
pub fn path_cost(path: &[Position], movement: Movement) -> f64 {
    path.windows(2)
        .map(|pair| movement.step_cost(pair[0], pair[1]))
        .sum()
}

/// True if `path` is a non-empty walk of adjacent open cells from `start` to `goal`.
#[cfg(test)]
pub(crate) fn is_valid_path(
    grid: &Grid,
    path: &[Position],
    start: Position,
    goal: Position,
    movement: Movement,
) -> bool {
    path.first() == Some(&start)
        && path.last() == Some(&goal)
        && path.iter().all(|&pos| grid.is_open(pos))
        && path
            .windows(2)
            .all(|pair| pair[0].is_adjacent(pair[1], movement))
}

/// A node waiting in the frontier.
#[derive(Debug, Clone, Copy)]
struct Entry {
    position: Position,
    /// Accumulated cost from the start.
    cost: f64,
    /// Heuristic estimate to the goal (0 for uninformed frontiers).
    estimate: f64,
    /// Insertion counter, the final tie-break.
    seq: u64,
}

/// Frontier ordering policy.
trait Frontier {
    fn push(&mut self, entry: Entry);
    fn pop(&mut self) -> Option<Entry>;

    /// Whether a cheaper route to an already discovered node re-opens it.
    /// Non-relaxing frontiers enqueue every node exactly once.
    fn relaxes(&self) -> bool;

    fn heuristic(&self) -> Option<Heuristic> {
        None
    }
}

#[derive(Default)]
struct Fifo(VecDeque<Entry>);

impl Frontier for Fifo {
    fn push(&mut self, entry: Entry) {
        self.0.push_back(entry);
    }

    fn pop(&mut self) -> Option<Entry> {
        self.0.pop_front()
    }

    fn relaxes(&self) -> bool {
        false
    }
}

#[derive(Default)]
struct Lifo(Vec<Entry>);

impl Frontier for Lifo {
    fn push(&mut self, entry: Entry) {
        self.0.push(entry);
    }

    fn pop(&mut self) -> Option<Entry> {
        self.0.pop()
    }

    fn relaxes(&self) -> bool {
        false
    }
}

/// Min-heap ordered by `cost + estimate`, then lower estimate, then insertion order.
struct Priority {
    heap: BinaryHeap<Ranked>,
    heuristic: Option<Heuristic>,
}

impl Priority {
    fn uniform_cost() -> Self {
        Self {
            heap: BinaryHeap::new(),
            heuristic: None,
        }
    }

    fn informed(heuristic: Heuristic) -> Self {
        Self {
            heap: BinaryHeap::new(),
            heuristic: Some(heuristic),
        }
    }
}

impl Frontier for Priority {
    fn push(&mut self, entry: Entry) {
        self.heap.push(Ranked(entry));
    }

    fn pop(&mut self) -> Option<Entry> {
        self.heap.pop().map(|ranked| ranked.0)
    }

    fn relaxes(&self) -> bool {
        true
    }

    fn heuristic(&self) -> Option<Heuristic> {
        self.heuristic
    }
}

struct Ranked(Entry);

impl Ranked {
    fn priority(&self) -> f64 {
        self.0.cost + self.0.estimate
    }
}

impl Ord for Ranked {
    // reversed on every key: BinaryHeap is a max-heap
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority()
            .total_cmp(&self.priority())
            .then_with(|| other.0.estimate.total_cmp(&self.0.estimate))
            .then_with(|| other.0.seq.cmp(&self.0.seq))
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

/// The shared frontier loop behind BFS, DFS, Dijkstra and A*.
///
/// Emits a `visit` step on a node's first expansion and a `frontier` step on
/// its first discovery. With a relaxing frontier, stale heap entries are
/// skipped and a node reached more cheaply is pushed (and expanded) again.
fn explore(
    grid: &Grid,
    start: Position,
    goal: Position,
    options: &SearchOptions,
    mut frontier: impl Frontier,
    trace_limit: usize,
) -> Outcome {
    let heuristic = frontier.heuristic();
    let estimate = |pos: Position| heuristic.map_or(0.0, |h| h.distance(pos, goal));

    let mut trace = Trace::with_limit(trace_limit);
    let mut best_cost: FxHashMap<Position, f64> = FxHashMap::default();
    let mut came_from: FxHashMap<Position, Position> = FxHashMap::default();
    let mut expanded: FxHashSet<Position> = FxHashSet::default();
    let mut nodes_explored = 0;
    let mut seq = 0u64;

    best_cost.insert(start, 0.0);
    frontier.push(Entry {
        position: start,
        cost: 0.0,
        estimate: estimate(start),
        seq,
    });

    while let Some(entry) = frontier.pop() {
        let current = entry.position;
        if frontier.relaxes() {
            if entry.cost > best_cost[&current] {
                continue;
            }
        } else if expanded.contains(&current) {
            continue;
        }

        nodes_explored += 1;
        if expanded.insert(current) {
            trace.record(
                SearchStep::new(StepKind::Visit, current)
                    .with_cost(entry.cost)
                    .with_heuristic(heuristic.map(|_| entry.estimate)),
            );
        }

        if current == goal {
            return Outcome::found(reconstruct_path(&came_from, start, goal), trace, nodes_explored);
        }

        for next in grid.open_neighbors(current, options.movement) {
            let cost = entry.cost + options.movement.step_cost(current, next);
            let known = best_cost.get(&next).copied();
            let improves = match known {
                None => true,
                Some(previous) => frontier.relaxes() && cost < previous,
            };
            if !improves {
                continue;
            }

            best_cost.insert(next, cost);
            came_from.insert(next, current);
            seq += 1;
            let next_estimate = estimate(next);
            frontier.push(Entry {
                position: next,
                cost,
                estimate: next_estimate,
                seq,
            });
            if known.is_none() {
                trace.record(
                    SearchStep::new(StepKind::Frontier, next)
                        .with_cost(cost)
                        .with_heuristic(heuristic.map(|_| next_estimate)),
                );
            }
        }
    }

    Outcome::failed(
        trace,
        nodes_explored,
        Termination::Exhausted,
        "goal is not reachable from start",
    )
}

/// Walks parent links back from `goal`, returning the route in start-to-goal order.
fn reconstruct_path(
    came_from: &FxHashMap<Position, Position>,
    start: Position,
    goal: Position,
) -> Vec<Position> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        current = came_from[&current];
        path.push(current);
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::generate_maze;

    fn run(algorithm: Algorithm, grid: &Grid, start: Position, goal: Position) -> SearchResult {
        run_search(
            algorithm,
            grid,
            start,
            goal,
            &SearchOptions::default(),
            &EngineConfig::default(),
        )
        .unwrap()
    }

    fn steps_of(result: &SearchResult, kind: StepKind) -> Vec<Position> {
        result
            .steps
            .iter()
            .filter(|step| step.kind == kind)
            .map(|step| step.position)
            .collect()
    }

    #[test]
    fn test_bfs_open_grid_scenario() {
        let grid = Grid::new(5, 5);
        let start = Position::new(0, 0);
        let goal = Position::new(4, 4);
        let result = run(Algorithm::Bfs, &grid, start, goal);

        assert!(result.path_found);
        assert_eq!(result.path.len(), 9);
        assert_eq!(result.path_cost, 8.0);
        assert!(is_valid_path(&grid, &result.path, start, goal, Movement::FourWay));
        assert_eq!(steps_of(&result, StepKind::Path), result.path);
        assert_eq!(result.termination, Termination::Solved);
    }

    #[test]
    fn test_optimal_algorithms_agree_on_maze() {
        let start = Position::new(1, 1);
        let goal = Position::new(19, 23);
        let grid = generate_maze(21, 25, start, goal, 11).unwrap();

        let bfs = run(Algorithm::Bfs, &grid, start, goal);
        assert!(bfs.path_found);
        for algorithm in [Algorithm::Dijkstra, Algorithm::AStar] {
            let result = run(algorithm, &grid, start, goal);
            assert!(result.path_found, "{algorithm} should find a path");
            assert_eq!(result.path_cost, bfs.path_cost, "{algorithm} cost must be optimal");
            assert!(is_valid_path(&grid, &result.path, start, goal, Movement::FourWay));
        }

        let dfs = run(Algorithm::Dfs, &grid, start, goal);
        assert!(dfs.path_found);
        assert!(is_valid_path(&grid, &dfs.path, start, goal, Movement::FourWay));
        assert!(dfs.path_cost >= bfs.path_cost);
    }

    #[test]
    fn test_astar_expands_fewer_nodes_than_dijkstra_in_open_space() {
        let grid = Grid::new(15, 15);
        let start = Position::new(0, 0);
        let goal = Position::new(14, 14);
        let astar = run(Algorithm::AStar, &grid, start, goal);
        let dijkstra = run(Algorithm::Dijkstra, &grid, start, goal);
        assert_eq!(astar.path_cost, 28.0);
        assert!(astar.nodes_explored < dijkstra.nodes_explored);
    }

    #[test]
    fn test_astar_octile_eight_way_is_optimal() {
        let grid = Grid::from_rows(&[
            vec![0, 0, 0, 0, 0],
            vec![0, 1, 1, 1, 0],
            vec![0, 0, 0, 1, 0],
            vec![1, 1, 0, 1, 0],
            vec![0, 0, 0, 0, 0],
        ])
        .unwrap();
        let start = Position::new(0, 0);
        let goal = Position::new(4, 0);
        let options = SearchOptions {
            heuristic: Heuristic::Octile,
            movement: Movement::EightWay,
            seed: 0,
        };
        let config = EngineConfig::default();
        let astar = run_search(Algorithm::AStar, &grid, start, goal, &options, &config).unwrap();
        let dijkstra =
            run_search(Algorithm::Dijkstra, &grid, start, goal, &options, &config).unwrap();

        assert!(astar.path_found);
        assert!(is_valid_path(&grid, &astar.path, start, goal, Movement::EightWay));
        assert!((astar.path_cost - dijkstra.path_cost).abs() < 1e-9);
    }

    #[test]
    fn test_astar_reopens_node_under_inadmissible_heuristic() {
        // Manhattan overestimates diagonal moves: (3, 2) is expanded at cost
        // 3 + sqrt(2) down the right column, then reopened at 1 + 2 sqrt(2)
        let grid = Grid::from_rows(&[
            vec![0, 0, 1],
            vec![0, 1, 0],
            vec![0, 0, 0],
            vec![1, 0, 0],
            vec![1, 0, 1],
            vec![0, 0, 0],
        ])
        .unwrap();
        let start = Position::new(0, 0);
        let goal = Position::new(5, 2);
        let options = SearchOptions {
            heuristic: Heuristic::Manhattan,
            movement: Movement::EightWay,
            seed: 0,
        };
        let config = EngineConfig::default();
        let astar = run_search(Algorithm::AStar, &grid, start, goal, &options, &config).unwrap();

        assert!(astar.path_found);
        assert_eq!(steps_of(&astar, StepKind::Visit).len(), 10);
        assert_eq!(astar.nodes_explored, 11, "one node expanded twice");
        assert!(is_valid_path(&grid, &astar.path, start, goal, Movement::EightWay));
        assert!((astar.path_cost - (3.0 + 2.0 * std::f64::consts::SQRT_2)).abs() < 1e-9);
    }

    #[test]
    fn test_unreachable_goal_reports_full_trace() {
        let grid = Grid::from_rows(&[vec![0, 1, 0], vec![0, 1, 0], vec![0, 1, 0]]).unwrap();
        let start = Position::new(0, 0);
        let goal = Position::new(2, 2);
        for algorithm in [Algorithm::Bfs, Algorithm::Dfs, Algorithm::Dijkstra, Algorithm::AStar] {
            let result = run(algorithm, &grid, start, goal);
            assert!(!result.path_found);
            assert!(result.path.is_empty());
            assert_eq!(result.termination, Termination::Exhausted);
            assert_eq!(steps_of(&result, StepKind::Visit).len(), 3, "{algorithm}");
            assert_eq!(result.nodes_explored, 3);
        }
    }

    #[test]
    fn test_each_cell_visited_once() {
        let grid = Grid::new(6, 6);
        let start = Position::new(0, 0);
        let goal = Position::new(5, 5);
        for algorithm in [Algorithm::Bfs, Algorithm::Dfs, Algorithm::Dijkstra, Algorithm::AStar] {
            let result = run(algorithm, &grid, start, goal);
            let visits = steps_of(&result, StepKind::Visit);
            let unique: FxHashSet<Position> = visits.iter().copied().collect();
            assert_eq!(unique.len(), visits.len(), "{algorithm} re-visited a node");
            let frontier = steps_of(&result, StepKind::Frontier);
            let unique: FxHashSet<Position> = frontier.iter().copied().collect();
            assert_eq!(unique.len(), frontier.len(), "{algorithm} re-discovered a node");
        }
    }

    #[test]
    fn test_start_equals_goal() {
        let grid = Grid::new(3, 3);
        let here = Position::new(1, 1);
        let result = run(Algorithm::AStar, &grid, here, here);
        assert!(result.path_found);
        assert_eq!(result.path, vec![here]);
        assert_eq!(result.path_cost, 0.0);
    }

    #[test]
    fn test_wall_endpoint_is_rejected() {
        let grid = Grid::from_rows(&[vec![1, 0], vec![0, 0]]).unwrap();
        let err = run_search(
            Algorithm::Bfs,
            &grid,
            Position::new(0, 0),
            Position::new(1, 1),
            &SearchOptions::default(),
            &EngineConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn test_deterministic_traces() {
        let start = Position::new(1, 1);
        let goal = Position::new(13, 13);
        let grid = generate_maze(15, 15, start, goal, 5).unwrap();
        for algorithm in Algorithm::ALL {
            let a = run(algorithm, &grid, start, goal);
            let b = run(algorithm, &grid, start, goal);
            assert_eq!(a.steps, b.steps, "{algorithm} trace differs");
            assert_eq!(a.path, b.path);
            assert_eq!(a.nodes_explored, b.nodes_explored);
        }
    }

    #[test]
    fn test_trace_limit_truncates_but_keeps_statistics() {
        let grid = Grid::new(10, 10);
        let mut config = EngineConfig::default();
        config.limits.max_trace_steps = 10;
        let result = run_search(
            Algorithm::Bfs,
            &grid,
            Position::new(0, 0),
            Position::new(9, 9),
            &SearchOptions::default(),
            &config,
        )
        .unwrap();
        assert!(result.path_found);
        assert!(result.trace_truncated);
        assert_eq!(result.path.len(), 19);
        assert_eq!(result.steps.len(), 10 + 19);
        assert_eq!(steps_of(&result, StepKind::Path), result.path);
        assert_eq!(result.nodes_explored, 100);
    }

    #[test]
    fn test_algorithm_ids_round_trip() {
        for algorithm in Algorithm::ALL {
            assert_eq!(algorithm.id().parse::<Algorithm>().unwrap(), algorithm);
            let json = serde_json::to_string(&algorithm).unwrap();
            assert_eq!(json, format!("\"{}\"", algorithm.id()));
        }
        assert!(matches!(
            "quantum".parse::<Algorithm>(),
            Err(EngineError::UnknownAlgorithm(_))
        ));
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let request: SearchRequest = serde_json::from_str(
            r#"{"algorithm": "bfs", "grid": [[0,0],[0,0]], "start": [0,0], "goal": [1,1]}"#,
        )
        .unwrap();
        assert_eq!(request.heuristic, Heuristic::Manhattan);
        assert_eq!(request.movement, Movement::FourWay);
        let result = request.run(&EngineConfig::default()).unwrap();
        assert_eq!(result.path.len(), 3);
    }
}
