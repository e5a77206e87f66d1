//! Local search: Hill Climbing and Simulated Annealing.
//!
//! Both walk a single agent from the start and only ever look at the
//! current cell's neighbors, so neither is complete. Hill Climbing stops at
//! the first local optimum; annealing stops when its schedule cools down or
//! the iteration cap is hit.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rustc_hash::{FxHashMap, FxHashSet};

use super::{Outcome, SearchOptions};
use crate::config::{AnnealingSchedule, Limits};
use crate::geometry::Position;
use crate::grid::Grid;
use crate::trace::{SearchStep, StepKind, Termination, Trace};

/// Greedy descent on heuristic distance to the goal.
///
/// Each move goes to the unvisited open neighbor with the lowest heuristic
/// (first in neighbor order on ties), but only if it strictly improves on the
/// current cell. Strict improvement means the walk never revisits a cell.
pub(crate) fn hill_climbing(
    grid: &Grid,
    start: Position,
    goal: Position,
    options: &SearchOptions,
    limits: &Limits,
) -> Outcome {
    let h = |pos: Position| options.heuristic.distance(pos, goal);
    let mut trace = Trace::with_limit(limits.max_trace_steps);
    let mut discovered: FxHashSet<Position> = FxHashSet::default();
    let mut path = vec![start];
    let mut current = start;

    discovered.insert(start);
    trace.record(
        SearchStep::new(StepKind::Visit, start)
            .with_cost(0.0)
            .with_heuristic(Some(h(start))),
    );

    for _ in 0..limits.max_local_iterations {
        if current == goal {
            let explored = path.len();
            return Outcome::found(path, trace, explored);
        }

        let mut best: Option<(Position, f64)> = None;
        for next in grid.open_neighbors(current, options.movement) {
            let score = h(next);
            if discovered.insert(next) {
                trace.record(
                    SearchStep::new(StepKind::Frontier, next).with_heuristic(Some(score)),
                );
            }
            if path.contains(&next) {
                continue;
            }
            if best.map_or(true, |(_, best_score)| score < best_score) {
                best = Some((next, score));
            }
        }

        match best {
            Some((next, score)) if score < h(current) => {
                current = next;
                path.push(next);
                trace.record(
                    SearchStep::new(StepKind::Visit, next)
                        .with_cost((path.len() - 1) as f64)
                        .with_heuristic(Some(score)),
                );
            }
            _ => {
                let explored = path.len();
                return Outcome::failed(
                    trace,
                    explored,
                    Termination::LocalOptimum,
                    format!(
                        "stuck at local optimum {current}, {} from goal",
                        h(current)
                    ),
                );
            }
        }
    }

    let explored = path.len();
    if current == goal {
        return Outcome::found(path, trace, explored);
    }
    Outcome::failed(
        trace,
        explored,
        Termination::CapReached,
        format!("iteration cap of {} reached", limits.max_local_iterations),
    )
}

/// Random walk that accepts worsening moves with probability `exp(-delta / T)`.
///
/// The temperature decays geometrically every iteration. The returned path is
/// the walked trajectory with its loops erased.
pub(crate) fn simulated_annealing(
    grid: &Grid,
    start: Position,
    goal: Position,
    options: &SearchOptions,
    schedule: &AnnealingSchedule,
    limits: &Limits,
) -> Outcome {
    let h = |pos: Position| options.heuristic.distance(pos, goal);
    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut trace = Trace::with_limit(limits.max_trace_steps);
    let mut visited: FxHashSet<Position> = FxHashSet::default();
    let mut trajectory = vec![start];
    let mut current = start;
    let mut temperature = schedule.initial_temperature;

    visited.insert(start);
    trace.record(SearchStep::new(StepKind::Visit, start).with_heuristic(Some(h(start))));

    let mut iterations = 0;
    while current != goal {
        if temperature < schedule.min_temperature {
            return Outcome::failed(
                trace,
                visited.len(),
                Termination::CapReached,
                format!("cooled down at {current}, {} from goal", h(current)),
            );
        }
        if iterations >= limits.max_local_iterations {
            return Outcome::failed(
                trace,
                visited.len(),
                Termination::CapReached,
                format!("iteration cap of {} reached", limits.max_local_iterations),
            );
        }

        let neighbors = grid.open_neighbors(current, options.movement);
        let Some(&next) = neighbors.choose(&mut rng) else {
            return Outcome::failed(
                trace,
                visited.len(),
                Termination::Exhausted,
                format!("{current} has no open neighbors"),
            );
        };

        let delta = h(next) - h(current);
        if delta < 0.0 || rng.gen::<f64>() < (-delta / temperature).exp() {
            current = next;
            trajectory.push(next);
            let kind = if visited.insert(next) {
                StepKind::Visit
            } else {
                StepKind::Current
            };
            trace.record(SearchStep::new(kind, next).with_heuristic(Some(h(next))));
        }

        temperature *= schedule.cooling_rate;
        iterations += 1;
    }

    let explored = visited.len();
    Outcome::found(erase_loops(&trajectory), trace, explored)
}

/// Removes every cycle from a walk, keeping it a walk of adjacent cells.
///
/// When a cell reappears, everything since its first occurrence is cut.
pub(crate) fn erase_loops(walk: &[Position]) -> Vec<Position> {
    let mut path: Vec<Position> = Vec::with_capacity(walk.len());
    let mut index_of: FxHashMap<Position, usize> = FxHashMap::default();

    for &pos in walk {
        if let Some(&index) = index_of.get(&pos) {
            for removed in path.drain(index + 1..) {
                index_of.remove(&removed);
            }
        } else {
            index_of.insert(pos, path.len());
            path.push(pos);
        }
    }

    path
}
