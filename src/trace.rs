//! Shared output contract: bounded step traces, termination status, timing.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::geometry::Position;

/// Ordered record of algorithm events with a storage ceiling.
///
/// Once `limit` steps are stored, further steps are counted but dropped,
/// so huge searches keep their statistics without unbounded memory. The
/// closing record of a run (a route, a solution) goes through
/// [`Trace::record_final`] and is always kept.
#[derive(Debug, Clone)]
pub struct Trace<S> {
    steps: Vec<S>,
    limit: usize,
    dropped: u64,
}

impl<S> Trace<S> {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            steps: Vec::new(),
            limit,
            dropped: 0,
        }
    }

    #[inline]
    pub fn record(&mut self, step: S) {
        self.record_with(|| step);
    }

    /// Records a step built lazily, skipping the construction once full.
    #[inline]
    pub fn record_with(&mut self, make: impl FnOnce() -> S) {
        if self.steps.len() < self.limit {
            self.steps.push(make());
        } else {
            self.dropped += 1;
        }
    }

    /// Stores `step` past the limit. Only for records bounded by the answer's size.
    pub fn record_final(&mut self, step: S) {
        self.steps.push(step);
    }

    pub fn is_truncated(&self) -> bool {
        self.dropped > 0
    }

    /// Steps recorded, including dropped ones.
    pub fn total(&self) -> u64 {
        self.steps.len() as u64 + self.dropped
    }

    #[cfg(test)]
    pub fn steps(&self) -> &[S] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<S> {
        self.steps
    }
}

/// What happened at a pathfinding step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// First expansion of a node.
    Visit,
    /// A neighbor discovered and added to the frontier.
    Frontier,
    /// Position of a local-search walker after a move.
    Current,
    /// Part of the final route, emitted start to goal.
    Path,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchStep {
    pub kind: StepKind,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heuristic: Option<f64>,
}

impl SearchStep {
    pub fn new(kind: StepKind, position: Position) -> Self {
        Self {
            kind,
            position,
            cost: None,
            heuristic: None,
        }
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn with_heuristic(mut self, heuristic: Option<f64>) -> Self {
        self.heuristic = heuristic;
        self
    }
}

/// Why a search or solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Solved,
    /// The whole reachable space was explored without success.
    Exhausted,
    /// Local search stopped with no improving move.
    LocalOptimum,
    /// An iteration, generation, or node cap was hit.
    CapReached,
    /// Rejected up front as provably unsolvable.
    Unsolvable,
}

impl Termination {
    pub fn is_solved(self) -> bool {
        self == Termination::Solved
    }
}

/// Wall-clock timer for the `execution_time` statistic.
pub struct Stopwatch(Instant);

impl Stopwatch {
    pub fn start() -> Self {
        Self(Instant::now())
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.0.elapsed().as_secs_f64() * 1000.0
    }
}
