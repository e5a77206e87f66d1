//! 8-puzzle: sliding tiles on a 3x3 board, solved by A* or BFS.
//!
//! States are permutations of 0..=8 (0 is the blank). The goal is
//! `1 2 3 / 4 5 6 / 7 8 0`. Only half of the 9! permutations can reach it;
//! `Board::is_solvable` decides which half by inversion parity, so
//! unsolvable inputs are answered without searching.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::{DecisionKind, PuzzleResult, PuzzleStep};
use crate::config::Limits;
use crate::error::{EngineError, Result};
use crate::geometry::{neighbors4, Position};
use crate::trace::{Termination, Trace};

const SIDE: usize = 3;
const CELLS: usize = SIDE * SIDE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PuzzleAlgorithm {
    #[default]
    #[serde(rename = "astar")]
    AStar,
    Bfs,
}

impl PuzzleAlgorithm {
    fn id(self) -> &'static str {
        match self {
            PuzzleAlgorithm::AStar => "astar",
            PuzzleAlgorithm::Bfs => "bfs",
        }
    }
}

/// Estimate of the slides still needed. Both are admissible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PuzzleHeuristic {
    #[default]
    Manhattan,
    MisplacedTiles,
}

/// A 3x3 tile arrangement in row-major order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Board([u8; CELLS]);

pub const GOAL: Board = Board([1, 2, 3, 4, 5, 6, 7, 8, 0]);

impl Board {
    /// Validates a 3x3 board holding each of 0..=8 exactly once.
    pub fn from_rows(rows: &[Vec<u8>]) -> Result<Self> {
        if rows.len() != SIDE || rows.iter().any(|row| row.len() != SIDE) {
            return Err(EngineError::invalid("8-puzzle state must be 3x3"));
        }
        let mut tiles = [0u8; CELLS];
        let mut seen = [false; CELLS];
        for (i, &tile) in rows.iter().flatten().enumerate() {
            let slot = seen.get_mut(tile as usize).ok_or_else(|| {
                EngineError::invalid(format!("8-puzzle tile {tile} is outside 0..=8"))
            })?;
            if *slot {
                return Err(EngineError::invalid(format!("8-puzzle tile {tile} appears twice")));
            }
            *slot = true;
            tiles[i] = tile;
        }
        Ok(Board(tiles))
    }

    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.0.chunks(SIDE).map(<[u8]>::to_vec).collect()
    }

    fn blank(&self) -> usize {
        self.0.iter().position(|&tile| tile == 0).unwrap_or(0)
    }

    /// Pairs of tiles (blank excluded) that appear in the wrong relative order.
    pub fn inversions(&self) -> usize {
        let tiles: Vec<u8> = self.0.iter().copied().filter(|&tile| tile != 0).collect();
        tiles
            .iter()
            .enumerate()
            .map(|(i, &a)| tiles[i + 1..].iter().filter(|&&b| b < a).count())
            .sum()
    }

    /// On an odd-width board a slide never changes inversion parity, and the
    /// goal has zero inversions.
    pub fn is_solvable(&self) -> bool {
        self.inversions() % 2 == 0
    }

    /// Boards reachable by sliding one tile into the blank.
    pub fn successors(&self) -> Vec<Board> {
        let blank = self.blank();
        let at = Position::new((blank / SIDE) as i32, (blank % SIDE) as i32);
        neighbors4(at, SIDE, SIDE)
            .into_iter()
            .map(|tile| {
                let mut next = *self;
                next.0.swap(blank, tile.row as usize * SIDE + tile.col as usize);
                next
            })
            .collect()
    }

    pub fn manhattan(&self) -> u32 {
        self.0
            .iter()
            .enumerate()
            .filter(|&(_, &tile)| tile != 0)
            .map(|(i, &tile)| {
                let target = tile as usize - 1;
                ((i / SIDE).abs_diff(target / SIDE) + (i % SIDE).abs_diff(target % SIDE)) as u32
            })
            .sum()
    }

    pub fn misplaced_tiles(&self) -> u32 {
        self.0
            .iter()
            .zip(GOAL.0.iter())
            .filter(|&(&tile, &goal)| tile != 0 && tile != goal)
            .count() as u32
    }

    fn estimate(&self, heuristic: PuzzleHeuristic) -> u32 {
        match heuristic {
            PuzzleHeuristic::Manhattan => self.manhattan(),
            PuzzleHeuristic::MisplacedTiles => self.misplaced_tiles(),
        }
    }
}

/// Solves from `board`, answering unsolvable inputs without searching.
pub fn solve(
    board: Board,
    algorithm: PuzzleAlgorithm,
    heuristic: PuzzleHeuristic,
    limits: &Limits,
) -> PuzzleResult {
    if !board.is_solvable() {
        let mut result = PuzzleResult::new(algorithm.id(), Termination::Unsolvable);
        result.message = Some(format!(
            "unsolvable: {} inversions (odd parity)",
            board.inversions()
        ));
        return result;
    }
    search(board, algorithm, heuristic, limits)
}

/// Open list for either search order. Entries carry `(cost, board)`.
enum Open {
    Fifo(VecDeque<(u32, Board)>),
    /// Keyed by `(f, insertion)`.
    Heap(BinaryHeap<Reverse<(u32, u64, u32, Board)>>, PuzzleHeuristic),
}

impl Open {
    fn push(&mut self, cost: u32, board: Board, seq: u64) {
        match self {
            Open::Fifo(queue) => queue.push_back((cost, board)),
            Open::Heap(heap, heuristic) => {
                let f = cost + board.estimate(*heuristic);
                heap.push(Reverse((f, seq, cost, board)));
            }
        }
    }

    fn pop(&mut self) -> Option<(u32, Board)> {
        match self {
            Open::Fifo(queue) => queue.pop_front(),
            Open::Heap(heap, _) => heap.pop().map(|Reverse((_, _, cost, board))| (cost, board)),
        }
    }
}

/// Best-first search over board states, bounded by `max_puzzle_states` expansions.
pub(crate) fn search(
    board: Board,
    algorithm: PuzzleAlgorithm,
    heuristic: PuzzleHeuristic,
    limits: &Limits,
) -> PuzzleResult {
    let mut open = match algorithm {
        PuzzleAlgorithm::Bfs => Open::Fifo(VecDeque::new()),
        PuzzleAlgorithm::AStar => Open::Heap(BinaryHeap::new(), heuristic),
    };
    let mut trace = Trace::with_limit(limits.max_trace_steps);
    let mut best_cost: FxHashMap<Board, u32> = FxHashMap::default();
    let mut parent: FxHashMap<Board, Board> = FxHashMap::default();
    let mut nodes_explored = 0u64;
    let mut seq = 0u64;

    best_cost.insert(board, 0);
    open.push(0, board, seq);

    let termination = loop {
        let Some((cost, current)) = open.pop() else {
            break Termination::Exhausted;
        };
        if cost > best_cost[&current] {
            continue;
        }
        // the goal is recognized even when it is popped right at the cap
        let at_goal = current == GOAL;
        if !at_goal && nodes_explored >= limits.max_puzzle_states as u64 {
            break Termination::CapReached;
        }

        nodes_explored += 1;
        trace.record_with(|| PuzzleStep::snapshot(DecisionKind::Visit, current.to_rows()));
        if at_goal {
            break Termination::Solved;
        }

        for next in current.successors() {
            let next_cost = cost + 1;
            if best_cost.get(&next).map_or(true, |&known| next_cost < known) {
                best_cost.insert(next, next_cost);
                parent.insert(next, current);
                seq += 1;
                open.push(next_cost, next, seq);
            }
        }
    };

    let mut result = PuzzleResult::new(algorithm.id(), termination);
    result.nodes_explored = nodes_explored;
    result.trace_truncated = trace.is_truncated();
    result.steps = trace.into_steps();

    match termination {
        Termination::Solved => {
            let mut chain = vec![GOAL];
            let mut current = GOAL;
            while let Some(&previous) = parent.get(&current) {
                chain.push(previous);
                current = previous;
            }
            chain.reverse();
            result.moves = Some(chain.len() - 1);
            result.solution = Some(GOAL.to_rows());
            result.path = Some(chain.iter().map(Board::to_rows).collect());
        }
        Termination::CapReached => {
            result.message = Some(format!(
                "state cap of {} reached before the goal",
                limits.max_puzzle_states
            ));
        }
        _ => result.message = Some("goal state is not reachable".to_string()),
    }
    result
}
