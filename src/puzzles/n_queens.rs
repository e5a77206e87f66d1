//! N-Queens by row-by-row backtracking.
//!
//! Row `r` is filled only after rows `0..r` hold a queen each, so the
//! safety check only needs the placed prefix: a column and two diagonal
//! occupancy tables indexed by `col`, `row + col` and `row + n - 1 - col`.

use super::{DecisionKind, PuzzleResult, PuzzleStep};
use crate::config::Limits;
use crate::error::{EngineError, Result};
use crate::trace::{Termination, Trace};

pub const MIN_BOARD_SIZE: usize = 4;
pub const MAX_BOARD_SIZE: usize = 12;

/// Rejects board sizes outside the supported request range.
pub fn check_board_size(n: usize) -> Result<()> {
    if (MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&n) {
        Ok(())
    } else {
        Err(EngineError::invalid(format!(
            "n-queens board_size {n} is outside {MIN_BOARD_SIZE}..={MAX_BOARD_SIZE}"
        )))
    }
}

/// Solver for one board size. Works for any `n`; the request layer
/// restricts `n` to what backtracking handles quickly.
pub struct NQueens {
    n: usize,
}

/// Mutable state of one backtracking run.
struct Backtracker<'a> {
    n: usize,
    /// Column of the queen in each placed row.
    queens: Vec<usize>,
    columns: Vec<bool>,
    /// Indexed by `row + col`.
    rising: Vec<bool>,
    /// Indexed by `row + n - 1 - col`.
    falling: Vec<bool>,
    find_all: bool,
    solutions: Vec<Vec<usize>>,
    trace: Trace<PuzzleStep>,
    attempts: u64,
    backtracks: u64,
    limits: &'a Limits,
    capped: bool,
}

impl Backtracker<'_> {
    fn is_safe(&self, row: usize, col: usize) -> bool {
        !self.columns[col] && !self.rising[row + col] && !self.falling[row + self.n - 1 - col]
    }

    fn set(&mut self, row: usize, col: usize, occupied: bool) {
        self.columns[col] = occupied;
        self.rising[row + col] = occupied;
        self.falling[row + self.n - 1 - col] = occupied;
    }

    /// Places queens from `row` down. Returns true once a solution is found;
    /// in find-all mode it keeps going and returns whether any was found.
    fn place(&mut self, row: usize) -> bool {
        if row == self.n {
            let board = queens_to_board(self.n, &self.queens);
            self.trace
                .record_final(PuzzleStep::snapshot(DecisionKind::Solution, board));
            self.solutions.push(self.queens.clone());
            return true;
        }

        let mut found = false;
        for col in 0..self.n {
            if self.attempts >= self.limits.max_backtrack_nodes {
                self.capped = true;
                return found;
            }
            self.attempts += 1;
            self.trace.record(PuzzleStep::at(DecisionKind::Trying, row, col));
            if !self.is_safe(row, col) {
                continue;
            }

            self.set(row, col, true);
            self.queens.push(col);
            self.trace.record(PuzzleStep::at(DecisionKind::Placing, row, col));

            if self.place(row + 1) {
                found = true;
                if !self.find_all {
                    return true;
                }
            }
            if self.capped {
                return found;
            }

            self.queens.pop();
            self.set(row, col, false);
            self.backtracks += 1;
            self.trace
                .record(PuzzleStep::at(DecisionKind::Backtracking, row, col));
        }
        found
    }
}

/// Expands a column-per-row list into an `n x n` 0/1 board.
pub fn queens_to_board(n: usize, queens: &[usize]) -> Vec<Vec<u8>> {
    let mut board = vec![vec![0u8; n]; n];
    for (row, &col) in queens.iter().enumerate() {
        board[row][col] = 1;
    }
    board
}

/// True if `board` holds exactly `n` queens, none attacking another.
#[cfg(test)]
pub(crate) fn is_valid_solution(board: &[Vec<u8>]) -> bool {
    let n = board.len();
    let queens: Vec<(usize, usize)> = board
        .iter()
        .enumerate()
        .flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|&(_, &cell)| cell == 1)
                .map(move |(c, _)| (r, c))
        })
        .collect();
    if queens.len() != n {
        return false;
    }
    queens.iter().enumerate().all(|(i, &(r1, c1))| {
        queens[i + 1..]
            .iter()
            .all(|&(r2, c2)| r1 != r2 && c1 != c2 && r1.abs_diff(r2) != c1.abs_diff(c2))
    })
}

impl NQueens {
    pub fn new(n: usize) -> Self {
        Self { n }
    }

    pub fn solve(&self, find_all: bool, limits: &Limits) -> PuzzleResult {
        let n = self.n;
        let diagonals = (2 * n).saturating_sub(1);
        let mut search = Backtracker {
            n,
            queens: Vec::with_capacity(n),
            columns: vec![false; n],
            rising: vec![false; diagonals],
            falling: vec![false; diagonals],
            find_all,
            solutions: Vec::new(),
            trace: Trace::with_limit(limits.max_trace_steps),
            attempts: 0,
            backtracks: 0,
            limits,
            capped: false,
        };
        search.place(0);

        let termination = match (search.capped, search.solutions.is_empty()) {
            (true, _) => Termination::CapReached,
            (false, true) => Termination::Exhausted,
            (false, false) => Termination::Solved,
        };
        let mut result = PuzzleResult::new("backtracking", termination);
        result.solved = !search.solutions.is_empty();
        result.nodes_explored = search.attempts;
        result.backtracks = search.backtracks;
        result.trace_truncated = search.trace.is_truncated();
        result.steps = search.trace.into_steps();

        let boards: Vec<Vec<Vec<u8>>> = search
            .solutions
            .iter()
            .map(|queens| queens_to_board(n, queens))
            .collect();
        result.solution = boards.first().cloned();
        result.solution_count = Some(boards.len());
        result.solutions = Some(boards);
        result.message = match termination {
            Termination::CapReached => Some(format!(
                "attempt cap of {} reached; solutions may be incomplete",
                limits.max_backtrack_nodes
            )),
            Termination::Exhausted => Some(format!("no placement of {n} queens exists")),
            _ => None,
        };
        result
    }
}
