//! Classic puzzle solvers: 8-puzzle, N-Queens and Sudoku.
//!
//! Every solver records its decisions as `PuzzleStep`s and reports through
//! the same `PuzzleResult`, so a caller can replay any of them.

pub mod eight_puzzle;
pub mod n_queens;
pub mod sudoku;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::trace::{Stopwatch, Termination};

pub use eight_puzzle::{PuzzleAlgorithm, PuzzleHeuristic};

/// One recorded solver decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    /// A state taken off the 8-puzzle frontier.
    Visit,
    Trying,
    Placing,
    Backtracking,
    Solution,
}

/// A step of a puzzle trace.
///
/// `row`/`col`/`value` locate backtracking decisions; `board` snapshots are
/// attached to 8-puzzle visits and to solutions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleStep {
    pub kind: DecisionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<Vec<Vec<u8>>>,
}

impl PuzzleStep {
    pub fn at(kind: DecisionKind, row: usize, col: usize) -> Self {
        Self {
            kind,
            row: Some(row),
            col: Some(col),
            value: None,
            board: None,
        }
    }

    pub fn with_value(mut self, value: u8) -> Self {
        self.value = Some(value);
        self
    }

    pub fn snapshot(kind: DecisionKind, board: Vec<Vec<u8>>) -> Self {
        Self {
            kind,
            row: None,
            col: None,
            value: None,
            board: Some(board),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "puzzle_type")]
pub enum PuzzleRequest {
    #[serde(rename = "8-puzzle")]
    EightPuzzle {
        initial_state: Vec<Vec<u8>>,
        #[serde(default)]
        algorithm: PuzzleAlgorithm,
        #[serde(default)]
        heuristic: PuzzleHeuristic,
    },
    #[serde(rename = "n-queens")]
    NQueens {
        #[serde(default = "default_board_size")]
        board_size: usize,
        #[serde(default)]
        find_all: bool,
    },
    #[serde(rename = "sudoku")]
    Sudoku { board: Vec<Vec<u8>> },
}

fn default_board_size() -> usize {
    8
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PuzzleResult {
    pub solved: bool,
    pub termination: Termination,
    /// Solver that produced the result, e.g. `"astar"` or `"backtracking"`.
    pub algorithm: String,
    pub steps: Vec<PuzzleStep>,
    /// Single solved board (Sudoku, first N-Queens solution).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<Vec<Vec<u8>>>,
    /// All N-Queens solutions found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solutions: Option<Vec<Vec<Vec<u8>>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution_count: Option<usize>,
    /// Board sequence from the initial 8-puzzle state to the goal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Vec<Vec<u8>>>>,
    /// Tile slides in the 8-puzzle solution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moves: Option<usize>,
    pub nodes_explored: u64,
    pub backtracks: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub trace_truncated: bool,
    /// Wall-clock milliseconds.
    pub execution_time: f64,
}

impl PuzzleResult {
    pub(crate) fn new(algorithm: &str, termination: Termination) -> Self {
        Self {
            solved: termination.is_solved(),
            termination,
            algorithm: algorithm.to_string(),
            steps: Vec::new(),
            solution: None,
            solutions: None,
            solution_count: None,
            path: None,
            moves: None,
            nodes_explored: 0,
            backtracks: 0,
            message: None,
            trace_truncated: false,
            execution_time: 0.0,
        }
    }
}

/// Solves one puzzle request. Malformed boards are rejected before solving.
pub fn solve_puzzle(request: &PuzzleRequest, config: &EngineConfig) -> Result<PuzzleResult> {
    config.validate()?;
    let stopwatch = Stopwatch::start();
    let limits = &config.limits;

    let mut result = match request {
        PuzzleRequest::EightPuzzle {
            initial_state,
            algorithm,
            heuristic,
        } => {
            let board = eight_puzzle::Board::from_rows(initial_state)?;
            eight_puzzle::solve(board, *algorithm, *heuristic, limits)
        }
        PuzzleRequest::NQueens {
            board_size,
            find_all,
        } => {
            n_queens::check_board_size(*board_size)?;
            n_queens::NQueens::new(*board_size).solve(*find_all, limits)
        }
        PuzzleRequest::Sudoku { board } => {
            let board = sudoku::Sudoku::from_rows(board)?;
            board.solve(limits)
        }
    };

    result.execution_time = stopwatch.elapsed_ms();
    if result.termination == Termination::CapReached {
        warn!(
            "{} puzzle stopped at its cap after {} nodes",
            result.algorithm, result.nodes_explored
        );
    }
    debug!(
        "{} puzzle: {:?} after {} nodes, {} backtracks, {:.3} ms",
        result.algorithm, result.termination, result.nodes_explored, result.backtracks,
        result.execution_time
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_n_queens_request_scenario() {
        let request: PuzzleRequest =
            serde_json::from_str(r#"{"puzzle_type": "n-queens", "board_size": 4, "find_all": true}"#)
                .unwrap();
        let result = solve_puzzle(&request, &EngineConfig::default()).unwrap();
        assert!(result.solved);
        assert_eq!(result.solution_count, Some(2));
        assert!(result.execution_time >= 0.0);
    }

    #[test]
    fn test_board_size_defaults_to_eight() {
        let request: PuzzleRequest = serde_json::from_str(r#"{"puzzle_type": "n-queens"}"#).unwrap();
        assert_eq!(
            request,
            PuzzleRequest::NQueens {
                board_size: 8,
                find_all: false
            }
        );
    }

    #[test]
    fn test_eight_puzzle_request() {
        let request: PuzzleRequest = serde_json::from_str(
            r#"{"puzzle_type": "8-puzzle", "initial_state": [[1,2,3],[4,5,6],[0,7,8]], "algorithm": "bfs"}"#,
        )
        .unwrap();
        let result = solve_puzzle(&request, &EngineConfig::default()).unwrap();
        assert!(result.solved);
        assert_eq!(result.moves, Some(2));
        assert_eq!(result.algorithm, "bfs");
    }

    #[test]
    fn test_malformed_boards_are_errors() {
        let config = EngineConfig::default();
        let bad_sudoku = PuzzleRequest::Sudoku {
            board: vec![vec![0; 9]; 8],
        };
        assert!(solve_puzzle(&bad_sudoku, &config).is_err());
        let too_big = PuzzleRequest::NQueens {
            board_size: 13,
            find_all: false,
        };
        assert!(solve_puzzle(&too_big, &config).is_err());
        let bad_tiles = PuzzleRequest::EightPuzzle {
            initial_state: vec![vec![1, 1, 3], vec![4, 5, 6], vec![7, 8, 0]],
            algorithm: PuzzleAlgorithm::AStar,
            heuristic: PuzzleHeuristic::Manhattan,
        };
        assert!(solve_puzzle(&bad_tiles, &config).is_err());
    }

    #[test]
    fn test_step_serialization() {
        let step = PuzzleStep::at(DecisionKind::Trying, 0, 3).with_value(7);
        assert_eq!(
            serde_json::to_string(&step).unwrap(),
            r#"{"kind":"trying","row":0,"col":3,"value":7}"#
        );
    }
}
