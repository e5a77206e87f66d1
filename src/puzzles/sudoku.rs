//! Sudoku by backtracking over empty cells in row-major order.
//!
//! Digit availability is tracked with one bitmask per row, column and box,
//! so checking a candidate is three bit tests.

use super::{DecisionKind, PuzzleResult, PuzzleStep};
use crate::config::Limits;
use crate::error::{EngineError, Result};
use crate::trace::{Termination, Trace};

pub const SIZE: usize = 9;
/// Fewer givens than this never determine a unique grid.
pub const MIN_CLUES: usize = 17;

fn box_of(row: usize, col: usize) -> usize {
    (row / 3) * 3 + col / 3
}

/// A validated 9x9 board, `0` marking an empty cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sudoku {
    cells: [[u8; SIZE]; SIZE],
    rows: [u16; SIZE],
    cols: [u16; SIZE],
    boxes: [u16; SIZE],
}

impl Sudoku {
    /// Validates shape, digit range, clue count and that no two givens conflict.
    pub fn from_rows(rows: &[Vec<u8>]) -> Result<Self> {
        if rows.len() != SIZE || rows.iter().any(|row| row.len() != SIZE) {
            return Err(EngineError::invalid("sudoku board must be 9x9"));
        }

        let mut sudoku = Sudoku {
            cells: [[0; SIZE]; SIZE],
            rows: [0; SIZE],
            cols: [0; SIZE],
            boxes: [0; SIZE],
        };
        let mut clues = 0;
        for (r, row) in rows.iter().enumerate() {
            for (c, &digit) in row.iter().enumerate() {
                if digit > 9 {
                    return Err(EngineError::invalid(format!(
                        "sudoku cell ({r}, {c}) holds {digit}, expected 0..=9"
                    )));
                }
                if digit == 0 {
                    continue;
                }
                if !sudoku.can_place(r, c, digit) {
                    return Err(EngineError::invalid(format!(
                        "sudoku given {digit} at ({r}, {c}) conflicts with another given"
                    )));
                }
                sudoku.place(r, c, digit);
                clues += 1;
            }
        }

        if clues < MIN_CLUES {
            return Err(EngineError::invalid(format!(
                "sudoku needs at least {MIN_CLUES} givens, found {clues}"
            )));
        }
        Ok(sudoku)
    }

    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.cells.iter().map(|row| row.to_vec()).collect()
    }

    fn can_place(&self, row: usize, col: usize, digit: u8) -> bool {
        let bit = 1u16 << digit;
        (self.rows[row] | self.cols[col] | self.boxes[box_of(row, col)]) & bit == 0
    }

    fn place(&mut self, row: usize, col: usize, digit: u8) {
        let bit = 1u16 << digit;
        self.cells[row][col] = digit;
        self.rows[row] |= bit;
        self.cols[col] |= bit;
        self.boxes[box_of(row, col)] |= bit;
    }

    fn clear(&mut self, row: usize, col: usize) {
        let bit = !(1u16 << self.cells[row][col]);
        self.cells[row][col] = 0;
        self.rows[row] &= bit;
        self.cols[col] &= bit;
        self.boxes[box_of(row, col)] &= bit;
    }

    pub fn solve(mut self, limits: &Limits) -> PuzzleResult {
        let empty: Vec<(usize, usize)> = (0..SIZE)
            .flat_map(|r| (0..SIZE).map(move |c| (r, c)))
            .filter(|&(r, c)| self.cells[r][c] == 0)
            .collect();

        let mut run = Run {
            trace: Trace::with_limit(limits.max_trace_steps),
            attempts: 0,
            backtracks: 0,
            cap: limits.max_backtrack_nodes,
            capped: false,
        };
        let solved = self.fill(&empty, &mut run);

        let termination = if solved {
            Termination::Solved
        } else if run.capped {
            Termination::CapReached
        } else {
            Termination::Exhausted
        };
        if solved {
            run.trace
                .record_final(PuzzleStep::snapshot(DecisionKind::Solution, self.to_rows()));
        }

        let mut result = PuzzleResult::new("backtracking", termination);
        result.nodes_explored = run.attempts;
        result.backtracks = run.backtracks;
        result.trace_truncated = run.trace.is_truncated();
        result.steps = run.trace.into_steps();
        if solved {
            result.solution = Some(self.to_rows());
        }
        result.message = match termination {
            Termination::CapReached => Some(format!(
                "gave up after {} attempts",
                limits.max_backtrack_nodes
            )),
            Termination::Exhausted => Some("no digit assignment satisfies the givens".to_string()),
            _ => None,
        };
        result
    }

    /// Fills `empty` front to back, undoing a placement when its subtree fails.
    fn fill(&mut self, empty: &[(usize, usize)], run: &mut Run) -> bool {
        let Some((&(row, col), rest)) = empty.split_first() else {
            return true;
        };

        for digit in 1..=9u8 {
            if run.attempts >= run.cap {
                run.capped = true;
                return false;
            }
            run.attempts += 1;
            run.trace
                .record(PuzzleStep::at(DecisionKind::Trying, row, col).with_value(digit));
            if !self.can_place(row, col, digit) {
                continue;
            }

            self.place(row, col, digit);
            run.trace
                .record(PuzzleStep::at(DecisionKind::Placing, row, col).with_value(digit));
            if self.fill(rest, run) {
                return true;
            }
            self.clear(row, col);
            run.backtracks += 1;
            run.trace
                .record(PuzzleStep::at(DecisionKind::Backtracking, row, col).with_value(digit));
            if run.capped {
                return false;
            }
        }
        false
    }
}

struct Run {
    trace: Trace<PuzzleStep>,
    attempts: u64,
    backtracks: u64,
    cap: u64,
    capped: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// True if `board` is a filled 9x9 grid with every row, column and box a permutation of 1..=9.
    fn is_complete_solution(board: &[Vec<u8>]) -> bool {
        const ALL: u16 = 0b11_1111_1110;
        if board.len() != SIZE || board.iter().any(|row| row.len() != SIZE) {
            return false;
        }
        let mut rows = [0u16; SIZE];
        let mut cols = [0u16; SIZE];
        let mut boxes = [0u16; SIZE];
        for (r, row) in board.iter().enumerate() {
            for (c, &digit) in row.iter().enumerate() {
                if !(1..=9).contains(&digit) {
                    return false;
                }
                rows[r] |= 1 << digit;
                cols[c] |= 1 << digit;
                boxes[box_of(r, c)] |= 1 << digit;
            }
        }
        rows.iter().chain(&cols).chain(&boxes).all(|&mask| mask == ALL)
    }

    fn parse(lines: &[&str]) -> Vec<Vec<u8>> {
        lines
            .iter()
            .map(|line| line.bytes().map(|b| b - b'0').collect())
            .collect()
    }

    fn classic() -> Vec<Vec<u8>> {
        parse(&[
            "530070000",
            "600195000",
            "098000060",
            "800060003",
            "400803001",
            "700020006",
            "060000280",
            "000419005",
            "000080079",
        ])
    }

    #[test]
    fn test_solves_classic_puzzle() {
        let givens = classic();
        let result = Sudoku::from_rows(&givens).unwrap().solve(&Limits::default());
        assert!(result.solved);
        let solution = result.solution.unwrap();
        assert_eq!(
            solution,
            parse(&[
                "534678912",
                "672195348",
                "198342567",
                "859761423",
                "426853791",
                "713924856",
                "961537284",
                "287419635",
                "345286179",
            ])
        );
        assert!(is_complete_solution(&solution));
        // givens survive
        for r in 0..SIZE {
            for c in 0..SIZE {
                if givens[r][c] != 0 {
                    assert_eq!(solution[r][c], givens[r][c]);
                }
            }
        }
    }

    #[test]
    fn test_trace_replays_to_solution() {
        let givens = classic();
        let result = Sudoku::from_rows(&givens).unwrap().solve(&Limits::default());
        let mut board = givens.clone();
        for step in &result.steps {
            match step.kind {
                DecisionKind::Placing => {
                    board[step.row.unwrap()][step.col.unwrap()] = step.value.unwrap()
                }
                DecisionKind::Backtracking => board[step.row.unwrap()][step.col.unwrap()] = 0,
                _ => {}
            }
        }
        assert_eq!(Some(board), result.solution);
        assert_eq!(result.steps.last().unwrap().kind, DecisionKind::Solution);
    }

    #[test]
    fn test_solution_snapshot_outlives_trace_limit() {
        let limits = Limits {
            max_trace_steps: 5,
            ..Limits::default()
        };
        let result = Sudoku::from_rows(&classic()).unwrap().solve(&limits);
        assert!(result.solved);
        assert!(result.trace_truncated);
        assert_eq!(result.steps.len(), 6);
        let last = result.steps.last().unwrap();
        assert_eq!(last.kind, DecisionKind::Solution);
        assert_eq!(last.board, result.solution);
    }

    #[test]
    fn test_complete_board_is_returned_unchanged() {
        let board: Vec<Vec<u8>> = (0..9)
            .map(|r| (0..9).map(|c| ((r * 3 + r / 3 + c) % 9 + 1) as u8).collect())
            .collect();
        assert!(is_complete_solution(&board));
        let result = Sudoku::from_rows(&board).unwrap().solve(&Limits::default());
        assert!(result.solved);
        assert_eq!(result.solution, Some(board));
        assert_eq!(result.backtracks, 0);
        assert_eq!(result.nodes_explored, 0);
    }

    #[test]
    fn test_unsolvable_board() {
        let mut board = vec![vec![0u8; 9]; 9];
        for c in 0..8 {
            board[0][c] = c as u8 + 1;
            board[3][c] = c as u8 + 2;
        }
        board[1][8] = 9;
        let result = Sudoku::from_rows(&board).unwrap().solve(&Limits::default());
        assert!(!result.solved);
        assert_eq!(result.termination, Termination::Exhausted);
        assert!(result.solution.is_none());
    }

    #[test]
    fn test_attempt_cap() {
        let limits = Limits {
            max_backtrack_nodes: 50,
            ..Limits::default()
        };
        let result = Sudoku::from_rows(&classic()).unwrap().solve(&limits);
        assert_eq!(result.termination, Termination::CapReached);
        assert_eq!(result.nodes_explored, 50);
    }

    #[test]
    fn test_rejects_malformed_boards() {
        let mut sparse = vec![vec![0u8; 9]; 9];
        sparse[0][0] = 1;
        assert!(Sudoku::from_rows(&sparse).is_err());

        let mut conflict = classic();
        conflict[0][2] = 5;
        assert!(Sudoku::from_rows(&conflict).is_err());

        let mut out_of_range = classic();
        out_of_range[8][0] = 10;
        assert!(Sudoku::from_rows(&out_of_range).is_err());

        assert!(Sudoku::from_rows(&classic()[..8]).is_err());
    }
}
