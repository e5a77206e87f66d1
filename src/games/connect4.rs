//! Connect-4 on the standard 6x7 board, by depth-limited Minimax.
//!
//! Row 0 is the top of the board; pieces fall to the highest-numbered empty
//! row of their column. Leaves are scored with a windowed heuristic from the
//! searching player's point of view, terminal boards by their outcome.

use super::{algorithm_name, GameResult, Piece, Winner};
use crate::error::{EngineError, Result};

pub const ROWS: usize = 6;
pub const COLS: usize = 7;
const WIN_SCORE: i64 = 1_000_000;
const CENTER_WEIGHT: i64 = 3;
/// Columns searched center-out: central moves tend to be best, which tightens the window early.
const MOVE_ORDER: [usize; COLS] = [3, 2, 4, 1, 5, 0, 6];
/// Direction steps of the four line orientations.
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Board([[Piece; COLS]; ROWS]);

impl Board {
    /// Parses a 6x7 board. Pieces must rest on the floor or on another piece,
    /// and the two players' counts may differ by at most one.
    pub fn from_rows(rows: &[Vec<Piece>]) -> Result<Self> {
        if rows.len() != ROWS || rows.iter().any(|row| row.len() != COLS) {
            return Err(EngineError::invalid("connect4 board must be 6x7"));
        }
        let mut board = Board::default();
        for (r, row) in rows.iter().enumerate() {
            board.0[r].copy_from_slice(row);
        }

        for col in 0..COLS {
            for row in 0..ROWS - 1 {
                if board.0[row][col] != Piece::Empty && board.0[row + 1][col] == Piece::Empty {
                    return Err(EngineError::invalid(format!(
                        "connect4 piece at ({row}, {col}) is floating"
                    )));
                }
            }
        }
        let count = |piece| board.0.iter().flatten().filter(|&&p| p == piece).count();
        if count(Piece::X).abs_diff(count(Piece::O)) > 1 {
            return Err(EngineError::invalid("connect4 piece counts differ by more than one"));
        }
        Ok(board)
    }

    pub fn to_rows(&self) -> Vec<Vec<Piece>> {
        self.0.iter().map(|row| row.to_vec()).collect()
    }

    pub fn get(&self, row: usize, col: usize) -> Piece {
        self.0[row][col]
    }

    /// Drops `piece` into `col`, returning the row it lands on, or `None` if the column is full.
    pub fn drop_piece(&mut self, col: usize, piece: Piece) -> Option<usize> {
        let row = (0..ROWS).rev().find(|&row| self.0[row][col] == Piece::Empty)?;
        self.0[row][col] = piece;
        Some(row)
    }

    /// Non-full columns in search order.
    pub fn valid_columns(&self) -> Vec<usize> {
        MOVE_ORDER
            .into_iter()
            .filter(|&col| self.0[0][col] == Piece::Empty)
            .collect()
    }

    /// Calls `f` with the four cells of every horizontal, vertical and diagonal window.
    fn for_each_window(&self, mut f: impl FnMut([Piece; 4])) {
        for (dr, dc) in DIRECTIONS {
            for row in 0..ROWS as isize {
                for col in 0..COLS as isize {
                    let (end_row, end_col) = (row + 3 * dr, col + 3 * dc);
                    if !(0..ROWS as isize).contains(&end_row) || !(0..COLS as isize).contains(&end_col) {
                        continue;
                    }
                    let window: [Piece; 4] = std::array::from_fn(|i| {
                        let i = i as isize;
                        self.0[(row + i * dr) as usize][(col + i * dc) as usize]
                    });
                    f(window);
                }
            }
        }
    }

    pub fn has_won(&self, piece: Piece) -> bool {
        let mut won = false;
        self.for_each_window(|window| won |= window.iter().all(|&p| p == piece));
        won
    }

    pub fn is_full(&self) -> bool {
        self.0[0].iter().all(|&p| p != Piece::Empty)
    }

    pub fn outcome(&self) -> Option<Winner> {
        if self.has_won(Piece::X) {
            Some(Winner::X)
        } else if self.has_won(Piece::O) {
            Some(Winner::O)
        } else if self.is_full() {
            Some(Winner::Draw)
        } else {
            None
        }
    }

    /// Windowed heuristic for `piece`: center control plus weighted windows.
    pub fn evaluate(&self, piece: Piece) -> i64 {
        let center = (0..ROWS).filter(|&row| self.0[row][COLS / 2] == piece).count() as i64;
        let mut score = center * CENTER_WEIGHT;
        self.for_each_window(|window| score += score_window(window, piece));
        score
    }
}

fn score_window(window: [Piece; 4], piece: Piece) -> i64 {
    let count = |target| window.iter().filter(|&&p| p == target).count();
    let (own, theirs, empty) = (count(piece), count(piece.opponent()), count(Piece::Empty));

    let mut score = match (own, empty) {
        (4, _) => 100,
        (3, 1) => 5,
        (2, 2) => 2,
        _ => 0,
    };
    if theirs == 3 && empty == 1 {
        score -= 4;
    }
    score
}

struct Searcher {
    piece: Piece,
    pruning: bool,
    nodes: u64,
}

impl Searcher {
    /// Minimax value of `board` for `self.piece`, with `depth` plies left to search.
    /// Returns the chosen column alongside the value; `None` at leaves.
    fn minimax(
        &mut self,
        board: &Board,
        depth: u32,
        mut alpha: i64,
        mut beta: i64,
        maximizing: bool,
    ) -> (Option<usize>, i64) {
        self.nodes += 1;
        if board.has_won(self.piece) {
            return (None, WIN_SCORE + depth as i64);
        }
        if board.has_won(self.piece.opponent()) {
            return (None, -WIN_SCORE - depth as i64);
        }
        let columns = board.valid_columns();
        if columns.is_empty() {
            return (None, 0);
        }
        if depth == 0 {
            return (None, board.evaluate(self.piece));
        }

        let mover = if maximizing {
            self.piece
        } else {
            self.piece.opponent()
        };
        let mut best_col = None;
        let mut best = if maximizing { i64::MIN } else { i64::MAX };
        for col in columns {
            let mut child = *board;
            child.drop_piece(col, mover);
            let (_, value) = self.minimax(&child, depth - 1, alpha, beta, !maximizing);

            let improves = if maximizing { value > best } else { value < best };
            if improves {
                best = value;
                best_col = Some(col);
            }
            if self.pruning {
                if maximizing {
                    alpha = alpha.max(best);
                } else {
                    beta = beta.min(best);
                }
                if alpha >= beta {
                    break;
                }
            }
        }
        (best_col, best)
    }
}

/// Best column for `piece` searching `depth` plies ahead.
pub fn best_move(board: &Board, piece: Piece, depth: u32, use_alpha_beta: bool) -> GameResult {
    let mut result = GameResult::new(algorithm_name(use_alpha_beta));
    result.depth = Some(depth);

    if let Some(outcome) = board.outcome() {
        result.winner = Some(outcome);
        return result;
    }

    let mut searcher = Searcher {
        piece,
        pruning: use_alpha_beta,
        nodes: 0,
    };
    let (column, score) = searcher.minimax(board, depth, i64::MIN, i64::MAX, true);
    result.best_column = column;
    result.score = Some(score);
    result.moves_evaluated = Some(board.valid_columns().len());
    result.nodes_explored = searcher.nodes;
    result
}
