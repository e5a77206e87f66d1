//! Tic-Tac-Toe by exhaustive Minimax, optionally Alpha-Beta pruned.
//!
//! Scores are from the perspective of the player to move (negamax form): a
//! win reached after `p` plies is worth `10 - p`, a loss `-(10 - p)`, a draw
//! `0`. Each root candidate is searched with a full window, so pruned and
//! unpruned searches report identical evaluations.

use serde::Serialize;

use super::{algorithm_name, GameResult, Piece, Winner};
use crate::error::{EngineError, Result};
use crate::geometry::Position;

const SIZE: usize = 3;
const WIN: i32 = 10;
const INF: i32 = 100;

const LINES: [[(usize, usize); 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Board([[Piece; SIZE]; SIZE]);

impl Board {
    /// Parses a 3x3 board whose piece counts differ by at most one.
    pub fn from_rows(rows: &[Vec<Piece>]) -> Result<Self> {
        if rows.len() != SIZE || rows.iter().any(|row| row.len() != SIZE) {
            return Err(EngineError::invalid("tic-tac-toe board must be 3x3"));
        }
        let mut board = Board::default();
        for (r, row) in rows.iter().enumerate() {
            board.0[r].copy_from_slice(row);
        }
        let count = |piece| board.0.iter().flatten().filter(|&&p| p == piece).count();
        if count(Piece::X).abs_diff(count(Piece::O)) > 1 {
            return Err(EngineError::invalid(
                "tic-tac-toe piece counts differ by more than one",
            ));
        }
        Ok(board)
    }

    pub fn to_rows(&self) -> Vec<Vec<Piece>> {
        self.0.iter().map(|row| row.to_vec()).collect()
    }

    fn set(&mut self, row: usize, col: usize, piece: Piece) {
        self.0[row][col] = piece;
    }

    /// Empty cells in row-major order.
    pub fn empty_cells(&self) -> Vec<(usize, usize)> {
        (0..SIZE)
            .flat_map(|r| (0..SIZE).map(move |c| (r, c)))
            .filter(|&(r, c)| self.0[r][c] == Piece::Empty)
            .collect()
    }

    pub fn winner(&self) -> Option<Piece> {
        LINES.iter().find_map(|line| {
            let [a, b, c] = line.map(|(r, c)| self.0[r][c]);
            (a != Piece::Empty && a == b && b == c).then_some(a)
        })
    }

    pub fn is_full(&self) -> bool {
        self.0.iter().flatten().all(|&p| p != Piece::Empty)
    }

    /// `Some` once the game is over.
    pub fn outcome(&self) -> Option<Winner> {
        match self.winner() {
            Some(piece) => Some(Winner::from(piece)),
            None if self.is_full() => Some(Winner::Draw),
            None => None,
        }
    }
}

/// Score of one root candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MoveEvaluation {
    pub row: usize,
    pub col: usize,
    pub score: i32,
}

/// One move of a self-played game, with the board after it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub player: Piece,
    pub row: usize,
    pub col: usize,
    pub score: i32,
    pub evaluations: Vec<MoveEvaluation>,
    pub board: Vec<Vec<Piece>>,
}

struct Searcher {
    pruning: bool,
    nodes: u64,
}

impl Searcher {
    /// Value of `board` for `to_move`, `ply` moves below the root.
    fn negamax(&mut self, board: &mut Board, to_move: Piece, ply: i32, mut alpha: i32, beta: i32) -> i32 {
        self.nodes += 1;
        if let Some(winner) = board.winner() {
            return if winner == to_move { WIN - ply } else { ply - WIN };
        }
        let cells = board.empty_cells();
        if cells.is_empty() {
            return 0;
        }

        let mut best = -INF;
        for (r, c) in cells {
            board.set(r, c, to_move);
            let score = -self.negamax(board, to_move.opponent(), ply + 1, -beta, -alpha);
            board.set(r, c, Piece::Empty);
            best = best.max(score);
            if self.pruning {
                alpha = alpha.max(score);
                if alpha >= beta {
                    break;
                }
            }
        }
        best
    }

    /// Scores every legal move for `player`; ties keep the first in row-major order.
    fn evaluate(&mut self, board: &Board, player: Piece) -> (Vec<MoveEvaluation>, Option<MoveEvaluation>) {
        let mut scratch = *board;
        let mut evaluations = Vec::new();
        let mut best: Option<MoveEvaluation> = None;
        for (row, col) in board.empty_cells() {
            scratch.set(row, col, player);
            let score = -self.negamax(&mut scratch, player.opponent(), 1, -INF, INF);
            scratch.set(row, col, Piece::Empty);

            let evaluation = MoveEvaluation { row, col, score };
            if best.map_or(true, |b| score > b.score) {
                best = Some(evaluation);
            }
            evaluations.push(evaluation);
        }
        (evaluations, best)
    }
}

/// Best move for `player` on `board`, with every candidate's score.
pub fn find_move(board: &Board, player: Piece, use_alpha_beta: bool) -> GameResult {
    let mut searcher = Searcher {
        pruning: use_alpha_beta,
        nodes: 0,
    };
    let mut result = GameResult::new(algorithm_name(use_alpha_beta));

    if let Some(outcome) = board.outcome() {
        result.winner = Some(outcome);
        result.evaluations = Some(Vec::new());
        result.moves_evaluated = Some(0);
        return result;
    }

    let (evaluations, best) = searcher.evaluate(board, player);
    result.best_move = best.map(|b| Position::new(b.row as i32, b.col as i32));
    result.best_score = best.map(|b| b.score);
    result.moves_evaluated = Some(evaluations.len());
    result.evaluations = Some(evaluations);
    result.nodes_explored = searcher.nodes;
    result
}

/// Plays a full game from the empty board, both sides searching perfectly.
pub fn self_play(first_player: Piece, use_alpha_beta: bool) -> GameResult {
    let mut searcher = Searcher {
        pruning: use_alpha_beta,
        nodes: 0,
    };
    let mut board = Board::default();
    let mut to_move = first_player;
    let mut history = Vec::new();

    while board.outcome().is_none() {
        let (evaluations, best) = searcher.evaluate(&board, to_move);
        let Some(best) = best else { break };
        board.set(best.row, best.col, to_move);
        history.push(HistoryEntry {
            player: to_move,
            row: best.row,
            col: best.col,
            score: best.score,
            evaluations,
            board: board.to_rows(),
        });
        to_move = to_move.opponent();
    }

    let mut result = GameResult::new(algorithm_name(use_alpha_beta));
    result.winner = board.outcome();
    result.total_moves = Some(history.len() as u64);
    result.game_history = Some(history);
    result.nodes_explored = searcher.nodes;
    result
}
