//! Game engines: Tic-Tac-Toe and Connect-4 by Minimax / Alpha-Beta, and
//! Tower of Hanoi by direct recursion.

pub mod connect4;
pub mod hanoi;
pub mod tictactoe;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::geometry::Position;
use crate::trace::Stopwatch;

pub use hanoi::{HanoiMove, HanoiState, Peg};
pub use tictactoe::{HistoryEntry, MoveEvaluation};

/// A board cell, or the player owning it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Piece {
    #[default]
    #[serde(rename = "", alias = " ")]
    Empty,
    X,
    O,
}

impl Piece {
    pub fn opponent(self) -> Piece {
        match self {
            Piece::X => Piece::O,
            Piece::O => Piece::X,
            Piece::Empty => Piece::Empty,
        }
    }

    /// Rejects `Empty` where a player is required.
    pub fn player(self) -> Result<Piece> {
        match self {
            Piece::Empty => Err(EngineError::invalid("player must be \"X\" or \"O\"")),
            piece => Ok(piece),
        }
    }
}

/// Final state of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    X,
    O,
    #[serde(rename = "draw")]
    Draw,
}

impl From<Piece> for Winner {
    fn from(piece: Piece) -> Self {
        match piece {
            Piece::X => Winner::X,
            Piece::O => Winner::O,
            Piece::Empty => Winner::Draw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicTacToeAction {
    #[default]
    FindMove,
    PlayGame,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game_type")]
pub enum GameRequest {
    #[serde(rename = "tic-tac-toe")]
    TicTacToe {
        #[serde(default)]
        action: TicTacToeAction,
        /// Position to move from; `find_move` on an absent board starts empty.
        #[serde(default)]
        board: Option<Vec<Vec<Piece>>>,
        #[serde(default = "default_player")]
        player: Piece,
        #[serde(default)]
        use_alpha_beta: bool,
        #[serde(default = "default_player")]
        first_player: Piece,
    },
    #[serde(rename = "tower-of-hanoi")]
    TowerOfHanoi {
        #[serde(default = "default_disks")]
        n_disks: u32,
    },
    #[serde(rename = "connect4")]
    Connect4 {
        #[serde(default)]
        board: Option<Vec<Vec<Piece>>>,
        #[serde(default = "default_player")]
        piece: Piece,
        #[serde(default = "default_depth")]
        depth: u32,
        #[serde(default = "default_true")]
        use_alpha_beta: bool,
    },
}

fn default_player() -> Piece {
    Piece::X
}

fn default_disks() -> u32 {
    3
}

fn default_depth() -> u32 {
    4
}

fn default_true() -> bool {
    true
}

/// Result of any game request. Only the fields relevant to the game are set.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GameResult {
    /// `"minimax"`, `"alpha_beta"` or `"recursive"`.
    pub algorithm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_move: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Winner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_history: Option<Vec<HistoryEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluations: Option<Vec<MoveEvaluation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_moves: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_disks: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<HanoiMove>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimal_moves: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_optimal: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_column: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    pub nodes_explored: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moves_evaluated: Option<usize>,
    /// Wall-clock milliseconds.
    pub execution_time: f64,
}

impl GameResult {
    pub(crate) fn new(algorithm: &str) -> Self {
        Self {
            algorithm: algorithm.to_string(),
            ..Self::default()
        }
    }
}

pub(crate) fn algorithm_name(use_alpha_beta: bool) -> &'static str {
    if use_alpha_beta {
        "alpha_beta"
    } else {
        "minimax"
    }
}

/// Plays one game request.
pub fn play_game(request: &GameRequest, config: &EngineConfig) -> Result<GameResult> {
    config.validate()?;
    let stopwatch = Stopwatch::start();
    let limits = &config.limits;

    let mut result = match request {
        GameRequest::TicTacToe {
            action,
            board,
            player,
            use_alpha_beta,
            first_player,
        } => match action {
            TicTacToeAction::FindMove => {
                let board = match board {
                    Some(rows) => tictactoe::Board::from_rows(rows)?,
                    None => tictactoe::Board::default(),
                };
                tictactoe::find_move(&board, player.player()?, *use_alpha_beta)
            }
            TicTacToeAction::PlayGame => {
                tictactoe::self_play(first_player.player()?, *use_alpha_beta)
            }
        },
        GameRequest::TowerOfHanoi { n_disks } => {
            if *n_disks == 0 || *n_disks > limits.max_hanoi_disks {
                return Err(EngineError::invalid(format!(
                    "n_disks must be in 1..={}, got {n_disks}",
                    limits.max_hanoi_disks
                )));
            }
            hanoi::solve(*n_disks)
        }
        GameRequest::Connect4 {
            board,
            piece,
            depth,
            use_alpha_beta,
        } => {
            if *depth == 0 || *depth > limits.max_game_depth {
                return Err(EngineError::invalid(format!(
                    "connect4 depth must be in 1..={}, got {depth}",
                    limits.max_game_depth
                )));
            }
            let board = match board {
                Some(rows) => connect4::Board::from_rows(rows)?,
                None => connect4::Board::default(),
            };
            connect4::best_move(&board, piece.player()?, *depth, *use_alpha_beta)
        }
    };

    result.execution_time = stopwatch.elapsed_ms();
    debug!(
        "{} game: {} nodes, {:.3} ms",
        result.algorithm, result.nodes_explored, result.execution_time
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_serialization() {
        let row: Vec<Piece> = serde_json::from_str(r#"["X", "", " ", "O"]"#).unwrap();
        assert_eq!(row, vec![Piece::X, Piece::Empty, Piece::Empty, Piece::O]);
        assert_eq!(serde_json::to_string(&Piece::Empty).unwrap(), r#""""#);
        assert_eq!(serde_json::to_string(&Winner::Draw).unwrap(), r#""draw""#);
    }

    #[test]
    fn test_hanoi_request_scenario() {
        let request: GameRequest =
            serde_json::from_str(r#"{"game_type": "tower-of-hanoi", "n_disks": 3}"#).unwrap();
        let result = play_game(&request, &EngineConfig::default()).unwrap();
        assert_eq!(result.total_moves, Some(7));
        assert_eq!(result.is_optimal, Some(true));
    }

    #[test]
    fn test_request_defaults() {
        let request: GameRequest = serde_json::from_str(r#"{"game_type": "connect4"}"#).unwrap();
        assert_eq!(
            request,
            GameRequest::Connect4 {
                board: None,
                piece: Piece::X,
                depth: 4,
                use_alpha_beta: true,
            }
        );
        let request: GameRequest =
            serde_json::from_str(r#"{"game_type": "tic-tac-toe", "action": "play_game"}"#).unwrap();
        assert!(matches!(
            request,
            GameRequest::TicTacToe {
                action: TicTacToeAction::PlayGame,
                first_player: Piece::X,
                use_alpha_beta: false,
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_out_of_range_parameters() {
        let config = EngineConfig::default();
        let deep = GameRequest::Connect4 {
            board: None,
            piece: Piece::O,
            depth: 9,
            use_alpha_beta: true,
        };
        assert!(play_game(&deep, &config).is_err());
        let no_disks = GameRequest::TowerOfHanoi { n_disks: 0 };
        assert!(play_game(&no_disks, &config).is_err());
        let no_player = GameRequest::TicTacToe {
            action: TicTacToeAction::FindMove,
            board: None,
            player: Piece::Empty,
            use_alpha_beta: true,
            first_player: Piece::X,
        };
        assert!(play_game(&no_player, &config).is_err());

        let mut raised = EngineConfig::default();
        raised.limits.max_hanoi_disks = 40;
        let many_disks = GameRequest::TowerOfHanoi { n_disks: 40 };
        assert!(matches!(
            play_game(&many_disks, &raised),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_tic_tac_toe_find_move_result_fields() {
        let request: GameRequest = serde_json::from_str(
            r#"{"game_type": "tic-tac-toe", "board": [["X","X",""],["O","O",""],["","",""]], "player": "X", "use_alpha_beta": true}"#,
        )
        .unwrap();
        let result = play_game(&request, &EngineConfig::default()).unwrap();
        assert_eq!(result.best_move, Some(Position::new(0, 2)));
        assert_eq!(result.algorithm, "alpha_beta");
        assert_eq!(result.moves_evaluated, Some(5));
        assert!(result.nodes_explored > 0);
    }
}
