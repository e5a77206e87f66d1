//! Search and Game Solving Engine
//!
//! Grid pathfinding, classic puzzles and two-player games behind three entry
//! points: [`run_search`], [`solve_puzzle`] and [`play_game`]. Every result
//! carries an ordered trace of the algorithm's decisions plus the statistics
//! needed to display it.

pub mod catalog;
pub mod config;
pub mod error;
pub mod games;
pub mod geometry;
pub mod grid;
pub mod puzzles;
pub mod search;
pub mod trace;

use serde::{Deserialize, Serialize};

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use games::{play_game, GameRequest, GameResult};
pub use puzzles::{solve_puzzle, PuzzleRequest, PuzzleResult};
pub use search::{run_search, Algorithm, SearchRequest, SearchResult};

/// A request family the engine can answer.
///
/// Lets callers hold any request behind one interface and run it against a
/// configuration without matching on its kind.
pub trait Solve {
    type Output: Serialize;

    fn solve(&self, config: &EngineConfig) -> Result<Self::Output>;
}

impl Solve for SearchRequest {
    type Output = SearchResult;

    fn solve(&self, config: &EngineConfig) -> Result<SearchResult> {
        self.run(config)
    }
}

impl Solve for PuzzleRequest {
    type Output = PuzzleResult;

    fn solve(&self, config: &EngineConfig) -> Result<PuzzleResult> {
        solve_puzzle(self, config)
    }
}

impl Solve for GameRequest {
    type Output = GameResult;

    fn solve(&self, config: &EngineConfig) -> Result<GameResult> {
        play_game(self, config)
    }
}

/// Any engine call, tagged by `"operation"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Request {
    RunSearch(SearchRequest),
    SolvePuzzle(PuzzleRequest),
    PlayGame(GameRequest),
}

impl Request {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| EngineError::invalid(format!("request: {e}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Search(SearchResult),
    Puzzle(PuzzleResult),
    Game(GameResult),
}

pub fn execute(request: &Request, config: &EngineConfig) -> Result<Response> {
    Ok(match request {
        Request::RunSearch(request) => Response::Search(request.solve(config)?),
        Request::SolvePuzzle(request) => Response::Puzzle(request.solve(config)?),
        Request::PlayGame(request) => Response::Game(request.solve(config)?),
    })
}
