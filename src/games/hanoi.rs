//! Tower of Hanoi: the classical recursive move sequence, and a peg model
//! that replays it against the stacking rule.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::GameResult;
use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Peg {
    A,
    B,
    C,
}

impl Peg {
    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Peg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// One disk transfer. `move` is numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HanoiMove {
    #[serde(rename = "move")]
    pub number: u64,
    pub disk: u32,
    pub from: Peg,
    pub to: Peg,
    pub description: String,
}

/// Three pegs, each a stack of disk sizes with the top at the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HanoiState {
    pegs: [Vec<u32>; 3],
}

impl HanoiState {
    /// All `n` disks on peg A.
    pub fn new(n: u32) -> Self {
        Self {
            pegs: [(1..=n).rev().collect(), Vec::new(), Vec::new()],
        }
    }

    #[cfg(test)]
    pub fn peg(&self, peg: Peg) -> &[u32] {
        &self.pegs[peg.index()]
    }

    /// Applies a move, rejecting one that takes the wrong disk or puts it on a smaller one.
    pub fn apply(&mut self, mv: &HanoiMove) -> Result<()> {
        let top = self.pegs[mv.from.index()].last().copied();
        if top != Some(mv.disk) {
            return Err(EngineError::invalid(format!(
                "move {}: disk {} is not on top of peg {}",
                mv.number, mv.disk, mv.from
            )));
        }
        if let Some(&below) = self.pegs[mv.to.index()].last() {
            if below < mv.disk {
                return Err(EngineError::invalid(format!(
                    "move {}: disk {} cannot rest on disk {below}",
                    mv.number, mv.disk
                )));
            }
        }
        self.pegs[mv.from.index()].pop();
        self.pegs[mv.to.index()].push(mv.disk);
        Ok(())
    }

    /// True once every disk sits on peg C.
    pub fn is_solved(&self) -> bool {
        self.pegs[0].is_empty() && self.pegs[1].is_empty()
    }
}

fn transfer(n: u32, from: Peg, to: Peg, via: Peg, moves: &mut Vec<HanoiMove>) {
    if n == 0 {
        return;
    }
    transfer(n - 1, from, via, to, moves);
    moves.push(HanoiMove {
        number: moves.len() as u64 + 1,
        disk: n,
        from,
        to,
        description: format!("Move disk {n} from {from} to {to}"),
    });
    transfer(n - 1, via, to, from, moves);
}

/// Move sequence taking `n` disks from A to C.
pub fn moves(n: u32) -> Vec<HanoiMove> {
    let mut moves = Vec::with_capacity((1usize << n) - 1);
    transfer(n, Peg::A, Peg::C, Peg::B, &mut moves);
    moves
}

pub fn solve(n_disks: u32) -> GameResult {
    let steps = moves(n_disks);
    let optimal = (1u64 << n_disks) - 1;

    // a sequence counts as optimal only if it also replays legally to peg C
    let mut state = HanoiState::new(n_disks);
    let legal = steps.iter().all(|mv| state.apply(mv).is_ok()) && state.is_solved();

    let mut result = GameResult::new("recursive");
    result.n_disks = Some(n_disks);
    result.total_moves = Some(steps.len() as u64);
    result.optimal_moves = Some(optimal);
    result.is_optimal = Some(legal && steps.len() as u64 == optimal);
    result.nodes_explored = steps.len() as u64;
    result.steps = Some(steps);
    result
}
