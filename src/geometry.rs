//! 2D grid geometry: positions, movement models, and distance heuristics.
//!
//! Everything here is pure. Neighbor enumeration only checks bounds; wall
//! filtering belongs to `grid::Grid`.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// A grid cell address. Serializes as `[row, col]`.
///
/// Signed so that out-of-range input (negative indices) can be represented
/// and rejected instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    #[inline]
    pub const fn offset(self, delta: (i32, i32)) -> Self {
        Self::new(self.row + delta.0, self.col + delta.1)
    }

    #[inline]
    pub fn in_bounds(self, rows: usize, cols: usize) -> bool {
        self.row >= 0 && self.col >= 0 && (self.row as usize) < rows && (self.col as usize) < cols
    }

    /// True if `other` is one move away under `movement`.
    pub fn is_adjacent(self, other: Position, movement: Movement) -> bool {
        let dr = (self.row - other.row).abs();
        let dc = (self.col - other.col).abs();
        match movement {
            Movement::FourWay => dr + dc == 1,
            Movement::EightWay => dr.max(dc) == 1,
        }
    }
}

impl From<[i32; 2]> for Position {
    fn from([row, col]: [i32; 2]) -> Self {
        Self::new(row, col)
    }
}

impl From<Position> for [i32; 2] {
    fn from(pos: Position) -> Self {
        [pos.row, pos.col]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Parses `"row,col"`.
impl FromStr for Position {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (row, col) = s
            .split_once(',')
            .ok_or_else(|| EngineError::invalid(format!("expected row,col but got {s:?}")))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<i32>()
                .map_err(|e| EngineError::invalid(format!("bad coordinate {part:?}: {e}")))
        };
        Ok(Position::new(parse(row)?, parse(col)?))
    }
}

/// Orthogonal moves in expansion order: right, down, left, up.
pub const ORTHOGONAL: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// Diagonal moves, tried after the orthogonal ones.
pub const DIAGONAL: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

/// How an agent may move between cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    #[default]
    FourWay,
    /// Orthogonal moves cost 1, diagonal moves cost sqrt(2).
    EightWay,
}

impl Movement {
    pub fn neighbors(self, pos: Position, rows: usize, cols: usize) -> Vec<Position> {
        match self {
            Movement::FourWay => neighbors4(pos, rows, cols),
            Movement::EightWay => neighbors8(pos, rows, cols),
        }
    }

    /// Cost of a single move between adjacent cells.
    #[inline]
    pub fn step_cost(self, from: Position, to: Position) -> f64 {
        if from.row != to.row && from.col != to.col {
            std::f64::consts::SQRT_2
        } else {
            1.0
        }
    }
}

/// In-bounds orthogonal neighbors of `pos`.
pub fn neighbors4(pos: Position, rows: usize, cols: usize) -> Vec<Position> {
    ORTHOGONAL
        .iter()
        .map(|&delta| pos.offset(delta))
        .filter(|next| next.in_bounds(rows, cols))
        .collect()
}

/// In-bounds orthogonal and diagonal neighbors of `pos`.
pub fn neighbors8(pos: Position, rows: usize, cols: usize) -> Vec<Position> {
    ORTHOGONAL
        .iter()
        .chain(DIAGONAL.iter())
        .map(|&delta| pos.offset(delta))
        .filter(|next| next.in_bounds(rows, cols))
        .collect()
}

pub fn manhattan(a: Position, b: Position) -> f64 {
    ((a.row - b.row).abs() + (a.col - b.col).abs()) as f64
}

pub fn euclidean(a: Position, b: Position) -> f64 {
    let dr = (a.row - b.row) as f64;
    let dc = (a.col - b.col) as f64;
    (dr * dr + dc * dc).sqrt()
}

pub fn chebyshev(a: Position, b: Position) -> f64 {
    (a.row - b.row).abs().max((a.col - b.col).abs()) as f64
}

/// Exact cost of an obstacle-free 8-way path with diagonal cost sqrt(2).
pub fn octile(a: Position, b: Position) -> f64 {
    let dr = (a.row - b.row).abs() as f64;
    let dc = (a.col - b.col).abs() as f64;
    (dr + dc) + (std::f64::consts::SQRT_2 - 2.0) * dr.min(dc)
}

/// Distance estimate used by the informed and local-search algorithms.
///
/// Manhattan is admissible for four-way movement; Octile (and Euclidean and
/// Chebyshev, which never exceed it) for eight-way movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Heuristic {
    #[default]
    Manhattan,
    Euclidean,
    Chebyshev,
    Octile,
}

impl Heuristic {
    #[inline]
    pub fn distance(self, a: Position, b: Position) -> f64 {
        match self {
            Heuristic::Manhattan => manhattan(a, b),
            Heuristic::Euclidean => euclidean(a, b),
            Heuristic::Chebyshev => chebyshev(a, b),
            Heuristic::Octile => octile(a, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_corner_neighbors_are_bounds_checked() {
        let corner = Position::new(0, 0);
        assert_eq!(
            neighbors4(corner, 3, 3),
            vec![Position::new(0, 1), Position::new(1, 0)]
        );
        assert_eq!(neighbors8(corner, 3, 3).len(), 3);
        assert_eq!(neighbors8(Position::new(1, 1), 3, 3).len(), 8);
    }

    #[test]
    fn test_single_cell_grid_has_no_neighbors() {
        assert!(neighbors8(Position::new(0, 0), 1, 1).is_empty());
    }

    #[test]
    fn test_distances() {
        let a = Position::new(0, 0);
        let b = Position::new(3, 4);
        assert!((manhattan(a, b) - 7.0).abs() < EPS);
        assert!((euclidean(a, b) - 5.0).abs() < EPS);
        assert!((chebyshev(a, b) - 4.0).abs() < EPS);
        assert!((octile(a, b) - (1.0 + 3.0 * std::f64::consts::SQRT_2)).abs() < EPS);
    }

    #[test]
    fn test_octile_bounds_other_eight_way_heuristics() {
        let a = Position::new(2, 7);
        for row in 0..10 {
            for col in 0..10 {
                let b = Position::new(row, col);
                let oct = octile(a, b);
                assert!(chebyshev(a, b) <= oct + EPS);
                assert!(euclidean(a, b) <= oct + EPS);
                assert!(oct <= manhattan(a, b) + EPS);
            }
        }
    }

    #[test]
    fn test_adjacency_follows_movement_model() {
        let a = Position::new(1, 1);
        assert!(a.is_adjacent(Position::new(1, 2), Movement::FourWay));
        assert!(!a.is_adjacent(Position::new(2, 2), Movement::FourWay));
        assert!(a.is_adjacent(Position::new(2, 2), Movement::EightWay));
        assert!(!a.is_adjacent(a, Movement::EightWay));
    }

    #[test]
    fn test_position_parsing_and_serde() {
        assert_eq!("3, 4".parse::<Position>().unwrap(), Position::new(3, 4));
        assert!("34".parse::<Position>().is_err());
        let json = serde_json::to_string(&Position::new(2, 5)).unwrap();
        assert_eq!(json, "[2,5]");
        let back: Position = serde_json::from_str("[7,1]").unwrap();
        assert_eq!(back, Position::new(7, 1));
    }
}
