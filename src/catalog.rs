//! Static listings of what the engine can run, for clients building menus.

use serde::Serialize;

use crate::search::Algorithm;

/// A pathfinding algorithm as presented to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlgorithmInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    /// Returns minimum-cost paths (A* given an admissible heuristic).
    pub optimal: bool,
}

/// A family of simulations and the solvers available for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationType {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub algorithms: Vec<&'static str>,
}

fn describe(algorithm: Algorithm) -> (&'static str, &'static str) {
    match algorithm {
        Algorithm::AStar => ("A* Search", "Informed"),
        Algorithm::Bfs => ("Breadth-First Search", "Uninformed"),
        Algorithm::Dfs => ("Depth-First Search", "Uninformed"),
        Algorithm::Dijkstra => ("Dijkstra", "Informed"),
        Algorithm::HillClimbing => ("Hill Climbing", "Local Search"),
        Algorithm::SimulatedAnnealing => ("Simulated Annealing", "Local Search"),
        Algorithm::Genetic => ("Genetic Algorithm", "Evolutionary"),
    }
}

pub fn algorithms() -> Vec<AlgorithmInfo> {
    Algorithm::ALL
        .into_iter()
        .map(|algorithm| {
            let (name, category) = describe(algorithm);
            AlgorithmInfo {
                id: algorithm.id(),
                name,
                category,
                optimal: algorithm.is_optimal(),
            }
        })
        .collect()
}

pub fn simulation_types() -> Vec<SimulationType> {
    vec![
        SimulationType {
            id: "pathfinding",
            name: "Pathfinding",
            description: "Find a route across a grid of open cells and walls",
            algorithms: Algorithm::ALL.into_iter().map(Algorithm::id).collect(),
        },
        SimulationType {
            id: "8-puzzle",
            name: "8-Puzzle",
            description: "Slide tiles on a 3x3 board into order",
            algorithms: vec!["astar", "bfs"],
        },
        SimulationType {
            id: "n-queens",
            name: "N-Queens",
            description: "Place N non-attacking queens on an NxN board",
            algorithms: vec!["backtracking"],
        },
        SimulationType {
            id: "sudoku",
            name: "Sudoku",
            description: "Complete a 9x9 grid so no row, column or box repeats a digit",
            algorithms: vec!["backtracking"],
        },
        SimulationType {
            id: "tic-tac-toe",
            name: "Tic-Tac-Toe",
            description: "Perfect play on a 3x3 board",
            algorithms: vec!["minimax", "alpha_beta"],
        },
        SimulationType {
            id: "connect4",
            name: "Connect 4",
            description: "Depth-limited play on a 6x7 board",
            algorithms: vec!["minimax", "alpha_beta"],
        },
        SimulationType {
            id: "tower-of-hanoi",
            name: "Tower of Hanoi",
            description: "Move a stack of disks between three pegs",
            algorithms: vec!["recursive"],
        },
    ]
}
