//! Benchmarks for the search, puzzle and game engines.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use searchlab::config::EngineConfig;
use searchlab::games::connect4::{self, Board as Connect4Board};
use searchlab::games::Piece;
use searchlab::geometry::Position;
use searchlab::grid::{generate_maze, Grid};
use searchlab::puzzles::eight_puzzle::{self, Board as TileBoard};
use searchlab::puzzles::n_queens::NQueens;
use searchlab::puzzles::sudoku::Sudoku;
use searchlab::puzzles::{PuzzleAlgorithm, PuzzleHeuristic};
use searchlab::search::{run_search, Algorithm, SearchOptions};

/// Benchmark A* through a 61x61 generated maze.
fn bench_astar_maze(c: &mut Criterion) {
    let start = Position::new(1, 1);
    let goal = Position::new(59, 59);
    let grid = generate_maze(61, 61, start, goal, 7).unwrap();
    let config = EngineConfig::default();
    let options = SearchOptions::default();

    c.bench_function("astar_maze_61", |b| {
        b.iter(|| run_search(Algorithm::AStar, black_box(&grid), start, goal, &options, &config))
    });
}

/// Benchmark BFS corner to corner on an open grid.
fn bench_bfs_open(c: &mut Criterion) {
    let grid = Grid::new(50, 50);
    let config = EngineConfig::default();
    let options = SearchOptions::default();

    c.bench_function("bfs_open_50", |b| {
        b.iter(|| {
            run_search(
                Algorithm::Bfs,
                black_box(&grid),
                Position::new(0, 0),
                Position::new(49, 49),
                &options,
                &config,
            )
        })
    });
}

/// Benchmark enumerating all 92 solutions of 8-Queens.
fn bench_n_queens_all(c: &mut Criterion) {
    let limits = EngineConfig::default().limits;
    let solver = NQueens::new(8);

    c.bench_function("n_queens_8_all", |b| {
        b.iter(|| black_box(&solver).solve(true, &limits))
    });
}

/// Benchmark a standard newspaper Sudoku.
fn bench_sudoku(c: &mut Criterion) {
    let rows: Vec<Vec<u8>> = [
        "530070000", "600195000", "098000060", "800060003", "400803001", "700020006",
        "060000280", "000419005", "000080079",
    ]
    .iter()
    .map(|line| line.bytes().map(|b| b - b'0').collect())
    .collect();
    let puzzle = Sudoku::from_rows(&rows).unwrap();
    let limits = EngineConfig::default().limits;

    c.bench_function("sudoku_classic", |b| {
        b.iter(|| black_box(puzzle.clone()).solve(&limits))
    });
}

/// Benchmark a depth-5 Alpha-Beta search from an early Connect-4 position.
fn bench_connect4(c: &mut Criterion) {
    let mut board = Connect4Board::default();
    board.drop_piece(3, Piece::X);
    board.drop_piece(3, Piece::O);

    let mut group = c.benchmark_group("connect4");
    group.sample_size(20);
    group.bench_function("alpha_beta_depth_5", |b| {
        b.iter(|| connect4::best_move(black_box(&board), Piece::X, 5, true))
    });
    group.finish();
}

/// Benchmark A* on one of the hardest (31-move) 8-puzzle positions.
fn bench_eight_puzzle(c: &mut Criterion) {
    let board = TileBoard::from_rows(&[vec![8, 6, 7], vec![2, 5, 4], vec![3, 0, 1]]).unwrap();
    let limits = EngineConfig::default().limits;

    let mut group = c.benchmark_group("eight_puzzle");
    group.sample_size(10);
    group.bench_function("astar_manhattan", |b| {
        b.iter(|| {
            eight_puzzle::solve(
                black_box(board),
                PuzzleAlgorithm::AStar,
                PuzzleHeuristic::Manhattan,
                &limits,
            )
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_astar_maze,
    bench_bfs_open,
    bench_n_queens_all,
    bench_sudoku,
    bench_connect4,
    bench_eight_puzzle
);
criterion_main!(benches);
