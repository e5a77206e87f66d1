//! Search Lab
//!
//! Command-line front end for the engine: run a pathfinding algorithm on a
//! generated grid and see the route, execute JSON requests, or list what the
//! engine supports.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{debug, info};

use searchlab::catalog;
use searchlab::geometry::{Heuristic, Movement, Position};
use searchlab::grid::{format_grid, generate_maze, generate_obstacles, Grid};
use searchlab::search::{run_search, Algorithm, SearchOptions, SearchResult};
use searchlab::{execute, EngineConfig, Request};

/// Runs search algorithms, puzzle solvers and game engines with replayable traces.
#[derive(Parser)]
#[command(name = "searchlab")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON engine configuration; omitted fields keep their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one pathfinding algorithm on a generated grid.
    Search(SearchArgs),
    /// Execute a JSON request read from a file, or from stdin with `-`.
    Request { path: PathBuf },
    /// List the available algorithms and simulation types.
    Algorithms,
}

#[derive(Args)]
struct SearchArgs {
    #[arg(long, default_value_t = 15)]
    rows: usize,
    #[arg(long, default_value_t = 15)]
    cols: usize,
    /// Carve a perfect maze instead of an open grid.
    #[arg(long, conflicts_with = "obstacles")]
    maze: bool,
    /// Turn each cell into a wall with this probability.
    #[arg(long)]
    obstacles: Option<f64>,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long, default_value = "astar")]
    algorithm: Algorithm,
    #[arg(long, value_enum, default_value_t = Heuristic::Manhattan)]
    heuristic: Heuristic,
    /// Allow diagonal moves.
    #[arg(long)]
    diagonal: bool,
    /// Start cell as `row,col`. Defaults to the top-left corner.
    #[arg(long)]
    start: Option<Position>,
    /// Goal cell as `row,col`. Defaults to the bottom-right corner.
    #[arg(long)]
    goal: Option<Position>,
    /// Print the full result as JSON instead of a rendered grid.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Search(args) => run_search_command(&args, &config),
        Command::Request { path } => run_request(&path, &config),
        Command::Algorithms => run_algorithms(),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = EngineConfig::from_json(&text)
        .with_context(|| format!("invalid config {}", path.display()))?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

fn build_grid(args: &SearchArgs, start: Position, goal: Position) -> Result<Grid> {
    let grid = if args.maze {
        generate_maze(args.rows, args.cols, start, goal, args.seed)?
    } else if let Some(density) = args.obstacles {
        generate_obstacles(args.rows, args.cols, density, start, goal, args.seed)?
    } else {
        Grid::new(args.rows, args.cols)
    };
    debug!(
        "Built {}x{} grid with {} open cells",
        grid.rows(),
        grid.cols(),
        grid.open_cells()
    );
    Ok(grid)
}

fn run_search_command(args: &SearchArgs, config: &EngineConfig) -> Result<()> {
    let start = args.start.unwrap_or(Position::new(0, 0));
    let goal = args
        .goal
        .unwrap_or(Position::new(args.rows as i32 - 1, args.cols as i32 - 1));
    let grid = build_grid(args, start, goal).context("failed to build grid")?;

    let options = SearchOptions {
        heuristic: args.heuristic,
        movement: if args.diagonal {
            Movement::EightWay
        } else {
            Movement::FourWay
        },
        seed: args.seed,
    };
    let result = run_search(args.algorithm, &grid, start, goal, &options, config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", render_search(&grid, &result, start, goal));
        println!("{:.3} ms", result.execution_time);
    }
    Ok(())
}

/// Grid with the route overlaid, followed by the result's statistics.
fn render_search(grid: &Grid, result: &SearchResult, start: Position, goal: Position) -> String {
    let mut output = format_grid(grid, &result.path, start, goal);
    output.push_str(&format!("\n\n{}: {:?}", result.algorithm, result.termination));
    if result.path_found {
        output.push_str(&format!(
            "\npath: {} cells, cost {:.2}",
            result.path.len(),
            result.path_cost
        ));
    }
    if let Some(message) = &result.message {
        output.push_str(&format!("\n{message}"));
    }
    output.push_str(&format!("\nnodes explored: {}", result.nodes_explored));
    output
}

fn run_request(path: &Path, config: &EngineConfig) -> Result<()> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read request from stdin")?;
        text
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("failed to read request {}", path.display()))?
    };

    let request = Request::from_json(&text)?;
    let response = execute(&request, config)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn run_algorithms() -> Result<()> {
    for algorithm in catalog::algorithms() {
        let optimal = if algorithm.optimal { "optimal" } else { "" };
        println!(
            "{:<20} {:<24} {:<14} {optimal}",
            algorithm.id, algorithm.name, algorithm.category
        );
    }
    println!();
    for simulation in catalog::simulation_types() {
        println!("{:<16} {}", simulation.id, simulation.algorithms.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bfs_render_snapshot() {
        let mut grid = Grid::new(3, 3);
        grid.set(Position::new(1, 1), searchlab::grid::WALL);
        let (start, goal) = (Position::new(0, 0), Position::new(2, 2));
        let result = run_search(
            Algorithm::Bfs,
            &grid,
            start,
            goal,
            &SearchOptions::default(),
            &EngineConfig::default(),
        )
        .unwrap();

        let rendered = format_grid(&grid, &result.path, start, goal);
        insta::assert_snapshot!(rendered, @r"
        S**
        .#*
        ..G
        ");
    }

    #[test]
    fn test_unreachable_goal_render() {
        let mut grid = Grid::new(3, 3);
        for col in 0..3 {
            grid.set(Position::new(1, col), searchlab::grid::WALL);
        }
        let (start, goal) = (Position::new(0, 0), Position::new(2, 2));
        let result = run_search(
            Algorithm::AStar,
            &grid,
            start,
            goal,
            &SearchOptions::default(),
            &EngineConfig::default(),
        )
        .unwrap();

        let rendered = render_search(&grid, &result, start, goal);
        assert!(rendered.starts_with("S..\n###\n..G\n\nastar: Exhausted"));
        assert!(!result.path_found);
    }

    #[test]
    fn test_cli_parses_search_flags() {
        let cli = Cli::try_parse_from([
            "searchlab",
            "search",
            "--algorithm",
            "dijkstra",
            "--maze",
            "--start",
            "1,1",
            "--heuristic",
            "octile",
        ])
        .unwrap();
        let Command::Search(args) = cli.command else {
            panic!("expected search subcommand");
        };
        assert_eq!(args.algorithm, Algorithm::Dijkstra);
        assert_eq!(args.heuristic, Heuristic::Octile);
        assert_eq!(args.start, Some(Position::new(1, 1)));
        assert!(args.maze);
    }

    #[test]
    fn test_cli_rejects_unknown_algorithm() {
        assert!(Cli::try_parse_from(["searchlab", "search", "--algorithm", "teleport"]).is_err());
    }
}
