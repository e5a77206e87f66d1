//! Wall grids for pathfinding, plus maze and obstacle generators.
//!
//! The grid is stored as a flat row-major array where each cell is `0`
//! (open) or `1` (wall). It is immutable once handed to a search.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::geometry::{neighbors4, Movement, Position};

pub const OPEN: u8 = 0;
pub const WALL: u8 = 1;

/// Maze carving steps: two cells at a time so walls stay on even indices.
const CARVE_STEPS: [(i32, i32); 4] = [(0, 2), (2, 0), (0, -2), (-2, 0)];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<u8>,
}

impl Grid {
    /// An all-open grid.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, OPEN)
    }

    fn filled(rows: usize, cols: usize, value: u8) -> Self {
        Self {
            rows,
            cols,
            cells: vec![value; rows * cols],
        }
    }

    /// Builds a grid from nested rows, rejecting ragged or non-binary input.
    pub fn from_rows(rows: &[Vec<u8>]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if height == 0 || width == 0 {
            return Err(EngineError::invalid("grid must have at least one row and one column"));
        }

        let mut cells = Vec::with_capacity(height * width);
        for (r, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(EngineError::invalid(format!(
                    "grid row {r} has {} cells, expected {width}",
                    row.len()
                )));
            }
            if let Some(c) = row.iter().position(|&cell| cell > WALL) {
                return Err(EngineError::invalid(format!(
                    "grid cell ({r}, {c}) is {}, expected 0 or 1",
                    row[c]
                )));
            }
            cells.extend_from_slice(row);
        }

        Ok(Self {
            rows: height,
            cols: width,
            cells,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline(always)]
    fn index(&self, pos: Position) -> usize {
        pos.row as usize * self.cols + pos.col as usize
    }

    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        pos.in_bounds(self.rows, self.cols)
    }

    /// True for in-bounds open cells.
    #[inline]
    pub fn is_open(&self, pos: Position) -> bool {
        self.contains(pos) && self.cells[self.index(pos)] == OPEN
    }

    #[inline]
    pub fn is_wall(&self, pos: Position) -> bool {
        self.contains(pos) && self.cells[self.index(pos)] == WALL
    }

    /// Panics if `pos` is out of bounds.
    pub fn set(&mut self, pos: Position, value: u8) {
        let idx = self.index(pos);
        self.cells[idx] = value;
    }

    pub fn open_cells(&self) -> usize {
        self.cells.iter().filter(|&&cell| cell == OPEN).count()
    }

    /// Open neighbors of `pos` under the given movement model.
    pub fn open_neighbors(&self, pos: Position, movement: Movement) -> Vec<Position> {
        movement
            .neighbors(pos, self.rows, self.cols)
            .into_iter()
            .filter(|&next| self.is_open(next))
            .collect()
    }

    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.cells.chunks(self.cols).map(<[u8]>::to_vec).collect()
    }

    /// Checks that both endpoints are in bounds and open.
    pub fn check_endpoints(&self, start: Position, goal: Position) -> Result<()> {
        for (name, pos) in [("start", start), ("goal", goal)] {
            if !self.contains(pos) {
                return Err(EngineError::invalid(format!(
                    "{name} {pos} is outside the {}x{} grid",
                    self.rows, self.cols
                )));
            }
            if self.is_wall(pos) {
                return Err(EngineError::invalid(format!("{name} {pos} is a wall")));
            }
        }
        Ok(())
    }
}

impl TryFrom<Vec<Vec<u8>>> for Grid {
    type Error = EngineError;

    fn try_from(rows: Vec<Vec<u8>>) -> Result<Self> {
        Grid::from_rows(&rows)
    }
}

impl From<Grid> for Vec<Vec<u8>> {
    fn from(grid: Grid) -> Self {
        grid.to_rows()
    }
}

fn check_endpoint_bounds(rows: usize, cols: usize, start: Position, goal: Position) -> Result<()> {
    for pos in [start, goal] {
        if !pos.in_bounds(rows, cols) {
            return Err(EngineError::invalid(format!(
                "{pos} is outside the {rows}x{cols} grid"
            )));
        }
    }
    Ok(())
}

/// Generates a perfect maze by randomized depth-first carving.
///
/// Passages live on odd `(row, col)` lattice cells and the walls between them
/// on cells with one even index, so the open cells form a tree. An endpoint
/// off the lattice is joined through a single link cell: the endpoint itself
/// when it sits between two lattice cells, otherwise one of its sides, with
/// the remaining sides kept closed. Lattice cells those closed sides cut off
/// stay walls.
pub fn generate_maze(
    rows: usize,
    cols: usize,
    start: Position,
    goal: Position,
    seed: u64,
) -> Result<Grid> {
    if rows < 3 || cols < 3 {
        return Err(EngineError::invalid("maze needs at least 3 rows and 3 columns"));
    }
    check_endpoint_bounds(rows, cols, start, goal)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let start_links = link_candidates(rows, cols, start, &mut rng);
    let goal_links = link_candidates(rows, cols, goal, &mut rng);
    for &start_link in &start_links {
        for &goal_link in &goal_links {
            let endpoints = [(start, start_link), (goal, goal_link)];
            if let Some(grid) = carve(rows, cols, endpoints, &mut rng) {
                return Ok(grid);
            }
        }
    }
    Err(EngineError::invalid(format!(
        "cannot carve a {rows}x{cols} maze joining {start} and {goal}"
    )))
}

fn on_lattice(value: i32) -> bool {
    value % 2 == 1
}

/// Lattice cells a link cell (exactly one even index) sits between.
fn lattice_ends(rows: usize, cols: usize, link: Position) -> Vec<Position> {
    let deltas = if on_lattice(link.row) {
        [(0, -1), (0, 1)]
    } else {
        [(-1, 0), (1, 0)]
    };
    deltas
        .into_iter()
        .map(|delta| link.offset(delta))
        .filter(|end| end.in_bounds(rows, cols))
        .collect()
}

/// Ways to join `pos` to the lattice: `None` when it is a lattice cell.
fn link_candidates(
    rows: usize,
    cols: usize,
    pos: Position,
    rng: &mut StdRng,
) -> Vec<Option<Position>> {
    match (on_lattice(pos.row), on_lattice(pos.col)) {
        (true, true) => vec![None],
        (false, false) => {
            let mut links = neighbors4(pos, rows, cols);
            links.shuffle(rng);
            links.into_iter().map(Some).collect()
        }
        _ => vec![Some(pos)],
    }
}

/// Carves one maze for a choice of endpoint links, or `None` if the choice
/// would close a loop or leave an endpoint cut off.
fn carve(
    rows: usize,
    cols: usize,
    endpoints: [(Position, Option<Position>); 2],
    rng: &mut StdRng,
) -> Option<Grid> {
    let links: Vec<Position> = endpoints.iter().filter_map(|&(_, link)| link).collect();

    // sides of an even-even endpoint other than its link must stay closed
    let mut closed = FxHashSet::default();
    for &(pos, link) in &endpoints {
        if !on_lattice(pos.row) && !on_lattice(pos.col) {
            let others = neighbors4(pos, rows, cols).into_iter();
            closed.extend(others.filter(|&side| Some(side) != link));
        }
    }
    if links.iter().any(|link| closed.contains(link)) {
        return None;
    }

    // a link between two lattice cells is carved as soon as either is reached
    let mut forced: FxHashMap<Position, Vec<(Position, Position)>> = FxHashMap::default();
    let mut anchors = Vec::new();
    for &(pos, link) in &endpoints {
        let Some(link) = link else {
            anchors.push(pos);
            continue;
        };
        let ends = lattice_ends(rows, cols, link);
        if let &[a, b] = ends.as_slice() {
            forced.entry(a).or_default().push((link, b));
            forced.entry(b).or_default().push((link, a));
        }
        anchors.extend(ends);
    }

    let mut grid = Grid::filled(rows, cols, WALL);
    let origin = *anchors.first()?;
    let mut stack = Vec::new();
    open_lattice_cell(&mut grid, &mut stack, &forced, origin, rng);

    // each frame holds a cell and the carve directions not yet tried from it
    while let Some((cell, remaining)) = stack.last_mut() {
        let cell = *cell;
        let Some(step) = remaining.pop() else {
            stack.pop();
            continue;
        };

        let next = cell.offset(step);
        let passage = cell.offset((step.0 / 2, step.1 / 2));
        if grid.is_wall(next) && !closed.contains(&passage) {
            grid.set(passage, OPEN);
            open_lattice_cell(&mut grid, &mut stack, &forced, next, rng);
        }
    }

    if anchors.iter().any(|&anchor| !grid.is_open(anchor)) {
        return None;
    }
    for link in links {
        grid.set(link, OPEN);
    }
    for (pos, _) in endpoints {
        grid.set(pos, OPEN);
    }
    Some(grid)
}

/// Opens `cell` and, through forced links, every lattice cell tied to it.
fn open_lattice_cell(
    grid: &mut Grid,
    stack: &mut Vec<(Position, Vec<(i32, i32)>)>,
    forced: &FxHashMap<Position, Vec<(Position, Position)>>,
    cell: Position,
    rng: &mut StdRng,
) {
    grid.set(cell, OPEN);
    let mut pending = vec![cell];
    while let Some(cell) = pending.pop() {
        stack.push((cell, shuffled_steps(rng)));
        for &(link, other) in forced.get(&cell).into_iter().flatten() {
            if grid.is_wall(other) {
                grid.set(link, OPEN);
                grid.set(other, OPEN);
                pending.push(other);
            }
        }
    }
}

fn shuffled_steps(rng: &mut StdRng) -> Vec<(i32, i32)> {
    let mut steps = CARVE_STEPS.to_vec();
    steps.shuffle(rng);
    steps
}

/// Generates random obstacles: each cell is independently a wall with
/// probability `density`. `start` and `goal` are cleared afterwards.
pub fn generate_obstacles(
    rows: usize,
    cols: usize,
    density: f64,
    start: Position,
    goal: Position,
    seed: u64,
) -> Result<Grid> {
    if rows == 0 || cols == 0 {
        return Err(EngineError::invalid("grid must have at least one row and one column"));
    }
    if !(0.0..=1.0).contains(&density) {
        return Err(EngineError::invalid(format!(
            "obstacle density {density} is outside [0, 1]"
        )));
    }
    check_endpoint_bounds(rows, cols, start, goal)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut grid = Grid::new(rows, cols);
    for cell in grid.cells.iter_mut() {
        if rng.gen_bool(density) {
            *cell = WALL;
        }
    }

    grid.set(start, OPEN);
    grid.set(goal, OPEN);
    Ok(grid)
}

/// Renders a grid with an optional path overlaid.
///
/// `#` wall, `.` open, `*` path, `S` start, `G` goal. Rows are separated by
/// newlines with no trailing newline.
pub fn format_grid(grid: &Grid, path: &[Position], start: Position, goal: Position) -> String {
    let mut canvas: Vec<Vec<char>> = grid
        .to_rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|&cell| if cell == WALL { '#' } else { '.' })
                .collect()
        })
        .collect();

    let mut paint = |pos: Position, mark: char| {
        if grid.contains(pos) {
            canvas[pos.row as usize][pos.col as usize] = mark;
        }
    };
    for &pos in path {
        paint(pos, '*');
    }
    paint(start, 'S');
    paint(goal, 'G');

    canvas
        .into_iter()
        .map(|row| row.into_iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}
