//! Maze generation: randomized carving, connectivity repair, checkpoint and
//! start placement.

use std::collections::HashSet;

use ndarray::Array2;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TrailError};
use crate::grid::Grid;
use crate::types::{Cell, MazeConfig, Position};

/// A generated maze instance: grid, ordered checkpoints and start cell.
///
/// Every checkpoint and the start are road cells; checkpoints are distinct
/// and there is at least one. Deserialization goes through [`Maze::new`],
/// so a loaded maze holds the same guarantees as a generated one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MazeParts")]
pub struct Maze {
    grid: Grid,
    checkpoints: Vec<Position>,
    start: Position,
}

/// Unchecked wire form of a [`Maze`]
#[derive(Deserialize)]
struct MazeParts {
    grid: Grid,
    checkpoints: Vec<Position>,
    start: Position,
}

impl TryFrom<MazeParts> for Maze {
    type Error = TrailError;

    fn try_from(parts: MazeParts) -> Result<Self> {
        Self::new(parts.grid, parts.checkpoints, parts.start)
    }
}

impl Maze {
    /// Assemble a maze from parts, checking the road invariants.
    pub fn new(grid: Grid, checkpoints: Vec<Position>, start: Position) -> Result<Self> {
        if checkpoints.is_empty() {
            return Err(TrailError::InvalidMaze("no checkpoints".to_string()));
        }
        let mut seen = HashSet::with_capacity(checkpoints.len());
        for &checkpoint in &checkpoints {
            if !grid.is_road(checkpoint) {
                return Err(TrailError::InvalidMaze(format!(
                    "checkpoint {checkpoint} is not a road cell"
                )));
            }
            if !seen.insert(checkpoint) {
                return Err(TrailError::InvalidMaze(format!(
                    "duplicate checkpoint {checkpoint}"
                )));
            }
        }
        if !grid.is_road(start) {
            return Err(TrailError::InvalidMaze(format!(
                "start {start} is not a road cell"
            )));
        }
        Ok(Self {
            grid,
            checkpoints,
            start,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn checkpoints(&self) -> &[Position] {
        &self.checkpoints
    }

    pub fn start(&self) -> Position {
        self.start
    }

    /// Checkpoint targeted at `progress`, clamped to the last one once all
    /// have been cleared.
    pub fn target(&self, progress: usize) -> Position {
        let idx = progress.min(self.checkpoints.len().saturating_sub(1));
        self.checkpoints[idx]
    }
}

/// Builds mazes of a fixed size
#[derive(Debug, Clone)]
pub struct MazeGenerator {
    config: MazeConfig,
}

impl MazeGenerator {
    /// Create a generator. Zero rows, columns or checkpoints are rejected here,
    /// before any generation is attempted.
    pub fn new(config: MazeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MazeConfig {
        &self.config
    }

    /// Generate a fresh maze. Never fails: degenerate layouts are patched.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Maze {
        let mut grid = Grid::new(self.config.rows, self.config.cols);
        carve(&mut grid, rng);
        let bridges = connect_regions(&mut grid, rng);
        let checkpoints = place_checkpoints(&mut grid, self.config.checkpoints, rng);

        let center = center_of(&grid);
        let start = grid.road_cells().choose(rng).copied().unwrap_or(center);

        debug!(
            rows = grid.rows(),
            cols = grid.cols(),
            roads = grid.road_count(),
            bridges,
            checkpoints = checkpoints.len(),
            "Generated maze"
        );

        Maze {
            grid,
            checkpoints,
            start,
        }
    }
}

fn center_of(grid: &Grid) -> Position {
    Position::new(grid.rows() / 2, grid.cols() / 2)
}

/// Randomized depth-first carve from a random cell.
///
/// Unvisited neighbors are pushed in shuffled order and every popped cell
/// becomes road. Connectivity of the result is not relied upon; callers run
/// [`connect_regions`] afterwards.
pub fn carve<R: Rng + ?Sized>(grid: &mut Grid, rng: &mut R) {
    if grid.rows() == 0 || grid.cols() == 0 {
        return;
    }

    let origin = Position::new(rng.gen_range(0..grid.rows()), rng.gen_range(0..grid.cols()));
    let mut visited = Array2::from_elem((grid.rows(), grid.cols()), false);
    let mut stack = vec![origin];

    while let Some(current) = stack.pop() {
        if visited[(current.row, current.col)] {
            continue;
        }
        grid.set(current, Cell::Road);
        visited[(current.row, current.col)] = true;

        let mut neighbors: Vec<Position> = grid
            .neighbors(current)
            .filter(|n| !visited[(n.row, n.col)])
            .collect();
        neighbors.shuffle(rng);
        stack.extend(neighbors);
    }
}

/// Join every road component into one.
///
/// For each pair of consecutive components a random representative is picked
/// from both and a monotone Manhattan path is carved between them, closing the
/// row gap first and then the column gap. Returns the number of paths carved.
pub fn connect_regions<R: Rng + ?Sized>(grid: &mut Grid, rng: &mut R) -> usize {
    let components = grid.components();
    if components.len() <= 1 {
        return 0;
    }

    for pair in components.windows(2) {
        let (Some(&from), Some(&to)) = (pair[0].choose(rng), pair[1].choose(rng)) else {
            continue;
        };
        carve_path(grid, from, to);
    }

    components.len() - 1
}

/// Turn every cell on the row-then-column walk from `from` to `to` into road.
pub fn carve_path(grid: &mut Grid, from: Position, to: Position) {
    let mut current = from;
    grid.set(current, Cell::Road);

    while current != to {
        if current.row < to.row {
            current.row += 1;
        } else if current.row > to.row {
            current.row -= 1;
        } else if current.col < to.col {
            current.col += 1;
        } else {
            current.col -= 1;
        }
        grid.set(current, Cell::Road);
    }
}

/// Pick up to `count` distinct road cells as the checkpoint sequence.
///
/// A grid without any road gets its center cell turned into road, which then
/// becomes the only checkpoint.
pub fn place_checkpoints<R: Rng + ?Sized>(
    grid: &mut Grid,
    count: usize,
    rng: &mut R,
) -> Vec<Position> {
    let roads = grid.road_cells();
    let checkpoints: Vec<Position> = roads.choose_multiple(rng, count).copied().collect();

    if checkpoints.is_empty() {
        let center = center_of(grid);
        grid.set(center, Cell::Road);
        debug!(%center, "No road cells, forcing center checkpoint");
        return vec![center];
    }

    checkpoints
}

/// Text frame of a maze: `#` wall, `.` road, `A` agent, digits for pending
/// checkpoints (1-based) and `*` for cleared ones.
pub fn render_ascii(maze: &Maze, agent: Option<Position>, progress: usize) -> String {
    let grid = maze.grid();
    let mut canvas: Vec<Vec<char>> = (0..grid.rows())
        .map(|row| {
            (0..grid.cols())
                .map(|col| {
                    if grid.is_road(Position::new(row, col)) {
                        '.'
                    } else {
                        '#'
                    }
                })
                .collect()
        })
        .collect();

    for (idx, checkpoint) in maze.checkpoints().iter().enumerate() {
        let mark = if idx < progress {
            '*'
        } else {
            u32::try_from(idx + 1)
                .ok()
                .and_then(|n| char::from_digit(n, 10))
                .unwrap_or('C')
        };
        canvas[checkpoint.row][checkpoint.col] = mark;
    }

    if let Some(agent) = agent.filter(|p| grid.contains(*p)) {
        canvas[agent.row][agent.col] = 'A';
    }

    let mut out = String::with_capacity(grid.rows() * (grid.cols() + 1));
    for line in canvas {
        out.extend(line);
        out.push('\n');
    }
    out
}
