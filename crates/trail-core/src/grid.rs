//! Fixed-size road grid

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrailError};
use crate::types::{Cell, Position};

/// 4-adjacency offsets in (row, col) order: right, down, left, up.
pub(crate) const NEIGHBOR_OFFSETS: [(isize, isize); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// ROWS x COLS array of cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    cells: Array2<Cell>,
}

impl Grid {
    /// Create a grid filled with walls
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            cells: Array2::from_elem((rows, cols), Cell::Wall),
        }
    }

    /// Parse a grid from text rows: `#` is a wall, anything else is road.
    pub fn from_ascii(rows: &[&str]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.chars().count());
        if height == 0 || width == 0 {
            return Err(TrailError::InvalidMaze("empty grid text".to_string()));
        }

        let mut grid = Self::new(height, width);
        for (row, line) in rows.iter().enumerate() {
            if line.chars().count() != width {
                return Err(TrailError::InvalidMaze(format!(
                    "row {row} has {} cells, expected {width}",
                    line.chars().count()
                )));
            }
            for (col, ch) in line.chars().enumerate() {
                if ch != '#' {
                    grid.cells[(row, col)] = Cell::Road;
                }
            }
        }
        Ok(grid)
    }

    pub fn rows(&self) -> usize {
        self.cells.nrows()
    }

    pub fn cols(&self) -> usize {
        self.cells.ncols()
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.rows() && pos.col < self.cols()
    }

    pub fn get(&self, pos: Position) -> Option<Cell> {
        self.cells.get((pos.row, pos.col)).copied()
    }

    /// Set a cell. Out-of-bounds writes are ignored.
    pub fn set(&mut self, pos: Position, cell: Cell) {
        if let Some(slot) = self.cells.get_mut((pos.row, pos.col)) {
            *slot = cell;
        }
    }

    /// True when `pos` is inside the grid and a road cell
    pub fn is_road(&self, pos: Position) -> bool {
        self.get(pos).is_some_and(Cell::is_road)
    }

    /// Signed-coordinate variant of [`Grid::is_road`]; negative indices are
    /// simply out of bounds.
    pub fn is_road_at(&self, row: isize, col: isize) -> bool {
        match (usize::try_from(row), usize::try_from(col)) {
            (Ok(row), Ok(col)) => self.is_road(Position::new(row, col)),
            _ => false,
        }
    }

    /// All road cells in row-major order
    pub fn road_cells(&self) -> Vec<Position> {
        self.cells
            .indexed_iter()
            .filter(|(_, cell)| cell.is_road())
            .map(|((row, col), _)| Position::new(row, col))
            .collect()
    }

    pub fn road_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_road()).count()
    }

    /// In-bounds 4-neighbors of `pos`
    pub fn neighbors(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        NEIGHBOR_OFFSETS
            .iter()
            .filter_map(move |&(dr, dc)| pos.offset(dr, dc))
            .filter(move |&p| self.contains(p))
    }

    /// Partition road cells into 4-connected components.
    ///
    /// Components are discovered in row-major order of their first cell.
    pub fn components(&self) -> Vec<Vec<Position>> {
        let mut visited = Array2::from_elem(self.cells.raw_dim(), false);
        let mut components = Vec::new();

        for ((row, col), cell) in self.cells.indexed_iter() {
            if !cell.is_road() || visited[(row, col)] {
                continue;
            }

            let mut component = Vec::new();
            let mut stack = vec![Position::new(row, col)];
            visited[(row, col)] = true;

            while let Some(current) = stack.pop() {
                component.push(current);
                for next in self.neighbors(current) {
                    if self.is_road(next) && !visited[(next.row, next.col)] {
                        visited[(next.row, next.col)] = true;
                        stack.push(next);
                    }
                }
            }

            components.push(component);
        }

        components
    }

    /// True when all road cells form a single component (or there are none)
    pub fn is_connected(&self) -> bool {
        self.components().len() <= 1
    }
}

impl std::fmt::Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.cells.rows() {
            for cell in row {
                let ch = if cell.is_road() { '.' } else { '#' };
                write!(f, "{ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
