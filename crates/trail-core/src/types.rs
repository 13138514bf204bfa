//! Common types used throughout Trailblazer

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrailError};

/// Kind of a single grid cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cell {
    #[default]
    Wall,
    Road,
}

impl Cell {
    pub fn is_road(self) -> bool {
        self == Cell::Road
    }
}

/// A (row, col) coordinate inside a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Apply a signed delta. Returns `None` when the result would be negative;
    /// the upper bound is the grid's business.
    pub fn offset(self, d_row: isize, d_col: isize) -> Option<Self> {
        Some(Self {
            row: self.row.checked_add_signed(d_row)?,
            col: self.col.checked_add_signed(d_col)?,
        })
    }
}

impl From<(usize, usize)> for Position {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Maze dimensions and checkpoint count
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MazeConfig {
    pub rows: usize,
    pub cols: usize,
    /// Upper bound on checkpoints per maze; fewer are placed on tiny grids.
    pub checkpoints: usize,
    /// Pixel size of one cell, consumed by renderers only.
    pub cell_size: u32,
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            rows: 30,
            cols: 30,
            checkpoints: 3,
            cell_size: 20,
        }
    }
}

impl MazeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(TrailError::Config(format!(
                "grid must have at least one row and one column, got {}x{}",
                self.rows, self.cols
            )));
        }
        if self.checkpoints == 0 {
            return Err(TrailError::Config(
                "checkpoint count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Q-learning hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Learning rate
    pub alpha: f64,
    /// Discount factor
    pub gamma: f64,
    pub epsilon_start: f64,
    pub epsilon_min: f64,
    /// Multiplicative decay applied once per episode
    pub epsilon_decay: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.9,
            epsilon_start: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.995,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, v: f64| {
            if v > 0.0 && v <= 1.0 {
                Ok(())
            } else {
                Err(TrailError::Config(format!("{name} must be in (0, 1], got {v}")))
            }
        };
        unit("alpha", self.alpha)?;
        unit("gamma", self.gamma)?;
        unit("epsilon_decay", self.epsilon_decay)?;
        if !(0.0..=1.0).contains(&self.epsilon_start) || !(0.0..=1.0).contains(&self.epsilon_min) {
            return Err(TrailError::Config(
                "epsilon values must be in [0, 1]".to_string(),
            ));
        }
        if self.epsilon_min > self.epsilon_start {
            return Err(TrailError::Config(format!(
                "epsilon_min ({}) exceeds epsilon_start ({})",
                self.epsilon_min, self.epsilon_start
            )));
        }
        Ok(())
    }
}

/// Episode and reporting parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub episodes: usize,
    /// Hard cap on steps per episode
    pub max_steps: usize,
    /// Episodes between progress reports
    pub report_interval: usize,
    /// Episodes covered by the rolling average reward
    pub rolling_window: usize,
    pub seed: Option<u64>,
    /// Run one rendered episode at every report boundary
    pub showcase_on_report: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 1000,
            max_steps: 1000,
            report_interval: 10,
            rolling_window: 100,
            seed: None,
            showcase_on_report: false,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 {
            return Err(TrailError::Config("max_steps must be at least 1".to_string()));
        }
        if self.report_interval == 0 {
            return Err(TrailError::Config(
                "report_interval must be at least 1".to_string(),
            ));
        }
        if self.rolling_window == 0 {
            return Err(TrailError::Config(
                "rolling_window must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_offset() {
        let p = Position::new(2, 3);
        assert_eq!(p.offset(-1, 0), Some(Position::new(1, 3)));
        assert_eq!(p.offset(0, 1), Some(Position::new(2, 4)));
        assert_eq!(Position::new(0, 0).offset(-1, 0), None);
        assert_eq!(Position::new(0, 0).offset(0, -1), None);
    }

    #[test]
    fn test_default_configs_are_valid() {
        assert!(MazeConfig::default().validate().is_ok());
        assert!(AgentConfig::default().validate().is_ok());
        assert!(TrainingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let config = MazeConfig {
            rows: 0,
            ..MazeConfig::default()
        };
        assert!(matches!(config.validate(), Err(TrailError::Config(_))));

        let config = MazeConfig {
            cols: 0,
            ..MazeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_agent_config_bounds() {
        let config = AgentConfig {
            alpha: 0.0,
            ..AgentConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AgentConfig {
            epsilon_min: 0.5,
            epsilon_start: 0.1,
            ..AgentConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cell_serialization() {
        let json = serde_json::to_string(&Cell::Road).unwrap();
        assert_eq!(json, "\"road\"");
        let parsed: Cell = serde_json::from_str("\"wall\"").unwrap();
        assert_eq!(parsed, Cell::Wall);
    }

    #[test]
    fn test_config_partial_deserialization() {
        let config: MazeConfig = serde_json::from_str(r#"{"rows": 5}"#).unwrap();
        assert_eq!(config.rows, 5);
        assert_eq!(config.cols, 30);
        assert_eq!(config.checkpoints, 3);
    }
}
