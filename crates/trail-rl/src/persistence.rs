//! Snapshot persistence for the agent and the training session
//!
//! Snapshots are plain JSON documents. The value table is stored as a sorted
//! list of entries since its keys are not strings.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use trail_core::{AgentConfig, Maze, Position, Result, TrailError};

use crate::state::ACTION_COUNT;

/// Default file name of the agent snapshot
pub const DEFAULT_MODEL_FILE: &str = "q_learning_model.json";

/// Default file name of the session snapshot
pub const DEFAULT_GAME_FILE: &str = "game_state.json";

/// One row of the value table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QTableEntry {
    pub dx: i32,
    pub dy: i32,
    pub values: [f64; ACTION_COUNT],
}

/// Persisted agent: value table plus its scalar parameters.
///
/// Missing fields fall back to the default agent parameters and an empty
/// table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSnapshot {
    pub q_table: Vec<QTableEntry>,
    pub alpha: f64,
    pub gamma: f64,
    pub epsilon: f64,
    pub epsilon_min: f64,
    pub epsilon_decay: f64,
}

impl Default for AgentSnapshot {
    fn default() -> Self {
        let config = AgentConfig::default();
        Self {
            q_table: Vec::new(),
            alpha: config.alpha,
            gamma: config.gamma,
            epsilon: config.epsilon_start,
            epsilon_min: config.epsilon_min,
            epsilon_decay: config.epsilon_decay,
        }
    }
}

/// Persisted training session counters and histories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub session_id: Uuid,
    pub episodes: u64,
    /// Reward accumulated since the last progress report
    pub window_reward: f64,
    pub agent: AgentSnapshot,
    pub last_maze: Option<Maze>,
    pub agent_position: Option<Position>,
    pub started_at: DateTime<Utc>,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub rewards_history: Vec<f64>,
    #[serde(default)]
    pub avg_rewards_history: Vec<f64>,
}

/// Directory-backed store for agent and session snapshots
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
    model_file: String,
    game_file: String,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            model_file: DEFAULT_MODEL_FILE.to_string(),
            game_file: DEFAULT_GAME_FILE.to_string(),
        }
    }

    pub fn with_file_names(mut self, model_file: impl Into<String>, game_file: impl Into<String>) -> Self {
        self.model_file = model_file.into();
        self.game_file = game_file.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(&self.model_file)
    }

    pub fn game_path(&self) -> PathBuf {
        self.dir.join(&self.game_file)
    }

    pub fn save_agent(&self, snapshot: &AgentSnapshot) -> Result<PathBuf> {
        let path = self.model_path();
        self.write_json(&path, snapshot)?;
        info!(
            "Model saved to {} ({} states)",
            path.display(),
            snapshot.q_table.len()
        );
        Ok(path)
    }

    pub fn load_agent(&self) -> Result<AgentSnapshot> {
        let path = self.model_path();
        let snapshot: AgentSnapshot = Self::read_json(&path)?;
        info!(
            "Model loaded from {} ({} states)",
            path.display(),
            snapshot.q_table.len()
        );
        Ok(snapshot)
    }

    pub fn save_game(&self, snapshot: &GameSnapshot) -> Result<PathBuf> {
        let path = self.game_path();
        self.write_json(&path, snapshot)?;
        info!(
            "Game saved to {} (episode {})",
            path.display(),
            snapshot.episodes
        );
        Ok(path)
    }

    pub fn load_game(&self) -> Result<GameSnapshot> {
        let path = self.game_path();
        let snapshot: GameSnapshot = Self::read_json(&path)?;
        info!(
            "Game loaded from {} (episode {})",
            path.display(),
            snapshot.episodes
        );
        Ok(snapshot)
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(value)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
        if !path.exists() {
            return Err(TrailError::NotFound(format!(
                "snapshot {} does not exist",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            TrailError::Persistence(format!("unreadable snapshot {}: {e}", path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_agent() -> AgentSnapshot {
        AgentSnapshot {
            q_table: vec![QTableEntry {
                dx: -1,
                dy: 4,
                values: [0.5, -1.0, 0.0, 2.25],
            }],
            alpha: 0.1,
            gamma: 0.9,
            epsilon: 0.4,
            epsilon_min: 0.01,
            epsilon_decay: 0.995,
        }
    }

    #[test]
    fn test_default_paths() {
        let store = SnapshotStore::new("save");
        assert_eq!(store.model_path(), PathBuf::from("save/q_learning_model.json"));
        assert_eq!(store.game_path(), PathBuf::from("save/game_state.json"));

        let store = store.with_file_names("m.json", "g.json");
        assert_eq!(store.model_path(), PathBuf::from("save/m.json"));
    }

    #[test]
    fn test_agent_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("nested"));

        store.save_agent(&sample_agent()).unwrap();
        assert_eq!(store.load_agent().unwrap(), sample_agent());
    }

    #[test]
    fn test_missing_snapshot_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        assert!(matches!(store.load_agent(), Err(TrailError::NotFound(_))));
        assert!(matches!(store.load_game(), Err(TrailError::NotFound(_))));
    }

    #[test]
    fn test_corrupt_snapshot_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        std::fs::write(store.model_path(), "{ not json").unwrap();
        assert!(matches!(
            store.load_agent(),
            Err(TrailError::Persistence(_))
        ));
    }

    #[test]
    fn test_partial_agent_snapshot_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        std::fs::write(store.model_path(), r#"{"q_table": [], "epsilon": 0.3}"#).unwrap();

        let snapshot = store.load_agent().unwrap();
        assert!(snapshot.q_table.is_empty());
        assert_eq!(snapshot.epsilon, 0.3);
        assert_eq!(snapshot.alpha, 0.1);
        assert_eq!(snapshot.gamma, 0.9);
        assert_eq!(snapshot.epsilon_min, 0.01);
        assert_eq!(snapshot.epsilon_decay, 0.995);
    }

    #[test]
    fn test_game_with_broken_maze_is_persistence_error() {
        let grid = trail_core::Grid::from_ascii(&["..", ".."]).unwrap();
        let maze = Maze::new(grid, vec![Position::new(1, 1)], Position::new(0, 0)).unwrap();
        let now = Utc::now();
        let game = GameSnapshot {
            session_id: Uuid::new_v4(),
            episodes: 3,
            window_reward: 0.0,
            agent: sample_agent(),
            last_maze: Some(maze),
            agent_position: Some(Position::new(0, 0)),
            started_at: now,
            saved_at: now,
            rewards_history: vec![1.0, 2.0, 3.0],
            avg_rewards_history: Vec::new(),
        };

        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        store.save_game(&game).unwrap();
        assert_eq!(store.load_game().unwrap().episodes, 3);

        let mut value = serde_json::to_value(&game).unwrap();
        value["last_maze"]["checkpoints"] = serde_json::json!([{"row": 9, "col": 9}]);
        std::fs::write(store.game_path(), value.to_string()).unwrap();
        assert!(matches!(
            store.load_game(),
            Err(TrailError::Persistence(_))
        ));
    }
}
