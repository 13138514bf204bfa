//! CLI command modules

pub mod config;
pub mod inspect;
pub mod play;
pub mod train;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use trail_core::TrailError;
use trail_rl::{QLearning, RLAlgorithm, SnapshotStore, TrainingLoop};

/// Run `work` on a blocking thread. A shutdown signal raises the stop flag
/// handed to it and then waits for the work to wind down.
pub async fn run_until_shutdown<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&AtomicBool) -> T + Send + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));
    let worker_stop = stop.clone();
    let mut task = tokio::task::spawn_blocking(move || work(&worker_stop));

    let output = tokio::select! {
        joined = &mut task => joined,
        () = crate::shutdown_signal() => {
            info!("Stopping after the current episode");
            stop.store(true, Ordering::Relaxed);
            task.await
        }
    };

    output.context("Worker thread panicked")
}

/// Pick up the saved session, then load the saved model on top of it.
///
/// The model file takes precedence over the agent stored with the session.
/// Anything missing or unreadable leaves the corresponding part fresh.
pub fn resume_session(store: &SnapshotStore, mut training: TrainingLoop) -> TrainingLoop {
    match store.load_game() {
        Ok(snapshot) => {
            if let Err(e) = training.restore(snapshot) {
                warn!("Could not restore saved session: {}. Starting fresh.", e);
            }
        }
        Err(TrailError::NotFound(_)) => info!("No saved session, starting fresh"),
        Err(e) => warn!("Could not load saved session: {}. Starting fresh.", e),
    }

    match store.load_agent().and_then(QLearning::from_snapshot) {
        Ok(agent) => {
            training = training.with_agent(agent);
            info!(
                "Using saved model with {} states (epsilon {:.3})",
                training.agent().q_table().len(),
                training.agent().epsilon()
            );
        }
        Err(TrailError::NotFound(_)) => info!("No saved model"),
        Err(e) => warn!("Could not load model: {}. Keeping the current agent.", e),
    }

    training
}

/// Persist both the model and the full session
pub fn save_session(store: &SnapshotStore, training: &TrainingLoop) -> Result<()> {
    store
        .save_agent(&training.agent().snapshot())
        .context("Failed to save model")?;
    store
        .save_game(&training.snapshot())
        .context("Failed to save session")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trail_core::{AgentConfig, MazeConfig, TrainingConfig};

    fn small_loop(seed: u64) -> TrainingLoop {
        TrainingLoop::new(
            MazeConfig {
                rows: 6,
                cols: 6,
                ..MazeConfig::default()
            },
            &AgentConfig::default(),
            TrainingConfig {
                seed: Some(seed),
                ..TrainingConfig::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_nothing_saved_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        let training = resume_session(&store, small_loop(1));
        assert_eq!(training.episodes(), 0);
        assert_eq!(training.agent().table_size(), 0);
    }

    #[test]
    fn test_train_then_play_then_train_shares_progress() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        let mut trained = small_loop(1);
        trained.train(20, &AtomicBool::new(false));
        save_session(&store, &trained).unwrap();

        let mut played = resume_session(&store, small_loop(2));
        assert_eq!(played.episodes(), 20);
        assert_eq!(played.agent().q_table(), trained.agent().q_table());
        for _ in 0..3 {
            played.run_episode(false);
        }
        save_session(&store, &played).unwrap();

        let resumed = resume_session(&store, small_loop(3));
        assert_eq!(resumed.episodes(), 23);
        assert_eq!(resumed.agent().q_table(), played.agent().q_table());
        assert_eq!(resumed.agent().epsilon(), played.agent().epsilon());
    }

    #[test]
    fn test_model_file_wins_over_session_agent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        let mut trained = small_loop(4);
        trained.train(10, &AtomicBool::new(false));
        store.save_game(&trained.snapshot()).unwrap();

        let mut newer = small_loop(5);
        newer.train(30, &AtomicBool::new(false));
        store.save_agent(&newer.agent().snapshot()).unwrap();

        let resumed = resume_session(&store, small_loop(6));
        assert_eq!(resumed.episodes(), 10);
        assert_eq!(resumed.agent().q_table(), newer.agent().q_table());
        assert_eq!(resumed.agent().epsilon(), newer.agent().epsilon());
    }

    #[test]
    fn test_invalid_model_keeps_session_agent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        let mut trained = small_loop(7);
        trained.train(10, &AtomicBool::new(false));
        save_session(&store, &trained).unwrap();

        let mut broken = trained.agent().snapshot();
        broken.epsilon_decay = 1.5;
        store.save_agent(&broken).unwrap();

        let resumed = resume_session(&store, small_loop(8));
        assert_eq!(resumed.episodes(), 10);
        assert_eq!(resumed.agent().q_table(), trained.agent().q_table());
        assert_eq!(resumed.agent().epsilon(), trained.agent().epsilon());
    }
}
