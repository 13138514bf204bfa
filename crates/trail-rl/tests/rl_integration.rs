//! Integration tests for the training loop
//!
//! These tests drive the agent, environment and persistence together.

#![allow(clippy::float_cmp)]

use std::sync::atomic::AtomicBool;

use rand::rngs::StdRng;
use rand::SeedableRng;

use trail_core::{AgentConfig, Grid, Maze, MazeConfig, Position, TrainingConfig};
use trail_rl::{
    Action, EpisodeRunner, Environment, QLearning, RLAlgorithm, SnapshotStore, StateKey,
    TrainingLoop,
};

fn training_loop(size: usize, seed: u64) -> TrainingLoop {
    TrainingLoop::new(
        MazeConfig {
            rows: size,
            cols: size,
            checkpoints: 2,
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

/// Agent on a 2x2 open grid with the checkpoint directly to its right
#[test]
fn test_single_step_completion_updates_q_value() {
    let grid = Grid::from_ascii(&["..", ".."]).unwrap();
    let maze = Maze::new(grid, vec![Position::new(0, 1)], Position::new(0, 0)).unwrap();
    let mut env = Environment::new(maze);
    let mut agent = QLearning::new(&AgentConfig::default());

    let state = env.reset();
    assert_eq!(state, StateKey::new(1, 0));

    let outcome = env.step(Action::Right);
    assert_eq!(outcome.reward, 20.0);
    assert!(outcome.done);

    let next = env.observe();
    agent.learn(state, Action::Right, outcome.reward, next);

    // 0 + 0.1 * (20 + 0.9 * 0 - 0)
    assert!((agent.q_values(state)[Action::Right.to_index()] - 2.0).abs() < 1e-12);
}

/// Greedy policy learned on a fixed corridor walks straight to the goal
#[test]
fn test_learns_corridor() {
    let grid = Grid::from_ascii(&["..."]).unwrap();
    let maze = Maze::new(grid, vec![Position::new(0, 2)], Position::new(0, 0)).unwrap();
    let mut env = Environment::new(maze);
    let mut agent = QLearning::new(&AgentConfig::default());
    let mut rng = StdRng::seed_from_u64(11);
    let runner = EpisodeRunner::new(1000);

    for episode in 1..=2000 {
        runner.run(&mut env, &mut agent, &mut rng, episode, None);
    }
    assert!((agent.epsilon() - 0.01).abs() < 1e-12);

    agent.set_epsilon(0.0);
    let summary = runner.run(&mut env, &mut agent, &mut rng, 2001, None);

    assert!(summary.completed);
    assert_eq!(summary.steps, 2);
    assert!((summary.total_reward - 19.9).abs() < 1e-9);
}

#[test]
fn test_training_session_statistics() {
    let mut training = training_loop(8, 2024);
    let summary = training.train(200, &AtomicBool::new(false));

    assert_eq!(summary.episodes, 200);
    assert_eq!(training.history().len(), 200);
    assert_eq!(training.history().averages().len(), 200);
    assert!((summary.epsilon - 0.995_f64.powi(200)).abs() < 1e-9);
    assert!(summary.table_size > 0);
    // clamped state space is 11 x 11
    assert!(summary.table_size <= 121);

    let rewards = training.history().rewards();
    let tail = &rewards[rewards.len() - 100..];
    let expected = tail.iter().sum::<f64>() / 100.0;
    assert!((summary.rolling_average - expected).abs() < 1e-9);
}

#[test]
fn test_seeded_sessions_match() {
    let stop = AtomicBool::new(false);
    let mut a = training_loop(10, 77);
    let mut b = training_loop(10, 77);
    a.train(100, &stop);
    b.train(100, &stop);

    assert_eq!(a.agent().snapshot(), b.agent().snapshot());
    assert_eq!(a.history().averages(), b.history().averages());
}

#[test]
fn test_session_survives_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());

    let mut training = training_loop(8, 5);
    training.train(40, &AtomicBool::new(false));
    store.save_game(&training.snapshot()).unwrap();
    store.save_agent(&training.agent().snapshot()).unwrap();

    let mut resumed = training_loop(8, 6);
    resumed.restore(store.load_game().unwrap()).unwrap();
    assert_eq!(resumed.episodes(), 40);
    assert_eq!(resumed.agent().q_table(), training.agent().q_table());
    assert_eq!(resumed.history().rewards(), training.history().rewards());
    assert_eq!(resumed.last_maze(), training.last_maze());
    assert_eq!(resumed.last_position(), training.last_position());

    let agent = QLearning::from_snapshot(store.load_agent().unwrap()).unwrap();
    assert_eq!(agent.q_table(), training.agent().q_table());
    assert_eq!(agent.epsilon(), training.agent().epsilon());

    resumed.train(10, &AtomicBool::new(false));
    assert_eq!(resumed.episodes(), 50);
}
