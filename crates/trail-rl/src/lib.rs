//! Trailblazer RL - tabular Q-learning for checkpoint mazes
//!
//! This crate provides the maze environment, the Q-learning agent, the
//! episode runner and training loop, plus the observer ports and snapshot
//! persistence around them.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::float_cmp)]
#![allow(clippy::similar_names)]

pub mod algorithm;
pub mod engine;
pub mod environment;
pub mod experience;
pub mod observer;
pub mod persistence;
pub mod state;

pub use algorithm::{QLearning, QTable, RLAlgorithm};
pub use engine::{EpisodeRunner, TrainingLoop, TrainingSummary};
pub use environment::{Environment, StepOutcome};
pub use experience::{EpisodeSummary, RewardHistory};
pub use observer::{
    ChannelMetricsSink, EpisodeMetrics, Frame, FrameRenderer, JsonLinesMetricsSink,
    LogMetricsSink, MetricsMessage, MetricsSink, ProgressReport,
};
pub use persistence::{AgentSnapshot, GameSnapshot, QTableEntry, SnapshotStore};
pub use state::{state_key, Action, Reward, StateKey};
