//! Episode records and reward history

use serde::{Deserialize, Serialize};

use crate::state::Reward;

/// Outcome of one completed episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// 1-based episode number
    pub episode: u64,
    pub total_reward: Reward,
    pub steps: usize,
    pub checkpoints_cleared: usize,
    pub checkpoint_count: usize,
    /// Every checkpoint was cleared
    pub completed: bool,
    /// Stopped by the step cap rather than by the environment
    pub truncated: bool,
    /// Exploration rate after the end-of-episode decay
    pub epsilon: f64,
}

/// Per-episode rewards and their rolling averages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardHistory {
    rewards: Vec<Reward>,
    averages: Vec<Reward>,
    window: usize,
}

impl RewardHistory {
    pub fn new(window: usize) -> Self {
        Self {
            rewards: Vec::new(),
            averages: Vec::new(),
            window: window.max(1),
        }
    }

    /// Restore from persisted vectors
    pub fn from_parts(rewards: Vec<Reward>, averages: Vec<Reward>, window: usize) -> Self {
        Self {
            rewards,
            averages,
            window: window.max(1),
        }
    }

    /// Record an episode reward and return the updated rolling average
    pub fn push(&mut self, reward: Reward) -> Reward {
        self.rewards.push(reward);
        let avg = self.rolling_average();
        self.averages.push(avg);
        avg
    }

    /// Mean of the last `window` rewards, or of all of them if fewer.
    /// Zero when empty.
    pub fn rolling_average(&self) -> Reward {
        if self.rewards.is_empty() {
            return 0.0;
        }
        let start = self.rewards.len().saturating_sub(self.window);
        let recent = &self.rewards[start..];
        recent.iter().sum::<Reward>() / recent.len() as Reward
    }

    pub fn rewards(&self) -> &[Reward] {
        &self.rewards
    }

    pub fn averages(&self) -> &[Reward] {
        &self.averages
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }
}
