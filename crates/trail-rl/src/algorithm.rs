//! RL Algorithm trait and the tabular Q-learning agent

use std::collections::HashMap;

use rand::{Rng, RngCore};
use trail_core::{AgentConfig, Result, TrailError};

use crate::persistence::{AgentSnapshot, QTableEntry};
use crate::state::{Action, Reward, StateKey, ACTION_COUNT};

/// Trait for RL algorithms driven by the episode runner
pub trait RLAlgorithm: Send {
    /// Algorithm name
    fn name(&self) -> &str;

    /// Pick an action for `state`
    fn choose_action(&mut self, state: StateKey, rng: &mut dyn RngCore) -> Action;

    /// Update estimates from one observed transition
    fn learn(&mut self, state: StateKey, action: Action, reward: Reward, next_state: StateKey);

    /// Called once per completed episode
    fn decay_epsilon(&mut self);

    /// Current exploration rate
    fn epsilon(&self) -> f64;

    /// Number of states the algorithm has seen
    fn table_size(&self) -> usize;
}

/// Value table: state key -> one estimate per action.
///
/// Absent states read as all zeros. The table only ever grows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QTable {
    entries: HashMap<StateKey, [f64; ACTION_COUNT]>,
}

impl QTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Estimates for `state`, inserting a zero row on first access
    pub fn entry(&mut self, state: StateKey) -> &mut [f64; ACTION_COUNT] {
        self.entries.entry(state).or_insert([0.0; ACTION_COUNT])
    }

    /// Estimates for `state` without inserting
    pub fn values(&self, state: StateKey) -> [f64; ACTION_COUNT] {
        self.entries
            .get(&state)
            .copied()
            .unwrap_or([0.0; ACTION_COUNT])
    }

    pub fn contains(&self, state: StateKey) -> bool {
        self.entries.contains_key(&state)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &[f64; ACTION_COUNT])> {
        self.entries.iter()
    }
}

impl FromIterator<(StateKey, [f64; ACTION_COUNT])> for QTable {
    fn from_iter<I: IntoIterator<Item = (StateKey, [f64; ACTION_COUNT])>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Index of the highest estimate; ties go to the lowest index.
pub fn argmax(values: &[f64; ACTION_COUNT]) -> usize {
    let mut best = 0;
    for (idx, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] {
            best = idx;
        }
    }
    best
}

fn max_value(values: &[f64; ACTION_COUNT]) -> f64 {
    values[argmax(values)]
}

/// Q-Learning implementation (tabular, epsilon-greedy)
#[derive(Debug, Clone)]
pub struct QLearning {
    q_table: QTable,
    learning_rate: f64,
    discount_factor: f64,
    epsilon: f64,
    epsilon_min: f64,
    epsilon_decay: f64,
}

impl QLearning {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            q_table: QTable::new(),
            learning_rate: config.alpha,
            discount_factor: config.gamma,
            epsilon: config.epsilon_start,
            epsilon_min: config.epsilon_min,
            epsilon_decay: config.epsilon_decay,
        }
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    /// Estimates for `state`, zeros if never seen
    pub fn q_values(&self, state: StateKey) -> [f64; ACTION_COUNT] {
        self.q_table.values(state)
    }

    /// Greedy action for `state`, inserting it if unseen
    pub fn best_action(&mut self, state: StateKey) -> Action {
        let idx = argmax(self.q_table.entry(state));
        Action::from_index(idx).unwrap_or(Action::Up)
    }

    pub fn alpha(&self) -> f64 {
        self.learning_rate
    }

    pub fn gamma(&self) -> f64 {
        self.discount_factor
    }

    pub fn epsilon_min(&self) -> f64 {
        self.epsilon_min
    }

    pub fn epsilon_decay(&self) -> f64 {
        self.epsilon_decay
    }

    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon.clamp(0.0, 1.0);
    }

    /// Capture the table and scalar parameters for persistence
    pub fn snapshot(&self) -> AgentSnapshot {
        let mut q_table: Vec<QTableEntry> = self
            .q_table
            .iter()
            .map(|(key, values)| QTableEntry {
                dx: key.dx,
                dy: key.dy,
                values: *values,
            })
            .collect();
        q_table.sort_by_key(|e| (e.dx, e.dy));

        AgentSnapshot {
            q_table,
            alpha: self.learning_rate,
            gamma: self.discount_factor,
            epsilon: self.epsilon,
            epsilon_min: self.epsilon_min,
            epsilon_decay: self.epsilon_decay,
        }
    }

    /// Rebuild an agent from a snapshot; states missing from it read as zero.
    ///
    /// The scalar parameters are held to the same ranges as [`AgentConfig`].
    pub fn from_snapshot(snapshot: AgentSnapshot) -> Result<Self> {
        AgentConfig {
            alpha: snapshot.alpha,
            gamma: snapshot.gamma,
            epsilon_start: snapshot.epsilon,
            epsilon_min: snapshot.epsilon_min,
            epsilon_decay: snapshot.epsilon_decay,
        }
        .validate()
        .map_err(|e| TrailError::Persistence(format!("invalid agent snapshot: {e}")))?;

        let q_table = snapshot
            .q_table
            .into_iter()
            .map(|e| (StateKey::new(e.dx, e.dy), e.values))
            .collect();

        Ok(Self {
            q_table,
            learning_rate: snapshot.alpha,
            discount_factor: snapshot.gamma,
            epsilon: snapshot.epsilon,
            epsilon_min: snapshot.epsilon_min,
            epsilon_decay: snapshot.epsilon_decay,
        })
    }
}

impl RLAlgorithm for QLearning {
    fn name(&self) -> &str {
        "q_learning"
    }

    fn choose_action(&mut self, state: StateKey, rng: &mut dyn RngCore) -> Action {
        if rng.gen::<f64>() < self.epsilon {
            let idx = rng.gen_range(0..ACTION_COUNT);
            Action::from_index(idx).unwrap_or(Action::Up)
        } else {
            self.best_action(state)
        }
    }

    fn learn(&mut self, state: StateKey, action: Action, reward: Reward, next_state: StateKey) {
        let max_next_q = max_value(self.q_table.entry(next_state));
        let target = reward + self.discount_factor * max_next_q;

        let q_values = self.q_table.entry(state);
        let current_q = q_values[action.to_index()];
        q_values[action.to_index()] = current_q + self.learning_rate * (target - current_q);
    }

    fn decay_epsilon(&mut self) {
        self.epsilon = (self.epsilon * self.epsilon_decay).max(self.epsilon_min);
    }

    fn epsilon(&self) -> f64 {
        self.epsilon
    }

    fn table_size(&self) -> usize {
        self.q_table.len()
    }
}

impl Default for QLearning {
    fn default() -> Self {
        Self::new(&AgentConfig::default())
    }
}
