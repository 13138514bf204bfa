//! State, Action, and Reward types for RL

use serde::{Deserialize, Serialize};

use trail_core::Position;

/// Reward value from environment
pub type Reward = f64;

/// Number of discrete actions
pub const ACTION_COUNT: usize = 4;

/// Offsets are clamped to `[-STATE_CLAMP, STATE_CLAMP]` on each axis.
pub const STATE_CLAMP: i32 = 5;

/// Discretized state: clamped column/row offset from the agent to its
/// current target checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateKey {
    pub dx: i32,
    pub dy: i32,
}

impl StateKey {
    pub fn new(dx: i32, dy: i32) -> Self {
        Self {
            dx: dx.clamp(-STATE_CLAMP, STATE_CLAMP),
            dy: dy.clamp(-STATE_CLAMP, STATE_CLAMP),
        }
    }
}

impl std::fmt::Display for StateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.dx, self.dy)
    }
}

/// Compute the state key for an agent heading to `target`.
///
/// `dx = target.col - agent.col`, `dy = target.row - agent.row`, each clamped.
pub fn state_key(agent: Position, target: Position) -> StateKey {
    StateKey::new(signed_diff(target.col, agent.col), signed_diff(target.row, agent.row))
}

fn signed_diff(a: usize, b: usize) -> i32 {
    let magnitude = i32::try_from(a.abs_diff(b)).unwrap_or(i32::MAX);
    if a >= b {
        magnitude
    } else {
        -magnitude
    }
}

/// Movement action. The discriminant is the action id used by the value table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Action {
    /// All actions in id order
    pub const ALL: [Action; ACTION_COUNT] = [Action::Up, Action::Right, Action::Down, Action::Left];

    /// Convert action to index for the value table
    pub fn to_index(self) -> usize {
        self as usize
    }

    /// Create action from index
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// (row, col) delta applied by this action
    pub fn delta(self) -> (isize, isize) {
        match self {
            Action::Up => (-1, 0),
            Action::Right => (0, 1),
            Action::Down => (1, 0),
            Action::Left => (0, -1),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Up => "up",
            Action::Right => "right",
            Action::Down => "down",
            Action::Left => "left",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
