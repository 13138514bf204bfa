//! Maze environment: agent position, checkpoint progress and the step function

use tracing::trace;

use trail_core::{Maze, Position};

use crate::state::{state_key, Action, Reward, StateKey};

/// Leaving the road (wall or grid edge). Ends the episode.
pub const OFF_ROAD_PENALTY: Reward = -10.0;

/// Cost of every successful move
pub const STEP_COST: Reward = -0.1;

/// Reaching the current checkpoint
pub const CHECKPOINT_REWARD: Reward = 10.0;

/// Reaching the last checkpoint. Replaces the checkpoint reward.
pub const COMPLETION_REWARD: Reward = 20.0;

/// Result of a single transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub reward: Reward,
    pub done: bool,
    /// Agent position after the step
    pub position: Position,
    /// The move was rejected (wall or out of bounds)
    pub blocked: bool,
    pub checkpoint_reached: bool,
    /// Every checkpoint has now been cleared
    pub completed: bool,
}

/// One maze instance plus the mutable agent state walking it
#[derive(Debug, Clone)]
pub struct Environment {
    maze: Maze,
    agent: Position,
    progress: usize,
    steps: usize,
}

impl Environment {
    pub fn new(maze: Maze) -> Self {
        let agent = maze.start();
        Self {
            maze,
            agent,
            progress: 0,
            steps: 0,
        }
    }

    /// Put the agent back on the start cell and clear progress
    pub fn reset(&mut self) -> StateKey {
        self.agent = self.maze.start();
        self.progress = 0;
        self.steps = 0;
        self.observe()
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn agent(&self) -> Position {
        self.agent
    }

    /// Index of the checkpoint currently targeted; equals the checkpoint count
    /// once all are cleared.
    pub fn progress(&self) -> usize {
        self.progress
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= self.maze.checkpoints().len()
    }

    /// Discretized state toward the current target
    pub fn observe(&self) -> StateKey {
        state_key(self.agent, self.maze.target(self.progress))
    }

    /// Apply `action` and return reward and termination.
    pub fn step(&mut self, action: Action) -> StepOutcome {
        self.steps += 1;

        let (d_row, d_col) = action.delta();
        let candidate = self
            .agent
            .offset(d_row, d_col)
            .filter(|p| self.maze.grid().is_road(*p));

        let Some(next) = candidate else {
            trace!(%action, agent = %self.agent, "Left the road");
            return StepOutcome {
                reward: OFF_ROAD_PENALTY,
                done: true,
                position: self.agent,
                blocked: true,
                checkpoint_reached: false,
                completed: false,
            };
        };

        self.agent = next;
        let mut outcome = StepOutcome {
            reward: STEP_COST,
            done: false,
            position: next,
            blocked: false,
            checkpoint_reached: false,
            completed: false,
        };

        if self.maze.checkpoints().get(self.progress) == Some(&next) {
            self.progress += 1;
            outcome.reward = CHECKPOINT_REWARD;
            outcome.checkpoint_reached = true;

            if self.is_complete() {
                outcome.reward = COMPLETION_REWARD;
                outcome.completed = true;
                outcome.done = true;
            }
            trace!(progress = self.progress, agent = %next, "Checkpoint reached");
        }

        outcome
    }

    pub fn into_maze(self) -> Maze {
        self.maze
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trail_core::Grid;

    fn open_2x2() -> Environment {
        let grid = Grid::from_ascii(&["..", ".."]).unwrap();
        let maze = Maze::new(grid, vec![Position::new(0, 1)], Position::new(0, 0)).unwrap();
        Environment::new(maze)
    }

    fn corridor() -> Environment {
        // checkpoints at columns 2 and 4 of a one-row corridor with a wall below
        let grid = Grid::from_ascii(&[".....", "#####"]).unwrap();
        let maze = Maze::new(
            grid,
            vec![Position::new(0, 2), Position::new(0, 4)],
            Position::new(0, 0),
        )
        .unwrap();
        Environment::new(maze)
    }

    #[test]
    fn test_single_checkpoint_completion() {
        let mut env = open_2x2();
        let outcome = env.step(Action::Right);

        assert_eq!(outcome.reward, 20.0);
        assert!(outcome.done);
        assert!(outcome.completed);
        assert_eq!(env.agent(), Position::new(0, 1));
        assert_eq!(env.progress(), 1);
    }

    #[test]
    fn test_leaving_grid_terminates_in_place() {
        let mut env = open_2x2();
        let outcome = env.step(Action::Up);

        assert_eq!(outcome.reward, -10.0);
        assert!(outcome.done);
        assert!(outcome.blocked);
        assert_eq!(outcome.position, Position::new(0, 0));
        assert_eq!(env.agent(), Position::new(0, 0));

        let outcome = env.step(Action::Left);
        assert_eq!(outcome.reward, -10.0);
        assert_eq!(env.agent(), Position::new(0, 0));
    }

    #[test]
    fn test_hitting_wall_terminates_in_place() {
        let mut env = corridor();
        let outcome = env.step(Action::Down);

        assert_eq!(outcome.reward, -10.0);
        assert!(outcome.done);
        assert_eq!(env.agent(), Position::new(0, 0));
        assert_eq!(env.progress(), 0);
    }

    #[test]
    fn test_step_cost_and_intermediate_checkpoint() {
        let mut env = corridor();

        let outcome = env.step(Action::Right);
        assert!((outcome.reward - (-0.1)).abs() < 1e-12);
        assert!(!outcome.done);

        let outcome = env.step(Action::Right);
        assert_eq!(outcome.reward, 10.0);
        assert!(outcome.checkpoint_reached);
        assert!(!outcome.done);
        assert_eq!(env.progress(), 1);

        env.step(Action::Right);
        let outcome = env.step(Action::Right);
        assert_eq!(outcome.reward, 20.0);
        assert!(outcome.done);
        assert!(env.is_complete());
        assert_eq!(env.steps(), 4);
    }

    #[test]
    fn test_checkpoints_must_be_taken_in_order() {
        let grid = Grid::from_ascii(&["....."]).unwrap();
        let maze = Maze::new(
            grid,
            vec![Position::new(0, 4), Position::new(0, 1)],
            Position::new(0, 0),
        )
        .unwrap();
        let mut env = Environment::new(maze);

        // Passing over the second checkpoint first earns nothing extra
        let outcome = env.step(Action::Right);
        assert!((outcome.reward - STEP_COST).abs() < 1e-12);
        assert_eq!(env.progress(), 0);
    }

    #[test]
    fn test_observe_tracks_target() {
        let mut env = corridor();
        assert_eq!(env.observe(), StateKey::new(2, 0));

        env.step(Action::Right);
        env.step(Action::Right);
        assert_eq!(env.observe(), StateKey::new(2, 0));

        env.step(Action::Right);
        env.step(Action::Right);
        // all cleared: target clamps to the last checkpoint
        assert_eq!(env.observe(), StateKey::new(0, 0));
    }

    #[test]
    fn test_reset() {
        let mut env = corridor();
        env.step(Action::Right);
        env.step(Action::Right);

        let state = env.reset();
        assert_eq!(env.agent(), Position::new(0, 0));
        assert_eq!(env.progress(), 0);
        assert_eq!(env.steps(), 0);
        assert_eq!(state, StateKey::new(2, 0));
    }
}
