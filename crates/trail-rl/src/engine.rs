//! Episode runner and training loop

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, trace};
use uuid::Uuid;

use trail_core::{AgentConfig, Maze, MazeConfig, MazeGenerator, Position, Result, TrainingConfig};

use crate::algorithm::{QLearning, RLAlgorithm};
use crate::environment::Environment;
use crate::experience::{EpisodeSummary, RewardHistory};
use crate::observer::{EpisodeMetrics, Frame, FrameRenderer, MetricsSink, ProgressReport};
use crate::persistence::GameSnapshot;

/// Drives a single episode: observe, act, step, learn until termination or
/// the step cap.
#[derive(Debug, Clone, Copy)]
pub struct EpisodeRunner {
    max_steps: usize,
}

impl EpisodeRunner {
    pub fn new(max_steps: usize) -> Self {
        Self {
            max_steps: max_steps.max(1),
        }
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Run one episode on `env` from its start cell. Decays the agent's
    /// exploration rate exactly once when the episode ends.
    pub fn run<A: RLAlgorithm + ?Sized>(
        &self,
        env: &mut Environment,
        agent: &mut A,
        rng: &mut dyn RngCore,
        episode: u64,
        mut renderer: Option<&mut dyn FrameRenderer>,
    ) -> EpisodeSummary {
        let mut state = env.reset();
        let mut total_reward = 0.0;
        let mut done = false;

        if let Some(r) = renderer.as_deref_mut() {
            r.render(&frame(env, episode, agent.epsilon(), total_reward));
        }

        while !done && env.steps() < self.max_steps {
            let action = agent.choose_action(state, rng);
            let outcome = env.step(action);
            let next_state = env.observe();

            agent.learn(state, action, outcome.reward, next_state);
            trace!(%state, %action, reward = outcome.reward, %next_state, "Step");

            state = next_state;
            total_reward += outcome.reward;
            done = outcome.done;

            if let Some(r) = renderer.as_deref_mut() {
                r.render(&frame(env, episode, agent.epsilon(), total_reward));
            }
        }

        agent.decay_epsilon();

        EpisodeSummary {
            episode,
            total_reward,
            steps: env.steps(),
            checkpoints_cleared: env.progress(),
            checkpoint_count: env.maze().checkpoints().len(),
            completed: env.is_complete(),
            truncated: !done,
            epsilon: agent.epsilon(),
        }
    }
}

fn frame(env: &Environment, episode: u64, epsilon: f64, episode_reward: f64) -> Frame<'_> {
    Frame {
        maze: env.maze(),
        agent: env.agent(),
        progress: env.progress(),
        episode,
        step: env.steps(),
        epsilon,
        episode_reward,
    }
}

/// Training session statistics
#[derive(Debug, Clone, Serialize)]
pub struct TrainingSummary {
    pub session_id: Uuid,
    pub episodes: u64,
    pub epsilon: f64,
    pub table_size: usize,
    pub rolling_average: f64,
    pub last_reward: Option<f64>,
    pub started_at: DateTime<Utc>,
}

/// Runs episodes against freshly generated mazes, owning the agent, the
/// random source and the session counters.
pub struct TrainingLoop {
    generator: MazeGenerator,
    runner: EpisodeRunner,
    agent: QLearning,
    rng: StdRng,
    config: TrainingConfig,
    session_id: Uuid,
    started_at: DateTime<Utc>,
    episodes: u64,
    window_reward: f64,
    history: RewardHistory,
    last_maze: Option<Maze>,
    last_position: Option<Position>,
    metrics: Vec<Box<dyn MetricsSink>>,
    renderer: Option<Box<dyn FrameRenderer>>,
}

impl TrainingLoop {
    /// Create a training loop with a fresh agent. All three configurations are
    /// validated here.
    pub fn new(maze: MazeConfig, agent: &AgentConfig, training: TrainingConfig) -> Result<Self> {
        agent.validate()?;
        training.validate()?;
        let generator = MazeGenerator::new(maze)?;

        let rng = match training.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            generator,
            runner: EpisodeRunner::new(training.max_steps),
            agent: QLearning::new(agent),
            rng,
            history: RewardHistory::new(training.rolling_window),
            config: training,
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
            episodes: 0,
            window_reward: 0.0,
            last_maze: None,
            last_position: None,
            metrics: Vec::new(),
            renderer: None,
        })
    }

    /// Replace the agent, e.g. with one loaded from disk
    pub fn with_agent(mut self, agent: QLearning) -> Self {
        self.agent = agent;
        self
    }

    pub fn add_metrics_sink(&mut self, sink: Box<dyn MetricsSink>) {
        self.metrics.push(sink);
    }

    pub fn set_renderer(&mut self, renderer: Box<dyn FrameRenderer>) {
        self.renderer = Some(renderer);
    }

    pub fn agent(&self) -> &QLearning {
        &self.agent
    }

    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    pub fn history(&self) -> &RewardHistory {
        &self.history
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Maze of the most recent episode
    pub fn last_maze(&self) -> Option<&Maze> {
        self.last_maze.as_ref()
    }

    /// Agent position at the end of the most recent episode
    pub fn last_position(&self) -> Option<Position> {
        self.last_position
    }

    /// Run one episode on a newly generated maze.
    ///
    /// When `render` is set and a renderer is attached, every step is drawn.
    pub fn run_episode(&mut self, render: bool) -> EpisodeSummary {
        let maze = self.generator.generate(&mut self.rng);
        let mut env = Environment::new(maze);
        let episode = self.episodes + 1;

        let renderer = if render {
            self.renderer
                .as_mut()
                .map(|r| r.as_mut() as &mut dyn FrameRenderer)
        } else {
            None
        };

        let summary = self
            .runner
            .run(&mut env, &mut self.agent, &mut self.rng, episode, renderer);

        self.last_position = Some(env.agent());
        self.last_maze = Some(env.into_maze());
        self.record(&summary);

        summary
    }

    /// Run up to `episodes` episodes, checking `stop` between them.
    pub fn train(&mut self, episodes: usize, stop: &AtomicBool) -> TrainingSummary {
        info!(
            "Training for {} episodes (session {}, epsilon {:.3})",
            episodes,
            self.session_id,
            self.agent.epsilon()
        );

        for _ in 0..episodes {
            if stop.load(Ordering::Relaxed) {
                info!("Stop requested after episode {}", self.episodes);
                break;
            }

            let summary = self.run_episode(false);

            if self.config.showcase_on_report
                && self.renderer.is_some()
                && self.is_report_boundary(summary.episode)
            {
                self.run_episode(true);
            }
        }

        let summary = self.summary();
        info!(
            "Training finished: {} episodes, rolling average {:.2}, epsilon {:.3}",
            summary.episodes, summary.rolling_average, summary.epsilon
        );
        summary
    }

    pub fn summary(&self) -> TrainingSummary {
        TrainingSummary {
            session_id: self.session_id,
            episodes: self.episodes,
            epsilon: self.agent.epsilon(),
            table_size: self.agent.table_size(),
            rolling_average: self.history.rolling_average(),
            last_reward: self.history.rewards().last().copied(),
            started_at: self.started_at,
        }
    }

    /// Capture the session for persistence
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            session_id: self.session_id,
            episodes: self.episodes,
            window_reward: self.window_reward,
            agent: self.agent.snapshot(),
            last_maze: self.last_maze.clone(),
            agent_position: self.last_position,
            started_at: self.started_at,
            saved_at: Utc::now(),
            rewards_history: self.history.rewards().to_vec(),
            avg_rewards_history: self.history.averages().to_vec(),
        }
    }

    /// Resume a persisted session. The random source is left untouched.
    ///
    /// An invalid agent snapshot is rejected before any state changes.
    pub fn restore(&mut self, snapshot: GameSnapshot) -> Result<()> {
        self.agent = QLearning::from_snapshot(snapshot.agent)?;
        self.session_id = snapshot.session_id;
        self.started_at = snapshot.started_at;
        self.episodes = snapshot.episodes;
        self.window_reward = snapshot.window_reward;
        self.history = RewardHistory::from_parts(
            snapshot.rewards_history,
            snapshot.avg_rewards_history,
            self.config.rolling_window,
        );
        self.last_maze = snapshot.last_maze;
        self.last_position = snapshot.agent_position;

        info!(
            "Resumed session {} at episode {} (epsilon {:.3}, {} states)",
            self.session_id,
            self.episodes,
            self.agent.epsilon(),
            self.agent.table_size()
        );
        Ok(())
    }

    fn is_report_boundary(&self, episode: u64) -> bool {
        episode % self.config.report_interval as u64 == 0
    }

    fn record(&mut self, summary: &EpisodeSummary) {
        self.episodes = summary.episode;
        self.window_reward += summary.total_reward;
        let rolling_average = self.history.push(summary.total_reward);

        trace!(
            episode = summary.episode,
            reward = summary.total_reward,
            steps = summary.steps,
            cleared = summary.checkpoints_cleared,
            truncated = summary.truncated,
            "Episode complete"
        );

        let metrics = EpisodeMetrics {
            episode: summary.episode,
            total_reward: summary.total_reward,
            rolling_average,
            epsilon: summary.epsilon,
        };
        for sink in &mut self.metrics {
            if let Err(e) = sink.on_episode(&metrics) {
                debug!("Metrics delivery failed: {}", e);
            }
        }

        if self.is_report_boundary(summary.episode) {
            self.report(summary.episode, rolling_average);
        }
    }

    fn report(&mut self, episode: u64, rolling_average: f64) {
        let report = ProgressReport {
            episode,
            window_mean: self.window_reward / self.config.report_interval as f64,
            rolling_average,
            epsilon: self.agent.epsilon(),
            table_size: self.agent.table_size(),
        };
        self.window_reward = 0.0;

        info!(
            "Episode: {}, mean reward: {:.1}, rolling average: {:.1}, epsilon: {:.2}, states: {}",
            report.episode,
            report.window_mean,
            report.rolling_average,
            report.epsilon,
            report.table_size
        );

        for sink in &mut self.metrics {
            if let Err(e) = sink.on_progress(&report) {
                debug!("Progress delivery failed: {}", e);
            }
        }
    }
}
