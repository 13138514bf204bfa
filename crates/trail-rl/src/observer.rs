//! Observer ports for the collaborators that consume training output
//!
//! Metrics sinks receive one record per completed episode plus periodic
//! progress reports. Renderers receive read-only frames after each step of a
//! rendered episode. Neither feeds anything back into training, and a failing
//! metrics sink never interrupts it.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};

use serde::{Deserialize, Serialize};
use tracing::debug;

use trail_core::{render_ascii, Grid, Maze, Position, Result, TrailError};

use crate::state::Reward;

/// Per-episode metrics record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeMetrics {
    pub episode: u64,
    pub total_reward: Reward,
    /// Mean reward over the rolling window
    pub rolling_average: Reward,
    pub epsilon: f64,
}

/// Emitted every `report_interval` episodes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub episode: u64,
    /// Mean reward of the episodes since the previous report
    pub window_mean: Reward,
    pub rolling_average: Reward,
    pub epsilon: f64,
    pub table_size: usize,
}

/// Receiver of training metrics
pub trait MetricsSink: Send {
    fn on_episode(&mut self, metrics: &EpisodeMetrics) -> Result<()>;

    fn on_progress(&mut self, _report: &ProgressReport) -> Result<()> {
        Ok(())
    }
}

/// Read-only view of the environment handed to renderers
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub maze: &'a Maze,
    pub agent: Position,
    pub progress: usize,
    pub episode: u64,
    pub step: usize,
    pub epsilon: f64,
    /// Reward accumulated so far in this episode
    pub episode_reward: Reward,
}

impl Frame<'_> {
    pub fn grid(&self) -> &Grid {
        self.maze.grid()
    }

    pub fn checkpoints(&self) -> &[Position] {
        self.maze.checkpoints()
    }

    pub fn to_ascii(&self) -> String {
        render_ascii(self.maze, Some(self.agent), self.progress)
    }
}

/// Receiver of per-step frames
pub trait FrameRenderer: Send {
    fn render(&mut self, frame: &Frame<'_>);
}

/// Writes per-episode metrics to the tracing log at debug level
#[derive(Debug, Default)]
pub struct LogMetricsSink;

impl MetricsSink for LogMetricsSink {
    fn on_episode(&mut self, m: &EpisodeMetrics) -> Result<()> {
        debug!(
            episode = m.episode,
            reward = m.total_reward,
            average = m.rolling_average,
            epsilon = m.epsilon,
            "Episode finished"
        );
        Ok(())
    }
}

/// Message carried by [`ChannelMetricsSink`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricsMessage {
    Episode(EpisodeMetrics),
    Progress(ProgressReport),
}

/// Forwards metrics over a channel, e.g. to a plotting thread
#[derive(Debug)]
pub struct ChannelMetricsSink {
    tx: Sender<MetricsMessage>,
}

impl ChannelMetricsSink {
    pub fn new(tx: Sender<MetricsMessage>) -> Self {
        Self { tx }
    }

    /// Create a sink together with its receiving end
    pub fn channel() -> (Self, Receiver<MetricsMessage>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(tx), rx)
    }

    fn send(&self, msg: MetricsMessage) -> Result<()> {
        self.tx
            .send(msg)
            .map_err(|_| TrailError::Internal("metrics receiver disconnected".to_string()))
    }
}

impl MetricsSink for ChannelMetricsSink {
    fn on_episode(&mut self, metrics: &EpisodeMetrics) -> Result<()> {
        self.send(MetricsMessage::Episode(*metrics))
    }

    fn on_progress(&mut self, report: &ProgressReport) -> Result<()> {
        self.send(MetricsMessage::Progress(*report))
    }
}

/// Appends one JSON object per episode to a file
#[derive(Debug)]
pub struct JsonLinesMetricsSink {
    writer: BufWriter<File>,
}

impl JsonLinesMetricsSink {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl MetricsSink for JsonLinesMetricsSink {
    fn on_episode(&mut self, metrics: &EpisodeMetrics) -> Result<()> {
        serde_json::to_writer(&mut self.writer, metrics)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
