//! Training command

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use trail_rl::{JsonLinesMetricsSink, LogMetricsSink, TrainingLoop};

use crate::config::Config;
use crate::render::TerminalRenderer;

/// Showcase frames are paced so a human can follow them
const SHOWCASE_DELAY: Duration = Duration::from_millis(30);

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Number of episodes to run (defaults to training.episodes)
    #[arg(short, long)]
    episodes: Option<usize>,

    /// Seed for reproducible mazes and exploration
    #[arg(short, long)]
    seed: Option<u64>,

    /// Ignore any saved session
    #[arg(long)]
    fresh: bool,

    /// Append per-episode metrics as JSON lines to this file
    #[arg(long, value_name = "PATH")]
    metrics: Option<PathBuf>,

    /// Render one episode at every progress report
    #[arg(long)]
    showcase: bool,
}

pub async fn run(args: TrainArgs, mut config: Config) -> Result<()> {
    if let Some(episodes) = args.episodes {
        config.training.episodes = episodes;
    }
    if args.seed.is_some() {
        config.training.seed = args.seed;
    }
    config.training.showcase_on_report |= args.showcase;

    let store = config.persistence.store();
    let mut training = TrainingLoop::new(config.maze.clone(), &config.agent, config.training.clone())
        .context("Invalid training configuration")?;

    if !args.fresh {
        training = super::resume_session(&store, training);
    }

    training.add_metrics_sink(Box::new(LogMetricsSink));
    if let Some(path) = &args.metrics {
        let sink = JsonLinesMetricsSink::create(path)
            .with_context(|| format!("Failed to open metrics file {}", path.display()))?;
        training.add_metrics_sink(Box::new(sink));
    }
    if config.training.showcase_on_report {
        training.set_renderer(Box::new(TerminalRenderer::stdout(SHOWCASE_DELAY)));
    }

    let episodes = config.training.episodes;
    let (training, summary) = super::run_until_shutdown(move |stop| {
        let summary = training.train(episodes, stop);
        (training, summary)
    })
    .await?;

    if config.persistence.autosave {
        super::save_session(&store, &training)?;
    }

    println!("Session:          {}", summary.session_id);
    println!("Episodes:         {}", summary.episodes);
    println!("Epsilon:          {:.4}", summary.epsilon);
    println!("States learned:   {}", summary.table_size);
    println!("Rolling average:  {:.2}", summary.rolling_average);

    Ok(())
}
