//! Watch the agent in the terminal

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use trail_rl::TrainingLoop;

use crate::config::Config;
use crate::render::TerminalRenderer;

#[derive(Args, Debug)]
pub struct PlayArgs {
    /// Number of rendered episodes
    #[arg(short, long, default_value_t = 5)]
    episodes: usize,

    /// Pause between frames in milliseconds
    #[arg(short, long, default_value_t = 50)]
    delay_ms: u64,
}

pub async fn run(args: PlayArgs, config: Config) -> Result<()> {
    let store = config.persistence.store();
    let training = TrainingLoop::new(config.maze.clone(), &config.agent, config.training.clone())
        .context("Invalid training configuration")?;
    let mut training = super::resume_session(&store, training);

    training.set_renderer(Box::new(TerminalRenderer::stdout(Duration::from_millis(
        args.delay_ms,
    ))));

    let episodes = args.episodes;
    let (training, results) = super::run_until_shutdown(move |stop| {
        let mut results = Vec::with_capacity(episodes);
        for _ in 0..episodes {
            if stop.load(std::sync::atomic::Ordering::Relaxed) {
                break;
            }
            results.push(training.run_episode(true));
        }
        (training, results)
    })
    .await?;

    for summary in &results {
        println!(
            "Episode {}: reward {:.1}, steps {}, checkpoints {}/{}{}",
            summary.episode,
            summary.total_reward,
            summary.steps,
            summary.checkpoints_cleared,
            summary.checkpoint_count,
            if summary.truncated { " (step cap)" } else { "" }
        );
    }

    if config.persistence.autosave {
        super::save_session(&store, &training)?;
    }

    Ok(())
}
