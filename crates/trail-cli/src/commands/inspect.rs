//! Summaries of saved snapshots

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use trail_core::{render_ascii, TrailError};
use trail_rl::{AgentSnapshot, GameSnapshot, SnapshotStore};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Print as JSON
    #[arg(long)]
    json: bool,

    /// Draw the last maze with the agent's final position
    #[arg(long)]
    maze: bool,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    states: usize,
    epsilon: f64,
    alpha: f64,
    gamma: f64,
}

#[derive(Debug, Serialize)]
struct SessionInfo {
    session_id: String,
    episodes: u64,
    started_at: String,
    saved_at: String,
    last_reward: Option<f64>,
    rolling_average: Option<f64>,
    best_reward: Option<f64>,
}

#[derive(Debug, Serialize)]
struct Report {
    model: Option<ModelInfo>,
    session: Option<SessionInfo>,
}

pub fn run(args: &InspectArgs, config: &Config) -> Result<()> {
    let store = config.persistence.store();
    let agent = optional(store.load_agent()).context("Failed to read model snapshot")?;
    let game = optional(store.load_game()).context("Failed to read session snapshot")?;

    let report = Report {
        model: agent.as_ref().map(model_info),
        session: game.as_ref().map(session_info),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&store, &report);
    }

    if args.maze {
        match game.as_ref().and_then(|g| g.last_maze.as_ref().map(|m| (g, m))) {
            Some((g, maze)) => print!("\n{}", render_ascii(maze, g.agent_position, 0)),
            None => println!("\nNo maze saved"),
        }
    }

    Ok(())
}

fn optional<T>(result: trail_core::Result<T>) -> trail_core::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(TrailError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

fn model_info(snapshot: &AgentSnapshot) -> ModelInfo {
    ModelInfo {
        states: snapshot.q_table.len(),
        epsilon: snapshot.epsilon,
        alpha: snapshot.alpha,
        gamma: snapshot.gamma,
    }
}

fn session_info(snapshot: &GameSnapshot) -> SessionInfo {
    SessionInfo {
        session_id: snapshot.session_id.to_string(),
        episodes: snapshot.episodes,
        started_at: snapshot.started_at.to_rfc3339(),
        saved_at: snapshot.saved_at.to_rfc3339(),
        last_reward: snapshot.rewards_history.last().copied(),
        rolling_average: snapshot.avg_rewards_history.last().copied(),
        best_reward: snapshot.rewards_history.iter().copied().reduce(f64::max),
    }
}

fn print_report(store: &SnapshotStore, report: &Report) {
    println!("Saved State ({})", store.dir().display());
    println!("===========\n");

    match &report.model {
        Some(m) => {
            println!("Model:");
            println!("  states:   {}", m.states);
            println!("  epsilon:  {:.4}", m.epsilon);
            println!("  alpha:    {}", m.alpha);
            println!("  gamma:    {}", m.gamma);
        }
        None => println!("Model: none"),
    }

    match &report.session {
        Some(s) => {
            println!("Session {}:", s.session_id);
            println!("  episodes:        {}", s.episodes);
            println!("  started:         {}", s.started_at);
            println!("  saved:           {}", s.saved_at);
            if let Some(avg) = s.rolling_average {
                println!("  rolling average: {avg:.2}");
            }
            if let Some(best) = s.best_reward {
                println!("  best reward:     {best:.2}");
            }
        }
        None => println!("Session: none"),
    }
}
