/*
 * Copyright (C) 2023 Asim Ihsan
 * SPDX-License-Identifier: AGPL-3.0-only
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU Affero General Public License as published by the Free
 * Software Foundation, version 3.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT ANY
 * WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A
 * PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License along
 * with this program. If not, see <https://www.gnu.org/licenses/>
 */

//! Chapter 7, run one Wumpus world episode with a logical agent.
//!
//! By default the agent plays on its own and every turn is printed with the agent's belief grid.
//! With `--manual` each turn reads an action from stdin:
//!
//! ```text
//! f  forward      l  turn left     r  turn right
//! g  grab         s  shoot         c  climb
//!    (empty line) let the agent choose
//! q  quit
//! ```

use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use wumpus_world::{Action, Episode, EpisodeConfig, TurnResult};

#[derive(Parser, Debug)]
#[command(name = "wumpus-agent")]
#[command(about = "Run a logical agent through one Wumpus world episode", version)]
struct Cli {
    /// TOML file with episode settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Side length of the square cave
    #[arg(long)]
    size: Option<usize>,

    /// Chance of a pit in each square other than (1, 1)
    #[arg(long)]
    pit_probability: Option<f64>,

    /// Seed for cave generation
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many turns
    #[arg(long)]
    turn_limit: Option<u32>,

    /// Read actions from stdin instead of letting the agent play
    #[arg(long)]
    manual: bool,

    /// Print one JSON object per turn instead of grids
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn episode_config(&self) -> Result<EpisodeConfig> {
        let mut config = match &self.config {
            Some(path) => EpisodeConfig::load(path)?,
            None => EpisodeConfig::default(),
        };
        if let Some(size) = self.size {
            config.grid_size = size;
        }
        if let Some(pit_probability) = self.pit_probability {
            config.pit_probability = pit_probability;
        }
        if self.seed.is_some() {
            config.random_seed = self.seed;
        }
        if self.turn_limit.is_some() {
            config.turn_limit = self.turn_limit;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Force(Action),
    Policy,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let command = match line.trim().to_ascii_lowercase().as_str() {
        "" => Command::Policy,
        "f" => Command::Force(Action::Forward),
        "l" => Command::Force(Action::TurnLeft),
        "r" => Command::Force(Action::TurnRight),
        "g" => Command::Force(Action::Grab),
        "s" => Command::Force(Action::Shoot),
        "c" => Command::Force(Action::Climb),
        "q" => Command::Quit,
        _ => return None,
    };
    Some(command)
}

fn print_turn(episode: &Episode, result: &TurnResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(result)?);
        return Ok(());
    }
    println!(
        "turn {}: {} ({:?}) -> percepts: {}, score {:+} = {}",
        result.turn,
        result.action_taken,
        result.source,
        result.new_percepts,
        result.score_delta,
        result.score
    );
    println!("agent: {}", result.agent_state_snapshot);
    println!("{}", episode.inspect_belief());
    Ok(())
}

fn print_summary(episode: &Episode, json: bool) -> Result<()> {
    if json {
        let summary = serde_json::json!({
            "seed": episode.seed(),
            "outcome": episode.outcome(),
            "score": episode.score(),
            "turns": episode.turns(),
            "agent": episode.agent_state(),
            "belief": episode.inspect_belief(),
        });
        println!("{}", serde_json::to_string(&summary)?);
        return Ok(());
    }
    println!("cave:");
    println!("{}", episode.world());
    println!(
        "outcome: {}, score: {}, turns: {}",
        episode.outcome(),
        episode.score(),
        episode.turns()
    );
    if let Some(seed) = episode.seed() {
        println!("replay with --seed {}", seed);
    }
    Ok(())
}

fn play_manual(episode: &mut Episode, json: bool) -> Result<()> {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    while !episode.is_terminal() {
        if !json {
            eprint!("action [f l r g s c, enter = agent, q = quit]: ");
        }
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("failed to read action")?;
        let result = match parse_command(&line) {
            Some(Command::Quit) => break,
            Some(Command::Policy) => episode.step()?,
            Some(Command::Force(action)) => episode.force_action(action)?,
            None => {
                eprintln!("unknown action {:?}", line.trim());
                continue;
            }
        };
        print_turn(episode, &result, json)?;
    }
    Ok(())
}

fn play_auto(episode: &mut Episode, json: bool) -> Result<()> {
    while !episode.is_terminal() {
        let result = episode.step()?;
        print_turn(episode, &result, json)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.episode_config()?;
    let mut episode = Episode::new(&config)?;
    info!(seed = ?episode.seed(), manual = cli.manual, "cave generated");
    if !cli.json {
        println!("agent: {}", episode.agent_state());
        println!("percepts: {}", episode.percepts());
        println!("{}", episode.inspect_belief());
    }

    if cli.manual {
        play_manual(&mut episode, cli.json)?;
    } else {
        play_auto(&mut episode, cli.json)?;
    }
    print_summary(&episode, cli.json)
}
