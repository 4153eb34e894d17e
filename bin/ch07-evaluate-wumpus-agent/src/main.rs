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

//! Chapter 7, evaluate the logical agent over many random caves.
//!
//! Episode `i` uses seed `base + i`, so a single bad cave can be replayed with
//! `wumpus-agent --seed <base + i>`.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use wumpus_world::{Episode, EpisodeConfig, Outcome, Score, WumpusError};

#[derive(Parser, Debug)]
#[command(name = "evaluate-wumpus-agent")]
#[command(about = "Run the logical agent over many seeded Wumpus worlds", version)]
struct Cli {
    /// Number of episodes to run
    #[arg(long, default_value_t = 1000)]
    episodes: u64,

    /// TOML file with episode settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Side length of the square cave
    #[arg(long)]
    size: Option<usize>,

    /// Chance of a pit in each square other than (1, 1)
    #[arg(long)]
    pit_probability: Option<f64>,

    /// Seed of the first episode
    #[arg(long)]
    seed: Option<u64>,

    /// Stop each episode after this many turns
    #[arg(long)]
    turn_limit: Option<u32>,

    /// Print the report as JSON
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
struct EpisodeSummary {
    seed: u64,
    outcome: Outcome,
    has_gold: bool,
    score: Score,
    turns: u32,
}

fn run_episode(config: &EpisodeConfig, seed: u64) -> Result<EpisodeSummary, WumpusError> {
    let config = EpisodeConfig {
        random_seed: Some(seed),
        ..config.clone()
    };
    let mut episode = Episode::new(&config)?;
    episode.run()?;
    Ok(EpisodeSummary {
        seed,
        outcome: episode.outcome(),
        has_gold: episode.agent_state().has_gold,
        score: episode.score(),
        turns: episode.turns(),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
struct Report {
    episodes: usize,
    escaped_with_gold: usize,
    escaped_without_gold: usize,
    died: usize,
    unfinished: usize,
    mean_score: f64,
    mean_turns: f64,
    best_score: Option<Score>,
    worst_seed: Option<u64>,
}

impl Report {
    fn from_summaries(summaries: &[EpisodeSummary]) -> Self {
        let mut report = Report {
            episodes: summaries.len(),
            ..Report::default()
        };
        if summaries.is_empty() {
            return report;
        }
        for summary in summaries {
            match (summary.outcome, summary.has_gold) {
                (Outcome::Escaped, true) => report.escaped_with_gold += 1,
                (Outcome::Escaped, false) => report.escaped_without_gold += 1,
                (Outcome::Died, _) => report.died += 1,
                (Outcome::None, _) => report.unfinished += 1,
            }
        }
        let n = summaries.len() as f64;
        report.mean_score = summaries.iter().map(|s| s.score as f64).sum::<f64>() / n;
        report.mean_turns = summaries.iter().map(|s| f64::from(s.turns)).sum::<f64>() / n;
        report.best_score = summaries.iter().map(|s| s.score).max();
        report.worst_seed = summaries.iter().min_by_key(|s| s.score).map(|s| s.seed);
        report
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pct = |count: usize| 100.0 * count as f64 / self.episodes.max(1) as f64;
        writeln!(f, "episodes:             {}", self.episodes)?;
        writeln!(
            f,
            "escaped with gold:    {} ({:.1}%)",
            self.escaped_with_gold,
            pct(self.escaped_with_gold)
        )?;
        writeln!(
            f,
            "escaped without gold: {} ({:.1}%)",
            self.escaped_without_gold,
            pct(self.escaped_without_gold)
        )?;
        writeln!(f, "died:                 {} ({:.1}%)", self.died, pct(self.died))?;
        writeln!(
            f,
            "unfinished:           {} ({:.1}%)",
            self.unfinished,
            pct(self.unfinished)
        )?;
        writeln!(f, "mean score:           {:.2}", self.mean_score)?;
        write!(f, "mean turns:           {:.2}", self.mean_turns)?;
        if let Some(seed) = self.worst_seed {
            write!(f, "\nworst seed:           {}", seed)?;
        }
        Ok(())
    }
}

fn evaluate(config: &EpisodeConfig, base_seed: u64, episodes: u64) -> Result<Report> {
    let summaries = (0..episodes)
        .into_par_iter()
        .map(|i| run_episode(config, base_seed.wrapping_add(i)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Report::from_summaries(&summaries))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            // per-episode logs drown the report
            EnvFilter::new("warn")
        }
    });
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.episode_config()?;
    let base_seed = config.random_seed.unwrap_or(0);
    info!(
        episodes = cli.episodes,
        size = config.grid_size,
        pit_probability = config.pit_probability,
        base_seed,
        "evaluating"
    );
    let report = evaluate(&config, base_seed, cli.episodes)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }
    Ok(())
}
