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

//! Wumpus world logical agent.
//!
//! A knowledge-based agent explores a partially observable cave, infers which unvisited squares
//! are free of pits and of the Wumpus, and plans its way to the gold and back out again.
//!
//! See:
//! -  Chapter 7: Logical Agents, section 7.2 The Wumpus World

pub mod agent;
pub mod agent_state;
pub mod config;
pub mod episode;
pub mod grid;
pub mod knowledge_base;
pub mod planner;
pub mod world;

pub use agent::{LogicalAgent, Policy, Rule};
pub use agent_state::AgentState;
pub use config::EpisodeConfig;
pub use episode::{new_episode, ActionSource, Episode, Outcome, TurnResult};
pub use grid::{Action, Cell, Orientation};
pub use knowledge_base::{BeliefCell, Hazard, KnowledgeBase, Status, WorldModel};
pub use planner::Path;
pub use world::{CellOutcome, PerceptSet, WumpusWorld};

pub type Score = i64;
pub type Rng = rand_pcg::Pcg64;
pub type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;
pub type HashSet<K> = rustc_hash::FxHashSet<K>;

/// Wumpus world error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WumpusError {
    /// The grid must be at least 2x2.
    #[error("grid size must be at least 2, got {0}")]
    InvalidGridSize(usize),

    /// Pit probability must lie in [0, 1].
    #[error("pit probability must be in [0, 1], got {0}")]
    InvalidPitProbability(f64),

    /// Configuration file could not be read.
    #[error("failed to read config {path}: {message}")]
    ConfigRead {
        /// Path of the config file.
        path: String,
        /// Underlying I/O error.
        message: String,
    },

    /// Configuration file is not valid TOML for an episode config.
    #[error("failed to parse config {path}: {message}")]
    ConfigParse {
        /// Path of the config file.
        path: String,
        /// Underlying parse error.
        message: String,
    },

    /// The knowledge base derived both Safe and Confirmed for the same square. This is a bug in
    /// the world generator or in the update order, never a condition to recover from.
    #[error("inconsistent belief about {hazard} at {cell}")]
    InconsistentBelief {
        /// Square the contradiction was found at.
        cell: Cell,
        /// Which hazard the contradiction is about.
        hazard: Hazard,
    },

    /// A square outside the grid was told to the knowledge base.
    #[error("{cell} is outside the {size}x{size} grid")]
    CellOutOfBounds {
        /// The offending square.
        cell: Cell,
        /// Side length of the grid.
        size: usize,
    },

    /// No path through OK squares reaches any target.
    #[error("no safe path from {from}")]
    NoSafePath {
        /// Square the search started from.
        from: Cell,
    },

    /// The episode already ended.
    #[error("episode is over")]
    EpisodeOver,
}

/// An Agent acts in a Performance, Environment, Action, Sensing (PEAS) cycle.
/// For a given Perception, the Agent will return an Action.
///
/// Notice that the Agent is not aware of an Environment, it's only interface is the Perception
/// coming in then the Action going out. Unlike a reflex agent, a knowledge-based agent can fail
/// to decide, e.g. when its beliefs contradict each other.
pub trait Agent {
    type Action;
    type Percept;
    type Error;

    fn act(&mut self, percept: &Self::Percept) -> Result<Self::Action, Self::Error>;
}
