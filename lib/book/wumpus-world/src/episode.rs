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

//! One episode of the Wumpus world: a generated cave, one agent, and the turn loop between them.
//!
//! Every turn is the same pipeline whether the action comes from the agent's policy or from a
//! driver overriding it: decide, apply to the world, perceive, update the knowledge base, score.

use rand::Rng as _;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::agent::LogicalAgent;
use crate::agent_state::AgentState;
use crate::config::EpisodeConfig;
use crate::grid::{Action, Cell};
use crate::knowledge_base::WorldModel;
use crate::world::{PerceptSet, WumpusWorld};
use crate::{Agent, Score, WumpusError};

pub const ACTION_COST: Score = 1;
pub const ARROW_COST: Score = 10;
pub const DEATH_PENALTY: Score = 1000;
pub const GOLD_REWARD: Score = 1000;

/// How an episode ended. `None` while it is still running, and also when the turn limit stopped
/// it first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    None,
    Escaped,
    Died,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionSource {
    Policy,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnResult {
    pub turn: u32,
    pub source: ActionSource,
    pub action_taken: Action,
    pub new_percepts: PerceptSet,
    pub agent_state_snapshot: AgentState,
    pub score_delta: Score,
    pub score: Score,
    pub terminal: bool,
    pub outcome: Outcome,
}

pub fn new_episode(config: &EpisodeConfig) -> Result<Episode, WumpusError> {
    Episode::new(config)
}

pub struct Episode {
    world: WumpusWorld,
    agent: LogicalAgent,
    seed: Option<u64>,
    turn_limit: u32,
    turns: u32,
    score: Score,
    percepts: PerceptSet,
    outcome: Outcome,
    halted: bool,
}

impl Episode {
    /// Generate a cave from `config` and place the agent at (1, 1). Without a configured seed one
    /// is drawn at random and kept, see `seed`.
    pub fn new(config: &EpisodeConfig) -> Result<Self, WumpusError> {
        config.validate()?;
        let seed = config
            .random_seed
            .unwrap_or_else(|| rand::thread_rng().gen());
        let world = WumpusWorld::generate(config.grid_size, config.pit_probability, seed)?;
        let mut episode = Self::from_world(world, config)?;
        episode.seed = Some(seed);
        Ok(episode)
    }

    /// Start an episode in a given cave. `config.grid_size` and `config.pit_probability` are
    /// ignored, the cave decides those.
    pub fn from_world(world: WumpusWorld, config: &EpisodeConfig) -> Result<Self, WumpusError> {
        let config = EpisodeConfig {
            grid_size: world.size(),
            ..config.clone()
        };
        config.validate()?;
        let mut agent = LogicalAgent::new(world.size(), config.policy.clone());
        let percepts = world.percepts_at(Cell::ORIGIN);
        agent.observe(&percepts)?;
        info!(size = world.size(), %percepts, "episode started");
        Ok(Self {
            world,
            agent,
            seed: config.random_seed,
            turn_limit: config.effective_turn_limit(),
            turns: 0,
            score: 0,
            percepts,
            outcome: Outcome::None,
            halted: false,
        })
    }

    /// Let the agent's policy choose and perform one action.
    pub fn step(&mut self) -> Result<TurnResult, WumpusError> {
        self.tick(None)
    }

    /// Perform `action` instead of what the policy would choose. An action that makes no sense
    /// right now still costs a turn.
    pub fn force_action(&mut self, action: Action) -> Result<TurnResult, WumpusError> {
        self.tick(Some(action))
    }

    /// Step until the episode is over.
    pub fn run(&mut self) -> Result<Vec<TurnResult>, WumpusError> {
        let mut results = Vec::new();
        while !self.is_terminal() {
            results.push(self.step()?);
        }
        Ok(results)
    }

    fn tick(&mut self, forced: Option<Action>) -> Result<TurnResult, WumpusError> {
        if self.is_terminal() {
            return Err(WumpusError::EpisodeOver);
        }
        let result = self.tick_inner(forced);
        if let Err(e) = &result {
            error!(error = %e, turn = self.turns, "halting episode");
            self.halted = true;
        }
        result
    }

    fn tick_inner(&mut self, forced: Option<Action>) -> Result<TurnResult, WumpusError> {
        let (source, action) = match forced {
            Some(action) => (ActionSource::Manual, action),
            None => (ActionSource::Policy, self.agent.act(&self.percepts)?),
        };
        let effect = self.agent.execute(action, &mut self.world)?;
        self.turns += 1;

        let mut score_delta = -ACTION_COST;
        if effect.fired_arrow {
            score_delta -= ARROW_COST;
        }
        if effect.died {
            score_delta -= DEATH_PENALTY;
            self.outcome = Outcome::Died;
        }
        if effect.escaped {
            if self.agent.state().has_gold {
                score_delta += GOLD_REWARD;
            }
            self.outcome = Outcome::Escaped;
        }
        self.score += score_delta;
        self.percepts = effect.percepts;

        let terminal = self.is_terminal();
        if terminal {
            if self.outcome == Outcome::None {
                warn!(turn_limit = self.turn_limit, "turn limit reached");
            }
            info!(
                outcome = %self.outcome,
                score = self.score,
                turns = self.turns,
                "episode finished"
            );
        }
        Ok(TurnResult {
            turn: self.turns,
            source,
            action_taken: action,
            new_percepts: effect.percepts,
            agent_state_snapshot: *self.agent.state(),
            score_delta,
            score: self.score,
            terminal,
            outcome: self.outcome,
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome != Outcome::None || self.halted || self.turns >= self.turn_limit
    }

    /// Snapshot of what the agent currently believes about every square.
    pub fn inspect_belief(&self) -> WorldModel {
        self.agent.knowledge_base().model().clone()
    }

    pub fn world(&self) -> &WumpusWorld {
        &self.world
    }

    pub fn agent_state(&self) -> &AgentState {
        self.agent.state()
    }

    /// Percepts of the last turn, or of (1, 1) before the first one.
    pub fn percepts(&self) -> &PerceptSet {
        &self.percepts
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn turns(&self) -> u32 {
        self.turns
    }

    pub fn turn_limit(&self) -> u32 {
        self.turn_limit
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Seed the cave was generated from, if it was generated.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}
