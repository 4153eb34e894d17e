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

//! The knowledge-based Wumpus agent.
//!
//! Each turn the agent tells its knowledge base what it perceived, then asks it which squares are
//! OK, then picks one action by walking an ordered list of rules and taking the first that fires.
//!
//! See:
//! -  Chapter 7: Logical Agents, Figure 7.1 (KB-Agent) and section 7.7.2 (hybrid agent)

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::agent_state::AgentState;
use crate::grid::{Action, Cell};
use crate::knowledge_base::{KnowledgeBase, Status};
use crate::planner;
use crate::world::{PerceptSet, WumpusWorld};
use crate::{Agent, WumpusError};

/// One entry of the decision policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rule {
    /// Pick up gold that glitters in the current square.
    Grab,
    /// Leave the cave from (1, 1) once heading home.
    Climb,
    /// Walk back to (1, 1) once holding the gold or after giving up.
    Retreat,
    /// Fire the arrow at a located Wumpus that is straight ahead.
    Shoot,
    /// Walk to the nearest safe unvisited square.
    Explore,
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Rules in priority order, first match wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Policy(Vec<Rule>);

impl Default for Policy {
    fn default() -> Self {
        Self(vec![
            Rule::Grab,
            Rule::Climb,
            Rule::Retreat,
            Rule::Shoot,
            Rule::Explore,
        ])
    }
}

impl Policy {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self(rules)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.0
    }
}

/// What applying one action did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Effect {
    pub percepts: PerceptSet,
    /// False if the action could not be carried out, e.g. Grab with nothing to grab. Walking into
    /// a wall is carried out and reports a bump.
    pub performed: bool,
    pub fired_arrow: bool,
    pub died: bool,
    pub escaped: bool,
}

#[derive(Debug, Clone)]
pub struct LogicalAgent {
    state: AgentState,
    kb: KnowledgeBase,
    policy: Policy,
    giving_up: bool,
}

impl LogicalAgent {
    pub fn new(size: usize, policy: Policy) -> Self {
        Self {
            state: AgentState::new(),
            kb: KnowledgeBase::new(size),
            policy,
            giving_up: false,
        }
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    /// Heading home, either with the gold or because nothing safe is left to explore.
    pub fn is_retreating(&self) -> bool {
        self.state.has_gold || self.giving_up
    }

    /// Tell the knowledge base what is perceived in the current square.
    pub fn observe(&mut self, percepts: &PerceptSet) -> Result<usize, WumpusError> {
        self.kb.tell(self.state.position, percepts)
    }

    /// Pick the next action and the rule that chose it.
    pub fn decide(&mut self, percepts: &PerceptSet) -> Result<(Rule, Action), WumpusError> {
        if self.state.is_terminal() {
            return Err(WumpusError::EpisodeOver);
        }
        let rules = self.policy.rules().to_vec();
        for rule in rules {
            if let Some(action) = self.apply_rule(rule, percepts)? {
                debug!(%rule, %action, position = %self.state.position, "decided");
                return Ok((rule, action));
            }
        }
        // nothing fired, e.g. a policy without Explore: go home.
        self.give_up();
        let action = self.retreat_action()?;
        debug!(%action, position = %self.state.position, "no rule fired, retreating");
        Ok((Rule::Retreat, action))
    }

    fn apply_rule(
        &mut self,
        rule: Rule,
        percepts: &PerceptSet,
    ) -> Result<Option<Action>, WumpusError> {
        match rule {
            Rule::Grab => {
                let grab = percepts.glitter && !self.state.has_gold;
                Ok(grab.then_some(Action::Grab))
            }
            Rule::Climb => {
                let climb = self.is_retreating() && self.state.at_origin();
                Ok(climb.then_some(Action::Climb))
            }
            Rule::Retreat => {
                if self.is_retreating() {
                    self.retreat_action().map(Some)
                } else {
                    Ok(None)
                }
            }
            Rule::Shoot => Ok(self.shot_is_lined_up().then_some(Action::Shoot)),
            Rule::Explore => {
                if self.is_retreating() {
                    return Ok(None);
                }
                match planner::plan_explore(self.state.position, self.kb.model()) {
                    Ok(path) => Ok(path.next_action(self.state.orientation)),
                    Err(WumpusError::NoSafePath { from }) => {
                        warn!(%from, "no safe square left to explore, heading home without gold");
                        self.give_up();
                        self.retreat_action().map(Some)
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }

    fn give_up(&mut self) {
        self.giving_up = true;
    }

    /// Next step towards (1, 1), or Climb when already there. Failing to find a way back over
    /// visited squares means the beliefs are broken, so that error is passed on.
    fn retreat_action(&self) -> Result<Action, WumpusError> {
        if self.state.at_origin() {
            return Ok(Action::Climb);
        }
        let from = self.state.position;
        planner::plan_retreat(from, self.kb.model())?
            .next_action(self.state.orientation)
            .ok_or(WumpusError::NoSafePath { from })
    }

    /// The located, live Wumpus is straight ahead with only known pit-free squares in between.
    fn shot_is_lined_up(&self) -> bool {
        let model = self.kb.model();
        if !self.state.has_arrow || model.wumpus_dead() {
            return false;
        }
        let Some(target) = model.confirmed_wumpus() else {
            return false;
        };
        let mut current = self.state.position;
        while let Some(next) = current.step(self.state.orientation, model.size()) {
            if next == target {
                return true;
            }
            if model.get(next).map(|b| b.pit_status) != Some(Status::Safe) {
                return false;
            }
            current = next;
        }
        false
    }

    /// Carry out `action` against the world, update the agent's state from the outcome and tell
    /// the knowledge base about any square entered.
    pub fn execute(
        &mut self,
        action: Action,
        world: &mut WumpusWorld,
    ) -> Result<Effect, WumpusError> {
        let mut effect = Effect::default();
        let mut entered: Option<Cell> = None;
        match action {
            Action::Forward => {
                let (next, bump) =
                    world.attempt_move(self.state.position, self.state.orientation);
                effect.percepts.bump = bump;
                if bump {
                    debug!(position = %self.state.position, "bumped into wall");
                } else {
                    self.state.move_to(next);
                    let outcome = world.resolve_outcome(next);
                    if outcome.is_fatal() {
                        self.state.die();
                        effect.died = true;
                    } else {
                        entered = Some(next);
                    }
                }
                effect.performed = true;
            }
            Action::TurnLeft => {
                self.state.turn_left();
                effect.performed = true;
            }
            Action::TurnRight => {
                self.state.turn_right();
                effect.performed = true;
            }
            Action::Grab => {
                if !self.state.has_gold && world.take_gold(self.state.position) {
                    self.state.pick_up_gold();
                    effect.performed = true;
                }
            }
            Action::Shoot => {
                if self.state.spend_arrow() {
                    effect.fired_arrow = true;
                    effect.performed = true;
                    let killed = world.shoot(self.state.position, self.state.orientation);
                    effect.percepts.scream = killed;
                    if killed {
                        self.kb.tell_scream();
                    } else {
                        self.kb
                            .tell_missed_shot(self.state.position, self.state.orientation)?;
                    }
                }
            }
            Action::Climb => {
                effect.escaped = self.state.climb();
                effect.performed = effect.escaped;
            }
        }
        if !effect.performed {
            warn!(%action, position = %self.state.position, "action had no effect");
        }

        let here = world.percepts_at(self.state.position);
        effect.percepts.breeze = here.breeze;
        effect.percepts.stench = here.stench;
        effect.percepts.glitter = here.glitter;
        if entered.is_some() {
            self.observe(&effect.percepts)?;
        }
        Ok(effect)
    }
}

impl Agent for LogicalAgent {
    type Action = Action;
    type Percept = PerceptSet;
    type Error = WumpusError;

    fn act(&mut self, percept: &Self::Percept) -> Result<Self::Action, Self::Error> {
        self.decide(percept).map(|(_, action)| action)
    }
}
