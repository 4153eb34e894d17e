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

use serde::{Deserialize, Serialize};

use crate::grid::{Cell, Orientation};

/// Where the agent is and what it carries. Owned by the agent controller and only changed by
/// applying the outcome of one action per turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentState {
    pub position: Cell,
    pub orientation: Orientation,
    pub has_gold: bool,
    pub has_arrow: bool,
    pub alive: bool,
    pub escaped: bool,
}

impl Default for AgentState {
    fn default() -> Self {
        Self {
            position: Cell::ORIGIN,
            orientation: Orientation::Right,
            has_gold: false,
            has_arrow: true,
            alive: true,
            escaped: false,
        }
    }
}

impl AgentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_terminal(&self) -> bool {
        !self.alive || self.escaped
    }

    pub fn at_origin(&self) -> bool {
        self.position == Cell::ORIGIN
    }

    pub fn turn_left(&mut self) {
        self.orientation = self.orientation.left();
    }

    pub fn turn_right(&mut self) {
        self.orientation = self.orientation.right();
    }

    pub fn move_to(&mut self, cell: Cell) {
        self.position = cell;
    }

    pub fn die(&mut self) {
        self.alive = false;
    }

    pub fn pick_up_gold(&mut self) {
        self.has_gold = true;
    }

    /// Use up the arrow. Returns false if it was already gone.
    pub fn spend_arrow(&mut self) -> bool {
        std::mem::replace(&mut self.has_arrow, false)
    }

    /// Climb out if standing on (1, 1). Returns whether the agent escaped.
    pub fn climb(&mut self) -> bool {
        if self.at_origin() {
            self.escaped = true;
        }
        self.escaped
    }
}

impl std::fmt::Display for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = if !self.alive {
            "dead"
        } else if self.escaped {
            "escaped"
        } else {
            "alive"
        };
        write!(
            f,
            "{} facing {} ({}), gold: {}, arrow: {}",
            self.position,
            self.orientation,
            status,
            if self.has_gold { "yes" } else { "no" },
            if self.has_arrow { "yes" } else { "no" },
        )
    }
}
