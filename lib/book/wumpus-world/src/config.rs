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

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::agent::Policy;
use crate::WumpusError;

/// Settings for one episode. Every field has a default, so a TOML file only needs the keys it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    pub grid_size: usize,
    pub pit_probability: f64,
    pub random_seed: Option<u64>,
    /// Hard cap on turns. None picks a bound the agent can never reach.
    pub turn_limit: Option<u32>,
    pub policy: Policy,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            grid_size: 4,
            pit_probability: 0.2,
            random_seed: None,
            turn_limit: None,
            policy: Policy::default(),
        }
    }
}

impl EpisodeConfig {
    pub fn validate(&self) -> Result<(), WumpusError> {
        if self.grid_size < 2 {
            return Err(WumpusError::InvalidGridSize(self.grid_size));
        }
        if !(0.0..=1.0).contains(&self.pit_probability) {
            return Err(WumpusError::InvalidPitProbability(self.pit_probability));
        }
        Ok(())
    }

    /// The configured turn limit, or 4 * n^4 + 16. Exploring visits at most n^2 squares, each
    /// trip is at most n^2 moves with at most two turns per move, so the agent always finishes
    /// within 3 * n^4 + 3 * n^2 + 3 turns.
    pub fn effective_turn_limit(&self) -> u32 {
        self.turn_limit.unwrap_or_else(|| {
            let n = self.grid_size as u64;
            u32::try_from(4 * n.pow(4) + 16).unwrap_or(u32::MAX)
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, WumpusError> {
        Self::parse(content, "<string>")
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, WumpusError> {
        let content = std::fs::read_to_string(path).map_err(|e| WumpusError::ConfigRead {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    fn parse(content: &str, path: &str) -> Result<Self, WumpusError> {
        let config: Self = toml::from_str(content).map_err(|e| WumpusError::ConfigParse {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }
}
