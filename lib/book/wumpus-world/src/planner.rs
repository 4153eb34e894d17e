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

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::grid::{Action, Cell, Orientation};
use crate::knowledge_base::WorldModel;
use crate::{HashMap, WumpusError};

/// A route of orthogonally adjacent squares. The first square is where the agent stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path(Vec<Cell>);

impl Path {
    pub fn cells(&self) -> &[Cell] {
        &self.0
    }

    pub fn start(&self) -> Cell {
        self.0[0]
    }

    pub fn destination(&self) -> Cell {
        self.0[self.0.len() - 1]
    }

    /// Number of moves along the path.
    pub fn len(&self) -> usize {
        self.0.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn next_cell(&self) -> Option<Cell> {
        self.0.get(1).copied()
    }

    /// The single action that starts following this path when facing `orientation`: a turn
    /// until facing the next square, then a step forward. None once the path is done.
    pub fn next_action(&self, orientation: Orientation) -> Option<Action> {
        let direction = self.start().direction_to(&self.next_cell()?)?;
        Some(
            orientation
                .turn_towards(direction)
                .unwrap_or(Action::Forward),
        )
    }
}

/// Explore mode. Shortest path to the nearest frontier square.
pub fn plan_explore(from: Cell, model: &WorldModel) -> Result<Path, WumpusError> {
    shortest_path(from, model, |cell| model.is_frontier(cell))
}

/// Retreat mode. Shortest path back to (1, 1).
pub fn plan_retreat(from: Cell, model: &WorldModel) -> Result<Path, WumpusError> {
    shortest_path(from, model, |cell| cell == Cell::ORIGIN)
}

/// Breadth-first search over OK squares, expanding neighbours North, East, South, West. Among
/// targets at the same distance the one closest by Manhattan distance wins, then the one the
/// search reached first, so the result only depends on the belief state.
pub fn shortest_path<F>(from: Cell, model: &WorldModel, is_target: F) -> Result<Path, WumpusError>
where
    F: Fn(Cell) -> bool,
{
    let size = model.size();
    let mut parents: HashMap<Cell, Cell> = HashMap::default();
    let mut distances: HashMap<Cell, usize> = HashMap::default();
    let mut queue = VecDeque::new();
    let mut best: Option<(usize, usize, usize, Cell)> = None;
    let mut discovered = 0;

    distances.insert(from, 0);
    queue.push_back(from);
    while let Some(cell) = queue.pop_front() {
        let distance = distances[&cell];
        if is_target(cell) {
            let key = (distance, cell.manhattan(&from), discovered, cell);
            if best.map_or(true, |b| (key.0, key.1, key.2) < (b.0, b.1, b.2)) {
                best = Some(key);
            }
        }
        discovered += 1;
        for neighbor in cell.neighbors(size) {
            if distances.contains_key(&neighbor) || !model.is_ok(neighbor) {
                continue;
            }
            distances.insert(neighbor, distance + 1);
            parents.insert(neighbor, cell);
            queue.push_back(neighbor);
        }
    }

    let (_, _, _, target) = best.ok_or(WumpusError::NoSafePath { from })?;
    let mut cells = vec![target];
    let mut current = target;
    while let Some(parent) = parents.get(&current) {
        cells.push(*parent);
        current = *parent;
    }
    cells.reverse();
    Ok(Path(cells))
}
