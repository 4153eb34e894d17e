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

/// A square of the cave. Coordinates are 1-indexed, x grows to the East and y grows to the North,
/// so the agent starts at (1, 1) in the south-west corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub const ORIGIN: Cell = Cell { x: 1, y: 1 };

    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub fn in_bounds(&self, size: usize) -> bool {
        (1..=size).contains(&self.x) && (1..=size).contains(&self.y)
    }

    /// The square one step away in `orientation`, or None if that would leave the grid.
    pub fn step(&self, orientation: Orientation, size: usize) -> Option<Cell> {
        let next = match orientation {
            Orientation::Up => Cell::new(self.x, self.y + 1),
            Orientation::Right => Cell::new(self.x + 1, self.y),
            Orientation::Down => Cell::new(self.x, self.y.checked_sub(1)?),
            Orientation::Left => Cell::new(self.x.checked_sub(1)?, self.y),
        };
        next.in_bounds(size).then_some(next)
    }

    /// Orthogonal neighbours inside the grid, in the fixed North, East, South, West scan order.
    pub fn neighbors(&self, size: usize) -> Vec<Cell> {
        Orientation::SCAN_ORDER
            .iter()
            .filter_map(|&o| self.step(o, size))
            .collect()
    }

    pub fn manhattan(&self, other: &Cell) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// The orientation that leads from this square to an adjacent one.
    pub fn direction_to(&self, other: &Cell) -> Option<Orientation> {
        match (
            other.x as i64 - self.x as i64,
            other.y as i64 - self.y as i64,
        ) {
            (0, 1) => Some(Orientation::Up),
            (1, 0) => Some(Orientation::Right),
            (0, -1) => Some(Orientation::Down),
            (-1, 0) => Some(Orientation::Left),
            _ => None,
        }
    }

    /// All squares of a size x size grid, row by row from (1, 1).
    pub fn all(size: usize) -> impl Iterator<Item = Cell> {
        (1..=size).flat_map(move |y| (1..=size).map(move |x| Cell::new(x, y)))
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Up,
    Right,
    Down,
    Left,
}

impl Orientation {
    /// North, East, South, West. Used for every deterministic tie-break.
    pub const SCAN_ORDER: [Orientation; 4] = [
        Orientation::Up,
        Orientation::Right,
        Orientation::Down,
        Orientation::Left,
    ];

    /// Orientation after a 90 degree counter-clockwise turn.
    pub fn left(&self) -> Self {
        match self {
            Orientation::Up => Orientation::Left,
            Orientation::Left => Orientation::Down,
            Orientation::Down => Orientation::Right,
            Orientation::Right => Orientation::Up,
        }
    }

    /// Orientation after a 90 degree clockwise turn.
    pub fn right(&self) -> Self {
        match self {
            Orientation::Up => Orientation::Right,
            Orientation::Right => Orientation::Down,
            Orientation::Down => Orientation::Left,
            Orientation::Left => Orientation::Up,
        }
    }

    /// The single turn that brings this orientation closer to `target`, or None if already facing
    /// it. A half turn starts with a left turn.
    pub fn turn_towards(&self, target: Orientation) -> Option<Action> {
        if *self == target {
            None
        } else if self.right() == target {
            Some(Action::TurnRight)
        } else {
            Some(Action::TurnLeft)
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = match self {
            Orientation::Up => '^',
            Orientation::Right => '>',
            Orientation::Down => 'v',
            Orientation::Left => '<',
        };
        write!(f, "{}", c)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Forward,
    TurnLeft,
    TurnRight,
    Grab,
    Shoot,
    Climb,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Forward => write!(f, "Forward"),
            Action::TurnLeft => write!(f, "TurnLeft"),
            Action::TurnRight => write!(f, "TurnRight"),
            Action::Grab => write!(f, "Grab"),
            Action::Shoot => write!(f, "Shoot"),
            Action::Climb => write!(f, "Climb"),
        }
    }
}
