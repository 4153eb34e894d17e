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

use rand::Rng as _;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::grid::{Cell, Orientation};
use crate::{HashSet, Rng, WumpusError};

/// What the agent senses on one turn. Breeze and stench come from the four neighbours, glitter
/// from the square itself, bump and scream from the action just attempted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PerceptSet {
    pub breeze: bool,
    pub stench: bool,
    pub glitter: bool,
    pub bump: bool,
    pub scream: bool,
}

impl std::fmt::Display for PerceptSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = [
            (self.breeze, "Breeze"),
            (self.stench, "Stench"),
            (self.glitter, "Glitter"),
            (self.bump, "Bump"),
            (self.scream, "Scream"),
        ]
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, name)| *name)
        .collect();
        if names.is_empty() {
            write!(f, "None")
        } else {
            write!(f, "{}", names.join(", "))
        }
    }
}

/// What happens to an agent that ends up in a square.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellOutcome {
    pub falls_in_pit: bool,
    pub eaten_by_wumpus: bool,
}

impl CellOutcome {
    pub fn is_fatal(&self) -> bool {
        self.falls_in_pit || self.eaten_by_wumpus
    }
}

/// Ground truth of one cave. Nothing in here is visible to the agent except through percepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WumpusWorld {
    size: usize,
    pits: HashSet<Cell>,
    wumpus: Cell,
    wumpus_alive: bool,
    gold: Option<Cell>,
}

impl WumpusWorld {
    /// Generate a random cave. Every square other than (1, 1) holds a pit with probability
    /// `pit_probability`. The Wumpus and the gold go to two distinct squares other than (1, 1),
    /// either of which may also hold a pit.
    pub fn generate(size: usize, pit_probability: f64, seed: u64) -> Result<Self, WumpusError> {
        if size < 2 {
            return Err(WumpusError::InvalidGridSize(size));
        }
        if !(0.0..=1.0).contains(&pit_probability) {
            return Err(WumpusError::InvalidPitProbability(pit_probability));
        }
        let mut rng = Rng::seed_from_u64(seed);
        Ok(Self::generate_with_rng(size, pit_probability, &mut rng))
    }

    fn generate_with_rng(size: usize, pit_probability: f64, rng: &mut Rng) -> Self {
        let mut candidates: Vec<Cell> = Cell::all(size).filter(|c| *c != Cell::ORIGIN).collect();
        let pits = candidates
            .iter()
            .copied()
            .filter(|_| rng.gen_bool(pit_probability))
            .collect();
        let wumpus = candidates.swap_remove(rng.gen_range(0..candidates.len()));
        let gold = candidates[rng.gen_range(0..candidates.len())];
        Self {
            size,
            pits,
            wumpus,
            wumpus_alive: true,
            gold: Some(gold),
        }
    }

    /// Build a cave with a known layout, e.g. for tests or replaying a recorded world. The caller
    /// keeps (1, 1) free of pits and of the Wumpus.
    pub fn from_layout(size: usize, pits: &[Cell], wumpus: Cell, gold: Cell) -> Self {
        debug_assert!(!pits.contains(&Cell::ORIGIN) && wumpus != Cell::ORIGIN);
        Self {
            size,
            pits: pits.iter().copied().collect(),
            wumpus,
            wumpus_alive: true,
            gold: Some(gold),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_pit(&self, cell: Cell) -> bool {
        self.pits.contains(&cell)
    }

    pub fn is_wumpus_alive(&self) -> bool {
        self.wumpus_alive
    }

    /// Where the Wumpus is, dead or alive.
    pub fn wumpus_cell(&self) -> Cell {
        self.wumpus
    }

    /// Where the gold lies, or None once it has been picked up.
    pub fn gold_cell(&self) -> Option<Cell> {
        self.gold
    }

    /// Percepts available in `cell` before any action is taken there. Bump and scream are never
    /// set here, they belong to the action that produced them.
    ///
    /// Only a live Wumpus smells.
    pub fn percepts_at(&self, cell: Cell) -> PerceptSet {
        let neighbors = cell.neighbors(self.size);
        PerceptSet {
            breeze: neighbors.iter().any(|n| self.is_pit(*n)),
            stench: self.wumpus_alive && neighbors.contains(&self.wumpus),
            glitter: self.gold == Some(cell),
            bump: false,
            scream: false,
        }
    }

    /// Where moving forward from `cell` ends up. Walking into the outer wall leaves the agent in
    /// place and reports a bump.
    pub fn attempt_move(&self, cell: Cell, orientation: Orientation) -> (Cell, bool) {
        match cell.step(orientation, self.size) {
            Some(next) => (next, false),
            None => (cell, true),
        }
    }

    /// Fire the arrow from `from` in `orientation`. The arrow flies until it leaves the grid and
    /// kills the Wumpus if it is anywhere on that ray.
    pub fn shoot(&mut self, from: Cell, orientation: Orientation) -> bool {
        if !self.wumpus_alive {
            return false;
        }
        let mut current = from;
        while let Some(next) = current.step(orientation, self.size) {
            if next == self.wumpus {
                self.wumpus_alive = false;
                return true;
            }
            current = next;
        }
        false
    }

    pub fn resolve_outcome(&self, cell: Cell) -> CellOutcome {
        CellOutcome {
            falls_in_pit: self.is_pit(cell),
            eaten_by_wumpus: self.wumpus_alive && self.wumpus == cell,
        }
    }

    /// Pick up the gold if it lies in `cell`.
    pub fn take_gold(&mut self, cell: Cell) -> bool {
        if self.gold == Some(cell) {
            self.gold = None;
            true
        } else {
            false
        }
    }
}

// print rows from north to south so that (1, 1) ends up in the bottom left corner.
impl std::fmt::Display for WumpusWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for y in (1..=self.size).rev() {
            write!(f, "{} ", y)?;
            for x in 1..=self.size {
                let cell = Cell::new(x, y);
                let mut s = String::with_capacity(3);
                if self.is_pit(cell) {
                    s.push('P');
                }
                if self.wumpus == cell {
                    s.push(if self.wumpus_alive { 'W' } else { 'w' });
                }
                if self.gold == Some(cell) {
                    s.push('G');
                }
                if s.is_empty() {
                    s.push('.');
                }
                write!(f, "{:<3}", s)?;
            }
            writeln!(f)?;
        }
        write!(f, "  ")?;
        for x in 1..=self.size {
            write!(f, "{:<3}", x)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    use super::*;

    // pits at (3, 1) and (3, 3), Wumpus at (1, 3), gold at (2, 3).
    fn figure_world() -> WumpusWorld {
        WumpusWorld::from_layout(
            4,
            &[Cell::new(3, 1), Cell::new(3, 3)],
            Cell::new(1, 3),
            Cell::new(2, 3),
        )
    }

    #[test]
    fn test_start_square_has_no_percepts() {
        let world = figure_world();
        assert_eq!(world.percepts_at(Cell::ORIGIN), PerceptSet::default());
    }

    #[test]
    fn test_breeze_and_stench_come_from_neighbors() {
        let world = figure_world();
        let percepts = world.percepts_at(Cell::new(2, 1));
        assert!(percepts.breeze);
        assert!(!percepts.stench);

        let percepts = world.percepts_at(Cell::new(1, 2));
        assert!(!percepts.breeze);
        assert!(percepts.stench);

        let percepts = world.percepts_at(Cell::new(2, 3));
        assert!(percepts.breeze);
        assert!(percepts.stench);
        assert!(percepts.glitter);
    }

    #[test]
    fn test_hazard_square_itself_has_no_breeze() {
        let world = figure_world();
        assert!(!world.percepts_at(Cell::new(3, 1)).breeze);
    }

    #[test]
    fn test_move_into_wall_bumps() {
        let world = figure_world();
        assert_eq!(
            world.attempt_move(Cell::ORIGIN, Orientation::Left),
            (Cell::ORIGIN, true)
        );
        assert_eq!(
            world.attempt_move(Cell::ORIGIN, Orientation::Right),
            (Cell::new(2, 1), false)
        );
    }

    #[test]
    fn test_shoot_kills_wumpus_on_ray() {
        let mut world = figure_world();
        assert!(world.shoot(Cell::ORIGIN, Orientation::Up));
        assert!(!world.is_wumpus_alive());
        assert_eq!(world.wumpus_cell(), Cell::new(1, 3));
    }

    #[test]
    fn test_shoot_misses_off_ray() {
        let mut world = figure_world();
        assert!(!world.shoot(Cell::ORIGIN, Orientation::Right));
        assert!(world.is_wumpus_alive());
    }

    #[test]
    fn test_dead_wumpus_neither_smells_nor_eats() {
        let mut world = figure_world();
        assert!(world.resolve_outcome(Cell::new(1, 3)).eaten_by_wumpus);
        assert!(world.percepts_at(Cell::new(1, 2)).stench);
        world.shoot(Cell::ORIGIN, Orientation::Up);
        assert!(!world.percepts_at(Cell::new(1, 2)).stench);
        assert!(!world.percepts_at(Cell::new(2, 3)).stench);
        assert_eq!(
            world.resolve_outcome(Cell::new(1, 3)),
            CellOutcome::default()
        );
    }

    #[test]
    fn test_pit_is_fatal() {
        let world = figure_world();
        let outcome = world.resolve_outcome(Cell::new(3, 1));
        assert!(outcome.falls_in_pit);
        assert!(outcome.is_fatal());
    }

    #[test]
    fn test_take_gold_removes_glitter() {
        let mut world = figure_world();
        assert!(!world.take_gold(Cell::ORIGIN));
        assert!(world.take_gold(Cell::new(2, 3)));
        assert!(!world.percepts_at(Cell::new(2, 3)).glitter);
        assert!(!world.take_gold(Cell::new(2, 3)));
    }

    #[test]
    fn test_generate_rejects_invalid_config() {
        assert_eq!(
            WumpusWorld::generate(1, 0.2, 0),
            Err(WumpusError::InvalidGridSize(1))
        );
        assert_eq!(
            WumpusWorld::generate(4, 1.5, 0),
            Err(WumpusError::InvalidPitProbability(1.5))
        );
        assert!(WumpusWorld::generate(4, -0.1, 0).is_err());
    }

    #[test]
    fn test_generate_pit_frequency_close_to_probability() {
        let size = 10;
        let worlds = 200;
        let mut pits = 0;
        for seed in 0..worlds {
            let world = WumpusWorld::generate(size, 0.2, seed).expect("valid config");
            pits += world.pits.len();
        }
        let squares = (worlds as usize * (size * size - 1)) as f64;
        assert_abs_diff_eq!(pits as f64 / squares, 0.2, epsilon = 0.01);
    }

    #[test]
    fn test_display_puts_origin_bottom_left() {
        let world = figure_world();
        let rendered = format!("{}", world);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[1].starts_with("3 W  G  P"), "{}", lines[1]);
        assert!(lines[3].starts_with("1 .  .  P"), "{}", lines[3]);
    }

    proptest! {
        #[test]
        fn test_generated_world_respects_constraints(
            size in 2..8usize,
            pit_probability in 0.0..=1.0f64,
            seed in any::<u64>(),
        ) {
            let world = WumpusWorld::generate(size, pit_probability, seed).expect("valid config");
            prop_assert!(!world.is_pit(Cell::ORIGIN));
            prop_assert_ne!(world.wumpus_cell(), Cell::ORIGIN);
            let gold = world.gold_cell().expect("gold placed");
            prop_assert_ne!(gold, Cell::ORIGIN);
            prop_assert_ne!(gold, world.wumpus_cell());
            prop_assert!(world.wumpus_cell().in_bounds(size));
            prop_assert!(gold.in_bounds(size));
            prop_assert!(world.is_wumpus_alive());
        }

        #[test]
        fn test_same_seed_same_world(seed in any::<u64>()) {
            let a = WumpusWorld::generate(4, 0.2, seed).expect("valid config");
            let b = WumpusWorld::generate(4, 0.2, seed).expect("valid config");
            prop_assert_eq!(a, b);
        }
    }
}
