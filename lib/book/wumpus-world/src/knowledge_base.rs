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

//! Knowledge base for the Wumpus world.
//!
//! Instead of a general clause database this keeps one small typed status per square and hazard,
//! and runs a closed set of grid-local rules to a fixed point after every square the agent enters:
//!
//! - no breeze (stench) in a visited square: no neighbour holds a pit (the Wumpus).
//! - breeze (stench) in a visited square: every unknown neighbour possibly holds one.
//! - breeze (stench) with all but one neighbour ruled out: that neighbour holds one. This is unit
//!   propagation on the clause `P(n1) v P(n2) v ...` restricted to the four neighbours.
//! - there is exactly one Wumpus, so once it is located every other square is Wumpus free.
//!
//! See:
//! -  Chapter 7: Logical Agents, section 7.3 Logic and 7.5.2 Proof by resolution

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::grid::{Cell, Orientation};
use crate::world::PerceptSet;
use crate::WumpusError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hazard {
    Pit,
    Wumpus,
}

impl std::fmt::Display for Hazard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Hazard::Pit => write!(f, "pit"),
            Hazard::Wumpus => write!(f, "Wumpus"),
        }
    }
}

/// What is believed about one hazard in one square.
///
/// Statuses only ever move forward: Unknown to Possible, Safe or Confirmed, and Possible to Safe
/// or Confirmed. Safe and Confirmed are final.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Unknown,
    Possible,
    Safe,
    Confirmed,
}

impl Status {
    fn rank(&self) -> u8 {
        match self {
            Status::Unknown => 0,
            Status::Possible => 1,
            Status::Safe | Status::Confirmed => 2,
        }
    }

    /// Whether going from `earlier` to this status is allowed by monotonicity.
    pub fn is_refinement_of(&self, earlier: Status) -> bool {
        *self == earlier || self.rank() > earlier.rank()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BeliefCell {
    pub visited: bool,
    pub has_breeze: bool,
    pub has_stench: bool,
    pub pit_status: Status,
    pub wumpus_status: Status,
}

impl BeliefCell {
    pub fn status(&self, hazard: Hazard) -> Status {
        match hazard {
            Hazard::Pit => self.pit_status,
            Hazard::Wumpus => self.wumpus_status,
        }
    }

    fn status_mut(&mut self, hazard: Hazard) -> &mut Status {
        match hazard {
            Hazard::Pit => &mut self.pit_status,
            Hazard::Wumpus => &mut self.wumpus_status,
        }
    }

    /// Whether the warning percept for `hazard` was observed here.
    fn senses(&self, hazard: Hazard) -> bool {
        match hazard {
            Hazard::Pit => self.has_breeze,
            Hazard::Wumpus => self.has_stench,
        }
    }
}

/// Everything the agent believes about the cave, one BeliefCell per square.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldModel {
    size: usize,
    cells: Vec<BeliefCell>,
    wumpus_dead: bool,
}

impl WorldModel {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![BeliefCell::default(); size * size],
            wumpus_dead: false,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        cell.in_bounds(self.size)
            .then(|| (cell.y - 1) * self.size + (cell.x - 1))
    }

    /// Get the belief for a square, or None if it is off the grid.
    pub fn get(&self, cell: Cell) -> Option<&BeliefCell> {
        self.index(cell).map(|index| &self.cells[index])
    }

    fn get_mut(&mut self, cell: Cell) -> Option<&mut BeliefCell> {
        self.index(cell).map(move |index| &mut self.cells[index])
    }

    /// Belief for a square. Nothing is known about squares off the grid.
    fn belief(&self, cell: Cell) -> BeliefCell {
        self.get(cell).copied().unwrap_or_default()
    }

    /// Whether a scream has been heard.
    pub fn wumpus_dead(&self) -> bool {
        self.wumpus_dead
    }

    /// A square is OK to enter if it was visited, or if it is known to hold no pit and either
    /// holds no Wumpus or the Wumpus is dead.
    pub fn is_ok(&self, cell: Cell) -> bool {
        let belief = self.belief(cell);
        belief.visited
            || (belief.pit_status == Status::Safe
                && (belief.wumpus_status == Status::Safe || self.wumpus_dead))
    }

    pub fn is_frontier(&self, cell: Cell) -> bool {
        self.is_ok(cell)
            && !self.belief(cell).visited
            && cell
                .neighbors(self.size)
                .iter()
                .any(|n| self.belief(*n).visited)
    }

    pub fn frontier_cells(&self) -> Vec<Cell> {
        Cell::all(self.size)
            .filter(|c| self.is_frontier(*c))
            .collect()
    }

    /// The square known to hold the Wumpus, if it has been located.
    pub fn confirmed_wumpus(&self) -> Option<Cell> {
        Cell::all(self.size).find(|c| self.belief(*c).wumpus_status == Status::Confirmed)
    }
}

// V visited, . OK to enter, P / W known pit / Wumpus, ? possibly dangerous, # unknown.
impl std::fmt::Display for WorldModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for y in (1..=self.size).rev() {
            write!(f, "{} ", y)?;
            for x in 1..=self.size {
                let cell = Cell::new(x, y);
                let belief = self.belief(cell);
                let c = if belief.visited {
                    'V'
                } else if belief.pit_status == Status::Confirmed {
                    'P'
                } else if belief.wumpus_status == Status::Confirmed {
                    if self.wumpus_dead {
                        'w'
                    } else {
                        'W'
                    }
                } else if self.is_ok(cell) {
                    '.'
                } else if belief.pit_status == Status::Possible
                    || belief.wumpus_status == Status::Possible
                {
                    '?'
                } else {
                    '#'
                };
                write_glyph(f, c, x == self.size)?;
            }
            writeln!(f)?;
        }
        write!(f, "  ")?;
        for x in 1..=self.size {
            let digit = char::from_digit((x % 10) as u32, 10).unwrap_or(' ');
            write_glyph(f, digit, x == self.size)?;
        }
        Ok(())
    }
}

fn write_glyph(f: &mut std::fmt::Formatter<'_>, c: char, last: bool) -> std::fmt::Result {
    if last {
        write!(f, "{}", c)
    } else {
        write!(f, "{} ", c)
    }
}

/// Owns the WorldModel of one episode and derives new facts into it.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    model: WorldModel,
}

impl KnowledgeBase {
    pub fn new(size: usize) -> Self {
        Self {
            model: WorldModel::new(size),
        }
    }

    pub fn model(&self) -> &WorldModel {
        &self.model
    }

    /// What is believed about `cell`. A square off the grid is reported as never visited and
    /// entirely unknown.
    pub fn status(&self, cell: Cell) -> BeliefCell {
        self.model.belief(cell)
    }

    pub fn is_ok(&self, cell: Cell) -> bool {
        self.model.is_ok(cell)
    }

    pub fn is_frontier(&self, cell: Cell) -> bool {
        self.model.is_frontier(cell)
    }

    pub fn all_frontier_cells(&self) -> Vec<Cell> {
        self.model.frontier_cells()
    }

    /// Record entering `cell` with `percepts` and run inference to a fixed point. Returns the
    /// number of new facts derived.
    ///
    /// Surviving the square proves it holds no pit. It also proves it holds no Wumpus, unless the
    /// Wumpus is already dead and could be lying there.
    pub fn tell(&mut self, cell: Cell, percepts: &PerceptSet) -> Result<usize, WumpusError> {
        let size = self.model.size;
        let belief = self
            .model
            .get_mut(cell)
            .ok_or(WumpusError::CellOutOfBounds { cell, size })?;
        let first_visit = !belief.visited;
        belief.visited = true;
        belief.has_breeze = percepts.breeze;
        belief.has_stench = percepts.stench;

        let mut derived = usize::from(first_visit);
        derived += usize::from(self.refine(cell, Hazard::Pit, Status::Safe)?);
        if !self.model.wumpus_dead {
            derived += usize::from(self.refine(cell, Hazard::Wumpus, Status::Safe)?);
        }
        Ok(derived + self.infer()?)
    }

    /// Record that the arrow hit the Wumpus. A dead Wumpus stops smelling, so from here on the
    /// Wumpus rules are no longer applied and its statuses stay as they are.
    pub fn tell_scream(&mut self) {
        debug!("Wumpus is dead");
        self.model.wumpus_dead = true;
    }

    /// Record that an arrow fired from `from` in `orientation` produced no scream. The live
    /// Wumpus is therefore in none of the squares the arrow crossed.
    pub fn tell_missed_shot(
        &mut self,
        from: Cell,
        orientation: Orientation,
    ) -> Result<usize, WumpusError> {
        if self.model.wumpus_dead {
            return Ok(0);
        }
        let mut derived = 0;
        let mut current = from;
        while let Some(next) = current.step(orientation, self.model.size) {
            derived += usize::from(self.refine(next, Hazard::Wumpus, Status::Safe)?);
            current = next;
        }
        Ok(derived + self.infer()?)
    }

    /// Apply every rule over every visited square until nothing new is derived. Each productive
    /// pass raises at least one status, so this stops after at most 2 * size^2 passes.
    pub fn infer(&mut self) -> Result<usize, WumpusError> {
        let size = self.model.size;
        let hazards: &[Hazard] = if self.model.wumpus_dead {
            &[Hazard::Pit]
        } else {
            &[Hazard::Pit, Hazard::Wumpus]
        };
        let mut derived = 0;
        loop {
            let mut changed = 0;
            for cell in Cell::all(size) {
                let belief = self.model.belief(cell);
                if !belief.visited {
                    continue;
                }
                let neighbors = cell.neighbors(size);
                for hazard in hazards {
                    changed += self.apply_rules(cell, &belief, &neighbors, *hazard)?;
                }
            }
            let located = self
                .model
                .confirmed_wumpus()
                .filter(|_| !self.model.wumpus_dead);
            if let Some(wumpus) = located {
                for other in Cell::all(size).filter(|c| *c != wumpus) {
                    changed += usize::from(self.refine(other, Hazard::Wumpus, Status::Safe)?);
                }
            }
            if changed == 0 {
                return Ok(derived);
            }
            derived += changed;
        }
    }

    fn apply_rules(
        &mut self,
        cell: Cell,
        belief: &BeliefCell,
        neighbors: &[Cell],
        hazard: Hazard,
    ) -> Result<usize, WumpusError> {
        let mut changed = 0;
        if !belief.senses(hazard) {
            for neighbor in neighbors {
                changed += usize::from(self.refine(*neighbor, hazard, Status::Safe)?);
            }
            return Ok(changed);
        }

        for neighbor in neighbors {
            changed += usize::from(self.refine(*neighbor, hazard, Status::Possible)?);
        }
        let candidates: Vec<Cell> = neighbors
            .iter()
            .copied()
            .filter(|n| self.model.belief(*n).status(hazard) != Status::Safe)
            .collect();
        match candidates.as_slice() {
            [] => Err(WumpusError::InconsistentBelief { cell, hazard }),
            [only] => Ok(changed + usize::from(self.refine(*only, hazard, Status::Confirmed)?)),
            _ => Ok(changed),
        }
    }

    /// Move a status forward. Returns whether anything changed.
    fn refine(&mut self, cell: Cell, hazard: Hazard, next: Status) -> Result<bool, WumpusError> {
        let size = self.model.size;
        let belief = self
            .model
            .get_mut(cell)
            .ok_or(WumpusError::CellOutOfBounds { cell, size })?;
        let current = belief.status(hazard);
        match (current, next) {
            (Status::Safe, Status::Confirmed) | (Status::Confirmed, Status::Safe) => {
                Err(WumpusError::InconsistentBelief { cell, hazard })
            }
            _ if next.rank() > current.rank() => {
                debug!(%cell, %hazard, from = ?current, to = ?next, "belief refined");
                *belief.status_mut(hazard) = next;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn percepts(breeze: bool, stench: bool) -> PerceptSet {
        PerceptSet {
            breeze,
            stench,
            ..PerceptSet::default()
        }
    }

    #[test]
    fn test_knowledge_base_starts_unknown() {
        let kb = KnowledgeBase::new(4);
        for cell in Cell::all(4) {
            assert_eq!(kb.status(cell), BeliefCell::default(), "cell: {}", cell);
            assert!(!kb.is_ok(cell));
        }
        assert!(kb.all_frontier_cells().is_empty());
    }

    #[test]
    fn test_no_breeze_no_stench_at_start_marks_neighbors_safe() {
        let mut kb = KnowledgeBase::new(4);
        kb.tell(Cell::ORIGIN, &percepts(false, false))
            .expect("consistent");

        let origin = kb.status(Cell::ORIGIN);
        assert!(origin.visited);
        assert_eq!(origin.pit_status, Status::Safe);
        assert_eq!(origin.wumpus_status, Status::Safe);
        for cell in [Cell::new(1, 2), Cell::new(2, 1)] {
            assert_eq!(kb.status(cell).pit_status, Status::Safe);
            assert_eq!(kb.status(cell).wumpus_status, Status::Safe);
            assert!(kb.is_frontier(cell));
        }
        assert_eq!(
            kb.all_frontier_cells(),
            vec![Cell::new(2, 1), Cell::new(1, 2)]
        );
        assert_eq!(kb.status(Cell::new(2, 2)), BeliefCell::default());
    }

    #[test]
    fn test_breeze_marks_unknown_neighbors_possible() {
        let mut kb = KnowledgeBase::new(4);
        kb.tell(Cell::ORIGIN, &percepts(true, false))
            .expect("consistent");
        for cell in [Cell::new(1, 2), Cell::new(2, 1)] {
            assert_eq!(kb.status(cell).pit_status, Status::Possible);
            assert_eq!(kb.status(cell).wumpus_status, Status::Safe);
            assert!(!kb.is_ok(cell));
        }
        assert!(kb.all_frontier_cells().is_empty());
    }

    // (2, 1) is breezy and (3, 1) is the only neighbour not yet ruled out.
    #[test]
    fn test_elimination_confirms_single_remaining_neighbor_once() {
        let mut kb = KnowledgeBase::new(4);
        kb.tell(Cell::ORIGIN, &percepts(false, false))
            .expect("consistent");
        kb.tell(Cell::new(1, 2), &percepts(false, false))
            .expect("consistent");
        assert_eq!(kb.status(Cell::new(2, 2)).pit_status, Status::Safe);

        let derived = kb
            .tell(Cell::new(2, 1), &percepts(true, false))
            .expect("consistent");
        assert!(derived > 0);
        assert_eq!(kb.status(Cell::new(3, 1)).pit_status, Status::Confirmed);
        assert!(!kb.is_ok(Cell::new(3, 1)));

        assert_eq!(kb.infer(), Ok(0));
        assert_eq!(kb.status(Cell::new(3, 1)).pit_status, Status::Confirmed);
    }

    #[test]
    fn test_elimination_waits_for_later_evidence() {
        let mut kb = KnowledgeBase::new(4);
        kb.tell(Cell::ORIGIN, &percepts(false, false))
            .expect("consistent");
        kb.tell(Cell::new(2, 1), &percepts(true, false))
            .expect("consistent");
        assert_eq!(kb.status(Cell::new(3, 1)).pit_status, Status::Possible);
        assert_eq!(kb.status(Cell::new(2, 2)).pit_status, Status::Possible);

        kb.tell(Cell::new(1, 2), &percepts(false, false))
            .expect("consistent");
        assert_eq!(kb.status(Cell::new(2, 2)).pit_status, Status::Safe);
        assert_eq!(kb.status(Cell::new(3, 1)).pit_status, Status::Confirmed);
    }

    #[test]
    fn test_located_wumpus_clears_every_other_square() {
        let mut kb = KnowledgeBase::new(4);
        kb.tell(Cell::ORIGIN, &percepts(false, false))
            .expect("consistent");
        kb.tell(Cell::new(1, 2), &percepts(false, true))
            .expect("consistent");
        assert_eq!(kb.status(Cell::new(1, 3)).wumpus_status, Status::Possible);
        assert_eq!(kb.model().confirmed_wumpus(), None);

        kb.tell(Cell::new(2, 1), &percepts(false, false))
            .expect("consistent");
        assert_eq!(kb.model().confirmed_wumpus(), Some(Cell::new(1, 3)));
        for cell in Cell::all(4).filter(|c| *c != Cell::new(1, 3)) {
            assert_eq!(kb.status(cell).wumpus_status, Status::Safe, "{}", cell);
        }
    }

    #[test]
    fn test_scream_makes_wumpus_square_ok_without_rewriting_status() {
        let mut kb = KnowledgeBase::new(4);
        kb.tell(Cell::ORIGIN, &percepts(false, false))
            .expect("consistent");
        kb.tell(Cell::new(1, 2), &percepts(false, true))
            .expect("consistent");
        kb.tell(Cell::new(2, 1), &percepts(false, false))
            .expect("consistent");
        let wumpus = Cell::new(1, 3);
        assert!(!kb.is_ok(wumpus));

        kb.tell_scream();
        assert!(kb.is_ok(wumpus));
        assert!(kb.is_frontier(wumpus));
        assert_eq!(kb.status(wumpus).wumpus_status, Status::Confirmed);

        // walking onto the dead Wumpus is not a contradiction.
        kb.tell(wumpus, &percepts(false, false))
            .expect("consistent");
        assert_eq!(kb.status(wumpus).wumpus_status, Status::Confirmed);
    }

    #[test]
    fn test_stench_gone_after_scream_stays_consistent() {
        let mut kb = KnowledgeBase::new(4);
        kb.tell(Cell::ORIGIN, &percepts(false, false))
            .expect("consistent");
        kb.tell(Cell::new(1, 2), &percepts(false, true))
            .expect("consistent");
        kb.tell(Cell::new(2, 1), &percepts(false, false))
            .expect("consistent");
        let wumpus = Cell::new(1, 3);
        assert_eq!(kb.model().confirmed_wumpus(), Some(wumpus));
        let before = kb.model().clone();

        kb.tell_scream();
        // the square next to the dead Wumpus no longer smells.
        kb.tell(Cell::new(1, 2), &percepts(false, false))
            .expect("consistent");
        assert!(!kb.status(Cell::new(1, 2)).has_stench);
        assert_eq!(kb.status(wumpus).wumpus_status, Status::Confirmed);
        for cell in Cell::all(4) {
            assert_eq!(
                kb.status(cell).wumpus_status,
                before.belief(cell).wumpus_status,
                "{}",
                cell
            );
        }
        assert_eq!(kb.infer(), Ok(0));
    }

    #[test]
    fn test_squares_off_the_grid_are_never_ok() {
        let mut kb = KnowledgeBase::new(4);
        kb.tell(Cell::ORIGIN, &percepts(false, false))
            .expect("consistent");
        kb.tell(Cell::new(1, 2), &percepts(false, false))
            .expect("consistent");
        assert!(kb.status(Cell::new(1, 2)).visited);

        // (5, 1) would land on the same slot as (1, 2) if it were not bounds checked.
        for cell in [Cell::new(5, 1), Cell::new(0, 1), Cell::new(1, 0), Cell::new(4, 5)] {
            assert_eq!(kb.model().get(cell), None, "{}", cell);
            assert_eq!(kb.status(cell), BeliefCell::default(), "{}", cell);
            assert!(!kb.is_ok(cell), "{}", cell);
            assert!(!kb.is_frontier(cell), "{}", cell);
        }
        assert_eq!(
            kb.tell(Cell::new(5, 1), &percepts(false, false)),
            Err(WumpusError::CellOutOfBounds {
                cell: Cell::new(5, 1),
                size: 4
            })
        );
        assert_eq!(kb.status(Cell::new(1, 2)).pit_status, Status::Safe);
    }

    #[test]
    fn test_missed_shot_clears_ray() {
        let mut kb = KnowledgeBase::new(4);
        kb.tell(Cell::ORIGIN, &percepts(false, true))
            .expect("consistent");
        kb.tell_missed_shot(Cell::ORIGIN, Orientation::Up)
            .expect("consistent");
        for y in 2..=4 {
            assert_eq!(kb.status(Cell::new(1, y)).wumpus_status, Status::Safe);
        }
        // stench at (1, 1) with (1, 2) cleared leaves only (2, 1).
        assert_eq!(kb.model().confirmed_wumpus(), Some(Cell::new(2, 1)));
    }

    #[test]
    fn test_visiting_confirmed_pit_is_inconsistent() {
        let mut kb = KnowledgeBase::new(4);
        kb.tell(Cell::ORIGIN, &percepts(true, false))
            .expect("consistent");
        kb.tell(Cell::new(1, 2), &percepts(false, false))
            .expect("consistent");
        assert_eq!(kb.status(Cell::new(2, 1)).pit_status, Status::Confirmed);

        assert_eq!(
            kb.tell(Cell::new(2, 1), &percepts(false, false)),
            Err(WumpusError::InconsistentBelief {
                cell: Cell::new(2, 1),
                hazard: Hazard::Pit,
            })
        );
    }

    #[test]
    fn test_breeze_without_candidates_is_inconsistent() {
        let mut kb = KnowledgeBase::new(2);
        kb.tell(Cell::ORIGIN, &percepts(false, false))
            .expect("consistent");
        kb.tell(Cell::new(1, 2), &percepts(false, false))
            .expect("consistent");
        kb.tell(Cell::new(2, 1), &percepts(false, false))
            .expect("consistent");
        let result = kb.tell(Cell::new(2, 2), &percepts(true, false));
        assert!(
            matches!(
                result,
                Err(WumpusError::InconsistentBelief {
                    hazard: Hazard::Pit,
                    ..
                })
            ),
            "result: {:?}",
            result
        );
    }

    #[test]
    fn test_status_refinement_order() {
        use Status::*;
        assert!(Possible.is_refinement_of(Unknown));
        assert!(Safe.is_refinement_of(Unknown));
        assert!(Safe.is_refinement_of(Possible));
        assert!(Confirmed.is_refinement_of(Possible));
        assert!(Safe.is_refinement_of(Safe));
        assert!(!Unknown.is_refinement_of(Possible));
        assert!(!Possible.is_refinement_of(Safe));
        assert!(!Safe.is_refinement_of(Confirmed));
        assert!(!Confirmed.is_refinement_of(Safe));
    }

    #[test]
    fn test_display_world_model() {
        let mut kb = KnowledgeBase::new(4);
        kb.tell(Cell::ORIGIN, &percepts(false, false))
            .expect("consistent");
        kb.tell(Cell::new(2, 1), &percepts(true, false))
            .expect("consistent");
        let rendered = format!("{}", kb.model());
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "4 # # # #");
        assert_eq!(lines[2], "2 . ? # #");
        assert_eq!(lines[3], "1 V V ? #");
        assert_eq!(lines[4], "  1 2 3 4");
    }

    #[test]
    fn test_world_model_serializes() {
        let mut kb = KnowledgeBase::new(2);
        kb.tell(Cell::ORIGIN, &percepts(false, false))
            .expect("consistent");
        let json = serde_json::to_string(kb.model()).expect("serializable");
        let back: WorldModel = serde_json::from_str(&json).expect("deserializable");
        assert_eq!(&back, kb.model());
    }
}
