use std::collections::HashSet;

use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use crate::{
    Position,
    adventurer::{Adventurer, AdventurerError, NextState},
    grammar::Action,
    map::{Grid, GridError},
    parser::TerrainError,
};

/// Represents the static relief of a tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellType {
    #[default]
    Plain,
    Mountain,
}

/// Why a scripted action could not be performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BlockReason {
    OutOfBounds,
    Mountain,
    Occupied { by: String },
}

/// Represents the outcome of processing an adventurer's action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MoveOutcome {
    Moved,
    Turned,
    /// The action was performed and a treasure was found on the tile after it.
    Collected,
    Blocked(BlockReason),
}

/// One adventurer's attempt during a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    /// Index of the adventurer in the terrain's list.
    pub adventurer: usize,
    pub action: Action,
    pub outcome: MoveOutcome,
}

/// Everything that happened during one round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoundReport {
    /// 1-based number of the round.
    pub round: usize,
    pub turns: Vec<Turn>,
}

/// Totals over a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub rounds: usize,
    pub moves: usize,
    pub turns: usize,
    pub blocked: usize,
    pub treasures_collected: usize,
}

impl RunSummary {
    fn record(&mut self, report: &RoundReport) {
        self.rounds += 1;
        for turn in &report.turns {
            if let MoveOutcome::Blocked(_) = turn.outcome {
                self.blocked += 1;
                continue;
            }
            match turn.action {
                Action::MoveForward => self.moves += 1,
                Action::TurnLeft | Action::TurnRight => self.turns += 1,
            }
            if turn.outcome == MoveOutcome::Collected {
                self.treasures_collected += 1;
            }
        }
    }
}

/// The treasure map: a bounded area with mountains, treasures and adventurers.
///
/// Mountains and treasures keep their insertion order so that results are
/// rendered deterministically. They may lie outside the walkable area, in
/// which case they are only carried through to the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terrain {
    width: usize,
    height: usize,
    mountains: Vec<Position>,
    mountain_tiles: HashSet<Position>,
    treasures: Vec<Position>,
    adventurers: Vec<Adventurer>,
    rounds_played: usize,
}

impl Terrain {
    /// Creates an empty terrain.
    pub fn new(width: usize, height: usize) -> Result<Self, TerrainError> {
        if width == 0 || height == 0 {
            return Err(TerrainError::NonPositiveDimensions {
                width: i64::try_from(width).unwrap_or(i64::MAX),
                height: i64::try_from(height).unwrap_or(i64::MAX),
            });
        }

        Ok(Terrain {
            width,
            height,
            mountains: Vec::new(),
            mountain_tiles: HashSet::new(),
            treasures: Vec::new(),
            adventurers: Vec::new(),
            rounds_played: 0,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Checks if the position is within the walkable area.
    pub fn contains(&self, position: Position) -> bool {
        position.x < self.width && position.y < self.height
    }

    /// Mountains in declaration order.
    pub fn mountains(&self) -> &[Position] {
        &self.mountains
    }

    /// Remaining treasure records, one per treasure, in declaration order.
    pub fn treasures(&self) -> &[Position] {
        &self.treasures
    }

    pub fn adventurers(&self) -> &[Adventurer] {
        &self.adventurers
    }

    pub fn rounds_played(&self) -> usize {
        self.rounds_played
    }

    pub fn is_mountain(&self, position: Position) -> bool {
        self.mountain_tiles.contains(&position)
    }

    pub fn treasure_count_at(&self, position: Position) -> usize {
        self.treasures.iter().filter(|t| **t == position).count()
    }

    /// Remaining treasures grouped by tile, in order of first appearance.
    pub fn treasure_groups(&self) -> Vec<(Position, usize)> {
        let mut groups: Vec<(Position, usize)> = Vec::new();
        for treasure in &self.treasures {
            match groups.iter_mut().find(|(position, _)| position == treasure) {
                Some((_, count)) => *count += 1,
                None => groups.push((*treasure, 1)),
            }
        }
        groups
    }

    pub fn adventurer_at(&self, position: Position) -> Option<&Adventurer> {
        self.adventurers.iter().find(|a| a.position() == position)
    }

    /// Builds the relief of a `width` x `height` window starting at `origin`.
    ///
    /// The window is clipped to the walkable area, so it may come out smaller
    /// than requested, down to empty when `origin` lies outside.
    pub fn relief(
        &self,
        origin: Position,
        width: usize,
        height: usize,
    ) -> Result<Grid<CellType>, GridError> {
        let width = width.min(self.width.saturating_sub(origin.x));
        let height = height.min(self.height.saturating_sub(origin.y));
        let mut relief = Grid::new(width, height)?;

        for mountain in &self.mountains {
            let x = mountain.x.checked_sub(origin.x);
            let y = mountain.y.checked_sub(origin.y);
            if let (Some(x), Some(y)) = (x, y) {
                let cell = Position::new(x, y);
                if relief.contains(cell) {
                    relief.set(cell, CellType::Mountain)?;
                }
            }
        }
        Ok(relief)
    }

    /// Raises a mountain, refusing tiles already holding anything.
    pub fn add_mountain(&mut self, position: Position) -> Result<(), TerrainError> {
        if self.is_mountain(position) {
            return Err(TerrainError::DuplicateMountain(position));
        }
        if self.treasures.contains(&position) {
            return Err(TerrainError::TreasureOnMountain(position));
        }
        if let Some(adventurer) = self.adventurer_at(position) {
            return Err(TerrainError::AdventurerOnMountain {
                name: adventurer.name().to_string(),
                position,
            });
        }

        self.mountain_tiles.insert(position);
        self.mountains.push(position);
        Ok(())
    }

    /// Buries `quantity` treasures on a tile.
    pub fn add_treasures(&mut self, position: Position, quantity: usize) -> Result<(), TerrainError> {
        if self.is_mountain(position) {
            return Err(TerrainError::TreasureOnMountain(position));
        }
        self.treasures.extend(std::iter::repeat_n(position, quantity));
        Ok(())
    }

    /// Places an adventurer at its starting tile.
    pub fn add_adventurer(&mut self, adventurer: Adventurer) -> Result<(), TerrainError> {
        let position = adventurer.position();
        if !self.contains(position) {
            return Err(TerrainError::AdventurerOutOfBounds {
                name: adventurer.name().to_string(),
                x: i64::try_from(position.x).unwrap_or(i64::MAX),
                y: i64::try_from(position.y).unwrap_or(i64::MAX),
            });
        }
        if self.is_mountain(position) {
            return Err(TerrainError::AdventurerOnMountain {
                name: adventurer.name().to_string(),
                position,
            });
        }
        if let Some(other) = self.adventurer_at(position) {
            return Err(TerrainError::AdventurersCollide {
                name: adventurer.name().to_string(),
                other: other.name().to_string(),
                position,
            });
        }

        self.adventurers.push(adventurer);
        Ok(())
    }

    pub fn has_adventurers_to_move(&self) -> bool {
        self.adventurers.iter().any(Adventurer::has_pending_actions)
    }

    /// Runs rounds until no adventurer has actions left.
    pub fn run(&mut self) -> Result<RunSummary, AdventurerError> {
        let mut summary = RunSummary::default();
        while self.has_adventurers_to_move() {
            let report = self.play_round()?;
            summary.record(&report);
        }
        info!(
            "Run finished after {} rounds: {} moves, {} turns, {} blocked, {} treasures collected",
            summary.rounds, summary.moves, summary.turns, summary.blocked, summary.treasures_collected
        );
        Ok(summary)
    }

    /// Gives every adventurer with pending actions one attempt, in list order.
    ///
    /// Occupancy is checked against the live positions of the others, so a
    /// tile vacated earlier in the same round is free again.
    pub fn play_round(&mut self) -> Result<RoundReport, AdventurerError> {
        let mut turns = Vec::new();

        for index in 0..self.adventurers.len() {
            let Some(next) = self.adventurers[index].peek_next() else {
                continue;
            };

            let outcome = match self.check_move(index, &next) {
                Ok(target) => {
                    let action = self.adventurers[index].commit_move()?;
                    if self.take_treasure(target) {
                        self.adventurers[index].pickup_treasure();
                        MoveOutcome::Collected
                    } else if action == Action::MoveForward {
                        MoveOutcome::Moved
                    } else {
                        MoveOutcome::Turned
                    }
                }
                Err(reason) => {
                    self.adventurers[index].skip_turn();
                    MoveOutcome::Blocked(reason)
                }
            };

            let adventurer = &self.adventurers[index];
            debug!(
                "Round {}: {} {:?} -> {:?} at {} facing {}",
                self.rounds_played + 1,
                adventurer.name(),
                next.action,
                outcome,
                adventurer.position(),
                adventurer.orientation()
            );
            turns.push(Turn {
                adventurer: index,
                action: next.action,
                outcome,
            });
        }

        self.rounds_played += 1;
        trace!("Round {} done, {} turns", self.rounds_played, turns.len());
        Ok(RoundReport {
            round: self.rounds_played,
            turns,
        })
    }

    /// Determines whether adventurer `index` may reach `next`.
    fn check_move(&self, index: usize, next: &NextState) -> Result<Position, BlockReason> {
        let target = next
            .position()
            .filter(|position| self.contains(*position))
            .ok_or(BlockReason::OutOfBounds)?;

        if self.is_mountain(target) {
            return Err(BlockReason::Mountain);
        }

        let occupant = self
            .adventurers
            .iter()
            .enumerate()
            .find(|(other, adventurer)| *other != index && adventurer.position() == target);
        if let Some((_, occupant)) = occupant {
            return Err(BlockReason::Occupied {
                by: occupant.name().to_string(),
            });
        }

        Ok(target)
    }

    /// Removes one treasure record at `position`, if any.
    fn take_treasure(&mut self, position: Position) -> bool {
        match self.treasures.iter().position(|t| *t == position) {
            Some(index) => {
                self.treasures.remove(index);
                true
            }
            None => false,
        }
    }
}
