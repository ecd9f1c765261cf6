use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{
    Position,
    grammar::{Action, Orientation},
};

/// Errors raised when an adventurer is forced into an invalid state.
///
/// The engine checks legality before committing, so these only surface on
/// misuse of the adventurer API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdventurerError {
    #[error("Cannot move adventurer {name} to negative coordinates ({x}, {y})")]
    IllegalPosition { name: String, x: i64, y: i64 },
    #[error("Adventurer {name} has no pending action")]
    NoPendingAction { name: String },
}

/// The state an adventurer would reach by performing its next action.
///
/// Coordinates are signed: a forward move from the grid edge points outside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextState {
    pub x: i64,
    pub y: i64,
    pub orientation: Orientation,
    pub action: Action,
}

impl NextState {
    /// Returns the target as a grid position, or `None` if it is negative.
    pub fn position(&self) -> Option<Position> {
        let x = usize::try_from(self.x).ok()?;
        let y = usize::try_from(self.y).ok()?;
        Some(Position { x, y })
    }
}

/// A scripted agent walking the terrain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adventurer {
    name: String,
    position: Position,
    orientation: Orientation,
    actions: VecDeque<Action>,
    treasures: usize,
}

impl Adventurer {
    pub fn new(
        name: impl Into<String>,
        position: Position,
        orientation: Orientation,
        actions: impl IntoIterator<Item = Action>,
    ) -> Self {
        Self {
            name: name.into(),
            position,
            orientation,
            actions: actions.into_iter().collect(),
            treasures: 0,
        }
    }

    /// Sets the number of treasures already collected, as read from a result file.
    pub fn with_treasures(mut self, treasures: usize) -> Self {
        self.treasures = treasures;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn treasures(&self) -> usize {
        self.treasures
    }

    /// Remaining scripted actions, head first.
    pub fn pending_actions(&self) -> impl Iterator<Item = Action> + '_ {
        self.actions.iter().copied()
    }

    pub fn has_pending_actions(&self) -> bool {
        !self.actions.is_empty()
    }

    /// Computes the state reached by the head action without applying it.
    ///
    /// Returns `None` when the script is exhausted.
    pub fn peek_next(&self) -> Option<NextState> {
        let action = *self.actions.front()?;
        let x = self.position.x as i64;
        let y = self.position.y as i64;

        let next = match action {
            Action::MoveForward => {
                let (dx, dy) = self.orientation.delta();
                NextState {
                    x: x + dx,
                    y: y + dy,
                    orientation: self.orientation,
                    action,
                }
            }
            Action::TurnLeft => NextState {
                x,
                y,
                orientation: self.orientation.turn_left(),
                action,
            },
            Action::TurnRight => NextState {
                x,
                y,
                orientation: self.orientation.turn_right(),
                action,
            },
        };
        Some(next)
    }

    /// Applies the head action and pops it from the queue.
    ///
    /// Legality against the terrain is the caller's job; only negative
    /// coordinates are refused here, and the adventurer is left unchanged.
    pub fn commit_move(&mut self) -> Result<Action, AdventurerError> {
        let next = self
            .peek_next()
            .ok_or_else(|| AdventurerError::NoPendingAction {
                name: self.name.clone(),
            })?;
        let position = next
            .position()
            .ok_or_else(|| AdventurerError::IllegalPosition {
                name: self.name.clone(),
                x: next.x,
                y: next.y,
            })?;

        self.position = position;
        self.orientation = next.orientation;
        self.actions.pop_front();
        Ok(next.action)
    }

    /// Drops the head action without moving. The action is lost for good.
    pub fn skip_turn(&mut self) -> Option<Action> {
        self.actions.pop_front()
    }

    pub fn pickup_treasure(&mut self) {
        self.treasures += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Action::{MoveForward, TurnLeft, TurnRight};

    fn indiana(orientation: Orientation, actions: Vec<Action>) -> Adventurer {
        Adventurer::new("Indiana Jones", Position::new(0, 0), orientation, actions)
    }

    #[test]
    fn moves_within_boundaries() {
        let mut adventurer = indiana(
            Orientation::East,
            vec![MoveForward, TurnRight, MoveForward, MoveForward, TurnLeft, MoveForward],
        );

        let expected = [
            (1, 0, Orientation::East),
            (1, 0, Orientation::South),
            (1, 1, Orientation::South),
            (1, 2, Orientation::South),
            (1, 2, Orientation::East),
            (2, 2, Orientation::East),
        ];
        for (x, y, orientation) in expected {
            adventurer.commit_move().unwrap();
            assert_eq!(adventurer.position(), Position::new(x, y));
            assert_eq!(adventurer.orientation(), orientation);
        }
        assert!(!adventurer.has_pending_actions());
    }

    #[test]
    fn peek_matches_commit() {
        let mut adventurer = indiana(
            Orientation::East,
            vec![TurnRight, MoveForward, TurnLeft, MoveForward],
        );

        while let Some(next) = adventurer.peek_next() {
            assert_eq!(adventurer.commit_move(), Ok(next.action));
            assert_eq!(Some(adventurer.position()), next.position());
            assert_eq!(adventurer.orientation(), next.orientation);
        }
    }

    #[test]
    fn peek_does_not_mutate() {
        let adventurer = indiana(Orientation::South, vec![MoveForward]);
        let next = adventurer.peek_next().unwrap();
        assert_eq!((next.x, next.y), (0, 1));
        assert_eq!(adventurer.position(), Position::new(0, 0));
        assert_eq!(adventurer.pending_actions().count(), 1);
    }

    #[test]
    fn refuses_negative_coordinates() {
        let mut adventurer = indiana(Orientation::West, vec![MoveForward]);

        let next = adventurer.peek_next().unwrap();
        assert_eq!((next.x, next.y), (-1, 0));
        assert_eq!(next.orientation, Orientation::West);
        assert_eq!(next.position(), None);

        let err = adventurer.commit_move().unwrap_err();
        assert_eq!(
            err,
            AdventurerError::IllegalPosition {
                name: "Indiana Jones".into(),
                x: -1,
                y: 0
            }
        );
        assert_eq!(adventurer.position(), Position::new(0, 0));
        assert!(adventurer.has_pending_actions());
    }

    #[test]
    fn skips_on_demand() {
        let mut adventurer = indiana(Orientation::North, vec![MoveForward, TurnRight]);
        let before = adventurer.position();

        assert_eq!(adventurer.skip_turn(), Some(MoveForward));
        assert_eq!(adventurer.position(), before);
        assert_eq!(adventurer.orientation(), Orientation::North);
        assert_eq!(
            adventurer.peek_next().map(|n| n.orientation),
            Some(Orientation::East)
        );
    }

    #[test]
    fn exhausted_script() {
        let mut adventurer = indiana(Orientation::North, vec![]);
        assert!(!adventurer.has_pending_actions());
        assert_eq!(adventurer.peek_next(), None);
        assert_eq!(adventurer.skip_turn(), None);
        assert!(matches!(
            adventurer.commit_move(),
            Err(AdventurerError::NoPendingAction { .. })
        ));
    }

    #[test]
    fn counts_treasures() {
        let mut adventurer = indiana(Orientation::North, vec![]).with_treasures(2);
        adventurer.pickup_treasure();
        assert_eq!(adventurer.treasures(), 3);
    }
}
