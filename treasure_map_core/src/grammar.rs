use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between the fields of a terrain line.
pub const FIELD_SEPARATOR: &str = " - ";

/// Lines starting with this marker are ignored.
pub const COMMENT_MARKER: char = '#';

/// Compass orientation of an adventurer.
///
/// Turning follows the cycle `North -> East -> South -> West` for a right turn
/// and the reverse cycle for a left turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    North,
    South,
    East,
    West,
}

impl Orientation {
    /// Decodes a single-character orientation code.
    ///
    /// West is written `O` (from *Ouest*). Any other code yields `None`.
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'N' => Some(Orientation::North),
            'S' => Some(Orientation::South),
            'E' => Some(Orientation::East),
            'O' => Some(Orientation::West),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            Orientation::North => 'N',
            Orientation::South => 'S',
            Orientation::East => 'E',
            Orientation::West => 'O',
        }
    }

    pub fn turn_left(self) -> Self {
        match self {
            Orientation::North => Orientation::West,
            Orientation::West => Orientation::South,
            Orientation::South => Orientation::East,
            Orientation::East => Orientation::North,
        }
    }

    pub fn turn_right(self) -> Self {
        match self {
            Orientation::North => Orientation::East,
            Orientation::East => Orientation::South,
            Orientation::South => Orientation::West,
            Orientation::West => Orientation::North,
        }
    }

    /// Returns the `(dx, dy)` step of a forward move. `y` grows southwards.
    pub fn delta(self) -> (i64, i64) {
        match self {
            Orientation::North => (0, -1),
            Orientation::South => (0, 1),
            Orientation::East => (1, 0),
            Orientation::West => (-1, 0),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A single scripted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    MoveForward,
    TurnRight,
    TurnLeft,
}

impl Action {
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'A' => Some(Action::MoveForward),
            'D' => Some(Action::TurnRight),
            'G' => Some(Action::TurnLeft),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            Action::MoveForward => 'A',
            Action::TurnRight => 'D',
            Action::TurnLeft => 'G',
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The kind of declaration a terrain line holds, keyed on its first token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    Dimensions,
    Mountain,
    Treasure,
    Adventurer,
}

impl LineKind {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "C" => Some(LineKind::Dimensions),
            "M" => Some(LineKind::Mountain),
            "T" => Some(LineKind::Treasure),
            "A" => Some(LineKind::Adventurer),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            LineKind::Dimensions => 'C',
            LineKind::Mountain => 'M',
            LineKind::Treasure => 'T',
            LineKind::Adventurer => 'A',
        }
    }

    /// Number of fields following the line code in a script.
    pub fn expected_fields(self) -> usize {
        match self {
            LineKind::Dimensions | LineKind::Mountain => 2,
            LineKind::Treasure => 3,
            LineKind::Adventurer => 5,
        }
    }
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LineKind::Dimensions => "terrain dimensions",
            LineKind::Mountain => "mountain",
            LineKind::Treasure => "treasure",
            LineKind::Adventurer => "adventurer",
        };
        f.write_str(label)
    }
}
