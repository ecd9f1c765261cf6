use std::fmt;

use serde::{Deserialize, Serialize};

pub mod adventurer;
pub mod grammar;
pub mod map;
pub mod parser;
pub mod serializer;
pub mod terrain;

pub use adventurer::{Adventurer, AdventurerError};
pub use grammar::{Action, Orientation};
pub use parser::{TerrainError, parse, parse_result};
pub use terrain::{RunSummary, Terrain};

/// Represents a 2D coordinate on the terrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Any failure of a full parse-run-serialize cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Terrain(#[from] TerrainError),
    #[error(transparent)]
    Adventurer(#[from] AdventurerError),
}

/// Parses a terrain script, runs it to completion and returns the result text.
pub fn simulate(input: &str) -> Result<String, Error> {
    let mut terrain = parse(input)?;
    terrain.run()?;
    Ok(terrain.to_result_string())
}
