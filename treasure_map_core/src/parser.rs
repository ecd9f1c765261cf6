//! Parsing of the line-oriented terrain format.
//!
//! ```text
//! C - <width> - <height>
//! M - <x> - <y>
//! T - <x> - <y> - <quantity>
//! A - <name> - <x> - <y> - <orientation> - <actions>
//! ```
//!
//! Lines are decoded one by one into [`Declaration`]s, then checked against
//! each other once the whole input is read, so declarations may appear in any
//! order.

use log::debug;

use crate::{
    Position,
    adventurer::Adventurer,
    grammar::{Action, COMMENT_MARKER, FIELD_SEPARATOR, LineKind, Orientation},
    terrain::Terrain,
};

/// Represents errors raised while loading a terrain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TerrainError {
    #[error("Unable to parse terrain line: \"{0}\"")]
    UnknownLine(String),
    #[error("Too few information for {kind}: expected {expected} fields, found {found} in \"{line}\"")]
    TooFewFields {
        kind: LineKind,
        expected: usize,
        found: usize,
        line: String,
    },
    #[error("Too much information for {kind}: expected {expected} fields, found {found} in \"{line}\"")]
    TooManyFields {
        kind: LineKind,
        expected: usize,
        found: usize,
        line: String,
    },
    #[error("Unparsable {field} \"{value}\" for {kind} in \"{line}\"")]
    Unparsable {
        kind: LineKind,
        field: &'static str,
        value: String,
        line: String,
    },
    #[error("Negative {field} for {kind} in \"{line}\"")]
    NegativeValue {
        kind: LineKind,
        field: &'static str,
        line: String,
    },
    #[error("Terrain cannot have a null or negative width or height ({width} x {height})")]
    NonPositiveDimensions { width: i64, height: i64 },
    #[error("Mismatching terrain dimensions data: dimensions declared more than once")]
    DuplicateDimensions,
    #[error("Unable to read terrain dimensions: no dimensions declared")]
    MissingDimensions,
    #[error("Multiple mountains on same tile {0}")]
    DuplicateMountain(Position),
    #[error("Treasure on a mountain tile {0}")]
    TreasureOnMountain(Position),
    #[error("Adventurer {name} starts on a mountain at {position}")]
    AdventurerOnMountain { name: String, position: Position },
    #[error("Adventurer {name} starts out of terrain boundaries at ({x}, {y})")]
    AdventurerOutOfBounds { name: String, x: i64, y: i64 },
    #[error("Adventurers {name} and {other} start on the same tile {position}")]
    AdventurersCollide {
        name: String,
        other: String,
        position: Position,
    },
    #[error("Unparsable orientation \"{code}\" for adventurer {name}")]
    UnknownOrientation { name: String, code: String },
    #[error("Invalid actions sequence for adventurer {name}: \"{actions}\"")]
    InvalidActions { name: String, actions: String },
}

/// Which flavour of the format is being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Input scripts: adventurer lines end with an action sequence.
    Script,
    /// Simulation results: adventurer lines end with a treasure count.
    Result,
}

/// An adventurer line, before its coordinates are checked against the terrain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdventurerDecl {
    pub name: String,
    pub x: i64,
    pub y: i64,
    pub orientation: Orientation,
    pub actions: Vec<Action>,
    pub treasures: usize,
}

impl AdventurerDecl {
    fn into_adventurer(self) -> Result<Adventurer, TerrainError> {
        let (Ok(x), Ok(y)) = (usize::try_from(self.x), usize::try_from(self.y)) else {
            return Err(TerrainError::AdventurerOutOfBounds {
                name: self.name,
                x: self.x,
                y: self.y,
            });
        };
        Ok(
            Adventurer::new(self.name, Position::new(x, y), self.orientation, self.actions)
                .with_treasures(self.treasures),
        )
    }
}

/// A single decoded terrain line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Dimensions { width: usize, height: usize },
    Mountain(Position),
    Treasures { position: Position, quantity: usize },
    Adventurer(AdventurerDecl),
}

/// Parses an input script into a validated terrain.
pub fn parse(input: &str) -> Result<Terrain, TerrainError> {
    parse_with(input, Dialect::Script)
}

/// Parses a result snapshot, as produced by [`Terrain::to_result_string`].
///
/// Adventurers come back with their collected treasures and no pending action.
pub fn parse_result(input: &str) -> Result<Terrain, TerrainError> {
    parse_with(input, Dialect::Result)
}

pub fn parse_with(input: &str, dialect: Dialect) -> Result<Terrain, TerrainError> {
    let declarations = input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(COMMENT_MARKER))
        .map(|line| parse_line(line, dialect))
        .collect::<Result<Vec<_>, _>>()?;

    let mut dimensions = None;
    let mut mountains = Vec::new();
    let mut treasures = Vec::new();
    let mut adventurers = Vec::new();

    for declaration in declarations {
        match declaration {
            Declaration::Dimensions { width, height } => {
                if dimensions.replace((width, height)).is_some() {
                    return Err(TerrainError::DuplicateDimensions);
                }
            }
            Declaration::Mountain(position) => mountains.push(position),
            Declaration::Treasures { position, quantity } => treasures.push((position, quantity)),
            Declaration::Adventurer(adventurer) => adventurers.push(adventurer),
        }
    }

    let (width, height) = dimensions.ok_or(TerrainError::MissingDimensions)?;
    let mut terrain = Terrain::new(width, height)?;

    // Mountains go first so that treasures and adventurers are checked
    // against all of them, whatever the declaration order.
    for position in mountains {
        terrain.add_mountain(position)?;
    }
    for (position, quantity) in treasures {
        terrain.add_treasures(position, quantity)?;
    }
    for adventurer in adventurers {
        terrain.add_adventurer(adventurer.into_adventurer()?)?;
    }

    debug!(
        "Loaded {}x{} terrain: {} mountains, {} treasures, {} adventurers",
        terrain.width(),
        terrain.height(),
        terrain.mountains().len(),
        terrain.treasures().len(),
        terrain.adventurers().len()
    );
    Ok(terrain)
}

/// Decodes one trimmed, non-comment line.
pub fn parse_line(line: &str, dialect: Dialect) -> Result<Declaration, TerrainError> {
    let mut tokens = line.split(FIELD_SEPARATOR).map(str::trim);
    let kind = tokens
        .next()
        .and_then(LineKind::from_token)
        .ok_or_else(|| TerrainError::UnknownLine(line.to_string()))?;
    let fields: Vec<&str> = tokens.collect();

    let expected = kind.expected_fields();
    if fields.len() < expected {
        return Err(TerrainError::TooFewFields {
            kind,
            expected,
            found: fields.len(),
            line: line.to_string(),
        });
    }
    if fields.len() > expected {
        return Err(TerrainError::TooManyFields {
            kind,
            expected,
            found: fields.len(),
            line: line.to_string(),
        });
    }

    let fields = Fields { kind, line, fields };
    match kind {
        LineKind::Dimensions => {
            let width = fields.integer(0, "width")?;
            let height = fields.integer(1, "height")?;
            match (usize::try_from(width), usize::try_from(height)) {
                (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok(Declaration::Dimensions { width: w, height: h }),
                _ => Err(TerrainError::NonPositiveDimensions { width, height }),
            }
        }
        LineKind::Mountain => Ok(Declaration::Mountain(Position::new(
            fields.unsigned(0, "x")?,
            fields.unsigned(1, "y")?,
        ))),
        LineKind::Treasure => Ok(Declaration::Treasures {
            position: Position::new(fields.unsigned(0, "x")?, fields.unsigned(1, "y")?),
            quantity: fields.unsigned(2, "quantity")?,
        }),
        LineKind::Adventurer => parse_adventurer(&fields, dialect).map(Declaration::Adventurer),
    }
}

fn parse_adventurer(fields: &Fields<'_>, dialect: Dialect) -> Result<AdventurerDecl, TerrainError> {
    let name = fields.get(0).to_string();
    let x = fields.integer(1, "x")?;
    let y = fields.integer(2, "y")?;

    let code = fields.get(3);
    let mut chars = code.chars();
    let orientation = match (chars.next(), chars.next()) {
        (Some(c), None) => Orientation::from_code(c),
        _ => None,
    }
    .ok_or_else(|| TerrainError::UnknownOrientation {
        name: name.clone(),
        code: code.to_string(),
    })?;

    let (actions, treasures) = match dialect {
        Dialect::Script => {
            let script = fields.get(4);
            let actions = script
                .chars()
                .map(Action::from_code)
                .collect::<Option<Vec<_>>>()
                .filter(|actions| !actions.is_empty())
                .ok_or_else(|| TerrainError::InvalidActions {
                    name: name.clone(),
                    actions: script.to_string(),
                })?;
            (actions, 0)
        }
        Dialect::Result => (Vec::new(), fields.unsigned(4, "treasures")?),
    };

    Ok(AdventurerDecl {
        name,
        x,
        y,
        orientation,
        actions,
        treasures,
    })
}

/// The fields of a line following its code, with the context needed for errors.
struct Fields<'a> {
    kind: LineKind,
    line: &'a str,
    fields: Vec<&'a str>,
}

impl Fields<'_> {
    fn get(&self, index: usize) -> &str {
        self.fields[index]
    }

    fn integer(&self, index: usize, field: &'static str) -> Result<i64, TerrainError> {
        let value = self.get(index);
        value.parse().map_err(|_| TerrainError::Unparsable {
            kind: self.kind,
            field,
            value: value.to_string(),
            line: self.line.to_string(),
        })
    }

    fn unsigned(&self, index: usize, field: &'static str) -> Result<usize, TerrainError> {
        let value = self.integer(index, field)?;
        usize::try_from(value).map_err(|_| TerrainError::NegativeValue {
            kind: self.kind,
            field,
            line: self.line.to_string(),
        })
    }
}
