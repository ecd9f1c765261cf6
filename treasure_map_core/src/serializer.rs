use std::fmt;

use serde::Serialize;

use crate::{
    Position,
    grammar::{FIELD_SEPARATOR, LineKind, Orientation},
    terrain::Terrain,
};

/// A serializable picture of a terrain, for machine-readable output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerrainSnapshot {
    pub width: usize,
    pub height: usize,
    pub rounds_played: usize,
    pub mountains: Vec<Position>,
    pub treasures: Vec<TreasureSnapshot>,
    pub adventurers: Vec<AdventurerSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreasureSnapshot {
    pub position: Position,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdventurerSnapshot {
    pub name: String,
    pub position: Position,
    pub orientation: Orientation,
    pub treasures: usize,
    /// Remaining script, empty once the run is over.
    pub pending_actions: String,
}

impl Terrain {
    /// Renders the terrain in the line format, adventurers reporting their treasures.
    pub fn to_result_string(&self) -> String {
        self.to_string()
    }

    pub fn snapshot(&self) -> TerrainSnapshot {
        TerrainSnapshot {
            width: self.width(),
            height: self.height(),
            rounds_played: self.rounds_played(),
            mountains: self.mountains().to_vec(),
            treasures: self
                .treasure_groups()
                .into_iter()
                .map(|(position, count)| TreasureSnapshot { position, count })
                .collect(),
            adventurers: self
                .adventurers()
                .iter()
                .map(|adventurer| AdventurerSnapshot {
                    name: adventurer.name().to_string(),
                    position: adventurer.position(),
                    orientation: adventurer.orientation(),
                    treasures: adventurer.treasures(),
                    pending_actions: adventurer.pending_actions().map(|a| a.code()).collect(),
                })
                .collect(),
        }
    }
}

fn write_line(f: &mut fmt::Formatter<'_>, kind: LineKind, fields: &[&dyn fmt::Display]) -> fmt::Result {
    write!(f, "{}", kind.code())?;
    for field in fields {
        write!(f, "{FIELD_SEPARATOR}{field}")?;
    }
    writeln!(f)
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_line(f, LineKind::Dimensions, &[&self.width(), &self.height()])?;
        for mountain in self.mountains() {
            write_line(f, LineKind::Mountain, &[&mountain.x, &mountain.y])?;
        }
        for (position, count) in self.treasure_groups() {
            write_line(f, LineKind::Treasure, &[&position.x, &position.y, &count])?;
        }
        for adventurer in self.adventurers() {
            let position = adventurer.position();
            write_line(
                f,
                LineKind::Adventurer,
                &[
                    &adventurer.name(),
                    &position.x,
                    &position.y,
                    &adventurer.orientation(),
                    &adventurer.treasures(),
                ],
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{Action, Adventurer, parse};

    #[test]
    fn renders_every_section_in_order() {
        let mut terrain = Terrain::new(3, 4).unwrap();
        terrain.add_mountain(Position::new(2, 1)).unwrap();
        terrain.add_mountain(Position::new(1, 0)).unwrap();
        terrain.add_treasures(Position::new(1, 3), 3).unwrap();
        terrain.add_treasures(Position::new(0, 3), 2).unwrap();
        terrain
            .add_adventurer(Adventurer::new(
                "Lara",
                Position::new(1, 1),
                Orientation::West,
                Vec::<Action>::new(),
            ))
            .unwrap();

        assert_eq!(
            terrain.to_result_string(),
            "C - 3 - 4\n\
             M - 2 - 1\n\
             M - 1 - 0\n\
             T - 1 - 3 - 3\n\
             T - 0 - 3 - 2\n\
             A - Lara - 1 - 1 - O - 0\n"
        );
    }

    #[test]
    fn empty_treasure_tiles_are_omitted() {
        let mut terrain = parse("C - 2 - 1\nT - 1 - 0 - 1\nA - Indy - 0 - 0 - E - A").unwrap();
        terrain.run().unwrap();
        assert_eq!(terrain.to_result_string(), "C - 2 - 1\nA - Indy - 1 - 0 - E - 1\n");
    }

    #[test]
    fn snapshot_reports_pending_actions() {
        let terrain = parse("C - 2 - 2\nT - 1 - 1 - 2\nA - Indy - 0 - 0 - S - ADG").unwrap();
        let snapshot = terrain.snapshot();
        assert_eq!(snapshot.treasures, vec![TreasureSnapshot {
            position: Position::new(1, 1),
            count: 2
        }]);
        assert_eq!(snapshot.adventurers[0].pending_actions, "ADG");
        assert_eq!(snapshot.rounds_played, 0);
    }
}
