//! Level data consumed from external loaders and its load-time validation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CellCoord, Direction, DoorType, GridObjectKind};

/// Chant power a door requires when the level data does not say otherwise.
pub const DEFAULT_DOOR_POWER: u32 = 3;

fn default_door_power() -> u32 {
    DEFAULT_DOOR_POWER
}

/// Single element placed on the grid by level data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelElement {
    /// Cell the element occupies.
    pub position: CellCoord,
    /// Kind of the element.
    pub kind: GridObjectKind,
    /// Initial facing. Meaningful for statues, ghost statues and the spawn point.
    #[serde(default)]
    pub facing: Direction,
    /// Minimum chant power that unlocks the element. Doors only.
    #[serde(default = "default_door_power")]
    pub required_power: u32,
    /// Role of the element. Doors only.
    #[serde(default)]
    pub door_type: DoorType,
}

impl LevelElement {
    /// Creates an element with default door settings.
    #[must_use]
    pub fn new(position: CellCoord, kind: GridObjectKind, facing: Direction) -> Self {
        Self {
            position,
            kind,
            facing,
            required_power: DEFAULT_DOOR_POWER,
            door_type: DoorType::EndDoor,
        }
    }

    /// Creates a door element.
    #[must_use]
    pub fn door(position: CellCoord, door_type: DoorType, required_power: u32) -> Self {
        Self {
            position,
            kind: GridObjectKind::Door,
            facing: Direction::default(),
            required_power,
            door_type,
        }
    }
}

/// Raw level description as produced by an external loader.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelData {
    /// Display name of the level.
    pub name: String,
    /// Number of grid columns.
    pub width: u32,
    /// Number of grid rows.
    pub height: u32,
    /// Whether the level is playable before the previous one is won.
    #[serde(default)]
    pub unlocked: bool,
    /// Dialogue shown when the level starts.
    #[serde(default)]
    pub start_dialogue: Option<String>,
    /// Dialogue shown when the scroll is collected.
    #[serde(default)]
    pub scroll_dialogue: Option<String>,
    /// Elements placed on the grid, in authoring order.
    #[serde(default)]
    pub elements: Vec<LevelElement>,
}

/// Reasons level data may be rejected at load time.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    /// One of the grid dimensions is zero or does not fit a coordinate.
    #[error("grid dimensions {width}x{height} are not usable")]
    InvalidDimensions {
        /// Requested number of columns.
        width: u32,
        /// Requested number of rows.
        height: u32,
    },
    /// An element lies outside the grid.
    #[error("element {index} ({kind:?}) at {position} lies outside the grid")]
    OutOfBounds {
        /// Position of the element in the element list.
        index: usize,
        /// Kind of the element.
        kind: GridObjectKind,
        /// Offending position.
        position: CellCoord,
    },
    /// No spawn point was provided.
    #[error("level has no spawn point")]
    MissingSpawnPoint,
    /// More than one spawn point was provided.
    #[error("level has a second spawn point at {position}")]
    DuplicateSpawnPoint {
        /// Position of the extra spawn point.
        position: CellCoord,
    },
    /// Two elements claim the same cell.
    #[error("cell {position} holds more than one element")]
    OverlappingElements {
        /// Contested cell.
        position: CellCoord,
    },
    /// A door can never be powered.
    #[error("door at {position} requires power {required_power}; doors need at least 1")]
    InvalidDoorPower {
        /// Position of the door.
        position: CellCoord,
        /// Requested power.
        required_power: u32,
    },
    /// The player was placed directly instead of through a spawn point.
    #[error("element {index} places a player at {position}; the player appears at the spawn point")]
    ExplicitPlayer {
        /// Position of the element in the element list.
        index: usize,
        /// Offending position.
        position: CellCoord,
    },
}

/// Level data that passed validation and can be entered by the world.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
    data: LevelData,
    spawn: CellCoord,
    spawn_facing: Direction,
}

impl Level {
    /// Validates raw level data, failing fast on the first problem found.
    pub fn validate(data: LevelData) -> Result<Self, LevelError> {
        let in_range = |value: u32| value > 0 && i32::try_from(value).is_ok();
        if !in_range(data.width) || !in_range(data.height) {
            return Err(LevelError::InvalidDimensions {
                width: data.width,
                height: data.height,
            });
        }

        let mut spawn: Option<(CellCoord, Direction)> = None;
        let mut claimed: HashSet<CellCoord> = HashSet::with_capacity(data.elements.len());

        for (index, element) in data.elements.iter().enumerate() {
            let position = element.position;
            if !contains(data.width, data.height, position) {
                return Err(LevelError::OutOfBounds {
                    index,
                    kind: element.kind,
                    position,
                });
            }

            match element.kind {
                GridObjectKind::Ground => continue,
                GridObjectKind::Player => {
                    return Err(LevelError::ExplicitPlayer { index, position });
                }
                GridObjectKind::SpawnPoint => {
                    if spawn.is_some() {
                        return Err(LevelError::DuplicateSpawnPoint { position });
                    }
                    spawn = Some((position, element.facing));
                }
                GridObjectKind::Door if element.required_power == 0 => {
                    return Err(LevelError::InvalidDoorPower {
                        position,
                        required_power: element.required_power,
                    });
                }
                _ => {}
            }

            if !claimed.insert(position) {
                return Err(LevelError::OverlappingElements { position });
            }
        }

        let (spawn, spawn_facing) = spawn.ok_or(LevelError::MissingSpawnPoint)?;
        Ok(Self {
            data,
            spawn,
            spawn_facing,
        })
    }

    /// Display name of the level.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.data.name
    }

    /// Number of grid columns.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.data.width
    }

    /// Number of grid rows.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.data.height
    }

    /// Whether the level is playable without winning the previous one.
    #[must_use]
    pub fn unlocked(&self) -> bool {
        self.data.unlocked
    }

    /// Dialogue shown when the level starts.
    #[must_use]
    pub fn start_dialogue(&self) -> Option<&str> {
        self.data.start_dialogue.as_deref()
    }

    /// Dialogue shown when the scroll is collected.
    #[must_use]
    pub fn scroll_dialogue(&self) -> Option<&str> {
        self.data.scroll_dialogue.as_deref()
    }

    /// Validated elements in authoring order.
    #[must_use]
    pub fn elements(&self) -> &[LevelElement] {
        &self.data.elements
    }

    /// Cell and facing the player starts with.
    #[must_use]
    pub fn spawn(&self) -> (CellCoord, Direction) {
        (self.spawn, self.spawn_facing)
    }
}

fn contains(width: u32, height: u32, position: CellCoord) -> bool {
    match (u32::try_from(position.x()), u32::try_from(position.y())) {
        (Ok(x), Ok(y)) => x < width && y < height,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_at(x: i32, y: i32) -> LevelElement {
        LevelElement::new(CellCoord::new(x, y), GridObjectKind::SpawnPoint, Direction::Up)
    }

    fn level_with(elements: Vec<LevelElement>) -> LevelData {
        LevelData {
            name: String::from("test"),
            width: 4,
            height: 3,
            elements,
            ..LevelData::default()
        }
    }

    #[test]
    fn accepts_minimal_level() {
        let level = Level::validate(level_with(vec![spawn_at(1, 2)])).expect("valid level");
        assert_eq!(level.spawn(), (CellCoord::new(1, 2), Direction::Up));
        assert_eq!(level.width(), 4);
        assert_eq!(level.height(), 3);
    }

    #[test]
    fn rejects_zero_sized_grid() {
        let mut data = level_with(vec![spawn_at(0, 0)]);
        data.width = 0;
        assert_eq!(
            Level::validate(data),
            Err(LevelError::InvalidDimensions {
                width: 0,
                height: 3
            })
        );
    }

    #[test]
    fn rejects_elements_outside_grid() {
        let wall = LevelElement::new(CellCoord::new(4, 0), GridObjectKind::Wall, Direction::Up);
        assert_eq!(
            Level::validate(level_with(vec![spawn_at(0, 0), wall])),
            Err(LevelError::OutOfBounds {
                index: 1,
                kind: GridObjectKind::Wall,
                position: CellCoord::new(4, 0),
            })
        );

        let negative = LevelElement::new(CellCoord::new(0, -1), GridObjectKind::Wall, Direction::Up);
        assert!(matches!(
            Level::validate(level_with(vec![spawn_at(0, 0), negative])),
            Err(LevelError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn requires_exactly_one_spawn_point() {
        assert_eq!(
            Level::validate(level_with(Vec::new())),
            Err(LevelError::MissingSpawnPoint)
        );
        assert_eq!(
            Level::validate(level_with(vec![spawn_at(0, 0), spawn_at(1, 1)])),
            Err(LevelError::DuplicateSpawnPoint {
                position: CellCoord::new(1, 1)
            })
        );
    }

    #[test]
    fn rejects_overlapping_occupants_but_ignores_ground() {
        let ground = LevelElement::new(CellCoord::new(2, 2), GridObjectKind::Ground, Direction::Up);
        let wall = LevelElement::new(CellCoord::new(2, 2), GridObjectKind::Wall, Direction::Up);
        let statue = LevelElement::new(CellCoord::new(2, 2), GridObjectKind::Statue, Direction::Up);

        assert!(Level::validate(level_with(vec![spawn_at(0, 0), ground, wall.clone()])).is_ok());
        assert_eq!(
            Level::validate(level_with(vec![spawn_at(0, 0), wall, statue])),
            Err(LevelError::OverlappingElements {
                position: CellCoord::new(2, 2)
            })
        );
    }

    #[test]
    fn rejects_unpowerable_doors_and_explicit_players() {
        let door = LevelElement::door(CellCoord::new(3, 0), DoorType::EndDoor, 0);
        assert!(matches!(
            Level::validate(level_with(vec![spawn_at(0, 0), door])),
            Err(LevelError::InvalidDoorPower { .. })
        ));

        let player = LevelElement::new(CellCoord::new(3, 0), GridObjectKind::Player, Direction::Up);
        assert!(matches!(
            Level::validate(level_with(vec![spawn_at(0, 0), player])),
            Err(LevelError::ExplicitPlayer { index: 1, .. })
        ));
    }

    #[test]
    fn level_data_parses_from_toml_with_defaults() {
        let source = r#"
            name = "Courtyard"
            width = 5
            height = 5
            scroll_dialogue = "The wind hums."

            [[elements]]
            position = { x = 0, y = 0 }
            kind = "spawn_point"
            facing = "up"

            [[elements]]
            position = { x = 4, y = 4 }
            kind = "door"

            [[elements]]
            position = { x = 0, y = 4 }
            kind = "door"
            door_type = "begin_door"
            required_power = 2
        "#;

        let data: LevelData = toml::from_str(source).expect("level parses");
        let level = Level::validate(data).expect("level validates");

        assert_eq!(level.name(), "Courtyard");
        assert!(!level.unlocked());
        assert_eq!(level.scroll_dialogue(), Some("The wind hums."));
        assert_eq!(level.elements()[1].required_power, DEFAULT_DOOR_POWER);
        assert_eq!(level.elements()[1].door_type, DoorType::EndDoor);
        assert_eq!(level.elements()[2].door_type, DoorType::BeginDoor);
        assert_eq!(level.elements()[2].required_power, 2);
    }
}
