#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Sundial engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems and
//! presentation collaborators to react to. Systems consume event streams,
//! query immutable views, and respond exclusively with new command batches.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

mod level;

pub use level::{Level, LevelData, LevelElement, LevelError, DEFAULT_DOOR_POWER};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Sundial.";

/// Power carried by a freshly cast chant.
pub const CHANT_BASE_POWER: u32 = 1;

/// Minimum chant power that clears a ghost statue instead of being absorbed by it.
pub const GHOST_BREAK_POWER: u32 = 3;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Discards the current attempt and enters the provided level.
    LoadLevel {
        /// Validated level description to instantiate.
        level: Level,
    },
    /// Rebuilds the current level from its data, discarding all attempt state.
    Restart,
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that the player step one cell in the provided direction.
    MovePlayer {
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Casts a chant from the player's cell along the player's facing.
    StartChant,
    /// Tears down the current chant, whether it is still travelling or settled.
    StopChant,
    /// Advances the identified chant by a single cell.
    AdvanceChant {
        /// Chant the step was scheduled for. Stale identifiers are ignored.
        chant: ChantId,
    },
    /// Interacts with the cell the player is facing.
    Interact,
    /// Reports that a ghost statue detected the player.
    TriggerGameOver {
        /// Ghost statue that performed the detection.
        statue: EntityId,
        /// How the player was detected.
        detection: Detection,
    },
    /// Opens every begin door once the level has been completed.
    ForceOpenBeginDoors,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that a level attempt started, either fresh or after a restart.
    LevelLoaded {
        /// Display name of the level.
        name: String,
        /// Number of columns in the grid.
        width: u32,
        /// Number of rows in the grid.
        height: u32,
        /// Dialogue shown when the level starts, if any.
        dialogue: Option<String>,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Reports that the player changed facing without leaving its cell.
    PlayerTurned {
        /// Facing before the turn.
        from: Direction,
        /// Facing after the turn.
        to: Direction,
    },
    /// Confirms that an entity moved between two cells.
    EntityMoved {
        /// Identifier of the entity that moved.
        entity: EntityId,
        /// Cell the entity occupied before moving.
        from: CellCoord,
        /// Cell the entity occupies after moving.
        to: CellCoord,
    },
    /// Confirms that the player pushed a statue one cell.
    StatuePushed {
        /// Identifier of the pushed statue.
        statue: EntityId,
        /// Cell the statue occupied before the push.
        from: CellCoord,
        /// Cell the statue occupies after the push.
        to: CellCoord,
    },
    /// Reports that a statue turned to a new facing.
    StatueRotated {
        /// Identifier of the statue.
        statue: EntityId,
        /// Cell occupied by the statue.
        at: CellCoord,
        /// Facing the statue now redirects chants towards.
        facing: Direction,
    },
    /// Confirms that the level's scroll was picked up.
    ScrollCollected {
        /// Dialogue attached to the scroll, if the level defines one.
        dialogue: Option<String>,
    },
    /// Describes the outcome of a single move request. Emitted exactly once per request.
    PlayerMoveResolved {
        /// Direction that was requested.
        direction: Direction,
        /// Resolution of the request.
        outcome: MoveOutcome,
    },
    /// Announces that a new chant started travelling.
    ChantStarted {
        /// Identifier allocated to the chant.
        chant: ChantId,
        /// Cell the chant was cast from.
        origin: CellCoord,
        /// Initial travel direction.
        direction: Direction,
    },
    /// Reports a node appended to the chant path, including the origin node.
    ChantStep {
        /// Chant the node belongs to.
        chant: ChantId,
        /// Node that was appended.
        node: ChantNode,
    },
    /// Reports that a chant stopped travelling. Emitted exactly once per chant.
    ChantEnded {
        /// Chant that ended.
        chant: ChantId,
        /// Why the chant stopped.
        reason: ChantEndReason,
    },
    /// Reports that a settled chant was dismissed by the player.
    ChantCleared {
        /// Chant whose path was discarded.
        chant: ChantId,
    },
    /// Reports that a chant cleared a ghost statue.
    GhostStatueDestroyed {
        /// Identifier of the cleared statue.
        statue: EntityId,
        /// Cell occupied by the statue.
        at: CellCoord,
    },
    /// Reports that a door received enough chant power to unlock.
    DoorPowered {
        /// Cell occupied by the door.
        at: CellCoord,
    },
    /// Reports that a door stopped blocking movement.
    DoorOpened {
        /// Cell occupied by the door.
        at: CellCoord,
        /// Role the door plays in the level.
        door_type: DoorType,
    },
    /// Reports that an interaction did not change the win state.
    InteractionRejected {
        /// Why the interaction was declined.
        reason: InteractionRejection,
    },
    /// Announces that the current attempt failed.
    GameOver {
        /// Cause of the failure.
        reason: GameOverReason,
    },
    /// Announces that the current level was won.
    LevelComplete,
    /// Announces that the begin doors of the final level were forced open.
    TrueEndingUnlocked,
}

/// Cardinal directions. `Up` increases the row index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Towards increasing `y`.
    Up,
    /// Towards decreasing `y`.
    #[default]
    Down,
    /// Towards decreasing `x`.
    Left,
    /// Towards increasing `x`.
    Right,
}

impl Direction {
    /// All directions in a fixed order.
    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Unit offset `(dx, dy)` associated with the direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, 1),
            Self::Down => (0, -1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// Direction pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Location of a single grid cell. Coordinates may lie outside the grid;
/// bounds are checked by the grid that interprets them.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellCoord {
    x: i32,
    y: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Coordinate one step away in the provided direction.
    #[must_use]
    pub const fn neighbor(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Closed set of things a level can place on a cell.
///
/// `Ground` is the implicit value of an empty cell and never occupies the
/// grid. `Void` is terrain: it has no occupant but swallows the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridObjectKind {
    /// Walkable empty floor.
    Ground,
    /// Immovable wall that blocks movement, chants and sight.
    Wall,
    /// Immovable obstacle that blocks movement, chants and sight.
    Obstacle,
    /// Pushable amplifier that redirects chants along its facing.
    Statue,
    /// Hostile watcher that only a strong chant can clear.
    GhostStatue,
    /// Collectible that gates door unlocking.
    Scroll,
    /// Entry or goal door.
    Door,
    /// Cell where the player appears when the level starts.
    SpawnPoint,
    /// The player avatar.
    Player,
    /// Hole in the floor.
    Void,
}

impl GridObjectKind {
    /// Whether the kind stops a hostile statue's line of sight.
    #[must_use]
    pub const fn blocks_sight(self) -> bool {
        matches!(
            self,
            Self::Wall | Self::Obstacle | Self::Statue | Self::Door | Self::GhostStatue
        )
    }
}

/// Role a door plays within its level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorType {
    /// Entrance the player came through. Inert apart from the true ending.
    BeginDoor,
    /// Goal door that unlocks with the scroll and a strong enough chant.
    #[default]
    EndDoor,
}

/// Unique identifier assigned to an entity for the lifetime of a level attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a single cast chant. Doubles as its cancellation token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChantId(u32);

impl ChantId {
    /// Creates a new chant identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Identifier allocated after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// One cell of a chant path together with the power the wave carried into it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChantNode {
    /// Cell reached by the wave.
    pub coord: CellCoord,
    /// Power carried into the cell.
    pub power: u32,
}

impl ChantNode {
    /// Creates a new chant node.
    #[must_use]
    pub const fn new(coord: CellCoord, power: u32) -> Self {
        Self { coord, power }
    }
}

/// Resolution of a single move request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveOutcome {
    /// The player entered the target cell, possibly pushing a statue.
    Moved,
    /// Nothing moved.
    Blocked,
    /// The player stepped into void terrain and the attempt failed.
    FellIntoVoid,
    /// The player only changed facing.
    Turned,
}

/// How a ghost statue noticed the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Detection {
    /// The player stood on an orthogonally adjacent cell.
    Adjacent,
    /// The player stood in the statue's unobstructed line of sight.
    LineOfSight,
}

/// Why an attempt failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOverReason {
    /// A ghost statue detected the player.
    Spotted {
        /// Statue that detected the player.
        statue: EntityId,
        /// Cell occupied by the statue.
        at: CellCoord,
        /// How the detection happened.
        detection: Detection,
    },
    /// The player walked into void terrain.
    FellIntoVoid {
        /// Cell the player fell into.
        at: CellCoord,
    },
}

impl fmt::Display for GameOverReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spotted {
                at,
                detection: Detection::Adjacent,
                ..
            } => write!(f, "a ghost statue at {at} sensed you beside it"),
            Self::Spotted {
                at,
                detection: Detection::LineOfSight,
                ..
            } => write!(f, "a ghost statue at {at} saw you"),
            Self::FellIntoVoid { at } => write!(f, "you fell into the void at {at}"),
        }
    }
}

/// Why a chant stopped travelling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChantEndReason {
    /// The wave was absorbed by the occupant of a cell.
    Absorbed {
        /// Cell that absorbed the wave.
        at: CellCoord,
        /// Kind of the absorbing occupant.
        kind: GridObjectKind,
    },
    /// The next cell lay outside the grid.
    LeftGrid,
    /// The wave hit the step ceiling, which only malformed levels can reach.
    StepCeiling,
    /// The player stopped the chant or cast a new one.
    Cancelled,
    /// The attempt ended while the chant was travelling.
    AttemptEnded,
}

/// Why an interaction did not win the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionRejection {
    /// The faced cell holds nothing that reacts to interaction.
    NothingToInteract,
    /// The faced door is the entrance.
    BeginDoor,
    /// The scroll has not been collected yet.
    MissingScroll,
    /// The door has not been powered by a chant.
    DoorUnpowered,
    /// The level is already won.
    AlreadyComplete,
}

impl fmt::Display for InteractionRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::NothingToInteract => "there is nothing here to interact with",
            Self::BeginDoor => "this is the way you came in",
            Self::MissingScroll => "the door is sealed; the scroll is still missing",
            Self::DoorUnpowered => "the door is sealed; it needs a stronger chant",
            Self::AlreadyComplete => "the door is already open",
        };
        f.write_str(message)
    }
}

/// Progress of the current level attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttemptPhase {
    /// Gameplay commands are accepted.
    Playing,
    /// The attempt failed and awaits a restart.
    Failed,
    /// The level was won.
    Completed,
}

/// Lifecycle of the chant engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChantState {
    /// No chant exists.
    Idle,
    /// A chant is travelling and will advance on the next step.
    Active,
    /// A chant stopped travelling; its path stays visible until dismissed.
    Settled,
}

/// Occupant of a grid cell as exposed to systems.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Occupant {
    /// Identifier of the occupying entity.
    pub id: EntityId,
    /// Kind of the occupying entity.
    pub kind: GridObjectKind,
}

/// Read-only view into the dense occupancy grid.
#[derive(Clone, Copy, Debug)]
pub struct OccupancyView<'a> {
    cells: &'a [Option<Occupant>],
    width: u32,
    height: u32,
}

impl<'a> OccupancyView<'a> {
    /// Captures a new occupancy view backed by the provided row-major cell slice.
    #[must_use]
    pub fn new(cells: &'a [Option<Occupant>], width: u32, height: u32) -> Self {
        Self {
            cells,
            width,
            height,
        }
    }

    /// Returns the occupant of the provided cell, if any.
    #[must_use]
    pub fn occupant(&self, cell: CellCoord) -> Option<Occupant> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub fn in_bounds(&self, cell: CellCoord) -> bool {
        self.index(cell).is_some()
    }

    /// Returns an iterator over all cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = Option<Occupant>> + 'a {
        self.cells.iter().copied()
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        let x = u32::try_from(cell.x()).ok()?;
        let y = u32::try_from(cell.y()).ok()?;
        if x < self.width && y < self.height {
            let row = usize::try_from(y).ok()?;
            let column = usize::try_from(x).ok()?;
            let width = usize::try_from(self.width).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Immutable representation of the player used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerSnapshot {
    /// Identifier of the player entity.
    pub id: EntityId,
    /// Cell occupied by the player.
    pub cell: CellCoord,
    /// Direction the player faces.
    pub facing: Direction,
}

/// Immutable representation of a single ghost statue used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GhostStatueSnapshot {
    /// Identifier of the statue.
    pub id: EntityId,
    /// Cell occupied by the statue.
    pub cell: CellCoord,
    /// Direction the statue watches.
    pub facing: Direction,
    /// Whether a chant already cleared the statue.
    pub destroyed: bool,
    /// Whether the statue already ended this attempt.
    pub has_triggered_game_over: bool,
}

/// Read-only snapshot describing all ghost statues in the level.
#[derive(Clone, Debug, Default)]
pub struct GhostStatueView {
    snapshots: Vec<GhostStatueSnapshot>,
}

impl GhostStatueView {
    /// Creates a new view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<GhostStatueSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &GhostStatueSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<GhostStatueSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a door used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DoorSnapshot {
    /// Identifier of the door.
    pub id: EntityId,
    /// Cell occupied by the door.
    pub cell: CellCoord,
    /// Role the door plays in the level.
    pub door_type: DoorType,
    /// Minimum chant power needed to unlock the door.
    pub required_power: u32,
    /// Whether a chant powered the door.
    pub powered: bool,
    /// Whether the door currently blocks movement.
    pub blocks_movement: bool,
}
