#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Sundial.
//!
//! The world owns the grid, every entity, the chant engine and the win-condition
//! latches. It is mutated exclusively through [`apply`] and observed through the
//! functions in [`query`].

mod chant;
mod entities;
mod grid;
mod movement;
mod progress;

use sundial_core::{
    AttemptPhase, CellCoord, ChantEndReason, ChantId, ChantNode, Command, Detection, Direction,
    DoorType, EntityId, Event, GameOverReason, GridObjectKind, InteractionRejection, Level,
    MoveOutcome, CHANT_BASE_POWER, WELCOME_BANNER,
};
use tracing::{debug, info, warn};

use crate::{
    chant::{ChantEngine, ChantWave, Field, StepResult, Teardown},
    entities::{Entities, Entity, EntityData},
    grid::{GridWorld, Terrain},
    progress::Progress,
};

pub use chant::CHANT_STEP_CEILING;

/// Rule switches that adapters may toggle when constructing the world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Options {
    turn_in_place: bool,
}

impl Options {
    /// Creates the default rule set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            turn_in_place: false,
        }
    }

    /// When enabled, a move against the current facing only turns the player.
    #[must_use]
    pub const fn with_turn_in_place(mut self, enabled: bool) -> Self {
        self.turn_in_place = enabled;
        self
    }

    /// Whether moves against the current facing only turn the player.
    #[must_use]
    pub const fn turn_in_place(&self) -> bool {
        self.turn_in_place
    }
}

/// Represents the authoritative Sundial world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    options: Options,
    level: Option<Level>,
    attempt: Option<Attempt>,
    tick_index: u64,
    next_chant: ChantId,
}

impl World {
    /// Creates a world with no level loaded.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(Options::new())
    }

    /// Creates a world with no level loaded using the provided rule switches.
    #[must_use]
    pub fn with_options(options: Options) -> Self {
        Self {
            banner: WELCOME_BANNER,
            options,
            level: None,
            attempt: None,
            tick_index: 0,
            next_chant: ChantId::new(0),
        }
    }

    fn playing_mut(&mut self) -> Option<&mut Attempt> {
        self.attempt
            .as_mut()
            .filter(|attempt| attempt.phase == AttemptPhase::Playing)
    }

    fn enter(&mut self, level: Level, out_events: &mut Vec<Event>) {
        if let Some(previous) = self.attempt.as_mut() {
            push_teardown(previous.chant.teardown(), out_events);
        }

        self.attempt = Some(Attempt::build(&level));
        info!(
            level = level.name(),
            width = level.width(),
            height = level.height(),
            "level entered"
        );
        out_events.push(Event::LevelLoaded {
            name: level.name().to_owned(),
            width: level.width(),
            height: level.height(),
            dialogue: level.start_dialogue().map(str::to_owned),
        });
        self.level = Some(level);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Mutable state of a single attempt at a level. Rebuilt from the level on restart.
#[derive(Debug)]
pub(crate) struct Attempt {
    pub(crate) grid: GridWorld,
    pub(crate) entities: Entities,
    pub(crate) player: EntityId,
    pub(crate) progress: Progress,
    pub(crate) chant: ChantEngine,
    pub(crate) phase: AttemptPhase,
    pub(crate) scroll_dialogue: Option<String>,
}

impl Attempt {
    fn build(level: &Level) -> Self {
        let mut grid = GridWorld::new(level.width(), level.height());
        let mut entities = Entities::default();

        let (spawn, facing) = level.spawn();
        let player = Entity::player(entities.next_id(), spawn, facing);
        grid.set(spawn, Some(player.occupant()));
        let player = entities.insert(player);

        for element in level.elements() {
            if element.kind == GridObjectKind::Void {
                grid.set_terrain(element.position, Terrain::Void);
                continue;
            }
            let Some(entity) = Entity::from_element(entities.next_id(), element) else {
                continue;
            };
            grid.set(entity.position, Some(entity.occupant()));
            let _ = entities.insert(entity);
        }

        Self {
            grid,
            entities,
            player,
            progress: Progress::default(),
            chant: ChantEngine::default(),
            phase: AttemptPhase::Playing,
            scroll_dialogue: level.scroll_dialogue().map(str::to_owned),
        }
    }

    /// Moves an entity on the grid, returning the cell it left.
    pub(crate) fn shift(&mut self, id: EntityId, to: CellCoord) -> Option<CellCoord> {
        let entity = self.entities.get_mut(id)?;
        let from = entity.position;
        self.grid.relocate(from, to);
        entity.position = to;
        Some(from)
    }

    pub(crate) fn fail(&mut self, reason: GameOverReason, out_events: &mut Vec<Event>) {
        self.phase = AttemptPhase::Failed;
        info!(%reason, "attempt failed");
        out_events.push(Event::GameOver { reason });
        self.halt_chant(out_events);
    }

    pub(crate) fn complete(&mut self, out_events: &mut Vec<Event>) {
        if !self.progress.complete() {
            return;
        }
        self.phase = AttemptPhase::Completed;
        info!("level complete");
        out_events.push(Event::LevelComplete);
        self.halt_chant(out_events);
    }

    fn halt_chant(&mut self, out_events: &mut Vec<Event>) {
        if let Some(chant) = self.chant.settle() {
            out_events.push(Event::ChantEnded {
                chant,
                reason: ChantEndReason::AttemptEnded,
            });
        }
    }

    fn start_chant(&mut self, chant: ChantId, out_events: &mut Vec<Event>) {
        let Some(player) = self.entities.get(self.player) else {
            return;
        };
        let origin = player.position;
        let direction = player.facing;

        push_teardown(
            self.chant
                .begin(ChantWave::cast(chant, origin, direction)),
            out_events,
        );
        debug!(chant = chant.get(), %origin, ?direction, "chant cast");
        out_events.push(Event::ChantStarted {
            chant,
            origin,
            direction,
        });
        out_events.push(Event::ChantStep {
            chant,
            node: ChantNode::new(origin, CHANT_BASE_POWER),
        });
    }

    fn stop_chant(&mut self, out_events: &mut Vec<Event>) {
        push_teardown(self.chant.teardown(), out_events);
    }

    fn advance_chant(&mut self, chant: ChantId, out_events: &mut Vec<Event>) {
        let Some(wave) = self.chant.active_wave_mut(chant) else {
            return;
        };
        let mut field = Field {
            grid: &self.grid,
            entities: &mut self.entities,
            progress: &mut self.progress,
            events: out_events,
        };

        match wave.advance(&mut field) {
            StepResult::Advanced(node) => out_events.push(Event::ChantStep { chant, node }),
            StepResult::Ended(reason) => {
                let _ = self.chant.settle();
                if reason == ChantEndReason::StepCeiling {
                    warn!(
                        chant = chant.get(),
                        ceiling = CHANT_STEP_CEILING,
                        "chant stopped at the step ceiling; statues redirect it in a loop"
                    );
                } else {
                    debug!(chant = chant.get(), ?reason, "chant settled");
                }
                out_events.push(Event::ChantEnded { chant, reason });
            }
        }
    }

    fn interact(&mut self, out_events: &mut Vec<Event>) {
        let Some(player) = self.entities.get(self.player) else {
            return;
        };
        let position = player.position;
        let target = self.grid.neighbor(position, player.facing);

        let faced = self
            .grid
            .get(target)
            .and_then(|occupant| self.entities.get(occupant.id));
        let verdict = match faced {
            Some(entity) => match entity.data {
                EntityData::Door(door) => self
                    .progress
                    .check_interaction(&door)
                    .map(|()| Some((entity.id, door.door_type))),
                _ if entity.kind == GridObjectKind::Statue => Ok(None),
                _ => Err(InteractionRejection::NothingToInteract),
            },
            None => Err(InteractionRejection::NothingToInteract),
        };

        match verdict {
            Ok(Some((door, door_type))) => {
                if let Some(entity) = self.entities.get_mut(door) {
                    entity.blocks_movement = false;
                }
                out_events.push(Event::DoorOpened {
                    at: target,
                    door_type,
                });
                self.complete(out_events);
            }
            Ok(None) => {}
            Err(reason) => out_events.push(Event::InteractionRejected { reason }),
        }

        if self.phase == AttemptPhase::Playing {
            self.face_statues_towards(position, out_events);
        }
    }

    /// Turns every statue beside `cell` to face it.
    fn face_statues_towards(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        for direction in Direction::ALL {
            let beside = self.grid.neighbor(cell, direction);
            let Some(occupant) = self.grid.get(beside) else {
                continue;
            };
            if occupant.kind != GridObjectKind::Statue {
                continue;
            }
            let Some(statue) = self.entities.get_mut(occupant.id) else {
                continue;
            };
            let facing = direction.opposite();
            if statue.facing != facing {
                statue.facing = facing;
                out_events.push(Event::StatueRotated {
                    statue: occupant.id,
                    at: beside,
                    facing,
                });
            }
        }
    }

    fn trigger_game_over(
        &mut self,
        statue: EntityId,
        detection: Detection,
        out_events: &mut Vec<Event>,
    ) {
        let Some(entity) = self.entities.get_mut(statue) else {
            return;
        };
        let EntityData::GhostStatue(state) = &mut entity.data else {
            return;
        };
        if state.destroyed || state.has_triggered_game_over {
            return;
        }
        state.has_triggered_game_over = true;
        let at = entity.position;

        self.fail(
            GameOverReason::Spotted {
                statue,
                at,
                detection,
            },
            out_events,
        );
    }

    fn force_open_begin_doors(&mut self, out_events: &mut Vec<Event>) {
        if !self.progress.unlock_true_ending() {
            return;
        }
        for entity in self.entities.iter_mut() {
            let EntityData::Door(door) = entity.data else {
                continue;
            };
            if door.door_type == DoorType::BeginDoor && entity.blocks_movement {
                entity.blocks_movement = false;
                out_events.push(Event::DoorOpened {
                    at: entity.position,
                    door_type: DoorType::BeginDoor,
                });
            }
        }
        info!("begin doors forced open");
        out_events.push(Event::TrueEndingUnlocked);
    }
}

fn push_teardown(teardown: Option<Teardown>, out_events: &mut Vec<Event>) {
    match teardown {
        Some(Teardown::Cancelled(chant)) => out_events.push(Event::ChantEnded {
            chant,
            reason: ChantEndReason::Cancelled,
        }),
        Some(Teardown::Cleared(chant)) => out_events.push(Event::ChantCleared { chant }),
        None => {}
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Gameplay commands are ignored while no level is loaded or once the attempt has
/// failed or been completed; `Restart` and `LoadLevel` are always honoured.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::LoadLevel { level } => world.enter(level, out_events),
        Command::Restart => {
            if let Some(level) = world.level.take() {
                world.enter(level, out_events);
            }
        }
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::MovePlayer { direction } => {
            let turn_in_place = world.options.turn_in_place();
            let Some(attempt) = world.playing_mut() else {
                return;
            };
            let outcome = if attempt.chant.is_active() {
                MoveOutcome::Blocked
            } else {
                movement::resolve(attempt, direction, turn_in_place, out_events)
            };
            out_events.push(Event::PlayerMoveResolved { direction, outcome });
        }
        Command::StartChant => {
            let chant = world.next_chant;
            if let Some(attempt) = world.playing_mut() {
                attempt.start_chant(chant, out_events);
                world.next_chant = chant.next();
            }
        }
        Command::StopChant => {
            if let Some(attempt) = world.attempt.as_mut() {
                attempt.stop_chant(out_events);
            }
        }
        Command::AdvanceChant { chant } => {
            if let Some(attempt) = world.playing_mut() {
                attempt.advance_chant(chant, out_events);
            }
        }
        Command::Interact => match world.attempt.as_mut() {
            Some(attempt) if attempt.phase == AttemptPhase::Playing => {
                attempt.interact(out_events);
            }
            Some(attempt) if attempt.phase == AttemptPhase::Completed => {
                out_events.push(Event::InteractionRejected {
                    reason: InteractionRejection::AlreadyComplete,
                });
            }
            _ => {}
        },
        Command::TriggerGameOver { statue, detection } => {
            if let Some(attempt) = world.playing_mut() {
                attempt.trigger_game_over(statue, detection, out_events);
            }
        }
        Command::ForceOpenBeginDoors => {
            if let Some(attempt) = world
                .attempt
                .as_mut()
                .filter(|attempt| attempt.phase == AttemptPhase::Completed)
            {
                attempt.force_open_begin_doors(out_events);
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use sundial_core::{
        AttemptPhase, CellCoord, ChantId, ChantNode, ChantState, Direction, DoorSnapshot,
        GhostStatueView, GridObjectKind, OccupancyView, PlayerSnapshot,
    };

    use super::World;

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Number of ticks processed since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Display name of the loaded level.
    #[must_use]
    pub fn level_name(world: &World) -> Option<&str> {
        world.level.as_ref().map(|level| level.name())
    }

    /// Columns and rows of the loaded level.
    #[must_use]
    pub fn grid_size(world: &World) -> Option<(u32, u32)> {
        world
            .attempt
            .as_ref()
            .map(|attempt| attempt.grid.dimensions())
    }

    /// Phase of the current attempt.
    #[must_use]
    pub fn phase(world: &World) -> Option<AttemptPhase> {
        world.attempt.as_ref().map(|attempt| attempt.phase)
    }

    /// Position and facing of the player.
    #[must_use]
    pub fn player(world: &World) -> Option<PlayerSnapshot> {
        let attempt = world.attempt.as_ref()?;
        let player = attempt.entities.get(attempt.player)?;
        Some(PlayerSnapshot {
            id: player.id,
            cell: player.position,
            facing: player.facing,
        })
    }

    /// Read-only view of every occupied cell.
    #[must_use]
    pub fn occupancy_view(world: &World) -> Option<OccupancyView<'_>> {
        world.attempt.as_ref().map(|attempt| attempt.grid.view())
    }

    /// Kind of the entity occupying `cell`, if any.
    #[must_use]
    pub fn kind_at(world: &World, cell: CellCoord) -> Option<GridObjectKind> {
        let attempt = world.attempt.as_ref()?;
        attempt.grid.get(cell).map(|occupant| occupant.kind)
    }

    /// Facing of the entity occupying `cell`, if any.
    #[must_use]
    pub fn facing_at(world: &World, cell: CellCoord) -> Option<Direction> {
        let attempt = world.attempt.as_ref()?;
        let occupant = attempt.grid.get(cell)?;
        attempt
            .entities
            .get(occupant.id)
            .map(|entity| entity.facing)
    }

    /// Whether `cell` is void terrain.
    #[must_use]
    pub fn is_void(world: &World, cell: CellCoord) -> bool {
        world
            .attempt
            .as_ref()
            .map_or(false, |attempt| attempt.grid.is_void(cell))
    }

    /// Captures every ghost statue, ordered by identifier.
    #[must_use]
    pub fn ghost_statue_view(world: &World) -> GhostStatueView {
        let snapshots = world
            .attempt
            .as_ref()
            .map(|attempt| {
                attempt
                    .entities
                    .iter()
                    .filter_map(|entity| entity.ghost_snapshot())
                    .collect()
            })
            .unwrap_or_default();
        GhostStatueView::from_snapshots(snapshots)
    }

    /// Captures every door in the level.
    #[must_use]
    pub fn doors(world: &World) -> Vec<DoorSnapshot> {
        world
            .attempt
            .as_ref()
            .map(|attempt| {
                attempt
                    .entities
                    .iter()
                    .filter_map(|entity| entity.door_snapshot())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Captures the door located at `cell`, including doors the player stands on.
    #[must_use]
    pub fn door_at(world: &World, cell: CellCoord) -> Option<DoorSnapshot> {
        doors(world).into_iter().find(|door| door.cell == cell)
    }

    /// Whether the scroll has been collected during this attempt.
    #[must_use]
    pub fn has_scroll(world: &World) -> bool {
        world
            .attempt
            .as_ref()
            .map_or(false, |attempt| attempt.progress.has_scroll())
    }

    /// Cells of every door powered during this attempt, in ascending order.
    #[must_use]
    pub fn powered_doors(world: &World) -> Vec<CellCoord> {
        world
            .attempt
            .as_ref()
            .map(|attempt| attempt.progress.powered_doors().collect())
            .unwrap_or_default()
    }

    /// Lifecycle state of the chant engine.
    #[must_use]
    pub fn chant_state(world: &World) -> ChantState {
        world
            .attempt
            .as_ref()
            .map_or(ChantState::Idle, |attempt| attempt.chant.state())
    }

    /// Identifier of the travelling or settled chant.
    #[must_use]
    pub fn current_chant(world: &World) -> Option<ChantId> {
        world
            .attempt
            .as_ref()
            .and_then(|attempt| attempt.chant.current_id())
    }

    /// Path walked by the travelling or settled chant.
    #[must_use]
    pub fn chant_path(world: &World) -> &[ChantNode] {
        match world.attempt.as_ref() {
            Some(attempt) => attempt.chant.path(),
            None => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sundial_core::{ChantState, LevelData, LevelElement};

    fn level(width: u32, height: u32, elements: Vec<LevelElement>) -> Level {
        Level::validate(LevelData {
            name: "test".to_owned(),
            width,
            height,
            elements,
            ..LevelData::default()
        })
        .expect("valid level")
    }

    fn spawn(x: i32, y: i32, facing: Direction) -> LevelElement {
        LevelElement::new(CellCoord::new(x, y), GridObjectKind::SpawnPoint, facing)
    }

    fn loaded(level: Level) -> World {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::LoadLevel { level }, &mut events);
        world
    }

    fn run(world: &mut World, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, command, &mut events);
        events
    }

    #[test]
    fn world_starts_without_level() {
        let world = World::new();
        assert_eq!(query::welcome_banner(&world), WELCOME_BANNER);
        assert_eq!(query::grid_size(&world), None);
        assert_eq!(query::player(&world), None);
        assert_eq!(query::chant_state(&world), ChantState::Idle);
    }

    #[test]
    fn load_places_player_at_spawn() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::LoadLevel {
                level: level(4, 3, vec![spawn(2, 1, Direction::Left)]),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::LevelLoaded {
                name: "test".to_owned(),
                width: 4,
                height: 3,
                dialogue: None,
            }]
        );
        let player = query::player(&world).expect("player present");
        assert_eq!(player.cell, CellCoord::new(2, 1));
        assert_eq!(player.facing, Direction::Left);
        assert_eq!(query::kind_at(&world, player.cell), Some(GridObjectKind::Player));
        assert_eq!(query::phase(&world), Some(AttemptPhase::Playing));
    }

    #[test]
    fn tick_only_reports_elapsed_time() {
        let mut world = loaded(level(2, 2, vec![spawn(0, 0, Direction::Up)]));
        let dt = std::time::Duration::from_millis(16);

        let events = run(&mut world, Command::Tick { dt });

        assert_eq!(events, vec![Event::TimeAdvanced { dt }]);
        assert_eq!(query::tick_index(&world), 1);
    }

    #[test]
    fn commands_without_level_are_ignored() {
        let mut world = World::new();
        for command in [
            Command::MovePlayer {
                direction: Direction::Up,
            },
            Command::StartChant,
            Command::StopChant,
            Command::Interact,
            Command::Restart,
            Command::ForceOpenBeginDoors,
        ] {
            assert!(run(&mut world, command).is_empty());
        }
    }

    #[test]
    fn turn_in_place_consumes_the_first_press() {
        let mut world = World::with_options(Options::new().with_turn_in_place(true));
        let _ = run(
            &mut world,
            Command::LoadLevel {
                level: level(3, 3, vec![spawn(1, 1, Direction::Up)]),
            },
        );

        let events = run(
            &mut world,
            Command::MovePlayer {
                direction: Direction::Right,
            },
        );
        assert_eq!(
            events,
            vec![
                Event::PlayerTurned {
                    from: Direction::Up,
                    to: Direction::Right,
                },
                Event::PlayerMoveResolved {
                    direction: Direction::Right,
                    outcome: MoveOutcome::Turned,
                },
            ]
        );

        let events = run(
            &mut world,
            Command::MovePlayer {
                direction: Direction::Right,
            },
        );
        assert!(events.contains(&Event::PlayerMoveResolved {
            direction: Direction::Right,
            outcome: MoveOutcome::Moved,
        }));
        assert_eq!(
            query::player(&world).map(|player| player.cell),
            Some(CellCoord::new(2, 1))
        );
    }

    #[test]
    fn restart_rebuilds_from_level_data() {
        let mut world = loaded(level(3, 3, vec![spawn(0, 0, Direction::Up)]));
        let _ = run(
            &mut world,
            Command::MovePlayer {
                direction: Direction::Up,
            },
        );
        assert_eq!(
            query::player(&world).map(|player| player.cell),
            Some(CellCoord::new(0, 1))
        );

        let events = run(&mut world, Command::Restart);

        assert!(matches!(events.as_slice(), [Event::LevelLoaded { .. }]));
        assert_eq!(
            query::player(&world).map(|player| player.cell),
            Some(CellCoord::new(0, 0))
        );
        assert_eq!(query::kind_at(&world, CellCoord::new(0, 1)), None);
    }
}
