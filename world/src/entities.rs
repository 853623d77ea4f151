use sundial_core::{
    CellCoord, Direction, DoorSnapshot, DoorType, EntityId, GhostStatueSnapshot, GridObjectKind,
    LevelElement, Occupant,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct GhostState {
    pub(crate) destroyed: bool,
    pub(crate) has_triggered_game_over: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DoorState {
    pub(crate) required_power: u32,
    pub(crate) door_type: DoorType,
    pub(crate) powered: bool,
}

/// Kind-specific state. Statues carry nothing beyond their facing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EntityData {
    Plain,
    GhostStatue(GhostState),
    Scroll { collected: bool },
    Door(DoorState),
}

#[derive(Clone, Debug)]
pub(crate) struct Entity {
    pub(crate) id: EntityId,
    pub(crate) kind: GridObjectKind,
    pub(crate) position: CellCoord,
    pub(crate) facing: Direction,
    pub(crate) blocks_movement: bool,
    pub(crate) movable: bool,
    pub(crate) data: EntityData,
}

impl Entity {
    /// Builds the entity described by a level element. Ground, void and spawn points
    /// do not become occupants.
    pub(crate) fn from_element(id: EntityId, element: &LevelElement) -> Option<Self> {
        let (blocks_movement, movable, data) = match element.kind {
            GridObjectKind::Ground | GridObjectKind::Void | GridObjectKind::SpawnPoint => {
                return None;
            }
            GridObjectKind::Wall | GridObjectKind::Obstacle | GridObjectKind::Player => {
                (true, false, EntityData::Plain)
            }
            GridObjectKind::Statue => (true, true, EntityData::Plain),
            GridObjectKind::GhostStatue => (
                true,
                false,
                EntityData::GhostStatue(GhostState {
                    destroyed: false,
                    has_triggered_game_over: false,
                }),
            ),
            GridObjectKind::Scroll => (false, false, EntityData::Scroll { collected: false }),
            GridObjectKind::Door => (
                true,
                false,
                EntityData::Door(DoorState {
                    required_power: element.required_power,
                    door_type: element.door_type,
                    powered: false,
                }),
            ),
        };

        Some(Self {
            id,
            kind: element.kind,
            position: element.position,
            facing: element.facing,
            blocks_movement,
            movable,
            data,
        })
    }

    pub(crate) fn player(id: EntityId, position: CellCoord, facing: Direction) -> Self {
        Self {
            id,
            kind: GridObjectKind::Player,
            position,
            facing,
            blocks_movement: true,
            movable: false,
            data: EntityData::Plain,
        }
    }

    pub(crate) fn occupant(&self) -> Occupant {
        Occupant {
            id: self.id,
            kind: self.kind,
        }
    }

    pub(crate) fn ghost_snapshot(&self) -> Option<GhostStatueSnapshot> {
        match self.data {
            EntityData::GhostStatue(state) => Some(GhostStatueSnapshot {
                id: self.id,
                cell: self.position,
                facing: self.facing,
                destroyed: state.destroyed,
                has_triggered_game_over: state.has_triggered_game_over,
            }),
            _ => None,
        }
    }

    pub(crate) fn door_snapshot(&self) -> Option<DoorSnapshot> {
        match self.data {
            EntityData::Door(state) => Some(DoorSnapshot {
                id: self.id,
                cell: self.position,
                door_type: state.door_type,
                required_power: state.required_power,
                powered: state.powered,
                blocks_movement: self.blocks_movement,
            }),
            _ => None,
        }
    }
}

/// Entity arena for a single level attempt. Identifiers are dense indices.
#[derive(Clone, Debug, Default)]
pub(crate) struct Entities {
    entities: Vec<Entity>,
}

impl Entities {
    pub(crate) fn next_id(&self) -> EntityId {
        EntityId::new(u32::try_from(self.entities.len()).unwrap_or(u32::MAX))
    }

    pub(crate) fn insert(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        self.entities.push(entity);
        id
    }

    pub(crate) fn get(&self, id: EntityId) -> Option<&Entity> {
        let index = usize::try_from(id.get()).ok()?;
        self.entities.get(index).filter(|entity| entity.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let index = usize::try_from(id.get()).ok()?;
        self.entities.get_mut(index).filter(|entity| entity.id == id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }
}
