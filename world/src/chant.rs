//! Chant wave state machine.
//!
//! A [`ChantWave`] only knows its heading and the path walked so far. Each call to
//! [`ChantWave::advance`] inspects the head of the path through a [`ChantMedium`],
//! which applies the per-kind effects, and either appends the next node or ends the
//! wave. Timing lives outside the world: the wave advances only when an
//! `AdvanceChant` command carrying its identifier arrives.

use sundial_core::{
    CellCoord, ChantEndReason, ChantId, ChantNode, ChantState, Direction, Event, GridObjectKind,
    CHANT_BASE_POWER, GHOST_BREAK_POWER,
};
use tracing::debug;

use crate::{
    entities::{Entities, EntityData},
    grid::GridWorld,
    progress::Progress,
};

/// Maximum number of cells a single chant may inspect. Only statue cycles reach it.
pub const CHANT_STEP_CEILING: u32 = 50;

/// Effect a cell has on a wave passing through it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Reaction {
    PassThrough,
    Amplify(Direction),
    Absorb(GridObjectKind),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StepResult {
    Advanced(ChantNode),
    Ended(ChantEndReason),
}

pub(crate) trait ChantMedium {
    fn in_bounds(&self, cell: CellCoord) -> bool;

    fn react(&mut self, node: ChantNode) -> Reaction;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ChantWave {
    id: ChantId,
    heading: Direction,
    path: Vec<ChantNode>,
    steps: u32,
}

impl ChantWave {
    pub(crate) fn cast(id: ChantId, origin: CellCoord, heading: Direction) -> Self {
        Self {
            id,
            heading,
            path: vec![ChantNode::new(origin, CHANT_BASE_POWER)],
            steps: 0,
        }
    }

    pub(crate) fn id(&self) -> ChantId {
        self.id
    }

    pub(crate) fn path(&self) -> &[ChantNode] {
        &self.path
    }

    pub(crate) fn advance<M: ChantMedium>(&mut self, medium: &mut M) -> StepResult {
        let Some(head) = self.path.last().copied() else {
            return StepResult::Ended(ChantEndReason::LeftGrid);
        };

        if self.steps >= CHANT_STEP_CEILING {
            return StepResult::Ended(ChantEndReason::StepCeiling);
        }
        self.steps += 1;

        let mut power = head.power;
        match medium.react(head) {
            Reaction::PassThrough => {}
            Reaction::Amplify(facing) => {
                self.heading = facing;
                power = power.saturating_add(1);
            }
            Reaction::Absorb(kind) => {
                return StepResult::Ended(ChantEndReason::Absorbed {
                    at: head.coord,
                    kind,
                });
            }
        }

        let next = head.coord.neighbor(self.heading);
        if !medium.in_bounds(next) {
            return StepResult::Ended(ChantEndReason::LeftGrid);
        }

        let node = ChantNode::new(next, power);
        self.path.push(node);
        StepResult::Advanced(node)
    }
}

/// What tearing down the engine discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Teardown {
    /// A travelling chant was interrupted.
    Cancelled(ChantId),
    /// A settled chant was dismissed.
    Cleared(ChantId),
}

#[derive(Clone, Debug, Default)]
pub(crate) enum ChantEngine {
    #[default]
    Idle,
    Active(ChantWave),
    Settled(ChantWave),
}

impl ChantEngine {
    pub(crate) fn state(&self) -> ChantState {
        match self {
            Self::Idle => ChantState::Idle,
            Self::Active(_) => ChantState::Active,
            Self::Settled(_) => ChantState::Settled,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    pub(crate) fn current_id(&self) -> Option<ChantId> {
        match self {
            Self::Idle => None,
            Self::Active(wave) | Self::Settled(wave) => Some(wave.id()),
        }
    }

    pub(crate) fn path(&self) -> &[ChantNode] {
        match self {
            Self::Idle => &[],
            Self::Active(wave) | Self::Settled(wave) => wave.path(),
        }
    }

    pub(crate) fn begin(&mut self, wave: ChantWave) -> Option<Teardown> {
        let teardown = self.teardown();
        *self = Self::Active(wave);
        teardown
    }

    pub(crate) fn teardown(&mut self) -> Option<Teardown> {
        match std::mem::take(self) {
            Self::Idle => None,
            Self::Active(wave) => Some(Teardown::Cancelled(wave.id())),
            Self::Settled(wave) => Some(Teardown::Cleared(wave.id())),
        }
    }

    /// Freezes a travelling chant in place, returning its identifier.
    pub(crate) fn settle(&mut self) -> Option<ChantId> {
        match std::mem::take(self) {
            Self::Active(wave) => {
                let id = wave.id();
                *self = Self::Settled(wave);
                Some(id)
            }
            other => {
                *self = other;
                None
            }
        }
    }

    pub(crate) fn active_wave_mut(&mut self, id: ChantId) -> Option<&mut ChantWave> {
        match self {
            Self::Active(wave) if wave.id() == id => Some(wave),
            _ => None,
        }
    }
}

/// Live view of a level attempt that applies chant effects as the wave passes.
pub(crate) struct Field<'a> {
    pub(crate) grid: &'a GridWorld,
    pub(crate) entities: &'a mut Entities,
    pub(crate) progress: &'a mut Progress,
    pub(crate) events: &'a mut Vec<Event>,
}

impl ChantMedium for Field<'_> {
    fn in_bounds(&self, cell: CellCoord) -> bool {
        self.grid.in_bounds(cell)
    }

    fn react(&mut self, node: ChantNode) -> Reaction {
        let Some(occupant) = self.grid.get(node.coord) else {
            return Reaction::PassThrough;
        };
        let Some(entity) = self.entities.get_mut(occupant.id) else {
            return Reaction::PassThrough;
        };

        match occupant.kind {
            GridObjectKind::Ground
            | GridObjectKind::Scroll
            | GridObjectKind::SpawnPoint
            | GridObjectKind::Player
            | GridObjectKind::Void => Reaction::PassThrough,
            GridObjectKind::Statue => {
                debug!(
                    at = %node.coord,
                    power = node.power,
                    facing = ?entity.facing,
                    "statue amplified chant"
                );
                Reaction::Amplify(entity.facing)
            }
            GridObjectKind::Wall | GridObjectKind::Obstacle => Reaction::Absorb(occupant.kind),
            GridObjectKind::GhostStatue => {
                let EntityData::GhostStatue(state) = &mut entity.data else {
                    return Reaction::Absorb(occupant.kind);
                };
                if state.destroyed {
                    return Reaction::PassThrough;
                }
                if node.power < GHOST_BREAK_POWER {
                    return Reaction::Absorb(occupant.kind);
                }
                state.destroyed = true;
                debug!(at = %node.coord, power = node.power, "ghost statue cleared");
                self.events.push(Event::GhostStatueDestroyed {
                    statue: entity.id,
                    at: node.coord,
                });
                Reaction::PassThrough
            }
            GridObjectKind::Door => {
                if let EntityData::Door(state) = &mut entity.data {
                    if !state.powered && self.progress.chant_unlocks(state, node.power) {
                        state.powered = true;
                        entity.blocks_movement = false;
                        let _ = self.progress.power_door(node.coord);
                        debug!(at = %node.coord, power = node.power, "door powered");
                        self.events.push(Event::DoorPowered { at: node.coord });
                    }
                }
                Reaction::Absorb(occupant.kind)
            }
        }
    }
}
