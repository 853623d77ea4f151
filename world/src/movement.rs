use sundial_core::{
    CellCoord, Direction, DoorType, EntityId, Event, GameOverReason, GridObjectKind, MoveOutcome,
};

use crate::{entities::EntityData, Attempt};

/// Resolves a single player move request against the attempt's grid.
///
/// Mutation events are pushed as they happen; the caller reports the returned outcome.
pub(crate) fn resolve(
    attempt: &mut Attempt,
    direction: Direction,
    turn_in_place: bool,
    out: &mut Vec<Event>,
) -> MoveOutcome {
    let player_id = attempt.player;
    let Some(player) = attempt.entities.get_mut(player_id) else {
        return MoveOutcome::Blocked;
    };
    let from = player.position;
    let facing = player.facing;

    if facing != direction {
        player.facing = direction;
        out.push(Event::PlayerTurned {
            from: facing,
            to: direction,
        });
        if turn_in_place {
            return MoveOutcome::Turned;
        }
    }

    let target = attempt.grid.neighbor(from, direction);
    if !attempt.grid.in_bounds(target) {
        return MoveOutcome::Blocked;
    }

    let Some(occupant) = attempt.grid.get(target) else {
        step_player(attempt, target, out);
        if attempt.grid.is_void(target) {
            attempt.fail(GameOverReason::FellIntoVoid { at: target }, out);
            return MoveOutcome::FellIntoVoid;
        }
        return MoveOutcome::Moved;
    };

    match occupant.kind {
        GridObjectKind::Ground | GridObjectKind::SpawnPoint | GridObjectKind::Void => {
            step_player(attempt, target, out);
            MoveOutcome::Moved
        }
        GridObjectKind::Wall
        | GridObjectKind::Obstacle
        | GridObjectKind::GhostStatue
        | GridObjectKind::Player => MoveOutcome::Blocked,
        GridObjectKind::Statue => push_statue(attempt, occupant.id, direction, out),
        GridObjectKind::Scroll => {
            step_player(attempt, target, out);
            collect_scroll(attempt, occupant.id, out);
            MoveOutcome::Moved
        }
        GridObjectKind::Door => enter_door(attempt, occupant.id, out),
    }
}

fn step_player(attempt: &mut Attempt, to: CellCoord, out: &mut Vec<Event>) {
    let player = attempt.player;
    if let Some(from) = attempt.shift(player, to) {
        out.push(Event::EntityMoved {
            entity: player,
            from,
            to,
        });
    }
}

fn push_statue(
    attempt: &mut Attempt,
    statue: EntityId,
    direction: Direction,
    out: &mut Vec<Event>,
) -> MoveOutcome {
    let Some(entity) = attempt.entities.get(statue) else {
        return MoveOutcome::Blocked;
    };
    if !entity.movable {
        return MoveOutcome::Blocked;
    }

    let from = entity.position;
    let beyond = attempt.grid.neighbor(from, direction);
    if !attempt.grid.is_open_ground(beyond) {
        return MoveOutcome::Blocked;
    }

    if attempt.shift(statue, beyond).is_none() {
        return MoveOutcome::Blocked;
    }
    out.push(Event::StatuePushed {
        statue,
        from,
        to: beyond,
    });
    step_player(attempt, from, out);
    MoveOutcome::Moved
}

fn collect_scroll(attempt: &mut Attempt, scroll: EntityId, out: &mut Vec<Event>) {
    let first_pickup = match attempt.entities.get_mut(scroll).map(|entity| &mut entity.data) {
        Some(EntityData::Scroll { collected }) => !std::mem::replace(collected, true),
        _ => false,
    };

    if first_pickup && attempt.progress.collect_scroll() {
        tracing::debug!("scroll collected");
        out.push(Event::ScrollCollected {
            dialogue: attempt.scroll_dialogue.clone(),
        });
    }
}

fn enter_door(attempt: &mut Attempt, door: EntityId, out: &mut Vec<Event>) -> MoveOutcome {
    let Some(entity) = attempt.entities.get(door) else {
        return MoveOutcome::Blocked;
    };
    if entity.blocks_movement {
        return MoveOutcome::Blocked;
    }
    let EntityData::Door(state) = entity.data else {
        return MoveOutcome::Blocked;
    };

    let at = entity.position;
    step_player(attempt, at, out);
    if state.door_type == DoorType::EndDoor {
        attempt.complete(out);
    }
    MoveOutcome::Moved
}
