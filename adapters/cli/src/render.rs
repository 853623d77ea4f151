//! Text rendering of the board and the event log.

use std::fmt::Write as _;

use sundial_core::{
    CellCoord, ChantEndReason, Direction, DoorType, Event, GridObjectKind, MoveOutcome,
};
use sundial_world::{query, World};

/// Draws the board with the top row first.
pub(crate) fn board(world: &World) -> String {
    let Some((width, height)) = query::grid_size(world) else {
        return String::from("(no level loaded)\n");
    };
    let width = i32::try_from(width).unwrap_or(i32::MAX);
    let height = i32::try_from(height).unwrap_or(i32::MAX);
    let path = query::chant_path(world);
    let ghosts = query::ghost_statue_view(world).into_vec();

    let mut out = String::new();
    for y in (0..height).rev() {
        for x in 0..width {
            let cell = CellCoord::new(x, y);
            let glyph = match query::kind_at(world, cell) {
                Some(GridObjectKind::Player) => '@',
                Some(GridObjectKind::Wall) => '#',
                Some(GridObjectKind::Obstacle) => 'o',
                Some(GridObjectKind::Statue) => {
                    statue_glyph(query::facing_at(world, cell).unwrap_or(Direction::Up))
                }
                Some(GridObjectKind::GhostStatue) => {
                    let destroyed = ghosts
                        .iter()
                        .any(|ghost| ghost.cell == cell && ghost.destroyed);
                    if destroyed {
                        'g'
                    } else {
                        'G'
                    }
                }
                Some(GridObjectKind::Scroll) => '?',
                Some(GridObjectKind::Door) => match query::door_at(world, cell) {
                    Some(door) if door.door_type == DoorType::BeginDoor => 'B',
                    Some(door) if door.powered || !door.blocks_movement => 'd',
                    _ => 'D',
                },
                Some(
                    GridObjectKind::Ground | GridObjectKind::SpawnPoint | GridObjectKind::Void,
                )
                | None => {
                    if query::is_void(world, cell) {
                        '~'
                    } else if path.iter().any(|node| node.coord == cell) {
                        '*'
                    } else {
                        '.'
                    }
                }
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}

fn statue_glyph(facing: Direction) -> char {
    match facing {
        Direction::Up => '^',
        Direction::Down => 'v',
        Direction::Left => '<',
        Direction::Right => '>',
    }
}

/// One-line description of events worth showing to the player.
pub(crate) fn describe(event: &Event) -> Option<String> {
    let line = match event {
        Event::LevelLoaded { name, dialogue, .. } => {
            let mut line = format!("== {name} ==");
            if let Some(dialogue) = dialogue {
                let _ = write!(line, "\n{dialogue}");
            }
            line
        }
        Event::ScrollCollected { dialogue } => match dialogue {
            Some(dialogue) => format!("You picked up the scroll: \"{dialogue}\""),
            None => String::from("You picked up the scroll."),
        },
        Event::PlayerMoveResolved {
            outcome: MoveOutcome::Blocked,
            direction,
        } => format!("Something blocks the way {direction:?}."),
        Event::StatuePushed { to, .. } => format!("The statue slides to {to}."),
        Event::StatueRotated { at, facing, .. } => {
            format!("The statue at {at} turns {facing:?}.")
        }
        Event::ChantEnded { reason, .. } => match reason {
            ChantEndReason::Absorbed { at, kind } => {
                format!("The chant fades into the {kind:?} at {at}.")
            }
            ChantEndReason::LeftGrid => String::from("The chant drifts beyond the walls."),
            ChantEndReason::StepCeiling => String::from("The chant loses itself in echoes."),
            ChantEndReason::Cancelled | ChantEndReason::AttemptEnded => return None,
        },
        Event::GhostStatueDestroyed { at, .. } => {
            format!("The ghost statue at {at} crumbles.")
        }
        Event::DoorPowered { at } => format!("The door at {at} hums with power."),
        Event::DoorOpened {
            door_type: DoorType::BeginDoor,
            ..
        } => String::from("Behind you, the first door swings open."),
        Event::DoorOpened { at, .. } => format!("The door at {at} opens."),
        Event::InteractionRejected { reason } => format!("{reason}."),
        Event::GameOver { reason } => format!("Game over: {reason}. Press r to retry."),
        Event::LevelComplete => String::from("Level complete! Press n for the next level."),
        Event::TrueEndingUnlocked => String::from("The sundial turns full circle."),
        _ => return None,
    };
    Some(line)
}
