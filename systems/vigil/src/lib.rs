#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that lets ghost statues watch for the player.
//!
//! Every tick, and after every move, each ghost statue that has neither been
//! cleared nor already fired checks whether the player stands beside it or
//! inside its line of sight. The first detection found becomes a
//! `TriggerGameOver` command; the world owns the latch that keeps it from
//! firing twice.

use sundial_core::{
    CellCoord, Command, Detection, Event, GhostStatueSnapshot, GhostStatueView, OccupancyView,
    PlayerSnapshot,
};
use tracing::debug;

/// Ghost statue detection system.
#[derive(Debug, Default)]
pub struct Vigil {
    watching: bool,
}

impl Vigil {
    /// Creates a vigil that starts watching once a level is loaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes world events and snapshots to emit game-over commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        player: Option<PlayerSnapshot>,
        ghosts: &GhostStatueView,
        occupancy: Option<OccupancyView<'_>>,
        out: &mut Vec<Command>,
    ) {
        let mut should_check = false;
        for event in events {
            match event {
                Event::LevelLoaded { .. } => {
                    self.watching = true;
                    should_check = true;
                }
                Event::GameOver { .. } | Event::LevelComplete => self.watching = false,
                Event::TimeAdvanced { .. } | Event::EntityMoved { .. } => should_check = true,
                _ => {}
            }
        }

        if !self.watching || !should_check {
            return;
        }
        let (Some(player), Some(occupancy)) = (player, occupancy) else {
            return;
        };

        for ghost in ghosts
            .iter()
            .filter(|ghost| !ghost.destroyed && !ghost.has_triggered_game_over)
        {
            if let Some(detection) = detect(ghost, player.cell, occupancy) {
                debug!(statue = ghost.id.get(), at = %ghost.cell, ?detection, "player detected");
                out.push(Command::TriggerGameOver {
                    statue: ghost.id,
                    detection,
                });
                return;
            }
        }
    }
}

fn detect(
    ghost: &GhostStatueSnapshot,
    player: CellCoord,
    occupancy: OccupancyView<'_>,
) -> Option<Detection> {
    if ghost.cell.manhattan_distance(player) == 1 {
        return Some(Detection::Adjacent);
    }
    if in_line_of_sight(ghost, player, occupancy) {
        return Some(Detection::LineOfSight);
    }
    None
}

/// Walks from the statue along its facing until the player, a sight blocker or the edge.
fn in_line_of_sight(
    ghost: &GhostStatueSnapshot,
    player: CellCoord,
    occupancy: OccupancyView<'_>,
) -> bool {
    let mut cell = ghost.cell.neighbor(ghost.facing);
    while occupancy.in_bounds(cell) {
        if cell == player {
            return true;
        }
        if occupancy
            .occupant(cell)
            .is_some_and(|occupant| occupant.kind.blocks_sight())
        {
            return false;
        }
        cell = cell.neighbor(ghost.facing);
    }
    false
}
