#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure input system that turns player intents into world commands.

use std::time::Duration;

use sundial_core::{Command, Direction, Event, MoveOutcome};

/// Player intent distilled from adapter-provided input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerInput {
    /// Step, push or turn towards the provided direction.
    Move(Direction),
    /// Begin casting a chant along the player's facing.
    ChantStart,
    /// Stop the travelling chant or dismiss a settled one.
    ChantStop,
    /// Interact with the cell in front of the player.
    Interact,
    /// Rebuild the current level.
    Restart,
}

/// Configuration parameters required to construct the controls system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    move_duration: Duration,
}

impl Config {
    /// Creates a configuration where each accepted step animates for `move_duration`.
    #[must_use]
    pub const fn new(move_duration: Duration) -> Self {
        Self { move_duration }
    }
}

/// Controls system that gates movement while a chant travels or a step animates.
#[derive(Clone, Debug)]
pub struct Controls {
    move_duration: Duration,
    transition_remaining: Duration,
    chant_active: bool,
}

impl Controls {
    /// Creates a new controls system instance.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self {
            move_duration: config.move_duration,
            transition_remaining: Duration::ZERO,
            chant_active: false,
        }
    }

    /// Reports whether movement input is currently accepted.
    #[must_use]
    pub fn accepts_movement(&self) -> bool {
        !self.chant_active && self.transition_remaining.is_zero()
    }

    /// Consumes world events and the latest input to emit world commands.
    pub fn handle(&mut self, events: &[Event], input: Option<PlayerInput>, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::LevelLoaded { .. } => {
                    self.chant_active = false;
                    self.transition_remaining = Duration::ZERO;
                }
                Event::ChantStarted { .. } => self.chant_active = true,
                Event::ChantEnded { .. } => self.chant_active = false,
                Event::TimeAdvanced { dt } => {
                    self.transition_remaining = self.transition_remaining.saturating_sub(*dt);
                }
                Event::PlayerMoveResolved {
                    outcome: MoveOutcome::Moved,
                    ..
                } => self.transition_remaining = self.move_duration,
                _ => {}
            }
        }

        let Some(input) = input else {
            return;
        };

        let command = match input {
            PlayerInput::Move(direction) => {
                if !self.accepts_movement() {
                    return;
                }
                Command::MovePlayer { direction }
            }
            PlayerInput::ChantStart => Command::StartChant,
            PlayerInput::ChantStop => Command::StopChant,
            PlayerInput::Interact => Command::Interact,
            PlayerInput::Restart => Command::Restart,
        };
        out.push(command);
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self::new(Config::new(Duration::ZERO))
    }
}
