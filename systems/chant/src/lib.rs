#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that paces chant propagation by emitting step commands.

use std::time::Duration;

use sundial_core::{ChantId, Command, Event};

/// Configuration parameters required to construct the chant cadence system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    step_interval: Duration,
}

impl Config {
    /// Creates a new configuration using the provided delay between chant steps.
    #[must_use]
    pub const fn new(step_interval: Duration) -> Self {
        Self { step_interval }
    }
}

/// Chant cadence system that converts elapsed time into `AdvanceChant` commands.
#[derive(Debug)]
pub struct Chant {
    step_interval: Duration,
    accumulator: Duration,
    active: Option<ChantId>,
}

impl Chant {
    /// Creates a new chant cadence system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            step_interval: config.step_interval,
            accumulator: Duration::ZERO,
            active: None,
        }
    }

    /// Chant currently being paced, if any.
    #[must_use]
    pub fn active(&self) -> Option<ChantId> {
        self.active
    }

    /// Consumes world events and emits step commands for the travelling chant.
    ///
    /// With a zero interval every non-empty batch yields a single step, so a
    /// pump loop feeding the resulting events back resolves the chant at once.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        let mut accumulated = Duration::ZERO;
        for event in events {
            match event {
                Event::ChantStarted { chant, .. } => {
                    self.active = Some(*chant);
                    self.accumulator = Duration::ZERO;
                    accumulated = Duration::ZERO;
                }
                Event::ChantEnded { chant, .. } | Event::ChantCleared { chant } => {
                    if self.active == Some(*chant) {
                        self.reset();
                    }
                }
                Event::LevelLoaded { .. } => self.reset(),
                Event::TimeAdvanced { dt } if self.active.is_some() => {
                    accumulated = accumulated.saturating_add(*dt);
                }
                _ => {}
            }
        }

        let Some(chant) = self.active else {
            return;
        };

        if self.step_interval.is_zero() {
            if !events.is_empty() {
                out.push(Command::AdvanceChant { chant });
            }
            return;
        }

        self.accumulator = self.accumulator.saturating_add(accumulated);
        for _ in 0..self.resolve_steps() {
            out.push(Command::AdvanceChant { chant });
        }
    }

    fn reset(&mut self) {
        self.active = None;
        self.accumulator = Duration::ZERO;
    }

    fn resolve_steps(&mut self) -> usize {
        if self.step_interval.is_zero() {
            return 0;
        }

        let mut steps = 0;
        while self.accumulator >= self.step_interval {
            self.accumulator -= self.step_interval;
            steps += 1;
        }
        steps
    }
}
