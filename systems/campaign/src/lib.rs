#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Campaign system that sequences levels, tracks unlocks and reacts to attempt outcomes.

use sundial_core::{Command, Event, Level};
use thiserror::Error;
use tracing::{info, warn};

/// Reasons a campaign request cannot be honoured.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CampaignError {
    /// The campaign was constructed without levels.
    #[error("campaign contains no levels")]
    Empty,
    /// The requested index does not name a level.
    #[error("level {index} does not exist; the campaign has {count} levels")]
    UnknownLevel {
        /// Requested index.
        index: usize,
        /// Number of levels in the campaign.
        count: usize,
    },
    /// The requested level has not been unlocked yet.
    #[error("level {index} ({name}) is still locked")]
    Locked {
        /// Requested index.
        index: usize,
        /// Display name of the locked level.
        name: String,
    },
    /// The final level was already reached.
    #[error("campaign finished; there is no level after {name}")]
    Finished {
        /// Display name of the final level.
        name: String,
    },
}

/// Configuration parameters required to construct the campaign.
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    auto_restart: bool,
}

impl Config {
    /// Creates a configuration; with `auto_restart` a failed attempt restarts immediately.
    ///
    /// Only failures caused after the player acted are restarted, so a level that
    /// fails on entry waits for a manual restart.
    #[must_use]
    pub const fn new(auto_restart: bool) -> Self {
        Self { auto_restart }
    }
}

/// Ordered collection of levels together with their unlock state.
#[derive(Clone, Debug)]
pub struct Campaign {
    levels: Vec<Level>,
    unlocked: Vec<bool>,
    current: Option<usize>,
    auto_restart: bool,
    acted_since_load: bool,
}

impl Campaign {
    /// Creates a campaign over the provided levels. The first level is always unlocked.
    pub fn new(levels: Vec<Level>, config: Config) -> Result<Self, CampaignError> {
        if levels.is_empty() {
            return Err(CampaignError::Empty);
        }
        let unlocked = levels
            .iter()
            .enumerate()
            .map(|(index, level)| index == 0 || level.unlocked())
            .collect();
        Ok(Self {
            levels,
            unlocked,
            current: None,
            auto_restart: config.auto_restart,
            acted_since_load: false,
        })
    }

    /// Index of the level being played.
    #[must_use]
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Whether the level at `index` may be started.
    #[must_use]
    pub fn is_unlocked(&self, index: usize) -> bool {
        self.unlocked.get(index).copied().unwrap_or(false)
    }

    /// Iterator over every level and whether it is unlocked.
    pub fn levels(&self) -> impl Iterator<Item = (&Level, bool)> {
        self.levels.iter().zip(self.unlocked.iter().copied())
    }

    /// Selects the level at `index` and returns the command that enters it.
    pub fn start(&mut self, index: usize) -> Result<Command, CampaignError> {
        let level = self
            .levels
            .get(index)
            .ok_or(CampaignError::UnknownLevel {
                index,
                count: self.levels.len(),
            })?;
        if !self.is_unlocked(index) {
            return Err(CampaignError::Locked {
                index,
                name: level.name().to_owned(),
            });
        }

        let command = Command::LoadLevel {
            level: level.clone(),
        };
        self.current = Some(index);
        Ok(command)
    }

    /// Moves on to the level after the current one.
    pub fn advance(&mut self) -> Result<Command, CampaignError> {
        let next = self.current.map_or(0, |index| index + 1);
        if next >= self.levels.len() {
            let name = self
                .levels
                .last()
                .map(|level| level.name().to_owned())
                .unwrap_or_default();
            return Err(CampaignError::Finished { name });
        }
        self.start(next)
    }

    /// Consumes world events, unlocking progress and emitting follow-up commands.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        let mut failure = None;
        for event in events {
            match event {
                Event::LevelLoaded { .. } => {
                    self.acted_since_load = false;
                    failure = None;
                }
                Event::PlayerMoveResolved { .. }
                | Event::ChantStarted { .. }
                | Event::StatueRotated { .. }
                | Event::InteractionRejected { .. } => self.acted_since_load = true,
                Event::LevelComplete => self.on_level_complete(out),
                Event::GameOver { reason } => failure = Some(*reason),
                _ => {}
            }
        }

        let Some(reason) = failure else {
            return;
        };
        if !self.auto_restart {
            return;
        }
        if self.acted_since_load {
            info!(%reason, "restarting failed attempt");
            out.push(Command::Restart);
        } else {
            warn!(%reason, "attempt failed before any input; waiting for a manual restart");
        }
    }

    fn on_level_complete(&mut self, out: &mut Vec<Command>) {
        let Some(index) = self.current else {
            return;
        };
        let next = index + 1;
        match self.unlocked.get_mut(next) {
            Some(unlocked) => {
                if !*unlocked {
                    *unlocked = true;
                    info!(level = next, "level unlocked");
                }
            }
            None => {
                info!("final level complete");
                out.push(Command::ForceOpenBeginDoors);
            }
        }
    }
}
