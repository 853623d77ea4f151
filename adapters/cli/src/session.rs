//! Interactive session that wires the world to every system.

use std::time::Duration;

use sundial_core::{ChantState, Command, Event};
use sundial_system_campaign::{Campaign, CampaignError};
use sundial_system_chant::{self as chant, Chant};
use sundial_system_controls::{self as controls, Controls, PlayerInput};
use sundial_system_vigil::Vigil;
use sundial_world::{self as world, query, Options, World};
use tracing::warn;

/// Upper bound on ticks spent waiting for a chant or step animation to finish.
const MAX_SETTLE_TICKS: usize = 10_000;

/// Timing and rule switches for a session.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SessionConfig {
    pub(crate) tick: Duration,
    pub(crate) chant_step: Duration,
    pub(crate) move_duration: Duration,
    pub(crate) turn_in_place: bool,
}

/// World plus the systems that react to its events.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    controls: Controls,
    chant: Chant,
    vigil: Vigil,
    campaign: Campaign,
    tick: Duration,
}

impl Session {
    pub(crate) fn new(campaign: Campaign, config: SessionConfig) -> Self {
        Self {
            world: World::with_options(Options::new().with_turn_in_place(config.turn_in_place)),
            controls: Controls::new(controls::Config::new(config.move_duration)),
            chant: Chant::new(chant::Config::new(config.chant_step)),
            vigil: Vigil::new(),
            campaign,
            tick: config.tick,
        }
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    pub(crate) fn campaign(&self) -> &Campaign {
        &self.campaign
    }

    /// Enters the level at `index`.
    pub(crate) fn start(&mut self, index: usize) -> Result<Vec<Event>, CampaignError> {
        let command = self.campaign.start(index)?;
        let mut log = Vec::new();
        self.pump(vec![command], &mut log);
        Ok(log)
    }

    /// Enters the level after the current one.
    pub(crate) fn next_level(&mut self) -> Result<Vec<Event>, CampaignError> {
        let command = self.campaign.advance()?;
        let mut log = Vec::new();
        self.pump(vec![command], &mut log);
        Ok(log)
    }

    /// Submits one player intent and lets time run until the world is idle again.
    pub(crate) fn input(&mut self, input: PlayerInput) -> Vec<Event> {
        let mut commands = Vec::new();
        self.controls.handle(&[], Some(input), &mut commands);
        let mut log = Vec::new();
        self.pump(commands, &mut log);
        self.settle(&mut log);
        log
    }

    /// Lets a single tick of time pass.
    pub(crate) fn wait(&mut self) -> Vec<Event> {
        let mut log = Vec::new();
        self.pump(vec![Command::Tick { dt: self.tick }], &mut log);
        log
    }

    fn settle(&mut self, log: &mut Vec<Event>) {
        for _ in 0..MAX_SETTLE_TICKS {
            let chanting = query::chant_state(&self.world) == ChantState::Active;
            if !chanting && self.controls.accepts_movement() {
                return;
            }
            self.pump(vec![Command::Tick { dt: self.tick }], log);
        }
        warn!(ticks = MAX_SETTLE_TICKS, "world did not settle");
    }

    /// Applies commands and routes the resulting events through every system until
    /// no system has anything left to say.
    fn pump(&mut self, commands: Vec<Command>, log: &mut Vec<Event>) {
        let mut pending = commands;
        while !pending.is_empty() {
            let mut events = Vec::new();
            for command in pending.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }

            self.controls.handle(&events, None, &mut pending);
            self.chant.handle(&events, &mut pending);
            let ghosts = query::ghost_statue_view(&self.world);
            self.vigil.handle(
                &events,
                query::player(&self.world),
                &ghosts,
                query::occupancy_view(&self.world),
                &mut pending,
            );
            self.campaign.handle(&events, &mut pending);

            log.extend(events);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use sundial_core::{
        AttemptPhase, CellCoord, Direction, GridObjectKind, Level, LevelData, LevelElement,
    };
    use sundial_system_campaign::Config;

    fn shipped_campaign() -> Campaign {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../levels/sundial.toml");
        let levels = crate::levels::load_pack(&path).expect("shipped pack loads");
        Campaign::new(levels, Config::default()).expect("campaign")
    }

    fn session() -> Session {
        Session::new(
            shipped_campaign(),
            SessionConfig {
                tick: Duration::from_millis(50),
                chant_step: Duration::from_millis(150),
                move_duration: Duration::from_millis(100),
                turn_in_place: false,
            },
        )
    }

    fn play(session: &mut Session, script: &str) -> Vec<Event> {
        let mut log = Vec::new();
        for key in script.chars() {
            let input = match key {
                'w' => PlayerInput::Move(Direction::Up),
                's' => PlayerInput::Move(Direction::Down),
                'a' => PlayerInput::Move(Direction::Left),
                'd' => PlayerInput::Move(Direction::Right),
                'q' => PlayerInput::ChantStart,
                'x' => PlayerInput::ChantStop,
                'e' => PlayerInput::Interact,
                other => panic!("unexpected key {other:?} in script"),
            };
            log.extend(session.input(input));
        }
        log
    }

    const SOLUTIONS: [&str; 3] = ["wwwqddddw", "dddddaaaaawqddddwwwd", "ddqwwwwd"];

    #[test]
    fn shipped_levels_are_solvable_in_order() {
        let mut session = session();
        let _ = session.start(0).expect("first level starts");

        for (index, script) in SOLUTIONS.iter().enumerate() {
            if index > 0 {
                let _ = session.next_level().expect("next level unlocked");
            }
            let events = play(&mut session, script);
            assert!(
                events.contains(&Event::LevelComplete),
                "level {index} not completed: {events:?}"
            );
            assert!(!events
                .iter()
                .any(|event| matches!(event, Event::GameOver { .. })));
        }

        assert_eq!(session.campaign().current(), Some(2));
        assert_eq!(query::phase(session.world()), Some(AttemptPhase::Completed));
        assert!(matches!(
            session.next_level(),
            Err(CampaignError::Finished { .. })
        ));
    }

    #[test]
    fn final_level_unlocks_true_ending() {
        let mut session = session();
        let _ = session.start(0).expect("first level starts");
        let _ = play(&mut session, SOLUTIONS[0]);
        let _ = session.next_level().expect("second level");
        let _ = play(&mut session, SOLUTIONS[1]);
        let _ = session.next_level().expect("third level");

        let events = play(&mut session, SOLUTIONS[2]);

        assert!(events.contains(&Event::TrueEndingUnlocked));
    }

    #[test]
    fn locked_level_cannot_be_started() {
        let mut session = session();
        assert!(matches!(
            session.start(2),
            Err(CampaignError::Locked { index: 2, .. })
        ));
    }

    #[test]
    fn wandering_into_ghost_sight_fails_attempt() {
        let mut session = session();
        let _ = session.start(0).expect("first level starts");
        let _ = play(&mut session, SOLUTIONS[0]);
        let _ = session.next_level().expect("second level");

        let events = play(&mut session, "ddddwww");

        assert!(events
            .iter()
            .any(|event| matches!(event, Event::GameOver { .. })));
        assert_eq!(query::phase(session.world()), Some(AttemptPhase::Failed));
    }

    #[test]
    fn auto_restart_does_not_loop_on_a_watched_spawn() {
        let watched = Level::validate(LevelData {
            name: "watched".to_owned(),
            width: 3,
            height: 1,
            elements: vec![
                LevelElement::new(
                    CellCoord::new(0, 0),
                    GridObjectKind::SpawnPoint,
                    Direction::Right,
                ),
                LevelElement::new(
                    CellCoord::new(1, 0),
                    GridObjectKind::GhostStatue,
                    Direction::Left,
                ),
            ],
            ..LevelData::default()
        })
        .expect("valid level");
        let campaign = Campaign::new(vec![watched], Config::new(true)).expect("campaign");
        let mut session = Session::new(
            campaign,
            SessionConfig {
                tick: Duration::from_millis(50),
                chant_step: Duration::from_millis(150),
                move_duration: Duration::ZERO,
                turn_in_place: false,
            },
        );
        let game_overs = |events: &[Event]| {
            events
                .iter()
                .filter(|event| matches!(event, Event::GameOver { .. }))
                .count()
        };

        let entered = session.start(0).expect("level starts");

        assert_eq!(game_overs(&entered), 1);
        assert_eq!(query::phase(session.world()), Some(AttemptPhase::Failed));

        let restarted = session.input(PlayerInput::Restart);

        assert_eq!(game_overs(&restarted), 1);
        assert_eq!(
            restarted
                .iter()
                .filter(|event| matches!(event, Event::LevelLoaded { .. }))
                .count(),
            1
        );
        assert_eq!(query::phase(session.world()), Some(AttemptPhase::Failed));
    }

    #[test]
    fn replay_is_deterministic() {
        let run = || {
            let mut session = session();
            let mut log = session.start(0).expect("first level starts");
            log.extend(play(&mut session, "wwqxwaqdwe"));
            log.extend(session.wait());
            log
        };

        assert_eq!(run(), run(), "replay diverged between runs");
    }
}
