use std::time::Duration;

use sundial_core::{
    AttemptPhase, CellCoord, ChantState, Command, Detection, Direction, Event, GameOverReason,
    GridObjectKind, Level, LevelData, LevelElement,
};
use sundial_system_vigil::Vigil;
use sundial_world::{self as world, query, World};

fn element(x: i32, y: i32, kind: GridObjectKind, facing: Direction) -> LevelElement {
    LevelElement::new(CellCoord::new(x, y), kind, facing)
}

fn start(elements: Vec<LevelElement>) -> (World, Vigil) {
    let level = Level::validate(LevelData {
        name: "vigil".to_owned(),
        width: 5,
        height: 5,
        elements,
        ..LevelData::default()
    })
    .expect("valid level");
    let mut world = World::new();
    let mut vigil = Vigil::new();
    let _ = pump(&mut world, &mut vigil, Command::LoadLevel { level });
    (world, vigil)
}

fn pump(world: &mut World, vigil: &mut Vigil, command: Command) -> Vec<Event> {
    let mut log = Vec::new();
    let mut pending = vec![command];
    while !pending.is_empty() {
        let mut events = Vec::new();
        for command in pending.drain(..) {
            world::apply(world, command, &mut events);
        }
        let ghosts = query::ghost_statue_view(world);
        vigil.handle(
            &events,
            query::player(world),
            &ghosts,
            query::occupancy_view(world),
            &mut pending,
        );
        log.extend(events);
    }
    log
}

fn step(world: &mut World, vigil: &mut Vigil, direction: Direction) -> Vec<Event> {
    pump(world, vigil, Command::MovePlayer { direction })
}

fn tick(world: &mut World, vigil: &mut Vigil) -> Vec<Event> {
    pump(
        world,
        vigil,
        Command::Tick {
            dt: Duration::from_millis(16),
        },
    )
}

fn game_overs(events: &[Event]) -> Vec<GameOverReason> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::GameOver { reason } => Some(*reason),
            _ => None,
        })
        .collect()
}

#[test]
fn adjacent_ghost_ends_attempt_once() {
    let (mut world, mut vigil) = start(vec![
        element(0, 1, GridObjectKind::SpawnPoint, Direction::Right),
        element(2, 2, GridObjectKind::GhostStatue, Direction::Down),
    ]);
    let statue = query::ghost_statue_view(&world).into_vec()[0].id;

    assert!(game_overs(&step(&mut world, &mut vigil, Direction::Right)).is_empty());
    let events = step(&mut world, &mut vigil, Direction::Right);

    assert_eq!(
        game_overs(&events),
        vec![GameOverReason::Spotted {
            statue,
            at: CellCoord::new(2, 2),
            detection: Detection::Adjacent,
        }]
    );
    assert!(
        game_overs(&tick(&mut world, &mut vigil)).is_empty(),
        "a second tick at the same position must not fire again"
    );
    assert_eq!(query::phase(&world), Some(AttemptPhase::Failed));
}

#[test]
fn ghost_sees_down_an_open_column() {
    let (mut world, mut vigil) = start(vec![
        element(1, 0, GridObjectKind::SpawnPoint, Direction::Right),
        element(2, 4, GridObjectKind::GhostStatue, Direction::Down),
    ]);

    let events = step(&mut world, &mut vigil, Direction::Right);

    assert!(matches!(
        game_overs(&events).as_slice(),
        [GameOverReason::Spotted {
            detection: Detection::LineOfSight,
            ..
        }]
    ));
}

#[test]
fn statue_shields_the_player() {
    let (mut world, mut vigil) = start(vec![
        element(1, 0, GridObjectKind::SpawnPoint, Direction::Right),
        element(2, 2, GridObjectKind::Statue, Direction::Up),
        element(2, 4, GridObjectKind::GhostStatue, Direction::Down),
    ]);

    let _ = step(&mut world, &mut vigil, Direction::Right);
    let events = tick(&mut world, &mut vigil);

    assert!(game_overs(&events).is_empty());
    assert_eq!(query::phase(&world), Some(AttemptPhase::Playing));
}

#[test]
fn ghost_at_load_spots_player_on_first_tick() {
    let (mut world, mut vigil) = start(vec![
        element(0, 0, GridObjectKind::SpawnPoint, Direction::Up),
        element(0, 3, GridObjectKind::GhostStatue, Direction::Down),
    ]);

    assert_eq!(
        query::phase(&world),
        Some(AttemptPhase::Failed),
        "detection runs as soon as the level is entered"
    );
    assert!(game_overs(&tick(&mut world, &mut vigil)).is_empty());

    let restarted = pump(&mut world, &mut vigil, Command::Restart);
    assert_eq!(game_overs(&restarted).len(), 1, "latch resets on restart");
}

#[test]
fn cleared_ghost_no_longer_watches() {
    let (mut world, mut vigil) = start(vec![
        element(0, 0, GridObjectKind::SpawnPoint, Direction::Up),
        element(0, 1, GridObjectKind::Statue, Direction::Right),
        element(2, 1, GridObjectKind::Statue, Direction::Up),
        element(2, 3, GridObjectKind::GhostStatue, Direction::Left),
    ]);

    let _ = pump(&mut world, &mut vigil, Command::StartChant);
    while query::chant_state(&world) == ChantState::Active {
        let chant = query::current_chant(&world).expect("active chant has an id");
        let _ = pump(&mut world, &mut vigil, Command::AdvanceChant { chant });
    }
    assert!(query::ghost_statue_view(&world).into_vec()[0].destroyed);

    let mut log = Vec::new();
    for direction in [Direction::Right, Direction::Up, Direction::Up, Direction::Up] {
        log.extend(step(&mut world, &mut vigil, direction));
    }
    log.extend(tick(&mut world, &mut vigil));

    assert_eq!(
        query::player(&world).map(|player| player.cell),
        Some(CellCoord::new(1, 3))
    );
    assert!(game_overs(&log).is_empty());
}
