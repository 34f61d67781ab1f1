use std::time::Duration;

use horde_core::{
    Command, EnemyId, Event, GateTuning, LifecycleTuning, MovementSource, Observer,
    ObstructionQuery, PlacementTuning, PlayState, Pose, SpawnVolume, SpecialSpawnIndicator,
    Steering, Vec3,
};
use horde_system_placement::Surroundings;
use horde_system_special_spawn::{Config, GateState, SpecialSpawn};
use horde_world::{self as world, query, World};

struct Blind;

impl Observer for Blind {
    fn position(&self) -> Vec3 {
        Vec3::ZERO
    }

    fn viewport_point(&self, _point: Vec3) -> Vec3 {
        Vec3::new(2.0, 2.0, -1.0)
    }
}

struct OpenField;

impl ObstructionQuery for OpenField {
    fn is_obstructed(&self, _from: Vec3, _to: Vec3) -> bool {
        false
    }
}

#[derive(Debug, Default)]
struct Timer {
    progress: Vec<f32>,
    cooldowns: Vec<Duration>,
}

impl SpecialSpawnIndicator for Timer {
    fn set_progress(&mut self, fraction: f32) {
        self.progress.push(fraction);
    }

    fn cooldown_started(&mut self, duration: Duration) {
        self.cooldowns.push(duration);
    }
}

fn surroundings() -> Surroundings<'static> {
    Surroundings {
        volume: SpawnVolume::new(Vec3::ZERO, Vec3::new(50.0, 0.0, 50.0)),
        target: Vec3::new(5.0, 0.0, 5.0),
        observer: &Blind,
        obstruction: &OpenField,
    }
}

fn gate() -> SpecialSpawn {
    SpecialSpawn::new(Config::new(
        GateTuning::default(),
        PlacementTuning::default(),
        0xabcd,
    ))
}

fn step(
    gate: &mut SpecialSpawn,
    dt: Duration,
    play_state: PlayState,
    timer: &mut Timer,
    out: &mut Vec<Command>,
) {
    gate.handle(
        &[Event::TimeAdvanced { dt }],
        play_state,
        &surroundings(),
        timer,
        out,
    );
}

#[test]
fn fires_on_the_tick_that_crosses_the_threshold() {
    let mut gate = gate();
    let mut timer = Timer::default();
    let mut commands = Vec::new();
    let tick = Duration::from_millis(500);

    for _ in 0..119 {
        step(&mut gate, tick, PlayState::Active, &mut timer, &mut commands);
    }
    assert!(commands.is_empty());
    assert_eq!(
        gate.state(),
        GateState::Armed {
            elapsed: Duration::from_millis(59_500)
        }
    );

    step(&mut gate, tick, PlayState::Active, &mut timer, &mut commands);
    assert_eq!(commands.len(), 1);
    match commands[0] {
        Command::SpawnGranny { position } => {
            let distance = position.distance(Vec3::new(5.0, 0.0, 5.0));
            assert!((15.0..=50.0).contains(&distance));
        }
        ref other => panic!("unexpected command emitted: {other:?}"),
    }
    assert_eq!(gate.state(), GateState::Cooldown);
    assert_eq!(timer.cooldowns, vec![Duration::from_secs(5)]);
    let last = *timer.progress.last().expect("progress reported");
    assert!((last - 0.8).abs() < 1e-6);
}

#[test]
fn progress_fills_towards_the_maximum_fraction() {
    let mut gate = gate();
    let mut timer = Timer::default();
    let mut commands = Vec::new();
    step(
        &mut gate,
        Duration::from_secs(30),
        PlayState::Active,
        &mut timer,
        &mut commands,
    );
    assert_eq!(timer.progress.len(), 1);
    assert!((timer.progress[0] - 0.4).abs() < 1e-6);
    assert!(timer
        .progress
        .iter()
        .all(|fraction| (0.0..=0.8).contains(fraction)));
}

#[test]
fn never_fires_twice_without_a_cooldown() {
    let mut gate = gate();
    let mut timer = Timer::default();
    let mut commands = Vec::new();

    step(
        &mut gate,
        Duration::from_secs(600),
        PlayState::Active,
        &mut timer,
        &mut commands,
    );
    assert_eq!(commands.len(), 1, "one release even for a huge tick");

    for _ in 0..4 {
        step(
            &mut gate,
            Duration::from_secs(1),
            PlayState::Active,
            &mut timer,
            &mut commands,
        );
    }
    assert_eq!(commands.len(), 1);
    assert_eq!(gate.state(), GateState::Cooldown);

    step(
        &mut gate,
        Duration::from_secs(1),
        PlayState::Active,
        &mut timer,
        &mut commands,
    );
    assert_eq!(
        gate.state(),
        GateState::Armed {
            elapsed: Duration::ZERO
        }
    );

    step(
        &mut gate,
        Duration::from_secs(59),
        PlayState::Active,
        &mut timer,
        &mut commands,
    );
    assert_eq!(commands.len(), 1);
    step(
        &mut gate,
        Duration::from_secs(1),
        PlayState::Active,
        &mut timer,
        &mut commands,
    );
    assert_eq!(commands.len(), 2);
    assert_eq!(gate.releases(), 2);
}

#[test]
fn inactive_play_does_not_count_but_cooldown_runs() {
    let mut gate = gate();
    let mut timer = Timer::default();
    let mut commands = Vec::new();

    step(
        &mut gate,
        Duration::from_secs(120),
        PlayState::Inactive,
        &mut timer,
        &mut commands,
    );
    assert!(commands.is_empty());
    assert!(timer.progress.is_empty());
    assert_eq!(
        gate.state(),
        GateState::Armed {
            elapsed: Duration::ZERO
        }
    );

    step(
        &mut gate,
        Duration::from_secs(60),
        PlayState::Active,
        &mut timer,
        &mut commands,
    );
    assert_eq!(commands.len(), 1);

    step(
        &mut gate,
        Duration::from_secs(5),
        PlayState::Inactive,
        &mut timer,
        &mut commands,
    );
    assert!(matches!(gate.state(), GateState::Armed { .. }));
}

#[test]
fn grannies_keep_clear_of_the_arena_centre() {
    let surroundings = Surroundings {
        volume: SpawnVolume::new(Vec3::ZERO, Vec3::new(50.0, 0.0, 50.0)),
        target: Vec3::new(20.0, 0.0, 0.0),
        observer: &Blind,
        obstruction: &OpenField,
    };

    for seed in 0..400 {
        let mut gate = SpecialSpawn::new(Config::new(
            GateTuning::default(),
            PlacementTuning::default(),
            seed,
        ));
        let mut timer = Timer::default();
        let mut commands = Vec::new();
        gate.handle(
            &[Event::TimeAdvanced {
                dt: Duration::from_secs(60),
            }],
            PlayState::Active,
            &surroundings,
            &mut timer,
            &mut commands,
        );
        match commands.as_slice() {
            [Command::SpawnGranny { position }] => {
                let from_centre = surroundings.volume.planar_distance_from_centre(*position);
                assert!(from_centre >= 10.0, "seed {seed}: {from_centre}");
            }
            other => panic!("seed {seed}: unexpected commands {other:?}"),
        }
    }
}

#[derive(Debug)]
struct Parked {
    pose: Pose,
    speed: f32,
    enabled: bool,
}

impl MovementSource for Parked {
    fn advance(&mut self, _dt: Duration, _target: Vec3) {}

    fn pose(&self) -> Pose {
        self.pose
    }

    fn reset(&mut self, pose: Pose) {
        self.pose = pose;
    }

    fn speed(&self) -> f32 {
        self.speed
    }

    fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

struct ParkedSteering;

impl Steering for ParkedSteering {
    fn bind(&mut self, _enemy: EnemyId, pose: Pose, speed: f32) -> Box<dyn MovementSource> {
        Box::new(Parked {
            pose,
            speed,
            enabled: true,
        })
    }
}

#[test]
fn released_grannies_join_the_world_and_stay() {
    let mut world = World::new(LifecycleTuning::default(), Box::new(ParkedSteering));
    let mut gate = gate();
    let mut timer = Timer::default();
    let mut events = Vec::new();
    let mut commands = Vec::new();

    for _ in 0..200 {
        events.clear();
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
            &mut events,
        );
        commands.clear();
        gate.handle(
            &events,
            query::play_state(&world),
            &surroundings(),
            &mut timer,
            &mut commands,
        );
        for command in commands.drain(..) {
            world::apply(&mut world, command, &mut events);
        }
    }

    assert_eq!(gate.releases(), 3);
    assert_eq!(query::granny_count(&world), 3);
    assert!(query::granny_view(&world)
        .iter()
        .all(|granny| granny.alive && !granny.frozen));
}
