//! Headless game loop wiring the world to every system.

use std::{mem, time::Duration};

use horde_core::{dispatch_rewards, Command, Event, Hit, LifeState, PlayState, SpawnVolume, Vec3};
use horde_system_placement::Surroundings;
use horde_system_spawning::{self as spawning, Spawning};
use horde_system_special_spawn::{self as special_spawn, SpecialSpawn};
use horde_system_voice_lines::{self as voice_lines, VoiceLines};
use horde_world::{self as world, query, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::{
    config::HordeConfig,
    stage::{DirectSteering, FollowCamera, GateGauge, MatchClock, Patrol, Pillars},
};

const KILL_POWER: f32 = 15.0;
const KILL_LIFT: f32 = 2.0;

/// Totals gathered while the simulation runs.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Summary {
    pub(crate) ticks: u64,
    pub(crate) simulated: Duration,
    pub(crate) spawned: u32,
    pub(crate) killed: u32,
    pub(crate) despawned: u32,
    pub(crate) grannies: u32,
    pub(crate) voice_lines: u32,
    pub(crate) time_rewarded: f32,
    pub(crate) peak_population: usize,
    pub(crate) clock_remaining: f32,
    pub(crate) match_over: bool,
}

/// World, systems and stand-in collaborators advanced in lockstep.
#[derive(Debug)]
pub(crate) struct Simulation {
    world: World,
    spawning: Spawning,
    special_spawn: SpecialSpawn,
    voice_lines: VoiceLines,
    volume: SpawnVolume,
    player: Patrol,
    camera: FollowCamera,
    pillars: Pillars,
    clock: MatchClock,
    gauge: GateGauge,
    kill_radius: f32,
    backlog: Vec<Event>,
    summary: Summary,
}

impl Simulation {
    pub(crate) fn new(config: &HordeConfig, kill_radius: f32, seed: u64) -> Self {
        let mut seeds = ChaCha8Rng::seed_from_u64(seed);
        let profile_count = config.lifecycle.profiles.len();
        let player = Patrol::new(&config.arena);
        let mut camera = FollowCamera::new(&config.arena);
        camera.follow(&player);

        Self {
            world: World::new(config.lifecycle.clone(), Box::new(DirectSteering)),
            spawning: Spawning::new(spawning::Config::new(
                config.pacing.clone(),
                config.placement.clone(),
                profile_count,
                seeds.gen(),
            )),
            special_spawn: SpecialSpawn::new(special_spawn::Config::new(
                config.gate.clone(),
                config.placement.clone(),
                seeds.gen(),
            )),
            voice_lines: VoiceLines::new(voice_lines::Config::new(config.voice.clone(), seeds.gen())),
            volume: config.arena.volume(),
            player,
            camera,
            pillars: Pillars::new(&config.arena.pillars),
            clock: MatchClock::new(config.arena.match_secs),
            gauge: GateGauge::default(),
            kill_radius,
            backlog: Vec::new(),
            summary: Summary::default(),
        }
    }

    /// Advances every participant by one frame.
    pub(crate) fn step(&mut self, dt: Duration) {
        let mut events = mem::take(&mut self.backlog);
        let active = query::play_state(&self.world) == PlayState::Active;

        self.player.advance(dt);
        self.camera.follow(&self.player);
        let target = self.player.position();
        world::apply(
            &mut self.world,
            Command::UpdateTarget {
                position: target,
                attackable: active,
            },
            &mut events,
        );
        world::apply(&mut self.world, Command::Tick { dt }, &mut events);

        if active {
            self.clock.drain(dt);
            if self.clock.expired() {
                info!(
                    simulated_secs = self.summary.simulated.as_secs_f32(),
                    "match clock ran out"
                );
                world::apply(
                    &mut self.world,
                    Command::SetPlayState {
                        state: PlayState::Inactive,
                    },
                    &mut events,
                );
                world::apply(&mut self.world, Command::Freeze, &mut events);
            } else {
                self.strike_near(target, &mut events);
            }
        }

        let play_state = query::play_state(&self.world);
        let mut commands = Vec::new();
        let surroundings = Surroundings {
            volume: self.volume,
            target,
            observer: &self.camera,
            obstruction: &self.pillars,
        };
        self.spawning.handle(
            &events,
            play_state,
            query::enemy_count(&self.world),
            &surroundings,
            &mut commands,
        );
        self.special_spawn.handle(
            &events,
            play_state,
            &surroundings,
            &mut self.gauge,
            &mut commands,
        );
        self.voice_lines.handle(&events, play_state, &mut commands);

        dispatch_rewards(&events, &mut self.clock);
        self.record(&events, dt);

        for command in commands {
            world::apply(&mut self.world, command, &mut self.backlog);
        }
        self.summary.peak_population = self
            .summary
            .peak_population
            .max(query::enemy_count(&self.world));
    }

    /// Simulated time so far.
    pub(crate) fn elapsed(&self) -> Duration {
        self.summary.simulated
    }

    pub(crate) fn is_over(&self) -> bool {
        self.summary.match_over
    }

    /// Totals so far, including the events still waiting for the next frame.
    pub(crate) fn summary(&self) -> Summary {
        let mut summary = self.summary.clone();
        tally(&mut summary, &self.backlog);
        summary.time_rewarded = self.clock.granted();
        summary.clock_remaining = self.clock.remaining();
        summary
    }

    pub(crate) fn gate_fill(&self) -> f32 {
        self.gauge.fill()
    }

    pub(crate) fn gate_cooldowns(&self) -> u32 {
        self.gauge.cooldowns()
    }

    /// Kills every alive enemy that reached the player.
    fn strike_near(&mut self, target: Vec3, events: &mut Vec<Event>) {
        let reached = query::enemies_within(&self.world, target, self.kill_radius);
        for enemy in reached {
            if enemy.state != LifeState::Alive {
                continue;
            }
            let direction = (target - enemy.pose.position).normalize_or_zero();
            world::apply(
                &mut self.world,
                Command::KillEnemy {
                    enemy: enemy.id,
                    hit: Hit {
                        direction,
                        power: KILL_POWER,
                        height: KILL_LIFT,
                    },
                    apply_reward: true,
                },
                events,
            );
        }
    }

    fn record(&mut self, events: &[Event], dt: Duration) {
        self.summary.ticks = self.summary.ticks.saturating_add(1);
        self.summary.simulated = self.summary.simulated.saturating_add(dt);
        tally(&mut self.summary, events);
        if events
            .iter()
            .any(|event| matches!(event, Event::PopulationFrozen))
        {
            self.summary.match_over = true;
        }
        debug!(
            tick = self.summary.ticks,
            population = query::enemy_count(&self.world),
            "frame complete"
        );
    }
}

fn tally(summary: &mut Summary, events: &[Event]) {
    for event in events {
        match event {
            Event::EnemySpawned { .. } => summary.spawned += 1,
            Event::EnemyKilled { .. } => summary.killed += 1,
            Event::EnemyDespawned { .. } => summary.despawned += 1,
            Event::GrannySpawned { .. } => summary.grannies += 1,
            Event::VoiceLinePlayed { .. } => summary.voice_lines += 1,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(config: &HordeConfig, seed: u64, seconds: u64) -> Summary {
        let mut simulation = Simulation::new(config, 2.5, seed);
        let dt = Duration::from_millis(50);
        while simulation.elapsed() < Duration::from_secs(seconds) && !simulation.is_over() {
            simulation.step(dt);
        }
        simulation.summary()
    }

    #[test]
    fn starting_waves_populate_the_arena() {
        let summary = run(&HordeConfig::default(), 7, 1);
        assert!(summary.spawned >= 20, "spawned {}", summary.spawned);
        assert!(summary.peak_population <= 100 + 6);
        assert_eq!(summary.ticks, 20);
    }

    #[test]
    fn same_seed_reproduces_the_run() {
        let config = HordeConfig::default();
        assert_eq!(run(&config, 99, 30), run(&config, 99, 30));
    }

    #[test]
    fn expired_clock_ends_the_match() {
        let mut config = HordeConfig::default();
        config.arena.match_secs = 1.0;
        config.pacing.starting_waves = 0;
        let summary = run(&config, 3, 10);
        assert!(summary.match_over);
        assert!(summary.simulated <= Duration::from_millis(1_100));
        assert_eq!(summary.clock_remaining, 0.0);
    }

    #[test]
    fn gate_releases_a_granny_during_long_matches() {
        let mut config = HordeConfig::default();
        config.arena.match_secs = 10_000.0;
        config.gate.threshold_secs = 2.0;
        let mut simulation = Simulation::new(&config, 2.5, 5);
        for _ in 0..60 {
            simulation.step(Duration::from_millis(50));
        }
        assert_eq!(simulation.summary().grannies, 1);
        assert_eq!(simulation.gate_cooldowns(), 1);
        assert!(simulation.gate_fill() <= 0.8);
    }
}
