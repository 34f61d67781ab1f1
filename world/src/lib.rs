#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative population state for the Horde arena.
//!
//! The world owns both registry partitions (enemies and grannies), every
//! enemy's lifecycle, the chase target and the delayed actions that finish
//! despawns. All mutation flows through [`apply`] and [`spawn_enemy`]; reads
//! go through the [`query`] module and always return copies.

use std::{fmt, time::Duration};

use horde_core::{
    ramp_ratio, schedule::Scheduler, Command, EnemyId, Event, GrannyId, Hit, LifecycleTuning,
    PlayState, ProfileId, SpeedOverride, Steering, Vec3,
};
use tracing::{debug, trace};

mod enemy;
mod granny;
pub mod registry;

pub use enemy::{DeathHook, RewardHook, SpawnHooks};

use enemy::Enemy;
use granny::Granny;
use registry::Registry;

/// Entity that enemies chase.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetState {
    /// World position of the target.
    pub position: Vec3,
    /// Whether the target currently accepts attacks.
    pub attackable: bool,
}

impl Default for TargetState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            attackable: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WorldTask {
    Despawn(EnemyId),
    ResumeChase(EnemyId),
}

/// Represents the authoritative Horde world state.
pub struct World {
    tuning: LifecycleTuning,
    steering: Box<dyn Steering>,
    enemies: Registry<Enemy>,
    grannies: Registry<Granny>,
    scheduler: Scheduler<WorldTask>,
    target: TargetState,
    play_state: PlayState,
    active_elapsed: Duration,
    frozen: bool,
    next_enemy_id: u32,
    next_granny_id: u32,
    tick_index: u64,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("enemies", &self.enemies)
            .field("grannies", &self.grannies)
            .field("pending", &self.scheduler.len())
            .field("play_state", &self.play_state)
            .field("active_elapsed", &self.active_elapsed)
            .field("frozen", &self.frozen)
            .field("tick_index", &self.tick_index)
            .finish_non_exhaustive()
    }
}

impl World {
    /// Creates an empty world whose enemies are steered by `steering`.
    #[must_use]
    pub fn new(tuning: LifecycleTuning, steering: Box<dyn Steering>) -> Self {
        Self {
            tuning,
            steering,
            enemies: Registry::new(),
            grannies: Registry::new(),
            scheduler: Scheduler::new(),
            target: TargetState::default(),
            play_state: PlayState::Active,
            active_elapsed: Duration::ZERO,
            frozen: false,
            next_enemy_id: 0,
            next_granny_id: 0,
            tick_index: 0,
        }
    }

    /// Prices a rewarded kill using the configured time-reward ramp.
    fn default_reward_hook(&self) -> RewardHook {
        let ramp = self.tuning.time_reward;
        let duration = self.tuning.reward_ramp();
        Box::new(move |elapsed| ramp.at(ramp_ratio(elapsed, duration)))
    }

    fn allocate_enemy_id(&mut self) -> EnemyId {
        let id = EnemyId::new(self.next_enemy_id);
        self.next_enemy_id = self.next_enemy_id.wrapping_add(1);
        id
    }

    fn allocate_granny_id(&mut self) -> GrannyId {
        let id = GrannyId::new(self.next_granny_id);
        self.next_granny_id = self.next_granny_id.wrapping_add(1);
        id
    }

    fn kill(
        &mut self,
        enemy_id: EnemyId,
        hit: Hit,
        apply_reward: bool,
        out_events: &mut Vec<Event>,
    ) {
        let Some(enemy) = self.enemies.get_mut(enemy_id) else {
            return;
        };
        let Some(death) = enemy.kill(hit, apply_reward, self.active_elapsed, &self.tuning) else {
            trace!(enemy = enemy_id.get(), "ignoring kill of an enemy that is not alive");
            return;
        };

        let task = self
            .scheduler
            .schedule(self.tuning.despawn_delay(), WorldTask::Despawn(enemy_id));
        enemy.set_despawn_task(task);

        debug!(
            enemy = enemy_id.get(),
            reward = ?death.reward,
            "enemy killed"
        );
        out_events.push(Event::EnemyKilled {
            enemy: enemy_id,
            position: death.position,
            impulse: death.impulse,
        });
        if let Some(amount) = death.reward {
            out_events.push(Event::TimeRewarded {
                amount,
                position: death.position,
            });
        }
    }

    fn despawn(&mut self, enemy_id: EnemyId, out_events: &mut Vec<Event>) {
        let Some(enemy) = self.enemies.get_mut(enemy_id) else {
            return;
        };
        enemy.finish_despawn();
        let leftover: Vec<_> = enemy.pending_tasks().collect();
        for task in leftover {
            let _ = self.scheduler.cancel(task);
        }
        let _ = self.enemies.deregister(enemy_id);

        debug!(enemy = enemy_id.get(), "enemy despawned");
        out_events.push(Event::EnemyDespawned { enemy: enemy_id });
    }

    fn delay_chase(&mut self, enemy_id: EnemyId, duration: Duration) {
        let Some(enemy) = self.enemies.get_mut(enemy_id) else {
            return;
        };
        if !enemy.is_alive() {
            return;
        }
        let task = self
            .scheduler
            .schedule(duration, WorldTask::ResumeChase(enemy_id));
        if let Some(previous) = enemy.suspend_chase(task) {
            let _ = self.scheduler.cancel(previous);
        }
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced { dt });

        if self.play_state == PlayState::Active {
            self.active_elapsed = self.active_elapsed.saturating_add(dt);
        }

        let target = self.target;
        for enemy in self.enemies.iter_mut() {
            enemy.follow(dt, &target, &self.tuning);
        }

        let mut due = Vec::new();
        self.scheduler.advance(dt, &mut due);
        for task in due {
            match task {
                WorldTask::Despawn(enemy_id) => self.despawn(enemy_id, out_events),
                WorldTask::ResumeChase(enemy_id) => {
                    if let Some(enemy) = self.enemies.get_mut(enemy_id) {
                        enemy.resume_chase();
                    }
                }
            }
        }
    }

    fn set_frozen(&mut self, frozen: bool, out_events: &mut Vec<Event>) {
        self.frozen = frozen;
        for enemy in self.enemies.iter_mut() {
            enemy.set_frozen(frozen);
        }
        for granny in self.grannies.iter_mut() {
            granny.set_frozen(frozen);
        }
        out_events.push(if frozen {
            Event::PopulationFrozen
        } else {
            Event::PopulationThawed
        });
    }

    fn reset(&mut self, out_events: &mut Vec<Event>) {
        self.scheduler.clear();
        self.enemies.clear();
        self.grannies.clear();
        self.frozen = false;
        debug!("population reset");
        out_events.push(Event::PopulationReset);
    }
}

/// Creates an enemy at `position` with explicit spawn hooks.
///
/// This is the factory entry point for callers that need their own death
/// notification or reward pricing. Returns `None` and spawns nothing when
/// `profile` does not name an entry of the profile table.
pub fn spawn_enemy(
    world: &mut World,
    position: Vec3,
    profile: ProfileId,
    hooks: SpawnHooks,
    out_events: &mut Vec<Event>,
) -> Option<EnemyId> {
    let index = usize::try_from(profile.get()).ok()?;
    let speed = world.tuning.profiles.get(index)?.speed;

    let id = world.allocate_enemy_id();
    let source = world
        .steering
        .bind(id, horde_core::Pose::at(position), speed);
    let enemy = Enemy::spawn(id, position, profile, speed, source, hooks, world.frozen);
    if !world.enemies.register(enemy) {
        return None;
    }

    trace!(enemy = id.get(), x = position.x, z = position.z, "enemy spawned");
    out_events.push(Event::EnemySpawned {
        enemy: id,
        position,
        profile,
    });
    Some(id)
}

/// Applies the provided command to the world.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::SetPlayState { state } => {
            if world.play_state != state {
                world.play_state = state;
                out_events.push(Event::PlayStateChanged { state });
            }
        }
        Command::UpdateTarget {
            position,
            attackable,
        } => {
            world.target = TargetState {
                position,
                attackable,
            };
        }
        Command::SpawnEnemy { position, profile } => {
            let hooks = SpawnHooks {
                on_death: None,
                reward: Some(world.default_reward_hook()),
            };
            let _ = spawn_enemy(world, position, profile, hooks, out_events);
        }
        Command::SpawnGranny { position } => {
            let id = world.allocate_granny_id();
            let granny = Granny::spawn(id, position, world.frozen);
            if world.grannies.register(granny) {
                debug!(granny = id.get(), x = position.x, z = position.z, "granny spawned");
                out_events.push(Event::GrannySpawned {
                    granny: id,
                    position,
                });
            }
        }
        Command::KillEnemy {
            enemy,
            hit,
            apply_reward,
        } => world.kill(enemy, hit, apply_reward, out_events),
        Command::SetEnemySpeed { enemy, speed } => {
            if let Some(enemy) = world.enemies.get_mut(enemy) {
                enemy.set_speed(match speed {
                    SpeedOverride::Profile => None,
                    SpeedOverride::Fixed(value) => Some(value),
                });
            }
        }
        Command::DelayChase { enemy, duration } => world.delay_chase(enemy, duration),
        Command::PlayVoiceLine { enemy, clip } => {
            if let Some(snapshot) = world
                .enemies
                .get(enemy)
                .filter(|enemy| enemy.is_alive())
                .map(Enemy::snapshot)
            {
                out_events.push(Event::VoiceLinePlayed {
                    enemy,
                    clip,
                    position: snapshot.pose.position,
                });
            }
        }
        Command::Freeze => world.set_frozen(true, out_events),
        Command::Thaw => world.set_frozen(false, out_events),
        Command::Reset => world.reset(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use horde_core::{EnemyId, EnemySnapshot, GrannySnapshot, PlayState, Vec3};

    use super::{TargetState, World};

    /// Play state last reported by the game-state authority.
    #[must_use]
    pub fn play_state(world: &World) -> PlayState {
        world.play_state
    }

    /// Target enemies currently chase.
    #[must_use]
    pub fn target(world: &World) -> TargetState {
        world.target
    }

    /// Active play time accumulated by the world.
    #[must_use]
    pub fn active_elapsed(world: &World) -> Duration {
        world.active_elapsed
    }

    /// Number of registered enemies, dying ones included.
    #[must_use]
    pub fn enemy_count(world: &World) -> usize {
        world.enemies.count()
    }

    /// Number of registered grannies.
    #[must_use]
    pub fn granny_count(world: &World) -> usize {
        world.grannies.count()
    }

    /// Number of entries in the enemy profile table.
    #[must_use]
    pub fn profile_count(world: &World) -> usize {
        world.tuning.profiles.len()
    }

    /// Whether the population is frozen.
    #[must_use]
    pub fn is_frozen(world: &World) -> bool {
        world.frozen
    }

    /// Number of delayed actions the world is waiting on.
    #[must_use]
    pub fn pending_actions(world: &World) -> usize {
        world.scheduler.len()
    }

    /// Snapshot of a single enemy, if it is registered.
    #[must_use]
    pub fn enemy(world: &World, enemy: EnemyId) -> Option<EnemySnapshot> {
        world.enemies.get(enemy).map(|entry| entry.snapshot())
    }

    /// Snapshots of every registered enemy in ascending id order.
    #[must_use]
    pub fn enemy_view(world: &World) -> Vec<EnemySnapshot> {
        world.enemies.iter().map(|entry| entry.snapshot()).collect()
    }

    /// Snapshots of every registered granny in ascending id order.
    #[must_use]
    pub fn granny_view(world: &World) -> Vec<GrannySnapshot> {
        world.grannies.iter().map(|entry| entry.snapshot()).collect()
    }

    /// Enemies strictly closer than `radius` to `point`.
    #[must_use]
    pub fn enemies_within(world: &World, point: Vec3, radius: f32) -> Vec<EnemySnapshot> {
        world
            .enemies
            .within_radius(point, radius)
            .into_iter()
            .filter_map(|id| world.enemies.get(id).map(|entry| entry.snapshot()))
            .collect()
    }

    /// Grannies strictly closer than `radius` to `point`.
    #[must_use]
    pub fn grannies_within(world: &World, point: Vec3, radius: f32) -> Vec<GrannySnapshot> {
        world
            .grannies
            .within_radius(point, radius)
            .into_iter()
            .filter_map(|id| world.grannies.get(id).map(|entry| entry.snapshot()))
            .collect()
    }
}
