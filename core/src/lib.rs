#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Horde arena population manager.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to. Systems consume event streams, query immutable snapshots, and
//! respond exclusively with new command batches.
//!
//! Collaborators that live outside the population manager (camera, physics
//! queries, steering, reward accounting, UI indicators) are reached through
//! the narrow traits declared here so tests can substitute fakes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod schedule;
mod tuning;

pub use glam::{Quat, Vec3};
pub use tuning::{
    EnemyProfile, EnemyVariant, GateTuning, LifecycleTuning, PacingTuning, PlacementTuning,
    RampRange, RampSpan, ValueRamp, VoiceTuning,
};

/// Describes whether the game-state authority currently runs the match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayState {
    /// The match is running; difficulty clocks and gate timers accumulate.
    Active,
    /// The match is stopped; clocks hold their value.
    Inactive,
}

/// Lifecycle stage of a regular enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifeState {
    /// The enemy follows its movement source and may be killed.
    Alive,
    /// The enemy was killed and waits for its despawn delay to elapse.
    Dying,
    /// The enemy completed its despawn and left every registry.
    Despawned,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Records the play state reported by the game-state authority.
    SetPlayState {
        /// State that should become active.
        state: PlayState,
    },
    /// Updates the target that enemies chase.
    UpdateTarget {
        /// World position of the target.
        position: Vec3,
        /// Whether the target currently accepts attacks.
        attackable: bool,
    },
    /// Requests that a single enemy be created at the provided position.
    SpawnEnemy {
        /// World position the enemy appears at.
        position: Vec3,
        /// Profile the enemy draws its stats from.
        profile: ProfileId,
    },
    /// Requests that a special granny actor be created at the provided position.
    SpawnGranny {
        /// World position the granny appears at.
        position: Vec3,
    },
    /// Kills an alive enemy with the provided hit.
    KillEnemy {
        /// Enemy receiving the killing blow.
        enemy: EnemyId,
        /// Hit that caused the death.
        hit: Hit,
        /// Whether the kill grants a time reward.
        apply_reward: bool,
    },
    /// Overrides or restores the movement speed of an enemy.
    SetEnemySpeed {
        /// Enemy whose speed changes.
        enemy: EnemyId,
        /// Speed to apply.
        speed: SpeedOverride,
    },
    /// Suspends an enemy's chase for the provided duration.
    DelayChase {
        /// Enemy that stops chasing.
        enemy: EnemyId,
        /// Duration before the chase resumes.
        duration: Duration,
    },
    /// Requests that an enemy play one of its idle voice lines.
    PlayVoiceLine {
        /// Enemy that speaks.
        enemy: EnemyId,
        /// Clip selected for playback.
        clip: ClipId,
    },
    /// Freezes every enemy and granny in place.
    Freeze,
    /// Reverses a previous [`Command::Freeze`].
    Thaw,
    /// Discards the whole population and every pending delayed action.
    Reset,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the play state changed.
    PlayStateChanged {
        /// State that became active.
        state: PlayState,
    },
    /// Confirms that an enemy was created and registered.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Position the enemy appeared at.
        position: Vec3,
        /// Profile assigned to the enemy.
        profile: ProfileId,
    },
    /// Confirms that an enemy transitioned from alive to dying.
    EnemyKilled {
        /// Enemy that died.
        enemy: EnemyId,
        /// Position of the enemy at the moment of death.
        position: Vec3,
        /// Impulse the physics collaborator applies to the body.
        impulse: Impulse,
    },
    /// Reports that a kill granted additional match time.
    TimeRewarded {
        /// Amount of time granted, in seconds.
        amount: f32,
        /// Position the reward originated from.
        position: Vec3,
    },
    /// Confirms that an enemy finished its despawn delay and left the world.
    EnemyDespawned {
        /// Enemy that was removed.
        enemy: EnemyId,
    },
    /// Confirms that a granny was created and registered.
    GrannySpawned {
        /// Identifier assigned to the granny.
        granny: GrannyId,
        /// Position the granny appeared at.
        position: Vec3,
    },
    /// Reports that an enemy started an idle voice line.
    VoiceLinePlayed {
        /// Enemy that spoke.
        enemy: EnemyId,
        /// Clip being played.
        clip: ClipId,
        /// Position the clip plays at.
        position: Vec3,
    },
    /// Announces that the population was frozen.
    PopulationFrozen,
    /// Announces that the population was thawed.
    PopulationThawed,
    /// Announces that the population and all pending actions were discarded.
    PopulationReset,
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a granny.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GrannyId(u32);

impl GrannyId {
    /// Creates a new granny identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index into the enemy profile table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProfileId(u32);

impl ProfileId {
    /// Creates a new profile index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index of an audio clip owned by the audio collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClipId(u32);

impl ClipId {
    /// Creates a new clip index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Position and orientation of an actor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    /// World position.
    pub position: Vec3,
    /// World orientation.
    pub rotation: Quat,
}

impl Pose {
    /// Creates a pose from explicit components.
    #[must_use]
    pub const fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Creates an unrotated pose at the provided position.
    #[must_use]
    pub const fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Axis-aligned box that bounds where enemies may be placed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnVolume {
    /// Centre of the volume.
    pub centre: Vec3,
    /// Half of the volume's size along each axis.
    pub half_extents: Vec3,
}

impl SpawnVolume {
    /// Creates a volume from its centre and half extents.
    #[must_use]
    pub const fn new(centre: Vec3, half_extents: Vec3) -> Self {
        Self {
            centre,
            half_extents,
        }
    }

    /// Distance between the point and the volume centre ignoring height.
    #[must_use]
    pub fn planar_distance_from_centre(&self, point: Vec3) -> f32 {
        planar_distance(self.centre, point)
    }

    /// Reports whether the point lies within the volume's horizontal extent.
    #[must_use]
    pub fn contains_planar(&self, point: Vec3) -> bool {
        let extents = self.half_extents.abs();
        (point.x - self.centre.x).abs() <= extents.x && (point.z - self.centre.z).abs() <= extents.z
    }
}

/// Distance between two points projected onto the ground plane.
#[must_use]
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}

/// Killing blow delivered to an enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    /// Direction the blow came from.
    pub direction: Vec3,
    /// Strength of the blow.
    pub power: f32,
    /// Upward lift applied to the body.
    pub height: f32,
}

/// Explosion-style impulse handed to the physics collaborator on death.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Impulse {
    /// Point the impulse radiates from.
    pub origin: Vec3,
    /// Strength of the impulse.
    pub power: f32,
    /// Radius the impulse reaches.
    pub radius: f32,
    /// Upward modifier applied by the physics collaborator.
    pub upward: f32,
}

/// Requested change to an enemy's movement speed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpeedOverride {
    /// Restores the speed defined by the enemy's profile.
    Profile,
    /// Forces the provided speed.
    Fixed(f32),
}

impl SpeedOverride {
    /// Sentinel that older callers pass to restore the profile speed.
    pub const RESTORE_SENTINEL: f32 = -1.0;

    /// Interprets a raw speed where [`Self::RESTORE_SENTINEL`] restores the profile speed.
    #[must_use]
    pub fn from_sentinel(speed: f32) -> Self {
        if speed == Self::RESTORE_SENTINEL {
            Self::Profile
        } else {
            Self::Fixed(speed)
        }
    }
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Lifecycle stage of the enemy.
    pub state: LifeState,
    /// Current pose.
    pub pose: Pose,
    /// Profile assigned at spawn.
    pub profile: ProfileId,
    /// Movement speed currently applied to the movement source.
    pub speed: f32,
    /// Whether the enemy is close enough to attack an attackable target.
    pub in_attack_range: bool,
    /// Normalised locomotion value driving the walk animation.
    pub locomotion: f32,
    /// Whether the enemy is frozen.
    pub frozen: bool,
}

/// Immutable representation of a single granny's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrannySnapshot {
    /// Unique identifier assigned to the granny.
    pub id: GrannyId,
    /// Current position.
    pub position: Vec3,
    /// Whether the granny is alive.
    pub alive: bool,
    /// Whether the granny is frozen.
    pub frozen: bool,
}

/// Viewpoint used to decide whether a placement is visible.
pub trait Observer {
    /// World position of the observer.
    fn position(&self) -> Vec3;

    /// Projects a world point into normalised viewport space.
    ///
    /// `x` and `y` span `0..=1` across the visible screen and `z` is the
    /// depth in front of the observer.
    fn viewport_point(&self, point: Vec3) -> Vec3;
}

/// World query service that reports blocking surfaces.
pub trait ObstructionQuery {
    /// Reports whether an obstruction surface lies on the line between the points.
    fn is_obstructed(&self, from: Vec3, to: Vec3) -> bool;
}

/// Steering delegate that produces an enemy's pose each tick.
pub trait MovementSource {
    /// Moves the delegate toward the target by the provided time step.
    fn advance(&mut self, dt: Duration, target: Vec3);

    /// Current pose produced by the delegate.
    fn pose(&self) -> Pose;

    /// Snaps the delegate back onto the provided pose.
    fn reset(&mut self, pose: Pose);

    /// Movement speed used by the delegate.
    fn speed(&self) -> f32;

    /// Changes the movement speed used by the delegate.
    fn set_speed(&mut self, speed: f32);

    /// Whether the delegate is currently steering.
    fn is_enabled(&self) -> bool;

    /// Enables or disables steering.
    fn set_enabled(&mut self, enabled: bool);
}

/// Factory that binds a movement source to each newly spawned enemy.
pub trait Steering {
    /// Creates the movement source for an enemy spawned at `pose` moving at `speed`.
    fn bind(&mut self, enemy: EnemyId, pose: Pose, speed: f32) -> Box<dyn MovementSource>;
}

/// Receiver of time rewards granted by kills.
pub trait RewardSink {
    /// Adds `amount` seconds to the match timer, attributed to `position`.
    fn add_time(&mut self, amount: f32, position: Vec3);
}

/// Forwards every [`Event::TimeRewarded`] in the batch to the sink.
pub fn dispatch_rewards(events: &[Event], sink: &mut dyn RewardSink) {
    for event in events {
        if let Event::TimeRewarded { amount, position } = event {
            sink.add_time(*amount, *position);
        }
    }
}

/// UI hook that visualises the special spawn gate.
pub trait SpecialSpawnIndicator {
    /// Reports the fill fraction of the gate's progress bar.
    fn set_progress(&mut self, fraction: f32);

    /// Reports that the gate fired and entered a cooldown of `duration`.
    fn cooldown_started(&mut self, duration: Duration);
}

/// Sums the simulated time advanced by the batch.
#[must_use]
pub fn elapsed_in(events: &[Event]) -> Duration {
    events
        .iter()
        .filter_map(|event| match event {
            Event::TimeAdvanced { dt } => Some(*dt),
            _ => None,
        })
        .fold(Duration::ZERO, Duration::saturating_add)
}

/// Ratio of `elapsed` to `duration` clamped to `0..=1`.
///
/// A zero duration reports the ramp as complete.
#[must_use]
pub fn ramp_ratio(elapsed: Duration, duration: Duration) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0)
}

/// Linear interpolation between `a` and `b` without clamping `t`.
#[must_use]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enemy_id_round_trips_through_bincode() {
        let id = EnemyId::new(42);
        let bytes = bincode::serialize(&id).expect("serialize");
        let restored: EnemyId = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, id);
    }

    #[test]
    fn sentinel_speed_restores_profile() {
        assert_eq!(SpeedOverride::from_sentinel(-1.0), SpeedOverride::Profile);
        assert_eq!(SpeedOverride::from_sentinel(6.5), SpeedOverride::Fixed(6.5));
    }

    #[test]
    fn ramp_ratio_clamps_past_duration() {
        let duration = Duration::from_secs(180);
        assert_eq!(ramp_ratio(Duration::ZERO, duration), 0.0);
        assert_eq!(ramp_ratio(Duration::from_secs(90), duration), 0.5);
        assert_eq!(ramp_ratio(Duration::from_secs(400), duration), 1.0);
        assert_eq!(ramp_ratio(Duration::from_secs(3), Duration::ZERO), 1.0);
    }

    #[test]
    fn elapsed_in_sums_only_time_events() {
        let events = [
            Event::TimeAdvanced {
                dt: Duration::from_millis(16),
            },
            Event::PopulationFrozen,
            Event::TimeAdvanced {
                dt: Duration::from_millis(34),
            },
        ];
        assert_eq!(elapsed_in(&events), Duration::from_millis(50));
    }

    #[derive(Default)]
    struct Ledger {
        total: f32,
        calls: usize,
    }

    impl RewardSink for Ledger {
        fn add_time(&mut self, amount: f32, _position: Vec3) {
            self.total += amount;
            self.calls += 1;
        }
    }

    #[test]
    fn dispatch_rewards_forwards_each_reward() {
        let events = [
            Event::TimeRewarded {
                amount: 1.0,
                position: Vec3::ZERO,
            },
            Event::EnemyDespawned {
                enemy: EnemyId::new(3),
            },
            Event::TimeRewarded {
                amount: 0.5,
                position: Vec3::X,
            },
        ];
        let mut ledger = Ledger::default();
        dispatch_rewards(&events, &mut ledger);
        assert_eq!(ledger.calls, 2);
        assert!((ledger.total - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn spawn_volume_measures_planar_distance() {
        let volume = SpawnVolume::new(Vec3::new(0.0, 5.0, 0.0), Vec3::new(50.0, 0.0, 50.0));
        assert!((volume.planar_distance_from_centre(Vec3::new(3.0, -40.0, 4.0)) - 5.0).abs() < 1e-6);
        assert!(volume.contains_planar(Vec3::new(50.0, 0.0, -50.0)));
        assert!(!volume.contains_planar(Vec3::new(50.1, 0.0, 0.0)));
    }
}
