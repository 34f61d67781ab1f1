//! Per-enemy lifecycle: steering, death and despawn bookkeeping.

use std::{fmt, time::Duration};

use horde_core::{
    schedule::TaskHandle, EnemyId, EnemySnapshot, Hit, Impulse, LifeState, LifecycleTuning,
    MovementSource, Pose, ProfileId, Vec3,
};

use crate::{registry::Member, TargetState};

/// Callback notified once an enemy completed its despawn.
pub type DeathHook = Box<dyn FnMut(EnemyId)>;

/// Callback that prices a rewarded kill from the world's active play time.
pub type RewardHook = Box<dyn Fn(Duration) -> f32>;

/// Callbacks captured when an enemy is spawned.
///
/// Unset hooks mean "no notification" and "no reward".
#[derive(Default)]
pub struct SpawnHooks {
    /// Invoked with the enemy's identifier when its despawn completes.
    pub on_death: Option<DeathHook>,
    /// Invoked when a rewarded kill lands.
    pub reward: Option<RewardHook>,
}

impl fmt::Debug for SpawnHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnHooks")
            .field("on_death", &self.on_death.is_some())
            .field("reward", &self.reward.is_some())
            .finish()
    }
}

pub(crate) struct Enemy {
    id: EnemyId,
    state: LifeState,
    pose: Pose,
    profile: ProfileId,
    profile_speed: f32,
    source: Box<dyn MovementSource>,
    frozen: bool,
    chase_suspended: bool,
    in_attack_range: bool,
    locomotion: f32,
    hooks: SpawnHooks,
    despawn_task: Option<TaskHandle>,
    chase_task: Option<TaskHandle>,
}

impl fmt::Debug for Enemy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enemy")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("pose", &self.pose)
            .field("profile", &self.profile)
            .field("frozen", &self.frozen)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

/// Outcome of a kill that landed on an alive enemy.
pub(crate) struct Death {
    pub(crate) position: Vec3,
    pub(crate) impulse: Impulse,
    pub(crate) reward: Option<f32>,
}

impl Enemy {
    pub(crate) fn spawn(
        id: EnemyId,
        position: Vec3,
        profile: ProfileId,
        profile_speed: f32,
        mut source: Box<dyn MovementSource>,
        hooks: SpawnHooks,
        frozen: bool,
    ) -> Self {
        let pose = Pose::at(position);
        source.reset(pose);
        source.set_speed(profile_speed);
        let mut enemy = Self {
            id,
            state: LifeState::Alive,
            pose,
            profile,
            profile_speed,
            source,
            frozen,
            chase_suspended: false,
            in_attack_range: false,
            locomotion: 0.0,
            hooks,
            despawn_task: None,
            chase_task: None,
        };
        enemy.refresh_source();
        enemy
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.state == LifeState::Alive
    }

    /// Follows the movement source for one tick.
    pub(crate) fn follow(&mut self, dt: Duration, target: &TargetState, tuning: &LifecycleTuning) {
        if !self.is_alive() || !self.source.is_enabled() {
            return;
        }

        let distance = self.pose.position.distance(target.position);
        self.in_attack_range = distance < tuning.attack_radius && target.attackable;

        if distance < tuning.arrival_distance || distance >= tuning.tracking_range {
            self.locomotion = 0.0;
            return;
        }

        self.source.advance(dt, target.position);
        let previous = self.pose.position;
        let steered = self.source.pose();
        self.pose = Pose::new(
            steered.position + Vec3::Y * tuning.ground_offset,
            steered.rotation,
        );
        let travelled = self.pose.position.distance(previous);
        self.locomotion = (travelled * tuning.locomotion_scale).clamp(0.0, 1.0);
        self.source.reset(steered);
    }

    /// Moves an alive enemy into the dying state.
    ///
    /// Returns `None` when the enemy is already dying or despawned.
    pub(crate) fn kill(
        &mut self,
        hit: Hit,
        apply_reward: bool,
        active_elapsed: Duration,
        tuning: &LifecycleTuning,
    ) -> Option<Death> {
        if !self.is_alive() {
            return None;
        }

        self.state = LifeState::Dying;
        self.in_attack_range = false;
        self.locomotion = 0.0;
        self.refresh_source();

        let position = self.pose.position;
        let impulse = Impulse {
            origin: position - hit.direction,
            power: hit.power,
            radius: tuning.impulse_radius,
            upward: hit.height,
        };
        let reward = if apply_reward {
            self.hooks.reward.as_ref().map(|price| price(active_elapsed))
        } else {
            None
        };

        Some(Death {
            position,
            impulse,
            reward,
        })
    }

    /// Completes the despawn and fires the death hook.
    ///
    /// The hook is taken out of the enemy, so it can run at most once.
    pub(crate) fn finish_despawn(&mut self) {
        self.state = LifeState::Despawned;
        self.despawn_task = None;
        if let Some(mut on_death) = self.hooks.on_death.take() {
            on_death(self.id);
        }
    }

    pub(crate) fn set_despawn_task(&mut self, task: TaskHandle) {
        self.despawn_task = Some(task);
    }

    pub(crate) fn set_speed(&mut self, speed: Option<f32>) {
        self.source.set_speed(speed.unwrap_or(self.profile_speed));
    }

    /// Suspends the chase and returns the task that was previously pending.
    pub(crate) fn suspend_chase(&mut self, task: TaskHandle) -> Option<TaskHandle> {
        self.chase_suspended = true;
        self.refresh_source();
        self.chase_task.replace(task)
    }

    pub(crate) fn resume_chase(&mut self) {
        self.chase_suspended = false;
        self.chase_task = None;
        self.refresh_source();
    }

    /// Pending delayed actions owned by this enemy.
    pub(crate) fn pending_tasks(&self) -> impl Iterator<Item = TaskHandle> {
        self.despawn_task.into_iter().chain(self.chase_task)
    }

    pub(crate) fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
        if frozen {
            self.locomotion = 0.0;
        }
        self.refresh_source();
    }

    pub(crate) fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            state: self.state,
            pose: self.pose,
            profile: self.profile,
            speed: self.source.speed(),
            in_attack_range: self.in_attack_range,
            locomotion: self.locomotion,
            frozen: self.frozen,
        }
    }

    fn refresh_source(&mut self) {
        let steering = self.is_alive() && !self.frozen && !self.chase_suspended;
        self.source.set_enabled(steering);
    }
}

impl Member for Enemy {
    type Id = EnemyId;

    fn id(&self) -> EnemyId {
        self.id
    }

    fn position(&self) -> Vec3 {
        self.pose.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horde_core::Quat;
    use std::{cell::Cell, rc::Rc};

    #[derive(Debug)]
    struct Scripted {
        pose: Pose,
        step: Vec3,
        speed: f32,
        enabled: bool,
    }

    impl MovementSource for Scripted {
        fn advance(&mut self, _dt: Duration, _target: Vec3) {
            self.pose.position += self.step;
            self.pose.rotation = Quat::from_rotation_y(0.5);
        }

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

    fn enemy_at(position: Vec3, step: Vec3, hooks: SpawnHooks) -> Enemy {
        let source = Box::new(Scripted {
            pose: Pose::at(Vec3::ZERO),
            step,
            speed: 0.0,
            enabled: false,
        });
        Enemy::spawn(
            EnemyId::new(1),
            position,
            ProfileId::new(0),
            3.5,
            source,
            hooks,
            false,
        )
    }

    fn target(position: Vec3, attackable: bool) -> TargetState {
        TargetState {
            position,
            attackable,
        }
    }

    #[test]
    fn spawn_binds_source_to_spawn_pose_and_profile_speed() {
        let enemy = enemy_at(Vec3::new(4.0, 0.0, 2.0), Vec3::ZERO, SpawnHooks::default());
        let snapshot = enemy.snapshot();
        assert_eq!(snapshot.pose.position, Vec3::new(4.0, 0.0, 2.0));
        assert_eq!(snapshot.speed, 3.5);
        assert!(enemy.source.is_enabled());
    }

    #[test]
    fn follow_adopts_source_pose_and_applies_ground_offset() {
        let tuning = LifecycleTuning {
            ground_offset: 0.25,
            ..LifecycleTuning::default()
        };
        let mut enemy = enemy_at(Vec3::ZERO, Vec3::new(0.01, 0.0, 0.0), SpawnHooks::default());
        enemy.follow(
            Duration::from_millis(16),
            &target(Vec3::new(20.0, 0.0, 0.0), true),
            &tuning,
        );

        let snapshot = enemy.snapshot();
        assert!((snapshot.pose.position.x - 0.01).abs() < 1e-6);
        assert!((snapshot.pose.position.y - 0.25).abs() < 1e-6);
        assert_eq!(snapshot.pose.rotation, Quat::from_rotation_y(0.5));
        assert_eq!(snapshot.locomotion, 1.0);
        assert!(!snapshot.in_attack_range);
        assert_eq!(enemy.source.pose().position.y, 0.0, "source reset without offset");
    }

    #[test]
    fn attack_range_requires_an_attackable_target() {
        let tuning = LifecycleTuning::default();
        let mut enemy = enemy_at(Vec3::ZERO, Vec3::ZERO, SpawnHooks::default());

        enemy.follow(Duration::ZERO, &target(Vec3::new(1.5, 0.0, 0.0), false), &tuning);
        assert!(!enemy.snapshot().in_attack_range);

        enemy.follow(Duration::ZERO, &target(Vec3::new(1.5, 0.0, 0.0), true), &tuning);
        assert!(enemy.snapshot().in_attack_range);
    }

    #[test]
    fn arrived_enemy_holds_position() {
        let tuning = LifecycleTuning::default();
        let mut enemy = enemy_at(Vec3::ZERO, Vec3::new(0.3, 0.0, 0.0), SpawnHooks::default());
        enemy.follow(Duration::ZERO, &target(Vec3::new(0.5, 0.0, 0.0), true), &tuning);
        assert_eq!(enemy.snapshot().pose.position, Vec3::ZERO);
    }

    #[test]
    fn distant_target_is_not_tracked() {
        let tuning = LifecycleTuning::default();
        let mut enemy = enemy_at(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), SpawnHooks::default());
        enemy.follow(Duration::ZERO, &target(Vec3::new(25.0, 0.0, 0.0), true), &tuning);
        assert_eq!(enemy.snapshot().pose.position, Vec3::ZERO);
        assert_eq!(enemy.source.pose().position, Vec3::ZERO);

        enemy.follow(Duration::ZERO, &target(Vec3::new(24.5, 0.0, 0.0), true), &tuning);
        assert_eq!(enemy.snapshot().pose.position, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn frozen_enemy_does_not_follow_and_thaws_cleanly() {
        let tuning = LifecycleTuning::default();
        let mut enemy = enemy_at(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), SpawnHooks::default());
        enemy.set_frozen(true);
        enemy.follow(Duration::ZERO, &target(Vec3::new(20.0, 0.0, 0.0), true), &tuning);
        assert_eq!(enemy.snapshot().pose.position, Vec3::ZERO);
        assert!(enemy.is_alive());

        enemy.set_frozen(false);
        enemy.follow(Duration::ZERO, &target(Vec3::new(20.0, 0.0, 0.0), true), &tuning);
        assert_eq!(enemy.snapshot().pose.position, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn kill_prices_reward_once_and_refuses_reentry() {
        let priced = Rc::new(Cell::new(0));
        let counter = Rc::clone(&priced);
        let hooks = SpawnHooks {
            on_death: None,
            reward: Some(Box::new(move |_elapsed: Duration| {
                counter.set(counter.get() + 1);
                0.75
            })),
        };
        let tuning = LifecycleTuning::default();
        let mut enemy = enemy_at(Vec3::new(2.0, 0.0, 0.0), Vec3::ZERO, hooks);
        let hit = Hit {
            direction: Vec3::X,
            power: 12.0,
            height: 1.5,
        };

        let death = enemy
            .kill(hit, true, Duration::ZERO, &tuning)
            .expect("alive enemy dies");
        assert_eq!(death.reward, Some(0.75));
        assert_eq!(death.impulse.origin, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(death.impulse.radius, 50.0);
        assert!(!enemy.source.is_enabled());

        assert!(enemy.kill(hit, true, Duration::ZERO, &tuning).is_none());
        assert_eq!(priced.get(), 1);
    }

    #[test]
    fn unrewarded_kill_skips_pricing() {
        let hooks = SpawnHooks {
            on_death: None,
            reward: Some(Box::new(|_elapsed: Duration| -> f32 {
                panic!("reward must not be priced")
            })),
        };
        let tuning = LifecycleTuning::default();
        let mut enemy = enemy_at(Vec3::ZERO, Vec3::ZERO, hooks);
        let hit = Hit {
            direction: Vec3::Z,
            power: 1.0,
            height: 0.0,
        };
        let death = enemy
            .kill(hit, false, Duration::ZERO, &tuning)
            .expect("alive enemy dies");
        assert_eq!(death.reward, None);
    }

    #[test]
    fn death_hook_runs_once() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let hooks = SpawnHooks {
            on_death: Some(Box::new(move |_enemy: EnemyId| {
                counter.set(counter.get() + 1);
            })),
            reward: None,
        };
        let mut enemy = enemy_at(Vec3::ZERO, Vec3::ZERO, hooks);
        enemy.finish_despawn();
        enemy.finish_despawn();
        assert_eq!(calls.get(), 1);
        assert_eq!(enemy.snapshot().state, LifeState::Despawned);
    }

    #[test]
    fn profile_speed_is_restored() {
        let mut enemy = enemy_at(Vec3::ZERO, Vec3::ZERO, SpawnHooks::default());
        enemy.set_speed(Some(9.0));
        assert_eq!(enemy.snapshot().speed, 9.0);
        enemy.set_speed(None);
        assert_eq!(enemy.snapshot().speed, 3.5);
    }
}
