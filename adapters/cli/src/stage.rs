//! Stand-in collaborators for the headless simulation.

use std::time::Duration;

use glam::Vec2;
use horde_core::{
    EnemyId, MovementSource, Observer, ObstructionQuery, Pose, Quat, RewardSink,
    SpecialSpawnIndicator, Steering, Vec3,
};

use crate::config::{ArenaConfig, Pillar};

/// Player walking a circle around the arena centre.
#[derive(Clone, Debug)]
pub(crate) struct Patrol {
    radius: f32,
    angular_speed: f32,
    angle: f32,
}

impl Patrol {
    pub(crate) fn new(arena: &ArenaConfig) -> Self {
        let radius = arena.patrol_radius.max(0.0);
        let angular_speed = if radius > 0.0 {
            arena.patrol_speed / radius
        } else {
            0.0
        };
        Self {
            radius,
            angular_speed,
            angle: 0.0,
        }
    }

    pub(crate) fn advance(&mut self, dt: Duration) {
        self.angle = (self.angle + self.angular_speed * dt.as_secs_f32()) % std::f32::consts::TAU;
    }

    pub(crate) fn position(&self) -> Vec3 {
        Vec3::new(
            self.radius * self.angle.cos(),
            0.0,
            self.radius * self.angle.sin(),
        )
    }

    /// Walking direction on the ground plane.
    pub(crate) fn heading(&self) -> Vec3 {
        Vec3::new(-self.angle.sin(), 0.0, self.angle.cos())
    }
}

/// Camera hovering above the player and looking along the walking direction.
#[derive(Clone, Debug)]
pub(crate) struct FollowCamera {
    eye: Vec3,
    forward: Vec3,
    height: f32,
    half_fov_tan: f32,
}

impl FollowCamera {
    pub(crate) fn new(arena: &ArenaConfig) -> Self {
        let half_fov = (arena.field_of_view_degrees.clamp(1.0, 179.0) * 0.5).to_radians();
        Self {
            eye: Vec3::new(0.0, arena.camera_height, 0.0),
            forward: Vec3::Z,
            height: arena.camera_height,
            half_fov_tan: half_fov.tan(),
        }
    }

    pub(crate) fn follow(&mut self, player: &Patrol) {
        self.eye = player.position() + Vec3::Y * self.height;
        self.forward = player.heading().normalize_or_zero();
    }
}

impl Observer for FollowCamera {
    fn position(&self) -> Vec3 {
        self.eye
    }

    fn viewport_point(&self, point: Vec3) -> Vec3 {
        let offset = point - self.eye;
        let depth = offset.dot(self.forward);
        if depth <= f32::EPSILON {
            return Vec3::new(0.5, 0.5, depth);
        }
        let right = Vec3::new(self.forward.z, 0.0, -self.forward.x);
        let span = 2.0 * depth * self.half_fov_tan;
        Vec3::new(
            0.5 + offset.dot(right) / span,
            0.5 + offset.y / span,
            depth,
        )
    }
}

/// Pillars that block sight lines crossing them.
#[derive(Clone, Debug, Default)]
pub(crate) struct Pillars {
    pillars: Vec<Pillar>,
}

impl Pillars {
    pub(crate) fn new(pillars: &[Pillar]) -> Self {
        Self {
            pillars: pillars.to_vec(),
        }
    }
}

impl ObstructionQuery for Pillars {
    fn is_obstructed(&self, from: Vec3, to: Vec3) -> bool {
        let start = Vec2::new(from.x, from.z);
        let end = Vec2::new(to.x, to.z);
        self.pillars.iter().any(|pillar| {
            let centre = Vec2::from(pillar.centre);
            distance_to_segment(centre, start, end) < pillar.radius
        })
    }
}

fn distance_to_segment(point: Vec2, start: Vec2, end: Vec2) -> f32 {
    let segment = end - start;
    let length_squared = segment.length_squared();
    if length_squared <= f32::EPSILON {
        return point.distance(start);
    }
    let t = ((point - start).dot(segment) / length_squared).clamp(0.0, 1.0);
    point.distance(start + segment * t)
}

/// Steering that walks straight at the target.
#[derive(Debug, Default)]
pub(crate) struct DirectSteering;

impl Steering for DirectSteering {
    fn bind(&mut self, _enemy: EnemyId, pose: Pose, speed: f32) -> Box<dyn MovementSource> {
        Box::new(Walker {
            pose,
            speed,
            enabled: true,
        })
    }
}

#[derive(Debug)]
struct Walker {
    pose: Pose,
    speed: f32,
    enabled: bool,
}

impl MovementSource for Walker {
    fn advance(&mut self, dt: Duration, target: Vec3) {
        if !self.enabled {
            return;
        }
        let offset = Vec3::new(
            target.x - self.pose.position.x,
            0.0,
            target.z - self.pose.position.z,
        );
        let distance = offset.length();
        if distance <= f32::EPSILON {
            return;
        }
        let step = (self.speed * dt.as_secs_f32()).min(distance);
        let direction = offset / distance;
        self.pose = Pose::new(
            self.pose.position + direction * step,
            Quat::from_rotation_y(direction.x.atan2(direction.z)),
        );
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

/// Countdown the player tries to keep above zero by killing enemies.
#[derive(Clone, Debug)]
pub(crate) struct MatchClock {
    remaining: f32,
    granted: f32,
}

impl MatchClock {
    pub(crate) fn new(seconds: f32) -> Self {
        Self {
            remaining: seconds.max(0.0),
            granted: 0.0,
        }
    }

    pub(crate) fn drain(&mut self, dt: Duration) {
        self.remaining = (self.remaining - dt.as_secs_f32()).max(0.0);
    }

    pub(crate) fn expired(&self) -> bool {
        self.remaining <= 0.0
    }

    pub(crate) fn remaining(&self) -> f32 {
        self.remaining
    }

    pub(crate) fn granted(&self) -> f32 {
        self.granted
    }
}

impl RewardSink for MatchClock {
    fn add_time(&mut self, amount: f32, _position: Vec3) {
        self.remaining += amount;
        self.granted += amount;
    }
}

/// Progress readout of the special spawn gate.
#[derive(Clone, Debug, Default)]
pub(crate) struct GateGauge {
    fill: f32,
    cooldowns: u32,
}

impl GateGauge {
    pub(crate) fn fill(&self) -> f32 {
        self.fill
    }

    pub(crate) fn cooldowns(&self) -> u32 {
        self.cooldowns
    }
}

impl SpecialSpawnIndicator for GateGauge {
    fn set_progress(&mut self, fraction: f32) {
        self.fill = fraction;
    }

    fn cooldown_started(&mut self, _duration: Duration) {
        self.fill = 0.0;
        self.cooldowns = self.cooldowns.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> ArenaConfig {
        ArenaConfig::default()
    }

    #[test]
    fn camera_sees_ahead_but_not_behind() {
        let player = Patrol::new(&arena());
        let mut camera = FollowCamera::new(&arena());
        camera.follow(&player);

        let ahead = player.position() + player.heading() * 20.0;
        let viewport = camera.viewport_point(ahead);
        assert!((viewport.x - 0.5).abs() < 1e-4);
        assert!(viewport.z > 0.0);

        let behind = player.position() - player.heading() * 20.0;
        assert!(camera.viewport_point(behind).z < 0.0);
    }

    #[test]
    fn pillars_block_crossing_sight_lines() {
        let pillars = Pillars::new(&[Pillar {
            centre: [10.0, 0.0],
            radius: 2.0,
        }]);
        assert!(pillars.is_obstructed(Vec3::ZERO, Vec3::new(20.0, 5.0, 0.0)));
        assert!(!pillars.is_obstructed(Vec3::ZERO, Vec3::new(0.0, 5.0, 20.0)));
        assert!(!pillars.is_obstructed(Vec3::ZERO, Vec3::new(7.0, 0.0, 0.0)));
    }

    #[test]
    fn walker_stops_on_target() {
        let mut steering = DirectSteering;
        let mut source = steering.bind(EnemyId::new(0), Pose::at(Vec3::new(3.0, 0.0, 4.0)), 10.0);
        source.advance(Duration::from_secs(1), Vec3::ZERO);
        assert!(source.pose().position.length() < 1e-5);
    }

    #[test]
    fn rewards_extend_the_match_clock() {
        let mut clock = MatchClock::new(2.0);
        clock.drain(Duration::from_millis(1_500));
        clock.add_time(1.0, Vec3::ZERO);
        clock.drain(Duration::from_secs(1));
        assert!(!clock.expired());
        assert!((clock.remaining() - 0.5).abs() < 1e-5);
        assert_eq!(clock.granted(), 1.0);
        clock.drain(Duration::from_secs(1));
        assert!(clock.expired());
    }
}
