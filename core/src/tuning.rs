//! Designer-facing tuning surfaces with the values the arena ships with.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::lerp;

/// Pair of bounds that a random draw is taken between.
///
/// The bounds may be stored in either order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RampSpan {
    /// First bound.
    pub first: f32,
    /// Second bound.
    pub second: f32,
}

impl RampSpan {
    /// Creates a span from its two bounds.
    #[must_use]
    pub const fn new(first: f32, second: f32) -> Self {
        Self { first, second }
    }

    /// Smaller of the two bounds.
    #[must_use]
    pub fn lower(&self) -> f32 {
        self.first.min(self.second)
    }

    /// Larger of the two bounds.
    #[must_use]
    pub fn upper(&self) -> f32 {
        self.first.max(self.second)
    }

    /// Reports whether both bounds are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.first.is_finite() && self.second.is_finite()
    }

    /// Reports whether `value` lies between the bounds, inclusive.
    #[must_use]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.lower() && value <= self.upper()
    }
}

/// Span whose bounds move from an early-game to a late-game setting.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RampRange {
    /// Span in effect when the match starts.
    pub early: RampSpan,
    /// Span in effect once the ramp completes.
    pub late: RampSpan,
}

impl RampRange {
    /// Creates a ramp between the two spans.
    #[must_use]
    pub const fn new(early: RampSpan, late: RampSpan) -> Self {
        Self { early, late }
    }

    /// Creates a ramp that stays on the same span throughout.
    #[must_use]
    pub const fn constant(span: RampSpan) -> Self {
        Self {
            early: span,
            late: span,
        }
    }

    /// Reports whether every bound of both spans is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.early.is_finite() && self.late.is_finite()
    }

    /// Interpolates each bound at progress `t`.
    #[must_use]
    pub fn at(&self, t: f32) -> RampSpan {
        RampSpan::new(
            lerp(self.early.first, self.late.first, t),
            lerp(self.early.second, self.late.second, t),
        )
    }
}

/// Scalar that moves from an early-game to a late-game value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueRamp {
    /// Value at the start of the match.
    pub early: f32,
    /// Value once the ramp completes.
    pub late: f32,
}

impl ValueRamp {
    /// Creates a ramp between the two values.
    #[must_use]
    pub const fn new(early: f32, late: f32) -> Self {
        Self { early, late }
    }

    /// Interpolated value at progress `t`.
    #[must_use]
    pub fn at(&self, t: f32) -> f32 {
        lerp(self.early, self.late, t)
    }
}

/// Constraints applied when searching for a hidden spawn point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementTuning {
    /// Maximum number of candidates drawn before accepting the last one.
    pub retry_budget: u32,
    /// Minimum ground-plane distance between a candidate and the volume centre.
    pub min_centre_distance: f32,
    /// Minimum distance between a candidate and the target.
    pub min_target_distance: f32,
    /// Maximum distance between a candidate and the target.
    pub max_target_distance: f32,
    /// Fraction of the viewport added beyond each screen edge when testing visibility.
    pub viewport_padding: f32,
    /// Height above the candidate the sight line to the observer starts from.
    pub sight_line_lift: f32,
}

impl Default for PlacementTuning {
    fn default() -> Self {
        Self {
            retry_budget: 100,
            min_centre_distance: 10.0,
            min_target_distance: 15.0,
            max_target_distance: 50.0,
            viewport_padding: 0.1,
            sight_line_lift: 1.0,
        }
    }
}

/// Parameters of the regular wave loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingTuning {
    /// Seconds of active play until the late-game settings are fully reached.
    pub ramp_duration_secs: f32,
    /// Delay between waves, in seconds.
    pub delay: RampRange,
    /// Number of enemies per wave.
    pub wave_size: RampRange,
    /// Waves spawned on the very first frame.
    pub starting_waves: u32,
    /// Population at which the loop stops spawning.
    pub max_enemy_count: usize,
    /// Replaces the ramped delay with [`Self::fast_spawn_delay_secs`].
    pub fast_spawn: bool,
    /// Delay used while [`Self::fast_spawn`] is set.
    pub fast_spawn_delay_secs: f32,
}

impl PacingTuning {
    /// Duration of the difficulty ramp.
    #[must_use]
    pub fn ramp_duration(&self) -> Duration {
        secs(self.ramp_duration_secs)
    }

    /// Delay used while fast spawning is enabled.
    #[must_use]
    pub fn fast_spawn_delay(&self) -> Duration {
        secs(self.fast_spawn_delay_secs)
    }
}

impl Default for PacingTuning {
    fn default() -> Self {
        Self {
            ramp_duration_secs: 180.0,
            delay: RampRange::new(RampSpan::new(1.0, 2.0), RampSpan::new(0.25, 0.5)),
            wave_size: RampRange::new(RampSpan::new(2.0, 4.0), RampSpan::new(3.0, 6.0)),
            starting_waves: 10,
            max_enemy_count: 100,
            fast_spawn: false,
            fast_spawn_delay_secs: 0.1,
        }
    }
}

/// Parameters of the special spawn gate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateTuning {
    /// Seconds the gate must stay armed before it fires.
    pub threshold_secs: f32,
    /// Seconds the gate stays disarmed after firing.
    pub cooldown_secs: f32,
    /// Largest fill fraction reported to the progress indicator.
    pub max_fill_fraction: f32,
}

impl GateTuning {
    /// Armed time required to fire.
    #[must_use]
    pub fn threshold(&self) -> Duration {
        secs(self.threshold_secs)
    }

    /// Cooldown after firing.
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        secs(self.cooldown_secs)
    }
}

impl Default for GateTuning {
    fn default() -> Self {
        Self {
            threshold_secs: 60.0,
            cooldown_secs: 5.0,
            max_fill_fraction: 0.8,
        }
    }
}

/// Broad enemy archetype that selects the visual variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyVariant {
    /// Bare-handed enemy.
    Brawler,
    /// Enemy carrying a weapon.
    Armed,
}

/// Stat block an enemy draws from at spawn.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyProfile {
    /// Default movement speed.
    pub speed: f32,
    /// Visual variant.
    pub variant: EnemyVariant,
}

/// Parameters of the per-enemy lifecycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleTuning {
    /// Seconds between death and despawn.
    pub despawn_delay_secs: f32,
    /// Distance below which an enemy counts as in attack range.
    pub attack_radius: f32,
    /// Distance below which an enemy stops adopting its movement source.
    pub arrival_distance: f32,
    /// Distance to the target below which an enemy starts tracking it.
    pub tracking_range: f32,
    /// Height added to the adopted pose so the physics body rests correctly.
    pub ground_offset: f32,
    /// Factor converting per-tick travel into the locomotion value.
    pub locomotion_scale: f32,
    /// Radius of the death impulse.
    pub impulse_radius: f32,
    /// Seconds of match time granted per kill.
    pub time_reward: ValueRamp,
    /// Seconds of active play until [`Self::time_reward`] reaches its late value.
    pub reward_ramp_secs: f32,
    /// Stat blocks enemies are spawned with.
    pub profiles: Vec<EnemyProfile>,
}

impl LifecycleTuning {
    /// Delay between death and despawn.
    #[must_use]
    pub fn despawn_delay(&self) -> Duration {
        secs(self.despawn_delay_secs)
    }

    /// Duration of the reward ramp.
    #[must_use]
    pub fn reward_ramp(&self) -> Duration {
        secs(self.reward_ramp_secs)
    }
}

impl Default for LifecycleTuning {
    fn default() -> Self {
        Self {
            despawn_delay_secs: 2.0,
            attack_radius: 2.0,
            arrival_distance: 1.0,
            tracking_range: 25.0,
            ground_offset: 0.0,
            locomotion_scale: 250.0,
            impulse_radius: 50.0,
            time_reward: ValueRamp::new(1.0, 0.2),
            reward_ramp_secs: 180.0,
            profiles: vec![
                EnemyProfile {
                    speed: 3.5,
                    variant: EnemyVariant::Brawler,
                },
                EnemyProfile {
                    speed: 4.5,
                    variant: EnemyVariant::Armed,
                },
            ],
        }
    }
}

/// Parameters of the idle voice-line loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceTuning {
    /// Seconds between voice-line rolls for each enemy.
    pub interval_secs: f32,
    /// Probability that a roll plays a clip.
    pub chance: f32,
    /// Number of idle clips available.
    pub idle_clips: u32,
}

impl VoiceTuning {
    /// Delay between voice-line rolls.
    #[must_use]
    pub fn interval(&self) -> Duration {
        secs(self.interval_secs)
    }
}

impl Default for VoiceTuning {
    fn default() -> Self {
        Self {
            interval_secs: 1.0,
            chance: 0.05,
            idle_clips: 4,
        }
    }
}

fn secs(value: f32) -> Duration {
    if value > 0.0 {
        Duration::try_from_secs_f32(value).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}
