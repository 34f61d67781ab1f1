use std::{fs, io, path::{Path, PathBuf}};

use horde_core::{
    GateTuning, LifecycleTuning, PacingTuning, PlacementTuning, SpawnVolume, Vec3, VoiceTuning,
};
use serde::Deserialize;
use thiserror::Error;

/// Failures raised while loading the simulation configuration.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration at {path}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The configuration file is not valid TOML for the expected layout.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is outside the range the simulation accepts.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Round stone column that blocks sight lines.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub(crate) struct Pillar {
    /// Ground-plane centre as `[x, z]`.
    pub(crate) centre: [f32; 2],
    /// Radius of the column.
    pub(crate) radius: f32,
}

/// Layout of the stand-in arena used by the headless simulation.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct ArenaConfig {
    /// Half of the square arena's edge length.
    pub(crate) half_extent: f32,
    /// Radius of the circle the player walks along.
    pub(crate) patrol_radius: f32,
    /// Player walking speed in units per second.
    pub(crate) patrol_speed: f32,
    /// Height of the camera above the player.
    pub(crate) camera_height: f32,
    /// Horizontal field of view of the camera, in degrees.
    pub(crate) field_of_view_degrees: f32,
    /// Seconds on the match clock when play starts.
    pub(crate) match_secs: f32,
    /// Sight-line blockers.
    pub(crate) pillars: Vec<Pillar>,
}

impl ArenaConfig {
    /// Spawn volume covering the whole arena floor.
    #[must_use]
    pub(crate) fn volume(&self) -> SpawnVolume {
        SpawnVolume::new(
            Vec3::ZERO,
            Vec3::new(self.half_extent, 0.0, self.half_extent),
        )
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            half_extent: 60.0,
            patrol_radius: 20.0,
            patrol_speed: 4.0,
            camera_height: 8.0,
            field_of_view_degrees: 70.0,
            match_secs: 60.0,
            pillars: vec![
                Pillar {
                    centre: [25.0, 25.0],
                    radius: 4.0,
                },
                Pillar {
                    centre: [-25.0, 25.0],
                    radius: 4.0,
                },
                Pillar {
                    centre: [25.0, -25.0],
                    radius: 4.0,
                },
                Pillar {
                    centre: [-25.0, -25.0],
                    radius: 4.0,
                },
            ],
        }
    }
}

/// Complete simulation configuration. Every section is optional.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct HordeConfig {
    pub(crate) placement: PlacementTuning,
    pub(crate) pacing: PacingTuning,
    pub(crate) gate: GateTuning,
    pub(crate) lifecycle: LifecycleTuning,
    pub(crate) voice: VoiceTuning,
    pub(crate) arena: ArenaConfig,
}

impl HordeConfig {
    /// Loads the configuration from `path`, or the shipped defaults when absent.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates a TOML document.
    pub(crate) fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.pacing.ramp_duration_secs > 0.0) {
            return Err(invalid("pacing.ramp_duration_secs must be positive"));
        }
        if !self.pacing.delay.is_finite() {
            return Err(invalid("pacing.delay bounds must be finite"));
        }
        if !self.pacing.wave_size.is_finite() {
            return Err(invalid("pacing.wave_size bounds must be finite"));
        }
        if self.pacing.max_enemy_count == 0 {
            return Err(invalid("pacing.max_enemy_count must be at least 1"));
        }
        if self.placement.min_target_distance > self.placement.max_target_distance {
            return Err(invalid(
                "placement.min_target_distance must not exceed placement.max_target_distance",
            ));
        }
        if !(self.gate.threshold_secs > 0.0) {
            return Err(invalid("gate.threshold_secs must be positive"));
        }
        if !(0.0..=1.0).contains(&self.gate.max_fill_fraction) {
            return Err(invalid("gate.max_fill_fraction must lie within 0..=1"));
        }
        if !(0.0..=1.0).contains(&self.voice.chance) {
            return Err(invalid("voice.chance must lie within 0..=1"));
        }
        if !(self.arena.half_extent > 0.0) {
            return Err(invalid("arena.half_extent must be positive"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Invalid(message.to_owned())
}
