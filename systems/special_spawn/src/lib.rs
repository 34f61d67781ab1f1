#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Timed gate that releases a granny after a stretch of active play.

use std::time::Duration;

use horde_core::{
    elapsed_in, lerp, ramp_ratio, schedule::Scheduler, Command, Event, GateTuning,
    PlacementTuning, PlayState, SpecialSpawnIndicator,
};
use horde_system_placement::{PlacementSampler, Surroundings};
use tracing::debug;

/// Configuration parameters required to construct the special spawn gate.
#[derive(Clone, Debug)]
pub struct Config {
    gate: GateTuning,
    placement: PlacementTuning,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration.
    #[must_use]
    pub fn new(gate: GateTuning, placement: PlacementTuning, rng_seed: u64) -> Self {
        Self {
            gate,
            placement,
            rng_seed,
        }
    }
}

/// Whether the gate is accumulating time or recovering from a release.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateState {
    /// Counting active time towards the threshold.
    Armed {
        /// Active time accumulated since the gate was armed.
        elapsed: Duration,
    },
    /// Waiting for the cooldown to finish.
    Cooldown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Rearm;

/// Pure system that emits a granny spawn once enough active time passed.
#[derive(Debug)]
pub struct SpecialSpawn {
    tuning: GateTuning,
    sampler: PlacementSampler,
    scheduler: Scheduler<Rearm>,
    state: GateState,
    releases: u32,
}

impl SpecialSpawn {
    /// Creates an armed gate.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            tuning: config.gate,
            sampler: PlacementSampler::new(config.placement, config.rng_seed),
            scheduler: Scheduler::new(),
            state: GateState::Armed {
                elapsed: Duration::ZERO,
            },
            releases: 0,
        }
    }

    /// Consumes events, reports progress and emits the granny spawn command.
    ///
    /// The cooldown runs on simulated time regardless of the play state;
    /// the armed countdown only advances while play is active.
    pub fn handle(
        &mut self,
        events: &[Event],
        play_state: PlayState,
        surroundings: &Surroundings<'_>,
        indicator: &mut dyn SpecialSpawnIndicator,
        out: &mut Vec<Command>,
    ) {
        let dt = elapsed_in(events);

        let mut due = Vec::new();
        self.scheduler.advance(dt, &mut due);
        if !due.is_empty() {
            debug!("special spawn re-armed");
            self.state = GateState::Armed {
                elapsed: Duration::ZERO,
            };
            return;
        }

        if play_state != PlayState::Active {
            return;
        }

        let GateState::Armed { elapsed } = self.state else {
            return;
        };
        let elapsed = elapsed.saturating_add(dt);
        let threshold = self.tuning.threshold();
        indicator.set_progress(lerp(
            0.0,
            self.tuning.max_fill_fraction,
            ramp_ratio(elapsed, threshold),
        ));

        if elapsed < threshold {
            self.state = GateState::Armed { elapsed };
            return;
        }

        let placement = self.sampler.sample_near(surroundings);
        out.push(Command::SpawnGranny {
            position: placement.point,
        });
        self.releases = self.releases.saturating_add(1);

        let cooldown = self.tuning.cooldown();
        indicator.cooldown_started(cooldown);
        let _ = self.scheduler.schedule(cooldown, Rearm);
        self.state = GateState::Cooldown;
        debug!(
            x = placement.point.x,
            z = placement.point.z,
            cooldown_ms = cooldown.as_millis() as u64,
            "special spawn released"
        );
    }

    /// Current gate state.
    #[must_use]
    pub fn state(&self) -> GateState {
        self.state
    }

    /// Number of grannies the gate released.
    #[must_use]
    pub fn releases(&self) -> u32 {
        self.releases
    }
}
