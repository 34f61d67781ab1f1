#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spawn pacer that releases enemy waves at a difficulty-ramped cadence.

use std::time::Duration;

use horde_core::{
    elapsed_in, ramp_ratio,
    schedule::{Scheduler, TaskHandle},
    Command, Event, PacingTuning, PlacementTuning, PlayState, ProfileId, RampSpan,
};
use horde_system_placement::{PlacementSampler, Surroundings};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Debug)]
pub struct Config {
    pacing: PacingTuning,
    placement: PlacementTuning,
    profile_count: usize,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration.
    ///
    /// `profile_count` is the size of the world's enemy profile table.
    #[must_use]
    pub fn new(
        pacing: PacingTuning,
        placement: PlacementTuning,
        profile_count: usize,
        rng_seed: u64,
    ) -> Self {
        Self {
            pacing,
            placement,
            profile_count,
            rng_seed,
        }
    }
}

/// Step of the pacing loop the system is waiting in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Starting waves have not been released yet.
    Starting,
    /// Counting down the delay before the next wave.
    Waiting,
    /// Delay elapsed while paused; the wave goes out once unpaused.
    AwaitingResume,
    /// Population reached the cap; polling until it drops below.
    Capped,
    /// Loop cancelled for good.
    Frozen,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct NextWave;

/// Pure system that turns elapsed time into enemy spawn commands.
#[derive(Debug)]
pub struct Spawning {
    tuning: PacingTuning,
    sampler: PlacementSampler,
    rng: ChaCha8Rng,
    scheduler: Scheduler<NextWave>,
    wave_task: Option<TaskHandle>,
    profile_count: usize,
    phase: Phase,
    paused: bool,
    elapsed_active: Duration,
    waves_released: u64,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.rng_seed);
        let sampler = PlacementSampler::new(config.placement, rng.gen());
        Self {
            tuning: config.pacing,
            sampler,
            rng,
            scheduler: Scheduler::new(),
            wave_task: None,
            profile_count: config.profile_count,
            phase: Phase::Starting,
            paused: false,
            elapsed_active: Duration::ZERO,
            waves_released: 0,
        }
    }

    /// Consumes events and immutable views to emit spawn commands.
    ///
    /// `population` is the number of enemies currently registered in the
    /// world, dying ones included.
    pub fn handle(
        &mut self,
        events: &[Event],
        play_state: PlayState,
        population: usize,
        surroundings: &Surroundings<'_>,
        out: &mut Vec<Command>,
    ) {
        if self.phase == Phase::Frozen {
            return;
        }
        if events
            .iter()
            .any(|event| matches!(event, Event::PopulationFrozen))
        {
            self.freeze();
            return;
        }

        let dt = elapsed_in(events);
        if play_state == PlayState::Active {
            self.elapsed_active = self.elapsed_active.saturating_add(dt);
        }

        if self.phase == Phase::Starting {
            for _ in 0..self.tuning.starting_waves {
                let _ = self.release_wave(surroundings, out);
            }
            self.schedule_next_wave();
            return;
        }

        let mut due = Vec::new();
        self.scheduler.advance(dt, &mut due);
        if !due.is_empty() {
            self.wave_task = None;
            self.phase = Phase::AwaitingResume;
        }

        match self.phase {
            Phase::AwaitingResume if !self.paused => {
                if population >= self.tuning.max_enemy_count {
                    debug!(population, "population at cap, skipping wave");
                    self.phase = Phase::Capped;
                    return;
                }
                let released = self.release_wave(surroundings, out);
                if population.saturating_add(released) >= self.tuning.max_enemy_count {
                    debug!(
                        population,
                        released,
                        cap = self.tuning.max_enemy_count,
                        "population cap reached"
                    );
                    self.phase = Phase::Capped;
                } else {
                    self.schedule_next_wave();
                }
            }
            Phase::Capped if population < self.tuning.max_enemy_count => {
                debug!(population, "population below cap, resuming waves");
                self.schedule_next_wave();
            }
            _ => {}
        }
    }

    /// Pauses or resumes wave releases. The delay countdown keeps running.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Whether wave releases are paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Cancels the pacing loop permanently.
    pub fn freeze(&mut self) {
        if self.phase != Phase::Frozen {
            debug!(waves = self.waves_released, "spawning frozen");
        }
        self.scheduler.clear();
        self.wave_task = None;
        self.phase = Phase::Frozen;
    }

    /// Step of the pacing loop the system is in.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Active play time the difficulty ramp is measured against.
    #[must_use]
    pub fn elapsed_active(&self) -> Duration {
        self.elapsed_active
    }

    /// Time left before the next wave, while one is scheduled.
    #[must_use]
    pub fn pending_delay(&self) -> Option<Duration> {
        if self.phase != Phase::Waiting {
            return None;
        }
        self.scheduler.remaining(self.wave_task?)
    }

    /// Number of waves released so far, starting waves included.
    #[must_use]
    pub fn waves_released(&self) -> u64 {
        self.waves_released
    }

    fn ramp(&self) -> f32 {
        ramp_ratio(self.elapsed_active, self.tuning.ramp_duration())
    }

    fn schedule_next_wave(&mut self) {
        let delay = if self.tuning.fast_spawn {
            self.tuning.fast_spawn_delay()
        } else {
            let span = self.tuning.delay.at(self.ramp());
            let secs = draw_between(&mut self.rng, span).max(0.0);
            Duration::try_from_secs_f32(secs).unwrap_or(Duration::MAX)
        };
        trace!(delay_ms = delay.as_millis() as u64, "next wave scheduled");
        self.wave_task = Some(self.scheduler.schedule(delay, NextWave));
        self.phase = Phase::Waiting;
    }

    /// Emits one wave and returns the number of enemies it contained.
    fn release_wave(&mut self, surroundings: &Surroundings<'_>, out: &mut Vec<Command>) -> usize {
        let span = self.tuning.wave_size.at(self.ramp());
        let count = draw_between(&mut self.rng, span).round().max(0.0) as usize;
        self.waves_released = self.waves_released.saturating_add(1);
        if count == 0 || self.profile_count == 0 {
            trace!(count, profiles = self.profile_count, "empty wave");
            return 0;
        }

        let placement = self.sampler.sample_near(surroundings);
        for _ in 0..count {
            let index = self.rng.gen_range(0..self.profile_count);
            let profile = ProfileId::new(u32::try_from(index).unwrap_or(u32::MAX));
            out.push(Command::SpawnEnemy {
                position: placement.point,
                profile,
            });
        }

        debug!(
            count,
            x = placement.point.x,
            z = placement.point.z,
            hidden = placement.satisfied,
            "wave released"
        );
        count
    }
}

/// Uniform draw between the span's bounds, in whichever order they are stored.
fn draw_between(rng: &mut ChaCha8Rng, span: RampSpan) -> f32 {
    let (lower, upper) = (span.lower(), span.upper());
    if lower < upper && (upper - lower).is_finite() {
        rng.gen_range(lower..=upper)
    } else {
        lower
    }
}
