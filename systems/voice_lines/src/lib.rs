#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Idle chatter for alive enemies.

use std::{collections::BTreeMap, time::Duration};

use horde_core::{
    elapsed_in,
    schedule::{Scheduler, TaskHandle},
    ClipId, Command, EnemyId, Event, PlayState, VoiceTuning,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::trace;

/// Configuration parameters required to construct the voice line system.
#[derive(Clone, Debug)]
pub struct Config {
    tuning: VoiceTuning,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration.
    #[must_use]
    pub fn new(tuning: VoiceTuning, rng_seed: u64) -> Self {
        Self { tuning, rng_seed }
    }
}

/// Pure system that rolls an idle voice line for every alive enemy on a fixed cadence.
#[derive(Debug)]
pub struct VoiceLines {
    tuning: VoiceTuning,
    rng: ChaCha8Rng,
    scheduler: Scheduler<EnemyId>,
    speakers: BTreeMap<EnemyId, TaskHandle>,
}

impl VoiceLines {
    /// Creates a new voice line system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            tuning: config.tuning,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            scheduler: Scheduler::new(),
            speakers: BTreeMap::new(),
        }
    }

    /// Tracks the population from events and emits voice line commands.
    ///
    /// Newly spawned enemies roll immediately, then once per interval until
    /// they die.
    pub fn handle(&mut self, events: &[Event], play_state: PlayState, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::EnemySpawned { enemy, .. } => self.enlist(*enemy, Duration::ZERO),
                Event::EnemyKilled { enemy, .. } | Event::EnemyDespawned { enemy } => {
                    self.dismiss(*enemy);
                }
                Event::PopulationReset => {
                    self.scheduler.clear();
                    self.speakers.clear();
                }
                _ => {}
            }
        }

        let mut due = Vec::new();
        self.scheduler.advance(elapsed_in(events), &mut due);
        for enemy in due {
            let _ = self.speakers.remove(&enemy);
            self.enlist(enemy, self.tuning.interval());
            if play_state != PlayState::Active || self.tuning.idle_clips == 0 {
                continue;
            }
            if self.rng.gen::<f32>() < self.tuning.chance {
                let clip = ClipId::new(self.rng.gen_range(0..self.tuning.idle_clips));
                trace!(enemy = enemy.get(), clip = clip.get(), "idle voice line");
                out.push(Command::PlayVoiceLine { enemy, clip });
            }
        }
    }

    /// Number of enemies the system is rolling voice lines for.
    #[must_use]
    pub fn speaker_count(&self) -> usize {
        self.speakers.len()
    }

    fn enlist(&mut self, enemy: EnemyId, delay: Duration) {
        if self.speakers.contains_key(&enemy) {
            return;
        }
        let task = self.scheduler.schedule(delay, enemy);
        let _ = self.speakers.insert(enemy, task);
    }

    fn dismiss(&mut self, enemy: EnemyId) {
        if let Some(task) = self.speakers.remove(&enemy) {
            let _ = self.scheduler.cancel(task);
        }
    }
}
