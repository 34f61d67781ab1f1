#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Rejection sampler that finds spawn points hidden from the observer.

use horde_core::{Observer, ObstructionQuery, PlacementTuning, SpawnVolume, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Arena collaborators a spawning system needs to place actors.
#[derive(Clone, Copy)]
pub struct Surroundings<'a> {
    /// Region candidates are drawn from.
    pub volume: SpawnVolume,
    /// Position of the entity spawns are measured against.
    pub target: Vec3,
    /// Viewpoint spawns must stay hidden from.
    pub observer: &'a dyn Observer,
    /// Sight-line blocker service.
    pub obstruction: &'a dyn ObstructionQuery,
}

impl std::fmt::Debug for Surroundings<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surroundings")
            .field("volume", &self.volume)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Constraints for a single placement search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementRequest {
    /// Region candidates are drawn from.
    pub volume: SpawnVolume,
    /// Point the distance band is measured from.
    pub reference: Vec3,
    /// Smallest accepted distance to `reference`.
    pub min_distance: f32,
    /// Largest accepted distance to `reference`.
    pub max_distance: f32,
}

impl PlacementRequest {
    /// Builds a request around the surroundings' target using the tuned distance band.
    #[must_use]
    pub fn around_target(surroundings: &Surroundings<'_>, tuning: &PlacementTuning) -> Self {
        Self {
            volume: surroundings.volume,
            reference: surroundings.target,
            min_distance: tuning.min_target_distance,
            max_distance: tuning.max_target_distance,
        }
    }
}

/// Result of a placement search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Chosen point. The last candidate when the budget ran out.
    pub point: Vec3,
    /// Number of candidates drawn.
    pub attempts: u32,
    /// Whether `point` met every constraint.
    pub satisfied: bool,
}

/// Draws hidden spawn points using a seeded generator.
#[derive(Debug)]
pub struct PlacementSampler {
    tuning: PlacementTuning,
    rng: ChaCha8Rng,
}

impl PlacementSampler {
    /// Creates a sampler with the provided tuning and seed.
    #[must_use]
    pub fn new(tuning: PlacementTuning, seed: u64) -> Self {
        Self {
            tuning,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Tuning the sampler was created with.
    #[must_use]
    pub fn tuning(&self) -> &PlacementTuning {
        &self.tuning
    }

    /// Searches for a point satisfying the request.
    ///
    /// The search stops after the retry budget regardless of success; a zero
    /// budget still draws one candidate.
    pub fn sample(
        &mut self,
        request: &PlacementRequest,
        observer: &dyn Observer,
        obstruction: &dyn ObstructionQuery,
    ) -> Placement {
        let budget = self.tuning.retry_budget.max(1);
        let mut point = request.volume.centre;
        for attempt in 1..=budget {
            point = self.draw(&request.volume, request.reference.y);
            if self.accepts(request, point, observer, obstruction) {
                return Placement {
                    point,
                    attempts: attempt,
                    satisfied: true,
                };
            }
        }

        debug!(
            attempts = budget,
            x = point.x,
            z = point.z,
            "placement budget exhausted, using last candidate"
        );
        Placement {
            point,
            attempts: budget,
            satisfied: false,
        }
    }

    /// Samples around the surroundings' target with the tuned distance band.
    pub fn sample_near(&mut self, surroundings: &Surroundings<'_>) -> Placement {
        let request = PlacementRequest::around_target(surroundings, &self.tuning);
        self.sample(&request, surroundings.observer, surroundings.obstruction)
    }

    /// Reports whether the point can be seen by the observer.
    #[must_use]
    pub fn is_visible(
        &self,
        point: Vec3,
        observer: &dyn Observer,
        obstruction: &dyn ObstructionQuery,
    ) -> bool {
        let padding = self.tuning.viewport_padding;
        let viewport = observer.viewport_point(point);
        let on_screen = (-padding..=1.0 + padding).contains(&viewport.x)
            && (-padding..=1.0 + padding).contains(&viewport.y)
            && viewport.z > -padding;
        if !on_screen {
            return false;
        }

        let eye = point + Vec3::Y * self.tuning.sight_line_lift;
        !obstruction.is_obstructed(eye, observer.position())
    }

    fn accepts(
        &self,
        request: &PlacementRequest,
        point: Vec3,
        observer: &dyn Observer,
        obstruction: &dyn ObstructionQuery,
    ) -> bool {
        let distance = point.distance(request.reference);
        if distance < request.min_distance || distance > request.max_distance {
            return false;
        }
        if request.volume.planar_distance_from_centre(point) < self.tuning.min_centre_distance {
            return false;
        }
        !self.is_visible(point, observer, obstruction)
    }

    fn draw(&mut self, volume: &SpawnVolume, height: f32) -> Vec3 {
        let x = volume.centre.x + symmetric(&mut self.rng, volume.half_extents.x);
        let z = volume.centre.z + symmetric(&mut self.rng, volume.half_extents.z);
        Vec3::new(x, height, z)
    }
}

fn symmetric(rng: &mut ChaCha8Rng, extent: f32) -> f32 {
    let extent = if extent.is_finite() { extent.abs() } else { 0.0 };
    rng.gen_range(-extent..=extent)
}
