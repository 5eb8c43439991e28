#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Randomized, bounded search for open-water patrol destinations.
//!
//! Candidates are drawn uniformly from a square around a fixed center. A
//! candidate is accepted when it lies on the map, is ocean, and (during the
//! strict phase) does not touch land. Rejections accumulate until the policy's
//! attempt limit, at which point the square grows by half its side and the
//! counter resets. Once every expansion is spent the search restarts from the
//! original square with shoreline tiles allowed, and gives up after that pass.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use warship_core::{TerrainMap, TileRef};

/// Back-off limits applied by [`PatrolSiteSampler::sample`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplingPolicy {
    /// Rejected draws tolerated before the search square expands.
    pub attempts_before_expand: u32,
    /// Number of search squares tried per phase.
    pub max_expansions: u32,
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self {
            attempts_before_expand: 500,
            max_expansions: 3,
        }
    }
}

/// Acceptance rules in force while drawing candidates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SamplingPhase {
    /// Only ocean tiles away from any coast are accepted.
    Strict,
    /// Ocean tiles bordering land are accepted too.
    ShorelineRelaxed,
}

impl SamplingPhase {
    const ORDER: [SamplingPhase; 2] = [SamplingPhase::Strict, SamplingPhase::ShorelineRelaxed];

    fn accepts<M>(self, map: &M, tile: TileRef) -> bool
    where
        M: TerrainMap + ?Sized,
    {
        if !map.is_ocean(tile) {
            return false;
        }
        match self {
            Self::Strict => !map.is_shoreline(tile),
            Self::ShorelineRelaxed => true,
        }
    }
}

/// Accepted patrol destination and the search state that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PatrolSample {
    /// Accepted tile.
    pub tile: TileRef,
    /// Side length of the search square the tile was drawn from.
    pub range: u32,
    /// Number of expansions performed in the accepting phase.
    pub expansions: u32,
    /// Phase that accepted the tile.
    pub phase: SamplingPhase,
}

/// Deterministic patrol destination sampler anchored at a fixed center.
#[derive(Clone, Debug)]
pub struct PatrolSiteSampler {
    center: TileRef,
    base_range: u32,
    policy: SamplingPolicy,
    rng: ChaCha8Rng,
}

impl PatrolSiteSampler {
    /// Creates a sampler around `center` whose initial square has side `range`.
    #[must_use]
    pub fn new(center: TileRef, range: u32, seed: u64) -> Self {
        Self {
            center,
            base_range: range,
            policy: SamplingPolicy::default(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Replaces the back-off policy.
    #[must_use]
    pub fn with_policy(mut self, policy: SamplingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Center every candidate is drawn around.
    #[must_use]
    pub const fn center(&self) -> TileRef {
        self.center
    }

    /// Draws candidates until one is accepted or every phase is exhausted.
    pub fn sample<M>(&mut self, map: &M) -> Option<PatrolSample>
    where
        M: TerrainMap + ?Sized,
    {
        for phase in SamplingPhase::ORDER {
            if let Some(sample) = self.search_phase(map, phase) {
                return Some(sample);
            }
            tracing::warn!(?phase, center = self.center.get(), "no patrol tile found");
        }
        None
    }

    fn search_phase<M>(&mut self, map: &M, phase: SamplingPhase) -> Option<PatrolSample>
    where
        M: TerrainMap + ?Sized,
    {
        let center_x = map.x(self.center);
        let center_y = map.y(self.center);
        let mut range = self.base_range;
        let mut expansions = 0;
        let mut attempts = 0;

        while expansions < self.policy.max_expansions {
            let half = i64::from(range / 2);
            let x = center_x + self.rng.gen_range(-half..=half);
            let y = center_y + self.rng.gen_range(-half..=half);

            if let Some(tile) = map.tile(x, y).filter(|tile| phase.accepts(map, *tile)) {
                return Some(PatrolSample {
                    tile,
                    range,
                    expansions,
                    phase,
                });
            }

            attempts += 1;
            if attempts >= self.policy.attempts_before_expand {
                expansions += 1;
                attempts = 0;
                range = range.saturating_add(range / 2);
            }
        }

        None
    }
}
