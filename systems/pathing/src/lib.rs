#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-tick bridge between a pathfinder and unit movement.
//!
//! The movement layer expects an explicit move call from every active unit on
//! every tick, so waiting and arriving both translate into a move onto the
//! unit's current tile. Only an unreachable destination leaves the unit
//! untouched.

use warship_core::{Game, PathFinder, PathStep, TileRef, UnitId};

/// Arrival distance requiring the mover to stand on the destination tile.
pub const EXACT_ARRIVAL: u64 = 1;

/// Movement performed in response to one pathfinding query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// The mover is within the arrival distance and held its position.
    Arrived,
    /// The mover advanced onto the contained tile.
    Advanced(TileRef),
    /// The route is still being computed; the mover held its position.
    Waiting,
    /// No route exists; the mover was not moved.
    Unreachable,
}

impl StepOutcome {
    /// Tile the mover occupies after the step, given where it started.
    #[must_use]
    pub const fn position(self, from: TileRef) -> TileRef {
        match self {
            Self::Advanced(tile) => tile,
            Self::Arrived | Self::Waiting | Self::Unreachable => from,
        }
    }
}

/// Owns a pathfinder and turns its answers into unit moves.
#[derive(Clone, Debug, Default)]
pub struct PathIntegration<P> {
    pathfinder: P,
    queries: u64,
}

impl<P> PathIntegration<P>
where
    P: PathFinder,
{
    /// Wraps the provided pathfinder.
    #[must_use]
    pub fn new(pathfinder: P) -> Self {
        Self {
            pathfinder,
            queries: 0,
        }
    }

    /// Queries one step for `unit` standing on `from` and applies the resulting move.
    pub fn step<G>(
        &mut self,
        game: &mut G,
        unit: UnitId,
        from: TileRef,
        destination: TileRef,
        arrival_distance: u64,
    ) -> StepOutcome
    where
        G: Game + ?Sized,
    {
        self.queries = self.queries.saturating_add(1);
        match self
            .pathfinder
            .next_step(&*game, from, destination, arrival_distance)
        {
            PathStep::Completed => {
                game.move_unit(unit, from);
                StepOutcome::Arrived
            }
            PathStep::NextTile(tile) => {
                game.move_unit(unit, tile);
                StepOutcome::Advanced(tile)
            }
            PathStep::Pending => {
                game.move_unit(unit, from);
                StepOutcome::Waiting
            }
            PathStep::PathNotFound => StepOutcome::Unreachable,
        }
    }

    /// Total number of pathfinding queries issued through this integration.
    #[must_use]
    pub const fn queries(&self) -> u64 {
        self.queries
    }

    /// Read access to the wrapped pathfinder.
    #[must_use]
    pub const fn pathfinder(&self) -> &P {
        &self.pathfinder
    }
}
