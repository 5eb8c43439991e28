#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the warship engine.
//!
//! This crate defines the vocabulary that connects the authoritative world,
//! the per-unit controllers, and the adapters that drive them. The world owns
//! every player, unit and tile; controllers only ever hold the stable
//! identifiers defined here and look entities up through the [`Game`] trait
//! each tick. Adapters mutate the reference world by submitting [`Command`]
//! values and observe the outcome through the [`Event`] stream.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier assigned to a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(u32);

impl PlayerId {
    /// Creates a new player identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a unit by the world's registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Opaque handle to a single map tile.
///
/// Tiles are only meaningful relative to the [`TerrainMap`] that produced
/// them; use [`TerrainMap::x`], [`TerrainMap::y`] and [`TerrainMap::tile`] to
/// convert between handles and coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileRef(u32);

impl TileRef {
    /// Wraps a raw tile index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Raw tile index within the owning map.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Classes of units that exist in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitClass {
    /// Armed naval unit driven by a warship controller.
    Warship,
    /// Troop carrier moving between coasts.
    Transport,
    /// Merchant vessel travelling toward a destination port.
    TradeShip,
    /// Coastal structure that trade ships sail between.
    Port,
}

impl UnitClass {
    /// Unit classes a warship considers when scanning for targets.
    pub const NAVAL_TARGETS: [UnitClass; 3] =
        [UnitClass::Transport, UnitClass::Warship, UnitClass::TradeShip];
}

/// Immutable representation of a single unit's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitSnapshot {
    /// Identifier allocated to the unit by the world.
    pub id: UnitId,
    /// Player currently owning the unit.
    pub owner: PlayerId,
    /// Class of the unit.
    pub class: UnitClass,
    /// Tile the unit currently occupies.
    pub tile: TileRef,
    /// Whether the unit still exists in the simulation.
    pub active: bool,
    /// Whether the unit has a health pool; units without one die to a single shell.
    pub has_health_pool: bool,
    /// Externally issued move order, if any.
    pub move_order: Option<TileRef>,
    /// Target annotation published by the unit's controller.
    pub warship_target: Option<UnitId>,
    /// Port a trade ship is sailing toward.
    pub destination_port: Option<UnitId>,
    /// Whether the unit is currently exempt from piracy.
    pub safe_from_piracy: bool,
}

/// Unit returned by a proximity query together with its squared distance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NearbyUnit {
    /// Snapshot of the unit found in range.
    pub unit: UnitSnapshot,
    /// Squared Euclidean distance between the query origin and the unit.
    pub distance_sq: u64,
}

/// Outcome of a single pathfinding request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathStep {
    /// The mover is already within the requested arrival distance.
    Completed,
    /// The mover should advance onto the provided tile.
    NextTile(TileRef),
    /// The search has not finished yet; ask again next tick.
    Pending,
    /// No route exists between the endpoints.
    PathNotFound,
}

/// Tuning values consumed by warship controllers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarshipConfig {
    /// Minimum number of ticks that must elapse between two shells.
    pub shell_attack_rate: u64,
    /// Radius, in tiles, of the hostile unit scan.
    pub targeting_range: u32,
    /// Side length, in tiles, of the square searched for patrol destinations.
    pub patrol_range: u32,
}

impl Default for WarshipConfig {
    fn default() -> Self {
        Self {
            shell_attack_rate: 20,
            targeting_range: 130,
            patrol_range: 100,
        }
    }
}

/// Shell launched by a warship toward a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShellAttack {
    /// Tile the shell was fired from.
    pub origin: TileRef,
    /// Player owning the firing unit.
    pub owner: PlayerId,
    /// Unit that fired the shell.
    pub source: UnitId,
    /// Unit the shell is aimed at.
    pub target: UnitId,
}

/// Simulation effects enqueued for the world to resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    /// A shell in flight toward a unit.
    Shell(ShellAttack),
}

/// Description of a unit placed directly into the world by an adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitPlacement {
    /// Player that will own the unit.
    pub owner: PlayerId,
    /// Class of the unit.
    pub class: UnitClass,
    /// Tile the unit starts on.
    pub tile: TileRef,
    /// Hit points; `None` marks a unit without a health pool.
    pub health: Option<u32>,
    /// Destination port for trade ships.
    pub destination_port: Option<UnitId>,
    /// Whether the unit starts out safe from piracy.
    pub safe_from_piracy: bool,
}

/// Commands that express the adapter-driven world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Registers a new player.
    AddPlayer {
        /// Identifier of the player.
        player: PlayerId,
        /// Display name of the player.
        name: String,
        /// Number of units the player may still build; `None` is unlimited.
        build_allowance: Option<u32>,
    },
    /// Marks two players as friendly toward each other.
    DeclareFriendship {
        /// First player of the pair.
        first: PlayerId,
        /// Second player of the pair.
        second: PlayerId,
    },
    /// Places a unit into the world without consulting build rules.
    PlaceUnit(UnitPlacement),
    /// Issues or clears a move order on a unit.
    IssueMoveOrder {
        /// Unit receiving the order.
        unit: UnitId,
        /// Destination tile, or `None` to clear the order.
        tile: Option<TileRef>,
    },
    /// Updates a unit's piracy exemption.
    SetSafeFromPiracy {
        /// Unit being updated.
        unit: UnitId,
        /// New value of the flag.
        safe: bool,
    },
    /// Moves a unit to a new tile, as a merchant route or transport would.
    RelocateUnit {
        /// Unit being moved.
        unit: UnitId,
        /// Tile the unit ends up on.
        tile: TileRef,
    },
    /// Removes a unit from the simulation.
    DestroyUnit {
        /// Unit being destroyed.
        unit: UnitId,
    },
    /// Resolves queued effects and advances the tick counter.
    Tick,
}

/// Events broadcast by the world after processing commands and controller calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Confirms that the world advanced to the provided tick.
    TimeAdvanced {
        /// Tick counter after advancing.
        tick: u64,
    },
    /// Confirms that a unit entered the world.
    UnitBuilt {
        /// Identifier assigned to the unit.
        unit: UnitId,
        /// Owner of the new unit.
        owner: PlayerId,
        /// Class of the new unit.
        class: UnitClass,
        /// Tile the unit was built on.
        tile: TileRef,
    },
    /// Reports a movement call, including moves onto the current tile.
    UnitMoved {
        /// Unit that moved.
        unit: UnitId,
        /// Tile before the move.
        from: TileRef,
        /// Tile after the move.
        to: TileRef,
    },
    /// Reports that a move order was issued or cleared.
    MoveOrderChanged {
        /// Unit whose order changed.
        unit: UnitId,
        /// New order destination.
        tile: Option<TileRef>,
    },
    /// Reports that ownership of a unit changed hands.
    UnitCaptured {
        /// Captured unit.
        unit: UnitId,
        /// Previous owner.
        from: PlayerId,
        /// New owner.
        to: PlayerId,
    },
    /// Reports that a shell was enqueued.
    ShellFired(ShellAttack),
    /// Reports that a shell struck a unit that survived.
    UnitDamaged {
        /// Unit that was hit.
        unit: UnitId,
        /// Hit points remaining.
        remaining: u32,
    },
    /// Reports that a unit left the simulation.
    UnitDestroyed {
        /// Unit that was destroyed.
        unit: UnitId,
    },
}

/// Read-only coordinate helpers over the tile map.
pub trait TerrainMap {
    /// Number of tile columns.
    fn width(&self) -> u32;

    /// Number of tile rows.
    fn height(&self) -> u32;

    /// Column of the provided tile.
    fn x(&self, tile: TileRef) -> i64;

    /// Row of the provided tile.
    fn y(&self, tile: TileRef) -> i64;

    /// Reports whether the coordinate lies inside the map.
    fn is_valid_coord(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width()) && y < i64::from(self.height())
    }

    /// Converts an in-bounds coordinate into a tile handle.
    fn tile(&self, x: i64, y: i64) -> Option<TileRef> {
        if !self.is_valid_coord(x, y) {
            return None;
        }
        let index = y * i64::from(self.width()) + x;
        u32::try_from(index).ok().map(TileRef::new)
    }

    /// Reports whether the tile is open water.
    fn is_ocean(&self, tile: TileRef) -> bool;

    /// Reports whether the tile borders terrain of another kind.
    fn is_shoreline(&self, tile: TileRef) -> bool;

    /// Manhattan distance between two tiles.
    fn manhattan_distance(&self, a: TileRef, b: TileRef) -> u64 {
        self.x(a).abs_diff(self.x(b)) + self.y(a).abs_diff(self.y(b))
    }
}

/// World surface consumed by per-unit controllers.
///
/// Reads always reflect the latest state, so controllers that tick later in
/// the same step observe the mutations made by earlier ones.
pub trait Game: TerrainMap {
    /// Reports whether the player exists.
    fn has_player(&self, player: PlayerId) -> bool;

    /// Display name of the player, if it exists.
    fn player_name(&self, player: PlayerId) -> Option<&str>;

    /// Current tick counter.
    fn ticks(&self) -> u64;

    /// Active tuning values.
    fn config(&self) -> WarshipConfig;

    /// Units of the given classes within `radius` tiles of `tile`.
    fn nearby_units(&self, tile: TileRef, radius: u32, classes: &[UnitClass]) -> Vec<NearbyUnit>;

    /// Snapshot of the unit, if the registry still knows it.
    fn unit(&self, unit: UnitId) -> Option<UnitSnapshot>;

    /// Active units of `class` owned by `player`.
    fn units_of_class(&self, player: PlayerId, class: UnitClass) -> Vec<UnitId>;

    /// Reports whether `player` is friendly toward `other`.
    fn is_friendly(&self, player: PlayerId, other: PlayerId) -> bool;

    /// Returns the tile a unit of `class` would be built on, or `None` when denied.
    fn can_build(&self, player: PlayerId, class: UnitClass, tile: TileRef) -> Option<TileRef>;

    /// Constructs a unit; callers must have obtained `tile` from [`Game::can_build`].
    fn build_unit(&mut self, player: PlayerId, class: UnitClass, tile: TileRef) -> UnitId;

    /// Transfers ownership of `unit` to `player`.
    fn capture_unit(&mut self, player: PlayerId, unit: UnitId);

    /// Moves `unit` onto `tile`.
    fn move_unit(&mut self, unit: UnitId, tile: TileRef);

    /// Replaces the unit's move order.
    fn set_move_order(&mut self, unit: UnitId, tile: Option<TileRef>);

    /// Publishes the controller's current target on the unit.
    fn set_warship_target(&mut self, unit: UnitId, target: Option<UnitId>);

    /// Enqueues a new simulation effect.
    fn add_execution(&mut self, effect: Effect);
}

/// Incremental route planner consulted once per movement decision.
pub trait PathFinder {
    /// Computes the next step from `from` toward `to`.
    ///
    /// `Completed` is returned once the Manhattan distance between the
    /// endpoints drops below `arrival_distance`.
    fn next_step<M>(
        &mut self,
        map: &M,
        from: TileRef,
        to: TileRef,
        arrival_distance: u64,
    ) -> PathStep
    where
        M: TerrainMap + ?Sized;
}

/// Per-tick behavior driven by the scheduler.
pub trait Execution<G: Game> {
    /// Binds the execution to the live world.
    fn init(&mut self, game: &G, ticks: u64);

    /// Advances the execution by one simulation step.
    fn tick(&mut self, game: &mut G, ticks: u64) -> Result<(), ExecutionError>;

    /// Whether the scheduler should keep ticking this execution.
    fn is_active(&self) -> bool;

    /// Whether the execution runs while players are still choosing spawns.
    fn active_during_spawn_phase(&self) -> bool;
}

/// Scheduler contract violations reported by executions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// `tick` was called before a successful `init`.
    #[error("execution ticked before init")]
    NotInitialized,
}
