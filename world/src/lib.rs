#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative in-memory world used to exercise naval controllers.
//!
//! The world owns the tile map, the player roster and the unit registry.
//! Adapters mutate it through [`apply`], controllers through the
//! [`warship_core::Game`] trait. Every observable mutation is appended to an
//! internal journal that adapters collect with [`drain_events`].

mod navigation;

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tracing::debug;
use warship_core::{
    Command, Effect, Event, Game, NearbyUnit, PlayerId, ShellAttack, TerrainMap, TileRef,
    UnitClass, UnitId, UnitPlacement, UnitSnapshot, WarshipConfig,
};

pub use navigation::{OceanPathFinder, DEFAULT_ITERATION_BUDGET};

/// Damage dealt by a single shell to a unit with a health pool.
pub const SHELL_DAMAGE: u32 = 250;

const WARSHIP_HEALTH: u32 = 1_000;
const PORT_HEALTH: u32 = 2_000;

/// Kind of terrain covering a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Terrain {
    /// Navigable open water.
    Ocean,
    /// Solid ground.
    Land,
}

/// Reasons an ASCII map description may be rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MapError {
    /// The description contained no rows.
    #[error("map has no rows")]
    Empty,
    /// A row's width differs from the first row.
    #[error("row {row} has {found} tiles, expected {expected}")]
    RaggedRow {
        /// Zero-based index of the offending row.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// A glyph other than `.` or `#` was found.
    #[error("unknown glyph {glyph:?} at column {column}, row {row}")]
    UnknownGlyph {
        /// Offending character.
        glyph: char,
        /// Zero-based column of the glyph.
        column: usize,
        /// Zero-based row of the glyph.
        row: usize,
    },
    /// The map exceeds the addressable tile count.
    #[error("map dimensions exceed the addressable tile range")]
    TooLarge,
}

#[derive(Clone, Debug)]
struct PlayerRecord {
    name: String,
    build_allowance: Option<u32>,
    friends: BTreeSet<PlayerId>,
}

#[derive(Clone, Debug)]
struct UnitRecord {
    id: UnitId,
    owner: PlayerId,
    class: UnitClass,
    tile: TileRef,
    active: bool,
    health: Option<u32>,
    move_order: Option<TileRef>,
    warship_target: Option<UnitId>,
    destination_port: Option<UnitId>,
    safe_from_piracy: bool,
}

impl UnitRecord {
    fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            owner: self.owner,
            class: self.class,
            tile: self.tile,
            active: self.active,
            has_health_pool: self.health.is_some(),
            move_order: self.move_order,
            warship_target: self.warship_target,
            destination_port: self.destination_port,
            safe_from_piracy: self.safe_from_piracy,
        }
    }
}

/// Represents the authoritative naval world state.
#[derive(Clone, Debug)]
pub struct World {
    width: u32,
    height: u32,
    terrain: Vec<Terrain>,
    shoreline: Vec<bool>,
    config: WarshipConfig,
    players: BTreeMap<PlayerId, PlayerRecord>,
    units: BTreeMap<UnitId, UnitRecord>,
    next_unit: u32,
    effects: Vec<Effect>,
    journal: Vec<Event>,
    tick_index: u64,
}

impl World {
    /// Creates a world made entirely of open water.
    #[must_use]
    pub fn open_sea(width: u32, height: u32, config: WarshipConfig) -> Self {
        let count = (width as usize).saturating_mul(height as usize);
        Self::with_terrain(width, height, vec![Terrain::Ocean; count], config)
    }

    /// Parses a map where `.` is ocean and `#` is land, one row per line.
    pub fn from_ascii(rows: &str, config: WarshipConfig) -> Result<Self, MapError> {
        let lines: Vec<&str> = rows
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let Some(first) = lines.first() else {
            return Err(MapError::Empty);
        };
        let expected = first.chars().count();
        if expected == 0 {
            return Err(MapError::Empty);
        }

        let mut terrain = Vec::with_capacity(expected * lines.len());
        for (row, line) in lines.iter().enumerate() {
            let found = line.chars().count();
            if found != expected {
                return Err(MapError::RaggedRow {
                    row,
                    expected,
                    found,
                });
            }
            for (column, glyph) in line.chars().enumerate() {
                terrain.push(match glyph {
                    '.' => Terrain::Ocean,
                    '#' => Terrain::Land,
                    other => {
                        return Err(MapError::UnknownGlyph {
                            glyph: other,
                            column,
                            row,
                        })
                    }
                });
            }
        }

        let width = u32::try_from(expected).map_err(|_| MapError::TooLarge)?;
        let height = u32::try_from(lines.len()).map_err(|_| MapError::TooLarge)?;
        if u32::try_from(terrain.len()).is_err() {
            return Err(MapError::TooLarge);
        }
        Ok(Self::with_terrain(width, height, terrain, config))
    }

    fn with_terrain(width: u32, height: u32, terrain: Vec<Terrain>, config: WarshipConfig) -> Self {
        let mut world = Self {
            width,
            height,
            shoreline: vec![false; terrain.len()],
            terrain,
            config,
            players: BTreeMap::new(),
            units: BTreeMap::new(),
            next_unit: 1,
            effects: Vec::new(),
            journal: Vec::new(),
            tick_index: 0,
        };
        world.derive_shoreline();
        world
    }

    fn derive_shoreline(&mut self) {
        for index in 0..self.terrain.len() {
            let Ok(raw) = u32::try_from(index) else {
                continue;
            };
            let tile = TileRef::new(raw);
            let kind = self.terrain[index];
            let (x, y) = (self.x(tile), self.y(tile));
            let borders_other = [(0, -1), (1, 0), (0, 1), (-1, 0)]
                .into_iter()
                .filter_map(|(dx, dy)| self.tile(x + dx, y + dy))
                .any(|neighbor| self.terrain_at(neighbor) != Some(kind));
            self.shoreline[index] = borders_other;
        }
    }

    fn terrain_at(&self, tile: TileRef) -> Option<Terrain> {
        self.terrain.get(tile.get() as usize).copied()
    }

    fn register(&mut self, placement: UnitPlacement) -> UnitId {
        let id = UnitId::new(self.next_unit);
        self.next_unit = self.next_unit.saturating_add(1);
        let _ = self.units.insert(
            id,
            UnitRecord {
                id,
                owner: placement.owner,
                class: placement.class,
                tile: placement.tile,
                active: true,
                health: placement.health,
                move_order: None,
                warship_target: None,
                destination_port: placement.destination_port,
                safe_from_piracy: placement.safe_from_piracy,
            },
        );
        self.journal.push(Event::UnitBuilt {
            unit: id,
            owner: placement.owner,
            class: placement.class,
            tile: placement.tile,
        });
        id
    }

    fn active_unit_mut(&mut self, unit: UnitId) -> Option<&mut UnitRecord> {
        self.units.get_mut(&unit).filter(|record| record.active)
    }

    fn destroy(&mut self, unit: UnitId) {
        if let Some(record) = self.active_unit_mut(unit) {
            record.active = false;
            record.move_order = None;
            record.warship_target = None;
            self.journal.push(Event::UnitDestroyed { unit });
            debug!(unit = unit.get(), "unit destroyed");
        }
    }

    fn resolve_shell(&mut self, shell: ShellAttack) {
        let Some(record) = self.active_unit_mut(shell.target) else {
            return;
        };

        match record.health {
            None => self.destroy(shell.target),
            Some(health) => {
                let remaining = health.saturating_sub(SHELL_DAMAGE);
                record.health = Some(remaining);
                if remaining == 0 {
                    self.destroy(shell.target);
                } else {
                    self.journal.push(Event::UnitDamaged {
                        unit: shell.target,
                        remaining,
                    });
                }
            }
        }
    }

    fn resolve_effects(&mut self) {
        let effects = std::mem::take(&mut self.effects);
        for effect in effects {
            match effect {
                Effect::Shell(shell) => self.resolve_shell(shell),
            }
        }
    }
}

impl TerrainMap for World {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn x(&self, tile: TileRef) -> i64 {
        if self.width == 0 {
            return 0;
        }
        i64::from(tile.get() % self.width)
    }

    fn y(&self, tile: TileRef) -> i64 {
        if self.width == 0 {
            return 0;
        }
        i64::from(tile.get() / self.width)
    }

    fn is_ocean(&self, tile: TileRef) -> bool {
        self.terrain_at(tile) == Some(Terrain::Ocean)
    }

    fn is_shoreline(&self, tile: TileRef) -> bool {
        self.shoreline
            .get(tile.get() as usize)
            .copied()
            .unwrap_or(false)
    }
}

impl Game for World {
    fn has_player(&self, player: PlayerId) -> bool {
        self.players.contains_key(&player)
    }

    fn player_name(&self, player: PlayerId) -> Option<&str> {
        self.players.get(&player).map(|record| record.name.as_str())
    }

    fn ticks(&self) -> u64 {
        self.tick_index
    }

    fn config(&self) -> WarshipConfig {
        self.config
    }

    fn nearby_units(&self, tile: TileRef, radius: u32, classes: &[UnitClass]) -> Vec<NearbyUnit> {
        let (origin_x, origin_y) = (self.x(tile), self.y(tile));
        let max_distance_sq = u64::from(radius) * u64::from(radius);

        self.units
            .values()
            .filter(|record| record.active && classes.contains(&record.class))
            .filter_map(|record| {
                let dx = self.x(record.tile).abs_diff(origin_x);
                let dy = self.y(record.tile).abs_diff(origin_y);
                let distance_sq = dx * dx + dy * dy;
                (distance_sq <= max_distance_sq).then(|| NearbyUnit {
                    unit: record.snapshot(),
                    distance_sq,
                })
            })
            .collect()
    }

    fn unit(&self, unit: UnitId) -> Option<UnitSnapshot> {
        self.units.get(&unit).map(UnitRecord::snapshot)
    }

    fn units_of_class(&self, player: PlayerId, class: UnitClass) -> Vec<UnitId> {
        self.units
            .values()
            .filter(|record| record.active && record.owner == player && record.class == class)
            .map(|record| record.id)
            .collect()
    }

    fn is_friendly(&self, player: PlayerId, other: PlayerId) -> bool {
        if player == other {
            return true;
        }
        self.players
            .get(&player)
            .is_some_and(|record| record.friends.contains(&other))
    }

    fn can_build(&self, player: PlayerId, class: UnitClass, tile: TileRef) -> Option<TileRef> {
        let record = self.players.get(&player)?;
        if record.build_allowance == Some(0) {
            return None;
        }
        let terrain = self.terrain_at(tile)?;
        let placeable = match class {
            UnitClass::Warship | UnitClass::Transport | UnitClass::TradeShip => {
                terrain == Terrain::Ocean
            }
            UnitClass::Port => terrain == Terrain::Land,
        };
        placeable.then_some(tile)
    }

    fn build_unit(&mut self, player: PlayerId, class: UnitClass, tile: TileRef) -> UnitId {
        if let Some(record) = self.players.get_mut(&player) {
            if let Some(allowance) = record.build_allowance.as_mut() {
                *allowance = allowance.saturating_sub(1);
            }
        }
        let health = match class {
            UnitClass::Warship => Some(WARSHIP_HEALTH),
            UnitClass::Port => Some(PORT_HEALTH),
            UnitClass::Transport | UnitClass::TradeShip => None,
        };
        self.register(UnitPlacement {
            owner: player,
            class,
            tile,
            health,
            destination_port: None,
            safe_from_piracy: false,
        })
    }

    fn capture_unit(&mut self, player: PlayerId, unit: UnitId) {
        let Some(record) = self.active_unit_mut(unit) else {
            return;
        };
        let from = record.owner;
        if from == player {
            return;
        }
        record.owner = player;
        record.move_order = None;
        self.journal.push(Event::UnitCaptured {
            unit,
            from,
            to: player,
        });
        debug!(unit = unit.get(), from = from.get(), to = player.get(), "unit captured");
    }

    fn move_unit(&mut self, unit: UnitId, tile: TileRef) {
        let Some(record) = self.active_unit_mut(unit) else {
            return;
        };
        let from = record.tile;
        record.tile = tile;
        self.journal.push(Event::UnitMoved {
            unit,
            from,
            to: tile,
        });
    }

    fn set_move_order(&mut self, unit: UnitId, tile: Option<TileRef>) {
        let Some(record) = self.active_unit_mut(unit) else {
            return;
        };
        if record.move_order == tile {
            return;
        }
        record.move_order = tile;
        self.journal.push(Event::MoveOrderChanged { unit, tile });
    }

    fn set_warship_target(&mut self, unit: UnitId, target: Option<UnitId>) {
        if let Some(record) = self.active_unit_mut(unit) {
            record.warship_target = target;
        }
    }

    fn add_execution(&mut self, effect: Effect) {
        match effect {
            Effect::Shell(shell) => self.journal.push(Event::ShellFired(shell)),
        }
        self.effects.push(effect);
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Events produced by the command, together with any journal entries recorded
/// by controllers since the last drain, are appended to `out_events`.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::AddPlayer {
            player,
            name,
            build_allowance,
        } => {
            let _ = world.players.insert(
                player,
                PlayerRecord {
                    name,
                    build_allowance,
                    friends: BTreeSet::new(),
                },
            );
        }
        Command::DeclareFriendship { first, second } => {
            if !world.has_player(first) || !world.has_player(second) {
                return drain_events(world, out_events);
            }
            if let Some(record) = world.players.get_mut(&first) {
                let _ = record.friends.insert(second);
            }
            if let Some(record) = world.players.get_mut(&second) {
                let _ = record.friends.insert(first);
            }
        }
        Command::PlaceUnit(placement) => {
            if world.has_player(placement.owner) && world.terrain_at(placement.tile).is_some() {
                let _ = world.register(placement);
            }
        }
        Command::IssueMoveOrder { unit, tile } => world.set_move_order(unit, tile),
        Command::SetSafeFromPiracy { unit, safe } => {
            if let Some(record) = world.active_unit_mut(unit) {
                record.safe_from_piracy = safe;
            }
        }
        Command::RelocateUnit { unit, tile } => {
            if world.terrain_at(tile).is_some() {
                world.move_unit(unit, tile);
            }
        }
        Command::DestroyUnit { unit } => world.destroy(unit),
        Command::Tick => {
            world.resolve_effects();
            world.tick_index = world.tick_index.saturating_add(1);
            world.journal.push(Event::TimeAdvanced {
                tick: world.tick_index,
            });
        }
    }

    drain_events(world, out_events);
}

/// Moves every journal entry recorded since the last drain into `out_events`.
pub fn drain_events(world: &mut World, out_events: &mut Vec<Event>) {
    out_events.append(&mut world.journal);
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::World;
    use warship_core::{Effect, UnitClass, UnitId, UnitSnapshot};

    /// Current tick counter.
    #[must_use]
    pub fn ticks(world: &World) -> u64 {
        world.tick_index
    }

    /// Snapshots of every unit the registry knows about, ordered by identifier.
    #[must_use]
    pub fn units(world: &World) -> Vec<UnitSnapshot> {
        world.units.values().map(|record| record.snapshot()).collect()
    }

    /// Remaining hit points of a unit with a health pool.
    #[must_use]
    pub fn health(world: &World, unit: UnitId) -> Option<u32> {
        world.units.get(&unit).and_then(|record| record.health)
    }

    /// Effects waiting to be resolved on the next tick.
    #[must_use]
    pub fn pending_effects(world: &World) -> &[Effect] {
        &world.effects
    }

    /// Number of active units of `class` across all players.
    #[must_use]
    pub fn active_count(world: &World, class: UnitClass) -> usize {
        world
            .units
            .values()
            .filter(|record| record.active && record.class == class)
            .count()
    }
}
