#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that ranks nearby hostile vessels into a single warship target.

use std::{cmp::Ordering, collections::BTreeSet};

use warship_core::{Game, NearbyUnit, PlayerId, TileRef, UnitClass, UnitId, UnitSnapshot};

/// Inputs describing the warship that is looking for a target.
#[derive(Clone, Copy, Debug)]
pub struct TargetQuery<'a> {
    /// Player controlling the warship.
    pub owner: PlayerId,
    /// The warship itself.
    pub warship: UnitId,
    /// Tile the scan is centered on.
    pub origin: TileRef,
    /// Scan radius in tiles.
    pub radius: u32,
    /// Units that already received a lethal shell and must not be picked again.
    pub already_shelled: &'a BTreeSet<UnitId>,
}

/// Facts about a trade ship that decide whether it may be hunted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TradeRoute {
    /// Whether the hunter's owner controls at least one port.
    pub hunter_has_port: bool,
    /// Whether the trade ship's destination port belongs to the hunter's owner.
    pub destination_owned_by_hunter: bool,
    /// Whether the destination port's owner is friendly toward the hunter's owner.
    pub destination_friendly: bool,
    /// Whether the trade ship is currently exempt from piracy.
    pub safe_from_piracy: bool,
}

/// Reports whether a trade ship on `route` may be targeted.
#[must_use]
pub fn trade_ship_eligible(route: TradeRoute) -> bool {
    route.hunter_has_port
        && !route.destination_owned_by_hunter
        && !route.destination_friendly
        && !route.safe_from_piracy
}

/// Priority tier of a target class; lower tiers are engaged first.
#[must_use]
pub const fn priority_tier(class: UnitClass) -> u8 {
    match class {
        UnitClass::Warship => 0,
        UnitClass::Transport => 1,
        UnitClass::TradeShip => 2,
        UnitClass::Port => 3,
    }
}

/// Total order over candidates: class tier, then distance, then identifier.
#[must_use]
pub fn rank(a: &NearbyUnit, b: &NearbyUnit) -> Ordering {
    priority_tier(a.unit.class)
        .cmp(&priority_tier(b.unit.class))
        .then(a.distance_sq.cmp(&b.distance_sq))
        .then(a.unit.id.cmp(&b.unit.id))
}

/// Target selection system that reuses a scratch buffer between ticks.
#[derive(Debug, Default)]
pub struct TargetSelector {
    candidates: Vec<NearbyUnit>,
}

impl TargetSelector {
    /// Creates a selector with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the highest-ranked eligible unit around `query.origin`.
    ///
    /// The result is recomputed from scratch on every call; previous picks
    /// carry no weight.
    pub fn select<G>(&mut self, game: &G, query: &TargetQuery<'_>) -> Option<UnitSnapshot>
    where
        G: Game + ?Sized,
    {
        self.candidates.clear();
        self.candidates.extend(game.nearby_units(
            query.origin,
            query.radius,
            &UnitClass::NAVAL_TARGETS,
        ));
        if self.candidates.is_empty() {
            return None;
        }

        let hunter_has_port = !game.units_of_class(query.owner, UnitClass::Port).is_empty();

        self.candidates
            .iter()
            .filter(|candidate| is_hostile(game, query, &candidate.unit))
            .filter(|candidate| {
                candidate.unit.class != UnitClass::TradeShip
                    || trade_ship_eligible(trade_route(
                        game,
                        query.owner,
                        hunter_has_port,
                        &candidate.unit,
                    ))
            })
            .min_by(|a, b| rank(a, b))
            .map(|candidate| candidate.unit)
    }
}

fn is_hostile<G>(game: &G, query: &TargetQuery<'_>, unit: &UnitSnapshot) -> bool
where
    G: Game + ?Sized,
{
    unit.active
        && unit.id != query.warship
        && unit.owner != query.owner
        && !game.is_friendly(unit.owner, query.owner)
        && !query.already_shelled.contains(&unit.id)
}

fn trade_route<G>(
    game: &G,
    hunter: PlayerId,
    hunter_has_port: bool,
    ship: &UnitSnapshot,
) -> TradeRoute
where
    G: Game + ?Sized,
{
    let destination_owner = ship
        .destination_port
        .and_then(|port| game.unit(port))
        .map(|port| port.owner);

    TradeRoute {
        hunter_has_port,
        destination_owned_by_hunter: destination_owner == Some(hunter),
        destination_friendly: destination_owner
            .is_some_and(|owner| game.is_friendly(owner, hunter)),
        safe_from_piracy: ship.safe_from_piracy,
    }
}
