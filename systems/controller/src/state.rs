//! Behavior states of a warship and the rules that pick them each tick.

use warship_core::{TileRef, UnitClass};

/// Observable behavior of a warship controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WarshipState {
    /// No unit exists yet; every tick attempts construction.
    Spawning,
    /// The unit follows an externally issued move order.
    MovingToOrder,
    /// The unit sails toward sampled patrol destinations.
    Patrolling,
    /// The unit chases a trade ship in order to capture it.
    PursuingTrade,
    /// The unit shells a hostile vessel.
    Attacking,
    /// The controller stopped for good.
    Inactive,
}

/// How the unit moves during the movement phase of a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MovementMode {
    /// Path toward the contained move-order tile.
    FollowOrder(TileRef),
    /// Path toward the held patrol tile, sampling one if needed.
    Patrol,
    /// Skip the movement phase; capture pursuit moves the unit.
    Pursue,
}

/// Movement decision for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MovementPlan {
    /// Movement mode to execute.
    pub mode: MovementMode,
    /// Whether the freshly selected target must be discarded.
    pub drop_target: bool,
}

/// What the unit does with a re-validated target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Engagement {
    /// No target survived re-validation.
    Idle,
    /// Fire a shell at the target.
    Shell,
    /// Chase the target and capture it on arrival.
    Capture,
}

/// Chooses the movement for a tick.
///
/// A move order always wins and rules out chasing trade ships, since pursuit
/// would drag the unit away from the ordered destination.
#[must_use]
pub fn plan_movement(move_order: Option<TileRef>, target: Option<UnitClass>) -> MovementPlan {
    let hunting_trade = target == Some(UnitClass::TradeShip);
    match move_order {
        Some(tile) => MovementPlan {
            mode: MovementMode::FollowOrder(tile),
            drop_target: hunting_trade,
        },
        None if hunting_trade => MovementPlan {
            mode: MovementMode::Pursue,
            drop_target: false,
        },
        None => MovementPlan {
            mode: MovementMode::Patrol,
            drop_target: false,
        },
    }
}

/// Chooses how to engage a target that survived re-validation.
#[must_use]
pub fn engagement_for(target: Option<UnitClass>) -> Engagement {
    match target {
        None => Engagement::Idle,
        Some(UnitClass::TradeShip) => Engagement::Capture,
        Some(_) => Engagement::Shell,
    }
}

impl WarshipState {
    /// State reported for a tick that ran `mode` followed by `engagement`.
    #[must_use]
    pub fn resolve(mode: MovementMode, engagement: Engagement) -> Self {
        match (engagement, mode) {
            (Engagement::Shell, _) => Self::Attacking,
            (Engagement::Capture, _) | (Engagement::Idle, MovementMode::Pursue) => {
                Self::PursuingTrade
            }
            (Engagement::Idle, MovementMode::FollowOrder(_)) => Self::MovingToOrder,
            (Engagement::Idle, MovementMode::Patrol) => Self::Patrolling,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER: TileRef = TileRef::new(42);

    #[test]
    fn move_order_suppresses_trade_targets_only() {
        assert_eq!(
            plan_movement(Some(ORDER), Some(UnitClass::TradeShip)),
            MovementPlan {
                mode: MovementMode::FollowOrder(ORDER),
                drop_target: true,
            }
        );
        assert_eq!(
            plan_movement(Some(ORDER), Some(UnitClass::Warship)),
            MovementPlan {
                mode: MovementMode::FollowOrder(ORDER),
                drop_target: false,
            }
        );
    }

    #[test]
    fn trade_target_replaces_patrol_with_pursuit() {
        assert_eq!(
            plan_movement(None, Some(UnitClass::TradeShip)).mode,
            MovementMode::Pursue
        );
        assert_eq!(plan_movement(None, Some(UnitClass::Transport)).mode, MovementMode::Patrol);
        assert_eq!(plan_movement(None, None).mode, MovementMode::Patrol);
    }

    #[test]
    fn engagement_depends_on_target_class() {
        assert_eq!(engagement_for(None), Engagement::Idle);
        assert_eq!(engagement_for(Some(UnitClass::TradeShip)), Engagement::Capture);
        assert_eq!(engagement_for(Some(UnitClass::Transport)), Engagement::Shell);
        assert_eq!(engagement_for(Some(UnitClass::Warship)), Engagement::Shell);
    }

    #[test]
    fn transition_table_covers_reachable_pairs() {
        let table = [
            (MovementMode::Patrol, Engagement::Idle, WarshipState::Patrolling),
            (MovementMode::Patrol, Engagement::Shell, WarshipState::Attacking),
            (MovementMode::FollowOrder(ORDER), Engagement::Idle, WarshipState::MovingToOrder),
            (MovementMode::FollowOrder(ORDER), Engagement::Shell, WarshipState::Attacking),
            (MovementMode::Pursue, Engagement::Capture, WarshipState::PursuingTrade),
            (MovementMode::Pursue, Engagement::Idle, WarshipState::PursuingTrade),
        ];
        for (mode, engagement, expected) in table {
            assert_eq!(
                WarshipState::resolve(mode, engagement),
                expected,
                "{mode:?} {engagement:?}"
            );
        }
    }
}
