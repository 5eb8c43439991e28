#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-tick behavior controller for a single warship.
//!
//! A controller is created with an owner and a patrol center, bound to the
//! live world by [`WarshipController::init`], and then ticked once per
//! simulation step. Until its unit exists it tries to build one at the patrol
//! tile; afterwards each tick selects a target, moves (following a move
//! order, patrolling, or leaving movement to trade-ship pursuit), re-validates
//! the target and finally shells or captures it. The controller only stores
//! identifiers and re-reads every unit from the world each tick.

mod state;

use tracing::{debug, info, warn};
use warship_core::{
    Execution, ExecutionError, Game, PathFinder, PlayerId, TileRef, UnitClass, UnitId,
    UnitSnapshot,
};
use warship_system_pathing::{PathIntegration, StepOutcome, EXACT_ARRIVAL};
use warship_system_patrol_sampling::PatrolSiteSampler;
use warship_system_shelling::{ShellDispatcher, ShotOutcome};
use warship_system_targeting::{TargetQuery, TargetSelector};

pub use state::{
    engagement_for, plan_movement, Engagement, MovementMode, MovementPlan, WarshipState,
};

/// Capture completes once the warship is closer than this Manhattan distance.
pub const CAPTURE_ARRIVAL_DISTANCE: u64 = 5;

/// Upper bound on pathfinding queries spent chasing a trade ship per tick.
pub const CAPTURE_QUERIES_PER_TICK: usize = 2;

const SEED_MIX: u64 = 0x9e37_79b9_7f4a_7c15;

/// Autonomous controller for one warship.
#[derive(Debug)]
pub struct WarshipController<P> {
    owner: PlayerId,
    patrol_center: TileRef,
    active: bool,
    sampler: Option<PatrolSiteSampler>,
    pathing: PathIntegration<P>,
    selector: TargetSelector,
    shells: ShellDispatcher,
    warship: Option<UnitId>,
    target: Option<UnitId>,
    patrol_tile: Option<TileRef>,
    state: WarshipState,
}

impl<P> WarshipController<P>
where
    P: PathFinder,
{
    /// Creates an unbound controller for `owner` patrolling around `patrol_center`.
    #[must_use]
    pub fn new(owner: PlayerId, patrol_center: TileRef, pathfinder: P) -> Self {
        Self {
            owner,
            patrol_center,
            active: true,
            sampler: None,
            pathing: PathIntegration::new(pathfinder),
            selector: TargetSelector::new(),
            shells: ShellDispatcher::new(),
            warship: None,
            target: None,
            patrol_tile: None,
            state: WarshipState::Spawning,
        }
    }

    /// Binds the controller to the live world at tick `ticks`.
    ///
    /// The patrol sampler is seeded from `ticks`, the owner and the patrol
    /// center. A missing owner deactivates the controller permanently.
    pub fn init<G>(&mut self, game: &G, ticks: u64)
    where
        G: Game + ?Sized,
    {
        if !game.has_player(self.owner) {
            warn!(owner = self.owner.get(), "warship owner not found");
            self.deactivate();
            return;
        }

        let seed = ticks.wrapping_mul(SEED_MIX)
            ^ ((u64::from(self.owner.get()) << 32) | u64::from(self.patrol_center.get()));
        self.sampler = Some(PatrolSiteSampler::new(
            self.patrol_center,
            game.config().patrol_range,
            seed,
        ));
        self.patrol_tile = Some(self.patrol_center);
    }

    /// Advances the controller by one simulation step.
    pub fn tick<G>(&mut self, game: &mut G, ticks: u64) -> Result<(), ExecutionError>
    where
        G: Game + ?Sized,
    {
        if !self.active {
            return Ok(());
        }
        if self.sampler.is_none() {
            return Err(ExecutionError::NotInitialized);
        }

        let Some(warship) = self.warship else {
            self.spawn(game);
            return Ok(());
        };
        let Some(ship) = game.unit(warship).filter(|unit| unit.active) else {
            info!(warship = warship.get(), "warship lost");
            self.deactivate();
            return Ok(());
        };

        let selected = self.select_target(game, &ship);
        self.target = selected.map(|unit| unit.id);

        let plan = plan_movement(ship.move_order, selected.map(|unit| unit.class));
        if plan.drop_target {
            self.target = None;
        }
        match plan.mode {
            MovementMode::FollowOrder(order) => self.follow_order(game, &ship, order),
            MovementMode::Patrol => self.patrol(game, &ship)?,
            MovementMode::Pursue => {}
        }

        let target = self.revalidate_target(game);
        self.target = target.map(|unit| unit.id);
        game.set_warship_target(ship.id, self.target);

        let engagement = engagement_for(target.map(|unit| unit.class));
        self.state = WarshipState::resolve(plan.mode, engagement);

        let ship = game.unit(ship.id).unwrap_or(ship);
        match (engagement, target) {
            (Engagement::Shell, Some(target)) => self.shoot(game, ticks, &ship, &target),
            (Engagement::Capture, Some(target)) => self.pursue_trade(game, &ship, &target),
            _ => {}
        }
        Ok(())
    }

    /// Whether the scheduler should keep ticking this controller.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Unit built by the controller, once spawning succeeded.
    #[must_use]
    pub const fn warship(&self) -> Option<UnitId> {
        self.warship
    }

    /// Target held at the end of the last tick.
    #[must_use]
    pub const fn target(&self) -> Option<UnitId> {
        self.target
    }

    /// Patrol destination currently held.
    #[must_use]
    pub const fn patrol_tile(&self) -> Option<TileRef> {
        self.patrol_tile
    }

    /// Behavior state resolved during the last tick.
    #[must_use]
    pub const fn state(&self) -> WarshipState {
        self.state
    }

    /// Tick of the most recent shell.
    #[must_use]
    pub const fn last_shell_attack(&self) -> u64 {
        self.shells.last_fired()
    }

    /// Reports whether `unit` was already committed to a lethal shell.
    #[must_use]
    pub fn already_shelled(&self, unit: UnitId) -> bool {
        self.shells.already_shelled().contains(&unit)
    }

    /// Pathfinding queries issued over the controller's lifetime.
    #[must_use]
    pub const fn pathfinding_queries(&self) -> u64 {
        self.pathing.queries()
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.state = WarshipState::Inactive;
    }

    fn spawn<G>(&mut self, game: &mut G)
    where
        G: Game + ?Sized,
    {
        let Some(tile) = self.patrol_tile else {
            warn!(owner = self.owner.get(), "no patrol tile to spawn warship at");
            self.deactivate();
            return;
        };

        match game.can_build(self.owner, UnitClass::Warship, tile) {
            Some(spawn) => {
                let unit = game.build_unit(self.owner, UnitClass::Warship, spawn);
                info!(
                    owner = game.player_name(self.owner).unwrap_or_default(),
                    warship = unit.get(),
                    "warship spawned"
                );
                self.warship = Some(unit);
            }
            None => {
                info!(
                    owner = game.player_name(self.owner).unwrap_or_default(),
                    "warship spawn denied"
                );
                self.deactivate();
            }
        }
    }

    fn select_target<G>(&mut self, game: &G, ship: &UnitSnapshot) -> Option<UnitSnapshot>
    where
        G: Game + ?Sized,
    {
        let query = TargetQuery {
            owner: self.owner,
            warship: ship.id,
            origin: ship.tile,
            radius: game.config().targeting_range,
            already_shelled: self.shells.already_shelled(),
        };
        self.selector.select(game, &query)
    }

    fn follow_order<G>(&mut self, game: &mut G, ship: &UnitSnapshot, order: TileRef)
    where
        G: Game + ?Sized,
    {
        match self
            .pathing
            .step(game, ship.id, ship.tile, order, EXACT_ARRIVAL)
        {
            StepOutcome::Arrived => game.set_move_order(ship.id, None),
            StepOutcome::Advanced(_) | StepOutcome::Waiting => {}
            StepOutcome::Unreachable => {
                debug!(warship = ship.id.get(), "path not found to move order");
            }
        }
    }

    fn patrol<G>(&mut self, game: &mut G, ship: &UnitSnapshot) -> Result<(), ExecutionError>
    where
        G: Game + ?Sized,
    {
        if self.patrol_tile.is_none() {
            let sampler = self
                .sampler
                .as_mut()
                .ok_or(ExecutionError::NotInitialized)?;
            self.patrol_tile = sampler.sample(&*game).map(|sample| sample.tile);
        }
        let Some(destination) = self.patrol_tile else {
            return Ok(());
        };

        match self
            .pathing
            .step(game, ship.id, ship.tile, destination, EXACT_ARRIVAL)
        {
            StepOutcome::Arrived => self.patrol_tile = None,
            StepOutcome::Advanced(_) | StepOutcome::Waiting => {}
            StepOutcome::Unreachable => {
                debug!(warship = ship.id.get(), "path not found to patrol tile");
                self.patrol_tile = None;
            }
        }
        Ok(())
    }

    fn revalidate_target<G>(&self, game: &G) -> Option<UnitSnapshot>
    where
        G: Game + ?Sized,
    {
        self.target
            .and_then(|target| game.unit(target))
            .filter(|unit| unit.active && unit.owner != self.owner && !unit.safe_from_piracy)
    }

    fn shoot<G>(&mut self, game: &mut G, ticks: u64, ship: &UnitSnapshot, target: &UnitSnapshot)
    where
        G: Game + ?Sized,
    {
        let outcome = self.shells.dispatch(game, ticks, ship, target);
        if outcome == (ShotOutcome::Fired { lethal: true }) {
            self.target = None;
        }
    }

    fn pursue_trade<G>(&mut self, game: &mut G, ship: &UnitSnapshot, target: &UnitSnapshot)
    where
        G: Game + ?Sized,
    {
        let mut position = ship.tile;
        for _ in 0..CAPTURE_QUERIES_PER_TICK {
            let outcome = self.pathing.step(
                game,
                ship.id,
                position,
                target.tile,
                CAPTURE_ARRIVAL_DISTANCE,
            );
            match outcome {
                StepOutcome::Arrived => {
                    game.capture_unit(self.owner, target.id);
                    info!(
                        owner = game.player_name(self.owner).unwrap_or_default(),
                        captured = target.id.get(),
                        "trade ship captured"
                    );
                    self.target = None;
                    return;
                }
                StepOutcome::Advanced(_) | StepOutcome::Waiting => {}
                StepOutcome::Unreachable => {
                    debug!(warship = ship.id.get(), "path not found to trade ship");
                }
            }
            position = outcome.position(position);
        }
    }
}

impl<G, P> Execution<G> for WarshipController<P>
where
    G: Game,
    P: PathFinder,
{
    fn init(&mut self, game: &G, ticks: u64) {
        WarshipController::init(self, game, ticks);
    }

    fn tick(&mut self, game: &mut G, ticks: u64) -> Result<(), ExecutionError> {
        WarshipController::tick(self, game, ticks)
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn active_during_spawn_phase(&self) -> bool {
        false
    }
}
