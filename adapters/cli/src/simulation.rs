//! Tick scheduler driving executions against the reference world.

use anyhow::{Context, Result};
use tracing::{debug, info};
use warship_core::{Command, Event, Execution};
use warship_world::{self as world, query, World};

use crate::report::Summary;

/// World plus the executions ticked against it.
pub(crate) struct Simulation {
    world: World,
    executions: Vec<Box<dyn Execution<World>>>,
    spawn_phase_ticks: u64,
    events: Vec<Event>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("world", &self.world)
            .field("executions", &self.executions.len())
            .field("spawn_phase_ticks", &self.spawn_phase_ticks)
            .field("events", &self.events)
            .finish()
    }
}

impl Simulation {
    /// Wraps a fully set-up world. The first `spawn_phase_ticks` ticks only run
    /// executions that opt into the spawn phase.
    pub(crate) fn new(world: World, spawn_phase_ticks: u64) -> Self {
        Self {
            world,
            executions: Vec::new(),
            spawn_phase_ticks,
            events: Vec::new(),
        }
    }

    /// Initializes `execution` against the current world and schedules it.
    pub(crate) fn add_execution(&mut self, mut execution: Box<dyn Execution<World>>) {
        execution.init(&self.world, query::ticks(&self.world));
        if execution.is_active() {
            self.executions.push(execution);
        } else {
            debug!("execution deactivated during init");
        }
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    #[cfg(test)]
    pub(crate) fn live_executions(&self) -> usize {
        self.executions.len()
    }

    /// Advances the world by one tick, forwarding every emitted event to `on_event`.
    pub(crate) fn step(&mut self, mut on_event: impl FnMut(&Event)) -> Result<()> {
        let now = query::ticks(&self.world);
        let spawn_phase = now < self.spawn_phase_ticks;

        for execution in &mut self.executions {
            if !execution.is_active() || (spawn_phase && !execution.active_during_spawn_phase()) {
                continue;
            }
            execution
                .tick(&mut self.world, now)
                .with_context(|| format!("execution failed at tick {now}"))?;
        }
        self.executions.retain(|execution| execution.is_active());

        world::apply(&mut self.world, Command::Tick, &mut self.events);
        for event in self.events.drain(..) {
            on_event(&event);
        }
        Ok(())
    }

    /// Runs `ticks` steps and summarizes the events they produced.
    pub(crate) fn run(&mut self, ticks: u64, mut on_event: impl FnMut(&Event)) -> Result<Summary> {
        let mut summary = Summary::default();
        for _ in 0..ticks {
            self.step(|event| {
                summary.record(event);
                on_event(event);
            })?;
        }
        summary.finish(&self.world, self.executions.len());
        info!(
            ticks = summary.ticks,
            shells = summary.shells_fired,
            captures = summary.captures,
            "simulation finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warship_core::{ExecutionError, Game, PlayerId, TerrainMap, UnitClass, WarshipConfig};

    /// Records the ticks it saw and builds a transport on its first one.
    struct Recorder {
        owner: PlayerId,
        ticks_seen: Vec<u64>,
        spawn_phase: bool,
        initialized: bool,
    }

    impl Execution<World> for Recorder {
        fn init(&mut self, _game: &World, _ticks: u64) {
            self.initialized = true;
        }

        fn tick(&mut self, game: &mut World, ticks: u64) -> Result<(), ExecutionError> {
            if !self.initialized {
                return Err(ExecutionError::NotInitialized);
            }
            if self.ticks_seen.is_empty() {
                let tile = game.tile(0, 0).expect("in bounds");
                let _ = game.build_unit(self.owner, UnitClass::Transport, tile);
            }
            self.ticks_seen.push(ticks);
            Ok(())
        }

        fn is_active(&self) -> bool {
            self.ticks_seen.len() < 3
        }

        fn active_during_spawn_phase(&self) -> bool {
            self.spawn_phase
        }
    }

    fn world() -> World {
        let mut world = World::open_sea(4, 4, WarshipConfig::default());
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::AddPlayer {
                player: PlayerId::new(1),
                name: "recorder".to_owned(),
                build_allowance: None,
            },
            &mut events,
        );
        world
    }

    fn recorder(spawn_phase: bool) -> Box<Recorder> {
        Box::new(Recorder {
            owner: PlayerId::new(1),
            ticks_seen: Vec::new(),
            spawn_phase,
            initialized: false,
        })
    }

    #[test]
    fn inactive_executions_are_dropped() {
        let mut simulation = Simulation::new(world(), 0);
        simulation.add_execution(recorder(false));

        let summary = simulation.run(5, |_| {}).expect("recorder initialized");

        assert_eq!(simulation.live_executions(), 0);
        assert_eq!(summary.ticks, 5);
        assert_eq!(query::active_count(simulation.world(), UnitClass::Transport), 1);
    }

    #[test]
    fn spawn_phase_holds_back_regular_executions() {
        let mut simulation = Simulation::new(world(), 2);
        simulation.add_execution(recorder(false));
        simulation.add_execution(recorder(true));
        let mut built_at = Vec::new();

        for _ in 0..3 {
            let now = query::ticks(simulation.world());
            simulation
                .step(|event| {
                    if matches!(event, Event::UnitBuilt { .. }) {
                        built_at.push(now);
                    }
                })
                .expect("recorders initialized");
        }

        assert_eq!(built_at, vec![0, 2]);
    }

    #[test]
    fn world_advances_once_per_step() {
        let mut simulation = Simulation::new(world(), 0);
        let mut advanced = Vec::new();

        for _ in 0..4 {
            simulation
                .step(|event| {
                    if let Event::TimeAdvanced { tick } = event {
                        advanced.push(*tick);
                    }
                })
                .expect("no executions");
        }

        assert_eq!(advanced, vec![1, 2, 3, 4]);
        assert_eq!(simulation.world().ticks(), 4);
    }
}
