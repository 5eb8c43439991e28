//! End-of-run summary printed by the CLI.

use std::{collections::BTreeMap, fmt};

use warship_core::{Event, Game, UnitClass};
use warship_world::{query, World};

/// Counters accumulated from the event stream of a run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Summary {
    pub(crate) ticks: u64,
    pub(crate) warships_built: usize,
    pub(crate) shells_fired: usize,
    pub(crate) hits: usize,
    pub(crate) sunk: usize,
    pub(crate) captures: usize,
    live_controllers: usize,
    fleets: BTreeMap<String, usize>,
}

impl Summary {
    /// Folds one event into the counters.
    pub(crate) fn record(&mut self, event: &Event) {
        match event {
            Event::TimeAdvanced { tick } => self.ticks = *tick,
            Event::UnitBuilt {
                class: UnitClass::Warship,
                ..
            } => self.warships_built += 1,
            Event::ShellFired(_) => self.shells_fired += 1,
            Event::UnitDamaged { .. } => self.hits += 1,
            Event::UnitDestroyed { .. } => self.sunk += 1,
            Event::UnitCaptured { .. } => self.captures += 1,
            Event::UnitBuilt { .. } | Event::UnitMoved { .. } | Event::MoveOrderChanged { .. } => {}
        }
    }

    /// Captures the final fleet sizes per player.
    pub(crate) fn finish(&mut self, world: &World, live_controllers: usize) {
        self.live_controllers = live_controllers;
        self.fleets.clear();
        for unit in query::units(world) {
            if !unit.active || unit.class == UnitClass::Port {
                continue;
            }
            let name = world
                .player_name(unit.owner)
                .map_or_else(|| format!("player {}", unit.owner.get()), str::to_owned);
            *self.fleets.entry(name).or_insert(0) += 1;
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ticks simulated:  {}", self.ticks)?;
        writeln!(f, "warships built:   {}", self.warships_built)?;
        writeln!(f, "shells fired:     {}", self.shells_fired)?;
        writeln!(f, "hits:             {}", self.hits)?;
        writeln!(f, "units sunk:       {}", self.sunk)?;
        writeln!(f, "ships captured:   {}", self.captures)?;
        write!(f, "live controllers: {}", self.live_controllers)?;
        for (player, ships) in &self.fleets {
            write!(f, "\n  {player}: {ships} ships afloat")?;
        }
        Ok(())
    }
}
