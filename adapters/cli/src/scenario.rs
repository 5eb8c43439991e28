//! TOML scenario files and the simulation they describe.
//!
//! A scenario declares the map, the players and their friendships, units that
//! already sail the map, and the warship controllers to launch:
//!
//! ```toml
//! ticks = 200
//!
//! [map]
//! rows = """
//! ########
//! #......#
//! ########
//! """
//!
//! [[players]]
//! id = 1
//! name = "hunter"
//!
//! [[warships]]
//! owner = 1
//! x = 3
//! y = 1
//! ```

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use warship_core::{
    Command, Event, Game, PlayerId, TerrainMap, TileRef, UnitClass, UnitId, UnitPlacement,
    WarshipConfig,
};
use warship_system_controller::WarshipController;
use warship_world::{self as world, OceanPathFinder, World, DEFAULT_ITERATION_BUDGET};

use crate::simulation::Simulation;

const DEFAULT_TICKS: u64 = 600;

/// Parsed scenario file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    /// Number of ticks to simulate unless overridden on the command line.
    #[serde(default = "default_ticks")]
    pub(crate) ticks: u64,
    #[serde(default)]
    spawn_phase_ticks: u64,
    #[serde(default = "default_pathfinder_budget")]
    pathfinder_budget: u32,
    #[serde(default)]
    config: WarshipConfig,
    map: MapSpec,
    #[serde(default)]
    players: Vec<PlayerSpec>,
    #[serde(default)]
    friendships: Vec<[u32; 2]>,
    #[serde(default)]
    units: Vec<UnitSpec>,
    #[serde(default)]
    warships: Vec<WarshipSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MapSpec {
    Ascii { rows: String },
    OpenSea { width: u32, height: u32 },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlayerSpec {
    id: u32,
    name: String,
    build_allowance: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UnitSpec {
    label: Option<String>,
    owner: u32,
    class: UnitClass,
    x: i64,
    y: i64,
    health: Option<u32>,
    destination: Option<String>,
    #[serde(default)]
    safe_from_piracy: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WarshipSpec {
    owner: u32,
    x: i64,
    y: i64,
}

fn default_ticks() -> u64 {
    DEFAULT_TICKS
}

fn default_pathfinder_budget() -> u32 {
    DEFAULT_ITERATION_BUDGET
}

impl Scenario {
    /// Parses a scenario from TOML source.
    pub(crate) fn parse(source: &str) -> Result<Self> {
        toml::from_str(source).context("malformed scenario TOML")
    }

    /// Builds the world and registers one controller per declared warship.
    pub(crate) fn build(&self) -> Result<Simulation> {
        let mut world = match &self.map {
            MapSpec::Ascii { rows } => World::from_ascii(rows, self.config)?,
            MapSpec::OpenSea { width, height } => World::open_sea(*width, *height, self.config),
        };

        let mut setup = Vec::new();
        for player in &self.players {
            world::apply(
                &mut world,
                Command::AddPlayer {
                    player: PlayerId::new(player.id),
                    name: player.name.clone(),
                    build_allowance: player.build_allowance,
                },
                &mut setup,
            );
        }
        for &[first, second] in &self.friendships {
            world::apply(
                &mut world,
                Command::DeclareFriendship {
                    first: PlayerId::new(first),
                    second: PlayerId::new(second),
                },
                &mut setup,
            );
        }
        self.place_units(&mut world)?;

        let mut simulation = Simulation::new(world, self.spawn_phase_ticks);
        for (index, spec) in self.warships.iter().enumerate() {
            let center = tile_at(simulation.world(), spec.x, spec.y)
                .with_context(|| format!("warship #{index}"))?;
            simulation.add_execution(Box::new(WarshipController::new(
                PlayerId::new(spec.owner),
                center,
                OceanPathFinder::new(self.pathfinder_budget),
            )));
        }
        Ok(simulation)
    }

    fn place_units(&self, world: &mut World) -> Result<()> {
        let mut labels: BTreeMap<&str, UnitId> = BTreeMap::new();
        // Destinations may reference ports declared later in the file.
        let mut ordered: Vec<&UnitSpec> = self.units.iter().collect();
        ordered.sort_by_key(|spec| spec.destination.is_some());

        for spec in ordered {
            let owner = PlayerId::new(spec.owner);
            if !world.has_player(owner) {
                bail!("unit owner {} is not a declared player", spec.owner);
            }
            let tile = tile_at(world, spec.x, spec.y)?;
            let destination_port = match spec.destination.as_deref() {
                Some(label) => Some(
                    *labels
                        .get(label)
                        .with_context(|| format!("unknown destination {label:?}"))?,
                ),
                None => None,
            };

            let mut events = Vec::new();
            world::apply(
                world,
                Command::PlaceUnit(UnitPlacement {
                    owner,
                    class: spec.class,
                    tile,
                    health: spec.health,
                    destination_port,
                    safe_from_piracy: spec.safe_from_piracy,
                }),
                &mut events,
            );
            let Some(unit) = events.iter().find_map(|event| match event {
                Event::UnitBuilt { unit, .. } => Some(*unit),
                _ => None,
            }) else {
                bail!("unit at ({}, {}) was not placed", spec.x, spec.y);
            };
            if let Some(label) = spec.label.as_deref() {
                if labels.insert(label, unit).is_some() {
                    bail!("duplicate unit label {label:?}");
                }
            }
        }
        Ok(())
    }
}

fn tile_at(world: &World, x: i64, y: i64) -> Result<TileRef> {
    world
        .tile(x, y)
        .with_context(|| format!("coordinate ({x}, {y}) is outside the map"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRAIT: &str = include_str!("../scenarios/strait.toml");

    #[test]
    fn bundled_scenario_parses() {
        let scenario = Scenario::parse(STRAIT).expect("valid scenario");
        assert_eq!(scenario.players.len(), 3);
        assert_eq!(scenario.warships.len(), 2);
        assert_eq!(scenario.config.shell_attack_rate, 20);
    }

    #[test]
    fn bundled_scenario_runs_to_completion() {
        let scenario = Scenario::parse(STRAIT).expect("valid scenario");
        let mut simulation = scenario.build().expect("scenario builds");
        let mut shells = 0;

        let summary = simulation
            .run(scenario.ticks, |event| {
                if matches!(event, Event::ShellFired(_)) {
                    shells += 1;
                }
            })
            .expect("controllers initialized");

        assert_eq!(summary.ticks, scenario.ticks);
        assert_eq!(summary.shells_fired, shells);
        assert!(summary.shells_fired > 0);
        assert_eq!(summary.warships_built, 2);
    }

    #[test]
    fn open_sea_maps_and_config_overrides_are_accepted() {
        let scenario = Scenario::parse(
            r#"
            ticks = 5

            [config]
            patrol_range = 4

            [map]
            width = 12
            height = 12

            [[players]]
            id = 1
            name = "solo"

            [[warships]]
            owner = 1
            x = 6
            y = 6
            "#,
        )
        .expect("valid scenario");

        assert_eq!(scenario.config.patrol_range, 4);
        assert_eq!(scenario.config.targeting_range, 130);
        let simulation = scenario.build().expect("scenario builds");
        assert_eq!(simulation.world().width(), 12);
        assert_eq!(simulation.live_executions(), 1);
    }

    #[test]
    fn destinations_resolve_labels_declared_later() {
        let scenario = Scenario::parse(
            r#"
            [map]
            rows = """
            #####
            .....
            """

            [[players]]
            id = 2
            name = "merchant"

            [[units]]
            owner = 2
            class = "TradeShip"
            x = 1
            y = 1
            destination = "market"

            [[units]]
            label = "market"
            owner = 2
            class = "Port"
            x = 3
            y = 0
            health = 2000
            "#,
        )
        .expect("valid scenario");

        let simulation = scenario.build().expect("scenario builds");
        let world = simulation.world();
        let port = world.units_of_class(PlayerId::new(2), UnitClass::Port)[0];
        let trade = world.units_of_class(PlayerId::new(2), UnitClass::TradeShip)[0];
        assert_eq!(
            world.unit(trade).expect("known").destination_port,
            Some(port)
        );
    }

    #[test]
    fn unknown_destination_is_rejected() {
        let scenario = Scenario::parse(
            r#"
            [map]
            width = 4
            height = 4

            [[players]]
            id = 1
            name = "merchant"

            [[units]]
            owner = 1
            class = "TradeShip"
            x = 1
            y = 1
            destination = "nowhere"
            "#,
        )
        .expect("valid scenario");

        let error = scenario.build().expect_err("dangling label");
        assert!(error.to_string().contains("nowhere"));
    }

    #[test]
    fn warships_off_the_map_are_rejected() {
        let scenario = Scenario::parse(
            r#"
            [map]
            width = 4
            height = 4

            [[warships]]
            owner = 1
            x = 9
            y = 1
            "#,
        )
        .expect("valid scenario");

        assert!(scenario.build().is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = Scenario::parse(
            r#"
            [map]
            width = 4
            height = 4

            [[warships]]
            owner = 1
            x = 1
            y = 1
            speed = 3
            "#,
        )
        .expect_err("unknown field");
        assert!(format!("{error:#}").contains("speed"));
    }
}
