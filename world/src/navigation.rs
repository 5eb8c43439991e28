//! Budgeted ocean pathfinder used by naval units.

use std::collections::{HashMap, VecDeque};

use warship_core::{PathFinder, PathStep, TerrainMap, TileRef};

/// Number of tiles a naval pathfinder may expand per request by default.
pub const DEFAULT_ITERATION_BUDGET: u32 = 5_000;

/// Resumable breadth-first search over ocean tiles.
///
/// Each call to [`PathFinder::next_step`] expands at most `iteration_budget`
/// tiles. Searches that do not finish within the budget report
/// [`PathStep::Pending`] and resume from the stored frontier on the next call,
/// provided the mover stayed put and the destination did not change. Finished
/// routes are cached and replayed one tile per call while the mover follows
/// them.
#[derive(Clone, Debug)]
pub struct OceanPathFinder {
    iteration_budget: u32,
    route: Option<Route>,
    search: Option<Search>,
}

impl OceanPathFinder {
    /// Creates a pathfinder that expands at most `iteration_budget` tiles per call.
    #[must_use]
    pub fn new(iteration_budget: u32) -> Self {
        Self {
            iteration_budget: iteration_budget.max(1),
            route: None,
            search: None,
        }
    }

    fn follow_route(&mut self, from: TileRef, to: TileRef) -> Option<TileRef> {
        let route = self.route.as_mut()?;
        if route.destination != to || route.position != from {
            self.route = None;
            return None;
        }

        let next = route.remaining.pop_front();
        match next {
            Some(tile) => route.position = tile,
            None => self.route = None,
        }
        next
    }

    fn resume_search<M>(
        &mut self,
        map: &M,
        from: TileRef,
        to: TileRef,
        arrival_distance: u64,
    ) -> PathStep
    where
        M: TerrainMap + ?Sized,
    {
        let reusable = self.search.as_ref().is_some_and(|search| {
            search.origin == from && search.destination == to && search.arrival == arrival_distance
        });
        if !reusable {
            self.search = Some(Search::start(from, to, arrival_distance));
        }

        let Some(search) = self.search.as_mut() else {
            return PathStep::PathNotFound;
        };

        match search.expand(map, self.iteration_budget) {
            SearchProgress::Exhausted => {
                self.search = None;
                PathStep::PathNotFound
            }
            SearchProgress::Running => PathStep::Pending,
            SearchProgress::Reached(goal) => {
                let mut remaining = search.trace_back(goal);
                self.search = None;

                let Some(next) = remaining.pop_front() else {
                    return PathStep::Completed;
                };
                self.route = Some(Route {
                    destination: to,
                    position: next,
                    remaining,
                });
                PathStep::NextTile(next)
            }
        }
    }
}

impl Default for OceanPathFinder {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATION_BUDGET)
    }
}

impl PathFinder for OceanPathFinder {
    fn next_step<M>(
        &mut self,
        map: &M,
        from: TileRef,
        to: TileRef,
        arrival_distance: u64,
    ) -> PathStep
    where
        M: TerrainMap + ?Sized,
    {
        if map.manhattan_distance(from, to) < arrival_distance {
            self.route = None;
            self.search = None;
            return PathStep::Completed;
        }

        if let Some(next) = self.follow_route(from, to) {
            return PathStep::NextTile(next);
        }

        self.resume_search(map, from, to, arrival_distance)
    }
}

#[derive(Clone, Debug)]
struct Route {
    destination: TileRef,
    position: TileRef,
    remaining: VecDeque<TileRef>,
}

#[derive(Clone, Debug)]
struct Search {
    origin: TileRef,
    destination: TileRef,
    arrival: u64,
    frontier: VecDeque<TileRef>,
    came_from: HashMap<TileRef, TileRef>,
}

enum SearchProgress {
    Running,
    Reached(TileRef),
    Exhausted,
}

impl Search {
    fn start(origin: TileRef, destination: TileRef, arrival: u64) -> Self {
        let mut frontier = VecDeque::new();
        frontier.push_back(origin);
        let mut came_from = HashMap::new();
        let _ = came_from.insert(origin, origin);
        Self {
            origin,
            destination,
            arrival,
            frontier,
            came_from,
        }
    }

    fn expand<M>(&mut self, map: &M, budget: u32) -> SearchProgress
    where
        M: TerrainMap + ?Sized,
    {
        for _ in 0..budget {
            let Some(tile) = self.frontier.pop_front() else {
                return SearchProgress::Exhausted;
            };

            if map.manhattan_distance(tile, self.destination) < self.arrival {
                return SearchProgress::Reached(tile);
            }

            for neighbor in neighbors(map, tile) {
                if !map.is_ocean(neighbor) || self.came_from.contains_key(&neighbor) {
                    continue;
                }
                let _ = self.came_from.insert(neighbor, tile);
                self.frontier.push_back(neighbor);
            }
        }

        if self.frontier.is_empty() {
            SearchProgress::Exhausted
        } else {
            SearchProgress::Running
        }
    }

    /// Tiles from the step after the origin up to and including `goal`.
    fn trace_back(&self, goal: TileRef) -> VecDeque<TileRef> {
        let mut path = VecDeque::new();
        let mut current = goal;
        while current != self.origin {
            path.push_front(current);
            match self.came_from.get(&current) {
                Some(previous) => current = *previous,
                None => break,
            }
        }
        path
    }
}

fn neighbors<M>(map: &M, tile: TileRef) -> impl Iterator<Item = TileRef>
where
    M: TerrainMap + ?Sized,
{
    let x = map.x(tile);
    let y = map.y(tile);
    [
        map.tile(x, y - 1),
        map.tile(x + 1, y),
        map.tile(x, y + 1),
        map.tile(x - 1, y),
    ]
    .into_iter()
    .flatten()
}
