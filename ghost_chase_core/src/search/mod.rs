//! Grid path search over a [`ConnectivityGrid`].
//!
//! Breadth-first, depth-first and uniform-cost search share one engine and
//! differ only in the frontier they pop from. An unreachable goal, or a
//! start or goal that is a wall or out of bounds, yields an empty path.

use std::{
    collections::{BinaryHeap, VecDeque},
    fmt,
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{Direction, Position, config::ConfigError, connectivity::ConnectivityGrid, map::Grid};

mod frontier;

use frontier::Frontier;

/// Neighbour expansion order. Depth-first walks it backwards.
const NEIGHBOR_ORDER: [Direction; 4] = [
    Direction::North,
    Direction::South,
    Direction::East,
    Direction::West,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Algorithm {
    #[default]
    BreadthFirst,
    DepthFirst,
    UniformCost,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [
        Algorithm::BreadthFirst,
        Algorithm::DepthFirst,
        Algorithm::UniformCost,
    ];

    /// Waypoints from `start` to `goal` inclusive, or empty if there is no path.
    pub fn find_path(
        self,
        grid: &ConnectivityGrid,
        start: Position,
        goal: Position,
    ) -> Vec<Position> {
        let mut stepper = self.stepper(grid, start, goal);
        let path = loop {
            match stepper.step() {
                SearchStep::Expanded { .. } => {}
                SearchStep::Found(path) => break path,
                SearchStep::Exhausted => break Vec::new(),
            }
        };
        trace!(
            algorithm = %self,
            ?start,
            ?goal,
            explored = stepper.explored().len(),
            length = path.len(),
            "search finished"
        );
        path
    }

    pub fn stepper(
        self,
        grid: &ConnectivityGrid,
        start: Position,
        goal: Position,
    ) -> SearchStepper<'_> {
        SearchStepper::new(grid, self, start, goal)
    }
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bfs" | "breadth-first" => Ok(Algorithm::BreadthFirst),
            "dfs" | "depth-first" => Ok(Algorithm::DepthFirst),
            "dijkstra" | "ucs" | "uniform-cost" => Ok(Algorithm::UniformCost),
            _ => Err(ConfigError::UnknownAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Algorithm::BreadthFirst => "bfs",
            Algorithm::DepthFirst => "dfs",
            Algorithm::UniformCost => "dijkstra",
        })
    }
}

pub fn bfs_path(grid: &ConnectivityGrid, start: Position, goal: Position) -> Vec<Position> {
    Algorithm::BreadthFirst.find_path(grid, start, goal)
}

pub fn dfs_path(grid: &ConnectivityGrid, start: Position, goal: Position) -> Vec<Position> {
    Algorithm::DepthFirst.find_path(grid, start, goal)
}

pub fn dijkstra_path(grid: &ConnectivityGrid, start: Position, goal: Position) -> Vec<Position> {
    Algorithm::UniformCost.find_path(grid, start, goal)
}

/// Result of advancing a [`SearchStepper`] by one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStep {
    /// `current` was popped and its neighbours queued; `frontier` nodes remain open.
    Expanded { current: Position, frontier: usize },
    Found(Vec<Position>),
    Exhausted,
}

/// A search that advances one frontier pop per [`SearchStepper::step`].
///
/// Between steps the explored set, the open frontier and the parent links
/// can be read for drawing.
#[derive(Debug, Clone)]
pub struct SearchStepper<'a> {
    grid: &'a ConnectivityGrid,
    algorithm: Algorithm,
    start: Position,
    goal: Position,
    frontier: Frontier,
    discovered: Grid<bool>,
    parent: Grid<Option<Position>>,
    cost: Grid<u32>,
    explored: Vec<Position>,
    finished: Option<Vec<Position>>,
}

impl<'a> SearchStepper<'a> {
    pub fn new(
        grid: &'a ConnectivityGrid,
        algorithm: Algorithm,
        start: Position,
        goal: Position,
    ) -> Self {
        let (width, height) = (grid.width(), grid.height());
        let mut stepper = SearchStepper {
            grid,
            algorithm,
            start,
            goal,
            frontier: match algorithm {
                Algorithm::BreadthFirst => Frontier::Fifo(VecDeque::new()),
                Algorithm::DepthFirst => Frontier::Lifo(Vec::new()),
                Algorithm::UniformCost => Frontier::Priority {
                    heap: BinaryHeap::new(),
                    pushed: 0,
                },
            },
            discovered: Grid::filled(width, height, false),
            parent: Grid::filled(width, height, None),
            cost: Grid::filled(width, height, u32::MAX),
            explored: Vec::new(),
            finished: None,
        };

        if grid.is_walkable(start) && grid.is_walkable(goal) {
            stepper.discovered[start] = true;
            stepper.cost[start] = 0;
            stepper.frontier.push(start, 0);
        } else {
            stepper.finished = Some(Vec::new());
        }
        stepper
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn step(&mut self) -> SearchStep {
        if let Some(path) = &self.finished {
            return Self::terminal(path);
        }

        let current = loop {
            let Some((position, queued_cost)) = self.frontier.pop() else {
                self.finished = Some(Vec::new());
                return SearchStep::Exhausted;
            };
            // A cheaper route was queued after this entry.
            if queued_cost.is_some_and(|queued| queued > self.cost[position]) {
                continue;
            }
            break position;
        };
        self.explored.push(current);

        if current == self.goal {
            let path = self.reconstruct();
            self.frontier.clear();
            self.finished = Some(path.clone());
            return SearchStep::Found(path);
        }

        let mut order = NEIGHBOR_ORDER;
        if self.algorithm == Algorithm::DepthFirst {
            order.reverse();
        }
        let next_cost = self.cost[current].saturating_add(1);
        let neighbors: Vec<Position> = self.grid.open_neighbors(current, order).collect();
        for next in neighbors {
            match self.algorithm {
                Algorithm::UniformCost => {
                    if next_cost < self.cost[next] {
                        self.cost[next] = next_cost;
                        self.parent[next] = Some(current);
                        self.frontier.push(next, next_cost);
                    }
                }
                Algorithm::BreadthFirst | Algorithm::DepthFirst => {
                    if !self.discovered[next] {
                        self.discovered[next] = true;
                        self.cost[next] = next_cost;
                        self.parent[next] = Some(current);
                        self.frontier.push(next, next_cost);
                    }
                }
            }
        }

        SearchStep::Expanded {
            current,
            frontier: self.frontier.len(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    /// Nodes popped so far, in order.
    pub fn explored(&self) -> &[Position] {
        &self.explored
    }

    /// Nodes still waiting in the frontier. May include stale entries for
    /// uniform-cost search.
    pub fn frontier(&self) -> impl Iterator<Item = Position> + '_ {
        self.frontier.iter()
    }

    pub fn parent_of(&self, position: Position) -> Option<Position> {
        self.parent.get(position.x, position.y).copied().flatten()
    }

    fn terminal(path: &[Position]) -> SearchStep {
        if path.is_empty() {
            SearchStep::Exhausted
        } else {
            SearchStep::Found(path.to_vec())
        }
    }

    fn reconstruct(&self) -> Vec<Position> {
        let mut path = vec![self.goal];
        let mut current = self.goal;
        while current != self.start {
            match self.parent[current] {
                Some(previous) => {
                    path.push(previous);
                    current = previous;
                }
                None => return Vec::new(),
            }
        }
        path.reverse();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;

    /// Two routes from S to (7, 3): a short one along the top and a long
    /// one around the bottom. Ghosts 0-2 sit in a sealed pocket.
    const LOOP: &str = "
#########
#S......#
#.#####.#
#.#012#.#
#.#####.#
#.....3.#
#########
";

    fn grid(map: &str) -> ConnectivityGrid {
        map.parse::<Level>().unwrap().connectivity()
    }

    fn assert_valid(grid: &ConnectivityGrid, path: &[Position], start: Position, goal: Position) {
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
        for pair in path.windows(2) {
            let direction = Direction::between(pair[0], pair[1]).expect("adjacent waypoints");
            assert!(grid.is_open(pair[0], direction));
        }
    }

    #[test]
    fn bfs_and_dijkstra_find_the_short_way_round() {
        let grid = grid(LOOP);
        let (start, goal) = (Position::new(1, 1), Position::new(7, 3));
        let bfs = bfs_path(&grid, start, goal);
        let dijkstra = dijkstra_path(&grid, start, goal);
        assert_eq!(bfs.len(), 9);
        assert_eq!(dijkstra.len(), bfs.len());
        assert_valid(&grid, &bfs, start, goal);
        assert_valid(&grid, &dijkstra, start, goal);
    }

    #[test]
    fn dfs_finds_a_valid_path() {
        let grid = grid(LOOP);
        let (start, goal) = (Position::new(1, 1), Position::new(7, 3));
        let path = dfs_path(&grid, start, goal);
        assert_valid(&grid, &path, start, goal);
        // South is tried before east, so it takes the long way.
        assert_eq!(path.len(), 13);
    }

    #[test]
    fn walls_and_out_of_bounds_give_empty_paths() {
        let grid = grid(LOOP);
        let floor = Position::new(1, 1);
        for algorithm in Algorithm::ALL {
            assert!(algorithm.find_path(&grid, Position::new(0, 0), floor).is_empty());
            assert!(algorithm.find_path(&grid, floor, Position::new(2, 2)).is_empty());
            assert!(algorithm.find_path(&grid, floor, Position::new(50, 1)).is_empty());
        }
    }

    #[test]
    fn enclosed_goal_is_unreachable() {
        // The ghost-start pocket in the middle has no way out.
        let grid = grid(LOOP);
        for algorithm in Algorithm::ALL {
            let path = algorithm.find_path(&grid, Position::new(1, 1), Position::new(4, 3));
            assert!(path.is_empty(), "{algorithm} reached a sealed tile");
        }
    }

    #[test]
    fn start_equal_to_goal_is_a_single_waypoint() {
        let grid = grid(LOOP);
        let here = Position::new(3, 5);
        for algorithm in Algorithm::ALL {
            assert_eq!(algorithm.find_path(&grid, here, here), vec![here]);
        }
    }

    #[test]
    fn stepper_exposes_progress() {
        let grid = grid(LOOP);
        let mut stepper =
            Algorithm::BreadthFirst.stepper(&grid, Position::new(1, 1), Position::new(7, 3));
        assert_eq!(
            stepper.step(),
            SearchStep::Expanded {
                current: Position::new(1, 1),
                frontier: 2
            }
        );
        assert_eq!(stepper.parent_of(Position::new(2, 1)), Some(Position::new(1, 1)));
        assert_eq!(stepper.frontier().count(), 2);

        let mut steps = 1;
        let path = loop {
            steps += 1;
            match stepper.step() {
                SearchStep::Expanded { .. } => {}
                SearchStep::Found(path) => break path,
                SearchStep::Exhausted => panic!("goal is reachable"),
            }
        };
        assert_eq!(path.len(), 9);
        assert_eq!(stepper.explored().len(), steps);
        assert!(stepper.is_finished());
        assert_eq!(stepper.step(), SearchStep::Found(path));
    }

    #[test]
    fn outdated_queue_entries_are_not_expanded_again() {
        let grid = grid(LOOP);
        let (start, goal) = (Position::new(1, 1), Position::new(7, 3));
        let mut stepper = Algorithm::UniformCost.stepper(&grid, start, goal);
        // A costlier duplicate of the start, which settles at cost 0 first.
        stepper.frontier.push(start, 3);
        let path = loop {
            match stepper.step() {
                SearchStep::Expanded { .. } => {}
                SearchStep::Found(path) => break path,
                SearchStep::Exhausted => panic!("goal is reachable"),
            }
        };
        assert_eq!(path.len(), 9);
        assert_valid(&grid, &path, start, goal);
        let expansions = stepper.explored().iter().filter(|p| **p == start).count();
        assert_eq!(expansions, 1);
    }

    #[test]
    fn algorithm_names_parse() {
        assert_eq!("BFS".parse(), Ok(Algorithm::BreadthFirst));
        assert_eq!("dfs".parse(), Ok(Algorithm::DepthFirst));
        assert_eq!("dijkstra".parse(), Ok(Algorithm::UniformCost));
        assert_eq!(
            "astar".parse::<Algorithm>(),
            Err(ConfigError::UnknownAlgorithm("astar".to_string()))
        );
        assert_eq!(Algorithm::UniformCost.to_string(), "dijkstra");
    }
}
