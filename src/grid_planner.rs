use grid_util::point::Point;
use log::{debug, info, warn};
use smallvec::SmallVec;

use crate::astar_search::astar;
use crate::occupancy_grid::OccupancyGrid;
use crate::{line_cells, DIAGONAL_COST, N_SMALLVEC_SIZE, ORTHOGONAL_COST};

/// A* search over the free cells of an [OccupancyGrid].
///
/// Orthogonal moves cost [ORTHOGONAL_COST] and diagonal moves cost [DIAGONAL_COST]. The
/// heuristic is the Euclidean distance to the goal times `heuristic_factor`, which is
/// admissible and consistent for both neighbourhoods as long as the factor is at most 1.
#[derive(Clone, Debug)]
pub struct GridSearchPlanner<'a> {
    grid: &'a OccupancyGrid,
    pub allow_diagonal: bool,
    /// Whether a diagonal move may squeeze between two blocked orthogonal neighbours.
    pub allow_corner_cutting: bool,
    pub heuristic_factor: f64,
}

impl<'a> GridSearchPlanner<'a> {
    pub fn new(grid: &'a OccupancyGrid, allow_diagonal: bool) -> GridSearchPlanner<'a> {
        GridSearchPlanner {
            grid,
            allow_diagonal,
            allow_corner_cutting: true,
            heuristic_factor: 1.0,
        }
    }
    pub fn with_corner_cutting(mut self, allow_corner_cutting: bool) -> Self {
        self.allow_corner_cutting = allow_corner_cutting;
        self
    }
    /// A factor of 0 turns the search into Dijkstra's algorithm, factors above 1 give up the
    /// optimality guarantee in exchange for fewer expansions.
    pub fn with_heuristic_factor(mut self, heuristic_factor: f64) -> Self {
        self.heuristic_factor = heuristic_factor;
        self
    }
    pub fn grid(&self) -> &OccupancyGrid {
        self.grid
    }

    pub fn heuristic(&self, p1: &Point, p2: &Point) -> f64 {
        let dx = (p1.x - p2.x) as f64;
        let dy = (p1.y - p2.y) as f64;
        dx.hypot(dy) * self.heuristic_factor
    }

    /// Cost of a single move between neighbouring cells.
    pub fn cost(&self, p1: &Point, p2: &Point) -> f64 {
        if p1.x != p2.x && p1.y != p2.y {
            DIAGONAL_COST
        } else {
            ORTHOGONAL_COST
        }
    }

    pub fn can_move_to(&self, pos: Point, start: Point) -> bool {
        if self.allow_corner_cutting {
            self.grid.is_free_point(&pos)
        } else {
            debug_assert!((start.x - pos.x).abs() <= 1 && (start.y - pos.y).abs() <= 1);
            self.grid.is_free_point(&pos)
                && self.grid.is_free(start.x, pos.y)
                && self.grid.is_free(pos.x, start.y)
        }
    }

    pub fn neighborhood_points(&self, point: &Point) -> SmallVec<[Point; N_SMALLVEC_SIZE]> {
        if self.allow_diagonal {
            point.moore_neighborhood_smallvec()
        } else {
            point.neumann_neighborhood_smallvec()
        }
    }

    pub fn neighborhood_points_and_cost(
        &self,
        pos: &Point,
    ) -> SmallVec<[(Point, f64); N_SMALLVEC_SIZE]> {
        self.neighborhood_points(pos)
            .into_iter()
            .filter(|p| self.can_move_to(*p, *pos))
            .map(|p| (p, self.cost(pos, &p)))
            .collect()
    }

    /// Computes a shortest path from start to goal, both included. Returns an empty path if
    /// either endpoint is blocked or the goal cannot be reached.
    pub fn plan(&self, start: Point, goal: Point) -> Vec<Point> {
        if !self.grid.is_free_point(&start) {
            warn!("Start position ({}, {}) is blocked", start.x, start.y);
            return Vec::new();
        }
        if !self.grid.is_free_point(&goal) {
            warn!("Goal position ({}, {}) is blocked", goal.x, goal.y);
            return Vec::new();
        }
        // Components are only trusted when they reflect every obstacle on the grid.
        if !self.grid.components_dirty && self.grid.unreachable(&start, &goal) {
            info!(
                "({}, {}) is not reachable from ({}, {})",
                goal.x, goal.y, start.x, start.y
            );
            return Vec::new();
        }
        match astar(
            &start,
            |node| self.neighborhood_points_and_cost(node),
            |point| self.heuristic(point, &goal),
            |point| *point == goal,
        ) {
            Some((path, cost)) => {
                debug!(
                    "Found path with {} waypoints and cost {:.3}",
                    path.len(),
                    cost
                );
                path
            }
            None => {
                info!("No path found");
                Vec::new()
            }
        }
    }

    /// Checks that every cell sampled along the segment between two cells is free.
    pub fn has_line_of_sight(&self, p1: &Point, p2: &Point) -> bool {
        line_cells(*p1, *p2).all(|p| self.grid.is_free_point(&p))
    }

    /// Greedy shortcutting: from the current waypoint, jumps to the farthest later waypoint
    /// that is in line of sight. The result is a subsequence of `path` with the same
    /// endpoints.
    pub fn smooth_path(&self, path: &[Point]) -> Vec<Point> {
        if path.len() <= 2 {
            return path.to_vec();
        }
        let mut smoothed = vec![path[0]];
        let mut i = 0;
        while i < path.len() - 1 {
            let mut j = path.len() - 1;
            while j > i + 1 && !self.has_line_of_sight(&path[i], &path[j]) {
                j -= 1;
            }
            smoothed.push(path[j]);
            i = j;
        }
        debug!(
            "Smoothed path from {} to {} waypoints",
            path.len(),
            smoothed.len()
        );
        smoothed
    }
}
