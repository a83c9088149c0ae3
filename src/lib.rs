//! # route_planning
//!
//! Collision-free route planning for an agent in a static 2D workspace. Two independent
//! strategies are provided:
//!
//! - [GridSearchPlanner](grid_planner::GridSearchPlanner): [A*](https://en.wikipedia.org/wiki/A*_search_algorithm)
//!   over the 4- or 8-connected free cells of an [OccupancyGrid](occupancy_grid::OccupancyGrid),
//!   with a Euclidean heuristic and greedy line-of-sight smoothing of the result.
//! - [TreePlanner](tree::rrt::TreePlanner) and [OptimalTreePlanner](tree::rrt_star::OptimalTreePlanner):
//!   [RRT and RRT*](https://en.wikipedia.org/wiki/Rapidly_exploring_random_tree) in a continuous
//!   workspace populated with circular obstacles.
//!
//! Planning failures are reported as an empty waypoint sequence. All randomness comes from an
//! explicitly owned or passed [rand::Rng], so every run can be reproduced from a seed.
pub mod astar_search;
pub mod error;
pub mod grid_planner;
pub mod occupancy_grid;
pub mod tree;

use grid_util::point::Point;
use itertools::Itertools;
use nalgebra::Point2;

pub use error::PlannerError;
pub use grid_planner::GridSearchPlanner;
pub use occupancy_grid::OccupancyGrid;
pub use tree::rrt::TreePlanner;
pub use tree::rrt_star::OptimalTreePlanner;
pub use tree::world::{Circle, CollisionWorld};
pub use tree::{Tree, TreeNode, TreePlannerConfig};

/// Cost of a horizontal or vertical move on the grid.
pub const ORTHOGONAL_COST: f64 = 1.0;
/// Cost of a diagonal move on the grid.
pub const DIAGONAL_COST: f64 = std::f64::consts::SQRT_2;
pub(crate) const N_SMALLVEC_SIZE: usize = 8;

/// Cells visited when walking the segment from `start` to `end` at unit resolution along its
/// longer axis, both ends included. Consecutive cells are neighbours in the 8-neighbourhood.
pub fn line_cells(start: Point, end: Point) -> impl Iterator<Item = Point> {
    let dx = (end.x - start.x) as i64;
    let dy = (end.y - start.y) as i64;
    let steps = dx.abs().max(dy.abs());
    (0..=steps).map(move |i| {
        if steps == 0 {
            start
        } else {
            // Floor division matches truncating the sampled coordinate to its cell.
            Point::new(
                start.x + (i * dx).div_euclid(steps) as i32,
                start.y + (i * dy).div_euclid(steps) as i32,
            )
        }
    })
}

/// Turns waypoints into a path on the grid which can be followed step by step, passing through
/// exactly the cells a line-of-sight check between consecutive waypoints inspects.
pub fn waypoints_to_path(waypoints: &[Point]) -> Vec<Point> {
    let mut path: Vec<Point> = waypoints.first().copied().into_iter().collect();
    for (current, next) in waypoints.iter().tuple_windows() {
        path.extend(line_cells(*current, *next).skip(1));
    }
    path
}

/// Euclidean length of a sequence of grid waypoints.
pub fn grid_path_length(path: &[Point]) -> f64 {
    path.iter()
        .tuple_windows()
        .map(|(a, b)| ((b.x - a.x) as f64).hypot((b.y - a.y) as f64))
        .sum()
}

/// Euclidean length of a sequence of continuous waypoints.
pub fn path_length(path: &[Point2<f64>]) -> f64 {
    path.iter()
        .tuple_windows()
        .map(|(a, b)| nalgebra::distance(a, b))
        .sum()
}
