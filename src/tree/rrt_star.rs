use log::{debug, warn};
use nalgebra::Point2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::PlannerError;
use crate::tree::rrt::TreePlanner;
use crate::tree::world::{Circle, CollisionWorld};
use crate::tree::{Tree, TreePlannerConfig};

/// RRT with parent selection and rewiring within `neighbor_radius` of every new node. Unlike
/// [TreePlanner], it keeps growing for the whole iteration budget and returns the cheapest
/// route to the goal found among all nodes that captured it.
#[derive(Clone, Debug)]
pub struct OptimalTreePlanner<R = StdRng> {
    base: TreePlanner<R>,
    neighbor_radius: f64,
}

impl OptimalTreePlanner<StdRng> {
    pub fn new(config: TreePlannerConfig, neighbor_radius: f64) -> Result<Self, PlannerError> {
        OptimalTreePlanner::with_rng(config, neighbor_radius, StdRng::from_entropy())
    }
    pub fn seeded(
        config: TreePlannerConfig,
        neighbor_radius: f64,
        seed: u64,
    ) -> Result<Self, PlannerError> {
        OptimalTreePlanner::with_rng(config, neighbor_radius, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> OptimalTreePlanner<R> {
    pub fn with_rng(
        config: TreePlannerConfig,
        neighbor_radius: f64,
        rng: R,
    ) -> Result<Self, PlannerError> {
        if !(neighbor_radius.is_finite() && neighbor_radius >= 0.0) {
            return Err(PlannerError::InvalidNeighborRadius(neighbor_radius));
        }
        Ok(OptimalTreePlanner {
            base: TreePlanner::with_rng(config, rng)?,
            neighbor_radius,
        })
    }
    pub fn neighbor_radius(&self) -> f64 {
        self.neighbor_radius
    }
    pub fn config(&self) -> &TreePlannerConfig {
        self.base.config()
    }
    pub fn world(&self) -> &CollisionWorld {
        self.base.world()
    }
    pub fn obstacles(&self) -> &[Circle] {
        self.base.obstacles()
    }
    pub fn tree(&self) -> &Tree {
        self.base.tree()
    }
    pub fn add_obstacle(&mut self, x: f64, y: f64, radius: f64) {
        self.base.add_obstacle(x, y, radius);
    }
    pub fn add_random_obstacles(&mut self, count: usize, radius: f64) {
        self.base.add_random_obstacles(count, radius);
    }
    pub fn steer(&self, from: &Point2<f64>, to: &Point2<f64>) -> Point2<f64> {
        self.base.steer(from, to)
    }

    /// Cheapest node among `near` (and `nearest`) that reaches `point` along a free segment.
    fn choose_parent(&self, nearest: usize, near: &[usize], point: &Point2<f64>) -> usize {
        let tree = &self.base.tree;
        let mut parent = nearest;
        let from = tree.node(nearest);
        let mut best = from.cost + nalgebra::distance(&from.position, point);
        for &candidate in near {
            let node = tree.node(candidate);
            let cost = node.cost + nalgebra::distance(&node.position, point);
            if cost < best && self.base.world.is_segment_free(&node.position, point) {
                parent = candidate;
                best = cost;
            }
        }
        parent
    }

    /// Routes every neighbour through `new_index` when that shortens its path from the root.
    fn rewire(&mut self, new_index: usize, near: &[usize]) {
        let tree = &mut self.base.tree;
        let new_node = tree.node(new_index).clone();
        for &neighbor in near {
            if Some(neighbor) == new_node.parent {
                continue;
            }
            let node = tree.node(neighbor);
            let cost = new_node.cost + nalgebra::distance(&new_node.position, &node.position);
            if cost < node.cost
                && !tree.is_ancestor(neighbor, new_index)
                && self.base.world.is_segment_free(&new_node.position, &node.position)
            {
                tree.reparent(neighbor, new_index);
            }
        }
    }

    /// Runs the full iteration budget, then returns the path from `start` through the node
    /// with the lowest total cost to `goal`, ending exactly at `goal`. Returns an empty path if
    /// no node ever got within `goal_threshold` of the goal.
    pub fn plan(
        &mut self,
        start: Point2<f64>,
        goal: Point2<f64>,
        goal_threshold: f64,
    ) -> Vec<Point2<f64>> {
        self.base.tree.reset(start);
        let mut goal_candidates = Vec::new();
        for _ in 0..self.base.config.max_iterations {
            let Some((nearest, new_point)) = self.base.extend(&goal) else {
                continue;
            };
            let near = self.base.tree.near(&new_point, self.neighbor_radius);
            let parent = self.choose_parent(nearest, &near, &new_point);
            let new_index = self.base.tree.push(new_point, parent);
            self.rewire(new_index, &near);
            if self.base.connects_to_goal(&new_point, &goal, goal_threshold) {
                goal_candidates.push(new_index);
            }
        }

        // Rewiring may have lowered the cost of earlier candidates, so compare them only now.
        let tree = &self.base.tree;
        let best = goal_candidates
            .iter()
            .map(|&i| {
                let node = tree.node(i);
                (i, node.cost + nalgebra::distance(&node.position, &goal))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1));
        match best {
            Some((index, cost)) => {
                debug!(
                    "RRT* found {} goal candidates among {} nodes, best cost {:.3}",
                    goal_candidates.len(),
                    tree.len(),
                    cost
                );
                let goal_index = self.base.append_goal(index, goal);
                self.base.tree.path_to(goal_index)
            }
            None => {
                warn!(
                    "RRT* failed after {} iterations",
                    self.base.config.max_iterations
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_length;

    fn planner(max_iterations: usize, seed: u64) -> OptimalTreePlanner {
        let config = TreePlannerConfig::new(50.0, 50.0, 3.0, max_iterations, 0.1);
        OptimalTreePlanner::seeded(config, 10.0, seed).unwrap()
    }

    #[test]
    fn costs_match_parent_chains() {
        let mut planner = planner(1500, 7);
        planner.add_obstacle(25.0, 25.0, 8.0);
        let path = planner.plan(Point2::new(5.0, 5.0), Point2::new(45.0, 45.0), 4.0);
        assert!(!path.is_empty());
        let tree = planner.tree();
        for i in 0..tree.len() {
            assert!((tree.node(i).cost - tree.chain_cost(i)).abs() < 1e-6);
            // Every chain ends at the root, so rewiring never introduced a cycle.
            assert_eq!(tree.path_to(i).first(), Some(&Point2::new(5.0, 5.0)));
            assert!(tree.path_to(i).len() <= tree.len());
        }
        for w in path.windows(2) {
            assert!(planner.world().is_segment_free(&w[0], &w[1]));
        }
    }

    #[test]
    fn path_cost_matches_goal_node() {
        let mut planner = planner(800, 3);
        let goal = Point2::new(40.0, 10.0);
        let path = planner.plan(Point2::new(5.0, 5.0), goal, 4.0);
        assert_eq!(path.last(), Some(&goal));
        // The goal node is either appended last or was itself steered onto the goal.
        let goal_cost = planner
            .tree()
            .nodes()
            .iter()
            .filter(|n| n.position == goal)
            .map(|n| n.cost)
            .fold(f64::INFINITY, f64::min);
        assert!((path_length(&path) - goal_cost).abs() < 1e-6);
        // The straight line is a lower bound.
        assert!(path_length(&path) >= nalgebra::distance(&Point2::new(5.0, 5.0), &goal) - 1e-9);
    }

    /// Tree `(0, 0) -> (0, 8) -> (6, 8) -> (6, 17)`, so `(6, 8)` is reached the long way round.
    fn detour_planner() -> OptimalTreePlanner {
        let mut planner = planner(0, 0);
        let tree = &mut planner.base.tree;
        tree.reset(Point2::new(0.0, 0.0));
        let a = tree.push(Point2::new(0.0, 8.0), 0);
        let b = tree.push(Point2::new(6.0, 8.0), a);
        tree.push(Point2::new(6.0, 17.0), b);
        planner
    }

    #[test]
    fn parent_is_cheapest_not_nearest() {
        let mut planner = detour_planner();
        let point = Point2::new(6.0, 6.0);
        let nearest = planner.tree().nearest(&point).unwrap();
        assert_eq!(nearest, 2);
        let near = planner.tree().near(&point, 10.0);
        assert_eq!(near, vec![0, 1, 2]);
        assert_eq!(planner.choose_parent(nearest, &near, &point), 0);
        // With the root cut off, the next cheapest free connection wins over the nearest node.
        planner.add_obstacle(3.0, 3.0, 1.0);
        assert_eq!(planner.choose_parent(nearest, &near, &point), 1);
    }

    #[test]
    fn rewire_shortens_neighbours() {
        let mut planner = detour_planner();
        let point = Point2::new(6.0, 6.0);
        let near = planner.tree().near(&point, 10.0);
        let new_index = planner.base.tree.push(point, 0);
        planner.rewire(new_index, &near);
        let direct = 72f64.sqrt();
        let tree = planner.tree();
        assert_eq!(tree.node(2).parent, Some(new_index));
        assert!((tree.node(2).cost - (direct + 2.0)).abs() < 1e-9);
        assert!(tree.node(2).cost < 14.0);
        // The descendant outside the radius follows its parent.
        assert!((tree.node(3).cost - (direct + 11.0)).abs() < 1e-9);
        assert!(tree.children(1).is_empty());
        // (0, 8) is already cheaper through the root.
        assert_eq!(tree.node(1).parent, Some(0));
        assert_eq!(tree.node(1).cost, 8.0);
    }

    #[test]
    fn rewire_skips_blocked_connections() {
        let mut planner = detour_planner();
        planner.add_obstacle(6.0, 7.0, 0.5);
        let point = Point2::new(6.0, 6.0);
        let near = planner.tree().near(&point, 10.0);
        let new_index = planner.base.tree.push(point, 0);
        planner.rewire(new_index, &near);
        assert_eq!(planner.tree().node(2).parent, Some(1));
        assert_eq!(planner.tree().node(2).cost, 14.0);
    }

    #[test]
    fn goal_reached_exactly_is_not_duplicated() {
        let config = TreePlannerConfig::new(50.0, 50.0, 5.0, 10, 1.0);
        let mut planner = OptimalTreePlanner::seeded(config, 10.0, 0).unwrap();
        let start = Point2::new(0.0, 0.0);
        let goal = Point2::new(3.0, 0.0);
        assert_eq!(planner.plan(start, goal, 1.0), vec![start, goal]);
        assert_eq!(planner.tree().len(), 2);
    }

    #[test]
    fn unreachable_goal_returns_empty() {
        let mut planner = planner(300, 0);
        planner.add_obstacle(40.0, 40.0, 8.0);
        assert!(planner
            .plan(Point2::new(5.0, 5.0), Point2::new(40.0, 40.0), 5.0)
            .is_empty());
    }

    #[test]
    fn invalid_radius_is_rejected() {
        let config = TreePlannerConfig::default();
        assert_eq!(
            OptimalTreePlanner::seeded(config.clone(), -1.0, 0).unwrap_err(),
            PlannerError::InvalidNeighborRadius(-1.0)
        );
        assert!(OptimalTreePlanner::seeded(config, 0.0, 0).is_ok());
    }
}
