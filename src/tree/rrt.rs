use log::{debug, warn};
use nalgebra::Point2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::PlannerError;
use crate::tree::world::{Circle, CollisionWorld};
use crate::tree::{Tree, TreePlannerConfig};

/// Rapidly-exploring random tree planner. Owns its obstacle set and the tree of the last
/// [plan](TreePlanner::plan) call, which stays available for inspection afterwards.
#[derive(Clone, Debug)]
pub struct TreePlanner<R = StdRng> {
    pub(crate) config: TreePlannerConfig,
    pub(crate) world: CollisionWorld,
    pub(crate) tree: Tree,
    pub(crate) rng: R,
}

impl TreePlanner<StdRng> {
    /// Creates a planner drawing its samples from an entropy-seeded generator.
    pub fn new(config: TreePlannerConfig) -> Result<Self, PlannerError> {
        TreePlanner::with_rng(config, StdRng::from_entropy())
    }
    /// Creates a planner whose runs are reproducible from `seed`.
    pub fn seeded(config: TreePlannerConfig, seed: u64) -> Result<Self, PlannerError> {
        TreePlanner::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> TreePlanner<R> {
    pub fn with_rng(config: TreePlannerConfig, rng: R) -> Result<Self, PlannerError> {
        config.validate()?;
        Ok(TreePlanner {
            config,
            world: CollisionWorld::new(),
            tree: Tree::default(),
            rng,
        })
    }
    pub fn config(&self) -> &TreePlannerConfig {
        &self.config
    }
    pub fn world(&self) -> &CollisionWorld {
        &self.world
    }
    pub fn obstacles(&self) -> &[Circle] {
        self.world.circles()
    }
    /// Tree grown by the most recent call to [plan](TreePlanner::plan).
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn add_obstacle(&mut self, x: f64, y: f64, radius: f64) {
        self.world.add_circle(Circle::new(x, y, radius));
    }

    /// Adds `count` circles of the given radius with centers drawn uniformly from the part of
    /// the workspace where they fit entirely. Along an axis too short for the circle, the
    /// center is the middle of the workspace.
    pub fn add_random_obstacles(&mut self, count: usize, radius: f64) {
        for _ in 0..count {
            let x = sample_axis(&mut self.rng, radius, self.config.width);
            let y = sample_axis(&mut self.rng, radius, self.config.height);
            self.add_obstacle(x, y, radius);
        }
    }

    /// The goal with probability `goal_sample_rate`, a uniform point of the workspace otherwise.
    pub(crate) fn sample(&mut self, goal: &Point2<f64>) -> Point2<f64> {
        if self.rng.gen::<f64>() < self.config.goal_sample_rate {
            return *goal;
        }
        Point2::new(
            self.rng.gen_range(0.0..self.config.width),
            self.rng.gen_range(0.0..self.config.height),
        )
    }

    /// Moves from `from` toward `to` by at most `step_size`.
    pub fn steer(&self, from: &Point2<f64>, to: &Point2<f64>) -> Point2<f64> {
        let delta = to - from;
        let dist = delta.norm();
        if dist < self.config.step_size {
            *to
        } else {
            from + delta * (self.config.step_size / dist)
        }
    }

    /// Whether a node at `point` captures the goal: close enough and with a free final leg.
    pub(crate) fn connects_to_goal(
        &self,
        point: &Point2<f64>,
        goal: &Point2<f64>,
        goal_threshold: f64,
    ) -> bool {
        nalgebra::distance(point, goal) < goal_threshold && self.world.is_segment_free(point, goal)
    }

    /// Samples a point, steers the nearest node toward it and returns the index of that node
    /// together with the new collision-free point, if any.
    pub(crate) fn extend(&mut self, goal: &Point2<f64>) -> Option<(usize, Point2<f64>)> {
        let target = self.sample(goal);
        let nearest = self.tree.nearest(&target)?;
        let from = self.tree.node(nearest).position;
        let new_point = self.steer(&from, &target);
        if new_point == from || !self.world.is_segment_free(&from, &new_point) {
            return None;
        }
        Some((nearest, new_point))
    }

    /// Ends the tree path at `index` exactly at `goal`, unless the node already sits on it.
    pub(crate) fn append_goal(&mut self, index: usize, goal: Point2<f64>) -> usize {
        if self.tree.node(index).position == goal {
            index
        } else {
            self.tree.push(goal, index)
        }
    }

    /// Grows a tree from `start` until a node lands within `goal_threshold` of `goal`, then
    /// returns the tree path from start to the exact goal. Returns an empty path if the
    /// iteration budget runs out first.
    pub fn plan(
        &mut self,
        start: Point2<f64>,
        goal: Point2<f64>,
        goal_threshold: f64,
    ) -> Vec<Point2<f64>> {
        self.tree.reset(start);
        for iteration in 0..self.config.max_iterations {
            let Some((nearest, new_point)) = self.extend(&goal) else {
                continue;
            };
            let new_index = self.tree.push(new_point, nearest);
            if self.connects_to_goal(&new_point, &goal, goal_threshold) {
                let goal_index = self.append_goal(new_index, goal);
                debug!(
                    "RRT reached the goal after {} iterations with {} nodes",
                    iteration + 1,
                    self.tree.len()
                );
                return self.tree.path_to(goal_index);
            }
        }
        warn!("RRT failed after {} iterations", self.config.max_iterations);
        Vec::new()
    }
}

fn sample_axis<R: Rng>(rng: &mut R, radius: f64, extent: f64) -> f64 {
    if radius < extent - radius {
        rng.gen_range(radius..=extent - radius)
    } else {
        extent / 2.0
    }
}
