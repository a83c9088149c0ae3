//! Sampling-based planners growing a tree of poses through a continuous workspace.
use nalgebra::Point2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::PlannerError;

pub mod rrt;
pub mod rrt_star;
pub mod world;

/// Capture radius used when callers have no better value.
pub const DEFAULT_GOAL_THRESHOLD: f64 = 5.0;
/// Rewiring radius used by [OptimalTreePlanner](rrt_star::OptimalTreePlanner) by default.
pub const DEFAULT_NEIGHBOR_RADIUS: f64 = 15.0;

/// Workspace and growth parameters shared by the tree planners.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TreePlannerConfig {
    pub width: f64,
    pub height: f64,
    /// Maximum length of a new tree edge.
    pub step_size: f64,
    pub max_iterations: usize,
    /// Probability of sampling the goal instead of a uniform point.
    pub goal_sample_rate: f64,
}

impl Default for TreePlannerConfig {
    fn default() -> Self {
        TreePlannerConfig {
            width: 100.0,
            height: 100.0,
            step_size: 5.0,
            max_iterations: 5000,
            goal_sample_rate: 0.1,
        }
    }
}

impl TreePlannerConfig {
    pub fn new(
        width: f64,
        height: f64,
        step_size: f64,
        max_iterations: usize,
        goal_sample_rate: f64,
    ) -> TreePlannerConfig {
        TreePlannerConfig {
            width,
            height,
            step_size,
            max_iterations,
            goal_sample_rate,
        }
    }

    pub fn validate(&self) -> Result<(), PlannerError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.width) || !positive(self.height) {
            return Err(PlannerError::InvalidWorkspace {
                width: self.width,
                height: self.height,
            });
        }
        if !positive(self.step_size) {
            return Err(PlannerError::InvalidStepSize(self.step_size));
        }
        if !(0.0..=1.0).contains(&self.goal_sample_rate) {
            return Err(PlannerError::InvalidGoalSampleRate(self.goal_sample_rate));
        }
        Ok(())
    }
}

/// Pose in the tree. `parent` is the index of an earlier node of the same [Tree], [None] for
/// the root, and `cost` is the length of the parent chain back to the root.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeNode {
    pub position: Point2<f64>,
    pub parent: Option<usize>,
    pub cost: f64,
}

/// Arena of [TreeNode]s forming a rooted tree. Nodes are only ever appended and keep their
/// index for the lifetime of the tree, so indices serve as stable handles for parent links.
#[derive(Clone, Debug, Default)]
pub struct Tree {
    nodes: Vec<TreeNode>,
    children: Vec<SmallVec<[usize; 4]>>,
}

impl Tree {
    pub fn with_root(root: Point2<f64>) -> Tree {
        let mut tree = Tree::default();
        tree.reset(root);
        tree
    }
    /// Drops every node and starts over from a single root.
    pub fn reset(&mut self, root: Point2<f64>) {
        self.nodes.clear();
        self.children.clear();
        self.nodes.push(TreeNode {
            position: root,
            parent: None,
            cost: 0.0,
        });
        self.children.push(SmallVec::new());
    }
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }
    pub fn node(&self, index: usize) -> &TreeNode {
        &self.nodes[index]
    }
    pub fn children(&self, index: usize) -> &[usize] {
        &self.children[index]
    }

    /// Appends a node below `parent` and returns its index.
    pub fn push(&mut self, position: Point2<f64>, parent: usize) -> usize {
        let from = &self.nodes[parent];
        let cost = from.cost + nalgebra::distance(&from.position, &position);
        let index = self.nodes.len();
        self.nodes.push(TreeNode {
            position,
            parent: Some(parent),
            cost,
        });
        self.children.push(SmallVec::new());
        self.children[parent].push(index);
        index
    }

    /// Index of the node closest to `point`; the earliest one wins ties.
    pub fn nearest(&self, point: &Point2<f64>) -> Option<usize> {
        self.nodes
            .iter()
            .map(|n| nalgebra::distance_squared(&n.position, point))
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
                Some((_, best_d)) if best_d <= d => best,
                _ => Some((i, d)),
            })
            .map(|(i, _)| i)
    }

    /// Indices of all nodes strictly closer than `radius` to `point`, in insertion order.
    pub fn near(&self, point: &Point2<f64>, radius: f64) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| nalgebra::distance(&n.position, point) < radius)
            .map(|(i, _)| i)
            .collect()
    }

    fn ancestors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.nodes[index].parent, |&i| self.nodes[i].parent)
    }

    /// Whether `ancestor` lies on the parent chain of `index`.
    pub fn is_ancestor(&self, ancestor: usize, index: usize) -> bool {
        self.ancestors(index).any(|i| i == ancestor)
    }

    /// Length of the parent chain from `index` to the root, recomputed edge by edge.
    pub fn chain_cost(&self, index: usize) -> f64 {
        std::iter::once(index)
            .chain(self.ancestors(index))
            .filter_map(|i| {
                self.nodes[i]
                    .parent
                    .map(|p| nalgebra::distance(&self.nodes[p].position, &self.nodes[i].position))
            })
            .sum()
    }

    /// Moves `index` below `new_parent` and refreshes the cached cost of `index` and of its
    /// whole subtree. `new_parent` must not be a descendant of `index`.
    pub fn reparent(&mut self, index: usize, new_parent: usize) {
        debug_assert!(index != new_parent && !self.is_ancestor(index, new_parent));
        if let Some(old_parent) = self.nodes[index].parent {
            self.children[old_parent].retain(|c| *c != index);
        }
        self.nodes[index].parent = Some(new_parent);
        self.children[new_parent].push(index);

        let mut stack = vec![index];
        while let Some(i) = stack.pop() {
            if let Some(p) = self.nodes[i].parent {
                self.nodes[i].cost = self.nodes[p].cost
                    + nalgebra::distance(&self.nodes[p].position, &self.nodes[i].position);
            }
            stack.extend(self.children[i].iter().copied());
        }
    }

    /// Positions from the root down to `index`.
    pub fn path_to(&self, index: usize) -> Vec<Point2<f64>> {
        let mut path: Vec<Point2<f64>> = std::iter::once(index)
            .chain(self.ancestors(index))
            .map(|i| self.nodes[i].position)
            .collect();
        path.reverse();
        path
    }

    /// `(parent, child)` position pairs of every edge, for drawing the tree.
    pub fn edges(&self) -> impl Iterator<Item = (Point2<f64>, Point2<f64>)> + '_ {
        self.nodes
            .iter()
            .filter_map(|n| n.parent.map(|p| (self.nodes[p].position, n.position)))
    }
}
