use fxhash::{FxBuildHasher, FxHashSet};
/// This module implements a variant of
/// [pathfinding's astar function](https://docs.rs/pathfinding/latest/pathfinding/directed/astar/index.html)
/// that works with floating point costs and keeps an explicit closed set, so stale heap entries
/// left behind by a relaxation are skipped instead of being removed from the heap.
use indexmap::map::Entry::{Occupied, Vacant};
use indexmap::IndexMap;
use num_traits::Zero;

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::hash::Hash;

/// Entry of the node table. The node's coordinates are the key under which it is stored, its
/// position in the table is its handle and `parent` is the handle of the node it was reached from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchNode<C> {
    pub parent: usize,
    pub g: C,
    /// Computed once when the node is created.
    pub h: C,
}

impl<C: Zero + Copy> SearchNode<C> {
    pub fn f(&self) -> C {
        self.g + self.h
    }
}

struct SmallestCostHolder<K> {
    estimated_cost: K,
    cost: K,
    index: usize,
}

impl<K: PartialOrd> Eq for SmallestCostHolder<K> {}

impl<K: PartialOrd> PartialEq for SmallestCostHolder<K> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K: PartialOrd> PartialOrd for SmallestCostHolder<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: PartialOrd> Ord for SmallestCostHolder<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Orders per estimated cost first. Ties favour the larger cost (and therefore the smaller
        // heuristic), then the node that entered the table first.
        let by_estimate = other
            .estimated_cost
            .partial_cmp(&self.estimated_cost)
            .unwrap_or(Ordering::Equal);
        let by_cost = self
            .cost
            .partial_cmp(&other.cost)
            .unwrap_or(Ordering::Equal);
        by_estimate
            .then(by_cost)
            .then_with(|| other.index.cmp(&self.index))
    }
}

fn reverse_path<N, C>(nodes: &FxIndexMap<N, SearchNode<C>>, start: usize) -> Vec<N>
where
    N: Eq + Hash + Clone,
{
    let mut path: Vec<N> = std::iter::successors(nodes.get_index(start), |(_, node)| {
        nodes.get_index(node.parent)
    })
    .map(|(n, _)| n.clone())
    .collect();
    path.reverse();
    path
}

/// Best-first search from `start` until `success` holds for a popped node. Returns the path
/// (start first) and its cost, or [None] once every reachable node has been closed.
///
/// `successors` yields the neighbours of a node together with the cost of the move,
/// `heuristic` estimates the remaining cost and is evaluated once per discovered node. The
/// returned path is optimal if the heuristic is consistent.
pub fn astar<N, C, FN, IN, FH, FS>(
    start: &N,
    mut successors: FN,
    mut heuristic: FH,
    mut success: FS,
) -> Option<(Vec<N>, C)>
where
    N: Eq + Hash + Clone,
    C: Zero + PartialOrd + Copy,
    FN: FnMut(&N) -> IN,
    IN: IntoIterator<Item = (N, C)>,
    FH: FnMut(&N) -> C,
    FS: FnMut(&N) -> bool,
{
    let mut to_see = BinaryHeap::new();
    let mut nodes: FxIndexMap<N, SearchNode<C>> = FxIndexMap::default();
    let mut closed: FxHashSet<usize> = FxHashSet::default();
    let start_h = heuristic(start);
    nodes.insert(
        start.clone(),
        SearchNode {
            parent: usize::MAX,
            g: Zero::zero(),
            h: start_h,
        },
    );
    to_see.push(SmallestCostHolder {
        estimated_cost: start_h,
        cost: Zero::zero(),
        index: 0,
    });
    while let Some(SmallestCostHolder { index, .. }) = to_see.pop() {
        // A node may sit in the heap several times if a cheaper way to it was found after it
        // was first pushed; only the first pop counts.
        if !closed.insert(index) {
            continue;
        }
        let (cost, successors) = {
            let Some((node, search_node)) = nodes.get_index(index) else {
                continue;
            };
            if success(node) {
                let path = reverse_path(&nodes, index);
                return Some((path, search_node.g));
            }
            (search_node.g, successors(node))
        };
        for (successor, move_cost) in successors {
            let new_cost = cost + move_cost;
            let n;
            let updated;
            match nodes.entry(successor) {
                Vacant(e) => {
                    n = e.index();
                    updated = SearchNode {
                        parent: index,
                        g: new_cost,
                        h: heuristic(e.key()),
                    };
                    e.insert(updated);
                }
                Occupied(mut e) => {
                    if closed.contains(&e.index()) || new_cost >= e.get().g {
                        continue;
                    }
                    n = e.index();
                    let search_node = e.get_mut();
                    search_node.g = new_cost;
                    search_node.parent = index;
                    updated = *search_node;
                }
            }

            to_see.push(SmallestCostHolder {
                estimated_cost: updated.f(),
                cost: updated.g,
                index: n,
            });
        }
    }
    None
}
