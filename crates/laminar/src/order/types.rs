//! The ordering-stage projection: ranks of groups of order nodes.
//!
//! Node-level ordering gives every level-graph shadow its own singleton group, so
//! reordering groups reorders nodes. Connector-level ordering gives every non-scope node
//! one group whose members are its ports; there the group order is pinned by the node
//! ordering and only members move.

use crate::level::LevelId;
use laminar_graphlib::DiGraph;

pub type OrderNodeId = usize;
pub type GroupId = usize;

/// What an order node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderPayload {
    /// A level-graph shadow (node-level ordering).
    Level(LevelId),
    /// An unscoped in connector (index into `in_connectors`).
    InConnector(usize),
    /// An unscoped out connector (index into `out_connectors`).
    OutConnector(usize),
    /// A scoped pair; both halves move together.
    ScopedPair { in_index: usize, out_index: usize },
    /// A portless stand-in so neighbors still have a barycenter target.
    Anchor,
}

#[derive(Debug, Clone)]
pub struct OrderNode {
    pub group: GroupId,
    /// Position within the rank, across groups.
    pub position: usize,
    pub payload: OrderPayload,
}

#[derive(Debug, Clone)]
pub struct OrderGroup {
    pub rank: usize,
    /// Members, left to right.
    pub nodes: Vec<OrderNodeId>,
    /// Ancestor scope chain, outermost last. Shuffling keeps groups with equal chains
    /// contiguous.
    pub shuffle_hierarchy: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderGraph {
    pub graph: DiGraph<OrderNode, f64>,
    pub groups: Vec<OrderGroup>,
    /// Group ids per rank, left to right.
    pub ranks: Vec<Vec<GroupId>>,
}

/// A saved arrangement: group order per rank plus member order per group.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrangement {
    pub ranks: Vec<Vec<GroupId>>,
    pub group_nodes: Vec<Vec<OrderNodeId>>,
}

impl OrderGraph {
    pub fn add_group(&mut self, rank: usize, shuffle_hierarchy: Vec<usize>) -> GroupId {
        if self.ranks.len() <= rank {
            self.ranks.resize_with(rank + 1, Vec::new);
        }
        let id = self.groups.len();
        self.groups.push(OrderGroup {
            rank,
            nodes: Vec::new(),
            shuffle_hierarchy,
        });
        self.ranks[rank].push(id);
        id
    }

    pub fn add_node(&mut self, group: GroupId, payload: OrderPayload) -> OrderNodeId {
        let id = self.graph.add_node(OrderNode {
            group,
            position: 0,
            payload,
        });
        self.groups[group].nodes.push(id);
        id
    }

    pub fn add_edge(&mut self, src: OrderNodeId, dst: OrderNodeId, weight: f64) {
        let _ = self.graph.add_edge(src, dst, weight);
    }

    pub fn num_ranks(&self) -> usize {
        self.ranks.len()
    }

    pub fn position(&self, node: OrderNodeId) -> usize {
        self.graph.node(node).map(|n| n.position).unwrap_or(0)
    }

    pub fn rank_of(&self, node: OrderNodeId) -> usize {
        self.graph
            .node(node)
            .ok()
            .map(|n| self.groups[n.group].rank)
            .unwrap_or(0)
    }

    /// The rank's members, left to right.
    pub fn sequence(&self, rank: usize) -> Vec<OrderNodeId> {
        self.ranks[rank]
            .iter()
            .flat_map(|&gid| self.groups[gid].nodes.iter().copied())
            .collect()
    }

    /// Recomputes every member's `position` from the group order.
    pub fn reindex(&mut self, rank: usize) {
        let seq = self.sequence(rank);
        for (pos, id) in seq.into_iter().enumerate() {
            if let Ok(n) = self.graph.node_mut(id) {
                n.position = pos;
            }
        }
    }

    pub fn reindex_all(&mut self) {
        for rank in 0..self.ranks.len() {
            self.reindex(rank);
        }
    }

    /// Rewrites a rank from a full left-to-right sequence. Members of one group must
    /// stay contiguous; the group order follows first appearance.
    pub fn apply_sequence(&mut self, rank: usize, seq: &[OrderNodeId]) {
        debug_assert_eq!(
            {
                let mut sorted = seq.to_vec();
                sorted.sort_unstable();
                sorted
            },
            {
                let mut sorted = self.sequence(rank);
                sorted.sort_unstable();
                sorted
            },
            "a new rank order must be a permutation of the old one"
        );

        let mut group_order: Vec<GroupId> = Vec::new();
        let mut members: Vec<Vec<OrderNodeId>> = Vec::new();
        for &id in seq {
            let Ok(node) = self.graph.node(id) else { continue };
            let gid = node.group;
            match group_order.last() {
                Some(&last) if last == gid => members.last_mut().map(|m| m.push(id)),
                _ => {
                    debug_assert!(
                        !group_order.contains(&gid),
                        "group members must stay contiguous within a rank"
                    );
                    group_order.push(gid);
                    members.push(vec![id]);
                    None
                }
            };
        }
        for (gid, nodes) in group_order.iter().zip(members) {
            self.groups[*gid].nodes = nodes;
        }
        self.ranks[rank] = group_order;
        self.reindex(rank);
    }

    pub fn snapshot(&self) -> Arrangement {
        Arrangement {
            ranks: self.ranks.clone(),
            group_nodes: self.groups.iter().map(|g| g.nodes.clone()).collect(),
        }
    }

    pub fn restore(&mut self, arrangement: &Arrangement) {
        self.ranks = arrangement.ranks.clone();
        for (group, nodes) in self.groups.iter_mut().zip(&arrangement.group_nodes) {
            group.nodes = nodes.clone();
        }
        self.reindex_all();
    }
}
