//! The level graph: per-rank shadows of a subgraph's nodes.
//!
//! A node spanning `rank_span` ranks appears as a chain of single-rank shadows joined by
//! heavy segments. Every layout edge (already rank-adjacent after virtualization)
//! becomes a level edge from the source's last shadow to the destination's first. The
//! ordering stage and coordinate assignment both work on this projection.

use crate::model::{LayoutGraph, NodeId};
use laminar_graphlib::{DiGraph, EdgeId};

pub type LevelId = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct LevelNode {
    pub layout_node: NodeId,
    /// Global rank of this shadow.
    pub rank: i32,
    /// `rank - layout_node.rank`.
    pub offset: usize,
    /// Position within the rank, filled by the ordering stage.
    pub position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelEdge {
    pub weight: f64,
    /// Backing layout edge; `None` for the heavy intra-node chain segments.
    pub layout_edge: Option<EdgeId>,
}

impl LevelEdge {
    pub fn is_heavy(&self) -> bool {
        self.weight.is_infinite()
    }
}

#[derive(Debug, Clone, Default)]
pub struct LevelGraph {
    pub graph: DiGraph<LevelNode, LevelEdge>,
    pub min_rank: i32,
    pub num_ranks: usize,
    /// Left-to-right sequences per local rank, filled by the ordering stage.
    pub order: Vec<Vec<LevelId>>,
}

impl LevelGraph {
    pub fn local_rank(&self, rank: i32) -> usize {
        (rank - self.min_rank) as usize
    }
}

/// Builds the level graph for one subgraph and records each node's shadow ids.
///
/// Requires ranks assigned and edges virtualized: every non-replica edge must span
/// exactly one rank.
pub fn build(lg: &mut LayoutGraph) -> LevelGraph {
    let mut level = LevelGraph::default();

    let mut min_rank = i32::MAX;
    let mut max_rank = i32::MIN;
    for (_, node) in lg.graph.nodes() {
        let Some(rank) = node.rank else { continue };
        min_rank = min_rank.min(rank);
        max_rank = max_rank.max(rank + node.rank_span as i32 - 1);
    }
    if min_rank > max_rank {
        return level;
    }
    level.min_rank = min_rank;
    level.num_ranks = (max_rank - min_rank + 1) as usize;
    level.order = vec![Vec::new(); level.num_ranks];

    let node_ids: Vec<NodeId> = lg.graph.node_ids().collect();
    for &id in &node_ids {
        let Ok(node) = lg.graph.node(id) else { continue };
        let Some(rank) = node.rank else { continue };
        let span = node.rank_span.max(1);

        let mut shadow_ids = Vec::with_capacity(span);
        for offset in 0..span {
            let shadow = level.graph.add_node(LevelNode {
                layout_node: id,
                rank: rank + offset as i32,
                offset,
                position: 0,
            });
            shadow_ids.push(shadow);
            level.order[(rank + offset as i32 - min_rank) as usize].push(shadow);
            if offset > 0 {
                let _ = level.graph.add_edge(
                    shadow_ids[offset - 1],
                    shadow,
                    LevelEdge {
                        weight: f64::INFINITY,
                        layout_edge: None,
                    },
                );
            }
        }
        if let Ok(node) = lg.graph.node_mut(id) {
            node.level_ids = shadow_ids;
        }
    }

    let edge_ids: Vec<EdgeId> = lg.graph.edge_ids().collect();
    for e in edge_ids {
        let Ok(edge) = lg.graph.edge(e) else { continue };
        if edge.is_replica {
            continue;
        }
        let weight = edge.weight;
        let Ok((src, dst)) = lg.graph.endpoints(e) else {
            continue;
        };
        if src == dst {
            continue;
        }
        let Some(&src_shadow) = lg.graph.node(src).ok().and_then(|n| n.level_ids.last()) else {
            continue;
        };
        let Some(&dst_shadow) = lg.graph.node(dst).ok().and_then(|n| n.level_ids.first()) else {
            continue;
        };
        debug_assert!(
            {
                let sr = level.graph.node(src_shadow).map(|n| n.rank).unwrap_or(0);
                let dr = level.graph.node(dst_shadow).map(|n| n.rank).unwrap_or(0);
                dr == sr + 1
            },
            "level edge must connect adjacent ranks; did virtualization run?"
        );
        let _ = level.graph.add_edge(
            src_shadow,
            dst_shadow,
            LevelEdge {
                weight,
                layout_edge: Some(e),
            },
        );
    }

    // Initial positions follow arena order.
    for rank in &level.order {
        for (pos, &id) in rank.iter().enumerate() {
            if let Ok(n) = level.graph.node_mut(id) {
                n.position = pos;
            }
        }
    }

    level
}
