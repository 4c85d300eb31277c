//! Virtual-node insertion along long edges.
//!
//! After this phase every non-replica edge in a subgraph spans exactly one rank. The
//! edge router later collapses the chains back into poly-lines and deletes the virtual
//! nodes.

use crate::error::Result;
use crate::model::{LayoutEdge, LayoutGraph, LayoutNode, NodeId};
use laminar_graphlib::EdgeId;

pub fn run(lg: &mut LayoutGraph) -> Result<()> {
    let node_ids: Vec<NodeId> = lg.graph.node_ids().collect();
    for id in node_ids {
        let node = lg.graph.node_mut(id)?;
        let mut children = std::mem::take(&mut node.children);
        for child in &mut children {
            run(child)?;
        }
        lg.graph.node_mut(id)?.children = children;
    }

    run_graph(lg)
}

/// Virtualizes one subgraph's edges without descending into nested scopes. Safe to
/// re-run after ranks moved: chains that are already rank-adjacent are left alone.
pub fn run_graph(lg: &mut LayoutGraph) -> Result<()> {
    let edge_ids: Vec<EdgeId> = lg.graph.edge_ids().collect();
    for e in edge_ids {
        normalize_edge(lg, e)?;
    }

    #[cfg(debug_assertions)]
    for (e, src, dst, edge) in lg.graph.edges() {
        if edge.is_replica || src == dst {
            continue;
        }
        let src_end = lg.graph.node(src)?.rank_end();
        let dst_rank = lg.graph.node(dst)?.rank.unwrap_or(0);
        debug_assert!(
            dst_rank == src_end,
            "edge {e} spans {src_end}..{dst_rank} after virtualization"
        );
    }

    Ok(())
}

fn normalize_edge(lg: &mut LayoutGraph, e: EdgeId) -> Result<()> {
    if !lg.graph.has_edge(e) {
        return Ok(());
    }
    let (src, dst) = lg.graph.endpoints(e)?;
    if src == dst || lg.graph.edge(e)?.is_replica {
        return Ok(());
    }

    let chain_start = lg.graph.node(src)?.rank_end();
    let dst_rank = lg.graph.node(dst)?.rank.unwrap_or(0);
    if dst_rank <= chain_start {
        return Ok(());
    }

    // The chain is unsplittable unless a bundle needs to thread through it.
    let (is_inverted, src_bundle, dst_bundle, dst_connector) = {
        let edge = lg.graph.edge_mut(e)?;
        (
            edge.is_inverted,
            edge.src_bundle,
            edge.dst_bundle.take(),
            edge.dst_connector.take(),
        )
    };
    let bundled = src_bundle.is_some() || dst_bundle.is_some();
    let segment_weight = if bundled { 1.0 } else { f64::INFINITY };

    let mut prev = src;
    let mut first_virtual: Option<NodeId> = None;
    let mut last_virtual = src;
    for rank in chain_start..dst_rank {
        let vn = lg.graph.add_node(LayoutNode::virtual_at(rank));
        if first_virtual.is_none() {
            first_virtual = Some(vn);
            // The original edge keeps its weight, source connector, and bundle; only
            // its destination moves onto the chain.
            lg.graph.redirect_edge(e, src, vn)?;
        } else {
            lg.graph.add_edge(
                prev,
                vn,
                LayoutEdge {
                    weight: segment_weight,
                    is_inverted,
                    ..LayoutEdge::default()
                },
            )?;
        }
        prev = vn;
        last_virtual = vn;
    }

    lg.graph.add_edge(
        prev,
        dst,
        LayoutEdge {
            weight: segment_weight,
            is_inverted,
            dst_connector,
            dst_bundle,
            ..LayoutEdge::default()
        },
    )?;

    // Bundle replicas share the stem (source side) or the trunk (destination side).
    if let Some(b) = src_bundle {
        if let (Some(fv), Some(bundle)) = (first_virtual, lg.bundles.get(b)) {
            if bundle.edges.len() > 1 {
                for member in bundle.edges.clone() {
                    if member == e || !lg.graph.has_edge(member) {
                        continue;
                    }
                    let (_, member_dst) = lg.graph.endpoints(member)?;
                    lg.graph.redirect_edge(member, fv, member_dst)?;
                }
            }
        }
    }
    if let Some(b) = dst_bundle {
        if let Some(bundle) = lg.bundles.get(b) {
            if bundle.edges.len() > 1 {
                for member in bundle.edges.clone() {
                    if member == e || !lg.graph.has_edge(member) {
                        continue;
                    }
                    let (member_src, _) = lg.graph.endpoints(member)?;
                    lg.graph.redirect_edge(member, member_src, last_virtual)?;
                }
            }
        }
    }

    Ok(())
}
