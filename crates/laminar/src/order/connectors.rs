//! Connector-level ordering.
//!
//! A second order graph at port granularity: every non-scope node contributes one group
//! per rank whose members are its connectors; a scoped pair is a single member so both
//! halves move together. Group order is pinned by the node ordering, so the sweeps only
//! permute ports within their node.

use super::barycenter;
use super::types::{OrderGraph, OrderPayload};
use crate::error::Result;
use crate::level::LevelGraph;
use crate::model::{LayoutGraph, NodeId};
use laminar_graphlib::EdgeId;
use rustc_hash::FxHashMap as HashMap;

/// Orders every node's connectors by sweeping a port-level projection of `level`, then
/// copies the port order back into the layout nodes.
pub fn order_connectors(lg: &mut LayoutGraph, level: &LevelGraph) -> Result<()> {
    if level.num_ranks == 0 {
        return Ok(());
    }

    let mut og = OrderGraph::default();
    // Port order node per (layout node, connector slot); anchors for portless nodes.
    let mut in_ports: HashMap<(NodeId, usize), usize> = HashMap::default();
    let mut out_ports: HashMap<(NodeId, usize), usize> = HashMap::default();
    let mut anchors: HashMap<NodeId, usize> = HashMap::default();
    let mut node_groups: Vec<(NodeId, usize)> = Vec::new();

    for (local_rank, rank_order) in level.order.iter().enumerate() {
        for &shadow_id in rank_order {
            let shadow = level.graph.node(shadow_id)?;
            if shadow.offset > 0 {
                // Ports live on the node's first and last rank; interior shadows carry
                // nothing orderable.
                continue;
            }
            let node_id = shadow.layout_node;
            let node = lg.graph.node(node_id)?;
            let group = og.add_group(local_rank, Vec::new());

            let portless =
                node.is_scope || node.in_connectors.is_empty() && node.out_connectors.is_empty();
            if portless {
                let anchor = og.add_node(group, OrderPayload::Anchor);
                anchors.insert(node_id, anchor);
                continue;
            }

            node_groups.push((node_id, group));
            for (i, conn) in node.in_connectors.iter().enumerate() {
                let payload = match conn.counterpart {
                    Some(out_index) if conn.is_scoped => OrderPayload::ScopedPair {
                        in_index: i,
                        out_index,
                    },
                    _ => OrderPayload::InConnector(i),
                };
                let id = og.add_node(group, payload);
                in_ports.insert((node_id, i), id);
                if let OrderPayload::ScopedPair { out_index, .. } = payload {
                    out_ports.insert((node_id, out_index), id);
                }
            }
            for (i, conn) in node.out_connectors.iter().enumerate() {
                if conn.is_scoped && conn.counterpart.is_some() {
                    continue; // shared with its in half
                }
                let id = og.add_node(group, OrderPayload::OutConnector(i));
                out_ports.insert((node_id, i), id);
            }
        }
    }

    let edge_ids: Vec<EdgeId> = lg.graph.edge_ids().collect();
    for e in edge_ids {
        let edge = lg.graph.edge(e)?;
        if edge.is_replica {
            continue;
        }
        let weight = if edge.weight.is_finite() {
            edge.weight
        } else {
            1.0
        };
        let (src, dst) = lg.graph.endpoints(e)?;
        if src == dst {
            continue;
        }
        let src_port = edge
            .src_connector
            .as_deref()
            .and_then(|name| lg.graph.node(src).ok()?.out_connector(name))
            .and_then(|i| out_ports.get(&(src, i)).copied())
            .or_else(|| anchors.get(&src).copied());
        let dst_port = edge
            .dst_connector
            .as_deref()
            .and_then(|name| lg.graph.node(dst).ok()?.in_connector(name))
            .and_then(|i| in_ports.get(&(dst, i)).copied())
            .or_else(|| anchors.get(&dst).copied());
        if let (Some(s), Some(d)) = (src_port, dst_port) {
            og.add_edge(s, d, weight);
        }
    }

    barycenter::optimize(&mut og, false);

    // Copy the port order back; the lists are permuted, never resized.
    for (node_id, group) in node_groups {
        let mut in_order: Vec<usize> = Vec::new();
        let mut out_order: Vec<usize> = Vec::new();
        for &member in &og.groups[group].nodes {
            match og.graph.node(member)?.payload {
                OrderPayload::InConnector(i) => in_order.push(i),
                OrderPayload::OutConnector(i) => out_order.push(i),
                OrderPayload::ScopedPair {
                    in_index,
                    out_index,
                } => {
                    in_order.push(in_index);
                    out_order.push(out_index);
                }
                OrderPayload::Anchor | OrderPayload::Level(_) => {}
            }
        }
        apply_port_order(lg, node_id, &in_order, &out_order)?;
    }

    Ok(())
}

fn apply_port_order(
    lg: &mut LayoutGraph,
    node_id: NodeId,
    in_order: &[usize],
    out_order: &[usize],
) -> Result<()> {
    let node = lg.graph.node_mut(node_id)?;
    debug_assert_eq!(in_order.len(), node.in_connectors.len());
    debug_assert_eq!(out_order.len(), node.out_connectors.len());

    let ins = std::mem::take(&mut node.in_connectors);
    let outs = std::mem::take(&mut node.out_connectors);
    let mut new_ins = Vec::with_capacity(ins.len());
    let mut new_outs = Vec::with_capacity(outs.len());
    let mut ins: Vec<Option<_>> = ins.into_iter().map(Some).collect();
    let mut outs: Vec<Option<_>> = outs.into_iter().map(Some).collect();
    for &i in in_order {
        if let Some(c) = ins.get_mut(i).and_then(Option::take) {
            new_ins.push(c);
        }
    }
    for &i in out_order {
        if let Some(c) = outs.get_mut(i).and_then(Option::take) {
            new_outs.push(c);
        }
    }
    node.in_connectors = new_ins;
    node.out_connectors = new_outs;

    // Counterpart indices moved with the permutation; relink by suffix.
    crate::pipeline::link_scoped_pairs(node);
    Ok(())
}
