//! Cycle removal and restoration.
//!
//! Subgraphs flagged `may_have_cycles` get their self-loops detached and any remaining
//! cycles broken by greedy edge inversion. Inverted edges are re-anchored on a
//! `bottomIn`/`topOut` temporary connector pair so later stages route them like any
//! forward edge; restoration swaps them back and reverses their routed points.

use crate::error::Result;
use crate::model::{
    ConnectorSide, INVERTED_IN_CONNECTOR, INVERTED_OUT_CONNECTOR, LayoutConnector, LayoutGraph,
    NodeId,
};
use laminar_graphlib::{EdgeId, alg};

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

    if !lg.may_have_cycles {
        return Ok(());
    }

    detach_self_loops(lg)?;

    let inverted = alg::remove_cycles(&mut lg.graph);
    for e in inverted {
        mark_inverted(lg, e)?;
    }
    Ok(())
}

/// Self-loops would stall the greedy inversion; they are purely visual and get
/// reinjected by the edge router.
fn detach_self_loops(lg: &mut LayoutGraph) -> Result<()> {
    let loops: Vec<(EdgeId, NodeId)> = lg
        .graph
        .edges()
        .filter(|(_, src, dst, _)| src == dst)
        .map(|(e, src, _, _)| (e, src))
        .collect();
    for (e, node) in loops {
        let edge = lg.graph.remove_edge(e)?;
        lg.graph.node_mut(node)?.self_loop = Some(edge);
    }
    Ok(())
}

/// `e` already runs backwards in the graph; flag it and give both endpoints their
/// temporary anchor connectors.
fn mark_inverted(lg: &mut LayoutGraph, e: EdgeId) -> Result<()> {
    // After inversion the edge leaves the original destination and enters the original
    // source.
    let (src, dst) = lg.graph.endpoints(e)?;

    let src_node = lg.graph.node_mut(src)?;
    if src_node.out_connector(INVERTED_OUT_CONNECTOR).is_none() {
        src_node.out_connectors.push(LayoutConnector::temporary(
            INVERTED_OUT_CONNECTOR,
            ConnectorSide::Out,
        ));
    }
    let dst_node = lg.graph.node_mut(dst)?;
    if dst_node.in_connector(INVERTED_IN_CONNECTOR).is_none() {
        dst_node.in_connectors.push(LayoutConnector::temporary(
            INVERTED_IN_CONNECTOR,
            ConnectorSide::In,
        ));
    }

    let edge = lg.graph.edge_mut(e)?;
    edge.is_inverted = true;
    edge.src_connector = Some(INVERTED_OUT_CONNECTOR.to_string());
    edge.dst_connector = Some(INVERTED_IN_CONNECTOR.to_string());
    Ok(())
}

/// Inverts flagged edges back, reverses their routed points, and clears the flag. The
/// temporary connector names stay behind as rendering cues.
pub fn undo(lg: &mut LayoutGraph) -> Result<()> {
    let node_ids: Vec<NodeId> = lg.graph.node_ids().collect();
    for id in node_ids {
        let node = lg.graph.node_mut(id)?;
        let mut children = std::mem::take(&mut node.children);
        for child in &mut children {
            undo(child)?;
        }
        lg.graph.node_mut(id)?.children = children;
    }

    let flagged: Vec<EdgeId> = lg
        .graph
        .edges()
        .filter(|(_, _, _, edge)| edge.is_inverted)
        .map(|(e, _, _, _)| e)
        .collect();
    for e in flagged {
        lg.graph.invert_edge(e)?;
        let edge = lg.graph.edge_mut(e)?;
        edge.is_inverted = false;
        edge.points.reverse();
        // The restored edge leaves its source's top anchor and enters its
        // destination's bottom anchor.
        edge.src_connector = Some(INVERTED_IN_CONNECTOR.to_string());
        edge.dst_connector = Some(INVERTED_OUT_CONNECTOR.to_string());
    }
    Ok(())
}
