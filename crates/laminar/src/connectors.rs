//! Connector placement along node borders, plus bundle attachment points.
//!
//! Scoped pairs sit centered on the node and share their x; unscoped connectors fill
//! the remaining space from the outside inward, alternating left and right. Widths only
//! ever grow: a node too narrow for its connector row is widened before horizontal
//! placement runs.

use crate::error::Result;
use crate::model::{
    CONNECTOR_SIZE, CONNECTOR_SPACING, ConnectorSide, LayoutGraph, LayoutNode, NodeId,
};
use crate::options::LayoutOptions;

const STEP: f64 = CONNECTOR_SIZE + CONNECTOR_SPACING;

/// Pre-placement pass: widen nodes whose connector rows would not fit. Runs before
/// horizontal assignment so Brandes-Köpf sees the final widths.
pub fn ensure_port_capacity(lg: &mut LayoutGraph) -> Result<()> {
    let ids: Vec<NodeId> = lg.graph.node_ids().collect();
    for id in ids {
        let node = lg.graph.node_mut(id)?;
        let row = row_width(node.in_connectors.len()).max(row_width(node.out_connectors.len()));
        if row > 0.0 {
            node.width = node.width.max(row + 2.0 * CONNECTOR_SPACING);
        }

        let mut children = std::mem::take(&mut node.children);
        for child in &mut children {
            ensure_port_capacity(child)?;
        }
        lg.graph.node_mut(id)?.children = children;
    }
    Ok(())
}

fn row_width(count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    count as f64 * CONNECTOR_SIZE + (count - 1) as f64 * CONNECTOR_SPACING
}

/// Post-placement pass: fix every connector's position relative to its node and set the
/// bundle attachment points.
pub fn place(lg: &mut LayoutGraph, opts: &LayoutOptions) -> Result<()> {
    let ids: Vec<NodeId> = lg.graph.node_ids().collect();
    for id in ids {
        let node = lg.graph.node_mut(id)?;
        place_node(node);

        let mut children = std::mem::take(&mut node.children);
        for child in &mut children {
            place(child, opts)?;
        }
        lg.graph.node_mut(id)?.children = children;
    }

    place_bundles(lg)?;
    Ok(())
}

fn place_node(node: &mut LayoutNode) {
    let center = node.width / 2.0;

    // Scoped pairs occupy shared center columns, in their in-list order.
    let scoped_in: Vec<usize> = node
        .in_connectors
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_scoped && c.counterpart.is_some())
        .map(|(i, _)| i)
        .collect();
    let scoped_count = scoped_in.len();

    let scoped_x = |k: usize| center + (k as f64 - (scoped_count as f64 - 1.0) / 2.0) * STEP;
    let scoped_left = if scoped_count > 0 {
        scoped_x(0)
    } else {
        center + STEP / 2.0
    };
    let scoped_right = if scoped_count > 0 {
        scoped_x(scoped_count - 1)
    } else {
        center - STEP / 2.0
    };

    for (k, &i) in scoped_in.iter().enumerate() {
        let x = scoped_x(k);
        let out_index = node.in_connectors[i].counterpart;
        node.in_connectors[i].x = x;
        node.in_connectors[i].y = 0.0;
        if let Some(j) = out_index {
            if let Some(out) = node.out_connectors.get_mut(j) {
                out.x = x;
                out.y = node.height;
            }
        }
    }

    place_unscoped(
        &mut node.in_connectors,
        ConnectorSide::In,
        0.0,
        scoped_left,
        scoped_right,
    );
    place_unscoped(
        &mut node.out_connectors,
        ConnectorSide::Out,
        node.height,
        scoped_left,
        scoped_right,
    );
}

/// Unscoped connectors alternate left and right of the center block, outermost first.
fn place_unscoped(
    connectors: &mut [crate::model::LayoutConnector],
    side: ConnectorSide,
    y: f64,
    scoped_left: f64,
    scoped_right: f64,
) {
    let unscoped: Vec<usize> = connectors
        .iter()
        .enumerate()
        .filter(|(_, c)| !(c.is_scoped && c.counterpart.is_some()) && c.side == side)
        .map(|(i, _)| i)
        .collect();

    let mut left: Vec<usize> = Vec::new();
    let mut right: Vec<usize> = Vec::new();
    for (n, &i) in unscoped.iter().enumerate() {
        if n % 2 == 0 {
            left.push(i);
        } else {
            right.push(i);
        }
    }

    // `left` holds outermost-first entries; walk inward toward the scoped block.
    let slots = left.len();
    for (depth, &i) in left.iter().enumerate() {
        connectors[i].x = scoped_left - STEP * (slots - depth) as f64;
        connectors[i].y = y;
    }
    for (depth, &i) in right.iter().enumerate() {
        connectors[i].x = scoped_right + STEP * (right.len() - depth) as f64;
        connectors[i].y = y;
    }
}

/// Bundle stems: x at the mean of the member edges' far endpoints, y just beyond the
/// node's rank boundary.
fn place_bundles(lg: &mut LayoutGraph) -> Result<()> {
    for b in 0..lg.bundles.len() {
        let (node_id, side, members) = {
            let bundle = &lg.bundles[b];
            (bundle.node, bundle.side, bundle.edges.clone())
        };
        let node = lg.graph.node(node_id)?;
        let y = match side {
            ConnectorSide::Out => node.y + node.height + CONNECTOR_SPACING,
            ConnectorSide::In => node.y - CONNECTOR_SPACING,
        };

        let mut sum = 0.0f64;
        let mut n = 0usize;
        for e in members {
            if !lg.graph.has_edge(e) {
                continue;
            }
            let (src, dst) = lg.graph.endpoints(e)?;
            let far = if src == node_id { dst } else { src };
            let far_node = lg.graph.node(far)?;
            if far_node.is_virtual {
                continue;
            }
            let edge = lg.graph.edge(e)?;
            let far_port = match side {
                // Our side is the source, so the far anchor is the destination port.
                ConnectorSide::Out => edge
                    .dst_connector
                    .as_deref()
                    .and_then(|name| far_node.in_connector(name))
                    .map(|i| far_node.in_connectors[i].x),
                ConnectorSide::In => edge
                    .src_connector
                    .as_deref()
                    .and_then(|name| far_node.out_connector(name))
                    .map(|i| far_node.out_connectors[i].x),
            };
            sum += far_node.x + far_port.unwrap_or(far_node.width / 2.0);
            n += 1;
        }
        let x = if n > 0 {
            sum / n as f64
        } else {
            node.x + node.width / 2.0
        };

        let bundle = &mut lg.bundles[b];
        bundle.x = x;
        bundle.y = y;
    }
    Ok(())
}
