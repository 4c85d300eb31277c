//! The layout coordinator: validation, preparation, and phase orchestration.

use crate::error::{Error, Result};
use crate::model::{
    ConnectorSide, LayoutBundle, LayoutConnector, LayoutGraph, LayoutNode, NodeId,
    SCOPED_IN_PREFIX, SCOPED_OUT_PREFIX,
};
use crate::options::LayoutOptions;
use crate::{acyclic, connectors, normalize, order, position, rank, route};
use laminar_graphlib::EdgeId;
use rustc_hash::FxHashMap as HashMap;

/// Lays out the graph tree: cycle removal, ranking, virtualization, ordering,
/// coordinate assignment, connector placement, edge routing, cycle restoration.
///
/// The transformation either completes or fails as a whole; a partially laid out graph
/// is never returned.
pub fn layout(mut graph: LayoutGraph, opts: &LayoutOptions) -> Result<LayoutGraph> {
    validate(&graph)?;
    prepare(&mut graph, opts)?;

    tracing::debug!(
        nodes = graph.graph.node_count(),
        edges = graph.graph.edge_count(),
        "layout start"
    );

    acyclic::run(&mut graph)?;
    rank::assign(&mut graph)?;
    normalize::run(&mut graph)?;
    order::run(&mut graph, opts)?;
    connectors::ensure_port_capacity(&mut graph)?;
    position::run(&mut graph, opts)?;
    connectors::place(&mut graph, opts)?;
    route::run(&mut graph, opts)?;
    if opts.optimize_angles {
        route::optimize_angles(&mut graph, opts)?;
    }
    acyclic::undo(&mut graph)?;
    finalize(&mut graph)?;

    tracing::debug!("layout done");
    Ok(graph)
}

fn validate(lg: &LayoutGraph) -> Result<()> {
    if lg.entry.is_some() != lg.exit.is_some() {
        return Err(Error::InvalidInput(
            "scope entry without a matching exit frame".into(),
        ));
    }
    for frame in [lg.entry, lg.exit].into_iter().flatten() {
        if !lg.graph.has_node(frame) {
            return Err(Error::InvalidInput(format!(
                "scope frame {frame} is not a node of its graph"
            )));
        }
    }

    for (id, node) in lg.graph.nodes() {
        if node.width < 0.0 || node.height < 0.0 {
            return Err(Error::InvalidInput(format!(
                "node {id} has a negative size"
            )));
        }
        for child in &node.children {
            validate(child)?;
        }
    }

    for (e, _, _, edge) in lg.graph.edges() {
        if !edge.weight.is_finite() || edge.weight < 1.0 {
            return Err(Error::InvalidInput(format!(
                "edge {e} weight must be a finite number >= 1"
            )));
        }
    }
    Ok(())
}

fn prepare(lg: &mut LayoutGraph, opts: &LayoutOptions) -> Result<()> {
    let node_ids: Vec<NodeId> = lg.graph.node_ids().collect();
    for &id in &node_ids {
        let node = lg.graph.node_mut(id)?;
        if !node.children.is_empty() {
            node.is_scope = true;
        }
        link_scoped_pairs(node);

        let mut children = std::mem::take(&mut node.children);
        for child in &mut children {
            prepare(child, opts)?;
        }
        lg.graph.node_mut(id)?.children = children;
    }

    if opts.bundle {
        detect_bundles(lg)?;
    }
    synthesize_connectors(lg)?;
    Ok(())
}

/// Marks `IN_x`/`OUT_x` pairs as scoped and links the halves through their indices.
pub(crate) fn link_scoped_pairs(node: &mut LayoutNode) {
    let mut out_by_suffix: HashMap<String, usize> = HashMap::default();
    for (j, c) in node.out_connectors.iter_mut().enumerate() {
        c.is_scoped = false;
        c.counterpart = None;
        if let Some(suffix) = c.name.strip_prefix(SCOPED_OUT_PREFIX) {
            out_by_suffix.insert(suffix.to_string(), j);
        }
    }
    for (i, c) in node.in_connectors.iter_mut().enumerate() {
        c.is_scoped = false;
        c.counterpart = None;
        let Some(suffix) = c.name.strip_prefix(SCOPED_IN_PREFIX) else {
            continue;
        };
        if let Some(&j) = out_by_suffix.get(suffix) {
            c.is_scoped = true;
            c.counterpart = Some(j);
            let out = &mut node.out_connectors[j];
            out.is_scoped = true;
            out.counterpart = Some(i);
        }
    }
}

/// Groups edges that share an endpoint node and a missing connector name into bundles;
/// the first member is the primary, the rest become replicas.
fn detect_bundles(lg: &mut LayoutGraph) -> Result<()> {
    let mut by_source: HashMap<(NodeId, String), Vec<EdgeId>> = HashMap::default();
    let mut by_target: HashMap<(NodeId, String), Vec<EdgeId>> = HashMap::default();

    for (e, src, dst, edge) in lg.graph.edges() {
        if let Some(name) = edge.src_connector.as_deref() {
            if lg.graph.node(src)?.out_connector(name).is_none() {
                by_source.entry((src, name.to_string())).or_default().push(e);
            }
        }
        if let Some(name) = edge.dst_connector.as_deref() {
            if lg.graph.node(dst)?.in_connector(name).is_none() {
                by_target.entry((dst, name.to_string())).or_default().push(e);
            }
        }
    }

    let mut sources: Vec<((NodeId, String), Vec<EdgeId>)> = by_source.into_iter().collect();
    sources.sort_by(|a, b| (a.0.0, a.1.first()).cmp(&(b.0.0, b.1.first())));
    for ((node, name), mut edges) in sources {
        if edges.len() < 2 {
            continue;
        }
        edges.sort_unstable();
        let bundle_id = lg.bundles.len();
        for (i, &e) in edges.iter().enumerate() {
            let edge = lg.graph.edge_mut(e)?;
            edge.src_bundle = Some(bundle_id);
            edge.is_replica = i > 0;
        }
        lg.bundles.push(LayoutBundle {
            node,
            side: ConnectorSide::Out,
            name,
            edges,
            x: 0.0,
            y: 0.0,
        });
    }

    let mut targets: Vec<((NodeId, String), Vec<EdgeId>)> = by_target.into_iter().collect();
    targets.sort_by(|a, b| (a.0.0, a.1.first()).cmp(&(b.0.0, b.1.first())));
    for ((node, name), mut edges) in targets {
        if edges.len() < 2 {
            continue;
        }
        edges.sort_unstable();
        // An edge cannot replicate on both ends; source bundles won the first pass.
        if edges
            .iter()
            .any(|&e| lg.graph.edge(e).map(|ed| ed.src_bundle.is_some()).unwrap_or(false))
        {
            continue;
        }
        let bundle_id = lg.bundles.len();
        for (i, &e) in edges.iter().enumerate() {
            let edge = lg.graph.edge_mut(e)?;
            edge.dst_bundle = Some(bundle_id);
            edge.is_replica = i > 0;
        }
        lg.bundles.push(LayoutBundle {
            node,
            side: ConnectorSide::In,
            name,
            edges,
            x: 0.0,
            y: 0.0,
        });
    }

    Ok(())
}

/// Edges naming a connector their endpoint does not carry get a temporary one, unless a
/// bundle already claimed the name as its attachment point.
fn synthesize_connectors(lg: &mut LayoutGraph) -> Result<()> {
    let edge_ids: Vec<EdgeId> = lg.graph.edge_ids().collect();
    for e in edge_ids {
        let (src, dst) = lg.graph.endpoints(e)?;
        let edge = lg.graph.edge(e)?;
        let src_name = (edge.src_bundle.is_none())
            .then(|| edge.src_connector.clone())
            .flatten();
        let dst_name = (edge.dst_bundle.is_none())
            .then(|| edge.dst_connector.clone())
            .flatten();

        if let Some(name) = src_name {
            let node = lg.graph.node_mut(src)?;
            if node.out_connector(&name).is_none() {
                node.out_connectors
                    .push(LayoutConnector::temporary(name, ConnectorSide::Out));
            }
        }
        if let Some(name) = dst_name {
            let node = lg.graph.node_mut(dst)?;
            if node.in_connector(&name).is_none() {
                node.in_connectors
                    .push(LayoutConnector::temporary(name, ConnectorSide::In));
            }
        }
    }
    Ok(())
}

/// Output hygiene: absolute connector coordinates, no leftover auxiliary state.
fn finalize(lg: &mut LayoutGraph) -> Result<()> {
    lg.level = None;
    let node_ids: Vec<NodeId> = lg.graph.node_ids().collect();
    for id in node_ids {
        let node = lg.graph.node_mut(id)?;
        node.level_ids.clear();
        let (x, y) = (node.x, node.y);
        for c in node
            .in_connectors
            .iter_mut()
            .chain(node.out_connectors.iter_mut())
        {
            c.x += x;
            c.y += y;
        }

        let mut children = std::mem::take(&mut node.children);
        for child in &mut children {
            finalize(child)?;
        }
        lg.graph.node_mut(id)?.children = children;
    }

    #[cfg(debug_assertions)]
    for (e, _, _, edge) in lg.graph.edges() {
        debug_assert!(
            !edge.points.is_empty() || edge.is_replica,
            "edge {e} left the pipeline without a routed poly-line"
        );
        debug_assert!(!edge.is_inverted, "edge {e} was not restored");
    }

    Ok(())
}
