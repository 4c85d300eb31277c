//! Edge routing: poly-lines through virtual chains, bundles, replicas, self-loops.
//!
//! Every surviving edge walks its chain of virtual nodes collecting proxy points at the
//! rank boundaries, then the chain is collapsed: the first segment is re-pointed at the
//! original endpoints and the virtual bookkeeping disappears from the output.

use crate::error::Result;
use crate::geom::{Point, Rect};
use crate::model::{ConnectorSide, LayoutGraph, LayoutNode, NodeId};
use crate::options::LayoutOptions;
use laminar_graphlib::EdgeId;
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

pub mod angles;

pub use angles::optimize_angles;

pub fn run(root: &mut LayoutGraph, opts: &LayoutOptions) -> Result<()> {
    let ids: Vec<NodeId> = root.graph.node_ids().collect();
    for id in ids {
        let node = root.graph.node_mut(id)?;
        let mut children = std::mem::take(&mut node.children);
        for child in &mut children {
            run(child, opts)?;
        }
        root.graph.node_mut(id)?.children = children;
    }
    route_graph(root, opts)
}

/// Vertical extent of each global rank band within one subgraph.
#[derive(Debug, Default)]
struct RankBands {
    top: HashMap<i32, f64>,
    bottom: HashMap<i32, f64>,
}

impl RankBands {
    fn top(&self, rank: i32, fallback: f64) -> f64 {
        self.top.get(&rank).copied().unwrap_or(fallback)
    }

    fn bottom(&self, rank: i32, fallback: f64) -> f64 {
        self.bottom.get(&rank).copied().unwrap_or(fallback)
    }
}

fn rank_bands(lg: &LayoutGraph) -> RankBands {
    let mut bands = RankBands::default();
    for (_, node) in lg.graph.nodes() {
        let Some(rank) = node.rank else { continue };
        if node.rank_span > 1 {
            continue;
        }
        let top = bands.top.entry(rank).or_insert(f64::INFINITY);
        *top = top.min(node.y);
        let bottom = bands.bottom.entry(rank).or_insert(f64::NEG_INFINITY);
        *bottom = bottom.max(node.y + node.height);
    }
    bands
}

#[derive(Debug)]
struct ChainRoute {
    edge: EdgeId,
    src: NodeId,
    final_dst: NodeId,
    dst_connector: Option<String>,
    dst_bundle: Option<usize>,
    points: Vec<Point>,
}

fn route_graph(lg: &mut LayoutGraph, opts: &LayoutOptions) -> Result<()> {
    let bands = rank_bands(lg);
    let no_out_proxy = proxy_free_nodes(lg, ConnectorSide::Out)?;
    let no_in_proxy = proxy_free_nodes(lg, ConnectorSide::In)?;

    let mut routes: Vec<ChainRoute> = Vec::new();
    let edge_ids: Vec<EdgeId> = lg.graph.edge_ids().collect();
    for e in edge_ids {
        let edge = lg.graph.edge(e)?;
        if edge.is_replica {
            continue;
        }
        let (src, dst) = lg.graph.endpoints(e)?;
        if src == dst || lg.graph.node(src)?.is_virtual {
            continue;
        }
        routes.push(walk_chain(
            lg,
            e,
            src,
            dst,
            &bands,
            &no_out_proxy,
            &no_in_proxy,
        )?);
    }

    for route in routes {
        lg.graph.redirect_edge(route.edge, route.src, route.final_dst)?;
        let edge = lg.graph.edge_mut(route.edge)?;
        edge.points = route.points;
        edge.dst_connector = route.dst_connector;
        if route.dst_bundle.is_some() {
            edge.dst_bundle = route.dst_bundle;
        }
    }

    copy_replicas(lg)?;
    remove_virtual_nodes(lg)?;
    reinject_self_loops(lg)?;
    if opts.with_labels {
        place_labels(lg)?;
    }
    Ok(())
}

fn walk_chain(
    lg: &LayoutGraph,
    e: EdgeId,
    src: NodeId,
    dst: NodeId,
    bands: &RankBands,
    no_out_proxy: &HashSet<NodeId>,
    no_in_proxy: &HashSet<NodeId>,
) -> Result<ChainRoute> {
    let mut points: Vec<Point> = Vec::new();
    let mut push = |points: &mut Vec<Point>, p: Point| {
        if points.last().is_none_or(|last| !last.approx_eq(&p)) {
            points.push(p);
        }
    };

    let edge = lg.graph.edge(e)?;
    let src_node = lg.graph.node(src)?;
    let start = source_anchor(lg, src, src_node, edge.src_connector.as_deref())?;
    push(&mut points, start);

    if let Some(b) = edge.src_bundle.and_then(|b| lg.bundles.get(b)) {
        // Curved renderings pass through the stem when the point is doubled.
        push(&mut points, Point::new(b.x, b.y));
        points.push(Point::new(b.x, b.y));
    } else if !no_out_proxy.contains(&src) {
        let out_rank = src_node.rank_end() - 1;
        push(
            &mut points,
            Point::new(start.x, bands.bottom(out_rank, start.y)),
        );
    }

    // Walk the virtual chain.
    let mut cur_edge = e;
    let mut cur_dst = dst;
    loop {
        let node = lg.graph.node(cur_dst)?;
        if !node.is_virtual {
            break;
        }
        let rank = node.rank.unwrap_or(0);
        let cx = node.x + node.width / 2.0;
        let cy = node.y + node.height / 2.0;
        push(&mut points, Point::new(cx, bands.top(rank, cy)));
        push(&mut points, Point::new(cx, cy));
        push(&mut points, Point::new(cx, bands.bottom(rank, cy)));

        let mut next: Option<(EdgeId, NodeId)> = None;
        for &out in lg.graph.out_edges(cur_dst)? {
            if !lg.graph.edge(out)?.is_replica {
                next = Some((out, lg.graph.dst(out)?));
                break;
            }
        }
        let Some((next_edge, next_dst)) = next else { break };
        cur_edge = next_edge;
        cur_dst = next_dst;
    }

    let last_edge = lg.graph.edge(cur_edge)?;
    let dst_connector = last_edge.dst_connector.clone();
    let dst_bundle = last_edge.dst_bundle;
    let dst_node = lg.graph.node(cur_dst)?;
    let end = target_anchor(lg, cur_dst, dst_node, dst_connector.as_deref())?;

    if let Some(b) = dst_bundle.and_then(|b| lg.bundles.get(b)) {
        push(&mut points, Point::new(b.x, b.y));
        points.push(Point::new(b.x, b.y));
    } else if !no_in_proxy.contains(&cur_dst) {
        push(
            &mut points,
            Point::new(end.x, bands.top(dst_node.rank.unwrap_or(0), end.y)),
        );
    }
    push(&mut points, end);

    Ok(ChainRoute {
        edge: e,
        src,
        final_dst: cur_dst,
        dst_connector,
        dst_bundle,
        points,
    })
}

/// Bottom-center of the source port; scope sources leave from their exit frame.
fn source_anchor(
    _lg: &LayoutGraph,
    _id: NodeId,
    node: &LayoutNode,
    connector: Option<&str>,
) -> Result<Point> {
    if let Some(i) = connector.and_then(|name| node.out_connector(name)) {
        let c = &node.out_connectors[i];
        return Ok(Point::new(node.x + c.x, node.y + c.y + c.height / 2.0));
    }
    if node.is_scope {
        if let Some(child) = node.children.first() {
            if let Some(exit) = child.exit {
                let frame = child.graph.node(exit)?;
                return Ok(Point::new(
                    frame.x + frame.width / 2.0,
                    frame.y + frame.height,
                ));
            }
        }
    }
    Ok(Point::new(node.x + node.width / 2.0, node.y + node.height))
}

/// Top-center of the target port; scope targets are entered at their entry frame.
fn target_anchor(
    _lg: &LayoutGraph,
    _id: NodeId,
    node: &LayoutNode,
    connector: Option<&str>,
) -> Result<Point> {
    if let Some(i) = connector.and_then(|name| node.in_connector(name)) {
        let c = &node.in_connectors[i];
        return Ok(Point::new(node.x + c.x, node.y + c.y - c.height / 2.0));
    }
    if node.is_scope {
        if let Some(child) = node.children.first() {
            if let Some(entry) = child.entry {
                let frame = child.graph.node(entry)?;
                return Ok(Point::new(frame.x + frame.width / 2.0, frame.y));
            }
        }
    }
    Ok(Point::new(node.x + node.width / 2.0, node.y))
}

/// Nodes whose straight segments clear their rank neighbors need no boundary proxy.
fn proxy_free_nodes(lg: &LayoutGraph, side: ConnectorSide) -> Result<HashSet<NodeId>> {
    let mut free: HashSet<NodeId> = HashSet::default();

    for (id, node) in lg.graph.nodes() {
        if node.is_virtual {
            continue;
        }
        let edges = match side {
            ConnectorSide::Out => lg.graph.out_edges(id),
            ConnectorSide::In => lg.graph.in_edges(id),
        };
        let Ok(edges) = edges else { continue };

        let boundary_rank = match side {
            ConnectorSide::Out => node.rank_end() - 1,
            ConnectorSide::In => node.rank.unwrap_or(0),
        };
        let (left, right) = rank_neighbors(lg, id, node, boundary_rank);

        let mut clear = true;
        for &e in edges {
            let Ok(edge) = lg.graph.edge(e) else { continue };
            if edge.is_replica {
                continue;
            }
            let Ok((src, dst)) = lg.graph.endpoints(e) else {
                continue;
            };
            let other = if src == id { dst } else { src };
            if other == id {
                continue;
            }
            let Ok(other_node) = lg.graph.node(other) else {
                continue;
            };

            let (a, b) = match side {
                ConnectorSide::Out => {
                    let a = source_anchor(lg, id, node, edge.src_connector.as_deref())?;
                    let b = Point::new(other_node.x + other_node.width / 2.0, other_node.y);
                    (a, b)
                }
                ConnectorSide::In => {
                    let a = Point::new(
                        other_node.x + other_node.width / 2.0,
                        other_node.y + other_node.height,
                    );
                    let b = target_anchor(lg, id, node, edge.dst_connector.as_deref())?;
                    (a, b)
                }
            };

            for neighbor in [left, right].into_iter().flatten() {
                let Ok(n) = lg.graph.node(neighbor) else {
                    continue;
                };
                let rect = Rect::new(n.x, n.y, n.width, n.height);
                if rect.intersects_segment(&a, &b) {
                    clear = false;
                    break;
                }
            }
            if !clear {
                break;
            }
        }
        if clear {
            free.insert(id);
        }
    }
    Ok(free)
}

/// Nearest non-virtual nodes to the left and right of `node` within `rank`.
fn rank_neighbors(
    lg: &LayoutGraph,
    id: NodeId,
    node: &LayoutNode,
    rank: i32,
) -> (Option<NodeId>, Option<NodeId>) {
    let mut left: Option<(f64, NodeId)> = None;
    let mut right: Option<(f64, NodeId)> = None;
    for (other_id, other) in lg.graph.nodes() {
        if other_id == id || other.is_virtual {
            continue;
        }
        let Some(r) = other.rank else { continue };
        if !(r..r + other.rank_span as i32).contains(&rank) {
            continue;
        }
        let dx = other.x - node.x;
        if dx < 0.0 {
            if left.is_none_or(|(best, _)| dx > best) {
                left = Some((dx, other_id));
            }
        } else if dx > 0.0 && right.is_none_or(|(best, _)| dx < best) {
            right = Some((dx, other_id));
        }
    }
    (left.map(|(_, id)| id), right.map(|(_, id)| id))
}

/// Replicas copy the primary's poly-line, substituting their own endpoint, and get
/// re-pointed at the real endpoint node before the virtual chain disappears.
fn copy_replicas(lg: &mut LayoutGraph) -> Result<()> {
    for b in 0..lg.bundles.len() {
        let (node_id, side, members) = {
            let bundle = &lg.bundles[b];
            (bundle.node, bundle.side, bundle.edges.clone())
        };
        let Some(&primary) = members.first() else {
            continue;
        };
        if !lg.graph.has_edge(primary) {
            continue;
        }
        let primary_points = lg.graph.edge(primary)?.points.clone();

        for &member in members.iter().skip(1) {
            if !lg.graph.has_edge(member) {
                continue;
            }
            let (src, dst) = lg.graph.endpoints(member)?;
            let mut points = primary_points.clone();
            match side {
                ConnectorSide::Out => {
                    // Shared source; substitute the replica's own destination point.
                    lg.graph.redirect_edge(member, node_id, dst)?;
                    let dst_node = lg.graph.node(dst)?;
                    let connector = lg.graph.edge(member)?.dst_connector.clone();
                    let end = target_anchor(lg, dst, dst_node, connector.as_deref())?;
                    if let Some(last) = points.last_mut() {
                        *last = end;
                    }
                }
                ConnectorSide::In => {
                    lg.graph.redirect_edge(member, src, node_id)?;
                    let src_node = lg.graph.node(src)?;
                    let connector = lg.graph.edge(member)?.src_connector.clone();
                    let start = source_anchor(lg, src, src_node, connector.as_deref())?;
                    if let Some(first) = points.first_mut() {
                        *first = start;
                    }
                }
            }
            lg.graph.edge_mut(member)?.points = points;
        }
    }
    Ok(())
}

fn remove_virtual_nodes(lg: &mut LayoutGraph) -> Result<()> {
    let virtuals: Vec<NodeId> = lg
        .graph
        .nodes()
        .filter(|(_, n)| n.is_virtual)
        .map(|(id, _)| id)
        .collect();
    for id in virtuals {
        lg.graph.remove_node(id)?;
    }
    Ok(())
}

/// Self-loops removed before cycle breaking come back as a small rectangle off the
/// node's right edge; self-loops in never-cyclic subgraphs get the same path in place.
fn reinject_self_loops(lg: &mut LayoutGraph) -> Result<()> {
    let carriers: Vec<NodeId> = lg
        .graph
        .nodes()
        .filter(|(_, n)| n.self_loop.is_some())
        .map(|(id, _)| id)
        .collect();
    for id in carriers {
        let node = lg.graph.node_mut(id)?;
        let Some(edge) = node.self_loop.take() else {
            continue;
        };
        lg.graph.add_edge(id, id, edge)?;
    }

    let loops: Vec<(EdgeId, NodeId)> = lg
        .graph
        .edges()
        .filter(|(_, src, dst, _)| src == dst)
        .map(|(e, src, _, _)| (e, src))
        .collect();
    for (e, id) in loops {
        let node = lg.graph.node(id)?;
        let right = node.x + node.width;
        let stem = right + crate::model::CONNECTOR_SPACING;
        let y_top = node.y + node.height * 0.25;
        let y_bottom = node.y + node.height * 0.75;
        lg.graph.edge_mut(e)?.points = vec![
            Point::new(right, y_top),
            Point::new(stem, y_top),
            Point::new(stem, y_bottom),
            Point::new(right, y_bottom),
        ];
    }
    Ok(())
}

/// Label at the midpoint of the longest routed segment, nudged off the line.
fn place_labels(lg: &mut LayoutGraph) -> Result<()> {
    let edge_ids: Vec<EdgeId> = lg.graph.edge_ids().collect();
    for e in edge_ids {
        let edge = lg.graph.edge_mut(e)?;
        let Some((label_w, _)) = edge.label_size else {
            continue;
        };
        if edge.points.len() < 2 {
            continue;
        }
        let mut best = (0usize, 0.0f64);
        for i in 0..edge.points.len() - 1 {
            let a = edge.points[i];
            let b = edge.points[i + 1];
            let len = ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt();
            if len > best.1 {
                best = (i, len);
            }
        }
        let a = edge.points[best.0];
        let b = edge.points[best.0 + 1];
        edge.label_pos = Some(Point::new(
            (a.x + b.x) / 2.0 + crate::model::CONNECTOR_SPACING + label_w / 2.0,
            (a.y + b.y) / 2.0,
        ));
    }
    Ok(())
}
