//! Optional crossing-angle optimization.
//!
//! Head-on segment crossings (one segment running +x, the other -x) read badly when the
//! angle is shallow. For each such crossing a golden-section search picks the vertical
//! push that balances a steeper crossing angle against the extra edge length; the pushes
//! accumulate by y and shift everything downstream.

use crate::error::Result;
use crate::geom::{Point, line_intersection, segments_intersect};
use crate::model::{LayoutGraph, NodeId};
use crate::options::LayoutOptions;
use laminar_graphlib::EdgeId;

const GOLDEN_RATIO: f64 = 0.618_033_988_749_894_8;
const GOLDEN_STEPS: usize = 24;
/// Upper bound on how far one crossing may push the geometry apart.
const MAX_FORCE_FACTOR: f64 = 2.0;

pub fn optimize_angles(root: &mut LayoutGraph, opts: &LayoutOptions) -> Result<()> {
    let ids: Vec<NodeId> = root.graph.node_ids().collect();
    for id in ids {
        let node = root.graph.node_mut(id)?;
        let mut children = std::mem::take(&mut node.children);
        for child in &mut children {
            optimize_angles(child, opts)?;
        }
        root.graph.node_mut(id)?.children = children;
    }
    optimize_graph(root, opts)
}

#[derive(Debug, Clone, Copy)]
struct Crossing {
    y: f64,
    dx_a: f64,
    dx_b: f64,
    span: f64,
}

fn optimize_graph(lg: &mut LayoutGraph, opts: &LayoutOptions) -> Result<()> {
    let crossings = head_on_crossings(lg)?;
    if crossings.is_empty() {
        return Ok(());
    }

    // One downward force per crossing, accumulated from the top.
    let mut forces: Vec<(f64, f64)> = Vec::with_capacity(crossings.len());
    for c in &crossings {
        let push = golden_section(opts, c);
        if push > 0.0 {
            forces.push((c.y, push));
        }
    }
    if forces.is_empty() {
        return Ok(());
    }
    forces.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let shift_below = |y: f64| -> f64 {
        forces
            .iter()
            .take_while(|(fy, _)| *fy <= y)
            .map(|(_, f)| f)
            .sum()
    };

    let ids: Vec<NodeId> = lg.graph.node_ids().collect();
    for id in ids {
        let node = lg.graph.node_mut(id)?;
        let top_shift = shift_below(node.y);
        let bottom_shift = shift_below(node.y + node.height);
        node.y += top_shift;
        // A crossing inside the node stretches it; out connectors ride on the bottom
        // edge, which their relative y already tracks.
        node.height += bottom_shift - top_shift;
    }
    let edge_ids: Vec<EdgeId> = lg.graph.edge_ids().collect();
    for e in edge_ids {
        let edge = lg.graph.edge_mut(e)?;
        for p in &mut edge.points {
            p.y += shift_below(p.y);
        }
        if let Some(label) = edge.label_pos.as_mut() {
            label.y += shift_below(label.y);
        }
    }
    Ok(())
}

fn head_on_crossings(lg: &LayoutGraph) -> Result<Vec<Crossing>> {
    let mut segments: Vec<(Point, Point)> = Vec::new();
    for (_, _, _, edge) in lg.graph.edges() {
        for pair in edge.points.windows(2) {
            segments.push((pair[0], pair[1]));
        }
    }

    let mut crossings: Vec<Crossing> = Vec::new();
    for (i, a) in segments.iter().enumerate() {
        for b in segments.iter().skip(i + 1) {
            let dx_a = a.1.x - a.0.x;
            let dx_b = b.1.x - b.0.x;
            if dx_a * dx_b >= 0.0 {
                continue; // not head-on
            }
            if !segments_intersect(&a.0, &a.1, &b.0, &b.1) {
                continue;
            }
            let Some(p) = line_intersection(&a.0, &a.1, &b.0, &b.1) else {
                continue;
            };
            let span = (a.1.y - a.0.y).abs().max((b.1.y - b.0.y).abs());
            crossings.push(Crossing {
                y: p.y,
                dx_a,
                dx_b,
                span: span.max(1.0),
            });
        }
    }
    Ok(crossings)
}

/// Cost of stretching the crossing's vertical span to `s`: a shallow angle is penalized
/// through the cosine of the crossing angle, extra length through its deviation from
/// the target.
fn cost(opts: &LayoutOptions, c: &Crossing, s: f64) -> f64 {
    let scale = s / c.span;
    let va = (c.dx_a, c.span * scale);
    let vb = (c.dx_b, c.span * scale);
    let dot = va.0 * vb.0 + va.1 * vb.1;
    let len = (va.0 * va.0 + va.1 * va.1).sqrt() * (vb.0 * vb.0 + vb.1 * vb.1).sqrt();
    let cos = if len > 0.0 { (dot / len).abs() } else { 1.0 };
    let length_dev = (s - opts.target_edge_length).abs() / opts.target_edge_length;
    opts.weight_crossings * cos + opts.weight_lengths * length_dev
}

/// Golden-section minimization over `[target, target + max_force]`; returns the extra
/// push beyond the current span (zero when staying put is best).
fn golden_section(opts: &LayoutOptions, c: &Crossing) -> f64 {
    let mut lo = opts.target_edge_length;
    let mut hi = opts.target_edge_length * (1.0 + MAX_FORCE_FACTOR);
    let mut x1 = hi - GOLDEN_RATIO * (hi - lo);
    let mut x2 = lo + GOLDEN_RATIO * (hi - lo);
    let mut f1 = cost(opts, c, x1);
    let mut f2 = cost(opts, c, x2);

    for _ in 0..GOLDEN_STEPS {
        if f1 < f2 {
            hi = x2;
            x2 = x1;
            f2 = f1;
            x1 = hi - GOLDEN_RATIO * (hi - lo);
            f1 = cost(opts, c, x1);
        } else {
            lo = x1;
            x1 = x2;
            f1 = f2;
            x2 = lo + GOLDEN_RATIO * (hi - lo);
            f2 = cost(opts, c, x2);
        }
    }

    let best = (lo + hi) / 2.0;
    (best - c.span).max(0.0)
}
