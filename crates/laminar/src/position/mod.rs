//! Coordinate assignment.
//!
//! Y comes straight from global rank heights: every rank band is as tall as its tallest
//! single-rank node, bands are separated by the target edge length (plus label heights
//! when labels participate), and multi-rank nodes stretch across their bands. X runs
//! Brandes-Köpf per subgraph, bottom-up so scope nodes know their interior width before
//! the enclosing graph is placed.

use crate::error::Result;
use crate::model::{LayoutGraph, NodeId};
use crate::options::LayoutOptions;

pub mod bk;

pub fn run(root: &mut LayoutGraph, opts: &LayoutOptions) -> Result<()> {
    assign_y(root, opts)?;
    assign_x(root, opts)?;
    absolutize(root, 0.0);
    Ok(())
}

/// Heights of every global rank band plus extra gap space below each band.
fn measure_ranks(
    lg: &LayoutGraph,
    opts: &LayoutOptions,
    heights: &mut Vec<f64>,
    gaps: &mut Vec<f64>,
) -> Result<()> {
    let grow = |v: &mut Vec<f64>, idx: usize| {
        if v.len() <= idx {
            v.resize(idx + 1, 0.0);
        }
    };

    for (_, node) in lg.graph.nodes() {
        let Some(rank) = node.rank else { continue };
        let idx = rank as usize;
        grow(heights, idx);
        grow(gaps, idx);
        if node.rank_span <= 1 {
            heights[idx] = heights[idx].max(node.height);
        }
    }

    if opts.with_labels {
        for (_, src, _, edge) in lg.graph.edges() {
            let Some((_, label_h)) = edge.label_size else {
                continue;
            };
            let Ok(src_node) = lg.graph.node(src) else {
                continue;
            };
            let Some(rank) = src_node.rank else { continue };
            let idx = (rank + src_node.rank_span as i32 - 1) as usize;
            grow(gaps, idx);
            gaps[idx] = gaps[idx].max(label_h);
        }
    }

    let ids: Vec<NodeId> = lg.graph.node_ids().collect();
    for id in ids {
        let node = lg.graph.node(id)?;
        for child in &node.children {
            measure_ranks(child, opts, heights, gaps)?;
        }
    }
    Ok(())
}

fn assign_y(root: &mut LayoutGraph, opts: &LayoutOptions) -> Result<()> {
    let mut heights: Vec<f64> = Vec::new();
    let mut gaps: Vec<f64> = Vec::new();
    measure_ranks(root, opts, &mut heights, &mut gaps)?;

    // Top of each rank band.
    let mut tops: Vec<f64> = Vec::with_capacity(heights.len() + 1);
    let mut cursor = 0.0f64;
    for (h, gap) in heights.iter().zip(&gaps) {
        tops.push(cursor);
        cursor += h + opts.target_edge_length + gap;
    }
    tops.push(cursor);

    apply_y(root, &tops, &heights)
}

fn apply_y(lg: &mut LayoutGraph, tops: &[f64], heights: &[f64]) -> Result<()> {
    let ids: Vec<NodeId> = lg.graph.node_ids().collect();
    for id in ids {
        let node = lg.graph.node_mut(id)?;
        let Some(rank) = node.rank else { continue };
        let idx = rank as usize;
        if idx >= heights.len() {
            continue;
        }
        if node.rank_span <= 1 {
            // Centered within the band.
            node.y = tops[idx] + (heights[idx] - node.height) / 2.0;
        } else {
            let last = (idx + node.rank_span - 1).min(heights.len() - 1);
            node.y = tops[idx];
            node.height = node.height.max(tops[last] + heights[last] - tops[idx]);
        }

        let mut children = std::mem::take(&mut node.children);
        for child in &mut children {
            apply_y(child, tops, heights)?;
        }
        lg.graph.node_mut(id)?.children = children;
    }
    Ok(())
}

/// Bottom-up: children first so scope nodes know their width, then Brandes-Köpf on this
/// graph's level projection.
fn assign_x(lg: &mut LayoutGraph, opts: &LayoutOptions) -> Result<()> {
    let ids: Vec<NodeId> = lg.graph.node_ids().collect();
    for &id in &ids {
        let node = lg.graph.node_mut(id)?;
        if node.children.is_empty() {
            continue;
        }
        let mut children = std::mem::take(&mut node.children);
        let mut inner_width = 0.0f64;
        for child in &mut children {
            assign_x(child, opts)?;
            stretch_frames(child)?;
            let (w, _) = child.extent();
            inner_width = inner_width.max(w);
        }
        let node = lg.graph.node_mut(id)?;
        node.children = children;
        node.width = node.width.max(inner_width + 2.0 * node.padding);
    }

    let Some(level) = lg.level.take() else {
        return Ok(());
    };
    let xs = bk::assign_x(lg, &level, opts.target_edge_length);

    for &id in &ids {
        let node = lg.graph.node_mut(id)?;
        let Some(&first_shadow) = node.level_ids.first() else {
            continue;
        };
        if let Some(&center) = xs.get(first_shadow) {
            node.x = center - node.width / 2.0;
        }
    }

    // The level graph was this subgraph's scratch space; it is done now.
    drop(level);

    // BK normalizes blocks, not node corners; pin the leftmost corner at zero.
    let mut min_x = f64::INFINITY;
    for &id in &ids {
        min_x = min_x.min(lg.graph.node(id)?.x);
    }
    if min_x.is_finite() && min_x != 0.0 {
        for &id in &ids {
            lg.graph.node_mut(id)?.x -= min_x;
        }
    }
    Ok(())
}

/// The entry and exit frames of a scope body share x and width with the body extent.
fn stretch_frames(child: &mut LayoutGraph) -> Result<()> {
    let (Some(entry), Some(exit)) = (child.entry, child.exit) else {
        return Ok(());
    };
    let (extent_w, _) = child.extent();
    let width = {
        let entry_w = child.graph.node(entry)?.width;
        let exit_w = child.graph.node(exit)?.width;
        extent_w.max(entry_w).max(exit_w)
    };
    for id in [entry, exit] {
        let node = child.graph.node_mut(id)?;
        node.x = 0.0;
        node.width = width;
    }
    Ok(())
}

/// Translates every nested subgraph into its scope node's frame. Y is already global;
/// only x needs the offset.
fn absolutize(lg: &mut LayoutGraph, offset_x: f64) {
    let ids: Vec<NodeId> = lg.graph.node_ids().collect();
    for id in ids {
        let Ok(node) = lg.graph.node_mut(id) else {
            continue;
        };
        node.x += offset_x;
        let child_offset = node.x + node.padding;
        let mut children = std::mem::take(&mut node.children);
        for child in &mut children {
            absolutize(child, child_offset);
        }
        if let Ok(node) = lg.graph.node_mut(id) {
            node.children = children;
        }
    }
}
