//! Brandes & Köpf four-sweep horizontal placement over one subgraph's level graph.
//!
//! Four alignments (upper/lower neighbors x left/right preference) are produced with
//! median alignment and block compaction, aligned to the narrowest, and combined per
//! node as the average of the two middle x values. Segments that cross a heavy segment
//! are unusable for alignment, so chains of shadows stay vertical.

use crate::level::{LevelGraph, LevelId};
use crate::model::LayoutGraph;
use rustc_hash::FxHashSet as HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vertical {
    Up,
    Down,
}

/// Returns the center x of every level node, keyed by `LevelId`.
pub fn assign_x(lg: &LayoutGraph, level: &LevelGraph, target: f64) -> Vec<f64> {
    let slots = level.graph.node_ids().max().map_or(0, |m| m + 1);
    if slots == 0 {
        return Vec::new();
    }

    let layering: Vec<Vec<LevelId>> = level.order.clone();
    let widths = node_widths(lg, level, slots);
    let unusable = unusable_segments(level, &layering);

    let mut layouts: Vec<Vec<f64>> = Vec::with_capacity(4);
    for vertical in [Vertical::Up, Vertical::Down] {
        for mirror in [false, true] {
            let view: Vec<Vec<LevelId>> = if mirror {
                layering
                    .iter()
                    .map(|r| r.iter().rev().copied().collect())
                    .collect()
            } else {
                layering.clone()
            };
            let (root, _align) = align_medians(level, &view, vertical, &unusable, slots);
            let mut xs = compact(&view, &root, &widths, target, slots);
            if mirror {
                for x in &mut xs {
                    *x = -*x;
                }
            }
            layouts.push(xs);
        }
    }

    align_layouts(&mut layouts, &layering, &widths);

    // Median of the four candidates: average of the two middle values.
    let mut xs = vec![0.0f64; slots];
    for id in level.graph.node_ids() {
        let mut candidates = [
            layouts[0][id],
            layouts[1][id],
            layouts[2][id],
            layouts[3][id],
        ];
        candidates.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        xs[id] = (candidates[1] + candidates[2]) / 2.0;
    }

    shift_right_only_blocks(level, &layering, &widths, target, &mut xs);

    // Normalize the subgraph to start at zero.
    let mut min_left = f64::INFINITY;
    for id in level.graph.node_ids() {
        min_left = min_left.min(xs[id] - widths[id] / 2.0);
    }
    if min_left.is_finite() && min_left != 0.0 {
        for id in level.graph.node_ids() {
            xs[id] -= min_left;
        }
    }

    xs
}

fn node_widths(lg: &LayoutGraph, level: &LevelGraph, slots: usize) -> Vec<f64> {
    let mut widths = vec![0.0f64; slots];
    for (id, shadow) in level.graph.nodes() {
        widths[id] = lg
            .graph
            .node(shadow.layout_node)
            .map(|n| n.width)
            .unwrap_or(0.0);
    }
    widths
}

/// Light segments crossing a heavy segment between some rank pair cannot carry an
/// alignment.
fn unusable_segments(level: &LevelGraph, layering: &[Vec<LevelId>]) -> HashSet<usize> {
    let mut position = vec![0usize; level.graph.node_ids().max().map_or(0, |m| m + 1)];
    for rank in layering {
        for (pos, &id) in rank.iter().enumerate() {
            position[id] = pos;
        }
    }

    let mut unusable: HashSet<usize> = HashSet::default();
    let mut edges_by_rank: Vec<Vec<(usize, usize, usize, bool)>> = vec![Vec::new(); layering.len()];
    for (e, src, dst, edge) in level.graph.edges() {
        let Ok(src_node) = level.graph.node(src) else {
            continue;
        };
        let local = level.local_rank(src_node.rank);
        if local < edges_by_rank.len() {
            edges_by_rank[local].push((e, position[src], position[dst], edge.is_heavy()));
        }
    }

    for pair in edges_by_rank {
        for &(e, src_pos, dst_pos, heavy) in &pair {
            if heavy {
                continue;
            }
            for &(_, h_src, h_dst, h_heavy) in &pair {
                if !h_heavy {
                    continue;
                }
                let d_north = src_pos as i64 - h_src as i64;
                let d_south = dst_pos as i64 - h_dst as i64;
                if d_north * d_south < 0 {
                    unusable.insert(e);
                    break;
                }
            }
        }
    }
    unusable
}

/// Median alignment with monotone neighbor selection. `view` ranks are already mirrored
/// for right preference, so the selection is always left-biased here.
fn align_medians(
    level: &LevelGraph,
    view: &[Vec<LevelId>],
    vertical: Vertical,
    unusable: &HashSet<usize>,
    slots: usize,
) -> (Vec<LevelId>, Vec<LevelId>) {
    let mut root: Vec<LevelId> = (0..slots).collect();
    let mut align: Vec<LevelId> = (0..slots).collect();

    let mut position = vec![0usize; slots];
    for rank in view {
        for (pos, &id) in rank.iter().enumerate() {
            position[id] = pos;
        }
    }

    let rank_indices: Vec<usize> = match vertical {
        Vertical::Up => (0..view.len()).collect(),
        Vertical::Down => (0..view.len()).rev().collect(),
    };

    for &r in &rank_indices {
        let mut last_taken: i64 = -1;
        for &v in &view[r] {
            // Fixed-side neighbors with the edge that carries them.
            let mut neighbors: Vec<(usize, usize)> = Vec::new();
            let edges = match vertical {
                Vertical::Up => level.graph.in_edges(v),
                Vertical::Down => level.graph.out_edges(v),
            };
            let Ok(edges) = edges else { continue };
            for &e in edges {
                let other = match vertical {
                    Vertical::Up => level.graph.src(e),
                    Vertical::Down => level.graph.dst(e),
                };
                let Ok(other) = other else { continue };
                neighbors.push((position[other], e));
            }
            if neighbors.is_empty() {
                continue;
            }
            neighbors.sort_unstable();

            let d = neighbors.len();
            let lo = (d - 1) / 2;
            let hi = d / 2;
            for m in lo..=hi {
                if align[v] != v {
                    break;
                }
                let (pos, e) = neighbors[m];
                if unusable.contains(&e) || (pos as i64) <= last_taken {
                    continue;
                }
                let u = match vertical {
                    Vertical::Up => level.graph.src(e).unwrap_or(v),
                    Vertical::Down => level.graph.dst(e).unwrap_or(v),
                };
                align[u] = v;
                root[v] = root[u];
                align[v] = root[u];
                last_taken = pos as i64;
            }
        }
    }

    (root, align)
}

/// Longest-path compaction of the block graph. Separation between in-rank neighbors is
/// the target edge length plus the half widths.
fn compact(
    view: &[Vec<LevelId>],
    root: &[LevelId],
    widths: &[f64],
    target: f64,
    slots: usize,
) -> Vec<f64> {
    let mut block_x: Vec<Option<f64>> = vec![None; slots];
    let mut block_width = vec![0.0f64; slots];
    for id in 0..slots {
        let b = root[id];
        block_width[b] = block_width[b].max(widths[id]);
    }

    // Left in-rank neighbor per node.
    let mut left_of: Vec<Option<LevelId>> = vec![None; slots];
    for rank in view {
        for pair in rank.windows(2) {
            left_of[pair[1]] = Some(pair[0]);
        }
    }

    // Members per block for the placement walk.
    let mut members: Vec<Vec<LevelId>> = vec![Vec::new(); slots];
    for rank in view {
        for &id in rank {
            members[root[id]].push(id);
        }
    }

    // A block is as wide as its widest member; separations work on block widths.
    fn place(
        b: LevelId,
        members: &[Vec<LevelId>],
        left_of: &[Option<LevelId>],
        root: &[LevelId],
        block_width: &[f64],
        target: f64,
        block_x: &mut Vec<Option<f64>>,
        depth: usize,
    ) -> f64 {
        if let Some(x) = block_x[b] {
            return x;
        }
        // Cycle guard: malformed block graphs place at zero rather than recurse forever.
        if depth > members.len() + 1 {
            block_x[b] = Some(0.0);
            return 0.0;
        }
        block_x[b] = Some(0.0);
        let mut x = 0.0f64;
        for &u in &members[b] {
            if let Some(w) = left_of[u] {
                let wb = root[w];
                if wb == b {
                    continue;
                }
                let wx = place(
                    wb,
                    members,
                    left_of,
                    root,
                    block_width,
                    target,
                    block_x,
                    depth + 1,
                );
                let sep = target + (block_width[wb] + block_width[b]) / 2.0;
                x = x.max(wx + sep);
            }
        }
        block_x[b] = Some(x);
        x
    }

    for id in 0..slots {
        let b = root[id];
        place(
            b,
            &members,
            &left_of,
            root,
            &block_width,
            target,
            &mut block_x,
            0,
        );
    }

    (0..slots)
        .map(|id| block_x[root[id]].unwrap_or(0.0))
        .collect()
}

/// Shifts the four layouts over each other: the narrowest is the anchor; left-biased
/// layouts match minima, right-biased layouts match maxima.
fn align_layouts(layouts: &mut [Vec<f64>], layering: &[Vec<LevelId>], widths: &[f64]) {
    let mut spans: Vec<(f64, f64)> = Vec::with_capacity(layouts.len());
    for xs in layouts.iter() {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for rank in layering {
            for &id in rank {
                min = min.min(xs[id] - widths[id] / 2.0);
                max = max.max(xs[id] + widths[id] / 2.0);
            }
        }
        spans.push((min, max));
    }

    let Some(anchor) = spans
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (a.1 - a.0)
                .partial_cmp(&(b.1 - b.0))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
    else {
        return;
    };
    let (anchor_min, anchor_max) = spans[anchor];

    for (i, xs) in layouts.iter_mut().enumerate() {
        // Layouts 0 and 2 are left-biased, 1 and 3 mirrored (right-biased).
        let delta = if i % 2 == 0 {
            anchor_min - spans[i].0
        } else {
            anchor_max - spans[i].1
        };
        if delta != 0.0 {
            for x in xs.iter_mut() {
                *x += delta;
            }
        }
    }
}

/// Post-pass: an aligned block whose members all sit first in their rank (nothing to its
/// left) is pulled right until its spacing to the right neighbor equals the target. The
/// strict `>` comparison is load-bearing: blocks exactly at the target stay put.
fn shift_right_only_blocks(
    level: &LevelGraph,
    layering: &[Vec<LevelId>],
    widths: &[f64],
    target: f64,
    xs: &mut [f64],
) {
    let slots = xs.len();
    // Blocks here are chains of level edges whose endpoints ended up x-aligned.
    let mut block = vec![usize::MAX; slots];
    let mut next = 0usize;
    for rank in layering {
        for &id in rank {
            if block[id] == usize::MAX {
                block[id] = next;
                next += 1;
            }
            let Ok(out) = level.graph.out_edges(id) else {
                continue;
            };
            for &e in out {
                let Ok(dst) = level.graph.dst(e) else { continue };
                if (xs[dst] - xs[id]).abs() <= crate::geom::EPSILON && block[dst] == usize::MAX {
                    block[dst] = block[id];
                }
            }
        }
    }

    for b in 0..next {
        let mut gap = f64::INFINITY;
        let mut eligible = true;
        let mut found = false;
        for rank in layering {
            for (pos, &id) in rank.iter().enumerate() {
                if block[id] != b {
                    continue;
                }
                found = true;
                if pos > 0 && block[rank[pos - 1]] != b {
                    eligible = false;
                }
                if pos + 1 < rank.len() {
                    let right = rank[pos + 1];
                    gap = gap.min(
                        (xs[right] - widths[right] / 2.0) - (xs[id] + widths[id] / 2.0),
                    );
                }
            }
        }
        if !found || !eligible || !gap.is_finite() {
            continue;
        }
        if gap > target {
            let delta = gap - target;
            for id in 0..slots {
                if block[id] == b {
                    xs[id] += delta;
                }
            }
        }
    }
}
