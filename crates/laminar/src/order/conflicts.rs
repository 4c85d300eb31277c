//! Conflict resolution for heavy edges.
//!
//! A heavy segment (intra-node rank span or virtual chain interior) must never cross
//! another heavy segment, and should not be crossed obliquely by a light edge. After the
//! barycentric sweeps, each rank pair is scanned; HEAVY-HEAVY crossings are untangled by
//! swapping a south endpoint past the other, HEAVY-LIGHT crossings by relocating a set
//! of south nodes sideways (X-resolution) or, failing that, by growing the graph one
//! rank downwards (Y-resolution, performed by the caller).

use super::cross_count;
use super::types::{OrderGraph, OrderNodeId, OrderPayload};
use crate::level::LevelGraph;
use crate::model::NodeId;
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Clean,
    /// Layout nodes that must move down one rank before ordering can continue.
    NeedsRankShift(Vec<NodeId>),
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    src: OrderNodeId,
    dst: OrderNodeId,
    heavy: bool,
}

#[derive(Debug, Clone, Copy)]
enum Conflict {
    HeavyHeavy { a: Segment, b: Segment },
    HeavyLight { heavy: Segment, light: Segment },
}

pub fn resolve(
    og: &mut OrderGraph,
    level: &LevelGraph,
    immovable: &HashSet<NodeId>,
) -> Outcome {
    let mut skipped: HashSet<(OrderNodeId, OrderNodeId)> = HashSet::default();
    let cap = 4 * og.graph.node_count() + 64;
    let mut rounds = 0usize;

    loop {
        let Some((pair_rank, conflict)) = find_conflict(og, &skipped) else {
            return Outcome::Clean;
        };
        rounds += 1;
        if rounds > cap {
            debug_assert!(false, "heavy-edge conflict resolution did not converge");
            return Outcome::Clean;
        }

        match conflict {
            Conflict::HeavyHeavy { a, b } => resolve_heavy_heavy(og, pair_rank, a, b),
            Conflict::HeavyLight { heavy, light } => {
                if resolve_heavy_light(og, pair_rank, heavy, light) {
                    continue;
                }
                let targets = shift_targets(og, level, immovable, light.dst);
                if targets.is_empty() {
                    // Pinned by a scope frame; leave the crossing in place.
                    tracing::warn!(pair_rank, "unresolvable heavy-light conflict");
                    skipped.insert((heavy.dst, light.dst));
                    continue;
                }
                return Outcome::NeedsRankShift(targets);
            }
        }
    }
}

fn crossing(og: &OrderGraph, a: &Segment, b: &Segment) -> bool {
    let d_north = og.position(a.src) as i64 - og.position(b.src) as i64;
    let d_south = og.position(a.dst) as i64 - og.position(b.dst) as i64;
    d_north * d_south < 0
}

fn find_conflict(
    og: &OrderGraph,
    skipped: &HashSet<(OrderNodeId, OrderNodeId)>,
) -> Option<(usize, Conflict)> {
    for pair_rank in 0..og.num_ranks().saturating_sub(1) {
        let mut segments: Vec<Segment> = Vec::new();
        for (_, src, dst, &weight) in og.graph.edges() {
            if og.rank_of(src) == pair_rank && og.rank_of(dst) == pair_rank + 1 {
                segments.push(Segment {
                    src,
                    dst,
                    heavy: weight.is_infinite(),
                });
            }
        }

        let mut fallback: Option<Conflict> = None;
        for (i, a) in segments.iter().enumerate() {
            if !a.heavy {
                continue;
            }
            for (j, b) in segments.iter().enumerate() {
                if i == j || !crossing(og, a, b) {
                    continue;
                }
                if b.heavy {
                    if i < j {
                        return Some((pair_rank, Conflict::HeavyHeavy { a: *a, b: *b }));
                    }
                } else if fallback.is_none() && !skipped.contains(&(a.dst, b.dst)) {
                    fallback = Some(Conflict::HeavyLight {
                        heavy: *a,
                        light: *b,
                    });
                }
            }
        }
        if let Some(c) = fallback {
            return Some((pair_rank, c));
        }
    }
    None
}

/// Moves one of the two south endpoints past the other; keeps whichever order counts
/// fewer crossings, breaking ties with the rank below.
fn resolve_heavy_heavy(og: &mut OrderGraph, pair_rank: usize, a: Segment, b: Segment) {
    let south = pair_rank + 1;
    let current = og.sequence(south);

    // South order must match the north order of the two chains.
    let a_first = og.position(a.src) < og.position(b.src);
    let candidate_a = moved_past(&current, a.dst, b.dst, a_first);
    let candidate_b = moved_past(&current, b.dst, a.dst, !a_first);

    let score = |og: &mut OrderGraph, seq: &[OrderNodeId]| -> (f64, f64) {
        og.apply_sequence(south, seq);
        let primary = cross_count::between(og, pair_rank);
        let below = if south + 1 < og.num_ranks() {
            cross_count::between(og, south)
        } else {
            0.0
        };
        (primary, below)
    };

    let (a_primary, a_below) = score(og, &candidate_a);
    let (b_primary, b_below) = score(og, &candidate_b);

    if (a_primary, a_below) <= (b_primary, b_below) {
        og.apply_sequence(south, &candidate_a);
    } else {
        og.apply_sequence(south, &candidate_b);
    }
}

/// `mover` re-inserted on the matching side of `anchor`, everything else unchanged.
fn moved_past(
    seq: &[OrderNodeId],
    mover: OrderNodeId,
    anchor: OrderNodeId,
    before: bool,
) -> Vec<OrderNodeId> {
    let mut out: Vec<OrderNodeId> = Vec::with_capacity(seq.len());
    for &id in seq {
        if id == mover {
            continue;
        }
        if id == anchor {
            if before {
                out.push(mover);
                out.push(anchor);
            } else {
                out.push(anchor);
                out.push(mover);
            }
        } else {
            out.push(id);
        }
    }
    out
}

/// X-resolution: relocate a MOVING set past the other endpoint's block on one side.
/// Tries moving the light endpoint's set and the heavy endpoint's set, keeps the plan
/// moving fewer nodes. Returns false when neither side is feasible.
fn resolve_heavy_light(
    og: &mut OrderGraph,
    pair_rank: usize,
    heavy: Segment,
    light: Segment,
) -> bool {
    let south = pair_rank + 1;
    // The light endpoint must end on the same side of the heavy chain as its north end.
    let light_goes_left = og.position(light.src) < og.position(heavy.src);

    let plan_red = plan_move(og, south, light.dst, heavy.dst, light_goes_left);
    let plan_green = plan_move(og, south, heavy.dst, light.dst, !light_goes_left);

    let plan = match (plan_red, plan_green) {
        (Some(r), Some(g)) => Some(if r.movers.len() <= g.movers.len() { r } else { g }),
        (Some(r), None) => Some(r),
        (None, Some(g)) => Some(g),
        (None, None) => None,
    };
    let Some(plan) = plan else { return false };

    og.apply_sequence(south, &plan.sequence);
    true
}

#[derive(Debug, Clone)]
struct MovePlan {
    movers: Vec<OrderNodeId>,
    sequence: Vec<OrderNodeId>,
}

/// North position of the heavy in-segment anchoring a south node, if it has one.
fn heavy_anchor(og: &OrderGraph, node: OrderNodeId) -> Option<usize> {
    let in_edges = og.graph.in_edges(node).ok()?;
    for &e in in_edges {
        let Ok(&w) = og.graph.edge(e) else { continue };
        if !w.is_infinite() {
            continue;
        }
        let Ok(src) = og.graph.src(e) else { continue };
        return Some(og.position(src));
    }
    None
}

/// Plans relocating `seed` (plus any node dragged along by heavy-anchor ordering) to sit
/// immediately left or right of `anchor`. Fails if the anchor itself would have to move.
fn plan_move(
    og: &OrderGraph,
    rank: usize,
    seed: OrderNodeId,
    anchor: OrderNodeId,
    place_left: bool,
) -> Option<MovePlan> {
    let seq = og.sequence(rank);
    let anchors: HashMap<OrderNodeId, usize> = seq
        .iter()
        .filter_map(|&id| heavy_anchor(og, id).map(|a| (id, a)))
        .collect();

    let mut movers: HashSet<OrderNodeId> = HashSet::default();
    movers.insert(seed);

    loop {
        let candidate = build_sequence(&seq, &movers, anchor, place_left);
        let final_pos: HashMap<OrderNodeId, usize> =
            candidate.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        let current_pos: HashMap<OrderNodeId, usize> =
            seq.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        // A pair of heavy-anchored nodes whose order was consistent and flips with this
        // move drags the stationary one into the moving set.
        let mut grew = false;
        let ids: Vec<OrderNodeId> = anchors.keys().copied().collect();
        'pairs: for (i, &a) in ids.iter().enumerate() {
            for &b in ids.iter().skip(i + 1) {
                let (pa, pb) = (anchors[&a], anchors[&b]);
                if pa == pb {
                    continue;
                }
                let was_consistent = (current_pos[&a] < current_pos[&b]) == (pa < pb);
                let is_consistent = (final_pos[&a] < final_pos[&b]) == (pa < pb);
                if !was_consistent || is_consistent {
                    continue;
                }
                let stationary = if movers.contains(&a) { b } else { a };
                if stationary == anchor {
                    return None;
                }
                if movers.insert(stationary) {
                    grew = true;
                    continue 'pairs;
                }
                // Both already moving yet still inconsistent: give up on this side.
                return None;
            }
        }

        if !grew {
            let mut ordered: Vec<OrderNodeId> = movers.iter().copied().collect();
            ordered.sort_by_key(|id| current_pos.get(id).copied().unwrap_or(usize::MAX));
            return Some(MovePlan {
                movers: ordered,
                sequence: candidate,
            });
        }
    }
}

/// Stationary nodes keep their order; movers form a block immediately beside `anchor`.
fn build_sequence(
    seq: &[OrderNodeId],
    movers: &HashSet<OrderNodeId>,
    anchor: OrderNodeId,
    place_left: bool,
) -> Vec<OrderNodeId> {
    let block: Vec<OrderNodeId> = seq.iter().copied().filter(|id| movers.contains(id)).collect();
    let mut out: Vec<OrderNodeId> = Vec::with_capacity(seq.len());
    for &id in seq {
        if movers.contains(&id) {
            continue;
        }
        if id == anchor {
            if place_left {
                out.extend(&block);
                out.push(id);
            } else {
                out.push(id);
                out.extend(&block);
            }
        } else {
            out.push(id);
        }
    }
    out
}

/// The layout node behind the light endpoint, unless it is pinned (a scope node or a
/// frame), in which case Y-resolution is impossible here.
fn shift_targets(
    og: &OrderGraph,
    level: &LevelGraph,
    immovable: &HashSet<NodeId>,
    light_dst: OrderNodeId,
) -> Vec<NodeId> {
    let Ok(order_node) = og.graph.node(light_dst) else {
        return Vec::new();
    };
    let OrderPayload::Level(level_id) = order_node.payload else {
        return Vec::new();
    };
    let Ok(shadow) = level.graph.node(level_id) else {
        return Vec::new();
    };
    if immovable.contains(&shadow.layout_node) {
        return Vec::new();
    }
    vec![shadow.layout_node]
}
