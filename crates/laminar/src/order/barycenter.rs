//! Barycentric sweeps with gated partial-permutation commits, plus the shuffle retries.

use super::cross_count;
use super::types::{GroupId, OrderGraph, OrderNodeId};
use crate::rng::Rng;
use rustc_hash::FxHashMap as HashMap;

/// Alternates top-down and bottom-up passes until two consecutive passes bring no strict
/// improvement in total crossings. Returns the final total.
pub fn optimize(og: &mut OrderGraph, reorder_groups: bool) -> f64 {
    og.reindex_all();
    let mut best = cross_count::total(og);
    let mut stale = 0usize;
    let mut pass = 0usize;
    let pass_cap = 4 * og.num_ranks().max(1) + 16;

    while stale < 2 && pass < pass_cap {
        sweep(og, pass % 2 == 0, reorder_groups);
        let cc = cross_count::total(og);
        if cc < best {
            best = cc;
            stale = 0;
        } else {
            stale += 1;
        }
        pass += 1;
    }

    best
}

fn sweep(og: &mut OrderGraph, downward: bool, reorder_groups: bool) {
    let num_ranks = og.num_ranks();
    if num_ranks < 2 {
        return;
    }
    let ranks: Vec<usize> = if downward {
        (1..num_ranks).collect()
    } else {
        (0..num_ranks - 1).rev().collect()
    };

    for rank in ranks {
        let proposed = propose(og, rank, downward, reorder_groups);
        commit_partials(og, rank, downward, &proposed);
    }
}

/// Mean fixed-rank neighbor position per node, weighted; heavy weights count as 1.
fn barycenters(og: &OrderGraph, rank: usize, downward: bool) -> HashMap<OrderNodeId, f64> {
    let mut out: HashMap<OrderNodeId, f64> = HashMap::default();
    let mut weights: HashMap<OrderNodeId, f64> = HashMap::default();
    let fixed = if downward { rank - 1 } else { rank + 1 };

    for (_, src, dst, &weight) in og.graph.edges() {
        let (node, neighbor) = if downward { (dst, src) } else { (src, dst) };
        if og.rank_of(node) != rank || og.rank_of(neighbor) != fixed {
            continue;
        }
        let w = if weight.is_finite() { weight } else { 1.0 };
        *out.entry(node).or_insert(0.0) += w * og.position(neighbor) as f64;
        *weights.entry(node).or_insert(0.0) += w;
    }

    for (node, sum) in &mut out {
        if let Some(&w) = weights.get(node) {
            if w > 0.0 {
                *sum /= w;
            }
        }
    }
    out
}

/// Sorts members by barycenter within each group, derives group means, and (when group
/// ordering is enabled) reorders the groups by their means. Nodes without neighbors keep
/// their current position as the sort key.
fn propose(
    og: &OrderGraph,
    rank: usize,
    downward: bool,
    reorder_groups: bool,
) -> Vec<OrderNodeId> {
    let bary = barycenters(og, rank, downward);

    let mut group_entries: Vec<(GroupId, Vec<OrderNodeId>, f64, usize)> = Vec::new();
    for (slot, &gid) in og.ranks[rank].iter().enumerate() {
        let mut members: Vec<OrderNodeId> = og.groups[gid].nodes.clone();
        members.sort_by(|&a, &b| {
            let ka = bary.get(&a).copied().unwrap_or(og.position(a) as f64);
            let kb = bary.get(&b).copied().unwrap_or(og.position(b) as f64);
            ka.partial_cmp(&kb)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(og.position(a).cmp(&og.position(b)))
        });

        let mut sum = 0.0;
        let mut n = 0usize;
        for m in &members {
            if let Some(&b) = bary.get(m) {
                sum += b;
                n += 1;
            }
        }
        let mean = if n > 0 {
            sum / n as f64
        } else {
            members
                .first()
                .map(|&m| og.position(m) as f64)
                .unwrap_or(slot as f64)
        };
        group_entries.push((gid, members, mean, slot));
    }

    if reorder_groups {
        group_entries.sort_by(|a, b| {
            a.2.partial_cmp(&b.2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.3.cmp(&b.3))
        });
    }

    group_entries
        .into_iter()
        .flat_map(|(_, members, _, _)| members)
        .collect()
}

/// Splits the difference between the current and proposed order into minimal
/// self-contained contiguous ranges and commits each one only if it strictly reduces
/// crossings on the swept side without increasing the two-sided sum.
fn commit_partials(og: &mut OrderGraph, rank: usize, downward: bool, proposed: &[OrderNodeId]) {
    let current = og.sequence(rank);
    if current == proposed || current.len() != proposed.len() {
        return;
    }

    let mut pos_in_current: HashMap<OrderNodeId, usize> = HashMap::default();
    for (i, &id) in current.iter().enumerate() {
        pos_in_current.insert(id, i);
    }

    let upper_pair = rank.checked_sub(1);
    let lower_pair = (rank + 1 < og.num_ranks()).then_some(rank);
    // The gate is the side barycenters were computed from.
    let (gate_pair, other_pair) = if downward {
        (upper_pair, lower_pair)
    } else {
        (lower_pair, upper_pair)
    };
    let Some(gate_pair) = gate_pair else { return };

    let mut working = current.clone();
    let mut i = 0usize;
    while i < current.len() {
        if current[i] == proposed[i] {
            i += 1;
            continue;
        }
        // Extend until the range is a self-contained permutation.
        let start = i;
        let mut end = i;
        let mut j = i;
        while j <= end {
            let p = pos_in_current.get(&proposed[j]).copied().unwrap_or(j);
            end = end.max(p);
            j += 1;
        }

        let mut candidate = working.clone();
        candidate[start..=end].copy_from_slice(&proposed[start..=end]);

        let gate_before = cross_count::between(og, gate_pair);
        let other_before = other_pair.map_or(0.0, |p| cross_count::between(og, p));
        og.apply_sequence(rank, &candidate);
        let gate_after = cross_count::between(og, gate_pair);
        let other_after = other_pair.map_or(0.0, |p| cross_count::between(og, p));

        if gate_after < gate_before && gate_after + other_after <= gate_before + other_before {
            working = candidate;
        } else {
            og.apply_sequence(rank, &working);
        }

        i = end + 1;
    }
}

/// One shuffled restart: group order per rank (keeping equal shuffle hierarchies
/// contiguous) and member order within each group.
pub fn shuffle(og: &mut OrderGraph, rng: &mut Rng) {
    for rank in 0..og.ranks.len() {
        let gids = og.ranks[rank].clone();
        if gids.len() > 1 {
            // Cluster by hierarchy so siblings of one parent stay together.
            let mut clusters: Vec<(Vec<usize>, Vec<GroupId>)> = Vec::new();
            for gid in gids {
                let key = og.groups[gid].shuffle_hierarchy.clone();
                match clusters.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, members)) => members.push(gid),
                    None => clusters.push((key, vec![gid])),
                }
            }
            for (_, members) in &mut clusters {
                rng.shuffle(members);
            }
            rng.shuffle(&mut clusters);
            og.ranks[rank] = clusters.into_iter().flat_map(|(_, m)| m).collect();
        }
        for &gid in &og.ranks[rank] {
            let mut nodes = std::mem::take(&mut og.groups[gid].nodes);
            rng.shuffle(&mut nodes);
            og.groups[gid].nodes = nodes;
        }
        og.reindex(rank);
    }
}
