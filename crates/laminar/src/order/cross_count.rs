//! Weighted bilayer crossing counting (Barth-Jünger-Mutzel accumulator tree).

use super::types::OrderGraph;

/// Crossings between `north_rank` and the rank below it. Heavy weights count as 1; the
/// conflict-resolution pass, not the counter, enforces their legality.
pub fn between(og: &OrderGraph, north_rank: usize) -> f64 {
    if north_rank + 1 >= og.num_ranks() {
        return 0.0;
    }
    let south_len = og.sequence(north_rank + 1).len();
    if south_len == 0 {
        return 0.0;
    }

    #[derive(Debug, Clone, Copy)]
    struct SouthEntry {
        north: usize,
        pos: usize,
        weight: f64,
    }

    let mut south_entries: Vec<SouthEntry> = Vec::new();
    for (_, src, dst, &weight) in og.graph.edges() {
        if og.rank_of(src) != north_rank || og.rank_of(dst) != north_rank + 1 {
            continue;
        }
        south_entries.push(SouthEntry {
            north: og.position(src),
            pos: og.position(dst),
            weight: if weight.is_finite() { weight } else { 1.0 },
        });
    }
    south_entries.sort_by(|a, b| (a.north, a.pos).cmp(&(b.north, b.pos)));

    let mut first_index: usize = 1;
    while first_index < south_len {
        first_index <<= 1;
    }
    let tree_size = 2 * first_index - 1;
    first_index -= 1;
    let mut tree: Vec<f64> = vec![0.0; tree_size];

    let mut cc: f64 = 0.0;
    for entry in south_entries {
        let mut index = entry.pos + first_index;
        tree[index] += entry.weight;
        let mut weight_sum: f64 = 0.0;
        while index > 0 {
            if index % 2 == 1 {
                weight_sum += tree[index + 1];
            }
            index = (index - 1) >> 1;
            tree[index] += entry.weight;
        }
        cc += entry.weight * weight_sum;
    }

    cc
}

/// Total crossings over every adjacent rank pair.
pub fn total(og: &OrderGraph) -> f64 {
    let mut cc = 0.0;
    for rank in 0..og.num_ranks().saturating_sub(1) {
        cc += between(og, rank);
    }
    cc
}
