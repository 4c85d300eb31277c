//! Helper algorithms over `DiGraph`: toposort, components, BFS, greedy cycle removal.

use super::core::{DiGraph, EdgeId, NodeId};
use super::error::{GraphError, Result};
use rustc_hash::FxHashSet as HashSet;
use std::collections::VecDeque;

/// Kahn's algorithm. Fails with `Cyclic` if any node is unreachable from the sources.
pub fn toposort<N, E>(g: &DiGraph<N, E>) -> Result<Vec<NodeId>> {
    let (sorted, remaining) = toposort_partial(g);
    if remaining.is_empty() {
        Ok(sorted)
    } else {
        Err(GraphError::Cyclic)
    }
}

/// Kahn's algorithm that stops at cycles: returns the sorted prefix and the leftover nodes.
pub fn toposort_partial<N, E>(g: &DiGraph<N, E>) -> (Vec<NodeId>, Vec<NodeId>) {
    let mut in_deg: Vec<usize> = Vec::new();
    let mut queue: VecDeque<NodeId> = VecDeque::new();
    for v in g.node_ids() {
        if in_deg.len() <= v {
            in_deg.resize(v + 1, 0);
        }
        in_deg[v] = g.in_degree(v);
        if in_deg[v] == 0 {
            queue.push_back(v);
        }
    }

    let mut sorted: Vec<NodeId> = Vec::with_capacity(g.node_count());
    while let Some(v) = queue.pop_front() {
        sorted.push(v);
        let Ok(out) = g.out_edges(v) else { continue };
        for &e in out {
            let Ok(w) = g.dst(e) else { continue };
            in_deg[w] -= 1;
            if in_deg[w] == 0 {
                queue.push_back(w);
            }
        }
    }

    let mut placed: HashSet<NodeId> = sorted.iter().copied().collect();
    let remaining: Vec<NodeId> = g.node_ids().filter(|v| !placed.remove(v)).collect();
    (sorted, remaining)
}

/// Weakly connected components, each in ascending node-id order.
pub fn components<N, E>(g: &DiGraph<N, E>) -> Vec<Vec<NodeId>> {
    let mut seen: HashSet<NodeId> = HashSet::default();
    let mut out: Vec<Vec<NodeId>> = Vec::new();

    for start in g.node_ids() {
        if !seen.insert(start) {
            continue;
        }
        let mut comp: Vec<NodeId> = Vec::new();
        let mut q: VecDeque<NodeId> = VecDeque::new();
        q.push_back(start);
        while let Some(v) = q.pop_front() {
            comp.push(v);
            let neighbors = g
                .successors(v)
                .into_iter()
                .flatten()
                .chain(g.predecessors(v).into_iter().flatten());
            for n in neighbors {
                if seen.insert(n) {
                    q.push_back(n);
                }
            }
        }
        comp.sort_unstable();
        out.push(comp);
    }

    out
}

/// Breadth-first traversal from `start`, in visit order. With `undirected`, in-edges are
/// walked as well as out-edges.
pub fn bfs<N, E>(g: &DiGraph<N, E>, start: NodeId, undirected: bool) -> Result<Vec<NodeId>> {
    if !g.has_node(start) {
        return Err(GraphError::CorruptedNode(start));
    }

    let mut seen: HashSet<NodeId> = HashSet::default();
    seen.insert(start);
    let mut q: VecDeque<NodeId> = VecDeque::new();
    q.push_back(start);
    let mut order: Vec<NodeId> = Vec::new();

    while let Some(v) = q.pop_front() {
        order.push(v);
        for w in g.successors(v)? {
            if seen.insert(w) {
                q.push_back(w);
            }
        }
        if undirected {
            for w in g.predecessors(v)? {
                if seen.insert(w) {
                    q.push_back(w);
                }
            }
        }
    }

    Ok(order)
}

/// Greedy cycle removal: run Kahn's algorithm as far as it goes; when a cycle halts
/// progress, pick the smallest remaining node id, invert its incoming edges that
/// originate from still-remaining nodes, and continue. Returns the inverted edge ids.
///
/// Self-loops must be detached by the caller beforehand; inverting them is a no-op that
/// would stall the sweep.
pub fn remove_cycles<N, E>(g: &mut DiGraph<N, E>) -> Vec<EdgeId> {
    let mut alive: HashSet<NodeId> = g.node_ids().collect();
    let mut in_deg: Vec<usize> = vec![0; g.node_ids().max().map_or(0, |m| m + 1)];
    for v in g.node_ids() {
        in_deg[v] = g.in_degree(v);
    }

    let mut queue: VecDeque<NodeId> = g.node_ids().filter(|&v| in_deg[v] == 0).collect();
    let mut inverted: Vec<EdgeId> = Vec::new();

    loop {
        while let Some(v) = queue.pop_front() {
            if !alive.remove(&v) {
                continue;
            }
            let out: Vec<EdgeId> = g.out_edges(v).map(|s| s.to_vec()).unwrap_or_default();
            for e in out {
                let Ok(w) = g.dst(e) else { continue };
                if !alive.contains(&w) {
                    continue;
                }
                in_deg[w] -= 1;
                if in_deg[w] == 0 {
                    queue.push_back(w);
                }
            }
        }

        if alive.is_empty() {
            break;
        }

        // Stuck on a cycle: break it at the smallest remaining id.
        let Some(&v) = alive.iter().min() else { break };
        let incoming: Vec<EdgeId> = g.in_edges(v).map(|s| s.to_vec()).unwrap_or_default();
        for e in incoming {
            let Ok(u) = g.src(e) else { continue };
            if u == v || !alive.contains(&u) {
                continue;
            }
            if g.invert_edge(e).is_ok() {
                // The edge now runs v -> u; u gains an in-edge it must drain later.
                in_deg[u] += 1;
                inverted.push(e);
            }
        }
        in_deg[v] = 0;
        queue.push_back(v);
    }

    inverted
}
