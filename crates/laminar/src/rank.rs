//! Rank assignment: weighted longest-path with back-propagation and preassigned ranks.
//!
//! Subgraphs are ranked bottom-up so every scope node knows its rank span (the number of
//! ranks its interior occupies) before the enclosing graph is ranked with edge weights
//! equal to the source's span. Afterwards ranks are globalized top-down.

use crate::error::{Error, Result};
use crate::model::{LayoutGraph, NodeId};
use laminar_graphlib::{DiGraph, alg};

/// A lightweight node participating in longest-path ranking.
#[derive(Debug, Clone, Default)]
pub struct RankNode {
    /// Rank fixed by an outer constraint; the solver keeps it.
    pub preassigned: Option<i32>,
    pub rank: Option<i32>,
}

/// The auxiliary ranking graph. Edge weights are the source's rank span.
#[derive(Debug, Clone, Default)]
pub struct RankGraph {
    pub graph: DiGraph<RankNode, f64>,
}

impl RankGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, preassigned: Option<i32>) -> usize {
        self.graph.add_node(RankNode {
            preassigned,
            rank: None,
        })
    }

    pub fn add_edge(&mut self, src: usize, dst: usize, weight: f64) -> Result<()> {
        self.graph.add_edge(src, dst, weight)?;
        Ok(())
    }

    pub fn rank_of(&self, id: usize) -> Option<i32> {
        self.graph.node(id).ok().and_then(|n| n.rank)
    }

    /// Assigns every node an integer rank such that `rank(dst) >= rank(src) + weight`
    /// for every edge, with the minimum rank normalized to 0.
    ///
    /// Each weakly connected source component is relaxed from 0, then shifted so the
    /// tightest preassigned node keeps its rank; sources with downstream slack are
    /// back-propagated toward their successors. Fails with `Unrankable` on infinite
    /// weights or cycles, and with `InvalidInput` when preassigned ranks cannot be
    /// honored.
    pub fn solve(&mut self) -> Result<()> {
        for (_, _, _, &w) in self.graph.edges() {
            if !w.is_finite() || w < 0.0 {
                return Err(Error::Unrankable(format!(
                    "edge weight {w} is not a nonnegative finite number"
                )));
            }
        }

        let topo = alg::toposort(&self.graph)
            .map_err(|_| Error::Unrankable("ranking graph contains a cycle".into()))?;
        let mut topo_pos = vec![0usize; self.graph.node_ids().max().map_or(0, |m| m + 1)];
        for (i, &v) in topo.iter().enumerate() {
            topo_pos[v] = i;
        }

        let mut global_min = i32::MAX;
        for mut component in alg::components(&self.graph) {
            component.sort_by_key(|&v| topo_pos[v]);
            self.solve_component(&component)?;
            for &v in &component {
                if let Some(rank) = self.rank_of(v) {
                    global_min = global_min.min(rank);
                }
            }
        }

        if global_min != i32::MAX && global_min != 0 {
            for v in self.graph.node_ids().collect::<Vec<_>>() {
                if let Ok(node) = self.graph.node_mut(v) {
                    if let Some(rank) = node.rank.as_mut() {
                        *rank -= global_min;
                    }
                }
            }
        }
        Ok(())
    }

    /// `component` arrives in topological order.
    fn solve_component(&mut self, component: &[usize]) -> Result<()> {
        // Forward longest path from the component's sources.
        for &v in component {
            let mut rank: i32 = 0;
            for &e in self.graph.in_edges(v)?.to_vec().iter() {
                let u = self.graph.src(e)?;
                let w = *self.graph.edge(e)? as i32;
                if let Some(u_rank) = self.rank_of(u) {
                    rank = rank.max(u_rank + w);
                }
            }
            if let Ok(node) = self.graph.node_mut(v) {
                node.rank = Some(rank);
            }
        }

        // Back-propagate slack: a source constrained only from below moves down to sit
        // one weight above its tightest successor.
        for &v in component.iter().rev() {
            if self.graph.in_degree(v) > 0 || self.graph.out_degree(v) == 0 {
                continue;
            }
            if self
                .graph
                .node(v)
                .map(|n| n.preassigned.is_some())
                .unwrap_or(false)
            {
                continue;
            }
            let mut pull: Option<i32> = None;
            for &e in self.graph.out_edges(v)? {
                let dst = self.graph.dst(e)?;
                let w = *self.graph.edge(e)? as i32;
                let Some(dst_rank) = self.rank_of(dst) else {
                    continue;
                };
                let candidate = dst_rank - w;
                pull = Some(match pull {
                    Some(p) => p.min(candidate),
                    None => candidate,
                });
            }
            if let Some(pull) = pull {
                if let Ok(node) = self.graph.node_mut(v) {
                    if node.rank.is_some_and(|r| pull > r) {
                        node.rank = Some(pull);
                    }
                }
            }
        }

        // Shift the component so the tightest preassigned node keeps its rank.
        let mut min_diff: Option<i32> = None;
        for &v in component {
            let node = self.graph.node(v)?;
            if let (Some(pre), Some(rank)) = (node.preassigned, node.rank) {
                let diff = pre - rank;
                min_diff = Some(match min_diff {
                    Some(d) => d.min(diff),
                    None => diff,
                });
            }
        }
        if let Some(shift) = min_diff {
            for &v in component {
                let node = self.graph.node_mut(v)?;
                node.rank = match node.preassigned {
                    Some(pre) => Some(pre),
                    None => node.rank.map(|r| r + shift),
                };
            }
        }

        // Preassignment may be infeasible; that is an input error, not a solver bug.
        for &v in component {
            for &e in self.graph.out_edges(v)? {
                let dst = self.graph.dst(e)?;
                let w = *self.graph.edge(e)? as i32;
                let (Some(src_rank), Some(dst_rank)) = (self.rank_of(v), self.rank_of(dst)) else {
                    continue;
                };
                if dst_rank < src_rank + w {
                    return Err(Error::InvalidInput(
                        "preassigned rank constraints are unsatisfiable".into(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Ranks the whole tree: local ranks bottom-up, then global offsets top-down.
pub fn assign(lg: &mut LayoutGraph) -> Result<()> {
    assign_local(lg)?;
    globalize(lg, 0);
    Ok(())
}

fn assign_local(lg: &mut LayoutGraph) -> Result<()> {
    // Children first: a scope node's span is its tallest interior.
    let node_ids: Vec<NodeId> = lg.graph.node_ids().collect();
    for &id in &node_ids {
        let node = lg.graph.node_mut(id)?;
        if node.children.is_empty() {
            continue;
        }
        let mut children = std::mem::take(&mut node.children);
        let mut span = 1usize;
        for child in &mut children {
            assign_local(child)?;
            span = span.max(child.num_ranks.max(1));
        }
        let node = lg.graph.node_mut(id)?;
        node.children = children;
        node.rank_span = span;
    }

    let mut rank_graph = RankGraph::new();
    let mut rank_ids = vec![usize::MAX; node_ids.iter().max().map_or(0, |&m| m + 1)];
    for &id in &node_ids {
        let preassigned = if lg.entry == Some(id) { Some(0) } else { None };
        rank_ids[id] = rank_graph.add_node(preassigned);
    }
    for (_, src, dst, edge) in lg.graph.edges() {
        if src == dst {
            continue;
        }
        let src_node = lg.graph.node(src)?;
        // A replica redirected onto its bundle's virtual stem or trunk only has to
        // respect the order around it, not a full rank gap.
        let relaxed =
            edge.is_replica && (src_node.is_virtual || lg.graph.node(dst)?.is_virtual);
        let weight = if relaxed {
            0.0
        } else {
            src_node.rank_span.max(1) as f64
        };
        rank_graph.add_edge(rank_ids[src], rank_ids[dst], weight)?;
    }
    rank_graph.solve()?;

    let mut num_ranks = 0usize;
    for &id in &node_ids {
        let rank = rank_graph.rank_of(rank_ids[id]).unwrap_or(0);
        let node = lg.graph.node_mut(id)?;
        node.rank = Some(rank);
        num_ranks = num_ranks.max(rank as usize + node.rank_span.max(1));
    }

    // The exit frame closes the scope: force it onto the last rank.
    if let Some(exit) = lg.exit {
        let last = num_ranks.saturating_sub(1) as i32;
        let node = lg.graph.node_mut(exit)?;
        if node.rank.is_some_and(|r| r < last) {
            node.rank = Some(last);
        }
    }

    lg.min_rank = 0;
    lg.num_ranks = num_ranks;
    Ok(())
}

/// Re-solves one subgraph's ranks in place after its scope spans changed (a nested
/// scope grew during ordering). Nested trees are shifted by their scope node's delta;
/// the graph's own `min_rank` offset is preserved.
pub fn rerank_graph(lg: &mut LayoutGraph) -> Result<()> {
    let node_ids: Vec<NodeId> = lg.graph.node_ids().collect();

    // Adopt the children's possibly-grown spans.
    for &id in &node_ids {
        let node = lg.graph.node_mut(id)?;
        if node.children.is_empty() {
            continue;
        }
        let span = node
            .children
            .iter()
            .map(|c| c.num_ranks.max(1))
            .max()
            .unwrap_or(1);
        node.rank_span = span;
    }

    let mut rank_graph = RankGraph::new();
    let mut rank_ids = vec![usize::MAX; node_ids.iter().max().map_or(0, |&m| m + 1)];
    for &id in &node_ids {
        let preassigned = if lg.entry == Some(id) { Some(0) } else { None };
        rank_ids[id] = rank_graph.add_node(preassigned);
    }
    for (_, src, dst, edge) in lg.graph.edges() {
        if src == dst {
            continue;
        }
        let src_node = lg.graph.node(src)?;
        // A replica redirected onto its bundle's virtual stem or trunk only has to
        // respect the order around it, not a full rank gap.
        let relaxed =
            edge.is_replica && (src_node.is_virtual || lg.graph.node(dst)?.is_virtual);
        let weight = if relaxed {
            0.0
        } else {
            src_node.rank_span.max(1) as f64
        };
        rank_graph.add_edge(rank_ids[src], rank_ids[dst], weight)?;
    }
    rank_graph.solve()?;

    let mut num_ranks = 0usize;
    for &id in &node_ids {
        let local = rank_graph.rank_of(rank_ids[id]).unwrap_or(0);
        let new_global = lg.min_rank + local;
        let node = lg.graph.node_mut(id)?;
        let delta = new_global - node.rank.unwrap_or(new_global);
        node.rank = Some(new_global);
        num_ranks = num_ranks.max(local as usize + node.rank_span.max(1));
        if delta != 0 {
            let mut children = std::mem::take(&mut node.children);
            for child in &mut children {
                shift_ranks(child, delta);
            }
            lg.graph.node_mut(id)?.children = children;
        }
    }

    if let Some(exit) = lg.exit {
        let last = lg.min_rank + num_ranks.saturating_sub(1) as i32;
        let node = lg.graph.node_mut(exit)?;
        if node.rank.is_some_and(|r| r < last) {
            node.rank = Some(last);
        }
    }

    lg.num_ranks = num_ranks;
    Ok(())
}

/// Shifts a subgraph tree's global ranks by `delta`.
pub fn shift_ranks(lg: &mut LayoutGraph, delta: i32) {
    if delta == 0 {
        return;
    }
    lg.min_rank += delta;
    let node_ids: Vec<NodeId> = lg.graph.node_ids().collect();
    for id in node_ids {
        let Ok(node) = lg.graph.node_mut(id) else {
            continue;
        };
        node.rank = node.rank.map(|r| r + delta);
        let mut children = std::mem::take(&mut node.children);
        for child in &mut children {
            shift_ranks(child, delta);
        }
        if let Ok(node) = lg.graph.node_mut(id) {
            node.children = children;
        }
    }
}

fn globalize(lg: &mut LayoutGraph, offset: i32) {
    lg.min_rank += offset;
    let node_ids: Vec<NodeId> = lg.graph.node_ids().collect();
    for id in node_ids {
        let Ok(node) = lg.graph.node_mut(id) else {
            continue;
        };
        if offset != 0 {
            node.rank = node.rank.map(|r| r + offset);
        }
        let node_rank = node.rank.unwrap_or(0);
        let mut children = std::mem::take(&mut node.children);
        for child in &mut children {
            globalize(child, node_rank);
        }
        if let Ok(node) = lg.graph.node_mut(id) {
            node.children = children;
        }
    }
}
