//! Cross-rank ordering: crossing minimization over the level-graph projection.
//!
//! Each subgraph is ordered on its own: the level graph is split into weakly connected
//! components, every component becomes one order graph, and the barycentric sweeps plus
//! heavy-edge conflict resolution run per component. Components line up side by side in
//! the final rank sequences. Connector ordering follows on a second, port-granular
//! projection.

pub mod barycenter;
pub mod conflicts;
pub mod connectors;
pub mod cross_count;
mod types;

pub use types::{Arrangement, OrderGraph, OrderGroup, OrderNode, OrderNodeId, OrderPayload};

use crate::error::Result;
use crate::level::{self, LevelGraph, LevelId};
use crate::model::{LayoutGraph, NodeId};
use crate::options::LayoutOptions;
use crate::rng::Rng;
use crate::{normalize, rank};
use laminar_graphlib::alg;
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

/// Seed for the engine-local random source; fixed so runs are reproducible.
const ORDERING_SEED: &str = "laminar/order";

pub fn run(root: &mut LayoutGraph, opts: &LayoutOptions) -> Result<()> {
    let mut rng = Rng::seed_from_str(ORDERING_SEED);
    let mut hierarchy: Vec<usize> = Vec::new();
    run_graph(root, opts, &mut rng, &mut hierarchy)
}

fn run_graph(
    lg: &mut LayoutGraph,
    opts: &LayoutOptions,
    rng: &mut Rng,
    hierarchy: &mut Vec<usize>,
) -> Result<()> {
    // Children first: a nested scope that grows during its own conflict resolution
    // changes its span, which this graph's reranking below picks up.
    let node_ids: Vec<NodeId> = lg.graph.node_ids().collect();
    for &id in &node_ids {
        let node = lg.graph.node_mut(id)?;
        if node.children.is_empty() {
            continue;
        }
        let mut children = std::mem::take(&mut node.children);
        hierarchy.push(id);
        for child in &mut children {
            run_graph(child, opts, rng, hierarchy)?;
        }
        hierarchy.pop();
        lg.graph.node_mut(id)?.children = children;
    }

    rank::rerank_graph(lg)?;
    normalize::run_graph(lg)?;

    if opts.preorder_connectors {
        let level = level::build(lg);
        connectors::order_connectors(lg, &level)?;
    }

    order_nodes(lg, opts, rng, hierarchy)?;

    let level = lg.level.take().unwrap_or_default();
    connectors::order_connectors(lg, &level)?;
    lg.level = Some(level);
    Ok(())
}

fn order_nodes(
    lg: &mut LayoutGraph,
    opts: &LayoutOptions,
    rng: &mut Rng,
    hierarchy: &[usize],
) -> Result<()> {
    let immovable = pinned_nodes(lg);
    let mut shift_rounds = 0usize;
    let shift_cap = 2 * lg.num_ranks + 8;

    loop {
        let mut level = level::build(lg);
        let components = alg::components(&level.graph);
        let mut order_graphs: Vec<OrderGraph> = components
            .iter()
            .map(|comp| build_order_graph(&level, comp, hierarchy))
            .collect();

        optimize_components(&mut order_graphs, opts, rng);

        let mut shift: Vec<NodeId> = Vec::new();
        for og in &mut order_graphs {
            match conflicts::resolve(og, &level, &immovable) {
                conflicts::Outcome::Clean => {}
                conflicts::Outcome::NeedsRankShift(nodes) => {
                    shift = nodes;
                    break;
                }
            }
        }

        if !shift.is_empty() && shift_rounds < shift_cap {
            shift_rounds += 1;
            tracing::debug!(nodes = shift.len(), "growing ranks to resolve a conflict");
            apply_rank_shift(lg, &shift)?;
            normalize::run_graph(lg)?;
            continue;
        }

        let total: f64 = order_graphs.iter().map(cross_count::total).sum();
        tracing::debug!(
            crossings = total,
            components = order_graphs.len(),
            "ordering settled"
        );

        write_back(lg, &mut level, &order_graphs)?;
        lg.level = Some(level);
        return Ok(());
    }
}

/// Baseline ordering plus up to `shuffles` seeded restarts, keeping the arrangement
/// with the fewest crossings. `shuffle_global` retries all components in lockstep.
fn optimize_components(order_graphs: &mut [OrderGraph], opts: &LayoutOptions, rng: &mut Rng) {
    if opts.shuffle_global && opts.shuffles > 0 {
        let mut best: f64 = order_graphs
            .iter_mut()
            .map(|og| barycenter::optimize(og, true))
            .sum();
        let mut best_states: Vec<Arrangement> =
            order_graphs.iter().map(|og| og.snapshot()).collect();

        for _ in 0..opts.shuffles {
            let mut total = 0.0;
            for og in order_graphs.iter_mut() {
                barycenter::shuffle(og, rng);
                total += barycenter::optimize(og, true);
            }
            if total < best {
                best = total;
                best_states = order_graphs.iter().map(|og| og.snapshot()).collect();
            }
        }
        for (og, state) in order_graphs.iter_mut().zip(&best_states) {
            og.restore(state);
        }
        return;
    }

    for og in order_graphs.iter_mut() {
        let mut best = barycenter::optimize(og, true);
        if opts.shuffles == 0 {
            continue;
        }
        let mut best_state = og.snapshot();
        for _ in 0..opts.shuffles {
            barycenter::shuffle(og, rng);
            let cc = barycenter::optimize(og, true);
            if cc < best {
                best = cc;
                best_state = og.snapshot();
            }
        }
        og.restore(&best_state);
    }
}

/// Scope nodes and frames cannot move down a rank during Y-resolution.
fn pinned_nodes(lg: &LayoutGraph) -> HashSet<NodeId> {
    let mut pinned: HashSet<NodeId> = HashSet::default();
    for (id, node) in lg.graph.nodes() {
        if node.is_scope {
            pinned.insert(id);
        }
    }
    if let Some(entry) = lg.entry {
        pinned.insert(entry);
    }
    if let Some(exit) = lg.exit {
        pinned.insert(exit);
    }
    pinned
}

/// One singleton group per shadow: reordering groups reorders nodes, and the heavy
/// intra-node chains arrive as ordinary (infinite-weight) order edges.
fn build_order_graph(level: &LevelGraph, component: &[LevelId], hierarchy: &[usize]) -> OrderGraph {
    let mut og = OrderGraph::default();
    let in_component: HashSet<LevelId> = component.iter().copied().collect();
    let mut order_ids: HashMap<LevelId, OrderNodeId> = HashMap::default();

    // Walk ranks in display order so initial positions match the current layout.
    for (local_rank, rank_nodes) in level.order.iter().enumerate() {
        for &lid in rank_nodes {
            if !in_component.contains(&lid) {
                continue;
            }
            let group = og.add_group(local_rank, hierarchy.to_vec());
            let id = og.add_node(group, OrderPayload::Level(lid));
            order_ids.insert(lid, id);
        }
    }
    // Ranks the component does not touch still need slots for pair indexing.
    if og.ranks.len() < level.num_ranks {
        og.ranks.resize_with(level.num_ranks, Vec::new);
    }

    for (_, src, dst, edge) in level.graph.edges() {
        let (Some(&s), Some(&d)) = (order_ids.get(&src), order_ids.get(&dst)) else {
            continue;
        };
        og.add_edge(s, d, edge.weight);
    }

    og.reindex_all();
    og
}

/// Moves the seed nodes and everything their departure would collide with down one
/// rank. Newly stretched in-edges are re-virtualized by the caller.
fn apply_rank_shift(lg: &mut LayoutGraph, seeds: &[NodeId]) -> Result<()> {
    let mut moved: HashSet<NodeId> = HashSet::default();
    let mut queue: Vec<NodeId> = seeds.to_vec();
    while let Some(id) = queue.pop() {
        if !moved.insert(id) {
            continue;
        }
        let rank_end = lg.graph.node(id)?.rank_end();
        for &e in lg.graph.out_edges(id)? {
            if lg.graph.edge(e)?.is_replica {
                continue;
            }
            let dst = lg.graph.dst(e)?;
            if moved.contains(&dst) {
                continue;
            }
            if lg.graph.node(dst)?.rank == Some(rank_end) {
                queue.push(dst);
            }
        }
    }

    for &id in &moved {
        let node = lg.graph.node_mut(id)?;
        node.rank = node.rank.map(|r| r + 1);
        if !node.children.is_empty() {
            let mut children = std::mem::take(&mut node.children);
            for child in &mut children {
                rank::shift_ranks(child, 1);
            }
            lg.graph.node_mut(id)?.children = children;
        }
    }

    let mut num_ranks = lg.num_ranks;
    for (_, node) in lg.graph.nodes() {
        let Some(rank) = node.rank else { continue };
        num_ranks = num_ranks.max((rank - lg.min_rank) as usize + node.rank_span.max(1));
    }
    lg.num_ranks = num_ranks;
    Ok(())
}

/// Copies the component orders back: positions into the level graph, rank sequences
/// into `level.order`, and each node's first-shadow position into its `index`.
fn write_back(lg: &mut LayoutGraph, level: &mut LevelGraph, order_graphs: &[OrderGraph]) -> Result<()> {
    let num_ranks = level.num_ranks;
    let mut counters = vec![0usize; num_ranks];
    let mut new_order: Vec<Vec<LevelId>> = vec![Vec::new(); num_ranks];

    for og in order_graphs {
        for rank in 0..og.num_ranks() {
            for id in og.sequence(rank) {
                let Ok(node) = og.graph.node(id) else { continue };
                let OrderPayload::Level(lid) = node.payload else {
                    continue;
                };
                let pos = counters[rank];
                counters[rank] += 1;
                if let Ok(shadow) = level.graph.node_mut(lid) {
                    shadow.position = pos;
                }
                new_order[rank].push(lid);
            }
        }
    }

    #[cfg(debug_assertions)]
    for (rank, seq) in new_order.iter().enumerate() {
        debug_assert_eq!(
            seq.len(),
            level.order.get(rank).map(Vec::len).unwrap_or(0),
            "rank {rank} order must be a permutation of its nodes"
        );
    }

    level.order = new_order;

    let node_ids: Vec<NodeId> = lg.graph.node_ids().collect();
    for id in node_ids {
        let node = lg.graph.node_mut(id)?;
        if let Some(&first) = node.level_ids.first() {
            if let Ok(shadow) = level.graph.node(first) {
                node.index = shadow.position;
            }
        }
    }
    Ok(())
}
