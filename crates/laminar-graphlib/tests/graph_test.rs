use laminar_graphlib::{DiGraph, GraphError};

fn new_graph() -> DiGraph<&'static str, f64> {
    DiGraph::new()
}

#[test]
fn add_node_returns_dense_ids() {
    let mut g = new_graph();
    assert_eq!(g.add_node("a"), 0);
    assert_eq!(g.add_node("b"), 1);
    assert_eq!(g.node_count(), 2);
    assert_eq!(g.node(0), Ok(&"a"));
    assert_eq!(g.node(1), Ok(&"b"));
}

#[test]
fn node_fails_with_corrupted_for_unknown_id() {
    let g = new_graph();
    assert_eq!(g.node(7), Err(GraphError::CorruptedNode(7)));
}

#[test]
fn removed_ids_are_not_reused() {
    let mut g = new_graph();
    let a = g.add_node("a");
    g.remove_node(a).unwrap();
    let b = g.add_node("b");
    assert_ne!(a, b);
    assert_eq!(g.node(a), Err(GraphError::CorruptedNode(a)));
}

#[test]
fn add_edge_updates_adjacency() {
    let mut g = new_graph();
    let a = g.add_node("a");
    let b = g.add_node("b");
    let e = g.add_edge(a, b, 1.0).unwrap();
    assert_eq!(g.out_edges(a).unwrap(), &[e]);
    assert_eq!(g.in_edges(b).unwrap(), &[e]);
    assert!(g.out_edges(b).unwrap().is_empty());
    assert_eq!(g.endpoints(e), Ok((a, b)));
}

#[test]
fn multi_edges_are_kept_apart() {
    let mut g = new_graph();
    let a = g.add_node("a");
    let b = g.add_node("b");
    let e1 = g.add_edge(a, b, 1.0).unwrap();
    let e2 = g.add_edge(a, b, 2.0).unwrap();
    assert_ne!(e1, e2);
    assert_eq!(g.edge_count(), 2);
    assert_eq!(g.edge(e1), Ok(&1.0));
    assert_eq!(g.edge(e2), Ok(&2.0));
}

#[test]
fn remove_node_removes_incident_edges() {
    let mut g = new_graph();
    let a = g.add_node("a");
    let b = g.add_node("b");
    let c = g.add_node("c");
    let ab = g.add_edge(a, b, 1.0).unwrap();
    let bc = g.add_edge(b, c, 1.0).unwrap();
    let loop_b = g.add_edge(b, b, 1.0).unwrap();

    g.remove_node(b).unwrap();
    assert_eq!(g.edge_count(), 0);
    assert_eq!(g.edge(ab), Err(GraphError::CorruptedEdge(ab)));
    assert_eq!(g.edge(bc), Err(GraphError::CorruptedEdge(bc)));
    assert_eq!(g.edge(loop_b), Err(GraphError::CorruptedEdge(loop_b)));
    assert!(g.out_edges(a).unwrap().is_empty());
    assert!(g.in_edges(c).unwrap().is_empty());
}

#[test]
fn redirect_edge_keeps_the_label() {
    let mut g = new_graph();
    let a = g.add_node("a");
    let b = g.add_node("b");
    let c = g.add_node("c");
    let e = g.add_edge(a, b, 4.5).unwrap();

    g.redirect_edge(e, a, c).unwrap();
    assert_eq!(g.endpoints(e), Ok((a, c)));
    assert_eq!(g.edge(e), Ok(&4.5));
    assert!(g.in_edges(b).unwrap().is_empty());
    assert_eq!(g.in_edges(c).unwrap(), &[e]);
}

#[test]
fn invert_edge_swaps_endpoints() {
    let mut g = new_graph();
    let a = g.add_node("a");
    let b = g.add_node("b");
    let e = g.add_edge(a, b, 1.0).unwrap();

    g.invert_edge(e).unwrap();
    assert_eq!(g.endpoints(e), Ok((b, a)));
    assert_eq!(g.out_edges(b).unwrap(), &[e]);
    assert_eq!(g.in_edges(a).unwrap(), &[e]);
}

#[test]
fn successors_and_predecessors_follow_insertion_order() {
    let mut g = new_graph();
    let a = g.add_node("a");
    let b = g.add_node("b");
    let c = g.add_node("c");
    g.add_edge(a, c, 1.0).unwrap();
    g.add_edge(a, b, 1.0).unwrap();
    g.add_edge(b, c, 1.0).unwrap();

    assert_eq!(g.successors(a).unwrap(), vec![c, b]);
    assert_eq!(g.predecessors(c).unwrap(), vec![a, b]);
}

#[test]
fn clone_is_deep() {
    let mut g = new_graph();
    let a = g.add_node("a");
    let b = g.add_node("b");
    let e = g.add_edge(a, b, 1.0).unwrap();

    let mut copy = g.clone();
    copy.remove_edge(e).unwrap();
    assert_eq!(g.edge_count(), 1);
    assert_eq!(copy.edge_count(), 0);
}
