use laminar_graphlib::{DiGraph, GraphError, alg};

fn new_graph() -> DiGraph<(), ()> {
    DiGraph::new()
}

fn path(g: &mut DiGraph<(), ()>, nodes: &[usize]) {
    for w in nodes.windows(2) {
        g.add_edge(w[0], w[1], ()).unwrap();
    }
}

#[test]
fn toposort_orders_a_chain() {
    let mut g = new_graph();
    for _ in 0..3 {
        g.add_node(());
    }
    path(&mut g, &[0, 1, 2]);
    assert_eq!(alg::toposort(&g).unwrap(), vec![0, 1, 2]);
}

#[test]
fn toposort_fails_on_a_cycle() {
    let mut g = new_graph();
    for _ in 0..2 {
        g.add_node(());
    }
    path(&mut g, &[0, 1]);
    g.add_edge(1, 0, ()).unwrap();
    assert_eq!(alg::toposort(&g), Err(GraphError::Cyclic));
}

#[test]
fn toposort_partial_reports_the_cyclic_remainder() {
    let mut g = new_graph();
    for _ in 0..4 {
        g.add_node(());
    }
    path(&mut g, &[0, 1]);
    path(&mut g, &[2, 3]);
    g.add_edge(3, 2, ()).unwrap();

    let (sorted, remaining) = alg::toposort_partial(&g);
    assert_eq!(sorted, vec![0, 1]);
    assert_eq!(remaining, vec![2, 3]);
}

#[test]
fn components_finds_weakly_connected_sets() {
    let mut g = new_graph();
    for _ in 0..5 {
        g.add_node(());
    }
    path(&mut g, &[0, 1]);
    g.add_edge(2, 1, ()).unwrap();
    path(&mut g, &[3, 4]);

    assert_eq!(alg::components(&g), vec![vec![0, 1, 2], vec![3, 4]]);
}

#[test]
fn bfs_respects_direction() {
    let mut g = new_graph();
    for _ in 0..3 {
        g.add_node(());
    }
    path(&mut g, &[0, 1]);
    g.add_edge(2, 1, ()).unwrap();

    assert_eq!(alg::bfs(&g, 0, false).unwrap(), vec![0, 1]);
    assert_eq!(alg::bfs(&g, 0, true).unwrap(), vec![0, 1, 2]);
}

#[test]
fn bfs_fails_for_a_missing_start() {
    let g = new_graph();
    assert_eq!(alg::bfs(&g, 3, false), Err(GraphError::CorruptedNode(3)));
}

#[test]
fn remove_cycles_leaves_a_dag_behind() {
    let mut g = new_graph();
    for _ in 0..3 {
        g.add_node(());
    }
    path(&mut g, &[0, 1, 2]);
    g.add_edge(2, 0, ()).unwrap();

    let inverted = alg::remove_cycles(&mut g);
    assert_eq!(inverted.len(), 1);
    assert!(alg::toposort(&g).is_ok());
    // The broken edge now runs forward.
    let (src, dst) = g.endpoints(inverted[0]).unwrap();
    assert_eq!((src, dst), (0, 2));
}

#[test]
fn remove_cycles_keeps_acyclic_graphs_untouched() {
    let mut g = new_graph();
    for _ in 0..3 {
        g.add_node(());
    }
    path(&mut g, &[0, 1, 2]);
    assert!(alg::remove_cycles(&mut g).is_empty());
}

#[test]
fn remove_cycles_handles_two_disjoint_cycles() {
    let mut g = new_graph();
    for _ in 0..4 {
        g.add_node(());
    }
    path(&mut g, &[0, 1]);
    g.add_edge(1, 0, ()).unwrap();
    path(&mut g, &[2, 3]);
    g.add_edge(3, 2, ()).unwrap();

    let inverted = alg::remove_cycles(&mut g);
    assert_eq!(inverted.len(), 2);
    assert!(alg::toposort(&g).is_ok());
}
