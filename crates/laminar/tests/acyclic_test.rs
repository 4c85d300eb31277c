use laminar::{
    INVERTED_IN_CONNECTOR, INVERTED_OUT_CONNECTOR, LayoutGraph, LayoutNode, acyclic,
};

fn two_node_cycle() -> (LayoutGraph, usize, usize, usize, usize) {
    let mut g = LayoutGraph::new();
    let a = g.add_node(LayoutNode::sized(40.0, 20.0));
    let b = g.add_node(LayoutNode::sized(40.0, 20.0));
    let forward = g.add_edge_between(a, b).unwrap();
    let backward = g.add_edge_between(b, a).unwrap();
    (g, a, b, forward, backward)
}

#[test]
fn breaks_a_two_node_cycle_by_inversion() {
    let (mut g, a, b, forward, backward) = two_node_cycle();
    acyclic::run(&mut g).unwrap();

    assert!(!g.edge(forward).unwrap().is_inverted);
    assert!(g.edge(backward).unwrap().is_inverted);
    // Both edges now run forward.
    assert_eq!(g.graph.endpoints(forward).unwrap(), (a, b));
    assert_eq!(g.graph.endpoints(backward).unwrap(), (a, b));
}

#[test]
fn inverted_edges_get_their_anchor_connectors() {
    let (mut g, a, b, _, backward) = two_node_cycle();
    acyclic::run(&mut g).unwrap();

    // The inverted edge ran b -> a, so `a` (its original destination) carries the out
    // anchor and `b` (its original source) the in anchor.
    let a_node = g.node(a).unwrap();
    let out = a_node.out_connector(INVERTED_OUT_CONNECTOR).unwrap();
    assert!(a_node.out_connectors[out].is_temporary);
    let b_node = g.node(b).unwrap();
    assert!(b_node.in_connector(INVERTED_IN_CONNECTOR).is_some());

    let edge = g.edge(backward).unwrap();
    assert_eq!(edge.src_connector.as_deref(), Some(INVERTED_OUT_CONNECTOR));
    assert_eq!(edge.dst_connector.as_deref(), Some(INVERTED_IN_CONNECTOR));
}

#[test]
fn undo_restores_direction_and_reverses_points() {
    let (mut g, a, b, _, backward) = two_node_cycle();
    acyclic::run(&mut g).unwrap();

    g.graph.edge_mut(backward).unwrap().points = vec![
        laminar::Point::new(0.0, 0.0),
        laminar::Point::new(0.0, 70.0),
    ];
    acyclic::undo(&mut g).unwrap();

    let edge = g.edge(backward).unwrap();
    assert!(!edge.is_inverted);
    assert_eq!(g.graph.endpoints(backward).unwrap(), (b, a));
    assert_eq!(edge.points[0].y, 70.0);
    assert_eq!(edge.points[1].y, 0.0);
    // The anchor names stay behind as rendering cues.
    assert_eq!(edge.src_connector.as_deref(), Some(INVERTED_IN_CONNECTOR));
    assert_eq!(edge.dst_connector.as_deref(), Some(INVERTED_OUT_CONNECTOR));
}

#[test]
fn undo_is_an_involution_on_the_inversion_flag() {
    let (mut g, _, _, forward, backward) = two_node_cycle();
    acyclic::run(&mut g).unwrap();
    acyclic::undo(&mut g).unwrap();

    let before: Vec<_> = [forward, backward]
        .iter()
        .map(|&e| {
            let edge = g.edge(e).unwrap();
            (g.graph.endpoints(e).unwrap(), edge.is_inverted)
        })
        .collect();
    acyclic::undo(&mut g).unwrap();
    let after: Vec<_> = [forward, backward]
        .iter()
        .map(|&e| {
            let edge = g.edge(e).unwrap();
            (g.graph.endpoints(e).unwrap(), edge.is_inverted)
        })
        .collect();
    assert_eq!(before, after);
}

#[test]
fn self_loops_are_detached_onto_their_node() {
    let mut g = LayoutGraph::new();
    let a = g.add_node(LayoutNode::sized(40.0, 20.0));
    g.add_edge_between(a, a).unwrap();

    acyclic::run(&mut g).unwrap();
    assert_eq!(g.graph.edge_count(), 0);
    assert!(g.node(a).unwrap().self_loop.is_some());
}

#[test]
fn acyclic_graphs_are_left_untouched() {
    let mut g = LayoutGraph::new();
    let a = g.add_node(LayoutNode::sized(40.0, 20.0));
    let b = g.add_node(LayoutNode::sized(40.0, 20.0));
    let e = g.add_edge_between(a, b).unwrap();

    acyclic::run(&mut g).unwrap();
    assert!(!g.edge(e).unwrap().is_inverted);
    assert_eq!(g.graph.endpoints(e).unwrap(), (a, b));
}
