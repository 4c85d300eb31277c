use laminar::{LayoutEdge, LayoutGraph, LayoutNode, normalize};

fn ranked_node(rank: i32) -> LayoutNode {
    LayoutNode {
        rank: Some(rank),
        ..LayoutNode::sized(40.0, 20.0)
    }
}

#[test]
fn adjacent_edges_are_left_alone() {
    let mut g = LayoutGraph::new();
    let a = g.add_node(ranked_node(0));
    let b = g.add_node(ranked_node(1));
    let e = g.add_edge_between(a, b).unwrap();

    normalize::run(&mut g).unwrap();
    assert_eq!(g.graph.node_count(), 2);
    assert_eq!(g.graph.endpoints(e).unwrap(), (a, b));
}

#[test]
fn long_edges_gain_one_virtual_node_per_skipped_rank() {
    let mut g = LayoutGraph::new();
    let a = g.add_node(ranked_node(0));
    let b = g.add_node(ranked_node(3));
    let e = g
        .add_edge(a, b, LayoutEdge::between(None, Some("data")))
        .unwrap();

    normalize::run(&mut g).unwrap();

    let virtuals: Vec<_> = g
        .graph
        .nodes()
        .filter(|(_, n)| n.is_virtual)
        .map(|(id, n)| (id, n.rank))
        .collect();
    assert_eq!(virtuals.len(), 2);
    assert_eq!(virtuals[0].1, Some(1));
    assert_eq!(virtuals[1].1, Some(2));

    // Every edge now spans exactly one rank.
    for (_, src, dst, _) in g.graph.edges() {
        let src_end = g.node(src).unwrap().rank_end();
        assert_eq!(g.node(dst).unwrap().rank, Some(src_end));
    }

    // The original edge kept its source and lost its destination connector; the last
    // segment carries it instead.
    let (src, dst) = g.graph.endpoints(e).unwrap();
    assert_eq!(src, a);
    assert!(g.node(dst).unwrap().is_virtual);
    assert!(g.edge(e).unwrap().dst_connector.is_none());

    let last = g
        .graph
        .edges()
        .find(|(_, _, dst, _)| *dst == b)
        .map(|(id, _, _, _)| id)
        .unwrap();
    assert_eq!(g.edge(last).unwrap().dst_connector.as_deref(), Some("data"));
    assert!(g.edge(last).unwrap().is_heavy());
}

#[test]
fn chain_segments_inherit_the_inversion_flag() {
    let mut g = LayoutGraph::new();
    let a = g.add_node(ranked_node(0));
    let b = g.add_node(ranked_node(2));
    let e = g
        .add_edge(
            a,
            b,
            LayoutEdge {
                is_inverted: true,
                ..LayoutEdge::default()
            },
        )
        .unwrap();

    normalize::run(&mut g).unwrap();
    for (id, _, _, edge) in g.graph.edges() {
        assert!(edge.is_inverted, "segment {id} lost the inversion flag");
    }
    let _ = e;
}

#[test]
fn rank_spans_shorten_the_chain() {
    let mut g = LayoutGraph::new();
    let a = g.add_node(LayoutNode {
        rank: Some(0),
        rank_span: 2,
        ..LayoutNode::sized(40.0, 20.0)
    });
    let b = g.add_node(ranked_node(3));
    g.add_edge_between(a, b).unwrap();

    normalize::run(&mut g).unwrap();
    let virtuals = g.graph.nodes().filter(|(_, n)| n.is_virtual).count();
    assert_eq!(virtuals, 1);
}
