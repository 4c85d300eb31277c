//! End-to-end layout scenarios.

use laminar::{
    INVERTED_IN_CONNECTOR, INVERTED_OUT_CONNECTOR, LayoutEdge, LayoutGraph, LayoutNode,
    LayoutOptions, Rect, layout,
};

const EPS: f64 = 1e-6;

fn sized() -> LayoutNode {
    LayoutNode::sized(40.0, 20.0)
}

fn bounds(node: &LayoutNode) -> Rect {
    Rect::new(node.x, node.y, node.width, node.height)
}

#[test]
fn chain_of_three_stacks_one_column() {
    let mut g = LayoutGraph::new();
    let a = g.add_node(sized());
    let b = g.add_node(sized());
    let c = g.add_node(sized());
    g.add_edge_between(a, b).unwrap();
    g.add_edge_between(b, c).unwrap();

    let out = layout(g, &LayoutOptions::default()).unwrap();
    let (a, b, c) = (
        out.node(a).unwrap(),
        out.node(b).unwrap(),
        out.node(c).unwrap(),
    );

    assert!((a.x - b.x).abs() < EPS);
    assert!((b.x - c.x).abs() < EPS);
    // Top-to-top spacing is node height plus the target edge length.
    assert!((b.y - a.y - 70.0).abs() < EPS);
    assert!((c.y - b.y - 70.0).abs() < EPS);
}

#[test]
fn diamond_is_symmetric_with_two_point_edges() {
    let mut g = LayoutGraph::new();
    let a = g.add_node(sized());
    let b = g.add_node(sized());
    let c = g.add_node(sized());
    let d = g.add_node(sized());
    let edges = [
        g.add_edge_between(a, b).unwrap(),
        g.add_edge_between(a, c).unwrap(),
        g.add_edge_between(b, d).unwrap(),
        g.add_edge_between(c, d).unwrap(),
    ];

    let out = layout(g, &LayoutOptions::default()).unwrap();
    let (a, b, c, d) = (
        out.node(a).unwrap(),
        out.node(b).unwrap(),
        out.node(c).unwrap(),
        out.node(d).unwrap(),
    );

    // The middle nodes straddle the source's center.
    assert!((b.x - c.x).abs() > EPS);
    let a_center = a.x + a.width / 2.0;
    let b_center = b.x + b.width / 2.0;
    let c_center = c.x + c.width / 2.0;
    assert!(((b_center + c_center) / 2.0 - a_center).abs() < EPS);

    for e in edges {
        assert_eq!(out.edge(e).unwrap().points.len(), 2);
    }

    // Zero crossings and no box overlap.
    assert!(!bounds(b).intersects(&bounds(c)));
    let _ = d;
}

#[test]
fn inverted_edges_are_restored_with_their_anchors() {
    let mut g = LayoutGraph::new();
    let a = g.add_node(sized());
    let b = g.add_node(sized());
    let forward = g.add_edge_between(a, b).unwrap();
    let backward = g.add_edge_between(b, a).unwrap();

    let out = layout(g, &LayoutOptions::default()).unwrap();

    assert!(!out.edge(forward).unwrap().is_inverted);
    assert!(!out.edge(backward).unwrap().is_inverted);
    assert_eq!(out.graph.endpoints(backward).unwrap(), (b, a));

    // The restored edge runs against the flow: its points go upward.
    let points = &out.edge(backward).unwrap().points;
    assert!(points.first().unwrap().y > points.last().unwrap().y);

    // Temporary anchors stay on both endpoints as rendering cues.
    assert!(
        out.node(a)
            .unwrap()
            .out_connector(INVERTED_OUT_CONNECTOR)
            .is_some()
    );
    assert!(
        out.node(b)
            .unwrap()
            .in_connector(INVERTED_IN_CONNECTOR)
            .is_some()
    );
}

#[test]
fn scope_frames_align_and_contain_their_interior() {
    let mut body = LayoutGraph::scope_body(sized(), sized());
    let entry = body.entry.unwrap();
    let exit = body.exit.unwrap();
    let n1 = body.add_node(sized());
    let n2 = body.add_node(sized());
    body.add_edge_between(entry, n1).unwrap();
    body.add_edge_between(entry, n2).unwrap();
    body.add_edge_between(n1, exit).unwrap();
    body.add_edge_between(n2, exit).unwrap();

    let mut root = LayoutGraph::new();
    let scope = root.add_node(LayoutNode {
        children: vec![body],
        padding: 10.0,
        ..LayoutNode::sized(40.0, 20.0)
    });

    let out = layout(root, &LayoutOptions::default()).unwrap();
    let scope_node = out.node(scope).unwrap();
    let body = &scope_node.children[0];
    let entry = body.node(entry).unwrap();
    let exit = body.node(exit).unwrap();

    assert!((entry.x - exit.x).abs() < EPS);
    assert!((entry.width - exit.width).abs() < EPS);

    let frame = bounds(scope_node);
    for node in [entry, exit, body.node(n1).unwrap(), body.node(n2).unwrap()] {
        assert!(frame.contains_rect(&bounds(node)));
    }

    // Interior edges stay inside the frame horizontally.
    for (_, _, _, edge) in body.graph.edges() {
        for p in &edge.points {
            assert!(p.x >= frame.x - EPS && p.x <= frame.x + frame.width + EPS);
        }
    }
}

#[test]
fn bundled_edges_share_a_stem_and_replicate_the_primary() {
    let mut g = LayoutGraph::new();
    let s = g.add_node(LayoutNode::sized(80.0, 20.0));
    let t1 = g.add_node(sized());
    let t2 = g.add_node(sized());
    let t3 = g.add_node(sized());
    let edges = [
        g.add_edge(s, t1, LayoutEdge::between(Some("stream"), None))
            .unwrap(),
        g.add_edge(s, t2, LayoutEdge::between(Some("stream"), None))
            .unwrap(),
        g.add_edge(s, t3, LayoutEdge::between(Some("stream"), None))
            .unwrap(),
    ];

    let opts = LayoutOptions {
        bundle: true,
        ..LayoutOptions::default()
    };
    let out = layout(g, &opts).unwrap();

    assert_eq!(out.bundles.len(), 1);
    let stem = (out.bundles[0].x, out.bundles[0].y);

    let primary = out.edge(edges[0]).unwrap();
    assert!(!primary.is_replica);
    assert!(
        primary
            .points
            .iter()
            .any(|p| (p.x - stem.0).abs() < EPS && (p.y - stem.1).abs() < EPS)
    );

    for &e in &edges[1..] {
        let replica = out.edge(e).unwrap();
        assert!(replica.is_replica);
        assert_eq!(replica.points.len(), primary.points.len());
        // Interior points are shared; only the terminal point differs.
        for (i, p) in replica.points.iter().enumerate().rev().skip(1) {
            assert!((p.x - primary.points[i].x).abs() < EPS);
            assert!((p.y - primary.points[i].y).abs() < EPS);
        }
    }
}

#[test]
fn long_edges_are_virtualized_and_collapsed() {
    let mut g = LayoutGraph::new();
    let a = g.add_node(sized());
    let m1 = g.add_node(sized());
    let m2 = g.add_node(sized());
    let b = g.add_node(sized());
    g.add_edge_between(a, m1).unwrap();
    g.add_edge_between(m1, m2).unwrap();
    g.add_edge_between(m2, b).unwrap();
    let long = g.add_edge_between(a, b).unwrap();

    let out = layout(g, &LayoutOptions::default()).unwrap();
    assert!(out.edge(long).unwrap().points.len() >= 4);
    assert!(out.graph.nodes().all(|(_, n)| !n.is_virtual));
}

#[test]
fn layout_is_deterministic() {
    let build = || {
        let mut g = LayoutGraph::new();
        let nodes: Vec<_> = (0..6).map(|_| g.add_node(sized())).collect();
        for (src, dst) in [(0, 2), (0, 3), (1, 2), (1, 3), (2, 4), (3, 5), (2, 5)] {
            g.add_edge_between(nodes[src], nodes[dst]).unwrap();
        }
        (g, nodes)
    };

    let coords = |g: LayoutGraph, nodes: &[usize]| -> Vec<(f64, f64)> {
        let out = layout(g, &LayoutOptions::default()).unwrap();
        nodes
            .iter()
            .map(|&id| {
                let n = out.node(id).unwrap();
                (n.x, n.y)
            })
            .collect()
    };

    let (g1, nodes1) = build();
    let (g2, nodes2) = build();
    assert_eq!(coords(g1, &nodes1), coords(g2, &nodes2));
}

#[test]
fn shuffled_runs_are_reproducible_too() {
    let build = || {
        let mut g = LayoutGraph::new();
        let nodes: Vec<_> = (0..6).map(|_| g.add_node(sized())).collect();
        for (src, dst) in [(0, 3), (0, 4), (1, 3), (1, 5), (2, 4), (2, 5)] {
            g.add_edge_between(nodes[src], nodes[dst]).unwrap();
        }
        (g, nodes)
    };
    let opts = LayoutOptions {
        shuffles: 3,
        ..LayoutOptions::default()
    };

    let coords = |g: LayoutGraph, nodes: &[usize]| -> Vec<(f64, f64)> {
        let out = layout(g, &opts).unwrap();
        nodes
            .iter()
            .map(|&id| {
                let n = out.node(id).unwrap();
                (n.x, n.y)
            })
            .collect()
    };

    let (g1, nodes1) = build();
    let (g2, nodes2) = build();
    assert_eq!(coords(g1, &nodes1), coords(g2, &nodes2));
}

#[test]
fn sizes_are_never_shrunk() {
    let mut g = LayoutGraph::new();
    let a = g.add_node(LayoutNode::sized(123.0, 45.0));
    let b = g.add_node(sized());
    g.add_edge_between(a, b).unwrap();

    let out = layout(g, &LayoutOptions::default()).unwrap();
    let a = out.node(a).unwrap();
    assert!(a.width >= 123.0);
    assert!(a.height >= 45.0);
}

#[test]
fn invalid_scope_frames_are_rejected() {
    let mut body = LayoutGraph::new();
    let inner = body.add_node(sized());
    body.entry = Some(inner); // entry without exit

    let mut root = LayoutGraph::new();
    root.add_node(LayoutNode {
        children: vec![body],
        ..sized()
    });

    assert!(matches!(
        layout(root, &LayoutOptions::default()),
        Err(laminar::Error::InvalidInput(_))
    ));
}

#[test]
fn undersized_edge_weights_are_rejected() {
    let mut g = LayoutGraph::new();
    let a = g.add_node(sized());
    let b = g.add_node(sized());
    g.add_edge(
        a,
        b,
        LayoutEdge {
            weight: 0.5,
            ..LayoutEdge::default()
        },
    )
    .unwrap();

    assert!(matches!(
        layout(g, &LayoutOptions::default()),
        Err(laminar::Error::InvalidInput(_))
    ));
}

#[test]
fn analysis_weights_mirror_the_options() {
    let opts = LayoutOptions {
        weight_bends: 0.3,
        weight_crossings: 2.0,
        weight_lengths: 0.25,
        ..LayoutOptions::default()
    };
    let weights = opts.analysis_weights();
    assert_eq!(weights.bends, 0.3);
    assert_eq!(weights.crossings, 2.0);
    assert_eq!(weights.lengths, 0.25);
}
