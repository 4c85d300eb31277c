use laminar::{
    CONNECTOR_SIZE, CONNECTOR_SPACING, ConnectorSide, LayoutConnector, LayoutEdge, LayoutGraph,
    LayoutNode, LayoutOptions, layout,
};

fn node_with_connectors(ins: &[&str], outs: &[&str]) -> LayoutNode {
    LayoutNode {
        in_connectors: ins
            .iter()
            .map(|n| LayoutConnector::new(*n, ConnectorSide::In))
            .collect(),
        out_connectors: outs
            .iter()
            .map(|n| LayoutConnector::new(*n, ConnectorSide::Out))
            .collect(),
        ..LayoutNode::sized(120.0, 40.0)
    }
}

#[test]
fn scoped_pairs_share_their_x() {
    let mut g = LayoutGraph::new();
    let n = g.add_node(node_with_connectors(
        &["IN_data", "ctrl"],
        &["OUT_data", "result"],
    ));

    let out = layout(g, &LayoutOptions::default()).unwrap();
    let node = out.node(n).unwrap();

    let i = node.in_connector("IN_data").unwrap();
    let o = node.out_connector("OUT_data").unwrap();
    assert!(node.in_connectors[i].is_scoped);
    assert!(node.out_connectors[o].is_scoped);
    assert!((node.in_connectors[i].x - node.out_connectors[o].x).abs() < 1e-9);
}

#[test]
fn connectors_sit_on_their_border() {
    let mut g = LayoutGraph::new();
    let n = g.add_node(node_with_connectors(&["a"], &["b"]));

    let out = layout(g, &LayoutOptions::default()).unwrap();
    let node = out.node(n).unwrap();

    let a = &node.in_connectors[node.in_connector("a").unwrap()];
    assert!((a.y - node.y).abs() < 1e-9);
    let b = &node.out_connectors[node.out_connector("b").unwrap()];
    assert!((b.y - (node.y + node.height)).abs() < 1e-9);
}

#[test]
fn adjacent_connectors_keep_the_fixed_spacing() {
    let mut g = LayoutGraph::new();
    let n = g.add_node(node_with_connectors(&["IN_a", "IN_b"], &["OUT_a", "OUT_b"]));

    let out = layout(g, &LayoutOptions::default()).unwrap();
    let node = out.node(n).unwrap();

    let mut xs: Vec<f64> = node.in_connectors.iter().map(|c| c.x).collect();
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert!((xs[1] - xs[0] - (CONNECTOR_SIZE + CONNECTOR_SPACING)).abs() < 1e-9);
}

#[test]
fn narrow_nodes_grow_to_fit_their_connectors() {
    let mut g = LayoutGraph::new();
    let n = g.add_node(LayoutNode {
        in_connectors: (0..6)
            .map(|i| LayoutConnector::new(format!("p{i}"), ConnectorSide::In))
            .collect(),
        ..LayoutNode::sized(20.0, 20.0)
    });

    let out = layout(g, &LayoutOptions::default()).unwrap();
    let node = out.node(n).unwrap();
    let row = 6.0 * CONNECTOR_SIZE + 5.0 * CONNECTOR_SPACING;
    assert!(node.width >= row);
}

#[test]
fn edges_naming_a_missing_connector_get_a_temporary_one() {
    let mut g = LayoutGraph::new();
    let a = g.add_node(LayoutNode::sized(40.0, 20.0));
    let b = g.add_node(LayoutNode::sized(40.0, 20.0));
    g.add_edge(a, b, LayoutEdge::between(Some("out1"), Some("in1")))
        .unwrap();

    let out = layout(g, &LayoutOptions::default()).unwrap();
    let a_node = out.node(a).unwrap();
    let i = a_node.out_connector("out1").unwrap();
    assert!(a_node.out_connectors[i].is_temporary);
    let b_node = out.node(b).unwrap();
    let j = b_node.in_connector("in1").unwrap();
    assert!(b_node.in_connectors[j].is_temporary);
}

#[test]
fn connector_counts_are_never_changed_by_layout() {
    let mut g = LayoutGraph::new();
    let n = g.add_node(node_with_connectors(&["IN_a", "x", "y"], &["OUT_a", "z"]));
    let m = g.add_node(LayoutNode::sized(40.0, 20.0));
    g.add_edge(n, m, LayoutEdge::between(Some("z"), None)).unwrap();

    let out = layout(g, &LayoutOptions::default()).unwrap();
    let node = out.node(n).unwrap();
    assert_eq!(node.in_connectors.len(), 3);
    assert_eq!(node.out_connectors.len(), 2);
}
