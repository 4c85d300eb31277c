use laminar::position::bk;
use laminar::{LayoutGraph, LayoutNode, level};

fn ranked_node(rank: i32) -> LayoutNode {
    LayoutNode {
        rank: Some(rank),
        ..LayoutNode::sized(40.0, 20.0)
    }
}

#[test]
fn a_chain_is_aligned_vertically() {
    let mut g = LayoutGraph::new();
    let a = g.add_node(ranked_node(0));
    let b = g.add_node(ranked_node(1));
    let c = g.add_node(ranked_node(2));
    g.add_edge_between(a, b).unwrap();
    g.add_edge_between(b, c).unwrap();

    let level = level::build(&mut g);
    let xs = bk::assign_x(&g, &level, 50.0);

    let shadow = |id: usize| g.node(id).unwrap().level_ids[0];
    assert!((xs[shadow(a)] - xs[shadow(b)]).abs() < 1e-9);
    assert!((xs[shadow(b)] - xs[shadow(c)]).abs() < 1e-9);
}

#[test]
fn rank_neighbors_keep_the_target_separation() {
    let mut g = LayoutGraph::new();
    let a = g.add_node(ranked_node(0));
    let b = g.add_node(ranked_node(0));

    let level = level::build(&mut g);
    let xs = bk::assign_x(&g, &level, 50.0);

    let shadow = |id: usize| g.node(id).unwrap().level_ids[0];
    // Center distance = target + half widths.
    assert!((xs[shadow(b)] - xs[shadow(a)] - 90.0).abs() < 1e-9);
}

#[test]
fn the_layout_starts_at_zero() {
    let mut g = LayoutGraph::new();
    let a = g.add_node(ranked_node(0));
    let b = g.add_node(ranked_node(0));

    let level = level::build(&mut g);
    let xs = bk::assign_x(&g, &level, 50.0);

    let shadow = |id: usize| g.node(id).unwrap().level_ids[0];
    let min_left = [a, b]
        .iter()
        .map(|&id| xs[shadow(id)] - 20.0)
        .fold(f64::INFINITY, f64::min);
    assert!(min_left.abs() < 1e-9);
}

#[test]
fn multi_rank_shadows_share_one_column() {
    let mut g = LayoutGraph::new();
    let tall = g.add_node(LayoutNode {
        rank: Some(0),
        rank_span: 3,
        ..LayoutNode::sized(40.0, 20.0)
    });
    let _side = g.add_node(ranked_node(0));
    let sink = g.add_node(ranked_node(3));
    g.add_edge_between(tall, sink).unwrap();

    let level = level::build(&mut g);
    let xs = bk::assign_x(&g, &level, 50.0);

    let shadows = &g.node(tall).unwrap().level_ids;
    assert_eq!(shadows.len(), 3);
    for pair in shadows.windows(2) {
        assert!((xs[pair[0]] - xs[pair[1]]).abs() < 1e-9);
    }
}
