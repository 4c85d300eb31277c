//! The layout data model: nodes, edges, connectors, bundles, and the graph tree.
//!
//! All entities are identified by dense integer ids within their owning container.
//! Back-references (connector counterparts, bundle members, scope frames) are stored as
//! ids or indices, never as pointers, so the tree stays freely cloneable.

use crate::geom::Point;
use crate::level::LevelGraph;
use laminar_graphlib::DiGraph;

pub use laminar_graphlib::{EdgeId, NodeId};

/// Side length of a connector square, shared with the renderer.
pub const CONNECTOR_SIZE: f64 = 10.0;
/// Gap between adjacent connectors, shared with the renderer.
pub const CONNECTOR_SPACING: f64 = 10.0;

/// Connector name prefix marking the input half of a scoped pair.
pub const SCOPED_IN_PREFIX: &str = "IN_";
/// Connector name prefix marking the output half of a scoped pair.
pub const SCOPED_OUT_PREFIX: &str = "OUT_";

/// Temporary out connector attached to the original destination of an inverted edge.
pub const INVERTED_OUT_CONNECTOR: &str = "bottomIn";
/// Temporary in connector attached to the original source of an inverted edge.
pub const INVERTED_IN_CONNECTOR: &str = "topOut";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorSide {
    /// Along the top edge of the node.
    In,
    /// Along the bottom edge of the node.
    Out,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConnector {
    pub name: String,
    pub side: ConnectorSide,
    pub width: f64,
    pub height: f64,
    /// Center position. Relative to the node's top-left corner until the final pass
    /// converts every connector to absolute coordinates.
    pub x: f64,
    pub y: f64,
    /// Created only to anchor an edge that named no connector on this endpoint.
    pub is_temporary: bool,
    /// Half of an `IN_x` / `OUT_x` pair. Scoped pairs share their x coordinate.
    pub is_scoped: bool,
    /// Index of the paired connector in the opposite side's list.
    pub counterpart: Option<usize>,
}

impl LayoutConnector {
    pub fn new(name: impl Into<String>, side: ConnectorSide) -> Self {
        Self {
            name: name.into(),
            side,
            width: CONNECTOR_SIZE,
            height: CONNECTOR_SIZE,
            x: 0.0,
            y: 0.0,
            is_temporary: false,
            is_scoped: false,
            counterpart: None,
        }
    }

    pub fn temporary(name: impl Into<String>, side: ConnectorSide) -> Self {
        Self {
            is_temporary: true,
            ..Self::new(name, side)
        }
    }

    /// The suffix shared by both halves of a scoped pair, if this name carries one.
    pub fn scoped_suffix(&self) -> Option<&str> {
        match self.side {
            ConnectorSide::In => self.name.strip_prefix(SCOPED_IN_PREFIX),
            ConnectorSide::Out => self.name.strip_prefix(SCOPED_OUT_PREFIX),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub width: f64,
    pub height: f64,
    /// Top-left corner. Local to the owning subgraph until the final pass translates the
    /// tree to absolute coordinates.
    pub x: f64,
    pub y: f64,
    pub padding: f64,
    /// Globally assigned layer.
    pub rank: Option<i32>,
    /// Number of consecutive ranks occupied; scope nodes span their whole interior.
    pub rank_span: usize,
    /// Position within the first occupied rank.
    pub index: usize,
    pub is_virtual: bool,
    pub is_bundle: bool,
    pub is_scope: bool,
    pub is_access: bool,
    pub in_connectors: Vec<LayoutConnector>,
    pub out_connectors: Vec<LayoutConnector>,
    /// Self-loop detached before cycle removal, reinjected by the router.
    pub self_loop: Option<LayoutEdge>,
    /// Nested subgraphs. This is the single ownership field; scope nodes have at least
    /// one entry, everything else has none.
    pub children: Vec<LayoutGraph>,
    /// Per-rank shadows in the owning subgraph's level graph; length equals `rank_span`
    /// once the level graph has been built.
    pub level_ids: Vec<usize>,
}

impl Default for LayoutNode {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            x: 0.0,
            y: 0.0,
            padding: 0.0,
            rank: None,
            rank_span: 1,
            index: 0,
            is_virtual: false,
            is_bundle: false,
            is_scope: false,
            is_access: false,
            in_connectors: Vec::new(),
            out_connectors: Vec::new(),
            self_loop: None,
            children: Vec::new(),
            level_ids: Vec::new(),
        }
    }
}

impl LayoutNode {
    pub fn sized(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn virtual_at(rank: i32) -> Self {
        Self {
            is_virtual: true,
            rank: Some(rank),
            ..Self::default()
        }
    }

    /// First rank past the node, i.e. `rank + rank_span`.
    pub fn rank_end(&self) -> i32 {
        self.rank.unwrap_or(0) + self.rank_span as i32
    }

    pub fn in_connector(&self, name: &str) -> Option<usize> {
        self.in_connectors.iter().position(|c| c.name == name)
    }

    pub fn out_connector(&self, name: &str) -> Option<usize> {
        self.out_connectors.iter().position(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutEdge {
    /// Finite weights come from the input (>= 1); `f64::INFINITY` marks heavy segments
    /// created along virtual chains.
    pub weight: f64,
    pub src_connector: Option<String>,
    pub dst_connector: Option<String>,
    pub label_size: Option<(f64, f64)>,
    pub label_pos: Option<Point>,
    /// Non-primary member of a bundle; copies the primary's routed interior.
    pub is_replica: bool,
    /// Set by cycle removal, cleared by restoration.
    pub is_inverted: bool,
    pub points: Vec<Point>,
    pub src_bundle: Option<usize>,
    pub dst_bundle: Option<usize>,
}

impl Default for LayoutEdge {
    fn default() -> Self {
        Self {
            weight: 1.0,
            src_connector: None,
            dst_connector: None,
            label_size: None,
            label_pos: None,
            is_replica: false,
            is_inverted: false,
            points: Vec::new(),
            src_bundle: None,
            dst_bundle: None,
        }
    }
}

impl LayoutEdge {
    pub fn between(src_connector: Option<&str>, dst_connector: Option<&str>) -> Self {
        Self {
            src_connector: src_connector.map(str::to_string),
            dst_connector: dst_connector.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn is_heavy(&self) -> bool {
        self.weight.is_infinite()
    }
}

/// A group of edges sharing one endpoint node and one missing connector name, attached
/// at a single external point above or below the node.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBundle {
    pub node: NodeId,
    pub side: ConnectorSide,
    pub name: String,
    /// Member edges; the first is the primary.
    pub edges: Vec<EdgeId>,
    /// Attachment point, just beyond the node's rank boundary.
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default)]
pub struct LayoutGraph {
    pub graph: DiGraph<LayoutNode, LayoutEdge>,
    /// True for the root and nested-scope boundaries; those subgraphs go through cycle
    /// removal. Internal scopes are guaranteed acyclic by construction.
    pub may_have_cycles: bool,
    /// Global rank of this subgraph's first layer.
    pub min_rank: i32,
    /// Number of global ranks this subgraph spans.
    pub num_ranks: usize,
    /// Entry frame, when this graph is the interior of a scope.
    pub entry: Option<NodeId>,
    /// Exit frame, paired with `entry`.
    pub exit: Option<NodeId>,
    pub bundles: Vec<LayoutBundle>,
    /// Built by the ordering stage, consumed by coordinate assignment, then dropped.
    pub level: Option<LevelGraph>,
}

impl LayoutGraph {
    pub fn new() -> Self {
        Self {
            may_have_cycles: true,
            ..Self::default()
        }
    }

    /// An internal scope body: acyclic by construction, framed by `entry` and `exit`.
    pub fn scope_body(entry_node: LayoutNode, exit_node: LayoutNode) -> Self {
        let mut lg = Self {
            may_have_cycles: false,
            ..Self::default()
        };
        let entry = lg.graph.add_node(entry_node);
        let exit = lg.graph.add_node(exit_node);
        lg.entry = Some(entry);
        lg.exit = Some(exit);
        lg
    }

    pub fn add_node(&mut self, node: LayoutNode) -> NodeId {
        self.graph.add_node(node)
    }

    pub fn add_edge(
        &mut self,
        src: NodeId,
        dst: NodeId,
        edge: LayoutEdge,
    ) -> crate::error::Result<EdgeId> {
        Ok(self.graph.add_edge(src, dst, edge)?)
    }

    pub fn add_edge_between(&mut self, src: NodeId, dst: NodeId) -> crate::error::Result<EdgeId> {
        self.add_edge(src, dst, LayoutEdge::default())
    }

    pub fn node(&self, id: NodeId) -> crate::error::Result<&LayoutNode> {
        Ok(self.graph.node(id)?)
    }

    pub fn node_mut(&mut self, id: NodeId) -> crate::error::Result<&mut LayoutNode> {
        Ok(self.graph.node_mut(id)?)
    }

    pub fn edge(&self, id: EdgeId) -> crate::error::Result<&LayoutEdge> {
        Ok(self.graph.edge(id)?)
    }

    /// Extent of the placed content: `(width, height)` of the bounding box over nodes.
    pub fn extent(&self) -> (f64, f64) {
        let mut max_x: f64 = 0.0;
        let mut max_y: f64 = 0.0;
        for (_, node) in self.graph.nodes() {
            max_x = max_x.max(node.x + node.width);
            max_y = max_y.max(node.y + node.height);
        }
        (max_x, max_y)
    }

}
