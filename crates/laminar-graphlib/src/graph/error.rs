pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("corrupted graph reference: no node with id {0}")]
    CorruptedNode(usize),

    #[error("corrupted graph reference: no edge with id {0}")]
    CorruptedEdge(usize),

    #[error("graph contains a cycle")]
    Cyclic,
}
