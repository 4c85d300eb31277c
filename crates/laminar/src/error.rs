pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input graph: {0}")]
    InvalidInput(String),

    #[error("graph is not rankable: {0}")]
    Unrankable(String),

    #[error(transparent)]
    Graph(#[from] laminar_graphlib::GraphError),
}
