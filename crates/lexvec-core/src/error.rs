use thiserror::Error;

/// Caller-facing failures of the retrieval engine.
///
/// Validation problems (`InvalidInput`) are raised before any retrieval is
/// attempted; anything that goes wrong while retrieving or fusing collapses
/// into a single `Search` error carrying the rendered cause chain.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Wraps an upstream failure, keeping every `context` layer in the message.
    pub fn search(cause: &anyhow::Error) -> Self {
        Self::Search(format!("{cause:#}"))
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
