use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Schema error: {0}")]
    Schema(String),

    /// A dependency names attributes that no relation carries.
    #[error("Malformed dependency: attributes {attributes:?} are absent from every relation")]
    MalformedDependency { attributes: Vec<String> },

    /// Transitive resolution revisited an attribute on its own path.
    #[error("Cyclic dependency: resolving '{attribute}' leads back to itself")]
    CyclicDependency { attribute: String },

    #[error("Empty partition: join decomposition produced an empty attribute group")]
    EmptyPartition,

    #[error("Hashing error: {0}")]
    Hash(String),

    #[error("Internal invariant failed: {0}")]
    Invariant(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Hash(e.to_string())
    }
}
