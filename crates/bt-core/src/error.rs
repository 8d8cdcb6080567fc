use thiserror::Error;

/// A builder could not produce a node from the parameters it was given.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    #[error("node `{node}`: missing required parameter `{key}`")]
    MissingParameter { node: String, key: String },

    #[error("node `{node}`: parameter `{key}` = `{value}` is invalid: {reason}")]
    InvalidParameter {
        node: String,
        key: String,
        value: String,
        reason: String,
    },

    #[error("node `{node}`: {reason}")]
    Invalid { node: String, reason: String },
}

/// Errors raised by [`crate::NodeFactory`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactoryError {
    #[error("no builder registered for node type `{0}`")]
    UnknownType(String),

    #[error("a builder is already registered for node type `{0}`")]
    DuplicateType(String),

    #[error(transparent)]
    Construction(#[from] ConstructionError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown node status `{0}`")]
pub struct ParseNodeStatusError(pub(crate) String);

pub type Result<T, E = ConstructionError> = std::result::Result<T, E>;
