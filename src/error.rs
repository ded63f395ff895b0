use crate::types::{TypeTag, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LintsynthError {
    #[error("Invalid AST: {0}")]
    InvalidAst(String),

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: TypeTag, actual: TypeTag },

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Grammar cannot construct type `{tag}` within depth {max_depth}")]
    UnsatisfiableGrammar { tag: TypeTag, max_depth: usize },

    #[error("Unknown terminal {value} for type `{tag}`")]
    UnknownTerminal { tag: TypeTag, value: Value },

    #[error("Computation error: {0}")]
    Computation(String),

    #[error("No candidate satisfied every assertion after {generations} generations (best score {best_score})")]
    ConvergenceFailure {
        best_score: u32,
        generations: usize,
        best: Option<Value>,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Config source error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, LintsynthError>;

/// Signal raised by a scoring callable.
///
/// `Unmet` is the expected outcome of a failed assertion and becomes partial
/// credit. Anything else is an unexpected evaluation failure and scores zero.
#[derive(Error, Debug)]
pub enum ScoreFailure {
    #[error("assertion not satisfied")]
    Unmet,

    #[error("unexpected evaluation failure: {0}")]
    Unexpected(#[from] anyhow::Error),
}
