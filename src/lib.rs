//! Typed genetic programming over a caller-supplied grammar.
//!
//! Callers register terminals and typed functions in a [`TypeRegistry`],
//! describe the wanted behaviour as a scoring closure built from assertions,
//! and resolve a [`Search`] to obtain a materialized [`Value`].

pub mod config;
pub mod engines;
pub mod error;
pub mod functions;
pub mod types;

pub use crate::config::{AppConfig, ConfigManager, EvolutionConfig, SelectionMethod};
pub use crate::engines::evaluation::{Assertions, FitnessRecord};
pub use crate::engines::generation::{ExpressionNode, Search, SearchOutcome, SearchStatus};
pub use crate::error::{LintsynthError, Result, ScoreFailure};
pub use crate::functions::{FunctionSpec, SharedRegistry, TypeRegistry};
pub use crate::types::{TypeTag, Value};
