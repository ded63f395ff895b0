pub mod cache;
pub mod fitness;
pub mod materialize;

pub use cache::{CacheStats, EvaluationCache};
pub use fitness::{Assertions, FitnessEvaluator, FitnessRecord, ScoringFn};
pub use materialize::{materialize, materialize_as};
