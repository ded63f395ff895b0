use super::cache::EvaluationCache;
use super::materialize::materialize_as;
use crate::engines::generation::ExpressionNode;
use crate::error::ScoreFailure;
use crate::types::{TypeTag, Value};
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Outcome of scoring one materialized value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitnessRecord {
    /// Assertions that held before the first failure.
    pub score: u32,
    pub value: Option<Value>,
    /// False when materialization or type-checking failed before scoring.
    pub valid: bool,
    /// True when the scoring callable finished without a failed assertion.
    pub satisfied: bool,
}

impl FitnessRecord {
    pub fn invalid() -> Self {
        Self {
            score: 0,
            value: None,
            valid: false,
            satisfied: false,
        }
    }

    /// Ordering key used for ranking; larger is better.
    pub fn rank_key(&self) -> (bool, u32) {
        (self.satisfied, self.score)
    }
}

/// Assertion counter handed to the scoring callable.
///
/// ```ignore
/// |value, a| {
///     a.check(matches(value, &bad))?;
///     a.check(!matches(value, &good))
/// }
/// ```
#[derive(Debug, Default)]
pub struct Assertions {
    held: u32,
}

impl Assertions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count `condition` if it holds; otherwise halt the callable with `Unmet`.
    pub fn check(&mut self, condition: bool) -> Result<(), ScoreFailure> {
        if condition {
            self.held += 1;
            Ok(())
        } else {
            Err(ScoreFailure::Unmet)
        }
    }

    pub fn held(&self) -> u32 {
        self.held
    }
}

/// Caller-supplied scoring predicate.
pub type ScoringFn = Arc<dyn Fn(&Value, &mut Assertions) -> Result<(), ScoreFailure> + Send + Sync>;

/// Box a closure as a [`ScoringFn`].
pub fn scoring_fn<F>(f: F) -> ScoringFn
where
    F: Fn(&Value, &mut Assertions) -> Result<(), ScoreFailure> + Send + Sync + 'static,
{
    Arc::new(f)
}

type ValueStage = Arc<dyn Fn(&Value) -> FitnessRecord + Send + Sync>;
type TreeStage = Arc<dyn Fn(&ExpressionNode) -> FitnessRecord + Send + Sync>;

/// Convert assertion outcomes into a partial-credit score.
///
/// Unexpected failures and panics are absorbed as a zero score.
fn scored(scorer: ScoringFn) -> ValueStage {
    Arc::new(move |value: &Value| {
        let mut assertions = Assertions::new();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| scorer(value, &mut assertions)));

        let (score, satisfied) = match outcome {
            Ok(Ok(())) => (assertions.held(), true),
            Ok(Err(ScoreFailure::Unmet)) => (assertions.held(), false),
            Ok(Err(ScoreFailure::Unexpected(e))) => {
                log::warn!("Scoring {} failed unexpectedly: {}", value, e);
                (0, false)
            }
            Err(_) => {
                log::warn!("Scoring {} panicked", value);
                (0, false)
            }
        };

        FitnessRecord {
            score,
            value: Some(value.clone()),
            valid: true,
            satisfied,
        }
    })
}

fn memoized(inner: ValueStage, cache: Arc<EvaluationCache>) -> ValueStage {
    Arc::new(move |value: &Value| cache.get_or_compute(value, || inner(value)))
}

/// Materialize against the target type; failures and panicking operations
/// yield an invalid record without reaching the scorer.
fn typed(inner: ValueStage, target: TypeTag) -> TreeStage {
    Arc::new(move |node: &ExpressionNode| {
        let materialized = panic::catch_unwind(AssertUnwindSafe(|| materialize_as(node, &target)));
        match materialized {
            Ok(Ok(value)) => inner(&value),
            Ok(Err(e)) => {
                log::debug!("Materialization of {} failed: {}", node.to_formula_short(60), e);
                FitnessRecord::invalid()
            }
            Err(_) => {
                log::warn!("Materialization of {} panicked", node.to_formula_short(60));
                FitnessRecord::invalid()
            }
        }
    })
}

/// Fitness pipeline for one run: type-check and materialize, consult the
/// cache, then score. Composed once when the evaluator is built.
pub struct FitnessEvaluator {
    pipeline: TreeStage,
    cache: Arc<EvaluationCache>,
}

impl FitnessEvaluator {
    pub fn new(scorer: ScoringFn, target: TypeTag) -> Self {
        let cache = Arc::new(EvaluationCache::new());
        let pipeline = typed(memoized(scored(scorer), Arc::clone(&cache)), target);
        Self { pipeline, cache }
    }

    pub fn evaluate(&self, node: &ExpressionNode) -> FitnessRecord {
        (self.pipeline)(node)
    }

    pub fn cache(&self) -> &EvaluationCache {
        &self.cache
    }

    /// Drop every memoized record; called when a run ends.
    pub fn reset(&self) {
        self.cache.clear();
    }
}
