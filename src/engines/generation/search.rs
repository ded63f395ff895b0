//! Declarative handle over one evolutionary search.
//!
//! A [`Search`] only records what to look for. Nothing is built or scored
//! until [`Search::resolve`] is called; later calls return the stored outcome.

use crate::config::{EvolutionConfig, SelectionMethod};
use crate::engines::evaluation::{fitness::scoring_fn, Assertions, ScoringFn};
use crate::engines::generation::evolution_engine::{EvolutionEngine, SearchOutcome};
use crate::engines::generation::progress::{LogProgressCallback, ProgressCallback};
use crate::error::{LintsynthError, Result, ScoreFailure};
use crate::functions::SharedRegistry;
use crate::types::{TypeTag, Value};

pub struct Search {
    registry: SharedRegistry,
    target: TypeTag,
    scorer: ScoringFn,
    config: EvolutionConfig,
    progress: Box<dyn ProgressCallback>,
    outcome: Option<SearchOutcome>,
}

impl Search {
    pub fn new<F>(registry: SharedRegistry, target: impl Into<TypeTag>, scorer: F) -> Self
    where
        F: Fn(&Value, &mut Assertions) -> std::result::Result<(), ScoreFailure>
            + Send
            + Sync
            + 'static,
    {
        Self::with_scorer(registry, target, scoring_fn(scorer))
    }

    pub fn with_scorer(registry: SharedRegistry, target: impl Into<TypeTag>, scorer: ScoringFn) -> Self {
        Self {
            registry,
            target: target.into(),
            scorer,
            config: EvolutionConfig::default(),
            progress: Box::new(LogProgressCallback),
            outcome: None,
        }
    }

    pub fn with_config(mut self, config: EvolutionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn population_size(mut self, size: usize) -> Self {
        self.config.population_size = size;
        self
    }

    pub fn max_generations(mut self, generations: usize) -> Self {
        self.config.max_generations = generations;
        self
    }

    pub fn max_tree_depth(mut self, depth: usize) -> Self {
        self.config.max_tree_depth = depth;
        self
    }

    pub fn selection(mut self, method: SelectionMethod) -> Self {
        self.config.selection_method = method;
        self
    }

    pub fn parallel(mut self, enabled: bool) -> Self {
        self.config.parallel_evaluation = enabled;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn progress(mut self, callback: impl ProgressCallback + 'static) -> Self {
        self.progress = Box::new(callback);
        self
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn target(&self) -> &TypeTag {
        &self.target
    }

    pub fn is_resolved(&self) -> bool {
        self.outcome.is_some()
    }

    /// Run the search to completion on first call.
    pub fn resolve(&mut self) -> Result<&SearchOutcome> {
        if self.outcome.is_none() {
            let mut engine = EvolutionEngine::new(
                self.config.clone(),
                self.registry.clone(),
                self.target.clone(),
                self.scorer.clone(),
            );
            self.outcome = Some(engine.run(self.progress.as_mut())?);
        }

        self.outcome
            .as_ref()
            .ok_or_else(|| LintsynthError::Generation("search produced no outcome".to_string()))
    }

    /// Resolve and return the satisfying value, or `ConvergenceFailure`.
    pub fn resolve_value(&mut self) -> Result<Value> {
        self.resolve()?.clone().into_value()
    }
}
