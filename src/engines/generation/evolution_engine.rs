use crate::config::{ConfigSection, EvolutionConfig};
use crate::engines::evaluation::{CacheStats, FitnessEvaluator, ScoringFn};
use crate::engines::generation::{
    hall_of_fame::{EliteCandidate, HallOfFame},
    population::{Champion, GenerationStats, Population},
    progress::ProgressCallback,
    tree_builder::TreeBuilder,
};
use crate::error::{LintsynthError, Result};
use crate::functions::{SharedRegistry, TypeRegistry};
use crate::types::{TypeTag, Value};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{PoisonError, RwLockReadGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// Some candidate passed every assertion.
    Satisfied,
    /// The generation budget ran out first.
    Exhausted,
}

/// Result of one resolved run.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best: Champion,
    pub history: Vec<GenerationStats>,
    pub hall_of_fame: Vec<EliteCandidate>,
    pub cache: CacheStats,
}

impl SearchOutcome {
    pub fn status(&self) -> SearchStatus {
        if self.best.record.satisfied {
            SearchStatus::Satisfied
        } else {
            SearchStatus::Exhausted
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.status() == SearchStatus::Satisfied
    }

    pub fn generations(&self) -> usize {
        self.history.len()
    }

    /// Best-ever materialized value, satisfied or not.
    pub fn value(&self) -> Option<&Value> {
        self.best.record.value.as_ref()
    }

    pub fn score(&self) -> u32 {
        self.best.record.score
    }

    /// The best value if it satisfied every assertion, otherwise
    /// `ConvergenceFailure` carrying the best value found.
    pub fn into_value(self) -> Result<Value> {
        match (self.status(), self.best.record.value) {
            (SearchStatus::Satisfied, Some(value)) => Ok(value),
            (_, best) => Err(LintsynthError::ConvergenceFailure {
                best_score: self.best.record.score,
                generations: self.history.len(),
                best,
            }),
        }
    }
}

/// One generational GP run over a registry and scoring callable.
pub struct EvolutionEngine {
    config: EvolutionConfig,
    registry: SharedRegistry,
    target: TypeTag,
    builder: TreeBuilder,
    evaluator: FitnessEvaluator,
    rng: StdRng,
}

impl EvolutionEngine {
    pub fn new(
        config: EvolutionConfig,
        registry: SharedRegistry,
        target: TypeTag,
        scorer: ScoringFn,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let builder = TreeBuilder::from_config(&config);
        let evaluator = FitnessEvaluator::new(scorer, target.clone());

        Self {
            config,
            registry,
            target,
            builder,
            evaluator,
            rng,
        }
    }

    fn registry(&self) -> RwLockReadGuard<'_, TypeRegistry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail early if no tree of the target type fits the depth limit.
    fn check_grammar(&self) -> Result<()> {
        if self
            .registry()
            .is_constructible(&self.target, self.config.max_tree_depth)
        {
            Ok(())
        } else {
            Err(LintsynthError::UnsatisfiableGrammar {
                tag: self.target.clone(),
                max_depth: self.config.max_tree_depth,
            })
        }
    }

    /// Run the evolution process
    pub fn run<C: ProgressCallback + ?Sized>(&mut self, callback: &mut C) -> Result<SearchOutcome> {
        self.config.validate()?;
        self.check_grammar()?;

        log::info!(
            "Searching for `{}`: population {}, up to {} generations",
            self.target,
            self.config.population_size,
            self.config.max_generations
        );

        // Initialize population
        let mut population = {
            let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
            Population::initialize(
                self.config.population_size,
                &self.builder,
                &registry,
                &self.target,
                &mut self.rng,
            )?
        };
        callback.on_initialized(population.len());

        let mut hall_of_fame = HallOfFame::new(self.config.hall_of_fame_size);
        let mut history = Vec::with_capacity(self.config.max_generations);

        // Evolution loop
        for generation in 0..self.config.max_generations {
            callback.on_generation_start(generation);

            let stats = population.evaluate(&self.evaluator, self.config.parallel_evaluation);
            for individual in population.individuals() {
                hall_of_fame.try_add(individual, generation);
            }

            log::debug!(
                "Generation {}: best {}, {} invalid, {} cached values",
                generation,
                stats.best_score,
                stats.invalid,
                self.evaluator.cache().len()
            );
            callback.on_generation_complete(&stats);
            history.push(stats);

            if population.best_ever().map_or(false, |c| c.record.satisfied) {
                break;
            }
            if generation + 1 == self.config.max_generations {
                break;
            }

            let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
            population.advance(&self.config, &self.builder, &registry, &mut self.rng);
        }

        let cache = self.evaluator.cache().stats();
        self.evaluator.reset();

        let best = population.best_ever().cloned().ok_or_else(|| {
            LintsynthError::Generation("no generation was evaluated".to_string())
        })?;

        log::info!(
            "Search finished after {} generations: best score {} ({})",
            history.len(),
            best.record.score,
            best.root.to_formula_short(80)
        );

        Ok(SearchOutcome {
            best,
            history,
            hall_of_fame: hall_of_fame.get_all().to_vec(),
            cache,
        })
    }
}
