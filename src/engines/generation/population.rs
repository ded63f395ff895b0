use crate::config::{EvolutionConfig, SelectionMethod};
use crate::engines::evaluation::{FitnessEvaluator, FitnessRecord};
use crate::engines::generation::ast::{ExpressionNode, Individual};
use crate::engines::generation::operators::{
    compare, crossover, mutate, ranked, roulette_selection, tournament_selection,
};
use crate::engines::generation::tree_builder::TreeBuilder;
use crate::error::Result;
use crate::functions::TypeRegistry;
use crate::types::TypeTag;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Summary of one evaluated generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: usize,
    pub best_score: u32,
    pub average_score: f64,
    pub invalid: usize,
    pub satisfied: bool,
}

/// Best individual seen so far in a run.
#[derive(Debug, Clone)]
pub struct Champion {
    pub id: u64,
    pub generation: usize,
    pub root: ExpressionNode,
    pub record: FitnessRecord,
}

pub struct Population {
    individuals: Vec<Individual>,
    generation: usize,
    next_id: u64,
    best_ever: Option<Champion>,
}

impl Population {
    /// Build `size` independent individuals of type `target`.
    pub fn initialize<R: Rng>(
        size: usize,
        builder: &TreeBuilder,
        registry: &TypeRegistry,
        target: &TypeTag,
        rng: &mut R,
    ) -> Result<Self> {
        let individuals = (0..size as u64)
            .map(|id| {
                builder
                    .build(registry, target, rng)
                    .map(|root| Individual::new(id, 0, root))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            individuals,
            generation: 0,
            next_id: size as u64,
            best_ever: None,
        })
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn best_ever(&self) -> Option<&Champion> {
        self.best_ever.as_ref()
    }

    /// Score every individual lacking a record for this generation.
    pub fn evaluate(&mut self, evaluator: &FitnessEvaluator, parallel: bool) -> GenerationStats {
        if parallel {
            self.individuals
                .par_iter_mut()
                .filter(|ind| ind.fitness.is_none())
                .for_each(|ind| ind.fitness = Some(evaluator.evaluate(&ind.root)));
        } else {
            for ind in self.individuals.iter_mut().filter(|ind| ind.fitness.is_none()) {
                ind.fitness = Some(evaluator.evaluate(&ind.root));
            }
        }

        self.update_best_ever();
        self.stats()
    }

    fn update_best_ever(&mut self) {
        let Some(best) = self
            .individuals
            .iter()
            .min_by(|a, b| compare(a, b))
        else {
            return;
        };
        let Some(record) = best.fitness.clone() else {
            return;
        };

        let improves = self
            .best_ever
            .as_ref()
            .map_or(true, |champion| record.rank_key() > champion.record.rank_key());

        if improves {
            self.best_ever = Some(Champion {
                id: best.id,
                generation: self.generation,
                root: best.root.clone(),
                record,
            });
        }
    }

    pub fn stats(&self) -> GenerationStats {
        let scores: Vec<u32> = self.individuals.iter().map(Individual::score).collect();
        let total: u64 = scores.iter().map(|&s| u64::from(s)).sum();

        GenerationStats {
            generation: self.generation,
            best_score: scores.iter().copied().max().unwrap_or(0),
            average_score: if scores.is_empty() {
                0.0
            } else {
                total as f64 / scores.len() as f64
            },
            invalid: self
                .individuals
                .iter()
                .filter(|ind| ind.fitness.as_ref().map_or(false, |f| !f.valid))
                .count(),
            satisfied: self.individuals.iter().any(Individual::is_satisfied),
        }
    }

    /// Select and vary into the next generation.
    ///
    /// The best `elitism_count` individuals survive unchanged; the rest are
    /// offspring of crossover or reproduction, each possibly mutated.
    pub fn advance<R: Rng>(
        &mut self,
        config: &EvolutionConfig,
        builder: &TreeBuilder,
        registry: &TypeRegistry,
        rng: &mut R,
    ) {
        let size = self.individuals.len();
        let mut next_generation: Vec<Individual> = Vec::with_capacity(size);

        // Elitism: survivors keep their identity, records are recomputed next generation
        for &idx in ranked(&self.individuals).iter().take(config.elitism_count.min(size)) {
            let mut elite = self.individuals[idx].clone();
            elite.fitness = None;
            next_generation.push(elite);
        }

        let born = self.generation + 1;
        while next_generation.len() < size {
            if rng.gen::<f64>() < config.crossover_rate {
                let parent1 = self.select(config, rng);
                let parent2 = self.select(config, rng);

                let (child1, child2) = match crossover(&parent1.root, &parent2.root, rng) {
                    Some((c1, c2)) => (
                        within_depth(c1, &parent1.root, builder.max_depth()),
                        within_depth(c2, &parent2.root, builder.max_depth()),
                    ),
                    None => (parent1.root.clone(), parent2.root.clone()),
                };

                for child in [child1, child2] {
                    if next_generation.len() < size {
                        let child = self.offspring(child, born, config, builder, registry, rng);
                        next_generation.push(child);
                    }
                }
            } else {
                // Reproduction (copy)
                let child = self.select(config, rng).root.clone();
                let child = self.offspring(child, born, config, builder, registry, rng);
                next_generation.push(child);
            }
        }

        self.individuals = next_generation;
        self.generation = born;
    }

    fn select<R: Rng>(&self, config: &EvolutionConfig, rng: &mut R) -> &Individual {
        match config.selection_method {
            SelectionMethod::Tournament => {
                tournament_selection(&self.individuals, config.tournament_size, rng)
            }
            SelectionMethod::Roulette => roulette_selection(&self.individuals, rng),
        }
    }

    fn offspring<R: Rng>(
        &mut self,
        mut root: ExpressionNode,
        born: usize,
        config: &EvolutionConfig,
        builder: &TreeBuilder,
        registry: &TypeRegistry,
        rng: &mut R,
    ) -> Individual {
        if rng.gen_bool(config.mutation_rate) {
            if let Err(e) = mutate(&mut root, builder, registry, rng) {
                log::debug!("Mutation skipped: {}", e);
            }
        }
        let id = self.next_id;
        self.next_id += 1;
        Individual::new(id, born, root)
    }
}

/// Keep a crossover child only if it respects the depth limit.
fn within_depth(child: ExpressionNode, parent: &ExpressionNode, max_depth: usize) -> ExpressionNode {
    if child.depth() > max_depth {
        parent.clone()
    } else {
        child
    }
}
