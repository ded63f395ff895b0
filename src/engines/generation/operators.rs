use crate::engines::generation::ast::{ExpressionNode, Individual};
use crate::engines::generation::tree_builder::TreeBuilder;
use crate::error::Result;
use crate::functions::TypeRegistry;
use rand::Rng;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Rank order: satisfied first, then score, then earliest created.
pub fn compare(a: &Individual, b: &Individual) -> Ordering {
    let key_a = a.fitness.as_ref().map(|f| f.rank_key()).unwrap_or_default();
    let key_b = b.fitness.as_ref().map(|f| f.rank_key()).unwrap_or_default();
    key_b.cmp(&key_a).then(a.id.cmp(&b.id))
}

/// Indices of the population, best first.
pub fn ranked(population: &[Individual]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..population.len()).collect();
    order.sort_by(|&i, &j| compare(&population[i], &population[j]));
    order
}

/// Tournament selection: pick best of K random candidates
pub fn tournament_selection<'a, R: Rng>(
    population: &'a [Individual],
    tournament_size: usize,
    rng: &mut R,
) -> &'a Individual {
    let mut best = &population[rng.gen_range(0..population.len())];

    for _ in 1..tournament_size.max(1) {
        let challenger = &population[rng.gen_range(0..population.len())];
        if compare(challenger, best) == Ordering::Less {
            best = challenger;
        }
    }

    best
}

/// Roulette wheel selection: probability proportional to score
pub fn roulette_selection<'a, R: Rng>(population: &'a [Individual], rng: &mut R) -> &'a Individual {
    let total: u64 = population.iter().map(|ind| u64::from(ind.score())).sum();

    if total == 0 {
        // Nobody scored, pick random
        return &population[rng.gen_range(0..population.len())];
    }

    let mut spin = rng.gen_range(0..total);
    for individual in population {
        let score = u64::from(individual.score());
        if spin < score {
            return individual;
        }
        spin -= score;
    }

    &population[population.len() - 1]
}

/// Subtree crossover: swap a random node of parent1 with a random node of the
/// same type in parent2. Returns `None` when the parents share no node type.
pub fn crossover<R: Rng>(
    parent1: &ExpressionNode,
    parent2: &ExpressionNode,
    rng: &mut R,
) -> Option<(ExpressionNode, ExpressionNode)> {
    let positions2 = parent2.positions();
    let tags2: BTreeSet<_> = positions2.iter().map(|p| &p.tag).collect();

    let eligible1: Vec<_> = parent1
        .positions()
        .into_iter()
        .filter(|p| tags2.contains(&p.tag))
        .collect();
    if eligible1.is_empty() {
        return None;
    }

    let point1 = &eligible1[rng.gen_range(0..eligible1.len())];
    let matching2: Vec<usize> = positions2
        .iter()
        .filter(|p| p.tag == point1.tag)
        .map(|p| p.index)
        .collect();
    let point2 = matching2[rng.gen_range(0..matching2.len())];

    let sub1 = parent1.subtree(point1.index)?.clone();
    let sub2 = parent2.subtree(point2)?.clone();

    let mut child1 = parent1.clone();
    let mut child2 = parent2.clone();
    child1.replace(point1.index, sub2)?;
    child2.replace(point2, sub1)?;

    Some((child1, child2))
}

/// Subtree mutation: regrow one random subtree with a fresh one of the same
/// type, keeping the whole tree within the builder's depth limit.
pub fn mutate<R: Rng>(
    tree: &mut ExpressionNode,
    builder: &TreeBuilder,
    registry: &TypeRegistry,
    rng: &mut R,
) -> Result<()> {
    let positions = tree.positions();
    let point = &positions[rng.gen_range(0..positions.len())];
    let budget = builder.max_depth().saturating_sub(point.level);

    let fresh = builder.build_within(registry, &point.tag, budget, rng)?;
    tree.replace(point.index, fresh);
    Ok(())
}
