use crate::engines::evaluation::FitnessRecord;
use crate::engines::generation::ast::Individual;
use crate::types::Value;
use std::collections::HashSet;

#[derive(Clone, Debug)]
pub struct EliteCandidate {
    pub value: Value,
    pub formula: String,
    pub record: FitnessRecord,
    pub generation: usize,
}

/// Best distinct materialized values seen during one run.
pub struct HallOfFame {
    candidates: Vec<EliteCandidate>,
    max_size: usize,
    seen_values: HashSet<Value>,
}

impl HallOfFame {
    pub fn new(max_size: usize) -> Self {
        Self {
            candidates: Vec::new(),
            max_size,
            seen_values: HashSet::new(),
        }
    }

    /// Offer an evaluated individual. Invalid records and values already
    /// present are rejected.
    pub fn try_add(&mut self, individual: &Individual, generation: usize) -> bool {
        if self.max_size == 0 {
            return false;
        }
        let Some(record) = individual.fitness.as_ref().filter(|r| r.valid) else {
            return false;
        };
        let Some(value) = record.value.clone() else {
            return false;
        };
        if self.seen_values.contains(&value) {
            return false;
        }

        // Full and no better than the current worst
        if self.candidates.len() >= self.max_size
            && self
                .candidates
                .last()
                .map_or(false, |worst| record.rank_key() <= worst.record.rank_key())
        {
            return false;
        }

        self.seen_values.insert(value.clone());
        self.candidates.push(EliteCandidate {
            value,
            formula: individual.root.to_formula(),
            record: record.clone(),
            generation,
        });

        // Stable sort keeps earlier entries ahead on ties
        self.candidates
            .sort_by(|a, b| b.record.rank_key().cmp(&a.record.rank_key()));

        while self.candidates.len() > self.max_size {
            if let Some(removed) = self.candidates.pop() {
                self.seen_values.remove(&removed.value);
            }
        }

        true
    }

    pub fn get_all(&self) -> &[EliteCandidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::generation::ast::ExpressionNode;

    fn evaluated(id: u64, value: i64, score: u32) -> Individual {
        let mut ind = Individual::new(id, 0, ExpressionNode::terminal("int", value));
        ind.fitness = Some(FitnessRecord {
            score,
            value: Some(Value::Int(value)),
            valid: true,
            satisfied: false,
        });
        ind
    }

    #[test]
    fn test_deduplicates_by_value() {
        let mut hof = HallOfFame::new(3);
        assert!(hof.try_add(&evaluated(0, 7, 1), 0));
        assert!(!hof.try_add(&evaluated(1, 7, 1), 0));
        assert_eq!(hof.len(), 1);
    }

    #[test]
    fn test_keeps_best_sorted_and_trimmed() {
        let mut hof = HallOfFame::new(2);
        hof.try_add(&evaluated(0, 1, 1), 0);
        hof.try_add(&evaluated(1, 2, 3), 0);
        hof.try_add(&evaluated(2, 3, 2), 1);

        let scores: Vec<u32> = hof.get_all().iter().map(|c| c.record.score).collect();
        assert_eq!(scores, vec![3, 2]);
        assert!(!hof.try_add(&evaluated(3, 4, 1), 1));
        assert_eq!(hof.len(), 2);
    }

    #[test]
    fn test_rejects_invalid_records() {
        let mut hof = HallOfFame::new(2);
        let mut ind = Individual::new(0, 0, ExpressionNode::terminal("int", 1));
        ind.fitness = Some(FitnessRecord::invalid());
        assert!(!hof.try_add(&ind, 0));
        assert!(hof.is_empty());
    }
}
