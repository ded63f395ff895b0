use super::fitness::FitnessRecord;
use crate::types::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Run-scoped memo of fitness records keyed by materialized value.
///
/// The mutex only guards slot lookup. Each slot is a `OnceLock`, so at most
/// one computation per key is ever live; concurrent askers wait on it.
#[derive(Debug, Default)]
pub struct EvaluationCache {
    slots: Mutex<HashMap<Value, Arc<OnceLock<FitnessRecord>>>>,
    computations: AtomicUsize,
    hits: AtomicUsize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub entries: usize,
    pub computations: usize,
    pub hits: usize,
}

impl EvaluationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the record for `key`, running `compute` only if no record exists.
    pub fn get_or_compute<F>(&self, key: &Value, compute: F) -> FitnessRecord
    where
        F: FnOnce() -> FitnessRecord,
    {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            match slots.get(key) {
                Some(slot) => Arc::clone(slot),
                None => {
                    let slot = Arc::new(OnceLock::new());
                    slots.insert(key.clone(), Arc::clone(&slot));
                    slot
                }
            }
        };

        let mut computed = false;
        let record = slot
            .get_or_init(|| {
                computed = true;
                self.computations.fetch_add(1, Ordering::Relaxed);
                compute()
            })
            .clone();

        if !computed {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        record
    }

    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            computations: self.computations.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
        }
    }

    pub fn clear(&self) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.computations.store(0, Ordering::Relaxed);
        self.hits.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    fn record(score: u32, value: &Value) -> FitnessRecord {
        FitnessRecord {
            score,
            value: Some(value.clone()),
            valid: true,
            satisfied: false,
        }
    }

    #[test]
    fn test_hit_skips_computation() {
        let cache = EvaluationCache::new();
        let key = Value::from("q");

        let first = cache.get_or_compute(&key, || record(2, &key));
        let second = cache.get_or_compute(&key, || record(99, &key));

        assert_eq!(first, second);
        assert_eq!(cache.stats().computations, 1);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(second.score, 2);
    }

    #[test]
    fn test_concurrent_askers_compute_once() {
        let cache = EvaluationCache::new();
        let key = Value::from("shared");
        let calls = AtomicUsize::new(0);

        let scores: Vec<u32> = (0..64)
            .into_par_iter()
            .map(|_| {
                cache
                    .get_or_compute(&key, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        record(3, &key)
                    })
                    .score
            })
            .collect();

        assert!(scores.iter().all(|&s| s == 3));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear_resets_everything() {
        let cache = EvaluationCache::new();
        let key = Value::from(1);
        cache.get_or_compute(&key, || record(1, &key));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
