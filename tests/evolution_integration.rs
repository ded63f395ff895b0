mod common;

use common::{bad_unwrap, good_expect, harvest, query_grammar, QUERY};
use lintsynth::engines::generation::{GenerationStats, ProgressCallback, SilentProgressCallback};
use lintsynth::functions::primitives::template;
use lintsynth::{
    EvolutionConfig, FunctionSpec, LintsynthError, Search, SharedRegistry, TypeRegistry, Value,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Records every completed generation for later inspection
#[derive(Clone, Default)]
struct RecordingCallback {
    initialized: Arc<Mutex<Option<usize>>>,
    history: Arc<Mutex<Vec<GenerationStats>>>,
}

impl ProgressCallback for RecordingCallback {
    fn on_initialized(&mut self, population_size: usize) {
        *self.initialized.lock().unwrap() = Some(population_size);
    }

    fn on_generation_complete(&mut self, stats: &GenerationStats) {
        self.history.lock().unwrap().push(stats.clone());
    }
}

/// Registers a late terminal once the given generation starts
struct LateTerminal {
    registry: SharedRegistry,
    at_generation: usize,
    value: &'static str,
}

impl ProgressCallback for LateTerminal {
    fn on_initialized(&mut self, _population_size: usize) {}

    fn on_generation_start(&mut self, generation: usize) {
        if generation == self.at_generation {
            self.registry.write().unwrap().register(self.value);
        }
    }

    fn on_generation_complete(&mut self, _stats: &GenerationStats) {}
}

/// Removes the only terminal of a type once the given generation starts
struct RetiredTerminal {
    registry: SharedRegistry,
    at_generation: usize,
    tag: &'static str,
    value: &'static str,
}

impl ProgressCallback for RetiredTerminal {
    fn on_initialized(&mut self, _population_size: usize) {}

    fn on_generation_start(&mut self, generation: usize) {
        if generation == self.at_generation {
            self.registry
                .write()
                .unwrap()
                .deregister_as(self.tag, &Value::from(self.value))
                .unwrap();
        }
    }

    fn on_generation_complete(&mut self, _stats: &GenerationStats) {}
}

fn lint_registry() -> SharedRegistry {
    let mut registry = query_grammar();
    harvest(&mut registry, &bad_unwrap());
    harvest(&mut registry, &good_expect());
    registry.into_shared()
}

/// Small config that cannot be satisfied, for exercising full runs
fn create_test_evolution_config(seed: u64) -> EvolutionConfig {
    EvolutionConfig {
        population_size: 40,
        max_generations: 8,
        max_tree_depth: 4,
        tournament_size: 3,
        seed: Some(seed),
        ..EvolutionConfig::default()
    }
}

fn words_registry() -> SharedRegistry {
    let mut registry = TypeRegistry::new();
    registry.declare(template("join", "str", &["str", "str"], "{} {}"));
    registry.register("alpha");
    registry.register("beta");
    registry.into_shared()
}

#[test]
fn test_best_score_never_decreases() {
    println!("\n=== Testing best score monotonicity ===");

    let bad = bad_unwrap();
    let recorder = RecordingCallback::default();
    let mut search = Search::new(lint_registry(), QUERY, move |query, a| {
        a.check(bad.matches(query)?)?;
        // Unreachable second assertion keeps every generation running
        a.check(false)
    })
    .with_config(create_test_evolution_config(11))
    .progress(recorder.clone());

    let outcome = search.resolve().unwrap();
    assert!(!outcome.is_satisfied());

    let history = recorder.history.lock().unwrap();
    assert_eq!(*recorder.initialized.lock().unwrap(), Some(40));
    assert_eq!(history.len(), 8);
    for (i, pair) in history.windows(2).enumerate() {
        assert_eq!(pair[0].generation, i);
        assert!(
            pair[1].best_score >= pair[0].best_score,
            "best score dropped after generation {}",
            i
        );
    }
    assert_eq!(outcome.history, *history);
}

#[test]
fn test_same_seed_same_run() {
    println!("\n=== Testing seeded determinism ===");

    let run = |parallel: bool| {
        let good = good_expect();
        let mut search = Search::new(lint_registry(), QUERY, move |query, a| {
            a.check(!good.matches(query)?)?;
            a.check(false)
        })
        .with_config(create_test_evolution_config(5))
        .parallel(parallel)
        .progress(SilentProgressCallback);

        let outcome = search.resolve().unwrap().clone();
        (outcome.history, outcome.best.root.to_formula(), outcome.best.id)
    };

    let sequential = run(false);
    assert_eq!(sequential, run(false));
    assert_eq!(sequential, run(true));
}

#[test]
fn test_exhausted_budget_reports_best_value() {
    let mut search = Search::new(words_registry(), "str", |value, a| {
        a.check(value.as_str().map_or(false, |s| s.contains("alpha")))?;
        a.check(value.as_str() == Some("never"))
    })
    .with_config(create_test_evolution_config(3))
    .progress(SilentProgressCallback);

    match search.resolve_value() {
        Err(LintsynthError::ConvergenceFailure {
            best_score,
            generations,
            best,
        }) => {
            assert_eq!(best_score, 1);
            assert_eq!(generations, 8);
            let best = best.expect("best value is carried");
            assert!(best.as_str().unwrap().contains("alpha"));
        }
        other => panic!("expected convergence failure, got {:?}", other),
    }
}

#[test]
fn test_unconstructible_root_fails_up_front() {
    let mut registry = TypeRegistry::new();
    registry.declare(template("wrap", "query", &["query"], "({})"));
    registry.register("unused");

    let calls = Arc::new(Mutex::new(0usize));
    let counter = calls.clone();
    let mut search = Search::new(registry.into_shared(), "query", move |_, a| {
        *counter.lock().unwrap() += 1;
        a.check(true)
    })
    .progress(SilentProgressCallback);

    let err = search.resolve().unwrap_err();
    assert!(matches!(err, LintsynthError::UnsatisfiableGrammar { .. }));
    assert_eq!(*calls.lock().unwrap(), 0);
}

#[test]
fn test_each_value_scored_once() {
    println!("\n=== Testing memoization across the run ===");

    let seen: Arc<Mutex<HashMap<Value, usize>>> = Arc::default();
    let counter = seen.clone();
    let mut search = Search::new(words_registry(), "str", move |value, a| {
        *counter.lock().unwrap().entry(value.clone()).or_default() += 1;
        a.check(value.as_str().map_or(false, |s| s.len() > 20))?;
        a.check(false)
    })
    .with_config(create_test_evolution_config(8))
    .progress(SilentProgressCallback);

    let outcome = search.resolve().unwrap();
    let seen = seen.lock().unwrap();

    assert!(!seen.is_empty());
    assert!(seen.values().all(|&n| n == 1), "a value was scored twice");
    assert_eq!(outcome.cache.computations, seen.len());
    assert!(outcome.cache.hits > 0);
}

#[test]
fn test_terminal_registered_mid_run_is_used() {
    println!("\n=== Testing registry update during a run ===");

    let registry = words_registry();
    let late = LateTerminal {
        registry: registry.clone(),
        at_generation: 2,
        value: "gamma",
    };
    let config = EvolutionConfig {
        population_size: 60,
        max_generations: 40,
        max_tree_depth: 3,
        mutation_rate: 0.6,
        seed: Some(21),
        ..EvolutionConfig::default()
    };

    let mut search = Search::new(registry.clone(), "str", |value, a| {
        a.check(value.as_str().map_or(false, |s| s.contains("gamma")))
    })
    .with_config(config)
    .progress(late);

    let outcome = search.resolve().unwrap();
    assert!(outcome.is_satisfied());
    assert!(outcome.best.generation >= 2);
    assert!(outcome.history[..2].iter().all(|s| s.best_score == 0));

    let pool = registry.read().unwrap();
    assert_eq!(pool.terminals(&"str".into()).unwrap().multiplicity(&"gamma".into()), 1);
}

#[test]
fn test_independent_searches_run_concurrently() {
    let handles: Vec<_> = ["alpha", "beta"]
        .into_iter()
        .enumerate()
        .map(|(i, word)| {
            std::thread::spawn(move || {
                let mut registry = TypeRegistry::new();
                registry.declare(template("join", "str", &["str", "str"], "{} {}"));
                registry.register(word);
                registry.register("x");

                let mut search = Search::new(registry.into_shared(), "str", move |value, a| {
                    a.check(value.as_str() == Some(format!("{} x", word).as_str()))
                })
                .population_size(30)
                .max_generations(20)
                .max_tree_depth(2)
                .seed(i as u64)
                .progress(SilentProgressCallback);
                search.resolve_value()
            })
        })
        .collect();

    let results: Vec<Value> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();
    assert_eq!(results, vec![Value::from("alpha x"), Value::from("beta x")]);
}

#[test]
fn test_run_survives_unbuildable_subtrees() {
    println!("\n=== Testing construction failures during variation ===");

    let mut registry = TypeRegistry::new();
    registry.declare(template("wrap", "query", &["leaf"], "({})"));
    registry.register_as("leaf", "x");
    let registry = registry.into_shared();

    let retire = RetiredTerminal {
        registry: registry.clone(),
        at_generation: 1,
        tag: "leaf",
        value: "x",
    };
    let config = EvolutionConfig {
        population_size: 20,
        max_generations: 5,
        mutation_rate: 1.0,
        seed: Some(1),
        ..EvolutionConfig::default()
    };

    let mut search = Search::new(registry.clone(), "query", |value, a| {
        a.check(value.as_str().is_some())?;
        a.check(false)
    })
    .with_config(config)
    .progress(retire);

    let outcome = search.resolve().unwrap();
    assert_eq!(outcome.generations(), 5);
    assert_eq!(outcome.score(), 1);
    assert!(registry.read().unwrap().min_depth(&"query".into()).is_none());
}

#[test]
fn test_panicking_operation_does_not_abort_run() {
    println!("\n=== Testing panics inside grammar operations ===");

    let mut registry = TypeRegistry::new();
    registry.declare(FunctionSpec::new(
        "div",
        "int",
        vec!["int".into(), "int".into()],
        |args| Ok(Value::Int(args[0].as_int().unwrap_or(0) / args[1].as_int().unwrap_or(0))),
    ));
    registry.register(0);
    registry.register(6);

    let mut search = Search::new(registry.into_shared(), "int", |value, a| {
        a.check(value.as_int() == Some(3))
    })
    .population_size(50)
    .max_generations(5)
    .seed(1)
    .parallel(true)
    .progress(SilentProgressCallback);

    let outcome = search.resolve().unwrap();
    assert_eq!(outcome.generations(), 5);
    assert!(outcome.history.iter().any(|s| s.invalid > 0));
    assert!(!outcome.is_satisfied());
}
