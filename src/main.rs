use anyhow::Context;
use lintsynth::engines::generation::ConsoleProgressCallback;
use lintsynth::{ConfigManager, FunctionSpec, Search, TypeRegistry, Value};

const TARGET: i64 = 42;

fn int_op(alias: &str, op: fn(i64, i64) -> Option<i64>) -> FunctionSpec {
    let name = alias.to_string();
    FunctionSpec::new(alias, "int", vec!["int".into(), "int".into()], move |args| {
        let (a, b) = match (args[0].as_int(), args[1].as_int()) {
            (Some(a), Some(b)) => (a, b),
            _ => anyhow::bail!("{} expects two integers", name),
        };
        op(a, b)
            .map(Value::Int)
            .with_context(|| format!("{} overflowed on {} and {}", name, a, b))
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let manager = ConfigManager::new();
    match std::env::args().nth(1) {
        Some(path) => manager
            .load_from_file(&path)
            .with_context(|| format!("loading {}", path))?,
        None => manager.load_from_env()?,
    }
    let config = manager.get().evolution;

    let mut registry = TypeRegistry::new();
    registry.declare(int_op("add", i64::checked_add));
    registry.declare(int_op("sub", i64::checked_sub));
    registry.declare(int_op("mul", i64::checked_mul));
    for n in 1..=9 {
        registry.register(n);
    }

    let mut search = Search::new(registry.into_shared(), "int", |value, a| {
        let n = value.as_int().unwrap_or_default();
        a.check(n > 0)?;
        a.check(n % 2 == 0)?;
        a.check(n % 3 == 0)?;
        a.check(n == TARGET)
    })
    .with_config(config)
    .progress(ConsoleProgressCallback);

    let outcome = search.resolve()?;
    println!("Best expression: {}", outcome.best.root);
    for candidate in &outcome.hall_of_fame {
        println!("  {:>3}  {} = {}", candidate.record.score, candidate.formula, candidate.value);
    }

    let value = search.resolve_value()?;
    println!("Found {}", value);
    Ok(())
}
