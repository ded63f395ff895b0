use super::traits::FunctionSpec;
use crate::error::{LintsynthError, Result};
use crate::types::{TypeTag, Value};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Registry shared between a search and the caller that owns it.
pub type SharedRegistry = Arc<RwLock<TypeRegistry>>;

/// Multiset of terminal values for one type, kept in insertion order so that
/// seeded sampling is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminalPool {
    entries: Vec<(Value, usize)>,
}

impl TerminalPool {
    fn insert(&mut self, value: Value) {
        match self.entries.iter_mut().find(|(v, _)| *v == value) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((value, 1)),
        }
    }

    fn remove(&mut self, value: &Value) -> bool {
        let Some(pos) = self.entries.iter().position(|(v, _)| v == value) else {
            return false;
        };
        if self.entries[pos].1 > 1 {
            self.entries[pos].1 -= 1;
        } else {
            self.entries.remove(pos);
        }
        true
    }

    pub fn multiplicity(&self, value: &Value) -> usize {
        self.entries
            .iter()
            .find(|(v, _)| v == value)
            .map_or(0, |(_, count)| *count)
    }

    /// Total number of occurrences, counting duplicates
    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, usize)> {
        self.entries.iter().map(|(v, count)| (v, *count))
    }

    /// Pick a value at random, weighted by multiplicity
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Option<&Value> {
        let weights = WeightedIndex::new(self.entries.iter().map(|(_, count)| *count)).ok()?;
        Some(&self.entries[weights.sample(rng)].0)
    }
}

/// Everything tree construction may use to produce a node of one type.
#[derive(Debug, Clone, Copy)]
pub struct Candidates<'a> {
    pub functions: &'a [Arc<FunctionSpec>],
    pub terminals: Option<&'a TerminalPool>,
}

impl Candidates<'_> {
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.terminals.map_or(true, TerminalPool::is_empty)
    }
}

/// Per-type pools of terminals and typed functions for one search session.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    terminals: BTreeMap<TypeTag, TerminalPool>,
    functions: BTreeMap<TypeTag, Vec<Arc<FunctionSpec>>>,
    // Least depth at which each type can be built; refreshed on every mutation.
    min_depths: BTreeMap<TypeTag, usize>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(RwLock::new(self))
    }

    /// Register one occurrence of `value` under its inferred type.
    pub fn register(&mut self, value: impl Into<Value>) -> TypeTag {
        let value = value.into();
        let tag = value.inferred_tag();
        self.register_as(tag.clone(), value);
        tag
    }

    /// Register one occurrence of `value` under an explicit type.
    pub fn register_as(&mut self, tag: impl Into<TypeTag>, value: impl Into<Value>) {
        self.terminals
            .entry(tag.into())
            .or_default()
            .insert(value.into());
        self.refresh_depths();
    }

    /// Remove one occurrence of `value` from its inferred type's pool.
    pub fn deregister(&mut self, value: &Value) -> Result<()> {
        self.deregister_as(value.inferred_tag(), value)
    }

    pub fn deregister_as(&mut self, tag: impl Into<TypeTag>, value: &Value) -> Result<()> {
        let tag = tag.into();
        let removed = self
            .terminals
            .get_mut(&tag)
            .map_or(false, |pool| pool.remove(value));

        if !removed {
            return Err(LintsynthError::UnknownTerminal {
                tag,
                value: value.clone(),
            });
        }

        if self.terminals.get(&tag).map_or(false, TerminalPool::is_empty) {
            self.terminals.remove(&tag);
        }
        self.refresh_depths();
        Ok(())
    }

    /// Declare a typed function, replacing any earlier one with the same alias.
    pub fn declare(&mut self, spec: FunctionSpec) -> Arc<FunctionSpec> {
        self.remove_function(spec.alias());
        let spec = Arc::new(spec);
        self.functions
            .entry(spec.output_type().clone())
            .or_default()
            .push(Arc::clone(&spec));
        self.refresh_depths();
        spec
    }

    /// Remove a function by alias. Trees already holding it keep their copy.
    pub fn retract(&mut self, alias: &str) -> Option<Arc<FunctionSpec>> {
        let removed = self.remove_function(alias);
        if removed.is_some() {
            self.refresh_depths();
        }
        removed
    }

    fn remove_function(&mut self, alias: &str) -> Option<Arc<FunctionSpec>> {
        let mut removed = None;
        for specs in self.functions.values_mut() {
            if let Some(pos) = specs.iter().position(|f| f.alias() == alias) {
                removed = Some(specs.remove(pos));
                break;
            }
        }
        self.functions.retain(|_, specs| !specs.is_empty());
        removed
    }

    pub fn get_function(&self, alias: &str) -> Option<Arc<FunctionSpec>> {
        self.functions
            .values()
            .flatten()
            .find(|f| f.alias() == alias)
            .cloned()
    }

    pub fn functions_returning(&self, tag: &TypeTag) -> &[Arc<FunctionSpec>] {
        self.functions.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn terminals(&self, tag: &TypeTag) -> Option<&TerminalPool> {
        self.terminals.get(tag)
    }

    pub fn candidates_for(&self, tag: &TypeTag) -> Candidates<'_> {
        Candidates {
            functions: self.functions_returning(tag),
            terminals: self.terminals(tag),
        }
    }

    /// Least tree depth at which `tag` can be constructed, if at all.
    pub fn min_depth(&self, tag: &TypeTag) -> Option<usize> {
        self.min_depths.get(tag).copied()
    }

    /// Least depth of a call node to `spec`, given current terminals and functions.
    pub fn function_depth(&self, spec: &FunctionSpec) -> Option<usize> {
        call_depth(spec, &self.min_depths)
    }

    pub fn is_constructible(&self, tag: &TypeTag, max_depth: usize) -> bool {
        self.min_depth(tag).map_or(false, |d| d <= max_depth)
    }

    fn refresh_depths(&mut self) {
        let mut depths: BTreeMap<TypeTag, usize> = self
            .terminals
            .iter()
            .filter(|(_, pool)| !pool.is_empty())
            .map(|(tag, _)| (tag.clone(), 0))
            .collect();

        loop {
            let mut changed = false;
            for spec in self.functions.values().flatten() {
                let Some(depth) = call_depth(spec, &depths) else {
                    continue;
                };
                match depths.get(spec.output_type()) {
                    Some(&current) if current <= depth => {}
                    _ => {
                        depths.insert(spec.output_type().clone(), depth);
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }

        self.min_depths = depths;
    }
}

fn call_depth(spec: &FunctionSpec, depths: &BTreeMap<TypeTag, usize>) -> Option<usize> {
    let mut deepest: Option<usize> = None;
    for tag in spec.input_types() {
        let d = *depths.get(tag)?;
        deepest = Some(deepest.map_or(d, |m| m.max(d)));
    }
    Some(deepest.map_or(0, |m| m + 1))
}
