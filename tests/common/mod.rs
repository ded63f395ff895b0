//! Toy structural query engine shared by the integration tests.
//!
//! A document is a flat list of nodes, each with a kind and string
//! attributes. Queries are s-expressions built by the grammar below:
//! `(has kind)`, `(attr_eq kind attr literal)`, `(not q)`, `(and q q)`,
//! `(or q q)`.
#![allow(dead_code)]

use anyhow::{anyhow, bail, Result};
use lintsynth::functions::primitives::sexpr;
use lintsynth::{TypeRegistry, Value};
use std::collections::BTreeMap;

pub const QUERY: &str = "query";

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: String,
    pub attrs: BTreeMap<String, String>,
}

pub fn node(kind: &str, attrs: &[(&str, &str)]) -> Node {
    Node {
        kind: kind.to_string(),
        attrs: attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub nodes: Vec<Node>,
}

impl Document {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Evaluate a materialized query against this document.
    pub fn matches(&self, query: &Value) -> Result<bool> {
        let items = query
            .as_list()
            .ok_or_else(|| anyhow!("query must be a list, got {}", query))?;
        let (head, args) = items
            .split_first()
            .ok_or_else(|| anyhow!("empty query"))?;
        match head.as_str() {
            Some("has") => {
                let kind = text(args, 0)?;
                Ok(self.nodes.iter().any(|n| n.kind == kind))
            }
            Some("attr_eq") => {
                let (kind, attr, literal) = (text(args, 0)?, text(args, 1)?, text(args, 2)?);
                Ok(self.nodes.iter().any(|n| {
                    n.kind == kind && n.attrs.get(attr).map_or(false, |v| v == literal)
                }))
            }
            Some("not") => Ok(!self.matches(sub(args, 0)?)?),
            Some("and") => Ok(self.matches(sub(args, 0)?)? && self.matches(sub(args, 1)?)?),
            Some("or") => Ok(self.matches(sub(args, 0)?)? || self.matches(sub(args, 1)?)?),
            _ => bail!("unknown query operator in {}", query),
        }
    }
}

fn text(args: &[Value], i: usize) -> Result<&str> {
    args.get(i)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("argument {} is not a string", i))
}

fn sub(args: &[Value], i: usize) -> Result<&Value> {
    args.get(i).ok_or_else(|| anyhow!("missing operand {}", i))
}

/// Query grammar with no terminals registered yet.
pub fn query_grammar() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.declare(sexpr("has", QUERY, &["kind"]));
    registry.declare(sexpr("attr_eq", QUERY, &["kind", "attr", "literal"]));
    registry.declare(sexpr("not", QUERY, &[QUERY]));
    registry.declare(sexpr("and", QUERY, &[QUERY, QUERY]));
    registry.declare(sexpr("or", QUERY, &[QUERY, QUERY]));
    registry
}

/// Register every kind, attribute name and attribute value in `doc`.
pub fn harvest(registry: &mut TypeRegistry, doc: &Document) {
    for n in &doc.nodes {
        registry.register_as("kind", n.kind.as_str());
        for (attr, value) in &n.attrs {
            registry.register_as("attr", attr.as_str());
            registry.register_as("literal", value.as_str());
        }
    }
}

pub fn bad_unwrap() -> Document {
    Document::new(vec![
        node("Call", &[("name", "unwrap")]),
        node("Ident", &[("name", "result")]),
    ])
}

pub fn good_expect() -> Document {
    Document::new(vec![
        node("Call", &[("name", "expect")]),
        node("Ident", &[("name", "result")]),
    ])
}
