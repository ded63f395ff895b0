use super::traits::FunctionSpec;
use crate::types::{TypeTag, Value};
use anyhow::bail;

fn tags(inputs: &[&str]) -> Vec<TypeTag> {
    inputs.iter().map(|&t| TypeTag::from(t)).collect()
}

// --- String templates ---

/// Function rendering `pattern` with each `{}` replaced by the next argument.
///
/// `template("eq", "predicate", &["attr", "literal"], "@{}='{}'")` renders
/// `@name='unwrap'`. Query grammars are usually a handful of these.
pub fn template(alias: &str, output: &str, inputs: &[&str], pattern: &str) -> FunctionSpec {
    let pieces: Vec<String> = pattern.split("{}").map(str::to_string).collect();
    let alias_owned = alias.to_string();
    FunctionSpec::new(alias, output, tags(inputs), move |args| {
        if pieces.len() != args.len() + 1 {
            bail!(
                "template {} has {} holes but received {} arguments",
                alias_owned,
                pieces.len() - 1,
                args.len()
            );
        }
        let mut rendered = pieces[0].clone();
        for (arg, piece) in args.iter().zip(&pieces[1..]) {
            rendered.push_str(&arg.to_string());
            rendered.push_str(piece);
        }
        Ok(Value::Str(rendered))
    })
}

// --- S-expressions ---

/// Function producing the list `(alias arg...)`.
pub fn sexpr(alias: &str, output: &str, inputs: &[&str]) -> FunctionSpec {
    let head = Value::from(alias);
    FunctionSpec::new(alias, output, tags(inputs), move |args| {
        let mut items = Vec::with_capacity(args.len() + 1);
        items.push(head.clone());
        items.extend(args.iter().cloned());
        Ok(Value::List(items))
    })
}
