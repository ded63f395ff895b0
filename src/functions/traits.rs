use crate::types::{TypeTag, Value};
use anyhow::Result;
use std::fmt;
use std::sync::Arc;

/// Operation applied to already materialized argument values.
pub type Operation = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// A typed function of the grammar.
///
/// Immutable once declared; call nodes share it through an `Arc`.
#[derive(Clone)]
pub struct FunctionSpec {
    alias: String,
    input_types: Vec<TypeTag>,
    output_type: TypeTag,
    operation: Operation,
}

impl FunctionSpec {
    pub fn new<F>(
        alias: impl Into<String>,
        output_type: impl Into<TypeTag>,
        input_types: Vec<TypeTag>,
        operation: F,
    ) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            alias: alias.into(),
            input_types,
            output_type: output_type.into(),
            operation: Arc::new(operation),
        }
    }

    /// Name used in the registry and in rendered trees
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn arity(&self) -> usize {
        self.input_types.len()
    }

    pub fn input_types(&self) -> &[TypeTag] {
        &self.input_types
    }

    pub fn output_type(&self) -> &TypeTag {
        &self.output_type
    }

    /// Apply the operation. Arguments must already match `input_types`.
    pub fn execute(&self, args: &[Value]) -> Result<Value> {
        (self.operation)(args)
    }
}

impl fmt::Debug for FunctionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionSpec")
            .field("alias", &self.alias)
            .field("input_types", &self.input_types)
            .field("output_type", &self.output_type)
            .finish_non_exhaustive()
    }
}

impl PartialEq for FunctionSpec {
    fn eq(&self, other: &Self) -> bool {
        self.alias == other.alias
            && self.input_types == other.input_types
            && self.output_type == other.output_type
    }
}
