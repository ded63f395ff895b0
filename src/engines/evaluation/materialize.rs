use crate::engines::generation::ExpressionNode;
use crate::error::{LintsynthError, Result};
use crate::types::{TypeTag, Value};

/// Evaluate a tree bottom-up, children left to right in declaration order.
///
/// Every call node is re-checked for arity and argument types before its
/// operation runs; trees built by `TreeBuilder` always pass.
pub fn materialize(node: &ExpressionNode) -> Result<Value> {
    match node {
        ExpressionNode::Terminal { value, .. } => Ok(value.clone()),
        ExpressionNode::Call { function, args } => {
            if args.len() != function.arity() {
                return Err(LintsynthError::InvalidAst(format!(
                    "Function {} expects {} args, got {}",
                    function.alias(),
                    function.arity(),
                    args.len()
                )));
            }

            for (arg, expected) in args.iter().zip(function.input_types()) {
                if arg.tag() != expected {
                    return Err(LintsynthError::TypeMismatch {
                        expected: expected.clone(),
                        actual: arg.tag().clone(),
                    });
                }
            }

            let values = args.iter().map(materialize).collect::<Result<Vec<_>>>()?;

            function.execute(&values).map_err(|e| {
                LintsynthError::Computation(format!("{}: {}", function.alias(), e))
            })
        }
    }
}

/// Materialize a tree that must produce `target` at its root.
pub fn materialize_as(node: &ExpressionNode, target: &TypeTag) -> Result<Value> {
    if node.tag() != target {
        return Err(LintsynthError::TypeMismatch {
            expected: target.clone(),
            actual: node.tag().clone(),
        });
    }
    materialize(node)
}
