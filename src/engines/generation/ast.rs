use crate::engines::evaluation::FitnessRecord;
use crate::functions::FunctionSpec;
use crate::types::{TypeTag, Value};
use std::fmt;
use std::sync::Arc;

/// Typed expression tree node.
///
/// A `Call` owns its children; subtrees are never shared between trees.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionNode {
    Terminal {
        tag: TypeTag,
        value: Value,
    },
    Call {
        function: Arc<FunctionSpec>,
        args: Vec<ExpressionNode>,
    },
}

impl ExpressionNode {
    pub fn terminal(tag: impl Into<TypeTag>, value: impl Into<Value>) -> Self {
        ExpressionNode::Terminal {
            tag: tag.into(),
            value: value.into(),
        }
    }

    pub fn call(function: Arc<FunctionSpec>, args: Vec<ExpressionNode>) -> Self {
        ExpressionNode::Call { function, args }
    }

    /// Declared type of this node
    pub fn tag(&self) -> &TypeTag {
        match self {
            ExpressionNode::Terminal { tag, .. } => tag,
            ExpressionNode::Call { function, .. } => function.output_type(),
        }
    }

    fn children(&self) -> &[ExpressionNode] {
        match self {
            ExpressionNode::Terminal { .. } => &[],
            ExpressionNode::Call { args, .. } => args,
        }
    }

    /// Number of nodes in the tree
    pub fn size(&self) -> usize {
        1 + self.children().iter().map(ExpressionNode::size).sum::<usize>()
    }

    /// Height of the tree; leaves (terminals and nullary calls) have depth 0.
    pub fn depth(&self) -> usize {
        self.children()
            .iter()
            .map(ExpressionNode::depth)
            .max()
            .map_or(0, |d| d + 1)
    }

    /// Preorder listing of every node: (index, type, distance from root).
    pub fn positions(&self) -> Vec<NodePosition> {
        let mut out = Vec::with_capacity(self.size());
        self.collect_positions(0, &mut out);
        out
    }

    fn collect_positions(&self, level: usize, out: &mut Vec<NodePosition>) {
        out.push(NodePosition {
            index: out.len(),
            tag: self.tag().clone(),
            level,
        });
        for child in self.children() {
            child.collect_positions(level + 1, out);
        }
    }

    /// Subtree at a preorder index
    pub fn subtree(&self, index: usize) -> Option<&ExpressionNode> {
        let mut remaining = index;
        self.find(&mut remaining)
    }

    fn find(&self, remaining: &mut usize) -> Option<&ExpressionNode> {
        if *remaining == 0 {
            return Some(self);
        }
        *remaining -= 1;
        for child in self.children() {
            if let Some(found) = child.find(remaining) {
                return Some(found);
            }
        }
        None
    }

    fn find_mut(&mut self, remaining: &mut usize) -> Option<&mut ExpressionNode> {
        if *remaining == 0 {
            return Some(self);
        }
        *remaining -= 1;
        if let ExpressionNode::Call { args, .. } = self {
            for child in args.iter_mut() {
                if let Some(found) = child.find_mut(remaining) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Replace the subtree at a preorder index, returning the old one.
    pub fn replace(&mut self, index: usize, replacement: ExpressionNode) -> Option<ExpressionNode> {
        let mut remaining = index;
        self.find_mut(&mut remaining)
            .map(|slot| std::mem::replace(slot, replacement))
    }

    /// Compact formula, e.g. `filter(Call, eq(name, unwrap))`
    pub fn to_formula(&self) -> String {
        match self {
            ExpressionNode::Terminal { value, .. } => value.to_string(),
            ExpressionNode::Call { function, args } => {
                let rendered: Vec<String> = args.iter().map(ExpressionNode::to_formula).collect();
                format!("{}({})", function.alias(), rendered.join(", "))
            }
        }
    }

    /// Formula truncated to `max_len` characters
    pub fn to_formula_short(&self, max_len: usize) -> String {
        let formula = self.to_formula();
        if formula.chars().count() <= max_len {
            return formula;
        }
        let truncated: String = formula.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

impl fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_formula())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePosition {
    pub index: usize,
    pub tag: TypeTag,
    pub level: usize,
}

/// One candidate program in the population.
#[derive(Debug, Clone)]
pub struct Individual {
    pub id: u64,
    pub born: usize,
    pub root: ExpressionNode,
    /// Valid only for the generation in which it was computed.
    pub fitness: Option<FitnessRecord>,
}

impl Individual {
    pub fn new(id: u64, born: usize, root: ExpressionNode) -> Self {
        Self {
            id,
            born,
            root,
            fitness: None,
        }
    }

    pub fn score(&self) -> u32 {
        self.fitness.as_ref().map_or(0, |f| f.score)
    }

    pub fn is_satisfied(&self) -> bool {
        self.fitness.as_ref().map_or(false, |f| f.satisfied)
    }
}
