use crate::config::EvolutionConfig;
use crate::engines::generation::ast::ExpressionNode;
use crate::error::{LintsynthError, Result};
use crate::functions::{FunctionSpec, TypeRegistry};
use crate::types::TypeTag;
use rand::Rng;
use std::sync::Arc;

/// Grows random, well-typed expression trees from a registry.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    max_depth: usize,
    terminal_bias: f64,
    attempts: usize,
    restarts: usize,
}

impl TreeBuilder {
    pub fn new(max_depth: usize, terminal_bias: f64) -> Self {
        Self {
            max_depth,
            terminal_bias: terminal_bias.clamp(0.0, 1.0),
            attempts: 8,
            restarts: 16,
        }
    }

    pub fn from_config(config: &EvolutionConfig) -> Self {
        Self::new(config.max_tree_depth, config.terminal_bias)
            .with_retries(config.construction_attempts, config.construction_restarts)
    }

    /// Per-node retry budget and whole-tree restart budget.
    pub fn with_retries(mut self, attempts: usize, restarts: usize) -> Self {
        self.attempts = attempts.max(1);
        self.restarts = restarts.max(1);
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Build a tree of type `target` within the configured depth.
    pub fn build<R: Rng>(
        &self,
        registry: &TypeRegistry,
        target: &TypeTag,
        rng: &mut R,
    ) -> Result<ExpressionNode> {
        self.build_within(registry, target, self.max_depth, rng)
    }

    /// Build a tree of type `target` no deeper than `depth`.
    ///
    /// Fails with `Generation` once every restart is exhausted; the failure
    /// only concerns this call.
    pub fn build_within<R: Rng>(
        &self,
        registry: &TypeRegistry,
        target: &TypeTag,
        depth: usize,
        rng: &mut R,
    ) -> Result<ExpressionNode> {
        for restart in 0..self.restarts {
            if let Some(node) = self.build_expression(registry, target, depth, rng) {
                return Ok(node);
            }
            log::debug!("Restarting construction of `{}` (attempt {})", target, restart + 1);
        }

        Err(LintsynthError::Generation(format!(
            "could not build `{}` within depth {} after {} restarts",
            target, depth, self.restarts
        )))
    }

    /// Recursively build an expression of the desired type
    fn build_expression<R: Rng>(
        &self,
        registry: &TypeRegistry,
        desired: &TypeTag,
        depth: usize,
        rng: &mut R,
    ) -> Option<ExpressionNode> {
        let candidates = registry.candidates_for(desired);
        let terminals = candidates.terminals.filter(|pool| !pool.is_empty());

        // Only functions whose arguments can still be built below this depth
        let functions: Vec<&Arc<FunctionSpec>> = candidates
            .functions
            .iter()
            .filter(|f| registry.function_depth(f).map_or(false, |d| d <= depth))
            .collect();

        for _ in 0..self.attempts {
            let want_leaf = depth == 0 || rng.gen_bool(self.terminal_bias);

            if want_leaf || functions.is_empty() {
                if let Some(value) = terminals.and_then(|pool| pool.sample(rng)) {
                    return Some(ExpressionNode::terminal(desired.clone(), value.clone()));
                }
            }

            if functions.is_empty() {
                continue;
            }

            let function = functions[rng.gen_range(0..functions.len())];
            let args = function
                .input_types()
                .iter()
                .map(|arg_type| self.build_expression(registry, arg_type, depth.saturating_sub(1), rng))
                .collect::<Option<Vec<_>>>();

            if let Some(args) = args {
                return Some(ExpressionNode::call(Arc::clone(function), args));
            }
        }

        None
    }
}
