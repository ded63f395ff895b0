use super::traits::{ConfigSection, ConfigManifest, FieldManifest};
use crate::error::LintsynthError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub max_generations: usize,
    pub max_tree_depth: usize,
    /// Probability of closing a branch with a terminal when both a terminal
    /// and a function could fill the slot.
    pub terminal_bias: f64,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    pub selection_method: SelectionMethod,
    pub tournament_size: usize,
    pub elitism_count: usize,
    /// Candidate draws per node before the node gives up.
    pub construction_attempts: usize,
    /// Whole-tree restarts before construction reports a generation error.
    pub construction_restarts: usize,
    pub parallel_evaluation: bool,
    pub hall_of_fame_size: usize,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionMethod {
    Tournament,
    Roulette,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 250,
            max_generations: 50,
            max_tree_depth: 6,
            terminal_bias: 0.5,
            mutation_rate: 0.1,
            crossover_rate: 0.9,
            selection_method: SelectionMethod::Tournament,
            tournament_size: 7,
            elitism_count: 1,
            construction_attempts: 8,
            construction_restarts: 16,
            parallel_evaluation: true,
            hall_of_fame_size: 5,
            seed: None,
        }
    }
}

fn check_probability(name: &str, value: f64) -> Result<(), LintsynthError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(LintsynthError::Configuration(format!(
            "{} must be between 0 and 1, got {}",
            name, value
        )));
    }
    Ok(())
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<(), LintsynthError> {
        if self.population_size < 2 {
            return Err(LintsynthError::Configuration(
                "Population size must be at least 2".to_string(),
            ));
        }
        if self.max_generations == 0 {
            return Err(LintsynthError::Configuration(
                "At least one generation is required".to_string(),
            ));
        }
        if self.elitism_count == 0 {
            return Err(LintsynthError::Configuration(
                "Elitism count must be at least 1".to_string(),
            ));
        }
        if self.elitism_count >= self.population_size {
            return Err(LintsynthError::Configuration(format!(
                "Elitism count {} must be smaller than the population size {}",
                self.elitism_count, self.population_size
            )));
        }
        if self.tournament_size == 0 {
            return Err(LintsynthError::Configuration(
                "Tournament size must be at least 1".to_string(),
            ));
        }
        check_probability("Terminal bias", self.terminal_bias)?;
        check_probability("Mutation rate", self.mutation_rate)?;
        check_probability("Crossover rate", self.crossover_rate)?;
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        use serde_json::json;

        ConfigManifest {
            section: "Evolution".to_string(),
            fields: vec![
                FieldManifest::new(
                    "population_size",
                    "integer",
                    json!(self.population_size),
                    "Number of expression trees per generation",
                )
                .bounded(2.0, 100_000.0),
                FieldManifest::new(
                    "max_generations",
                    "integer",
                    json!(self.max_generations),
                    "Generation budget before giving up",
                )
                .bounded(1.0, 10_000.0),
                FieldManifest::new(
                    "max_tree_depth",
                    "integer",
                    json!(self.max_tree_depth),
                    "Deepest allowed tree; a lone terminal has depth 0",
                )
                .bounded(0.0, 32.0),
                FieldManifest::new(
                    "terminal_bias",
                    "float",
                    json!(self.terminal_bias),
                    "Chance of preferring a terminal over a function",
                )
                .bounded(0.0, 1.0),
                FieldManifest::new(
                    "mutation_rate",
                    "float",
                    json!(self.mutation_rate),
                    "Per-child probability of subtree mutation",
                )
                .bounded(0.0, 1.0),
                FieldManifest::new(
                    "crossover_rate",
                    "float",
                    json!(self.crossover_rate),
                    "Probability of crossover instead of reproduction",
                )
                .bounded(0.0, 1.0),
                FieldManifest::new(
                    "selection_method",
                    "enum",
                    json!(self.selection_method),
                    "Tournament or Roulette",
                ),
                FieldManifest::new(
                    "tournament_size",
                    "integer",
                    json!(self.tournament_size),
                    "Contestants per tournament",
                )
                .bounded(1.0, 100.0),
                FieldManifest::new(
                    "elitism_count",
                    "integer",
                    json!(self.elitism_count),
                    "Best individuals copied unchanged into the next generation",
                )
                .bounded(1.0, 1000.0),
                FieldManifest::new(
                    "construction_attempts",
                    "integer",
                    json!(self.construction_attempts),
                    "Candidate draws per node",
                ),
                FieldManifest::new(
                    "construction_restarts",
                    "integer",
                    json!(self.construction_restarts),
                    "Whole-tree restarts per construction",
                ),
                FieldManifest::new(
                    "parallel_evaluation",
                    "bool",
                    json!(self.parallel_evaluation),
                    "Evaluate individuals on the rayon pool",
                ),
                FieldManifest::new(
                    "hall_of_fame_size",
                    "integer",
                    json!(self.hall_of_fame_size),
                    "Distinct best values kept across the run",
                ),
                FieldManifest::new("seed", "integer", json!(self.seed), "Fixed RNG seed"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EvolutionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range() {
        let cases = [
            EvolutionConfig { mutation_rate: 1.5, ..Default::default() },
            EvolutionConfig { crossover_rate: -0.1, ..Default::default() },
            EvolutionConfig { population_size: 0, ..Default::default() },
            EvolutionConfig { max_generations: 0, ..Default::default() },
            EvolutionConfig { elitism_count: 0, ..Default::default() },
            EvolutionConfig { tournament_size: 0, ..Default::default() },
            EvolutionConfig { population_size: 1, ..Default::default() },
            EvolutionConfig { population_size: 4, elitism_count: 4, ..Default::default() },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(LintsynthError::Configuration(_))),
                "{:?} should be rejected",
                config
            );
        }
    }

    #[test]
    fn test_smallest_population_accepted() {
        let config = EvolutionConfig { population_size: 2, ..Default::default() };
        assert!(config.validate().is_ok());
        let bound = config.to_manifest().fields[0].min;
        assert_eq!(bound, Some(2.0));
    }

    #[test]
    fn test_manifest_lists_every_field() {
        let config = EvolutionConfig::default();
        let manifest = config.to_manifest();
        let fields = serde_json::to_value(&config).unwrap();

        assert_eq!(manifest.fields.len(), fields.as_object().unwrap().len());
        let population = &manifest.fields[0];
        assert_eq!(population.name, "population_size");
        assert_eq!(population.default, serde_json::json!(250));
    }
}
