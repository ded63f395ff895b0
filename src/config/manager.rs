use super::{evolution::EvolutionConfig, traits::ConfigSection};
use crate::error::LintsynthError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// Prefix for environment overrides, e.g. `LINTSYNTH_EVOLUTION__POPULATION_SIZE`.
pub const ENV_PREFIX: &str = "LINTSYNTH";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub evolution: EvolutionConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), LintsynthError> {
        self.evolution.validate()?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    /// Layer the TOML file at `path` under `LINTSYNTH_*` environment
    /// overrides, validate, and replace the current configuration.
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), LintsynthError> {
        let path = path.as_ref();
        let config: AppConfig = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .add_source(Self::environment())
            .build()?
            .try_deserialize()?;

        config.validate()?;
        log::info!("Loaded configuration from {}", path.display());

        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
        Ok(())
    }

    /// Defaults with only environment overrides applied.
    pub fn load_from_env(&self) -> Result<(), LintsynthError> {
        let config: AppConfig = ::config::Config::builder()
            .add_source(Self::environment())
            .build()?
            .try_deserialize()?;

        config.validate()?;
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
        Ok(())
    }

    fn environment() -> ::config::Environment {
        ::config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), LintsynthError> {
        let config = self.get();
        let toml_str = toml::to_string_pretty(&config)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn get(&self) -> AppConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply `f` and keep the result only if it validates.
    pub fn update<F>(&self, f: F) -> Result<(), LintsynthError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut guard = self.config.write().unwrap_or_else(PoisonError::into_inner);
        let mut candidate = guard.clone();
        f(&mut candidate);
        candidate.validate()?;
        *guard = candidate;
        Ok(())
    }
}
