pub mod traits;
pub mod evolution;
pub mod manager;

pub use manager::{ConfigManager, AppConfig};
pub use evolution::{EvolutionConfig, SelectionMethod};
pub use traits::{ConfigSection, ConfigManifest, FieldManifest};
