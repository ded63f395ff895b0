pub mod ast;
pub mod tree_builder;
pub mod operators;
pub mod population;
pub mod hall_of_fame;
pub mod progress;
pub mod evolution_engine;
pub mod search;

pub use ast::*;
pub use tree_builder::TreeBuilder;
pub use population::{Champion, GenerationStats, Population};
pub use hall_of_fame::{EliteCandidate, HallOfFame};
pub use evolution_engine::{EvolutionEngine, SearchOutcome, SearchStatus};
pub use progress::{
    ChannelProgressCallback, ConsoleProgressCallback, LogProgressCallback, ProgressCallback,
    ProgressMessage, SilentProgressCallback,
};
pub use search::Search;
