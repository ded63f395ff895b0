pub mod primitives;
pub mod registry;
pub mod traits;

pub use registry::{Candidates, SharedRegistry, TerminalPool, TypeRegistry};
pub use traits::{FunctionSpec, Operation};
