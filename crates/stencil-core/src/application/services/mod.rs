//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish
//! high-level use cases like "apply a recipe" or "detect the framework".

pub mod executor;
pub mod probe;

pub use executor::{ExecutorOptions, StepExecutor};
pub use probe::FrameworkProbe;
