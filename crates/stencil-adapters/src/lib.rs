//! Infrastructure adapters for Stencil.
//!
//! This crate implements the ports defined in `stencil-core::application::ports`.
//! It contains all external dependencies and I/O operations: the disk,
//! spawned processes and recipe files.

pub mod filesystem;
pub mod recipe_loader;
pub mod tools;

// Re-export commonly used adapters
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use recipe_loader::{LoadedRecipe, RecipeLoader};
pub use tools::{ScriptedTools, SystemTools};
