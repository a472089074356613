//! proctor-store — In-process collaborator implementations.
//!
//! Implements the `AttemptStore` and `CatalogReader` traits for
//! single-process deployments and for tests: a transactional in-memory
//! record store, an in-memory catalog, and a fault-injecting store
//! decorator for exercising retry and timeout paths.

pub mod catalog;
pub mod faulty;
pub mod memory;

pub use catalog::MemoryCatalog;
pub use faulty::FaultyStore;
pub use memory::MemoryStore;
