//! Adapters layer: repository implementations.

pub mod file;
pub mod memory;

pub use file::JsonFileRepository;
pub use memory::InMemoryRepository;
