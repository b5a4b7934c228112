pub mod catalog;
pub mod client;
pub mod options;

pub use catalog::ModelCatalog;
pub use client::{GenerationBackend, OllamaClient};
pub use options::DecodingOptions;
