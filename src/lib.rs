// Main lib.rs file that exports our modules
pub mod chunker;
pub mod config;
pub mod diff;
pub mod directories;
pub mod extractor;
pub mod indexer;
pub mod llm;
pub mod service;
pub mod store;

// Re-export commonly used items for convenience
pub use config::Config;
pub use llm::LlmClient;
