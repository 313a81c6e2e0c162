// Library interface for the Achilles decoder components

pub mod batch;
pub mod config;
pub mod decoder;
pub mod error;
pub mod input;
pub mod metrics;
pub mod model;
pub mod reshape;
pub mod schema_ref;
pub mod snapshot;
pub mod vocabulary;

// Test fixtures for synthetic tabular data generation
pub mod test_fixtures;

// Re-export commonly used types
pub use config::AppConfig;
pub use decoder::{ResultDecoder, NO_MATCHING_CONCEPT};
pub use error::{DecodeError, EtlError, Result};
pub use model::ResultRow;
