//! Past Papers Common Library
//!
//! Shared code for the Past Papers services including:
//! - Paper record schema and validation
//! - Database models, the paper store, and connection lifecycle
//! - Error types and HTTP mapping
//! - Configuration management
//! - Metrics

pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod papers;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{DbPool, PaperStore, Repository};
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
