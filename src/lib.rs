// Core modules
pub mod api;
pub mod config;
pub mod error;
pub mod execution;
pub mod models;
pub mod risk;
pub mod sentiment;

// Re-export commonly used types
pub use config::BotConfig;
pub use error::{ConfigError, ServiceError};
pub use models::*;

// Error handling
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
