//! Scarbot Core Library
//!
//! Foundational utilities shared by every Scarbot crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management
//! - Session language tags

pub mod config;
pub mod error;
pub mod language;
pub mod logging;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use language::Language;
