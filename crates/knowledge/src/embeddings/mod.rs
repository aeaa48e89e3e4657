//! Query embedding providers.
//!
//! The retrievers embed the (rewritten) query and, for the in-memory
//! backend, any stored passages that arrive without a precomputed vector.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
