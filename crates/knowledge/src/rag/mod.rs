//! Retrieval-augmented context for the conversation core.

pub mod context;

pub use context::{serialize_chunks, AssembledContext, ContextAssembler};
