//! Knowledge retrieval for Scarbot.
//!
//! This crate provides:
//! - The `Retriever` capability and its Qdrant and in-memory backends
//! - Query embedding providers (OpenAI, Ollama, deterministic mock)
//! - Maximal marginal relevance selection
//! - The Context Assembler that turns passages into a context block

pub mod embeddings;
pub mod factory;
pub mod memory;
pub mod mmr;
pub mod qdrant;
pub mod rag;
pub mod retriever;
pub mod types;

// Re-export main types
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use factory::create_retriever;
pub use memory::MemoryRetriever;
pub use qdrant::QdrantRetriever;
pub use rag::{serialize_chunks, AssembledContext, ContextAssembler};
pub use retriever::Retriever;
pub use types::{ChunkRecord, RetrievedChunk};
