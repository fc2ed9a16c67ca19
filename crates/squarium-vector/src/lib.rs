//! Squarium Vector crate - embedding service for extracted problem statements.
//!
//! Provides the embedding service trait, a Gemini-backed implementation,
//! a deterministic mock for tests, and a provider that degrades to a zero
//! vector instead of failing.

pub mod embedding;

pub use embedding::{
    DynEmbeddingService, EmbeddingOutcome, EmbeddingProvider, EmbeddingService,
    GeminiEmbedding, MockEmbedding, DEFAULT_DIMENSIONS,
};
