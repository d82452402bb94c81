//! Embedding provider and similarity engine for KeywordScout.
//!
//! Wraps a batch embedding API behind [`EmbeddingProvider`], degrading to
//! flagged zero-vectors on failure, and provides clamped cosine similarity
//! plus one-against-many batch scoring on top.

pub mod provider;
pub mod similarity;

pub use provider::{
    DEFAULT_BATCH_LIMIT, Embedding, EmbeddingProvider, MAX_EMBED_CHARS, OpenAiEmbeddings,
};
pub use similarity::{ScoredItem, batch_similarity, cosine_similarity};
