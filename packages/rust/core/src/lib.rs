//! Core research orchestration and model-facing logic for KeywordScout.
//!
//! This crate ties seed generation, candidate expansion, relevance
//! filtering, metric scoring, persistence, and clustering enrichment into
//! the end-to-end `run_research` workflow.

pub mod chat;
pub mod pipeline;
pub mod relevance;
pub mod seeds;

pub use chat::{ChatModel, OpenRouterChat, strip_code_fences};
pub use pipeline::{
    Collaborators, ProgressSink, ResearchOutcome, ResearchRequest, SilentProgress, run_research,
};
pub use relevance::{Classification, Confidence, DefaultReason, classify_relevance};
pub use seeds::{fallback_seeds, generate_seeds};
