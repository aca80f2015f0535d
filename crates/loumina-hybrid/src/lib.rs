//! loumina-hybrid
//!
//! Fusion of the lexical and dense indexes, the snippet reranker, the owned
//! retrieval context and the answer pipeline built on top of them.
pub mod fusion;
pub mod rerank;
pub mod engine;
pub mod context;
pub mod pipeline;

pub use context::{IngestReport, IngestTargets, RetrievalContext};
pub use engine::HybridSearchEngine;
pub use fusion::{candidate_count, freshness_decay, fuse, FusionParams};
pub use rerank::rerank_cosine;
