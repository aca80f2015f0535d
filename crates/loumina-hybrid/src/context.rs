//! Owned retrieval state: both index handles plus the fusion engine.
//!
//! Construct one per process (or per test) and pass it to whatever serves
//! queries. Dropping it releases both snapshots; persisted dense state
//! stays on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use loumina_core::corpus::load_corpus;
use loumina_core::types::{DenseIngest, FusedHit, Hit, LexicalIngest, RerankedHit};
use loumina_core::Result;
use loumina_text::LexicalIndex;
use loumina_vector::DenseIndex;

use crate::engine::HybridSearchEngine;
use crate::fusion::{validate_alpha, FusionParams};
use crate::rerank::rerank_cosine;

/// Counts from an ingest; an index that was skipped reports `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IngestReport {
    pub lexical: Option<LexicalIngest>,
    pub dense: Option<DenseIngest>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestTargets {
    Both,
    LexicalOnly,
    DenseOnly,
}

pub struct RetrievalContext {
    engine: HybridSearchEngine<Arc<LexicalIndex>, Arc<DenseIndex>>,
}

impl RetrievalContext {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self::from_indexes(
            Arc::new(LexicalIndex::new()),
            Arc::new(DenseIndex::new(state_dir)),
        )
    }

    pub fn from_indexes(lexical: Arc<LexicalIndex>, dense: Arc<DenseIndex>) -> Self {
        Self {
            engine: HybridSearchEngine::new(lexical, dense),
        }
    }

    pub fn engine(&self) -> &HybridSearchEngine<Arc<LexicalIndex>, Arc<DenseIndex>> {
        &self.engine
    }

    pub fn lexical(&self) -> &Arc<LexicalIndex> {
        self.engine.lexical()
    }

    pub fn dense(&self) -> &Arc<DenseIndex> {
        self.engine.dense()
    }

    /// Walk the corpus once and rebuild the requested indexes from it.
    pub fn ingest<S: AsRef<str>>(
        &self,
        root: &Path,
        extensions: &[S],
        max_vocab: usize,
        targets: IngestTargets,
    ) -> Result<IngestReport> {
        let docs = load_corpus(root, extensions);
        let mut report = IngestReport::default();
        if targets != IngestTargets::DenseOnly {
            report.lexical = Some(self.lexical().build(&docs)?);
        }
        if targets != IngestTargets::LexicalOnly {
            report.dense = Some(self.dense().build_from_documents(&docs, max_vocab)?);
        }
        info!(root = %root.display(), docs = docs.len(), ?targets, "ingest finished");
        Ok(report)
    }

    pub fn ingest_lexical<S: AsRef<str>>(
        &self,
        root: &Path,
        extensions: &[S],
    ) -> Result<LexicalIngest> {
        self.lexical().rebuild(root, extensions)
    }

    pub fn ingest_dense<S: AsRef<str>>(
        &self,
        root: &Path,
        extensions: &[S],
        max_vocab: usize,
    ) -> Result<DenseIngest> {
        self.dense().build(root, extensions, max_vocab)
    }

    pub fn query_lexical(&self, query: &str, k: usize) -> Result<Vec<Hit>> {
        self.lexical().search(query, k)
    }

    pub fn query_dense(&self, query: &str, k: usize) -> Result<Vec<Hit>> {
        self.dense().search(query, k)
    }

    pub fn query_hybrid(
        &self,
        query: &str,
        k: usize,
        params: &FusionParams,
    ) -> Result<Vec<FusedHit>> {
        self.engine.query(query, k, params)
    }

    /// Lexical top-k re-scored against each snippet.
    pub fn query_reranked(&self, query: &str, k: usize, alpha: f64) -> Result<Vec<RerankedHit>> {
        validate_alpha(alpha)?;
        let hits = self.query_lexical(query, k)?;
        Ok(rerank_cosine(query, &hits, alpha))
    }
}
