use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use usearch::Index;

use loumina_core::corpus::load_corpus;
use loumina_core::tokenize::{age_days, snippet, tokenize};
use loumina_core::traits::Retriever;
use loumina_core::types::{epoch_secs, DenseIngest, Document, Hit};
use loumina_core::{Error, Result};

use crate::schema::{index_options, DenseMeta, DocMeta, MIN_EXPANSION_SEARCH};
use crate::store::{self, StatePaths};
use crate::vocab::Vocabulary;

/// One immutable build generation of the dense index.
///
/// The usearch graph sits behind a mutex because the search expansion is a
/// setting on the index itself and is adjusted per query.
pub struct DenseSnapshot {
    vocab: Vocabulary,
    ann: Mutex<Index>,
    meta: DenseMeta,
}

impl DenseSnapshot {
    pub fn build(docs: &[Document], max_vocab: usize) -> Result<Self> {
        let token_lists: Vec<Vec<String>> = docs.iter().map(|d| tokenize(&d.text)).collect();
        let vocab = Vocabulary::build(token_lists.iter().map(Vec::as_slice), max_vocab);
        let dim = vocab.dim();

        let ann = Index::new(&index_options(dim)).map_err(Error::index)?;
        ann.reserve(docs.len().max(1)).map_err(Error::index)?;
        let mut metas = Vec::with_capacity(docs.len());
        for (i, (d, tokens)) in docs.iter().zip(&token_lists).enumerate() {
            let id = i as u64;
            ann.add(id, &vocab.embed_tokens(tokens)).map_err(Error::index)?;
            metas.push(DocMeta {
                id,
                path: d.path.clone(),
                len: d.text.chars().count(),
                snippet: snippet(&d.text),
                mtime: d.mtime_secs(),
            });
        }
        let meta = DenseMeta {
            dim,
            vocab: vocab.terms().to_vec(),
            docs: metas,
        };
        Ok(Self {
            vocab,
            ann: Mutex::new(ann),
            meta,
        })
    }

    pub fn from_parts(ann: Index, meta: DenseMeta) -> Self {
        let vocab = Vocabulary::from_terms(meta.vocab.clone());
        Self {
            vocab,
            ann: Mutex::new(ann),
            meta,
        }
    }

    pub fn meta(&self) -> &DenseMeta {
        &self.meta
    }

    pub fn doc_count(&self) -> usize {
        self.meta.docs.len()
    }

    fn ann(&self) -> MutexGuard<'_, Index> {
        self.ann.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn persist(&self, paths: &StatePaths) -> Result<()> {
        store::save(paths, &self.ann(), &self.meta)
    }

    /// Approximate top-k by cosine similarity (`1 - distance`).
    ///
    /// Hits keep the graph's distance order; equal similarities are ordered
    /// by path.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<Hit>> {
        if k == 0 || self.meta.dim == 0 {
            return Ok(Vec::new());
        }
        let q = self.vocab.embed(query);
        let zero_query = q.iter().all(|x| *x == 0.0);

        let matches = {
            let ann = self.ann();
            let current = ann.size();
            if current == 0 {
                return Ok(Vec::new());
            }
            let k_eff = k.min(current);
            ann.change_expansion_search(MIN_EXPANSION_SEARCH.max(k_eff));
            ann.search(&q, k_eff).map_err(Error::index)?
        };

        let now = epoch_secs(Utc::now());
        let mut hits = Vec::with_capacity(matches.keys.len());
        for (key, distance) in matches.keys.iter().zip(&matches.distances) {
            let Some(doc) = usize::try_from(*key).ok().and_then(|i| self.meta.docs.get(i)) else {
                warn!(key, "dense hit without metadata");
                continue;
            };
            let similarity = 1.0 - f64::from(*distance);
            // A query with no vocabulary token is orthogonal to everything.
            let score = if zero_query || !similarity.is_finite() {
                0.0
            } else {
                similarity.clamp(-1.0, 1.0)
            };
            hits.push(Hit {
                doc: doc.path.clone(),
                score,
                snippet: doc.snippet.clone(),
                age_days: age_days(doc.mtime, now),
            });
        }
        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.doc.cmp(&b.doc)));
        Ok(hits)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DenseStats {
    pub docs: usize,
    pub dim: usize,
    /// Whether a snapshot is loaded in memory.
    pub resident: bool,
}

/// Dense index handle bound to a state directory.
///
/// Builds and lazy loads are serialized by one lock; searches clone the
/// current snapshot and run without it, so a rebuild never exposes a
/// half-updated vocabulary or graph.
pub struct DenseIndex {
    paths: StatePaths,
    current: RwLock<Option<Arc<DenseSnapshot>>>,
    build_lock: Mutex<()>,
}

impl DenseIndex {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        let dir: PathBuf = state_dir.into();
        Self {
            paths: StatePaths::new(&dir),
            current: RwLock::new(None),
            build_lock: Mutex::new(()),
        }
    }

    pub fn state_dir(&self) -> &Path {
        &self.paths.dir
    }

    /// Load the corpus under `root`, rebuild, persist and publish.
    pub fn build<S: AsRef<str>>(
        &self,
        root: &Path,
        extensions: &[S],
        max_vocab: usize,
    ) -> Result<DenseIngest> {
        let docs = load_corpus(root, extensions);
        self.build_from_documents(&docs, max_vocab)
    }

    #[instrument(skip_all, fields(docs = docs.len(), max_vocab = max_vocab))]
    pub fn build_from_documents(
        &self,
        docs: &[Document],
        max_vocab: usize,
    ) -> Result<DenseIngest> {
        let _guard = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = DenseSnapshot::build(docs, max_vocab)?;
        snapshot.persist(&self.paths)?;
        let stats = DenseIngest {
            doc_count: snapshot.doc_count(),
            dim: snapshot.meta().dim,
        };
        self.publish(snapshot);
        info!(docs = stats.doc_count, dim = stats.dim, "dense index built");
        Ok(stats)
    }

    fn publish(&self, snapshot: DenseSnapshot) -> Arc<DenseSnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&snapshot));
        snapshot
    }

    pub fn snapshot(&self) -> Option<Arc<DenseSnapshot>> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// The resident snapshot, loading persisted state on first use.
    ///
    /// Missing or unusable persisted state yields `None`.
    pub fn ensure_loaded(&self) -> Option<Arc<DenseSnapshot>> {
        if let Some(s) = self.snapshot() {
            return Some(s);
        }
        let _guard = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(s) = self.snapshot() {
            return Some(s);
        }
        match store::load(&self.paths) {
            Ok(Some((ann, meta))) => {
                debug!(docs = meta.docs.len(), dim = meta.dim, "dense index loaded from disk");
                Some(self.publish(DenseSnapshot::from_parts(ann, meta)))
            }
            Ok(None) => {
                debug!(dir = %self.paths.dir.display(), "no persisted dense index");
                None
            }
            Err(e) => {
                warn!(
                    dir = %self.paths.dir.display(),
                    error = %e,
                    "persisted dense index unusable; treating as absent"
                );
                None
            }
        }
    }

    pub fn search(&self, query: &str, k: usize) -> Result<Vec<Hit>> {
        let Some(snapshot) = self.ensure_loaded() else {
            return Ok(Vec::new());
        };
        let hits = snapshot.search(query, k)?;
        debug!(k, hits = hits.len(), "dense search");
        Ok(hits)
    }

    pub fn stats(&self) -> DenseStats {
        match self.snapshot() {
            Some(s) => DenseStats {
                docs: s.doc_count(),
                dim: s.meta().dim,
                resident: true,
            },
            None => DenseStats {
                docs: 0,
                dim: 0,
                resident: false,
            },
        }
    }
}

impl Retriever for DenseIndex {
    fn search(&self, query: &str, k: usize) -> Result<Vec<Hit>> {
        DenseIndex::search(self, query, k)
    }
}
