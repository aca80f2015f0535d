use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::{debug, info, warn};

use loumina_core::corpus::load_corpus;
use loumina_core::tokenize::{age_days, snippet, tokenize};
use loumina_core::traits::Retriever;
use loumina_core::types::{epoch_secs, Document, Hit, LexicalIngest};
use loumina_core::Result;

use crate::tantivy_utils::{backend, build_schema, register_tokenizer, Fields, WRITER_HEAP_BYTES};

#[derive(Debug, Clone)]
struct DocEntry {
    path: String,
    snippet: String,
    mtime: f64,
}

/// One immutable build generation: a BM25 index over the token lists plus
/// the document table it was built from.
pub struct LexicalSnapshot {
    reader: IndexReader,
    fields: Fields,
    docs: Vec<DocEntry>,
    token_list_count: usize,
    built_at: DateTime<Utc>,
}

impl LexicalSnapshot {
    pub fn build(docs: &[Document]) -> Result<Self> {
        let token_lists: Vec<Vec<String>> = docs.iter().map(|d| tokenize(&d.text)).collect();

        let (schema, fields) = build_schema();
        let index = Index::create_in_ram(schema);
        register_tokenizer(&index);
        // One thread keeps a single segment, so scores do not depend on how
        // documents were split across segments.
        let mut index_writer: IndexWriter = index
            .writer_with_num_threads(1, WRITER_HEAP_BYTES)
            .map_err(backend)?;
        for (ord, tokens) in token_lists.iter().enumerate() {
            index_writer
                .add_document(doc!(
                    fields.ord => ord as u64,
                    fields.text => tokens.join(" "),
                ))
                .map_err(backend)?;
        }
        index_writer.commit().map_err(backend)?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(backend)?;
        let entries = docs
            .iter()
            .map(|d| DocEntry {
                path: d.path.clone(),
                snippet: snippet(&d.text),
                mtime: d.mtime_secs(),
            })
            .collect();
        Ok(Self {
            reader,
            fields,
            docs: entries,
            token_list_count: token_lists.len(),
            built_at: Utc::now(),
        })
    }

    pub fn doc_count(&self) -> usize {
        self.docs.len()
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Top-k documents with a positive BM25 score.
    ///
    /// Equal scores are ordered by document path ascending.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<Hit>> {
        if k == 0 || self.docs.is_empty() {
            return Ok(Vec::new());
        }
        let terms = tokenize(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let clauses: Vec<(Occur, Box<dyn Query>)> = terms
            .iter()
            .map(|t| {
                let term = Term::from_field_text(self.fields.text, t);
                let q: Box<dyn Query> =
                    Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs));
                (Occur::Should, q)
            })
            .collect();
        let query = BooleanQuery::new(clauses);

        let searcher = self.reader.searcher();
        // Collect every match: the tie-break has to see all equal scores,
        // not whichever ones the collector kept.
        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(self.docs.len()))
            .map_err(backend)?;
        let mut scored: Vec<(f64, &DocEntry)> = Vec::with_capacity(top_docs.len());
        for (score, addr) in top_docs {
            let stored: TantivyDocument = searcher.doc(addr).map_err(backend)?;
            let entry = stored
                .get_first(self.fields.ord)
                .and_then(|v| v.as_u64())
                .and_then(|ord| usize::try_from(ord).ok())
                .and_then(|ord| self.docs.get(ord));
            match entry {
                Some(entry) if score > 0.0 => scored.push((f64::from(score), entry)),
                Some(_) => {}
                None => warn!(?addr, "lexical hit without a document entry"),
            }
        }
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.path.cmp(&b.1.path)));
        scored.truncate(k);

        let now = epoch_secs(Utc::now());
        Ok(scored
            .into_iter()
            .map(|(score, e)| Hit {
                doc: e.path.clone(),
                score,
                snippet: e.snippet.clone(),
                age_days: age_days(e.mtime, now),
            })
            .collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LexicalStats {
    pub docs: usize,
    pub built_at: Option<DateTime<Utc>>,
}

/// Lexical index handle shared across requests.
///
/// `build` constructs a complete [`LexicalSnapshot`] off to the side and
/// publishes it with a single pointer swap; searches clone the current
/// `Arc` and never wait for a rebuild. Builds are serialized among
/// themselves.
#[derive(Default)]
pub struct LexicalIndex {
    current: RwLock<Option<Arc<LexicalSnapshot>>>,
    build_lock: Mutex<()>,
}

impl LexicalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the index with one built from `docs`.
    pub fn build(&self, docs: &[Document]) -> Result<LexicalIngest> {
        let _guard = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = LexicalSnapshot::build(docs)?;
        let stats = LexicalIngest {
            doc_count: snapshot.doc_count(),
            token_list_count: snapshot.token_list_count,
        };
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(snapshot));
        info!(
            docs = stats.doc_count,
            token_lists = stats.token_list_count,
            "lexical index built"
        );
        Ok(stats)
    }

    /// Load the corpus under `root` and rebuild from it.
    pub fn rebuild<S: AsRef<str>>(&self, root: &Path, extensions: &[S]) -> Result<LexicalIngest> {
        let docs = load_corpus(root, extensions);
        self.build(&docs)
    }

    pub fn snapshot(&self) -> Option<Arc<LexicalSnapshot>> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn search(&self, query: &str, k: usize) -> Result<Vec<Hit>> {
        let Some(snapshot) = self.snapshot() else {
            debug!("lexical search before any build");
            return Ok(Vec::new());
        };
        let hits = snapshot.search(query, k)?;
        debug!(k, hits = hits.len(), "lexical search");
        Ok(hits)
    }

    pub fn stats(&self) -> LexicalStats {
        match self.snapshot() {
            Some(s) => LexicalStats {
                docs: s.doc_count(),
                built_at: Some(s.built_at()),
            },
            None => LexicalStats {
                docs: 0,
                built_at: None,
            },
        }
    }
}

impl Retriever for LexicalIndex {
    fn search(&self, query: &str, k: usize) -> Result<Vec<Hit>> {
        LexicalIndex::search(self, query, k)
    }
}
