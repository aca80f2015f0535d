//! Persisted layout of the dense index and its fixed HNSW parameters.
use serde::{Deserialize, Serialize};
use usearch::{IndexOptions, MetricKind, ScalarKind};

pub const INDEX_FILE: &str = "dense.index";
pub const META_FILE: &str = "dense_meta.json";

/// Links per node (M).
pub const HNSW_CONNECTIVITY: usize = 16;
/// Candidate list size while inserting (ef_construction).
pub const HNSW_EXPANSION_ADD: usize = 200;
/// Candidate list size a freshly built or loaded index searches with.
pub const HNSW_EXPANSION_SEARCH: usize = 100;
/// Lower bound on the per-query candidate list size.
pub const MIN_EXPANSION_SEARCH: usize = 50;

/// One entry per indexed document; `id` is the ANN key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocMeta {
    pub id: u64,
    pub path: String,
    pub len: usize,
    pub snippet: String,
    /// Seconds since the Unix epoch.
    pub mtime: f64,
}

/// Contents of `dense_meta.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseMeta {
    pub dim: usize,
    pub vocab: Vec<String>,
    pub docs: Vec<DocMeta>,
}

pub fn index_options(dim: usize) -> IndexOptions {
    IndexOptions {
        dimensions: dim.max(1),
        metric: MetricKind::Cos,
        quantization: ScalarKind::F32,
        connectivity: HNSW_CONNECTIVITY,
        expansion_add: HNSW_EXPANSION_ADD,
        expansion_search: HNSW_EXPANSION_SEARCH,
        multi: false,
    }
}
