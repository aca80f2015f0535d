//! Record types shared by the lexical, dense and hybrid engines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A source file loaded from the corpus.
///
/// - `path`: corpus-relative path, unique within one build
/// - `text`: decoded contents (invalid UTF-8 replaced)
/// - `modified_at`: filesystem modification time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub path: String,
    pub text: String,
    pub modified_at: DateTime<Utc>,
}

impl Document {
    /// Modification time as fractional seconds since the Unix epoch.
    pub fn mtime_secs(&self) -> f64 {
        epoch_secs(self.modified_at)
    }
}

pub fn epoch_secs(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}

/// The uniform shape returned by every engine.
///
/// `score` is engine-specific but higher is always better. `age_days` is
/// never negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub doc: String,
    pub score: f64,
    pub snippet: String,
    pub age_days: f64,
}

/// Per-candidate signals combined by the fusion engine.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FusionScoreBreakdown {
    pub bm25_raw: f64,
    pub bm25_norm: f64,
    pub dense: f64,
    pub decay: f64,
    #[serde(rename = "final")]
    pub final_score: f64,
}

/// A hybrid result: `score` equals `scores.final_score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedHit {
    pub doc: String,
    pub score: f64,
    pub snippet: String,
    pub age_days: f64,
    pub scores: FusionScoreBreakdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RerankBreakdown {
    pub bm25_norm: f64,
    pub cosine: f64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankedHit {
    #[serde(flatten)]
    pub hit: Hit,
    pub rerank: RerankBreakdown,
}

/// Returned by a lexical rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexicalIngest {
    pub doc_count: usize,
    pub token_list_count: usize,
}

/// Returned by a dense rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenseIngest {
    pub doc_count: usize,
    pub dim: usize,
}
