//! Weighted fusion of lexical and dense candidates with freshness decay.
//!
//! `final = (alpha * bm25_norm + (1 - alpha) * dense) * decay`, where
//! `bm25_norm` is the lexical score divided by the batch maximum and
//! `decay = 0.5 ^ (age_days / half_life_days)`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use loumina_core::types::{FusedHit, FusionScoreBreakdown, Hit};
use loumina_core::{Error, Result};

/// Lower bound on the number of candidates pulled from each index.
pub const MIN_CANDIDATES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionParams {
    /// Weight of the lexical signal; `1 - alpha` goes to the dense signal.
    pub alpha: f64,
    pub half_life_days: f64,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            alpha: 0.6,
            half_life_days: 30.0,
        }
    }
}

impl FusionParams {
    pub fn new(alpha: f64, half_life_days: f64) -> Result<Self> {
        let params = Self {
            alpha,
            half_life_days,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        validate_alpha(self.alpha)?;
        if !self.half_life_days.is_finite() || self.half_life_days <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "half_life_days must be positive, got {}",
                self.half_life_days
            )));
        }
        Ok(())
    }
}

pub(crate) fn validate_alpha(alpha: f64) -> Result<()> {
    if (0.0..=1.0).contains(&alpha) {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!("alpha must be in [0, 1], got {alpha}")))
    }
}

/// Candidates requested from each index for a final list of `k`.
pub fn candidate_count(k: usize) -> usize {
    k.saturating_mul(2).max(MIN_CANDIDATES)
}

/// `0.5 ^ (age / half_life)`: 1 when fresh, 0.5 at one half-life.
pub fn freshness_decay(age_days: f64, half_life_days: f64) -> f64 {
    0.5f64.powf(age_days.max(0.0) / half_life_days)
}

#[derive(Default)]
struct Candidate<'a> {
    bm25_raw: f64,
    dense: f64,
    lexical_snippet: Option<&'a str>,
    dense_snippet: Option<&'a str>,
    age_days: Option<f64>,
}

impl Candidate<'_> {
    fn observe_age(&mut self, age: f64) {
        self.age_days = Some(self.age_days.map_or(age, |a| a.min(age)));
    }
}

/// Union the two candidate lists and rank them by the fused score.
///
/// Documents seen by only one index keep a zero for the missing signal.
/// Equal final scores are ordered by document path.
pub fn fuse(lexical: &[Hit], dense: &[Hit], k: usize, params: &FusionParams) -> Vec<FusedHit> {
    if k == 0 {
        return Vec::new();
    }
    let mut candidates: BTreeMap<&str, Candidate<'_>> = BTreeMap::new();
    for h in lexical {
        let c = candidates.entry(h.doc.as_str()).or_default();
        c.bm25_raw = c.bm25_raw.max(h.score);
        c.lexical_snippet.get_or_insert(h.snippet.as_str());
        c.observe_age(h.age_days);
    }
    for h in dense {
        let c = candidates.entry(h.doc.as_str()).or_default();
        c.dense = c.dense.max(h.score);
        c.dense_snippet.get_or_insert(h.snippet.as_str());
        c.observe_age(h.age_days);
    }

    let max_raw = lexical.iter().map(|h| h.score).fold(0.0, f64::max);
    let mut fused: Vec<FusedHit> = candidates
        .into_iter()
        .map(|(doc, c)| {
            let bm25_norm = if max_raw > 0.0 { c.bm25_raw / max_raw } else { 0.0 };
            // No reported age counts as fully stale.
            let age = c.age_days.unwrap_or(f64::INFINITY);
            let decay = freshness_decay(age, params.half_life_days);
            let final_score = (params.alpha * bm25_norm + (1.0 - params.alpha) * c.dense) * decay;
            FusedHit {
                doc: doc.to_string(),
                score: final_score,
                snippet: c
                    .lexical_snippet
                    .or(c.dense_snippet)
                    .unwrap_or_default()
                    .to_string(),
                age_days: if age.is_finite() { age } else { 0.0 },
                scores: FusionScoreBreakdown {
                    bm25_raw: c.bm25_raw,
                    bm25_norm,
                    dense: c.dense,
                    decay,
                    final_score,
                },
            }
        })
        .collect();
    // Candidates arrive in path order; the stable sort keeps it for ties.
    fused.sort_by(|a, b| b.score.total_cmp(&a.score));
    fused.truncate(k);
    fused
}
