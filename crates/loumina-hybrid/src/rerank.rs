use loumina_core::tokenize::{sparse_cosine, term_frequencies};
use loumina_core::types::{Hit, RerankBreakdown, RerankedHit};

/// Re-score lexical hits by blending their normalized score with the
/// term-frequency cosine between the query and each snippet.
///
/// `score = alpha * bm25_norm + (1 - alpha) * cosine`, where `bm25_norm`
/// divides by the batch maximum, or by one when that maximum is exactly
/// zero. A negative maximum stays the divisor. The sort is stable, so equal
/// scores keep their input order.
pub fn rerank_cosine(query: &str, hits: &[Hit], alpha: f64) -> Vec<RerankedHit> {
    if hits.is_empty() {
        return Vec::new();
    }
    let query_tf = term_frequencies(query);
    let max_score = hits
        .iter()
        .map(|h| h.score)
        .fold(f64::NEG_INFINITY, f64::max);
    let max_score = if max_score == 0.0 { 1.0 } else { max_score };

    let mut out: Vec<RerankedHit> = hits
        .iter()
        .map(|h| {
            let bm25_norm = h.score / max_score;
            let cosine = sparse_cosine(&query_tf, &term_frequencies(&h.snippet));
            RerankedHit {
                hit: h.clone(),
                rerank: RerankBreakdown {
                    bm25_norm,
                    cosine,
                    score: alpha * bm25_norm + (1.0 - alpha) * cosine,
                },
            }
        })
        .collect();
    out.sort_by(|a, b| b.rerank.score.total_cmp(&a.rerank.score));
    out
}
