//! Tokenization and text helpers shared by every engine.
//!
//! All engines must agree on what a token is, otherwise the lexical scores,
//! the dense vocabulary and the reranker drift apart.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Maximum snippet length in characters.
pub const SNIPPET_CHARS: usize = 280;

const SECONDS_PER_DAY: f64 = 86_400.0;

#[allow(clippy::expect_used)]
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w{2,}").expect("token pattern compiles"));

/// Lowercase runs of word characters, at least two characters long.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// First [`SNIPPET_CHARS`] characters with line breaks turned into spaces.
pub fn snippet(text: &str) -> String {
    text.chars()
        .take(SNIPPET_CHARS)
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

/// Age in days of something modified at `mtime_secs`, floored at zero.
pub fn age_days(mtime_secs: f64, now_secs: f64) -> f64 {
    let age = (now_secs - mtime_secs) / SECONDS_PER_DAY;
    if age.is_finite() {
        age.max(0.0)
    } else {
        0.0
    }
}

/// Relative term frequencies (counts divided by the total token count).
pub fn term_frequencies(text: &str) -> HashMap<String, f64> {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return HashMap::new();
    }
    let total = tokens.len() as f64;
    let mut counts: HashMap<String, f64> = HashMap::new();
    for t in tokens {
        *counts.entry(t).or_insert(0.0) += 1.0;
    }
    for v in counts.values_mut() {
        *v /= total;
    }
    counts
}

/// Cosine similarity of two sparse vectors; zero when either is empty.
pub fn sparse_cosine(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let dot: f64 = a
        .iter()
        .map(|(t, x)| x * b.get(t).copied().unwrap_or(0.0))
        .sum();
    let na = a.values().map(|v| v * v).sum::<f64>().sqrt();
    let nb = b.values().map(|v| v * v).sum::<f64>().sqrt();
    if na > 0.0 && nb > 0.0 {
        dot / (na * nb)
    } else {
        0.0
    }
}
