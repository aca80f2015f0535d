//! Fixed vocabulary and bag-of-words embedding.

use std::collections::HashMap;

use loumina_core::tokenize::tokenize;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    terms: Vec<String>,
    positions: HashMap<String, usize>,
}

impl Vocabulary {
    /// The `max_vocab` most frequent tokens across `token_lists`.
    ///
    /// Ordered by descending corpus frequency; equal frequencies are
    /// ordered by the token itself so the embedding space is reproducible.
    pub fn build<'a, I>(token_lists: I, max_vocab: usize) -> Self
    where
        I: IntoIterator<Item = &'a [String]>,
    {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for tokens in token_lists {
            for t in tokens {
                *counts.entry(t.as_str()).or_insert(0) += 1;
            }
        }
        let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
        ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(max_vocab);
        Self::from_terms(ranked.into_iter().map(|(t, _)| t.to_string()).collect())
    }

    pub fn from_terms(terms: Vec<String>) -> Self {
        let mut positions = HashMap::with_capacity(terms.len());
        for (i, t) in terms.iter().enumerate() {
            positions.entry(t.clone()).or_insert(i);
        }
        Self { terms, positions }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Embedding dimension: vocabulary size, never below one.
    pub fn dim(&self) -> usize {
        self.terms.len().max(1)
    }

    /// L2-normalized term counts over the vocabulary.
    ///
    /// Out-of-vocabulary tokens are ignored; the result is all zeros when
    /// no vocabulary token occurs.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        self.embed_tokens(&tokenize(text))
    }

    pub fn embed_tokens(&self, tokens: &[String]) -> Vec<f32> {
        let mut v = vec![0f32; self.dim()];
        for t in tokens {
            if let Some(&i) = self.positions.get(t) {
                v[i] += 1.0;
            }
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lists(texts: &[&str]) -> Vec<Vec<String>> {
        texts.iter().map(|t| tokenize(t)).collect()
    }

    #[test]
    fn ranks_by_frequency_then_token() {
        let token_lists = lists(&["beta alpha gamma", "beta alpha delta", "beta"]);
        let vocab = Vocabulary::build(token_lists.iter().map(Vec::as_slice), 10);
        assert_eq!(vocab.terms(), ["beta", "alpha", "delta", "gamma"]);
    }

    #[test]
    fn truncates_to_max_vocab() {
        let token_lists = lists(&["aa bb cc dd", "aa bb", "aa"]);
        let vocab = Vocabulary::build(token_lists.iter().map(Vec::as_slice), 2);
        assert_eq!(vocab.terms(), ["aa", "bb"]);
        assert_eq!(vocab.len(), 2);
        assert_eq!(vocab.dim(), 2);
    }

    #[test]
    fn empty_vocabulary_has_dimension_one() {
        let vocab = Vocabulary::build(std::iter::empty(), 16);
        assert!(vocab.is_empty());
        assert_eq!(vocab.dim(), 1);
        assert_eq!(vocab.embed("anything at all"), vec![0.0]);
    }

    #[test]
    fn embedding_is_unit_length_and_ignores_unknown_tokens() {
        let vocab = Vocabulary::from_terms(vec!["fox".into(), "story".into()]);
        let v = vocab.embed("Fox fox story unknown");
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
        assert!(v[0] > v[1]);
        assert_eq!(vocab.embed("nothing known"), vec![0.0, 0.0]);
    }
}
