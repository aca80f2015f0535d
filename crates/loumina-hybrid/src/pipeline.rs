//! The three-step answer pipeline fed by hybrid retrieval: propose sources,
//! draft an answer citing them, flag risky drafts.

use serde::{Deserialize, Serialize};

use loumina_core::traits::Retriever;
use loumina_core::types::FusionScoreBreakdown;
use loumina_core::Result;

use crate::engine::HybridSearchEngine;
use crate::fusion::FusionParams;

pub const ARCHIVIST: &str = "archivist";

/// Drafts containing any of these are flagged with full risk.
pub const FORBIDDEN_PHRASES: [&str; 3] = ["delete all", "rm -rf", "format /"];

const MAX_CITATIONS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub doc: String,
    /// Location inside the document; documents are not chunked, so always `n/a`.
    pub loc: String,
    pub snippet: String,
    pub score: f64,
    pub scores: FusionScoreBreakdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub doc: String,
    pub loc: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub answer: String,
    pub sources: Vec<Citation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub agent: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub draft: Draft,
    pub sources: Vec<Source>,
    pub votes: Vec<Vote>,
}

pub fn propose_sources<L, D>(
    engine: &HybridSearchEngine<L, D>,
    query: &str,
    k: usize,
    params: &FusionParams,
) -> Result<Vec<Source>>
where
    L: Retriever,
    D: Retriever,
{
    Ok(engine
        .query(query, k, params)?
        .into_iter()
        .map(|h| Source {
            doc: h.doc,
            loc: "n/a".to_string(),
            snippet: h.snippet,
            score: h.score,
            scores: h.scores,
        })
        .collect())
}

pub fn propose_answer(query: &str, sources: &[Source]) -> Draft {
    Draft {
        answer: format!("Draft answer to '{query}'. Based on {} source(s).", sources.len()),
        sources: sources
            .iter()
            .take(MAX_CITATIONS)
            .map(|s| Citation {
                doc: s.doc.clone(),
                loc: s.loc.clone(),
            })
            .collect(),
        risk: None,
    }
}

pub fn review_answer(mut draft: Draft) -> Draft {
    let flagged = FORBIDDEN_PHRASES.iter().any(|p| draft.answer.contains(p));
    draft.risk = Some(if flagged { 1.0 } else { 0.0 });
    draft
}

pub fn ask<L, D>(
    engine: &HybridSearchEngine<L, D>,
    query: &str,
    k: usize,
    params: &FusionParams,
) -> Result<AskResponse>
where
    L: Retriever,
    D: Retriever,
{
    let sources = propose_sources(engine, query, k, params)?;
    let draft = review_answer(propose_answer(query, &sources));
    let votes = sources
        .iter()
        .map(|s| Vote {
            agent: ARCHIVIST.to_string(),
            score: s.scores.final_score,
        })
        .collect();
    Ok(AskResponse {
        answer: format!(
            "Proposals (hybrid, alpha={}, half-life={} days).",
            params.alpha, params.half_life_days
        ),
        draft,
        sources,
        votes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(doc: &str) -> Source {
        Source {
            doc: doc.into(),
            loc: "n/a".into(),
            snippet: String::new(),
            score: 0.5,
            scores: FusionScoreBreakdown::default(),
        }
    }

    #[test]
    fn draft_cites_at_most_two_sources() {
        let draft = propose_answer("fox", &[source("a"), source("b"), source("c")]);
        assert_eq!(draft.sources.len(), 2);
        assert!(draft.answer.contains("'fox'"));
        assert!(draft.answer.contains("3 source(s)"));
        assert!(draft.risk.is_none());
    }

    #[test]
    fn review_flags_forbidden_phrases() {
        let risky = review_answer(Draft {
            answer: "please rm -rf the disk".into(),
            sources: vec![],
            risk: None,
        });
        assert_eq!(risky.risk, Some(1.0));
        let safe = review_answer(propose_answer("fox", &[]));
        assert_eq!(safe.risk, Some(0.0));
    }
}
