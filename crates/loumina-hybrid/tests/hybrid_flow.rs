use std::fs;
use std::sync::Arc;

use chrono::{Duration, Utc};
use loumina_core::types::Document;
use loumina_hybrid::pipeline::{ask, ARCHIVIST};
use loumina_hybrid::{FusionParams, IngestTargets, RetrievalContext};
use loumina_text::LexicalIndex;
use loumina_vector::DenseIndex;
use tempfile::TempDir;

fn doc(path: &str, text: &str, age_days: i64) -> Document {
    Document {
        path: path.to_string(),
        text: text.to_string(),
        modified_at: Utc::now() - Duration::days(age_days),
    }
}

fn context_with(docs: &[Document], state: &TempDir) -> anyhow::Result<RetrievalContext> {
    let lexical = Arc::new(LexicalIndex::new());
    let dense = Arc::new(DenseIndex::new(state.path()));
    lexical.build(docs)?;
    dense.build_from_documents(docs, 4096)?;
    Ok(RetrievalContext::from_indexes(lexical, dense))
}

fn fox_docs() -> Vec<Document> {
    vec![
        doc("A", "the quick fox", 0),
        doc("B", "a slow turtle", 0),
        doc("C", "another fox story", 0),
    ]
}

#[test]
fn hybrid_query_returns_breakdowns() -> anyhow::Result<()> {
    let state = TempDir::new()?;
    let ctx = context_with(&fox_docs(), &state)?;
    let hits = ctx.query_hybrid("fox", 3, &FusionParams::default())?;

    assert_eq!(hits.len(), 3, "B comes back from the dense side");
    let top: Vec<&str> = hits[..2].iter().map(|h| h.doc.as_str()).collect();
    assert!(top.contains(&"A") && top.contains(&"C"));
    for h in &hits {
        assert_eq!(h.score, h.scores.final_score);
        assert!((0.0..=1.0 + 1e-9).contains(&h.score));
    }
    let b = hits
        .iter()
        .find(|h| h.doc == "B")
        .map(|h| h.scores)
        .unwrap_or_default();
    assert_eq!(b.bm25_norm, 0.0);
    assert_eq!(b.bm25_raw, 0.0);
    Ok(())
}

#[test]
fn alpha_one_matches_lexical_only_ranking() -> anyhow::Result<()> {
    let state = TempDir::new()?;
    let ctx = context_with(&fox_docs(), &state)?;
    let params = FusionParams::new(1.0, 30.0)?;
    for h in ctx.query_hybrid("fox", 3, &params)? {
        assert!((h.score - h.scores.bm25_norm * h.scores.decay).abs() < 1e-12);
    }
    let params = FusionParams::new(0.0, 30.0)?;
    for h in ctx.query_hybrid("fox", 3, &params)? {
        assert!((h.score - h.scores.dense * h.scores.decay).abs() < 1e-12);
    }
    Ok(())
}

#[test]
fn stale_documents_lose_to_fresh_ones() -> anyhow::Result<()> {
    let state = TempDir::new()?;
    let docs = vec![
        doc("old.md", "release notes fox", 90),
        doc("new.md", "release notes fox", 0),
    ];
    let ctx = context_with(&docs, &state)?;
    let hits = ctx.query_hybrid("release notes", 2, &FusionParams::new(0.6, 30.0)?)?;
    assert_eq!(hits[0].doc, "new.md");
    assert!((hits[1].scores.decay - 0.125).abs() < 1e-3);
    Ok(())
}

#[test]
fn invalid_parameters_are_rejected() -> anyhow::Result<()> {
    let state = TempDir::new()?;
    let ctx = context_with(&fox_docs(), &state)?;
    let bad_alpha = FusionParams {
        alpha: 2.0,
        half_life_days: 30.0,
    };
    let bad_half_life = FusionParams {
        alpha: 0.5,
        half_life_days: -1.0,
    };
    assert!(ctx.query_hybrid("fox", 3, &bad_alpha).is_err());
    assert!(ctx.query_hybrid("fox", 3, &bad_half_life).is_err());
    assert!(ctx.query_reranked("fox", 3, -0.5).is_err());
    Ok(())
}

#[test]
fn empty_context_answers_with_nothing() -> anyhow::Result<()> {
    let state = TempDir::new()?;
    let ctx = RetrievalContext::new(state.path());
    assert!(ctx.query_hybrid("fox", 5, &FusionParams::default())?.is_empty());
    assert!(ctx.query_reranked("fox", 5, 0.6)?.is_empty());
    Ok(())
}

#[test]
fn reranked_query_adds_breakdown() -> anyhow::Result<()> {
    let state = TempDir::new()?;
    let ctx = context_with(&fox_docs(), &state)?;
    let hits = ctx.query_reranked("fox story", 5, 0.6)?;
    assert_eq!(hits[0].hit.doc, "C");
    assert!(hits[0].rerank.cosine > 0.0);

    let json = serde_json::to_value(&hits[0])?;
    assert_eq!(json["doc"], "C");
    assert!(json["rerank"]["score"].is_number());
    Ok(())
}

#[test]
fn ingest_from_directory_builds_both_indexes() -> anyhow::Result<()> {
    let corpus = TempDir::new()?;
    let state = TempDir::new()?;
    fs::write(corpus.path().join("fox.md"), "the quick fox")?;
    fs::write(corpus.path().join("turtle.txt"), "a slow turtle")?;
    fs::write(corpus.path().join("image.png"), "fox")?;

    let ctx = RetrievalContext::new(state.path());
    let report = ctx.ingest(corpus.path(), &[".md", ".txt"], 4096, IngestTargets::Both)?;
    assert_eq!(report.lexical.map(|r| r.doc_count), Some(2));
    assert_eq!(report.dense.map(|r| r.doc_count), Some(2));

    let dense_only = RetrievalContext::new(state.path());
    let report = dense_only.ingest(corpus.path(), &[".md"], 4096, IngestTargets::DenseOnly)?;
    assert!(report.lexical.is_none());
    assert_eq!(report.dense.map(|r| r.dim), Some(3));
    assert!(dense_only.query_lexical("fox", 5)?.is_empty());
    assert_eq!(dense_only.query_dense("fox", 5)?.len(), 1);

    let wider = dense_only.ingest_dense(corpus.path(), &[".md", ".txt"], 4096)?;
    assert_eq!(wider.doc_count, 2);
    assert_eq!(dense_only.query_dense("turtle", 5)?.len(), 2);
    Ok(())
}

#[test]
fn ask_chains_the_pipeline() -> anyhow::Result<()> {
    let state = TempDir::new()?;
    let ctx = context_with(&fox_docs(), &state)?;
    let response = ask(ctx.engine(), "fox", 3, &FusionParams::default())?;

    assert_eq!(response.sources.len(), 3);
    assert!(response.sources.iter().all(|s| s.loc == "n/a"));
    assert_eq!(response.draft.sources.len(), 2);
    assert_eq!(response.draft.risk, Some(0.0));
    assert_eq!(response.votes.len(), 3);
    for (vote, source) in response.votes.iter().zip(&response.sources) {
        assert_eq!(vote.agent, ARCHIVIST);
        assert_eq!(vote.score, source.scores.final_score);
    }
    Ok(())
}
