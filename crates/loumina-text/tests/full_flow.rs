use std::fs;
use std::sync::Arc;
use std::thread;

use chrono::{Duration, Utc};
use loumina_core::tokenize::SNIPPET_CHARS;
use loumina_core::types::{Document, Hit};
use loumina_text::LexicalIndex;

fn doc(path: &str, text: &str) -> Document {
    Document {
        path: path.to_string(),
        text: text.to_string(),
        modified_at: Utc::now(),
    }
}

fn fox_corpus() -> Vec<Document> {
    vec![
        doc("A", "the quick fox"),
        doc("B", "a slow turtle"),
        doc("C", "another fox story"),
    ]
}

#[test]
fn fox_scenario_ranks_matching_documents() {
    let index = LexicalIndex::new();
    let stats = index.build(&fox_corpus()).expect("build");
    assert_eq!(stats.doc_count, 3);
    assert_eq!(stats.token_list_count, 3);

    let hits = index.search("fox", 2).expect("search");
    let docs: Vec<&str> = hits.iter().map(|h| h.doc.as_str()).collect();
    assert_eq!(hits.len(), 2);
    assert!(docs.contains(&"A") && docs.contains(&"C"), "got {docs:?}");
    assert!(hits[0].score >= hits[1].score);

    let wide = index.search("fox", 10).expect("search");
    assert_eq!(wide.len(), 2, "non-matching B is excluded");
}

#[test]
fn search_before_build_is_empty() {
    let index = LexicalIndex::new();
    assert!(index.search("anything", 5).expect("search").is_empty());
    assert_eq!(index.stats().docs, 0);
    assert!(index.stats().built_at.is_none());
}

#[test]
fn empty_corpus_and_empty_query_are_empty() {
    let index = LexicalIndex::new();
    index.build(&[]).expect("build");
    assert!(index.search("fox", 5).expect("search").is_empty());

    index.build(&fox_corpus()).expect("build");
    assert!(index.search("", 5).expect("search").is_empty());
    assert!(
        index.search("a !", 5).expect("search").is_empty(),
        "single-char tokens are dropped"
    );
    assert!(index.search("fox", 0).expect("search").is_empty());
}

#[test]
fn results_respect_k_and_are_sorted() {
    let docs: Vec<Document> = (0..20)
        .map(|i| doc(&format!("doc{i:02}.md"), &"rust ".repeat(i + 1)))
        .collect();
    let index = LexicalIndex::new();
    index.build(&docs).expect("build");

    for k in [1, 3, 7, 20, 50] {
        let hits = index.search("rust", k).expect("search");
        assert!(hits.len() <= k);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }
}

#[test]
fn equal_scores_are_ordered_by_path() {
    let docs = vec![
        doc("zeta.md", "shared words here"),
        doc("alpha.md", "shared words here"),
        doc("mid.md", "shared words here"),
    ];
    let index = LexicalIndex::new();
    index.build(&docs).expect("build");

    let hits = index.search("shared", 3).expect("search");
    let order: Vec<&str> = hits.iter().map(|h| h.doc.as_str()).collect();
    assert_eq!(order, vec!["alpha.md", "mid.md", "zeta.md"]);
    assert!((hits[0].score - hits[2].score).abs() < 1e-9);
}

#[test]
fn rebuild_with_identical_corpus_is_deterministic() {
    let docs = vec![
        doc("a.md", "fox and hound in the forest"),
        doc("b.md", "the fox jumps over the fox"),
        doc("c.md", "forest story without animals"),
        doc("d.md", "hound hound hound"),
    ];
    // Ages move with the clock between searches, so compare ranking only.
    let strip = |hits: &[Hit]| -> Vec<(String, f64)> {
        hits.iter().map(|h| (h.doc.clone(), h.score)).collect()
    };
    let index = LexicalIndex::new();
    index.build(&docs).expect("build");
    let first = index.search("fox forest hound", 4).expect("search");
    let again = index.search("fox forest hound", 4).expect("search");
    assert_eq!(strip(&first), strip(&again));

    index.build(&docs).expect("rebuild");
    let second = index.search("fox forest hound", 4).expect("search");
    assert_eq!(strip(&first), strip(&second));
}

#[test]
fn snippets_are_capped_and_single_line() {
    let long = format!("fox\n{}\nend", "word ".repeat(200));
    let index = LexicalIndex::new();
    index.build(&[doc("long.md", &long)]).expect("build");

    let hits = index.search("fox", 1).expect("search");
    assert_eq!(hits.len(), 1);
    assert!(hits[0].snippet.chars().count() <= SNIPPET_CHARS);
    assert!(!hits[0].snippet.contains('\n'));
}

#[test]
fn age_is_computed_from_modification_time() {
    let mut old = doc("old.md", "fox");
    old.modified_at = Utc::now() - Duration::days(10);
    let mut future = doc("future.md", "fox");
    future.modified_at = Utc::now() + Duration::days(3);
    let index = LexicalIndex::new();
    index.build(&[old, future]).expect("build");

    let hits = index.search("fox", 2).expect("search");
    let age = |name: &str| {
        hits.iter()
            .find(|h| h.doc == name)
            .map(|h| h.age_days)
            .expect("hit")
    };
    assert!((age("old.md") - 10.0).abs() < 0.01);
    assert_eq!(age("future.md"), 0.0);
}

#[test]
fn rebuild_from_directory() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    fs::write(tmp.path().join("notes.md"), "offline retrieval notes")?;
    fs::write(tmp.path().join("skip.bin"), "retrieval")?;

    let index = LexicalIndex::new();
    let stats = index.rebuild(tmp.path(), &[".md"])?;
    assert_eq!(stats.doc_count, 1);
    let hits = index.search("retrieval", 5)?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].doc, "notes.md");
    Ok(())
}

#[test]
fn concurrent_searches_see_complete_snapshots() {
    let index = Arc::new(LexicalIndex::new());
    index.build(&fox_corpus()).expect("build");

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let index = Arc::clone(&index);
            thread::spawn(move || {
                for _ in 0..50 {
                    let hits = index.search("fox", 5).expect("search");
                    assert_eq!(hits.len(), 2);
                }
            })
        })
        .collect();
    for _ in 0..5 {
        index.build(&fox_corpus()).expect("rebuild");
    }
    for r in readers {
        r.join().expect("reader thread");
    }
}
