//! loumina-text
//!
//! BM25 lexical index over the shared tokenizer, backed by an in-RAM
//! Tantivy index that is rebuilt wholesale and swapped in atomically.
pub mod tantivy_utils;
pub mod index;

pub use index::{LexicalIndex, LexicalSnapshot, LexicalStats};
