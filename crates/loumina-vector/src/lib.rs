//! loumina-vector
//!
//! Dense retrieval over bag-of-words vectors: a fixed vocabulary learned at
//! build time, an HNSW graph (usearch, cosine) and a JSON metadata record
//! persisted side by side in the state directory.
pub mod schema;
pub mod store;
pub mod vocab;
pub mod index;

pub use index::{DenseIndex, DenseSnapshot, DenseStats};
pub use schema::{DenseMeta, DocMeta};
pub use vocab::Vocabulary;
