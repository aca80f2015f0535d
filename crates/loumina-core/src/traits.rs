use std::sync::Arc;

use crate::error::Result;
use crate::types::Hit;

/// Anything that answers top-k queries with [`Hit`]s.
///
/// Implementations return at most `k` hits ordered by score descending and
/// an empty list (not an error) when nothing has been indexed yet.
pub trait Retriever: Send + Sync {
    fn search(&self, query: &str, k: usize) -> Result<Vec<Hit>>;
}

impl<T: Retriever + ?Sized> Retriever for Arc<T> {
    fn search(&self, query: &str, k: usize) -> Result<Vec<Hit>> {
        (**self).search(query, k)
    }
}

impl<T: Retriever + ?Sized> Retriever for &T {
    fn search(&self, query: &str, k: usize) -> Result<Vec<Hit>> {
        (**self).search(query, k)
    }
}
