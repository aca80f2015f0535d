use tracing::debug;

use loumina_core::traits::Retriever;
use loumina_core::types::FusedHit;
use loumina_core::Result;

use crate::fusion::{candidate_count, fuse, FusionParams};

/// Fans a query out to a lexical and a dense retriever and fuses the
/// candidates. Holds no state of its own.
pub struct HybridSearchEngine<L, D>
where
    L: Retriever,
    D: Retriever,
{
    lexical: L,
    dense: D,
}

impl<L, D> HybridSearchEngine<L, D>
where
    L: Retriever,
    D: Retriever,
{
    pub fn new(lexical: L, dense: D) -> Self {
        Self { lexical, dense }
    }

    pub fn lexical(&self) -> &L {
        &self.lexical
    }

    pub fn dense(&self) -> &D {
        &self.dense
    }

    pub fn query(&self, query: &str, k: usize, params: &FusionParams) -> Result<Vec<FusedHit>> {
        params.validate()?;
        if k == 0 {
            return Ok(Vec::new());
        }
        let kx = candidate_count(k);
        let lexical = self.lexical.search(query, kx)?;
        let dense = self.dense.search(query, kx)?;
        let fused = fuse(&lexical, &dense, k, params);
        debug!(
            k,
            lexical = lexical.len(),
            dense = dense.len(),
            fused = fused.len(),
            "hybrid query"
        );
        Ok(fused)
    }
}
