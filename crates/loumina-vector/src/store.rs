//! Durable storage for the dense index: the usearch graph plus a JSON
//! metadata record, both staged in the state directory and renamed into
//! place.
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;
use usearch::Index;

use loumina_core::{Error, Result};

use crate::schema::{index_options, DenseMeta, INDEX_FILE, META_FILE};

#[derive(Debug, Clone)]
pub struct StatePaths {
    pub dir: PathBuf,
    pub index: PathBuf,
    pub meta: PathBuf,
}

impl StatePaths {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            index: dir.join(INDEX_FILE),
            meta: dir.join(META_FILE),
        }
    }

    pub fn exists(&self) -> bool {
        self.index.is_file() && self.meta.is_file()
    }
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| {
        Error::InvalidConfig(format!(
            "state path is not valid UTF-8: {}",
            path.display()
        ))
    })
}

/// Overwrite any previously persisted state with `ann` and `meta`.
pub fn save(paths: &StatePaths, ann: &Index, meta: &DenseMeta) -> Result<()> {
    fs::create_dir_all(&paths.dir).map_err(|e| Error::io(&paths.dir, e))?;

    // usearch writes by path, so stage next to the target and rename.
    let staged_index = paths.dir.join(format!("{INDEX_FILE}.partial"));
    ann.save(path_str(&staged_index)?).map_err(Error::index)?;

    let mut staged_meta =
        NamedTempFile::new_in(&paths.dir).map_err(|e| Error::io(&paths.dir, e))?;
    let bytes = serde_json::to_vec(meta)?;
    staged_meta.write_all(&bytes).map_err(|e| Error::io(&paths.meta, e))?;

    fs::rename(&staged_index, &paths.index).map_err(|e| Error::io(&paths.index, e))?;
    staged_meta
        .persist(&paths.meta)
        .map_err(|e| Error::io(&paths.meta, e.error))?;
    debug!(
        dir = %paths.dir.display(),
        docs = meta.docs.len(),
        dim = meta.dim,
        "dense index persisted"
    );
    Ok(())
}

/// Read persisted state back; `Ok(None)` when nothing has been persisted.
pub fn load(paths: &StatePaths) -> Result<Option<(Index, DenseMeta)>> {
    if !paths.exists() {
        return Ok(None);
    }
    let raw = fs::read(&paths.meta).map_err(|e| Error::io(&paths.meta, e))?;
    let meta: DenseMeta = serde_json::from_slice(&raw)?;

    let ann = Index::new(&index_options(meta.dim)).map_err(Error::index)?;
    ann.load(path_str(&paths.index)?).map_err(Error::index)?;

    if ann.size() != meta.docs.len() {
        return Err(Error::Incompatible(format!(
            "{} holds {} vectors but metadata lists {} documents",
            INDEX_FILE,
            ann.size(),
            meta.docs.len()
        )));
    }
    if meta.dim > 0 && (ann.dimensions() != meta.dim || meta.vocab.len().max(1) != meta.dim) {
        return Err(Error::Incompatible(format!(
            "dimension {} does not match index ({}) or vocabulary ({})",
            meta.dim,
            ann.dimensions(),
            meta.vocab.len()
        )));
    }
    let misplaced = meta
        .docs
        .iter()
        .enumerate()
        .find(|(i, d)| d.id != *i as u64);
    if let Some((pos, d)) = misplaced {
        return Err(Error::Incompatible(format!(
            "document {} has id {}, expected {pos}",
            d.path, d.id
        )));
    }
    Ok(Some((ann, meta)))
}
