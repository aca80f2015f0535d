//! Corpus loader: walks a root directory and produces [`Document`]s.
//!
//! Unreadable files are skipped with a logged reason; a partial corpus is a
//! valid outcome.
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{Error, Result};
use crate::types::Document;

/// Directory names never descended into.
pub const EXCLUDED_DIRS: &[&str] = &[".git", ".venv", "node_modules", "dist", "build"];

pub const DEFAULT_EXTENSIONS: &[&str] = &[".md", ".txt", ".py"];

/// Normalised extension allow-list: lowercase, without the leading dot.
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    allowed: HashSet<String>,
}

impl ExtensionFilter {
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Self {
        let allowed = extensions
            .iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self { allowed }
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.allowed.contains(&e.to_lowercase()))
    }
}

fn is_excluded(relative: &Path) -> bool {
    relative.components().any(|c| match c {
        Component::Normal(name) => name.to_str().is_some_and(|n| EXCLUDED_DIRS.contains(&n)),
        _ => false,
    })
}

/// Load every allowed file under `root`, in sorted directory-walk order.
pub fn load_corpus<S: AsRef<str>>(root: &Path, extensions: &[S]) -> Vec<Document> {
    let filter = ExtensionFilter::new(extensions);
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !entry_excluded(root, e));

    let mut docs = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() || !filter.matches(entry.path()) {
            continue;
        }
        match read_document(root, entry.path()) {
            Ok(doc) => docs.push(doc),
            Err(e) => warn!(path = %entry.path().display(), error = %e, "skipping corpus file"),
        }
    }
    debug!(root = %root.display(), docs = docs.len(), "corpus loaded");
    docs
}

fn entry_excluded(root: &Path, entry: &DirEntry) -> bool {
    entry
        .path()
        .strip_prefix(root)
        .map(is_excluded)
        .unwrap_or(false)
}

/// Read one file into a [`Document`]; text is decoded lossily.
pub fn read_document(root: &Path, path: &Path) -> Result<Document> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    let text = String::from_utf8_lossy(&bytes).into_owned();
    let modified_at = match fs::metadata(path).and_then(|m| m.modified()) {
        Ok(t) => DateTime::<Utc>::from(t),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no modification time; treating as fresh");
            Utc::now()
        }
    };
    let relative = path.strip_prefix(root).unwrap_or(path);
    Ok(Document {
        path: relative.to_string_lossy().into_owned(),
        text,
        modified_at,
    })
}
