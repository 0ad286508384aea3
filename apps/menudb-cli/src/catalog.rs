use anyhow::Context;
use std::path::{Path, PathBuf};

use menudb_core::types::CatalogItem;

/// Every `.json` file named directly or found under a named directory, sorted.
pub fn list_catalog_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for root in paths {
        for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") { files.push(path.to_path_buf()); }
        }
    }
    files.sort();
    files.dedup();
    files
}

/// Reads one catalog file: a JSON array of items.
pub fn read_catalog_file(path: &Path) -> anyhow::Result<Vec<CatalogItem>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

pub fn load_catalog(paths: &[PathBuf]) -> anyhow::Result<Vec<CatalogItem>> {
    let files = list_catalog_files(paths);
    if files.is_empty() {
        tracing::warn!("no .json catalog files found");
        return Ok(vec![]);
    }
    let mut items = Vec::new();
    for (file_index, file_path) in files.iter().enumerate() {
        let batch = read_catalog_file(file_path)?;
        tracing::info!(file = %file_path.display(), items = batch.len(), "loaded catalog file {}/{}", file_index + 1, files.len());
        items.extend(batch);
    }
    Ok(items)
}
