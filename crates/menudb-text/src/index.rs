use anyhow::Result;
use std::path::{Path, PathBuf};
use tantivy::{Index, TantivyDocument};

use menudb_core::stage::BoolField;
use menudb_core::types::CatalogItem;

use crate::search::TantivyCatalogSearch;
use crate::tantivy_utils::{build_schema, register_tokenizer, CatalogFields};

/// A tantivy index holding catalog items.
///
/// Loading items is a convenience for the CLI and tests; the search side only
/// needs an index that follows `build_schema`.
pub struct CatalogIndex {
	index: Index,
	fields: CatalogFields,
}

impl CatalogIndex {
	pub fn create_in_ram() -> Result<Self> {
		Self::from_index(Index::create_in_ram(build_schema()))
	}

	/// Creates a fresh on-disk index, replacing anything already at `index_dir`.
	pub fn create_in_dir(index_dir: PathBuf) -> Result<Self> {
		if index_dir.exists() { std::fs::remove_dir_all(&index_dir)?; }
		std::fs::create_dir_all(&index_dir)?;
		Self::from_index(Index::create_in_dir(&index_dir, build_schema())?)
	}

	pub fn open_in_dir(index_dir: &Path) -> Result<Self> {
		Self::from_index(Index::open_in_dir(index_dir)?)
	}

	fn from_index(index: Index) -> Result<Self> {
		register_tokenizer(&index);
		let fields = CatalogFields::from_schema(&index.schema())?;
		Ok(Self { index, fields })
	}

	/// Adds items and commits. Items failing validation are skipped with a
	/// warning; the number actually indexed is returned.
	pub fn index_items(&self, items: &[CatalogItem]) -> Result<usize> {
		let mut index_writer = self.index.writer(50_000_000)?;
		let mut count = 0;
		for item in items {
			if let Err(e) = item.validate() {
				tracing::warn!(id = %item.id, error = %e, "skipping catalog item");
				continue;
			}
			index_writer.add_document(self.to_document(item)?)?;
			count += 1;
		}
		index_writer.commit()?;
		tracing::info!(indexed = count, skipped = items.len() - count, "catalog committed");
		Ok(count)
	}

	fn to_document(&self, item: &CatalogItem) -> Result<TantivyDocument> {
		let f = &self.fields;
		let mut doc = TantivyDocument::default();
		doc.add_text(f.id, &item.id);
		doc.add_text(f.source, serde_json::to_string(item)?);
		let [name, item_type, short_desc, long_desc, tags] = f.text;
		doc.add_text(name, &item.name);
		doc.add_text(item_type, &item.item_type);
		doc.add_text(short_desc, &item.short_desc);
		doc.add_text(long_desc, &item.long_desc);
		for tag in &item.tags { doc.add_text(tags, tag); }
		for field in BoolField::ALL { doc.add_bool(f.flag(field), item.flag(field)); }
		Ok(doc)
	}

	/// Opens a search backend over the committed state of this index.
	pub fn searcher(&self) -> Result<TantivyCatalogSearch> {
		TantivyCatalogSearch::new(self.index.clone())
	}
}
