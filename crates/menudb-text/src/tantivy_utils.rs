use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, INDEXED, STORED, STRING};
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer};
use tantivy::Index;

use menudb_core::stage::BoolField;

pub const TOKENIZER: &str = "menu_text";

/// Every field searched by a text match, in schema order.
pub const TEXT_FIELDS: [&str; 5] = ["name", "itemType", "shortDesc", "longDesc", "tags"];

pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	schema_builder.add_text_field("id", STRING | STORED);
	// full item as JSON, returned verbatim to callers
	schema_builder.add_text_field("source", STORED);
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(TOKENIZER).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let text_options = TextOptions::default().set_indexing_options(text_field_indexing);
	for name in TEXT_FIELDS {
		schema_builder.add_text_field(name, text_options.clone());
	}
	for field in BoolField::ALL {
		schema_builder.add_bool_field(field.name(), INDEXED);
	}
	schema_builder.build()
}

pub fn register_tokenizer(index: &Index) {
	let stop_words = [
		"a","an","and","are","as","at","be","by","for","from","in","is","it","its","of","on","or","the","to","with",
	];
	let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(stop_words.into_iter().map(|s| s.to_string())))
		.build();
	index.tokenizers().register(TOKENIZER, tokenizer);
}

/// Resolved field handles of the catalog schema.
#[derive(Debug, Clone, Copy)]
pub struct CatalogFields {
	pub id: Field,
	pub source: Field,
	pub text: [Field; TEXT_FIELDS.len()],
	pub active: Field,
	pub deleted: Field,
	pub vegan: Field,
	pub vegetarian: Field,
	pub gluten_free: Field,
}

impl CatalogFields {
	pub fn from_schema(schema: &Schema) -> tantivy::Result<Self> {
		let mut text = [schema.get_field(TEXT_FIELDS[0])?; TEXT_FIELDS.len()];
		for (slot, name) in text.iter_mut().zip(TEXT_FIELDS) {
			*slot = schema.get_field(name)?;
		}
		Ok(Self {
			id: schema.get_field("id")?,
			source: schema.get_field("source")?,
			text,
			active: schema.get_field(BoolField::Active.name())?,
			deleted: schema.get_field(BoolField::Deleted.name())?,
			vegan: schema.get_field(BoolField::Vegan.name())?,
			vegetarian: schema.get_field(BoolField::Vegetarian.name())?,
			gluten_free: schema.get_field(BoolField::GlutenFree.name())?,
		})
	}

	pub fn flag(&self, field: BoolField) -> Field {
		match field {
			BoolField::Active => self.active,
			BoolField::Deleted => self.deleted,
			BoolField::Vegan => self.vegan,
			BoolField::Vegetarian => self.vegetarian,
			BoolField::GlutenFree => self.gluten_free,
		}
	}
}
