use anyhow::Result;
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::query::{AllQuery, BooleanQuery, ConstScoreQuery, FuzzyTermQuery, Occur, Query, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::tokenizer::TokenStream;
use tantivy::{Index, IndexReader, TantivyDocument, TantivyError, Term};

use menudb_core::error::BackendError;
use menudb_core::stage::{SearchPipeline, SearchStage, TextMatch};
use menudb_core::traits::DocumentSearch;
use menudb_core::types::{sort_by_score, CatalogItem, RankedResult};

use crate::tantivy_utils::{register_tokenizer, CatalogFields};

/// Runs search pipelines against a catalog index.
///
/// The whole pipeline becomes one boolean query: the text match contributes
/// the score, every equality filter is a zero-score `Must` clause, and the cap
/// becomes the `TopDocs` limit. Filters are therefore applied before the cap,
/// and a pipeline placing a filter after a cap is rejected.
#[derive(Clone)]
pub struct TantivyCatalogSearch {
	index: Index,
	reader: IndexReader,
	fields: CatalogFields,
}

impl TantivyCatalogSearch {
	pub fn new(index: Index) -> Result<Self> {
		register_tokenizer(&index);
		let fields = CatalogFields::from_schema(&index.schema())?;
		let reader = index.reader()?;
		Ok(Self { index, reader, fields })
	}

	pub fn open(index_dir: &Path) -> Result<Self> {
		Self::new(Index::open_in_dir(index_dir)?)
	}

	/// Executes the pipeline on the calling thread.
	pub fn run(&self, pipeline: &SearchPipeline) -> std::result::Result<Vec<RankedResult>, BackendError> {
		let (query, cap) = self.build_query(pipeline)?;
		let searcher = self.reader.searcher();
		let limit = cap.unwrap_or_else(|| usize::try_from(searcher.num_docs()).unwrap_or(usize::MAX));
		if limit == 0 { return Ok(Vec::new()); }
		let top_docs = searcher.search(&*query, &TopDocs::with_limit(limit)).map_err(tantivy_error)?;
		let mut results = Vec::with_capacity(top_docs.len());
		for (score, doc_address) in top_docs {
			let doc: TantivyDocument = searcher.doc(doc_address).map_err(tantivy_error)?;
			let source = doc
				.get_first(self.fields.source)
				.and_then(|v| v.as_str())
				.ok_or_else(|| BackendError::new("corrupt_document", format!("{:?} has no stored source", doc_address)))?;
			let item: CatalogItem = serde_json::from_str(source).map_err(|e| BackendError::new("corrupt_document", e.to_string()))?;
			results.push(RankedResult { item, score });
		}
		if pipeline.stages().contains(&SearchStage::SortByScore) { sort_by_score(&mut results); }
		tracing::debug!(hits = results.len(), limit, "tantivy pipeline executed");
		Ok(results)
	}

	fn build_query(&self, pipeline: &SearchPipeline) -> std::result::Result<(Box<dyn Query>, Option<usize>), BackendError> {
		let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
		let mut has_text = false;
		let mut cap: Option<usize> = None;
		for stage in pipeline.stages() {
			match stage {
				SearchStage::TextMatch(m) => {
					reject_after_cap(cap, stage)?;
					if let Some(q) = self.text_query(m)? {
						clauses.push((Occur::Must, q));
						has_text = true;
					}
				}
				SearchStage::EqualityFilter { field, value } => {
					reject_after_cap(cap, stage)?;
					let term = Term::from_field_bool(self.fields.flag(*field), *value);
					let filter = TermQuery::new(term, IndexRecordOption::Basic);
					clauses.push((Occur::Must, Box::new(ConstScoreQuery::new(Box::new(filter), 0.0)) as Box<dyn Query>));
				}
				SearchStage::Cap(n) => cap = Some(cap.map_or(*n, |c| c.min(*n))),
				SearchStage::SortByScore => {}
			}
		}
		if !has_text {
			clauses.push((Occur::Must, Box::new(ConstScoreQuery::new(Box::new(AllQuery), 0.0)) as Box<dyn Query>));
		}
		Ok((Box::new(BooleanQuery::new(clauses)), cap))
	}

	/// One `Should` clause per analyzed term and text field, exact and fuzzy.
	/// Returns `None` when the analyzer leaves no terms (e.g. only stop words).
	fn text_query(&self, text: &TextMatch) -> std::result::Result<Option<Box<dyn Query>>, BackendError> {
		let mut analyzer = self.index.tokenizer_for_field(self.fields.text[0]).map_err(tantivy_error)?;
		let mut terms: Vec<String> = Vec::new();
		{
			let mut stream = analyzer.token_stream(&text.query);
			while stream.advance() {
				let token = &stream.token().text;
				if !terms.contains(token) { terms.push(token.clone()); }
			}
		}
		if terms.is_empty() { return Ok(None); }

		let mut should: Vec<(Occur, Box<dyn Query>)> = Vec::new();
		for term_text in &terms {
			let edits = text.edits_for(term_text);
			for field in self.fields.text {
				let term = Term::from_field_text(field, term_text);
				if edits > 0 {
					should.push((Occur::Should, Box::new(FuzzyTermQuery::new(term.clone(), edits, true)) as Box<dyn Query>));
				}
				should.push((Occur::Should, Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs)) as Box<dyn Query>));
			}
		}
		Ok(Some(Box::new(BooleanQuery::new(should))))
	}
}

impl DocumentSearch for TantivyCatalogSearch {
	async fn execute_pipeline(&self, pipeline: &SearchPipeline) -> std::result::Result<Vec<RankedResult>, BackendError> {
		let this = self.clone();
		let pipeline = pipeline.clone();
		tokio::task::spawn_blocking(move || this.run(&pipeline))
			.await
			.map_err(|e| BackendError::new("join", e.to_string()))?
	}
}

fn reject_after_cap(cap: Option<usize>, stage: &SearchStage) -> std::result::Result<(), BackendError> {
	match cap {
		Some(_) => Err(BackendError::new("unsupported_pipeline", format!("stage '{}' after a cap cannot be expressed as one query", stage))),
		None => Ok(()),
	}
}

fn tantivy_error(e: TantivyError) -> BackendError {
	BackendError::new("tantivy", e.to_string())
}
