//! Faceted menu search.
//!
//! `SearchQueryComposer` turns a free-text query plus dietary tags into a
//! search pipeline and runs it against any `DocumentSearch` backend:
//!
//! 1. fuzzy text match over all text fields (omitted for blank text)
//! 2. `active == true`, `deleted == false`
//! 3. one `== true` filter per requested tag, nothing for tags not requested
//! 4. cap at [`RESULT_CAP`]
//! 5. sort by score, descending

use menudb_core::config::MAX_FUZZY_EDITS;
use menudb_core::error::QueryError;
use menudb_core::stage::{BoolField, SearchPipeline, SearchStage, TextMatch};
use menudb_core::traits::DocumentSearch;
use menudb_core::types::{RankedResult, SearchRequest};

/// Maximum number of results a search returns.
pub const RESULT_CAP: usize = 10;

pub struct SearchQueryComposer<B> where B: DocumentSearch {
    backend: B,
    max_edits: u8,
}

impl<B> SearchQueryComposer<B> where B: DocumentSearch {
    pub fn new(backend: B) -> Self { Self { backend, max_edits: MAX_FUZZY_EDITS } }

    /// Limits typo tolerance of the text stage; values above the supported
    /// maximum are clamped.
    pub fn with_max_edits(mut self, max_edits: u8) -> Self {
        self.max_edits = max_edits.min(MAX_FUZZY_EDITS);
        self
    }

    pub fn backend(&self) -> &B { &self.backend }

    /// Builds the stage list for one request. Only applicable stages are present.
    pub fn compose(&self, request: &SearchRequest) -> SearchPipeline {
        let mut stages = Vec::with_capacity(4 + request.tags.len());
        if let Some(query) = request.query_text() {
            stages.push(SearchStage::TextMatch(TextMatch { query: query.to_string(), max_edits: self.max_edits }));
        }
        stages.push(SearchStage::EqualityFilter { field: BoolField::Active, value: true });
        stages.push(SearchStage::EqualityFilter { field: BoolField::Deleted, value: false });
        for tag in &request.tags {
            stages.push(SearchStage::EqualityFilter { field: tag.field(), value: true });
        }
        stages.push(SearchStage::Cap(RESULT_CAP));
        stages.push(SearchStage::SortByScore);
        SearchPipeline::new(stages)
    }

    /// Searches with raw tag strings; unrecognized tags are dropped.
    pub async fn search<I, S>(&self, text: &str, tags: I) -> Result<Vec<RankedResult>, QueryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let request = SearchRequest::new(text, tags);
        self.execute(&request).await
    }

    /// Runs one request. Backend failures are returned as-is, never retried.
    pub async fn execute(&self, request: &SearchRequest) -> Result<Vec<RankedResult>, QueryError> {
        let pipeline = self.compose(request);
        tracing::debug!(stages = pipeline.len(), tags = request.tags.len(), "composed search pipeline");
        let results = self.backend.execute_pipeline(&pipeline).await.map_err(|e| {
            tracing::warn!(code = %e.code, "search backend failed");
            QueryError::BackendUnavailable(e)
        })?;
        tracing::info!(hits = results.len(), "search complete");
        Ok(results)
    }
}
