//! In-memory pipeline interpreter.
//!
//! Runs every stage literally, in order, over a catalog held in a `Vec`. Used
//! as the reference backend in tests and for small catalogs that do not
//! warrant an index.

use crate::error::BackendError;
use crate::stage::{SearchPipeline, SearchStage, TextMatch};
use crate::traits::DocumentSearch;
use crate::types::{CatalogItem, RankedResult};

/// Scores one item against a text match. `None` means the item does not match.
pub type Scorer = dyn Fn(&CatalogItem, &TextMatch) -> Option<f32> + Send + Sync;

pub struct MemoryCatalog {
    items: Vec<CatalogItem>,
    scorer: Box<Scorer>,
}

impl MemoryCatalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self::with_scorer(items, fuzzy_token_score)
    }

    pub fn with_scorer<F>(items: Vec<CatalogItem>, scorer: F) -> Self
    where
        F: Fn(&CatalogItem, &TextMatch) -> Option<f32> + Send + Sync + 'static,
    {
        Self { items, scorer: Box::new(scorer) }
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Interprets the pipeline synchronously.
    pub fn run(&self, pipeline: &SearchPipeline) -> Vec<RankedResult> {
        // (position in catalog, score)
        let mut rows: Vec<(usize, f32)> = (0..self.items.len()).map(|i| (i, 0.0)).collect();
        for stage in pipeline.stages() {
            match stage {
                SearchStage::TextMatch(m) => {
                    rows = rows
                        .into_iter()
                        .filter_map(|(i, _)| (self.scorer)(&self.items[i], m).map(|s| (i, s)))
                        .collect();
                    rows.sort_by(|a, b| b.1.total_cmp(&a.1));
                }
                SearchStage::EqualityFilter { field, value } => {
                    rows.retain(|(i, _)| self.items[*i].flag(*field) == *value);
                }
                SearchStage::Cap(n) => rows.truncate(*n),
                SearchStage::SortByScore => rows.sort_by(|a, b| b.1.total_cmp(&a.1)),
            }
        }
        rows.into_iter()
            .map(|(i, score)| RankedResult { item: self.items[i].clone(), score })
            .collect()
    }
}

impl DocumentSearch for MemoryCatalog {
    async fn execute_pipeline(&self, pipeline: &SearchPipeline) -> Result<Vec<RankedResult>, BackendError> {
        Ok(self.run(pipeline))
    }
}

/// Default scorer: every query term is matched against every token of the
/// item's text fields, tolerating `TextMatch::edits_for` edits. An exact hit
/// counts 1.0, a hit at distance `d` counts `1 / (1 + d)`. The score is the
/// mean over query terms; an item with no hit at all does not match.
pub fn fuzzy_token_score(item: &CatalogItem, text: &TextMatch) -> Option<f32> {
    let terms = tokenize(&text.query);
    if terms.is_empty() {
        return Some(0.0);
    }
    let tokens: Vec<String> = item.text_fields().flat_map(tokenize).collect();
    let mut total = 0.0_f32;
    for term in &terms {
        let edits = usize::from(text.edits_for(term));
        let best = tokens
            .iter()
            .filter_map(|token| {
                let distance = if token == term { 0 } else { strsim::levenshtein(token, term) };
                (distance <= edits).then(|| 1.0 / (1.0 + distance as f32))
            })
            .fold(0.0_f32, f32::max);
        total += best;
    }
    (total > 0.0).then(|| total / terms.len() as f32)
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}
