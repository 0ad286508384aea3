//! Search pipeline model.
//!
//! A pipeline is an ordered list of stages. Only the stages that apply to a
//! request are ever built; there are no disabled placeholder stages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Boolean catalog attributes that equality filters can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BoolField {
    Active,
    Deleted,
    Vegan,
    Vegetarian,
    GlutenFree,
}

impl BoolField {
    pub const ALL: [BoolField; 5] = [
        BoolField::Active,
        BoolField::Deleted,
        BoolField::Vegan,
        BoolField::Vegetarian,
        BoolField::GlutenFree,
    ];

    /// Field name as used in catalog documents and index schemas.
    pub fn name(self) -> &'static str {
        match self {
            BoolField::Active => "active",
            BoolField::Deleted => "deleted",
            BoolField::Vegan => "vegan",
            BoolField::Vegetarian => "vegetarian",
            BoolField::GlutenFree => "glutenFree",
        }
    }
}

/// Full-text relevance match across every text field of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMatch {
    pub query: String,
    /// Maximum Levenshtein distance tolerated per query term. `0` disables fuzziness.
    pub max_edits: u8,
}

impl TextMatch {
    /// Edit distance allowed for a term of the given length. Very short terms
    /// only match exactly.
    pub fn edits_for(&self, term: &str) -> u8 {
        let allowed = match term.chars().count() {
            0..=2 => 0,
            3..=5 => 1,
            _ => 2,
        };
        allowed.min(self.max_edits)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "args", rename_all = "camelCase")]
pub enum SearchStage {
    TextMatch(TextMatch),
    EqualityFilter { field: BoolField, value: bool },
    Cap(usize),
    SortByScore,
}

impl fmt::Display for SearchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchStage::TextMatch(m) => write!(f, "text {:?} (fuzzy, max edits {})", m.query, m.max_edits),
            SearchStage::EqualityFilter { field, value } => write!(f, "filter {} == {}", field.name(), value),
            SearchStage::Cap(n) => write!(f, "cap {}", n),
            SearchStage::SortByScore => f.write_str("sort score desc"),
        }
    }
}

/// An ordered, immutable sequence of stages built for one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPipeline {
    stages: Vec<SearchStage>,
}

impl SearchPipeline {
    pub fn new(stages: Vec<SearchStage>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[SearchStage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn text_match(&self) -> Option<&TextMatch> {
        self.stages.iter().find_map(|s| match s {
            SearchStage::TextMatch(m) => Some(m),
            _ => None,
        })
    }

    pub fn filters(&self) -> impl Iterator<Item = (BoolField, bool)> + '_ {
        self.stages.iter().filter_map(|s| match s {
            SearchStage::EqualityFilter { field, value } => Some((*field, *value)),
            _ => None,
        })
    }

    /// The smallest cap in the pipeline, if any.
    pub fn cap(&self) -> Option<usize> {
        self.stages
            .iter()
            .filter_map(|s| match s {
                SearchStage::Cap(n) => Some(*n),
                _ => None,
            })
            .min()
    }
}

impl fmt::Display for SearchPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            writeln!(f, "{:>2}. {}", i + 1, stage)?;
        }
        Ok(())
    }
}
