//! Domain types shared by the composer and the search backends.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::stage::BoolField;

pub type ItemId = String;

/// A menu item as stored in the catalog.
///
/// - `id`: stable item identifier
/// - `item_type`: free-form kind ("entree", "drink", ...), searchable as text
/// - `photo`: reference to an image, never interpreted here
/// - `short_desc`/`long_desc`: searchable descriptions
/// - dietary flags drive the tag filters; `active`/`deleted` drive visibility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: ItemId,
    #[serde(default)]
    pub item_type: String,
    pub name: String,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub short_desc: String,
    #[serde(default)]
    pub long_desc: String,
    pub price: f64,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub vegan: bool,
    #[serde(default)]
    pub vegetarian: bool,
    #[serde(default)]
    pub gluten_free: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CatalogItem {
    /// Value of one of the boolean attributes a pipeline can filter on.
    pub fn flag(&self, field: BoolField) -> bool {
        match field {
            BoolField::Active => self.active,
            BoolField::Deleted => self.deleted,
            BoolField::Vegan => self.vegan,
            BoolField::Vegetarian => self.vegetarian,
            BoolField::GlutenFree => self.gluten_free,
        }
    }

    /// Whether the item may be surfaced to a caller at all.
    pub fn is_visible(&self) -> bool {
        self.active && !self.deleted
    }

    /// Every searchable text value of the item, in a fixed order.
    pub fn text_fields(&self) -> impl Iterator<Item = &str> {
        [
            self.name.as_str(),
            self.item_type.as_str(),
            self.short_desc.as_str(),
            self.long_desc.as_str(),
        ]
        .into_iter()
        .chain(self.tags.iter().map(String::as_str))
    }

    /// Checks the same constraints the item editor enforces.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::InvalidItem("item has an empty id".to_string()));
        }
        let required = [
            ("name", &self.name),
            ("shortDesc", &self.short_desc),
            ("longDesc", &self.long_desc),
        ];
        for (label, value) in required {
            if value.trim().is_empty() {
                return Err(Error::InvalidItem(format!("{}: {} must not be empty", self.id, label)));
            }
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(Error::InvalidItem(format!("{}: price must be positive, got {}", self.id, self.price)));
        }
        Ok(())
    }
}

/// The closed set of dietary tags a caller may filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterTag {
    Vegan,
    Vegetarian,
    GlutenFree,
}

impl FilterTag {
    pub const ALL: [FilterTag; 3] = [FilterTag::Vegan, FilterTag::Vegetarian, FilterTag::GlutenFree];

    /// The boolean attribute this tag constrains to `true`.
    pub fn field(self) -> BoolField {
        match self {
            FilterTag::Vegan => BoolField::Vegan,
            FilterTag::Vegetarian => BoolField::Vegetarian,
            FilterTag::GlutenFree => BoolField::GlutenFree,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FilterTag::Vegan => "vegan",
            FilterTag::Vegetarian => "vegetarian",
            FilterTag::GlutenFree => "glutenFree",
        }
    }
}

impl fmt::Display for FilterTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case, `_` and `-` are ignored, so `glutenFree`, `glutenfree` and
/// `gluten-free` all name the same tag.
impl FromStr for FilterTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "vegan" => Ok(FilterTag::Vegan),
            "vegetarian" => Ok(FilterTag::Vegetarian),
            "glutenfree" => Ok(FilterTag::GlutenFree),
            _ => Err(Error::NotFound(format!("filter tag '{}'", s))),
        }
    }
}

/// One caller search: free text plus the recognized subset of requested tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    pub text: String,
    pub tags: BTreeSet<FilterTag>,
}

impl SearchRequest {
    /// Builds a request from raw tag strings. Unrecognized tags are dropped.
    pub fn new<I, S>(text: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut recognized = BTreeSet::new();
        for raw in tags {
            match raw.as_ref().parse::<FilterTag>() {
                Ok(tag) => {
                    recognized.insert(tag);
                }
                Err(_) => tracing::debug!(tag = raw.as_ref(), "dropping unrecognized filter tag"),
            }
        }
        Self { text: text.into(), tags: recognized }
    }

    /// The text to match, or `None` when the query carries no text at all.
    pub fn query_text(&self) -> Option<&str> {
        let trimmed = self.text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

/// A catalog item together with the relevance score the backend assigned.
///
/// Higher is better. Items are only comparable within one result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    #[serde(flatten)]
    pub item: CatalogItem,
    pub score: f32,
}

/// Stable sort by score, highest first. Equal scores keep their input order.
pub fn sort_by_score(results: &mut [RankedResult]) {
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
}
