use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use menudb_core::error::{BackendError, QueryError};
use menudb_core::memory::MemoryCatalog;
use menudb_core::stage::{BoolField, SearchPipeline, SearchStage};
use menudb_core::traits::DocumentSearch;
use menudb_core::types::{CatalogItem, FilterTag, RankedResult, SearchRequest};
use menudb_search::{SearchQueryComposer, RESULT_CAP};

fn item(id: &str, name: &str) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        item_type: "entree".to_string(),
        name: name.to_string(),
        photo: None,
        short_desc: format!("{} of the day", name),
        long_desc: format!("Our {} made fresh", name),
        price: 10.0,
        active: true,
        deleted: false,
        vegan: false,
        vegetarian: false,
        gluten_free: false,
        tags: vec![],
    }
}

/// Catalog whose scores are fixed per item id, independent of the query.
fn scored_catalog(items: Vec<CatalogItem>, scores: &[(&str, f32)]) -> MemoryCatalog {
    let scores: HashMap<String, f32> = scores.iter().map(|(id, s)| (id.to_string(), *s)).collect();
    MemoryCatalog::with_scorer(items, move |item, _| scores.get(&item.id).copied())
}

/// 32 items covering every combination of the five boolean flags.
fn mixed_catalog() -> Vec<CatalogItem> {
    (0..32u32)
        .map(|bits| {
            let mut it = item(&format!("m{:02}", bits), if bits % 3 == 0 { "Garden Salad" } else { "Pasta Salad" });
            it.active = bits & 1 != 0;
            it.deleted = bits & 2 != 0;
            it.vegan = bits & 4 != 0;
            it.vegetarian = bits & 8 != 0;
            it.gluten_free = bits & 16 != 0;
            it
        })
        .collect()
}

fn ids(results: &[RankedResult]) -> Vec<&str> {
    results.iter().map(|r| r.item.id.as_str()).collect()
}

struct Unavailable {
    calls: AtomicUsize,
}

impl DocumentSearch for Unavailable {
    async fn execute_pipeline(&self, _pipeline: &SearchPipeline) -> Result<Vec<RankedResult>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(BackendError::new("503", "connection refused"))
    }
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

struct Hanging {
    dropped: Arc<AtomicBool>,
}

impl DocumentSearch for Hanging {
    async fn execute_pipeline(&self, _pipeline: &SearchPipeline) -> Result<Vec<RankedResult>, BackendError> {
        let _flag = DropFlag(self.dropped.clone());
        std::future::pending::<()>().await;
        Ok(Vec::new())
    }
}

#[test]
fn compose_builds_only_applicable_stages() {
    let composer = SearchQueryComposer::new(MemoryCatalog::new(vec![]));

    let plain = composer.compose(&SearchRequest::new("salad", Vec::<&str>::new()));
    assert_eq!(
        plain.stages(),
        &[
            SearchStage::TextMatch(menudb_core::stage::TextMatch { query: "salad".to_string(), max_edits: 2 }),
            SearchStage::EqualityFilter { field: BoolField::Active, value: true },
            SearchStage::EqualityFilter { field: BoolField::Deleted, value: false },
            SearchStage::Cap(RESULT_CAP),
            SearchStage::SortByScore,
        ]
    );

    let vegan = composer.compose(&SearchRequest::new("salad", ["vegan"]));
    assert_eq!(vegan.len(), plain.len() + 1);
    assert_eq!(vegan.filters().filter(|(f, _)| *f == BoolField::Vegan).count(), 1);
    assert!(vegan.filters().all(|(f, _)| f != BoolField::Vegetarian && f != BoolField::GlutenFree));

    let all = composer.compose(&SearchRequest::new("salad", FilterTag::ALL.map(FilterTag::as_str)));
    assert_eq!(all.filters().count(), 5);
}

#[test]
fn compose_omits_text_stage_for_blank_query() {
    let composer = SearchQueryComposer::new(MemoryCatalog::new(vec![]));
    for blank in ["", "   ", "\n"] {
        let pipeline = composer.compose(&SearchRequest::new(blank, ["vegan"]));
        assert!(pipeline.text_match().is_none(), "{:?}", blank);
        assert_eq!(pipeline.cap(), Some(RESULT_CAP));
    }
}

#[test]
fn compose_clamps_typo_tolerance() {
    let composer = SearchQueryComposer::new(MemoryCatalog::new(vec![])).with_max_edits(9);
    let pipeline = composer.compose(&SearchRequest::new("salad", Vec::<&str>::new()));
    assert_eq!(pipeline.text_match().map(|m| m.max_edits), Some(2));

    let exact = SearchQueryComposer::new(MemoryCatalog::new(vec![])).with_max_edits(0);
    let pipeline = exact.compose(&SearchRequest::new("salad", Vec::<&str>::new()));
    assert_eq!(pipeline.text_match().map(|m| m.max_edits), Some(0));
}

#[tokio::test]
async fn deleted_item_is_excluded_even_with_top_score() {
    let mut items = vec![item("v1", "Kale Salad"), item("v2", "Bean Salad"), item("v3", "Rice Salad"), item("gone", "Best Salad")];
    for it in &mut items {
        it.vegan = true;
    }
    items[3].deleted = true;
    let mut meat = item("c1", "Chicken Salad");
    meat.vegan = false;
    items.push(meat);
    let backend = scored_catalog(items, &[("v3", 0.2), ("v1", 0.9), ("gone", 0.95), ("v2", 0.5), ("c1", 0.99)]);
    let composer = SearchQueryComposer::new(backend);

    let results = composer.search("salad", ["vegan"]).await.expect("search");
    assert_eq!(ids(&results), vec!["v1", "v2", "v3"]);
    let scores: Vec<f32> = results.iter().map(|r| r.score).collect();
    assert_eq!(scores, vec![0.9, 0.5, 0.2]);
}

#[tokio::test]
async fn unknown_tag_behaves_like_no_tag() {
    let composer = SearchQueryComposer::new(MemoryCatalog::new(mixed_catalog()));
    let keto = composer.search("salad", ["keto"]).await.expect("search");
    let none = composer.search("salad", Vec::<&str>::new()).await.expect("search");
    assert_eq!(keto, none);
    assert_eq!(
        composer.compose(&SearchRequest::new("salad", ["keto"])),
        composer.compose(&SearchRequest::new("salad", Vec::<&str>::new()))
    );
}

#[tokio::test]
async fn fifteen_matches_are_capped_to_the_ten_best() {
    let items: Vec<CatalogItem> = (0..15).map(|i| item(&format!("i{:02}", i), "Salad")).collect();
    // scores interleave so catalog order differs from rank order
    let scores: Vec<(String, f32)> = (0..15).map(|i| (format!("i{:02}", i), ((i * 7) % 15) as f32 / 15.0)).collect();
    let borrowed: Vec<(&str, f32)> = scores.iter().map(|(id, s)| (id.as_str(), *s)).collect();
    let composer = SearchQueryComposer::new(scored_catalog(items, &borrowed));

    let results = composer.search("salad", Vec::<&str>::new()).await.expect("search");
    assert_eq!(results.len(), RESULT_CAP);

    let mut expected = scores.clone();
    expected.sort_by(|a, b| b.1.total_cmp(&a.1));
    let expected_ids: Vec<&str> = expected.iter().take(RESULT_CAP).map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids(&results), expected_ids);
}

#[tokio::test]
async fn every_tag_combination_honours_filters_cap_and_order() {
    let composer = SearchQueryComposer::new(MemoryCatalog::new(mixed_catalog()));
    for mask in 0..8u8 {
        let tags: Vec<&str> = FilterTag::ALL
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, t)| t.as_str())
            .collect();
        for query in ["salad", "garden", "pasta sallad", ""] {
            let results = composer.search(query, &tags).await.expect("search");
            assert!(results.len() <= RESULT_CAP);
            assert!(results.iter().all(|r| r.item.is_visible()), "{} {:?}", query, tags);
            for tag in &tags {
                let field = tag.parse::<FilterTag>().expect("known tag").field();
                assert!(results.iter().all(|r| r.item.flag(field)), "{} {:?}", query, tags);
            }
            assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        }
    }
}

#[tokio::test]
async fn absent_tags_leave_attributes_unconstrained() {
    let composer = SearchQueryComposer::new(MemoryCatalog::new(mixed_catalog()));
    let results = composer.search("", ["vegan"]).await.expect("search");
    // visible vegan items: 4 of 32 combos per remaining flag pair, capped at ten
    assert_eq!(results.len(), 4);
    assert!(results.iter().any(|r| !r.item.vegetarian));
    assert!(results.iter().any(|r| r.item.vegetarian));
    assert!(results.iter().any(|r| !r.item.gluten_free));
    assert!(results.iter().any(|r| r.item.gluten_free));
}

#[tokio::test]
async fn empty_text_does_not_exclude_everything() {
    let composer = SearchQueryComposer::new(MemoryCatalog::new(mixed_catalog()));
    let results = composer.search("", Vec::<&str>::new()).await.expect("search");
    // 8 visible items in the mixed catalog
    assert_eq!(results.len(), 8);
    assert!(results.iter().all(|r| r.item.is_visible()));
}

#[tokio::test]
async fn repeated_searches_are_identical() {
    let composer = SearchQueryComposer::new(MemoryCatalog::new(mixed_catalog()));
    let first = composer.search("salad", ["vegetarian"]).await.expect("search");
    let second = composer.search("salad", ["vegetarian"]).await.expect("search");
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[tokio::test]
async fn zero_matches_is_an_empty_result_not_an_error() {
    let composer = SearchQueryComposer::new(MemoryCatalog::new(mixed_catalog()));
    let results = composer.search("zucchini", Vec::<&str>::new()).await.expect("search");
    assert!(results.is_empty());
}

#[tokio::test]
async fn backend_failure_is_surfaced_unchanged_and_not_retried() {
    let composer = SearchQueryComposer::new(Unavailable { calls: AtomicUsize::new(0) });
    let err = composer.search("salad", ["vegan"]).await.expect_err("backend is down");
    match err {
        QueryError::BackendUnavailable(e) => assert_eq!(e, BackendError::new("503", "connection refused")),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(composer.backend().calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dropping_the_search_drops_the_backend_call() {
    let dropped = Arc::new(AtomicBool::new(false));
    let composer = SearchQueryComposer::new(Hanging { dropped: dropped.clone() });
    let outcome = tokio::time::timeout(Duration::from_millis(20), composer.search("salad", ["vegan"])).await;
    assert!(outcome.is_err(), "hanging backend never completes");
    assert!(dropped.load(Ordering::SeqCst));
}

#[tokio::test]
async fn tantivy_backend_end_to_end() {
    let mut items = vec![];
    for i in 0..15 {
        let mut it = item(&format!("s{:02}", i), "Green Salad");
        it.vegan = i % 3 == 0;
        items.push(it);
    }
    let mut gone = item("gone", "Green Salad");
    gone.vegan = true;
    gone.deleted = true;
    items.push(gone);

    let index = menudb_text::CatalogIndex::create_in_ram().expect("index");
    index.index_items(&items).expect("index items");
    let composer = SearchQueryComposer::new(index.searcher().expect("searcher"));

    let all = composer.search("salad", Vec::<&str>::new()).await.expect("search");
    assert_eq!(all.len(), RESULT_CAP);
    assert!(all.iter().all(|r| r.item.is_visible()));

    let vegan = composer.search("sallad", ["vegan", "keto"]).await.expect("search");
    let mut got: Vec<&str> = ids(&vegan);
    got.sort();
    assert_eq!(got, vec!["s00", "s03", "s06", "s09", "s12"]);
    assert!(vegan.windows(2).all(|w| w[0].score >= w[1].score));

    let browse = composer.search("", ["vegan"]).await.expect("search");
    assert_eq!(browse.len(), 5);

    let again = composer.search("sallad", ["vegan"]).await.expect("search");
    assert_eq!(vegan, again);
}
