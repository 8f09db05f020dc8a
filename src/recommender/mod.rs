//! Content-based related-product recommender.
//!
//! Products are turned into feature texts, vectorised with TF-IDF weights fitted
//! on the snapshot being queried, and ranked by cosine similarity to the target.
//! Every computation is a pure function of its snapshot; nothing is shared
//! between fits.

pub mod features;
pub mod similarity;
pub mod tfidf;
pub mod tokenizer;

use crate::{
    error::{ApiError, Result},
    models::{Product, ScoredProduct},
};
use features::FeatureTextBuilder;
use serde::{Deserialize, Serialize};
use similarity::{rank_by_score, scores_against, SimilarityMatrix};
use std::collections::HashSet;
use tfidf::{TfidfMatrix, TfidfVectorizer};
use tracing::debug;

/// How the requested `k` bounds the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopKMode {
    /// `k` products after the target has been excluded
    #[default]
    Survivors,
    /// The first `k` ranked entries, target included, minus the target
    Candidates,
}

#[derive(Debug, Clone)]
pub struct RecommenderConfig {
    pub top_k: usize,
    pub top_k_mode: TopKMode,
    pub include_description: bool,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            top_k_mode: TopKMode::Survivors,
            include_description: true,
        }
    }
}

/// Outcome of a recommendation request.
#[derive(Debug, Clone, PartialEq)]
pub enum Recommendations {
    Ranked(Vec<ScoredProduct>),
    /// The snapshot holds at most one product, so nothing can be recommended.
    InsufficientCatalog,
}

impl Recommendations {
    pub fn len(&self) -> usize {
        match self {
            Recommendations::Ranked(items) => items.len(),
            Recommendations::InsufficientCatalog => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<&str> {
        match self {
            Recommendations::Ranked(items) => {
                items.iter().map(|item| item.product.id.as_str()).collect()
            }
            Recommendations::InsufficientCatalog => Vec::new(),
        }
    }

    pub fn into_products(self) -> Vec<Product> {
        match self {
            Recommendations::Ranked(items) => items.into_iter().map(|item| item.product).collect(),
            Recommendations::InsufficientCatalog => Vec::new(),
        }
    }
}

/// Position of the first product with `id` in the snapshot. Ids compare
/// ASCII case-insensitively.
pub fn locate(snapshot: &[Product], id: &str) -> Result<usize> {
    snapshot
        .iter()
        .position(|product| product.id.eq_ignore_ascii_case(id))
        .ok_or_else(|| ApiError::TargetNotFound(id.to_string()))
}

#[derive(Debug, Clone)]
pub struct Recommender {
    config: RecommenderConfig,
    features: FeatureTextBuilder,
    vectorizer: TfidfVectorizer,
}

impl Recommender {
    pub fn new(config: RecommenderConfig) -> Self {
        Self {
            features: FeatureTextBuilder::new(config.include_description),
            vectorizer: TfidfVectorizer::new(),
            config,
        }
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// Vectorise a snapshot. The returned catalog owns the snapshot it was fitted on.
    pub fn fit(&self, snapshot: Vec<Product>) -> Result<FittedCatalog> {
        let texts = self.features.build_all(&snapshot);
        let tfidf = self.vectorizer.fit_transform(&texts)?;
        debug!(
            "Fitted {} products over a vocabulary of {} terms",
            tfidf.n_documents(),
            tfidf.vocabulary_size()
        );

        Ok(FittedCatalog {
            products: snapshot,
            tfidf,
            top_k_mode: self.config.top_k_mode,
        })
    }

    /// Related products for `target_id` within `snapshot`.
    ///
    /// `k` falls back to the configured default. A missing target is an error;
    /// a snapshot of one product yields [`Recommendations::InsufficientCatalog`]
    /// without any vectorisation work.
    pub fn recommend(
        &self,
        snapshot: &[Product],
        target_id: &str,
        k: Option<usize>,
    ) -> Result<Recommendations> {
        let target = locate(snapshot, target_id)?;
        if snapshot.len() <= 1 {
            return Ok(Recommendations::InsufficientCatalog);
        }

        let fitted = self.fit(snapshot.to_vec())?;
        Ok(fitted.recommend_at(target, k.unwrap_or(self.config.top_k)))
    }
}

impl Default for Recommender {
    fn default() -> Self {
        Self::new(RecommenderConfig::default())
    }
}

/// A snapshot together with its TF-IDF fit.
#[derive(Debug, Clone)]
pub struct FittedCatalog {
    products: Vec<Product>,
    tfidf: TfidfMatrix,
    top_k_mode: TopKMode,
}

impl FittedCatalog {
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.tfidf.vocabulary_size()
    }

    /// Rank every product against the product at `target`, which must be a
    /// valid position in this catalog.
    pub fn recommend_at(&self, target: usize, k: usize) -> Recommendations {
        if self.products.len() <= 1 {
            return Recommendations::InsufficientCatalog;
        }
        let scores = scores_against(&self.tfidf, target);
        Recommendations::Ranked(self.select(rank_by_score(scores.view()), target, k))
    }

    pub fn similarity_matrix(&self) -> SimilarityMatrix {
        SimilarityMatrix::compute(&self.tfidf)
    }

    pub fn similarity_matrix_with_progress<F: FnMut(usize)>(&self, on_row: F) -> SimilarityMatrix {
        SimilarityMatrix::compute_with_progress(&self.tfidf, on_row)
    }

    /// Same as [`FittedCatalog::recommend_at`] but reading scores from a precomputed matrix.
    pub fn related_from(
        &self,
        matrix: &SimilarityMatrix,
        target: usize,
        k: usize,
    ) -> Recommendations {
        if self.products.len() <= 1 {
            return Recommendations::InsufficientCatalog;
        }
        Recommendations::Ranked(self.select(rank_by_score(matrix.row(target)), target, k))
    }

    /// Drop the target and duplicate ids from a ranking, then cut it to `k`.
    fn select(&self, ranked: Vec<(usize, f64)>, target: usize, k: usize) -> Vec<ScoredProduct> {
        let target_id = self.products[target].id.to_ascii_lowercase();
        let window = match self.top_k_mode {
            TopKMode::Survivors => ranked.len(),
            TopKMode::Candidates => k,
        };

        let mut seen: HashSet<String> = HashSet::with_capacity(k.min(ranked.len()) + 1);
        seen.insert(target_id);

        ranked
            .into_iter()
            .take(window)
            .filter(|&(index, _)| {
                index != target && seen.insert(self.products[index].id.to_ascii_lowercase())
            })
            .take(k)
            .map(|(index, score)| ScoredProduct {
                product: self.products[index].clone(),
                score,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn product(id: &str, name: &str, category: &str) -> Product {
        Product::new(id, name, category)
    }

    fn recommend_ids(
        recommender: &Recommender,
        catalog: &[Product],
        target: &str,
        k: usize,
    ) -> Vec<String> {
        recommender
            .recommend(catalog, target, Some(k))
            .unwrap()
            .ids()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_single_product_catalog_is_insufficient() {
        let catalog = vec![product("1", "Red Shoes", "Footwear")];

        let result = Recommender::default().recommend(&catalog, "1", None).unwrap();
        assert_eq!(result, Recommendations::InsufficientCatalog);
        assert!(result.into_products().is_empty());
    }

    #[test]
    fn test_shared_vocabulary_ranks_first() {
        let catalog = vec![
            product("1", "Red Running Shoes", "Footwear"),
            product("2", "Blue Running Shoes", "Footwear"),
            product("3", "Office Chair", "Furniture"),
        ];

        assert_eq!(
            recommend_ids(&Recommender::default(), &catalog, "1", 4),
            vec!["2", "3"]
        );
    }

    #[test]
    fn test_unknown_target_is_not_found() {
        let catalog = vec![
            product("1", "Red Shoes", "Footwear"),
            product("2", "Blue Shoes", "Footwear"),
        ];

        let err = Recommender::default()
            .recommend(&catalog, "not-a-real-id", None)
            .unwrap_err();
        assert!(matches!(err, ApiError::TargetNotFound(_)));
    }

    #[test]
    fn test_empty_catalog_has_no_target() {
        let err = Recommender::default()
            .recommend(&[], "1", None)
            .unwrap_err();
        assert!(matches!(err, ApiError::TargetNotFound(_)));
    }

    #[test]
    fn test_identical_texts_fall_back_to_snapshot_order() {
        let catalog: Vec<Product> = (1..=6)
            .map(|i| product(&i.to_string(), "Steel Water Bottle", "Kitchen"))
            .collect();

        let fitted = Recommender::default().fit(catalog).unwrap();
        let Recommendations::Ranked(items) = fitted.recommend_at(3, 4) else {
            panic!("expected ranked recommendations");
        };

        let ids: Vec<&str> = items.iter().map(|item| item.product.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "5"]);
        assert!(items.iter().all(|item| (item.score - 1.0).abs() < 1e-9));
    }

    #[test]
    fn test_stop_word_target_scores_zero_everywhere() {
        let catalog = vec![
            product("1", "Desk Lamp", "Lighting"),
            product("2", "The", "And"),
            product("3", "Floor Lamp", "Lighting"),
            product("4", "Office Chair", "Furniture"),
        ];

        let fitted = Recommender::default().fit(catalog).unwrap();
        let Recommendations::Ranked(items) = fitted.recommend_at(1, 4) else {
            panic!("expected ranked recommendations");
        };

        let ids: Vec<&str> = items.iter().map(|item| item.product.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3", "4"]);
        assert!(items.iter().all(|item| item.score == 0.0));
    }

    #[test]
    fn test_description_changes_ranking() {
        let catalog = vec![
            product("1", "Trail Runner", "Footwear").with_description("waterproof leather"),
            product("2", "City Sneaker", "Footwear"),
            product("3", "Hiking Jacket", "Outerwear").with_description("waterproof leather"),
        ];

        let with_description = Recommender::default();
        assert_eq!(
            recommend_ids(&with_description, &catalog, "1", 1),
            vec!["3"]
        );

        let without_description = Recommender::new(RecommenderConfig {
            include_description: false,
            ..RecommenderConfig::default()
        });
        assert_eq!(
            recommend_ids(&without_description, &catalog, "1", 1),
            vec!["2"]
        );
    }

    #[test]
    fn test_candidates_mode_counts_the_target() {
        let catalog = vec![
            product("1", "Red Running Shoes", "Footwear"),
            product("2", "Blue Running Shoes", "Footwear"),
            product("3", "Green Running Shoes", "Footwear"),
            product("4", "Office Chair", "Furniture"),
        ];

        let survivors = Recommender::default();
        assert_eq!(recommend_ids(&survivors, &catalog, "1", 2).len(), 2);

        let candidates = Recommender::new(RecommenderConfig {
            top_k_mode: TopKMode::Candidates,
            ..RecommenderConfig::default()
        });
        assert_eq!(recommend_ids(&candidates, &catalog, "1", 2), vec!["2"]);
    }

    #[test]
    fn test_duplicate_ids_never_repeat_or_leak_target() {
        let catalog = vec![
            product("1", "Red Running Shoes", "Footwear"),
            product("2", "Blue Running Shoes", "Footwear"),
            product("1", "Red Running Shoes", "Footwear"),
            product("2", "Blue Running Shoes", "Footwear"),
            product("3", "Office Chair", "Furniture"),
        ];

        assert_eq!(
            recommend_ids(&Recommender::default(), &catalog, "1", 4),
            vec!["2", "3"]
        );
    }

    #[test]
    fn test_ids_match_regardless_of_case() {
        let catalog = vec![
            product("AB12", "Red Running Shoes", "Footwear"),
            product("cd34", "Blue Running Shoes", "Footwear"),
            product("ab12", "Red Running Shoes", "Footwear"),
            product("EF56", "Office Chair", "Furniture"),
        ];

        assert_eq!(locate(&catalog, "ab12").unwrap(), 0);
        assert_eq!(locate(&catalog, "Cd34").unwrap(), 1);
        assert_eq!(
            recommend_ids(&Recommender::default(), &catalog, "ab12", 4),
            vec!["cd34", "EF56"]
        );
    }

    #[test]
    fn test_matrix_ranking_matches_direct_ranking() {
        let catalog = vec![
            product("1", "Red Running Shoes", "Footwear"),
            product("2", "Blue Running Shoes", "Footwear"),
            product("3", "Office Chair", "Furniture"),
            product("4", "Running Socks", "Footwear"),
        ];

        let fitted = Recommender::default().fit(catalog).unwrap();
        let matrix = fitted.similarity_matrix();
        for target in 0..fitted.len() {
            assert_eq!(
                fitted.related_from(&matrix, target, 3),
                fitted.recommend_at(target, 3)
            );
        }
    }

    const WORDS: &[&str] = &[
        "red", "blue", "running", "shoes", "office", "chair", "lamp", "desk", "the", "and",
    ];

    fn catalog_strategy() -> impl Strategy<Value = Vec<Product>> {
        prop::collection::vec(
            (
                prop::collection::vec(prop::sample::select(WORDS), 0..4),
                prop::sample::select(WORDS),
            ),
            0..12,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (name, category))| product(&i.to_string(), &name.join(" "), category))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_result_excludes_target_and_respects_bounds(
            catalog in catalog_strategy(),
            target_seed in any::<usize>(),
            k in 1usize..8,
        ) {
            prop_assume!(!catalog.is_empty());
            let target = &catalog[target_seed % catalog.len()].id;

            let result = Recommender::default()
                .recommend(&catalog, target, Some(k))
                .unwrap();

            prop_assert!(result.len() <= k.min(catalog.len() - 1));
            prop_assert!(!result.ids().contains(&target.as_str()));
            if catalog.len() <= 1 {
                prop_assert_eq!(result, Recommendations::InsufficientCatalog);
            }
        }

        #[test]
        fn prop_recomputation_is_deterministic(
            catalog in catalog_strategy(),
            target_seed in any::<usize>(),
            k in 1usize..8,
        ) {
            prop_assume!(!catalog.is_empty());
            let target = &catalog[target_seed % catalog.len()].id;
            let recommender = Recommender::default();

            let first = recommender.recommend(&catalog, target, Some(k)).unwrap();
            let second = recommender.recommend(&catalog, target, Some(k)).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_scores_are_non_increasing_and_ties_keep_snapshot_order(
            catalog in catalog_strategy(),
            target_seed in any::<usize>(),
        ) {
            prop_assume!(catalog.len() >= 2);
            let target = &catalog[target_seed % catalog.len()].id;

            let result = Recommender::default()
                .recommend(&catalog, target, Some(catalog.len()))
                .unwrap();
            let Recommendations::Ranked(items) = result else {
                return Err(TestCaseError::fail("expected ranked recommendations"));
            };

            for pair in items.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
                if pair[0].score == pair[1].score {
                    let first: usize = pair[0].product.id.parse().unwrap();
                    let second: usize = pair[1].product.id.parse().unwrap();
                    prop_assert!(first < second);
                }
            }
        }
    }
}
