//! Capability interfaces a configuration is built around.
//!
//! Each interface names a trivially satisfiable default implementation from
//! [`basic`](crate::basic), so the default configuration always builds.

use crate::basic::{
    ConstantItemScorer, InMemoryDao, PopularityItemBasedItemScorer, SimpleRatingPredictor,
    TopNItemBasedItemRecommender, TopNItemRecommender,
};
use crate::inject::{Implementation, Interface};

pub type UserId = i64;
pub type ItemId = i64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rating {
    pub user: UserId,
    pub item: ItemId,
    pub value: f64,
}

impl Rating {
    pub fn new(user: UserId, item: ItemId, value: f64) -> Self {
        Self { user, item, value }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredItem {
    pub item: ItemId,
    pub score: f64,
}

impl ScoredItem {
    pub fn new(item: ItemId, score: f64) -> Self {
        Self { item, score }
    }
}

/// Scores items for a user; higher is better.
pub trait ItemScorer: Send + Sync {
    fn score(&self, user: UserId, items: &[ItemId]) -> Vec<ScoredItem>;
}

/// Predicts ratings on the rating scale.
pub trait RatingPredictor: Send + Sync {
    fn predict(&self, user: UserId, items: &[ItemId]) -> Vec<ScoredItem>;
}

pub trait ItemRecommender: Send + Sync {
    fn recommend(&self, user: UserId, n: usize) -> Vec<ScoredItem>;
}

/// Scores items relative to a basket of reference items.
pub trait ItemBasedItemScorer: Send + Sync {
    fn score_related(&self, basket: &[ItemId], items: &[ItemId]) -> Vec<ScoredItem>;
}

pub trait ItemBasedItemRecommender: Send + Sync {
    fn recommend_related(&self, basket: &[ItemId], n: usize) -> Vec<ScoredItem>;
}

/// Read access to rating data.
pub trait DataAccessObject: Send + Sync {
    fn ratings(&self) -> &[Rating];

    fn items(&self) -> Vec<ItemId> {
        let mut items: Vec<ItemId> = self.ratings().iter().map(|r| r.item).collect();
        items.sort_unstable();
        items.dedup();
        items
    }

    fn user_ratings(&self, user: UserId) -> Vec<Rating> {
        self.ratings()
            .iter()
            .filter(|r| r.user == user)
            .copied()
            .collect()
    }
}

impl Interface for dyn ItemScorer {
    fn default_implementation() -> Option<Implementation> {
        Some(Implementation::of::<dyn ItemScorer, ConstantItemScorer>())
    }
}

impl Interface for dyn RatingPredictor {
    fn default_implementation() -> Option<Implementation> {
        Some(Implementation::of::<dyn RatingPredictor, SimpleRatingPredictor>())
    }
}

impl Interface for dyn ItemRecommender {
    fn default_implementation() -> Option<Implementation> {
        Some(Implementation::of::<dyn ItemRecommender, TopNItemRecommender>())
    }
}

impl Interface for dyn ItemBasedItemScorer {
    fn default_implementation() -> Option<Implementation> {
        Some(Implementation::of::<dyn ItemBasedItemScorer, PopularityItemBasedItemScorer>())
    }
}

impl Interface for dyn ItemBasedItemRecommender {
    fn default_implementation() -> Option<Implementation> {
        Some(Implementation::of::<dyn ItemBasedItemRecommender, TopNItemBasedItemRecommender>())
    }
}

impl Interface for dyn DataAccessObject {
    fn default_implementation() -> Option<Implementation> {
        Some(Implementation::of::<dyn DataAccessObject, InMemoryDao>())
    }
}
