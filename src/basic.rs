//! Baseline components: the defaults every interface falls back to, plus
//! a few simple alternatives.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::api::{
    DataAccessObject, ItemBasedItemRecommender, ItemBasedItemScorer, ItemId, ItemRecommender,
    ItemScorer, Rating, RatingPredictor, ScoredItem, UserId,
};
use crate::inject::{
    Arguments, BoxError, Component, Dependency, Implementation, Interface, Parameter,
    ParameterValue,
};

/// Score assigned by [`ConstantItemScorer`].
pub const CONSTANT_SCORE: Parameter<f64> =
    Parameter::with_default("constant_score", ParameterValue::Double(0.0));

/// Highest scores first; equal scores by item id.
fn top_n(mut scored: Vec<ScoredItem>, n: usize) -> Vec<ScoredItem> {
    scored.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.item.cmp(&b.item)));
    scored.truncate(n);
    scored
}

/// Scores every item with the same value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantItemScorer {
    score: f64,
}

impl ConstantItemScorer {
    pub fn new(score: f64) -> Self {
        Self { score }
    }

    pub fn value(&self) -> f64 {
        self.score
    }
}

impl ItemScorer for ConstantItemScorer {
    fn score(&self, _user: UserId, items: &[ItemId]) -> Vec<ScoredItem> {
        items
            .iter()
            .map(|&item| ScoredItem::new(item, self.score))
            .collect()
    }
}

impl Component for ConstantItemScorer {
    const SHAREABLE: bool = true;

    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::parameter(&CONSTANT_SCORE)]
    }

    fn construct(args: &Arguments) -> Result<Self, BoxError> {
        Ok(Self::new(args.parameter(&CONSTANT_SCORE)?))
    }
}

impl Interface for ConstantItemScorer {}

crate::provides!(ConstantItemScorer => dyn ItemScorer);

/// Ratings held in memory. Built from a configuration it starts empty; bind
/// or add a populated one to supply data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemoryDao {
    ratings: Vec<Rating>,
}

impl InMemoryDao {
    pub fn new(ratings: Vec<Rating>) -> Self {
        Self { ratings }
    }
}

impl DataAccessObject for InMemoryDao {
    fn ratings(&self) -> &[Rating] {
        &self.ratings
    }
}

impl Component for InMemoryDao {
    const SHAREABLE: bool = true;

    fn construct(_: &Arguments) -> Result<Self, BoxError> {
        Ok(Self::default())
    }
}

impl Interface for InMemoryDao {}

crate::provides!(InMemoryDao => dyn DataAccessObject);

/// Per-item rating counts and means, plus the global mean.
///
/// Expensive to compute over a large data set, so one summary is shared by
/// every component that resolves it against the same data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingSummary {
    global_mean: f64,
    items: HashMap<ItemId, (usize, f64)>,
}

impl RatingSummary {
    pub fn from_dao(dao: &dyn DataAccessObject) -> Self {
        let mut sums: HashMap<ItemId, (usize, f64)> = HashMap::new();
        let mut total = 0.0;
        for rating in dao.ratings() {
            let entry = sums.entry(rating.item).or_default();
            entry.0 += 1;
            entry.1 += rating.value;
            total += rating.value;
        }
        let count = dao.ratings().len();
        let global_mean = if count == 0 { 0.0 } else { total / count as f64 };
        let items = sums
            .into_iter()
            .map(|(item, (n, sum))| (item, (n, sum / n as f64)))
            .collect();
        Self { global_mean, items }
    }

    pub fn global_mean(&self) -> f64 {
        self.global_mean
    }

    pub fn rating_count(&self, item: ItemId) -> usize {
        self.items.get(&item).map_or(0, |&(n, _)| n)
    }

    pub fn item_mean(&self, item: ItemId) -> Option<f64> {
        self.items.get(&item).map(|&(_, mean)| mean)
    }
}

impl Component for RatingSummary {
    const SHAREABLE: bool = true;

    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::on::<dyn DataAccessObject>()]
    }

    fn construct(args: &Arguments) -> Result<Self, BoxError> {
        let dao = args.get::<dyn DataAccessObject>()?;
        Ok(Self::from_dao(dao.as_ref()))
    }
}

impl Interface for RatingSummary {
    fn default_implementation() -> Option<Implementation> {
        Some(Implementation::of::<RatingSummary, RatingSummary>())
    }
}

/// Scores every item with the global mean rating.
#[derive(Debug, Clone)]
pub struct GlobalMeanRatingItemScorer {
    summary: Arc<RatingSummary>,
}

impl GlobalMeanRatingItemScorer {
    pub fn new(summary: Arc<RatingSummary>) -> Self {
        Self { summary }
    }
}

impl ItemScorer for GlobalMeanRatingItemScorer {
    fn score(&self, _user: UserId, items: &[ItemId]) -> Vec<ScoredItem> {
        let mean = self.summary.global_mean();
        items.iter().map(|&item| ScoredItem::new(item, mean)).collect()
    }
}

impl Component for GlobalMeanRatingItemScorer {
    const SHAREABLE: bool = true;

    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::on::<RatingSummary>()]
    }

    fn construct(args: &Arguments) -> Result<Self, BoxError> {
        Ok(Self::new(args.get::<RatingSummary>()?))
    }
}

crate::provides!(GlobalMeanRatingItemScorer => dyn ItemScorer);

/// Predicts ratings straight from the configured item scorer.
pub struct SimpleRatingPredictor {
    scorer: Arc<dyn ItemScorer>,
}

impl SimpleRatingPredictor {
    pub fn new(scorer: Arc<dyn ItemScorer>) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &Arc<dyn ItemScorer> {
        &self.scorer
    }
}

impl RatingPredictor for SimpleRatingPredictor {
    fn predict(&self, user: UserId, items: &[ItemId]) -> Vec<ScoredItem> {
        self.scorer.score(user, items)
    }
}

impl Component for SimpleRatingPredictor {
    const SHAREABLE: bool = true;

    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::on::<dyn ItemScorer>()]
    }

    fn construct(args: &Arguments) -> Result<Self, BoxError> {
        Ok(Self::new(args.get::<dyn ItemScorer>()?))
    }
}

crate::provides!(SimpleRatingPredictor => dyn RatingPredictor);

/// Recommends the best-scored items the user has not rated.
pub struct TopNItemRecommender {
    scorer: Arc<dyn ItemScorer>,
    dao: Arc<dyn DataAccessObject>,
}

impl TopNItemRecommender {
    pub fn new(scorer: Arc<dyn ItemScorer>, dao: Arc<dyn DataAccessObject>) -> Self {
        Self { scorer, dao }
    }

    pub fn scorer(&self) -> &Arc<dyn ItemScorer> {
        &self.scorer
    }
}

impl ItemRecommender for TopNItemRecommender {
    fn recommend(&self, user: UserId, n: usize) -> Vec<ScoredItem> {
        let rated: HashSet<ItemId> = self.dao.user_ratings(user).iter().map(|r| r.item).collect();
        let candidates: Vec<ItemId> = self
            .dao
            .items()
            .into_iter()
            .filter(|item| !rated.contains(item))
            .collect();
        top_n(self.scorer.score(user, &candidates), n)
    }
}

impl Component for TopNItemRecommender {
    const SHAREABLE: bool = true;

    fn dependencies() -> Vec<Dependency> {
        vec![
            Dependency::on::<dyn ItemScorer>(),
            Dependency::on::<dyn DataAccessObject>(),
        ]
    }

    fn construct(args: &Arguments) -> Result<Self, BoxError> {
        Ok(Self::new(
            args.get::<dyn ItemScorer>()?,
            args.get::<dyn DataAccessObject>()?,
        ))
    }
}

crate::provides!(TopNItemRecommender => dyn ItemRecommender);

/// Scores items by how often they have been rated, ignoring the basket.
pub struct PopularityItemBasedItemScorer {
    summary: Arc<RatingSummary>,
}

impl PopularityItemBasedItemScorer {
    pub fn new(summary: Arc<RatingSummary>) -> Self {
        Self { summary }
    }
}

impl ItemBasedItemScorer for PopularityItemBasedItemScorer {
    fn score_related(&self, _basket: &[ItemId], items: &[ItemId]) -> Vec<ScoredItem> {
        items
            .iter()
            .map(|&item| ScoredItem::new(item, self.summary.rating_count(item) as f64))
            .collect()
    }
}

impl Component for PopularityItemBasedItemScorer {
    const SHAREABLE: bool = true;

    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::on::<RatingSummary>()]
    }

    fn construct(args: &Arguments) -> Result<Self, BoxError> {
        Ok(Self::new(args.get::<RatingSummary>()?))
    }
}

crate::provides!(PopularityItemBasedItemScorer => dyn ItemBasedItemScorer);

/// Recommends the best-scored items outside the basket.
pub struct TopNItemBasedItemRecommender {
    scorer: Arc<dyn ItemBasedItemScorer>,
    dao: Arc<dyn DataAccessObject>,
}

impl TopNItemBasedItemRecommender {
    pub fn new(scorer: Arc<dyn ItemBasedItemScorer>, dao: Arc<dyn DataAccessObject>) -> Self {
        Self { scorer, dao }
    }
}

impl ItemBasedItemRecommender for TopNItemBasedItemRecommender {
    fn recommend_related(&self, basket: &[ItemId], n: usize) -> Vec<ScoredItem> {
        let candidates: Vec<ItemId> = self
            .dao
            .items()
            .into_iter()
            .filter(|item| !basket.contains(item))
            .collect();
        top_n(self.scorer.score_related(basket, &candidates), n)
    }
}

impl Component for TopNItemBasedItemRecommender {
    const SHAREABLE: bool = true;

    fn dependencies() -> Vec<Dependency> {
        vec![
            Dependency::on::<dyn ItemBasedItemScorer>(),
            Dependency::on::<dyn DataAccessObject>(),
        ]
    }

    fn construct(args: &Arguments) -> Result<Self, BoxError> {
        Ok(Self::new(
            args.get::<dyn ItemBasedItemScorer>()?,
            args.get::<dyn DataAccessObject>()?,
        ))
    }
}

crate::provides!(TopNItemBasedItemRecommender => dyn ItemBasedItemRecommender);
