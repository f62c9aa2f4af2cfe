use std::sync::Arc;

use crate::api::{
    DataAccessObject, ItemBasedItemRecommender, ItemBasedItemScorer, ItemRecommender, ItemScorer,
    RatingPredictor,
};
use crate::config::Configuration;
use crate::graph::ComponentGraph;
use crate::ConfigurationError;

/// A built recommender: every root of its configuration, instantiated.
///
/// ```
/// use recgraph::api::ItemScorer;
/// use recgraph::basic::CONSTANT_SCORE;
/// use recgraph::{Configuration, Recommender};
///
/// let mut config = Configuration::new();
/// config.set(&CONSTANT_SCORE).to(2.0);
///
/// let recommender = Recommender::build(&config)?;
/// let scorer = recommender.item_scorer().expect("default roots include a scorer");
/// assert_eq!(scorer.score(1, &[7])[0].score, 2.0);
/// # Ok::<(), recgraph::ConfigurationError>(())
/// ```
#[derive(Debug)]
pub struct Recommender {
    graph: ComponentGraph,
}

impl Recommender {
    pub fn build(config: &Configuration) -> Result<Self, ConfigurationError> {
        Ok(Self {
            graph: config.build()?,
        })
    }

    pub fn graph(&self) -> &ComponentGraph {
        &self.graph
    }

    /// The component built for root `T`, if `T` was a root.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.graph.get::<T>()
    }

    pub fn rating_predictor(&self) -> Option<Arc<dyn RatingPredictor>> {
        self.get::<dyn RatingPredictor>()
    }

    pub fn item_scorer(&self) -> Option<Arc<dyn ItemScorer>> {
        self.get::<dyn ItemScorer>()
    }

    pub fn item_recommender(&self) -> Option<Arc<dyn ItemRecommender>> {
        self.get::<dyn ItemRecommender>()
    }

    pub fn item_based_item_scorer(&self) -> Option<Arc<dyn ItemBasedItemScorer>> {
        self.get::<dyn ItemBasedItemScorer>()
    }

    pub fn item_based_item_recommender(&self) -> Option<Arc<dyn ItemBasedItemRecommender>> {
        self.get::<dyn ItemBasedItemRecommender>()
    }

    pub fn data_access_object(&self) -> Option<Arc<dyn DataAccessObject>> {
        self.get::<dyn DataAccessObject>()
    }
}
