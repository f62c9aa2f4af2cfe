use std::io::Write;
use std::sync::Arc;

use recgraph::api::{DataAccessObject, ItemScorer, Rating, RatingPredictor};
use recgraph::basic::{
    ConstantItemScorer, GlobalMeanRatingItemScorer, InMemoryDao, SimpleRatingPredictor,
    CONSTANT_SCORE,
};
use recgraph::context::{ContextFrame, ContextPath, ContextPattern};
use recgraph::graph::{ComponentGraph, GraphResolver, Satisfaction};
use recgraph::inject::{
    Arguments, BoxError, Component, Dependency, Implementation, Instance, Interface,
    ParameterValue, TypeKey,
};
use recgraph::settings::Settings;
use recgraph::{ConfigContext, Configuration, ConfigurationError, Recommender, ResolutionError};

/// A consumer with its own scorer, used to scope bindings.
struct SpecialUser {
    scorer: Arc<dyn ItemScorer>,
}

impl Interface for SpecialUser {
    fn default_implementation() -> Option<Implementation> {
        Some(Implementation::of::<SpecialUser, SpecialUser>())
    }
}

impl Component for SpecialUser {
    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::on::<dyn ItemScorer>()]
    }

    fn construct(args: &Arguments) -> Result<Self, BoxError> {
        Ok(SpecialUser {
            scorer: args.get::<dyn ItemScorer>()?,
        })
    }
}

fn score_of(scorer: &dyn ItemScorer) -> f64 {
    scorer.score(1, &[42])[0].score
}

fn root_implementation<T: ?Sized + 'static>(config: &Configuration) -> TypeKey {
    let graph = config.resolve_graph().unwrap();
    match graph.root(TypeKey::of::<T>()).unwrap().satisfaction() {
        Satisfaction::Implementation(imp) => imp.key(),
        Satisfaction::Instance(instance) => instance.key(),
    }
}

fn special_user_config() -> Configuration {
    let mut config = Configuration::new();
    config.add_root::<SpecialUser>();
    config.bind::<dyn ItemScorer>().to::<ConstantItemScorer>();
    config.set(&CONSTANT_SCORE).to(3.5);
    config.within::<SpecialUser>().configure(|ctx| {
        ctx.bind::<dyn ItemScorer>().to::<ConstantItemScorer>();
        ctx.set(&CONSTANT_SCORE).to(4.0);
    });
    config
}

#[test]
fn test_constant_scorer_scoped_by_context() {
    let config = special_user_config();
    let graph = config.build().unwrap();

    assert_eq!(score_of(graph.get::<dyn ItemScorer>().unwrap().as_ref()), 3.5);
    let special = graph.get::<SpecialUser>().unwrap();
    assert_eq!(score_of(special.scorer.as_ref()), 4.0);
}

#[test]
fn test_resolving_at_a_path_through_special_user() {
    let config = special_user_config();
    let mut resolver = GraphResolver::new(config.bindings());

    let inside = ContextPath::root().extend(ContextFrame::new(
        TypeKey::of::<SpecialUser>(),
        Some(TypeKey::of::<SpecialUser>()),
        None,
    ));
    let outside = ContextPath::root();
    let request = Dependency::on::<dyn ItemScorer>();

    let inner = resolver.resolve(&inside, &request).unwrap();
    let outer = resolver.resolve(&outside, &request).unwrap();
    assert!(!Arc::ptr_eq(&inner, &outer));

    let score = |node: &recgraph::graph::ComponentNode| {
        let parameter = node.dependencies().next().unwrap();
        parameter.get::<ParameterValue>().unwrap().as_ref().clone()
    };
    assert_eq!(score(inner.as_ref()), ParameterValue::Double(4.0));
    assert_eq!(score(outer.as_ref()), ParameterValue::Double(3.5));
}

#[test]
fn test_longer_pattern_wins_regardless_of_order() {
    let mut config = Configuration::new();
    config.add_root::<SpecialUser>();
    config.within::<SpecialUser>().set(&CONSTANT_SCORE).to(4.0);
    config.set(&CONSTANT_SCORE).to(3.5);

    let graph = config.build().unwrap();
    assert_eq!(score_of(graph.get::<SpecialUser>().unwrap().scorer.as_ref()), 4.0);
    assert_eq!(score_of(graph.get::<dyn ItemScorer>().unwrap().as_ref()), 3.5);
}

#[test]
fn test_equal_specificity_latest_declaration_wins() {
    let mut config = Configuration::new();
    config.bind::<dyn ItemScorer>().to::<ConstantItemScorer>();
    config.bind::<dyn ItemScorer>().to::<GlobalMeanRatingItemScorer>();
    assert_eq!(
        root_implementation::<dyn ItemScorer>(&config),
        TypeKey::of::<GlobalMeanRatingItemScorer>()
    );

    let mut reversed = Configuration::new();
    reversed.bind::<dyn ItemScorer>().to::<GlobalMeanRatingItemScorer>();
    reversed.bind::<dyn ItemScorer>().to::<ConstantItemScorer>();
    assert_eq!(
        root_implementation::<dyn ItemScorer>(&reversed),
        TypeKey::of::<ConstantItemScorer>()
    );
}

#[test]
fn test_instance_binding_is_shared_by_every_consumer() {
    let scorer: Arc<dyn ItemScorer> = Arc::new(ConstantItemScorer::new(2.0));
    let mut config = Configuration::new();
    config.bind::<dyn ItemScorer>().to_instance(scorer.clone());

    let graph = config.build().unwrap();
    assert!(Arc::ptr_eq(&graph.get::<dyn ItemScorer>().unwrap(), &scorer));

    let scorer_nodes: Vec<_> = graph
        .nodes()
        .filter(|node| node.key() == TypeKey::of::<dyn ItemScorer>())
        .collect();
    assert_eq!(scorer_nodes.len(), 1);

    let predictor = graph.root(TypeKey::of::<dyn RatingPredictor>()).unwrap();
    let dependency = predictor.dependencies().next().unwrap();
    assert!(Arc::ptr_eq(dependency, scorer_nodes[0]));
    assert!(Arc::ptr_eq(&dependency.get::<dyn ItemScorer>().unwrap(), &scorer));
}

struct Alpha;
struct Beta;

impl Interface for Alpha {
    fn default_implementation() -> Option<Implementation> {
        Some(Implementation::of::<Alpha, Alpha>())
    }
}

impl Interface for Beta {
    fn default_implementation() -> Option<Implementation> {
        Some(Implementation::of::<Beta, Beta>())
    }
}

impl Component for Alpha {
    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::on::<Beta>()]
    }

    fn construct(_: &Arguments) -> Result<Self, BoxError> {
        Ok(Alpha)
    }
}

impl Component for Beta {
    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::on::<Alpha>()]
    }

    fn construct(_: &Arguments) -> Result<Self, BoxError> {
        Ok(Beta)
    }
}

#[test]
fn test_mutual_dependency_is_a_cycle() {
    let mut config = Configuration::new();
    config.clear_roots().add_root::<Alpha>();

    let err = config.build().unwrap_err();
    let ConfigurationError::Resolution(ResolutionError::Cyclic { cycle }) = &err else {
        panic!("expected a cycle, got {err}");
    };
    assert!(cycle.contains("Alpha"));
    assert!(cycle.contains("Beta"));
}

#[test]
fn test_cleared_roots_build_an_empty_graph() {
    let mut config = Configuration::new();
    config.clear_roots();

    let graph = config.build().unwrap();
    assert!(graph.is_empty());
    assert_eq!(graph.roots().count(), 0);
}

#[test]
fn test_default_configuration_resolves_every_root() {
    let graph = Configuration::new().build().unwrap();
    assert_eq!(graph.roots().count(), 6);
    assert!(graph.len() >= 6);
    assert!(graph.is_instantiated());
}

#[test]
fn test_copy_is_independent() {
    let mut original = Configuration::new();
    original.set(&CONSTANT_SCORE).to(1.0);

    let mut copy = original.copy();
    copy.set(&CONSTANT_SCORE).to(9.0);
    copy.clear_roots().add_root::<dyn ItemScorer>();

    assert_eq!(original.bindings().len(), 1);
    assert_eq!(original.roots().len(), 6);

    let original_graph = original.build().unwrap();
    let copy_graph = copy.build().unwrap();
    assert_eq!(score_of(original_graph.get::<dyn ItemScorer>().unwrap().as_ref()), 1.0);
    assert_eq!(score_of(copy_graph.get::<dyn ItemScorer>().unwrap().as_ref()), 9.0);

    let again = original.copy().build().unwrap();
    assert_eq!(again.len(), original_graph.len());
}

#[test]
fn test_added_component_outranks_binding() {
    let dao = InMemoryDao::new(vec![Rating::new(1, 10, 5.0)]);
    let mut config = Configuration::new();
    config.add_component(dao);
    config.bind::<dyn DataAccessObject>().to::<InMemoryDao>();

    let recommender = Recommender::build(&config).unwrap();
    assert_eq!(recommender.data_access_object().unwrap().ratings().len(), 1);
}

#[test]
fn test_module_scoped_under_root() {
    let module = |ctx: &mut ConfigContext<'_>| {
        ctx.bind::<dyn RatingPredictor>().to::<SimpleRatingPredictor>();
        ctx.within::<dyn RatingPredictor>().set(&CONSTANT_SCORE).to(0.5);
    };
    let mut config = Configuration::new();
    config.include(&module);

    let recommender = Recommender::build(&config).unwrap();
    let predicted = recommender.rating_predictor().unwrap().predict(1, &[3]);
    assert_eq!(predicted[0].score, 0.5);
    assert_eq!(score_of(recommender.item_scorer().unwrap().as_ref()), 0.0);
}

#[test]
fn test_at_reaches_only_direct_dependencies() {
    let mut config = Configuration::new();
    config.at::<dyn RatingPredictor>().set(&CONSTANT_SCORE).to(0.5);
    let recommender = Recommender::build(&config).unwrap();
    assert_eq!(recommender.rating_predictor().unwrap().predict(1, &[3])[0].score, 0.0);

    let mut config = Configuration::new();
    config.at::<dyn ItemScorer>().set(&CONSTANT_SCORE).to(0.5);
    let recommender = Recommender::build(&config).unwrap();
    assert_eq!(recommender.rating_predictor().unwrap().predict(1, &[3])[0].score, 0.5);
    assert_eq!(score_of(recommender.item_scorer().unwrap().as_ref()), 0.5);
}

#[test]
fn test_settings_file_sets_parameters() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "[parameters]\nconstant_score = 3\n").unwrap();

    let settings = Settings::builder().with_file(file.path(), true).build().unwrap();
    let mut config = Configuration::new();
    config.apply_settings(&settings);

    let recommender = Recommender::build(&config).unwrap();
    assert_eq!(score_of(recommender.item_scorer().unwrap().as_ref()), 3.0);
}

fn predicted(recommender: &Recommender) -> f64 {
    recommender.rating_predictor().unwrap().predict(1, &[3])[0].score
}

#[test]
fn test_matching_hand_built_pattern() {
    let pattern = ContextPattern::empty()
        .at::<dyn RatingPredictor>()
        .within::<dyn ItemScorer>();
    let mut config = Configuration::new();
    config.matching(&pattern).set(&CONSTANT_SCORE).to(7.0);

    let recommender = Recommender::build(&config).unwrap();
    assert_eq!(predicted(&recommender), 7.0);
    assert_eq!(score_of(recommender.item_scorer().unwrap().as_ref()), 0.0);
}

#[test]
fn test_matching_extends_the_current_scope() {
    let inner = ContextPattern::empty().at::<dyn ItemScorer>();
    let mut config = Configuration::new();
    config
        .within::<dyn RatingPredictor>()
        .matching(&inner)
        .set(&CONSTANT_SCORE)
        .to(8.0);

    assert_eq!(config.bindings().records()[0].pattern().len(), 2);
    let recommender = Recommender::build(&config).unwrap();
    assert_eq!(predicted(&recommender), 8.0);
    assert_eq!(score_of(recommender.item_scorer().unwrap().as_ref()), 0.0);
}

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn test_public_types_are_thread_safe() {
    assert_send_sync::<Configuration>();
    assert_send_sync::<ComponentGraph>();
    assert_send_sync::<Instance>();
    assert_send_sync::<Recommender>();
}

#[test]
fn test_copies_build_in_parallel() {
    let mut base = Configuration::new();
    base.set(&CONSTANT_SCORE).to(1.0);

    let configs: Vec<Configuration> = (0..4_u32)
        .map(|i| {
            let mut config = base.copy();
            config.set(&CONSTANT_SCORE).to(f64::from(i));
            config
        })
        .collect();

    let scores: Vec<f64> = std::thread::scope(|scope| {
        let handles: Vec<_> = configs
            .iter()
            .map(|config| scope.spawn(move || config.build().unwrap()))
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                let graph = handle.join().unwrap();
                assert!(graph.is_instantiated());
                score_of(graph.get::<dyn ItemScorer>().unwrap().as_ref())
            })
            .collect()
    });

    assert_eq!(scores, vec![0.0, 1.0, 2.0, 3.0]);
    assert_eq!(score_of(base.build().unwrap().get::<dyn ItemScorer>().unwrap().as_ref()), 1.0);
}
