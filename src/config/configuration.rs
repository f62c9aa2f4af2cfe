use crate::api::{
    DataAccessObject, ItemBasedItemRecommender, ItemBasedItemScorer, ItemRecommender, ItemScorer,
    RatingPredictor,
};
use crate::context::ContextPattern;
use crate::graph::{ComponentGraph, GraphResolver};
use crate::inject::{
    Capabilities, Implementation, Interface, Parameter, Qualifier, QualifierMatcher, TypeKey,
};
use crate::settings::Settings;
use crate::ConfigurationError;

use super::binding::BindingSet;
use super::context::{Binding, ConfigContext, Module, ParameterBinding};

/// A type the resolver must resolve for a build to succeed.
#[derive(Debug, Clone, Copy)]
pub struct Root {
    key: TypeKey,
    default: fn() -> Option<Implementation>,
}

impl Root {
    pub fn of<T: ?Sized + Interface>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            default: T::default_implementation,
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub(crate) fn default_implementation(&self) -> fn() -> Option<Implementation> {
        self.default
    }
}

fn default_roots() -> Vec<Root> {
    vec![
        Root::of::<dyn RatingPredictor>(),
        Root::of::<dyn ItemScorer>(),
        Root::of::<dyn ItemRecommender>(),
        Root::of::<dyn ItemBasedItemScorer>(),
        Root::of::<dyn ItemBasedItemRecommender>(),
        Root::of::<dyn DataAccessObject>(),
    ]
}

/// A recommender configuration: binding records plus the root types to resolve.
///
/// Cloning (or [`copy`](Self::copy)) yields an independent configuration;
/// changes to either side are never visible to the other.
#[derive(Debug, Clone)]
pub struct Configuration {
    bindings: BindingSet,
    roots: Vec<Root>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

impl Configuration {
    /// An empty configuration with the default capability roots.
    pub fn new() -> Self {
        Self {
            bindings: BindingSet::new(),
            roots: default_roots(),
        }
    }

    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub fn add_root<T: ?Sized + Interface>(&mut self) -> &mut Self {
        let root = Root::of::<T>();
        if !self.roots.iter().any(|r| r.key == root.key) {
            self.roots.push(root);
        }
        self
    }

    /// Removes every root, including the defaults.
    ///
    /// Meant for test harnesses: a configuration without roots builds an empty graph.
    pub fn clear_roots(&mut self) -> &mut Self {
        self.roots.clear();
        self
    }

    pub fn roots(&self) -> &[Root] {
        &self.roots
    }

    pub fn bindings(&self) -> &BindingSet {
        &self.bindings
    }

    pub fn root_context(&mut self) -> ConfigContext<'_> {
        ConfigContext::new(&mut self.bindings, ContextPattern::empty())
    }

    pub fn bind<T: ?Sized + Interface>(&mut self) -> Binding<'_, T> {
        Binding::new(&mut self.bindings, ContextPattern::empty(), QualifierMatcher::Unqualified)
    }

    pub fn bind_qualified<T: ?Sized + Interface>(
        &mut self,
        qualifier: Qualifier,
    ) -> Binding<'_, T> {
        Binding::new(
            &mut self.bindings,
            ContextPattern::empty(),
            QualifierMatcher::Exactly(qualifier),
        )
    }

    pub fn bind_any<T: ?Sized + Interface>(&mut self) -> Binding<'_, T> {
        Binding::new(&mut self.bindings, ContextPattern::empty(), QualifierMatcher::Any)
    }

    pub fn within<T: ?Sized + Interface>(&mut self) -> ConfigContext<'_> {
        self.scoped(ContextPattern::empty().within::<T>())
    }

    pub fn within_qualified<T: ?Sized + Interface>(
        &mut self,
        qualifier: Qualifier,
    ) -> ConfigContext<'_> {
        self.scoped(ContextPattern::empty().within_qualified::<T>(qualifier))
    }

    pub fn at<T: ?Sized + Interface>(&mut self) -> ConfigContext<'_> {
        self.scoped(ContextPattern::empty().at::<T>())
    }

    pub fn at_qualified<T: ?Sized + Interface>(
        &mut self,
        qualifier: Qualifier,
    ) -> ConfigContext<'_> {
        self.scoped(ContextPattern::empty().at_qualified::<T>(qualifier))
    }

    pub fn matching(&mut self, pattern: &ContextPattern) -> ConfigContext<'_> {
        self.scoped(pattern.clone())
    }

    pub fn set<T>(&mut self, parameter: &Parameter<T>) -> ParameterBinding<'_> {
        ParameterBinding::new(
            &mut self.bindings,
            ContextPattern::empty(),
            parameter.qualifier().clone(),
        )
    }

    pub fn add_component<C: Capabilities>(&mut self, component: C) -> &mut Self {
        self.root_context().add_component(component);
        self
    }

    pub fn include(&mut self, module: &dyn Module) -> &mut Self {
        self.root_context().include(module);
        self
    }

    /// Binds every parameter in `settings` at the root context.
    pub fn apply_settings(&mut self, settings: &Settings) -> &mut Self {
        let mut ctx = self.root_context();
        for (name, value) in settings.parameters() {
            ctx.set_named(Qualifier::new(name.clone())).to(value.clone());
        }
        self
    }

    /// Resolves the graph without constructing any component.
    pub fn resolve_graph(&self) -> Result<ComponentGraph, ConfigurationError> {
        let graph = GraphResolver::new(&self.bindings).resolve_roots(&self.roots)?;
        Ok(graph)
    }

    /// Resolves and instantiates the full graph.
    pub fn build(&self) -> Result<ComponentGraph, ConfigurationError> {
        let graph = self.resolve_graph()?;
        graph.instantiate()?;
        tracing::info!(
            roots = self.roots.len(),
            nodes = graph.len(),
            "built component graph"
        );
        Ok(graph)
    }

    fn scoped(&mut self, pattern: ContextPattern) -> ConfigContext<'_> {
        ConfigContext::new(&mut self.bindings, pattern)
    }
}
