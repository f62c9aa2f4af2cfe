//! Scoped configuration: declaring bindings that apply within a context.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::context::ContextPattern;
use crate::inject::{
    Capabilities, Component, Implementation, Instance, Interface, Parameter, ParameterValue,
    Provider, Provides, Qualifier, QualifierMatcher, TypeKey,
};

use super::binding::{BindingRecord, BindingSet, BindingTarget, BindingTier};

/// A reusable group of bindings.
pub trait Module {
    fn configure(&self, ctx: &mut ConfigContext<'_>);
}

impl<F> Module for F
where
    F: Fn(&mut ConfigContext<'_>),
{
    fn configure(&self, ctx: &mut ConfigContext<'_>) {
        self(ctx)
    }
}

/// Declares bindings scoped to a context pattern.
///
/// Every scoping call returns a narrower context; every binding call appends
/// a record carrying the accumulated pattern. Nothing is resolved here.
///
/// ```
/// use recgraph::api::{ItemRecommender, ItemScorer};
/// use recgraph::basic::{ConstantItemScorer, CONSTANT_SCORE};
/// use recgraph::Configuration;
///
/// let mut config = Configuration::new();
/// config.bind::<dyn ItemScorer>().to::<ConstantItemScorer>();
/// config
///     .within::<dyn ItemRecommender>()
///     .set(&CONSTANT_SCORE)
///     .to(2.5);
/// ```
#[derive(Debug)]
pub struct ConfigContext<'a> {
    bindings: &'a mut BindingSet,
    pattern: ContextPattern,
}

impl<'a> ConfigContext<'a> {
    pub(crate) fn new(bindings: &'a mut BindingSet, pattern: ContextPattern) -> Self {
        Self { bindings, pattern }
    }

    pub fn pattern(&self) -> &ContextPattern {
        &self.pattern
    }

    fn narrow(&mut self, pattern: ContextPattern) -> ConfigContext<'_> {
        ConfigContext {
            bindings: &mut *self.bindings,
            pattern,
        }
    }

    /// Bindings that apply anywhere beneath a `T` in the dependency chain.
    pub fn within<T: ?Sized + Interface>(&mut self) -> ConfigContext<'_> {
        let pattern = self.pattern.clone().within::<T>();
        self.narrow(pattern)
    }

    pub fn within_qualified<T: ?Sized + Interface>(
        &mut self,
        qualifier: Qualifier,
    ) -> ConfigContext<'_> {
        let pattern = self.pattern.clone().within_qualified::<T>(qualifier);
        self.narrow(pattern)
    }

    /// Bindings for the direct dependencies of a `T`.
    pub fn at<T: ?Sized + Interface>(&mut self) -> ConfigContext<'_> {
        let pattern = self.pattern.clone().at::<T>();
        self.narrow(pattern)
    }

    pub fn at_qualified<T: ?Sized + Interface>(
        &mut self,
        qualifier: Qualifier,
    ) -> ConfigContext<'_> {
        let pattern = self.pattern.clone().at_qualified::<T>(qualifier);
        self.narrow(pattern)
    }

    /// Extends this context with a caller-built pattern.
    pub fn matching(&mut self, pattern: &ContextPattern) -> ConfigContext<'_> {
        let pattern = self.pattern.clone().append(pattern);
        self.narrow(pattern)
    }

    /// Runs `block` against this context; the closure form of a nested scope.
    pub fn configure(&mut self, block: impl FnOnce(&mut ConfigContext<'_>)) -> &mut Self {
        block(self);
        self
    }

    pub fn include(&mut self, module: &dyn Module) -> &mut Self {
        module.configure(self);
        self
    }

    /// Binds unqualified requests for `T`.
    pub fn bind<T: ?Sized + Interface>(&mut self) -> Binding<'_, T> {
        self.binding(QualifierMatcher::Unqualified)
    }

    pub fn bind_qualified<T: ?Sized + Interface>(
        &mut self,
        qualifier: Qualifier,
    ) -> Binding<'_, T> {
        self.binding(QualifierMatcher::Exactly(qualifier))
    }

    /// Binds requests for `T` whatever their qualifier.
    pub fn bind_any<T: ?Sized + Interface>(&mut self) -> Binding<'_, T> {
        self.binding(QualifierMatcher::Any)
    }

    fn binding<T: ?Sized + Interface>(&mut self, qualifier: QualifierMatcher) -> Binding<'_, T> {
        Binding::new(&mut *self.bindings, self.pattern.clone(), qualifier)
    }

    pub fn set<T>(&mut self, parameter: &Parameter<T>) -> ParameterBinding<'_> {
        self.set_named(parameter.qualifier().clone())
    }

    /// Binds a parameter by qualifier alone, as settings files do.
    pub fn set_named(&mut self, qualifier: Qualifier) -> ParameterBinding<'_> {
        ParameterBinding::new(&mut *self.bindings, self.pattern.clone(), qualifier)
    }

    /// Registers a pre-built object for every interface it provides.
    ///
    /// These bindings outrank class and instance bindings of equal specificity.
    pub fn add_component<C: Capabilities>(&mut self, component: C) -> &mut Self {
        self.add_shared_component(Arc::new(component))
    }

    pub fn add_shared_component<C: Capabilities>(&mut self, component: Arc<C>) -> &mut Self {
        for instance in C::capabilities(&component) {
            let record = BindingRecord::new(
                self.pattern.clone(),
                instance.key(),
                QualifierMatcher::Unqualified,
                BindingTarget::Instance(instance),
            )
            .with_tier(BindingTier::Component);
            self.bindings.push(record);
        }
        self
    }
}

/// Pending binding for requests of `T`; consumed by one of the `to*` calls.
#[must_use = "a binding does nothing until a target is given"]
pub struct Binding<'a, T: ?Sized> {
    bindings: &'a mut BindingSet,
    pattern: ContextPattern,
    qualifier: QualifierMatcher,
    per_use: bool,
    _target: PhantomData<fn() -> Arc<T>>,
}

impl<'a, T: ?Sized + Interface> Binding<'a, T> {
    pub(crate) fn new(
        bindings: &'a mut BindingSet,
        pattern: ContextPattern,
        qualifier: QualifierMatcher,
    ) -> Self {
        Self {
            bindings,
            pattern,
            qualifier,
            per_use: false,
            _target: PhantomData,
        }
    }

    /// Never share nodes built from this binding.
    pub fn unshared(mut self) -> Self {
        self.per_use = true;
        self
    }

    pub fn to<C: Component + Provides<T>>(self) {
        self.finish(BindingTarget::Class(Implementation::of::<T, C>()));
    }

    pub fn to_instance(self, value: Arc<T>) {
        self.finish(BindingTarget::Instance(Instance::new(value)));
    }

    pub fn to_provider<P: Provider<T>>(self) {
        self.finish(BindingTarget::Provider(Implementation::provided::<T, P>()));
    }

    /// Use the default implementation of `T` in this context.
    pub fn to_default(self) {
        self.finish(BindingTarget::Default);
    }

    fn finish(self, action: BindingTarget) {
        let record = BindingRecord::new(self.pattern, TypeKey::of::<T>(), self.qualifier, action)
            .per_use(self.per_use);
        tracing::trace!(binding = %record, "declared binding");
        self.bindings.push(record);
    }
}

/// Pending binding for a scalar parameter.
#[must_use = "a binding does nothing until a value is given"]
pub struct ParameterBinding<'a> {
    bindings: &'a mut BindingSet,
    pattern: ContextPattern,
    qualifier: Qualifier,
}

impl<'a> ParameterBinding<'a> {
    pub(crate) fn new(
        bindings: &'a mut BindingSet,
        pattern: ContextPattern,
        qualifier: Qualifier,
    ) -> Self {
        Self {
            bindings,
            pattern,
            qualifier,
        }
    }

    pub fn to(self, value: impl Into<ParameterValue>) {
        let value = Instance::new(Arc::new(value.into()));
        self.finish(BindingTarget::Value(value));
    }

    /// Use the parameter's declared default in this context.
    pub fn to_default(self) {
        self.finish(BindingTarget::Default);
    }

    fn finish(self, action: BindingTarget) {
        let record = BindingRecord::new(
            self.pattern,
            TypeKey::of::<ParameterValue>(),
            QualifierMatcher::Exactly(self.qualifier),
            action,
        );
        tracing::trace!(binding = %record, "declared parameter");
        self.bindings.push(record);
    }
}
