//! Component declarations: what can be built, and from which dependencies.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::{FromParameter, Instance, Parameter, ParameterValue, Provides, Qualifier, TypeKey};

/// Error type returned by component factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A type that can be requested from a component graph.
///
/// Implemented for capability traits (`impl Interface for dyn ItemScorer {}`)
/// and for concrete types requested directly. An interface may name the
/// implementation used when no binding applies.
pub trait Interface: Send + Sync + 'static {
    fn default_implementation() -> Option<Implementation> {
        None
    }
}

/// A constructible implementation.
///
/// The resolver resolves [`dependencies`](Self::dependencies) first and hands
/// the results to [`construct`](Self::construct).
pub trait Component: Sized + Send + Sync + 'static {
    /// Shareable components are built once per identical resolution and reused
    /// by every consumer; they must be safe to use from several threads.
    const SHAREABLE: bool = false;

    fn dependencies() -> Vec<Dependency> {
        Vec::new()
    }

    fn construct(args: &Arguments) -> Result<Self, BoxError>;
}

/// A component that produces values of `T` instead of being one.
pub trait Provider<T: ?Sized>: Component {
    fn get(&self) -> Result<Arc<T>, BoxError>;
}

/// Where a dependency falls back to when no binding applies.
#[derive(Debug, Clone)]
pub enum DefaultSource {
    Implementation(Implementation),
    Value(Instance),
}

// Interface defaults are looked up lazily: defaults may be mutually recursive.
#[derive(Clone)]
enum DefaultSlot {
    None,
    Interface(fn() -> Option<Implementation>),
    Fixed(DefaultSource),
}

/// One requested input of a component: a type, an optional qualifier, and
/// an optional fallback.
#[derive(Clone)]
pub struct Dependency {
    key: TypeKey,
    qualifier: Option<Qualifier>,
    default: DefaultSlot,
}

impl Dependency {
    pub fn on<T: ?Sized + Interface>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            qualifier: None,
            default: DefaultSlot::Interface(T::default_implementation),
        }
    }

    pub fn qualified<T: ?Sized + Interface>(qualifier: Qualifier) -> Self {
        Self {
            qualifier: Some(qualifier),
            ..Self::on::<T>()
        }
    }

    pub fn parameter<T>(parameter: &Parameter<T>) -> Self {
        let default = match parameter.default_value() {
            Some(v) => DefaultSlot::Fixed(DefaultSource::Value(Instance::new(Arc::new(v.clone())))),
            None => DefaultSlot::None,
        };
        Self {
            key: TypeKey::of::<ParameterValue>(),
            qualifier: Some(parameter.qualifier().clone()),
            default,
        }
    }

    /// Replaces the fallback implementation, as a qualifier-level default does.
    pub fn or_default(mut self, implementation: Implementation) -> Self {
        self.default = DefaultSlot::Fixed(DefaultSource::Implementation(implementation));
        self
    }

    pub(crate) fn root(key: TypeKey, default: fn() -> Option<Implementation>) -> Self {
        Self {
            key,
            qualifier: None,
            default: DefaultSlot::Interface(default),
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn qualifier(&self) -> Option<&Qualifier> {
        self.qualifier.as_ref()
    }

    /// The fallback used when no binding applies, if any.
    pub fn default_source(&self) -> Option<DefaultSource> {
        match &self.default {
            DefaultSlot::None => None,
            DefaultSlot::Interface(lookup) => lookup().map(DefaultSource::Implementation),
            DefaultSlot::Fixed(source) => Some(source.clone()),
        }
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("key", &self.key)
            .field("qualifier", &self.qualifier)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{q} {}", self.key),
            None => write!(f, "{}", self.key),
        }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ArgumentError {
    #[error("no resolved argument for {0}")]
    Missing(String),

    #[error("argument {name} is not a {expected}")]
    WrongType { name: String, expected: &'static str },
}

/// Resolved constructor arguments, in dependency declaration order.
#[derive(Debug, Default)]
pub struct Arguments {
    values: Vec<(TypeKey, Option<Qualifier>, Instance)>,
}

impl Arguments {
    pub(crate) fn push(&mut self, dependency: &Dependency, value: Instance) {
        self.values
            .push((dependency.key, dependency.qualifier.clone(), value));
    }

    fn lookup(&self, key: TypeKey, qualifier: Option<&Qualifier>) -> Option<&Instance> {
        self.values
            .iter()
            .find(|(k, q, _)| *k == key && q.as_ref() == qualifier)
            .map(|(_, _, value)| value)
    }

    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, ArgumentError> {
        self.typed(None)
    }

    pub fn get_qualified<T: ?Sized + Send + Sync + 'static>(
        &self,
        qualifier: &Qualifier,
    ) -> Result<Arc<T>, ArgumentError> {
        self.typed(Some(qualifier))
    }

    fn typed<T: ?Sized + Send + Sync + 'static>(
        &self,
        qualifier: Option<&Qualifier>,
    ) -> Result<Arc<T>, ArgumentError> {
        let key = TypeKey::of::<T>();
        let name = || match qualifier {
            Some(q) => format!("{q} {key}"),
            None => key.to_string(),
        };
        self.lookup(key, qualifier)
            .ok_or_else(|| ArgumentError::Missing(name()))?
            .get::<T>()
            .ok_or_else(|| ArgumentError::WrongType {
                name: name(),
                expected: key.name(),
            })
    }

    pub fn parameter<T: FromParameter>(
        &self,
        parameter: &Parameter<T>,
    ) -> Result<T, ArgumentError> {
        let qualifier = parameter.qualifier();
        let value = self.typed::<ParameterValue>(Some(qualifier))?;
        T::from_parameter(&value).ok_or_else(|| ArgumentError::WrongType {
            name: qualifier.to_string(),
            expected: std::any::type_name::<T>(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImplementationKind {
    Class,
    Provider,
}

type Factory = dyn Fn(&Arguments) -> Result<Instance, BoxError> + Send + Sync;

/// Registry entry mapping an implementation type to its typed factory.
#[derive(Clone)]
pub struct Implementation {
    kind: ImplementationKind,
    key: TypeKey,
    provides: TypeKey,
    dependencies: fn() -> Vec<Dependency>,
    shareable: bool,
    factory: Arc<Factory>,
}

impl Implementation {
    /// `C` constructed from its dependencies, exposed as `T`.
    pub fn of<T, C>() -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        C: Component + Provides<T>,
    {
        Self {
            kind: ImplementationKind::Class,
            key: TypeKey::of::<C>(),
            provides: TypeKey::of::<T>(),
            dependencies: C::dependencies,
            shareable: C::SHAREABLE,
            factory: Arc::new(|args: &Arguments| {
                let component = Arc::new(C::construct(args)?);
                Ok(Instance::new::<T>(<C as Provides<T>>::provide(component)))
            }),
        }
    }

    /// `T` obtained from a provider `P` constructed from its dependencies.
    pub fn provided<T, P>() -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        P: Provider<T>,
    {
        Self {
            kind: ImplementationKind::Provider,
            key: TypeKey::of::<P>(),
            provides: TypeKey::of::<T>(),
            dependencies: P::dependencies,
            shareable: P::SHAREABLE,
            factory: Arc::new(|args: &Arguments| {
                let provider = P::construct(args)?;
                Ok(Instance::new::<T>(provider.get()?))
            }),
        }
    }

    pub fn kind(&self) -> ImplementationKind {
        self.kind
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn provides(&self) -> TypeKey {
        self.provides
    }

    pub fn dependencies(&self) -> Vec<Dependency> {
        (self.dependencies)()
    }

    pub fn is_shareable(&self) -> bool {
        self.shareable
    }

    pub(crate) fn instantiate(&self, args: &Arguments) -> Result<Instance, BoxError> {
        (self.factory)(args)
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Implementation")
            .field("kind", &self.kind)
            .field("key", &self.key)
            .field("provides", &self.provides)
            .field("shareable", &self.shareable)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Counter: Send + Sync {
        fn count(&self) -> usize;
    }

    impl Interface for dyn Counter {}

    const START: Parameter<usize> = Parameter::with_default("start", ParameterValue::Integer(7));

    struct Fixed(usize);

    impl Counter for Fixed {
        fn count(&self) -> usize {
            self.0
        }
    }

    crate::provides!(Fixed => dyn Counter);

    impl Component for Fixed {
        fn dependencies() -> Vec<Dependency> {
            vec![Dependency::parameter(&START)]
        }

        fn construct(args: &Arguments) -> Result<Self, BoxError> {
            Ok(Fixed(args.parameter(&START)?))
        }
    }

    #[test]
    fn test_implementation_builds_through_factory() {
        let implementation = Implementation::of::<dyn Counter, Fixed>();
        let dependencies = implementation.dependencies();
        let Some(DefaultSource::Value(default)) = dependencies[0].default_source() else {
            panic!("parameter default should be a value");
        };

        let mut args = Arguments::default();
        args.push(&dependencies[0], default);

        let instance = implementation.instantiate(&args).unwrap();
        assert_eq!(instance.key(), TypeKey::of::<dyn Counter>());
        assert_eq!(instance.get::<dyn Counter>().unwrap().count(), 7);
    }

    #[test]
    fn test_missing_argument_is_reported() {
        let result = Fixed::construct(&Arguments::default());
        let err = result.err().unwrap();
        assert!(err.to_string().contains("@start"));
    }

    #[test]
    fn test_wrong_parameter_type() {
        let dependency = Dependency::parameter(&START);
        let mut args = Arguments::default();
        args.push(&dependency, Instance::new(Arc::new(ParameterValue::Bool(true))));

        let err = args.parameter(&START).unwrap_err();
        assert!(matches!(err, ArgumentError::WrongType { .. }));
    }
}
