//! Injection primitives: type keys, qualifiers, instances and component factories.

mod component;
mod instance;
mod key;
mod parameter;

pub use component::{
    Arguments, ArgumentError, BoxError, Component, DefaultSource, Dependency, Implementation,
    ImplementationKind, Interface, Provider,
};
pub use instance::{Capabilities, Instance, Provides};
pub use key::{Qualifier, QualifierMatcher, QualifierValue, TypeKey};
pub use parameter::{FromParameter, Parameter, ParameterValue};
