//! Recommender configurations and the binding records they hold.

mod binding;
mod configuration;
mod context;

pub use binding::{BindingRecord, BindingSet, BindingTarget, BindingTier};
pub use configuration::{Configuration, Root};
pub use context::{Binding, ConfigContext, Module, ParameterBinding};
