use thiserror::Error;

use crate::inject::BoxError;

/// Failure to turn a binding set into a component graph.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResolutionError {
    #[error("unresolvable dependency {dependency} in context {context}")]
    Unresolvable { dependency: String, context: String },

    #[error("cyclic dependency: {cycle}")]
    Cyclic { cycle: String },

    #[error("failed to instantiate {component} (required by {chain})")]
    Instantiation {
        component: String,
        chain: String,
        #[source]
        source: BoxError,
    },
}
