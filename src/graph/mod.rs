//! Graph resolution: from binding records to a shared, acyclic component graph.

mod error;
mod node;
mod resolver;

pub use error::ResolutionError;
pub use node::{ComponentGraph, ComponentNode, Satisfaction};
pub use resolver::GraphResolver;
