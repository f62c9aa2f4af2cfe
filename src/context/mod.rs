//! Dependency contexts: where in the graph a request is made, and which
//! bindings apply there.

mod path;
mod pattern;

pub use path::{ContextFrame, ContextPath};
pub use pattern::{ContextPattern, MatchMode, PatternFrame};
