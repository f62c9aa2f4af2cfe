//! Resolution of requests against a binding set.
//!
//! Each request `(context path, type, qualifier)` is answered by the most
//! specific applicable binding, falling back to the request's default. An
//! implementation's dependencies are resolved one frame deeper, so nested
//! bindings can target "within this component". Shareable nodes are
//! hash-consed: two requests that resolve to the same satisfaction with the
//! same dependency nodes receive the same node.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::{BindingSet, BindingTarget, Root};
use crate::context::{ContextFrame, ContextPath};
use crate::inject::{
    DefaultSource, Dependency, ImplementationKind, ParameterValue, Qualifier, TypeKey,
};

use super::{ComponentGraph, ComponentNode, ResolutionError, Satisfaction};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SatisfactionId {
    Class(TypeKey),
    Provider(TypeKey),
    Instance(TypeKey, usize),
    Value(Option<Qualifier>, String),
}

impl SatisfactionId {
    fn of(satisfaction: &Satisfaction, qualifier: Option<&Qualifier>) -> Self {
        match satisfaction {
            Satisfaction::Implementation(imp) => match imp.kind() {
                ImplementationKind::Class => SatisfactionId::Class(imp.key()),
                ImplementationKind::Provider => SatisfactionId::Provider(imp.key()),
            },
            // a parameter value is shared among requests for the same parameter
            Satisfaction::Instance(instance) => match instance.get::<ParameterValue>() {
                Some(value) => SatisfactionId::Value(qualifier.cloned(), format!("{value:?}")),
                None => SatisfactionId::Instance(instance.key(), instance.identity()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NodeKey {
    key: TypeKey,
    satisfaction: SatisfactionId,
    dependencies: Vec<usize>,
}

/// Resolves one graph from a frozen binding set.
///
/// Resolution is single-threaded and performs no I/O. Independent resolvers
/// may run in parallel over their own binding sets.
#[derive(Debug)]
pub struct GraphResolver<'a> {
    bindings: &'a BindingSet,
    shared: HashMap<NodeKey, Arc<ComponentNode>>,
    nodes: Vec<Arc<ComponentNode>>,
}

impl<'a> GraphResolver<'a> {
    pub fn new(bindings: &'a BindingSet) -> Self {
        Self {
            bindings,
            shared: HashMap::new(),
            nodes: Vec::new(),
        }
    }

    /// Resolves every root at the empty context. Any failure aborts the
    /// whole graph.
    pub fn resolve_roots(mut self, roots: &[Root]) -> Result<ComponentGraph, ResolutionError> {
        let mut resolved = Vec::with_capacity(roots.len());
        for root in roots {
            let dependency = Dependency::root(root.key(), root.default_implementation());
            let node = self.resolve(&ContextPath::root(), &dependency)?;
            resolved.push((root.key(), node));
        }
        debug!(
            roots = resolved.len(),
            nodes = self.nodes.len(),
            "resolved component graph"
        );
        Ok(ComponentGraph::new(resolved, self.nodes))
    }

    /// Resolves a single request made from `path`.
    pub fn resolve(
        &mut self,
        path: &ContextPath,
        dependency: &Dependency,
    ) -> Result<Arc<ComponentNode>, ResolutionError> {
        let key = dependency.key();
        let qualifier = dependency.qualifier();

        trace!(
            dependency = %dependency,
            context = %path,
            candidates = self.bindings.candidates(key, qualifier, path).count(),
            "resolving"
        );

        let (satisfaction, per_use) = match self.bindings.select(key, qualifier, path) {
            Some(record) => {
                debug!(
                    dependency = %dependency,
                    context = %path,
                    binding = %record,
                    "selected binding"
                );
                let satisfaction = match record.action() {
                    BindingTarget::Class(imp) | BindingTarget::Provider(imp) => {
                        Satisfaction::Implementation(imp.clone())
                    }
                    BindingTarget::Instance(instance) | BindingTarget::Value(instance) => {
                        Satisfaction::Instance(instance.clone())
                    }
                    BindingTarget::Default => fallback(dependency, path)?,
                };
                (satisfaction, record.is_per_use())
            }
            None => (fallback(dependency, path)?, false),
        };

        match satisfaction {
            Satisfaction::Instance(_) => {
                Ok(self.intern(dependency, satisfaction, Vec::new(), true, path))
            }
            Satisfaction::Implementation(ref imp) => {
                let frame = ContextFrame::new(key, Some(imp.key()), qualifier.cloned());
                if let Some(start) = path.position(&frame) {
                    let cycle = path.frames()[start..]
                        .iter()
                        .chain(std::iter::once(&frame))
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(" -> ");
                    return Err(ResolutionError::Cyclic { cycle });
                }

                let shareable = imp.is_shareable() && !per_use;
                let child_path = path.extend(frame);
                let mut dependencies = Vec::new();
                for child in imp.dependencies() {
                    let node = self.resolve(&child_path, &child)?;
                    dependencies.push((child, node));
                }
                Ok(self.intern(dependency, satisfaction, dependencies, shareable, path))
            }
        }
    }

    /// Returns the existing node for an identical shareable resolution, or
    /// records a new one.
    fn intern(
        &mut self,
        dependency: &Dependency,
        satisfaction: Satisfaction,
        dependencies: Vec<(Dependency, Arc<ComponentNode>)>,
        shareable: bool,
        path: &ContextPath,
    ) -> Arc<ComponentNode> {
        let node_key = shareable.then(|| NodeKey {
            key: dependency.key(),
            satisfaction: SatisfactionId::of(&satisfaction, dependency.qualifier()),
            dependencies: dependencies.iter().map(|(_, node)| node.id()).collect(),
        });

        if let Some(existing) = node_key.as_ref().and_then(|k| self.shared.get(k)) {
            trace!(component = %existing.label(), "reusing shared node");
            return Arc::clone(existing);
        }

        let node = Arc::new(ComponentNode::new(
            self.nodes.len(),
            dependency,
            satisfaction,
            dependencies,
            shareable,
            path.signature(),
        ));
        self.nodes.push(Arc::clone(&node));
        if let Some(k) = node_key {
            self.shared.insert(k, Arc::clone(&node));
        }
        node
    }
}

fn fallback(dependency: &Dependency, path: &ContextPath) -> Result<Satisfaction, ResolutionError> {
    match dependency.default_source() {
        Some(DefaultSource::Implementation(imp)) => Ok(Satisfaction::Implementation(imp)),
        Some(DefaultSource::Value(value)) => Ok(Satisfaction::Instance(value)),
        None => Err(ResolutionError::Unresolvable {
            dependency: dependency.to_string(),
            context: path.to_string(),
        }),
    }
}
