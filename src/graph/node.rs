use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::inject::{Arguments, Dependency, Implementation, Instance, Qualifier, TypeKey};

use super::ResolutionError;

/// How a node obtains its value.
#[derive(Debug, Clone)]
pub enum Satisfaction {
    Implementation(Implementation),
    Instance(Instance),
}

/// A resolved component: what was requested, how it is satisfied, and the
/// nodes its dependencies resolved to.
///
/// Nodes are shared between every consumer that resolved to them.
pub struct ComponentNode {
    id: usize,
    key: TypeKey,
    qualifier: Option<Qualifier>,
    satisfaction: Satisfaction,
    dependencies: Vec<(Dependency, Arc<ComponentNode>)>,
    shareable: bool,
    context: u64,
    value: OnceCell<Instance>,
}

impl ComponentNode {
    pub(crate) fn new(
        id: usize,
        dependency: &Dependency,
        satisfaction: Satisfaction,
        dependencies: Vec<(Dependency, Arc<ComponentNode>)>,
        shareable: bool,
        context: u64,
    ) -> Self {
        let value = match &satisfaction {
            Satisfaction::Instance(instance) => OnceCell::with_value(instance.clone()),
            Satisfaction::Implementation(_) => OnceCell::new(),
        };
        Self {
            id,
            key: dependency.key(),
            qualifier: dependency.qualifier().cloned(),
            satisfaction,
            dependencies,
            shareable,
            context,
            value,
        }
    }

    /// Position of this node in its graph; dependencies have smaller ids.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn qualifier(&self) -> Option<&Qualifier> {
        self.qualifier.as_ref()
    }

    pub fn satisfaction(&self) -> &Satisfaction {
        &self.satisfaction
    }

    pub fn dependencies(&self) -> impl Iterator<Item = &Arc<ComponentNode>> {
        self.dependencies.iter().map(|(_, node)| node)
    }

    pub fn is_shareable(&self) -> bool {
        self.shareable
    }

    /// Signature of the context path this node was first resolved at.
    pub fn context_signature(&self) -> u64 {
        self.context
    }

    pub fn is_instantiated(&self) -> bool {
        self.value.get().is_some()
    }

    pub fn value(&self) -> Option<&Instance> {
        self.value.get()
    }

    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.value.get().and_then(Instance::get::<T>)
    }

    pub fn label(&self) -> String {
        let mut label = match &self.qualifier {
            Some(q) => format!("{q} {}", self.key),
            None => self.key.to_string(),
        };
        if let Satisfaction::Implementation(imp) = &self.satisfaction {
            if imp.key() != self.key {
                label.push_str(&format!(" ({})", imp.key()));
            }
        }
        label
    }

    /// Builds this node and, first, everything it depends on.
    ///
    /// `chain` holds the labels of the nodes that led here.
    pub(crate) fn instantiate(&self, chain: &mut Vec<String>) -> Result<Instance, ResolutionError> {
        if let Some(value) = self.value.get() {
            return Ok(value.clone());
        }
        chain.push(self.label());
        let result = self.value.get_or_try_init(|| self.construct(chain)).cloned();
        chain.pop();
        result
    }

    fn construct(&self, chain: &mut Vec<String>) -> Result<Instance, ResolutionError> {
        let implementation = match &self.satisfaction {
            Satisfaction::Instance(instance) => return Ok(instance.clone()),
            Satisfaction::Implementation(implementation) => implementation,
        };

        let mut args = Arguments::default();
        for (dependency, node) in &self.dependencies {
            args.push(dependency, node.instantiate(chain)?);
        }

        tracing::debug!(component = %self.label(), "instantiating");
        implementation
            .instantiate(&args)
            .map_err(|source| ResolutionError::Instantiation {
                component: self.label(),
                chain: describe_chain(&chain[..chain.len().saturating_sub(1)]),
                source,
            })
    }
}

fn describe_chain(chain: &[String]) -> String {
    if chain.is_empty() {
        "the root set".to_string()
    } else {
        chain.join(" -> ")
    }
}

impl fmt::Debug for ComponentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentNode")
            .field("id", &self.id)
            .field("label", &self.label())
            .field("shareable", &self.shareable)
            .field(
                "dependencies",
                &self.dependencies().map(|n| n.id).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// The resolved DAG, rooted at the configured root types.
///
/// Read-only once built; rebuilding means resolving a configuration again.
#[derive(Debug, Default)]
pub struct ComponentGraph {
    roots: Vec<(TypeKey, Arc<ComponentNode>)>,
    nodes: Vec<Arc<ComponentNode>>,
}

impl ComponentGraph {
    pub(crate) fn new(
        roots: Vec<(TypeKey, Arc<ComponentNode>)>,
        nodes: Vec<Arc<ComponentNode>>,
    ) -> Self {
        Self { roots, nodes }
    }

    pub fn root(&self, key: TypeKey) -> Option<&Arc<ComponentNode>> {
        self.roots
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, node)| node)
    }

    pub fn roots(&self) -> impl Iterator<Item = (TypeKey, &Arc<ComponentNode>)> {
        self.roots.iter().map(|(key, node)| (*key, node))
    }

    /// The instantiated component for root type `T`.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.root(TypeKey::of::<T>()).and_then(|node| node.get::<T>())
    }

    /// Every distinct node, dependencies before their dependents.
    pub fn nodes(&self) -> impl Iterator<Item = &Arc<ComponentNode>> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_instantiated(&self) -> bool {
        self.nodes.iter().all(|node| node.is_instantiated())
    }

    /// Constructs every node reachable from the roots, each at most once.
    pub fn instantiate(&self) -> Result<(), ResolutionError> {
        let mut chain = Vec::new();
        for (_, node) in &self.roots {
            node.instantiate(&mut chain)?;
        }
        Ok(())
    }
}
