use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::inject::{Qualifier, TypeKey};

/// One step of a dependency chain: the type that was requested, the
/// implementation chosen for it, and the qualifier of the request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextFrame {
    requested: TypeKey,
    implementation: Option<TypeKey>,
    qualifier: Option<Qualifier>,
}

impl ContextFrame {
    pub fn new(
        requested: TypeKey,
        implementation: Option<TypeKey>,
        qualifier: Option<Qualifier>,
    ) -> Self {
        Self {
            requested,
            implementation,
            qualifier,
        }
    }

    pub fn requested(&self) -> TypeKey {
        self.requested
    }

    pub fn implementation(&self) -> Option<TypeKey> {
        self.implementation
    }

    pub fn qualifier(&self) -> Option<&Qualifier> {
        self.qualifier.as_ref()
    }
}

impl fmt::Display for ContextFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(q) = &self.qualifier {
            write!(f, "{q} ")?;
        }
        write!(f, "{}", self.requested)?;
        match self.implementation {
            Some(imp) if imp != self.requested => write!(f, " ({imp})"),
            _ => Ok(()),
        }
    }
}

/// Frames from a root down to the component making the current request.
///
/// Exists only while a graph is being resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ContextPath {
    frames: Vec<ContextFrame>,
}

impl ContextPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// A new path one frame deeper; `self` is left untouched.
    pub fn extend(&self, frame: ContextFrame) -> Self {
        let mut frames = Vec::with_capacity(self.frames.len() + 1);
        frames.extend(self.frames.iter().cloned());
        frames.push(frame);
        Self { frames }
    }

    pub fn frames(&self) -> &[ContextFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Position of `frame` on this path, if a component is already being
    /// resolved there.
    pub fn position(&self, frame: &ContextFrame) -> Option<usize> {
        self.frames.iter().position(|f| f == frame)
    }

    pub fn signature(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.frames.hash(&mut hasher);
        hasher.finish()
    }
}

impl fmt::Display for ContextPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            return f.write_str("<root>");
        }
        for (i, frame) in self.frames.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{frame}")?;
        }
        Ok(())
    }
}
