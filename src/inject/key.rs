//! Type descriptors and qualifiers.

use std::any::{type_name, TypeId};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Descriptor of a type that can be requested from a component graph.
///
/// Works for concrete types and for trait objects such as `dyn ItemScorer`.
/// Equality and hashing use the [`TypeId`] only; the name is for display.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Full type name as reported by the compiler.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name with module paths stripped (`dyn recgraph::api::ItemScorer` → `dyn ItemScorer`).
    pub fn short_name(&self) -> String {
        let mut out = String::with_capacity(self.name.len());
        let mut segment = String::new();
        let mut chars = self.name.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch == ':' && chars.peek() == Some(&':') {
                chars.next();
                segment.clear();
            } else if ch.is_alphanumeric() || ch == '_' {
                segment.push(ch);
            } else {
                out.push_str(&segment);
                segment.clear();
                out.push(ch);
            }
        }
        out.push_str(&segment);
        out
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.short_name())
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

/// Optional typed payload of a [`Qualifier`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QualifierValue {
    Int(i64),
    Text(Cow<'static, str>),
    Bool(bool),
}

impl fmt::Display for QualifierValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualifierValue::Int(i) => write!(f, "{i}"),
            QualifierValue::Text(s) => write!(f, "\"{s}\""),
            QualifierValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Discriminator between several bindings for the same type.
///
/// Qualifiers compare structurally: two qualifiers are the same when their
/// names and payloads are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Qualifier {
    name: Cow<'static, str>,
    value: Option<QualifierValue>,
}

impl Qualifier {
    pub const fn named(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            value: None,
        }
    }

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    pub fn with_value(mut self, value: QualifierValue) -> Self {
        self.value = Some(value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&QualifierValue> {
        self.value.as_ref()
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "@{}({value})", self.name),
            None => write!(f, "@{}", self.name),
        }
    }
}

/// Which qualifiers a binding or a pattern frame accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QualifierMatcher {
    Any,
    Unqualified,
    Exactly(Qualifier),
}

impl QualifierMatcher {
    pub fn matches(&self, qualifier: Option<&Qualifier>) -> bool {
        match (self, qualifier) {
            (QualifierMatcher::Any, _) => true,
            (QualifierMatcher::Unqualified, None) => true,
            (QualifierMatcher::Unqualified, Some(_)) => false,
            (QualifierMatcher::Exactly(expected), Some(actual)) => expected == actual,
            (QualifierMatcher::Exactly(_), None) => false,
        }
    }

    /// Whether this matcher names qualifiers precisely rather than accepting all of them.
    pub fn is_precise(&self) -> bool {
        !matches!(self, QualifierMatcher::Any)
    }
}

impl fmt::Display for QualifierMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualifierMatcher::Any => f.write_str("@*"),
            QualifierMatcher::Unqualified => Ok(()),
            QualifierMatcher::Exactly(q) => write!(f, "{q}"),
        }
    }
}

impl From<Option<Qualifier>> for QualifierMatcher {
    fn from(qualifier: Option<Qualifier>) -> Self {
        match qualifier {
            Some(q) => QualifierMatcher::Exactly(q),
            None => QualifierMatcher::Unqualified,
        }
    }
}
