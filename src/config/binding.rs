//! Binding records and the copy-on-write set that holds them.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::context::{ContextPath, ContextPattern};
use crate::inject::{Implementation, Instance, Qualifier, QualifierMatcher, TypeKey};

/// What a binding resolves its target to.
#[derive(Debug, Clone)]
pub enum BindingTarget {
    /// Construct an implementation from its dependencies.
    Class(Implementation),
    /// Use a pre-built object.
    Instance(Instance),
    /// Construct a provider and ask it for the value.
    Provider(Implementation),
    /// Use a scalar parameter value.
    Value(Instance),
    /// Use the default of the request, ignoring less specific bindings.
    Default,
}

impl fmt::Display for BindingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingTarget::Class(imp) => write!(f, "class {}", imp.key()),
            BindingTarget::Instance(instance) => write!(f, "instance {instance:?}"),
            BindingTarget::Provider(imp) => write!(f, "provider {}", imp.key()),
            BindingTarget::Value(value) => match value.get::<crate::inject::ParameterValue>() {
                Some(v) => write!(f, "value {v}"),
                None => write!(f, "value {value:?}"),
            },
            BindingTarget::Default => f.write_str("default"),
        }
    }
}

/// Tie-break tier between equally specific bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BindingTier {
    UseDefault,
    Explicit,
    Component,
}

/// One rule: in contexts matching `pattern`, requests for `target` with an
/// accepted qualifier resolve through `action`.
///
/// Immutable once created.
#[derive(Debug, Clone)]
pub struct BindingRecord {
    pattern: ContextPattern,
    target: TypeKey,
    qualifier: QualifierMatcher,
    action: BindingTarget,
    tier: BindingTier,
    per_use: bool,
}

impl BindingRecord {
    pub fn new(
        pattern: ContextPattern,
        target: TypeKey,
        qualifier: QualifierMatcher,
        action: BindingTarget,
    ) -> Self {
        let tier = match action {
            BindingTarget::Default => BindingTier::UseDefault,
            _ => BindingTier::Explicit,
        };
        Self {
            pattern,
            target,
            qualifier,
            action,
            tier,
            per_use: false,
        }
    }

    pub(crate) fn with_tier(mut self, tier: BindingTier) -> Self {
        self.tier = tier;
        self
    }

    pub(crate) fn per_use(mut self, per_use: bool) -> Self {
        self.per_use = per_use;
        self
    }

    pub fn pattern(&self) -> &ContextPattern {
        &self.pattern
    }

    pub fn target(&self) -> TypeKey {
        self.target
    }

    pub fn qualifier(&self) -> &QualifierMatcher {
        &self.qualifier
    }

    pub fn action(&self) -> &BindingTarget {
        &self.action
    }

    pub fn tier(&self) -> BindingTier {
        self.tier
    }

    /// Whether nodes built from this binding are never shared.
    pub fn is_per_use(&self) -> bool {
        self.per_use
    }

    pub fn applies(&self, key: TypeKey, qualifier: Option<&Qualifier>, path: &ContextPath) -> bool {
        self.target == key && self.qualifier.matches(qualifier) && self.pattern.matches(path)
    }

    /// Compares two applicable records; the greater one wins.
    ///
    /// Declaration order is not part of this ordering.
    pub fn rank(&self, other: &BindingRecord) -> Ordering {
        self.pattern
            .specificity()
            .cmp(&other.pattern.specificity())
            .then(self.tier.cmp(&other.tier))
            .then(self.qualifier.is_precise().cmp(&other.qualifier.is_precise()))
    }
}

impl fmt::Display for BindingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: bind {}", self.pattern, self.target)?;
        if !matches!(self.qualifier, QualifierMatcher::Unqualified) {
            write!(f, " {}", self.qualifier)?;
        }
        write!(f, " to {}", self.action)
    }
}

/// Ordered list of binding records.
///
/// Clones share storage until one side is modified, so copies never observe
/// each other's changes.
#[derive(Debug, Clone, Default)]
pub struct BindingSet {
    records: Arc<Vec<BindingRecord>>,
}

impl BindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: BindingRecord) {
        Arc::make_mut(&mut self.records).push(record);
    }

    pub fn records(&self) -> &[BindingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every applicable record with its declaration index.
    pub fn candidates<'a>(
        &'a self,
        key: TypeKey,
        qualifier: Option<&'a Qualifier>,
        path: &'a ContextPath,
    ) -> impl Iterator<Item = (usize, &'a BindingRecord)> + 'a {
        self.records
            .iter()
            .enumerate()
            .filter(move |(_, r)| r.applies(key, qualifier, path))
    }

    /// The winning record for a request: highest rank, latest declaration on ties.
    pub fn select(
        &self,
        key: TypeKey,
        qualifier: Option<&Qualifier>,
        path: &ContextPath,
    ) -> Option<&BindingRecord> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.applies(key, qualifier, path))
            .max_by(|(i, a), (j, b)| a.rank(b).then(i.cmp(j)))
            .map(|(_, record)| record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextFrame;
    use crate::inject::{Interface, ParameterValue};

    struct Target;
    struct Outer;
    impl Interface for Outer {}

    fn value(v: f64) -> BindingTarget {
        BindingTarget::Value(Instance::new(Arc::new(ParameterValue::Double(v))))
    }

    fn bound_value(record: &BindingRecord) -> f64 {
        match record.action() {
            BindingTarget::Value(v) => match *v.get::<ParameterValue>().unwrap() {
                ParameterValue::Double(d) => d,
                _ => panic!("not a double"),
            },
            _ => panic!("not a value"),
        }
    }

    fn record(pattern: ContextPattern, v: f64) -> BindingRecord {
        BindingRecord::new(
            pattern,
            TypeKey::of::<Target>(),
            QualifierMatcher::Unqualified,
            value(v),
        )
    }

    fn inside_outer() -> ContextPath {
        ContextPath::root().extend(ContextFrame::new(TypeKey::of::<Outer>(), None, None))
    }

    #[test]
    fn test_latest_wins_at_equal_specificity() {
        let mut set = BindingSet::new();
        set.push(record(ContextPattern::empty(), 1.0));
        set.push(record(ContextPattern::empty(), 2.0));

        let chosen = set
            .select(TypeKey::of::<Target>(), None, &ContextPath::root())
            .unwrap();
        assert_eq!(bound_value(chosen), 2.0);
    }

    #[test]
    fn test_longer_pattern_wins_regardless_of_order() {
        for nested_first in [true, false] {
            let mut set = BindingSet::new();
            let nested = record(ContextPattern::empty().within::<Outer>(), 4.0);
            let top = record(ContextPattern::empty(), 3.5);
            if nested_first {
                set.push(nested);
                set.push(top);
            } else {
                set.push(top);
                set.push(nested);
            }

            let key = TypeKey::of::<Target>();
            assert_eq!(bound_value(set.select(key, None, &inside_outer()).unwrap()), 4.0);
            assert_eq!(bound_value(set.select(key, None, &ContextPath::root()).unwrap()), 3.5);
        }
    }

    #[test]
    fn test_at_beats_within_declared_later() {
        let mut set = BindingSet::new();
        set.push(record(ContextPattern::empty().at::<Outer>(), 1.0));
        set.push(record(ContextPattern::empty().within::<Outer>(), 2.0));

        let chosen = set.select(TypeKey::of::<Target>(), None, &inside_outer()).unwrap();
        assert_eq!(bound_value(chosen), 1.0);
    }

    #[test]
    fn test_explicit_beats_use_default_declared_later() {
        let mut set = BindingSet::new();
        set.push(record(ContextPattern::empty(), 1.0));
        set.push(BindingRecord::new(
            ContextPattern::empty(),
            TypeKey::of::<Target>(),
            QualifierMatcher::Unqualified,
            BindingTarget::Default,
        ));

        let chosen = set.select(TypeKey::of::<Target>(), None, &ContextPath::root()).unwrap();
        assert_eq!(chosen.tier(), BindingTier::Explicit);
    }

    #[test]
    fn test_qualifier_filtering() {
        let q = Qualifier::named("q");
        let mut set = BindingSet::new();
        set.push(record(ContextPattern::empty(), 1.0));

        let key = TypeKey::of::<Target>();
        assert!(set.select(key, Some(&q), &ContextPath::root()).is_none());

        set.push(BindingRecord::new(
            ContextPattern::empty(),
            key,
            QualifierMatcher::Any,
            value(5.0),
        ));
        assert_eq!(bound_value(set.select(key, Some(&q), &ContextPath::root()).unwrap()), 5.0);
        // the precise unqualified binding outranks the later catch-all
        assert_eq!(bound_value(set.select(key, None, &ContextPath::root()).unwrap()), 1.0);
    }

    #[test]
    fn test_clone_does_not_alias() {
        let mut original = BindingSet::new();
        original.push(record(ContextPattern::empty(), 1.0));
        let mut copy = original.clone();
        copy.push(record(ContextPattern::empty(), 2.0));
        original.push(record(ContextPattern::empty().within::<Outer>(), 3.0));

        assert_eq!(original.len(), 2);
        assert_eq!(copy.len(), 2);
        assert_eq!(bound_value(&copy.records()[1]), 2.0);
        assert_eq!(bound_value(&original.records()[1]), 3.0);
    }
}
