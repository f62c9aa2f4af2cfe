use std::fmt;

use crate::inject::{Interface, Qualifier, QualifierMatcher, TypeKey};

use super::{ContextFrame, ContextPath};

/// How a pattern frame relates to the frame matched after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchMode {
    /// Any number of frames may follow before the next match.
    Within,
    /// The next match (or the end of the path) must follow immediately.
    At,
}

/// One element of a [`ContextPattern`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternFrame {
    ty: TypeKey,
    qualifier: QualifierMatcher,
    mode: MatchMode,
}

impl PatternFrame {
    pub fn new(ty: TypeKey, qualifier: QualifierMatcher, mode: MatchMode) -> Self {
        Self {
            ty,
            qualifier,
            mode,
        }
    }

    pub fn ty(&self) -> TypeKey {
        self.ty
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// A frame matches when its type is the requested type or the chosen
    /// implementation type, and the qualifier is accepted.
    pub fn matches(&self, frame: &ContextFrame) -> bool {
        (frame.requested() == self.ty || frame.implementation() == Some(self.ty))
            && self.qualifier.matches(frame.qualifier())
    }
}

impl fmt::Display for PatternFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self.mode {
            MatchMode::Within => "within",
            MatchMode::At => "at",
        };
        match &self.qualifier {
            QualifierMatcher::Any => write!(f, "{keyword}({})", self.ty),
            q => write!(f, "{keyword}({q} {})", self.ty),
        }
    }
}

/// Ordered match condition over context paths.
///
/// Frames must appear in order as a subsequence of the path. [`MatchMode::At`]
/// pins a frame to the one after it: `at(A)` alone means "requested directly
/// by an `A`", `at(A).within(B)` means "somewhere below a `B` that an `A`
/// depends on directly". The empty pattern matches every path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ContextPattern {
    frames: Vec<PatternFrame>,
}

impl ContextPattern {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn within<T: ?Sized + Interface>(self) -> Self {
        self.push(PatternFrame::new(
            TypeKey::of::<T>(),
            QualifierMatcher::Any,
            MatchMode::Within,
        ))
    }

    pub fn within_qualified<T: ?Sized + Interface>(self, qualifier: Qualifier) -> Self {
        self.push(PatternFrame::new(
            TypeKey::of::<T>(),
            QualifierMatcher::Exactly(qualifier),
            MatchMode::Within,
        ))
    }

    pub fn at<T: ?Sized + Interface>(self) -> Self {
        self.push(PatternFrame::new(
            TypeKey::of::<T>(),
            QualifierMatcher::Any,
            MatchMode::At,
        ))
    }

    pub fn at_qualified<T: ?Sized + Interface>(self, qualifier: Qualifier) -> Self {
        self.push(PatternFrame::new(
            TypeKey::of::<T>(),
            QualifierMatcher::Exactly(qualifier),
            MatchMode::At,
        ))
    }

    pub fn push(mut self, frame: PatternFrame) -> Self {
        self.frames.push(frame);
        self
    }

    /// This pattern followed by all frames of `other`.
    pub fn append(mut self, other: &ContextPattern) -> Self {
        self.frames.extend(other.frames.iter().cloned());
        self
    }

    pub fn frames(&self) -> &[PatternFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Ranking by shape alone: frame count first, then number of adjacency
    /// constraints.
    pub fn specificity(&self) -> (usize, usize) {
        let at_frames = self
            .frames
            .iter()
            .filter(|f| f.mode == MatchMode::At)
            .count();
        (self.frames.len(), at_frames)
    }

    pub fn matches(&self, path: &ContextPath) -> bool {
        matches_from(&self.frames, path.frames(), 0, true)
    }
}

fn matches_from(pattern: &[PatternFrame], path: &[ContextFrame], start: usize, free: bool) -> bool {
    let Some((head, rest)) = pattern.split_first() else {
        return free || start == path.len();
    };
    let end = if free {
        path.len()
    } else {
        (start + 1).min(path.len())
    };
    (start..end).any(|pos| {
        head.matches(&path[pos])
            && matches_from(rest, path, pos + 1, head.mode == MatchMode::Within)
    })
}

impl fmt::Display for ContextPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            return f.write_str("<root>");
        }
        for (i, frame) in self.frames.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{frame}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct A;
    struct B;
    struct C;
    impl Interface for A {}
    impl Interface for B {}
    impl Interface for C {}

    fn path(keys: &[TypeKey]) -> ContextPath {
        keys.iter().fold(ContextPath::root(), |p, k| {
            p.extend(ContextFrame::new(*k, None, None))
        })
    }

    fn a() -> TypeKey {
        TypeKey::of::<A>()
    }
    fn b() -> TypeKey {
        TypeKey::of::<B>()
    }
    fn c() -> TypeKey {
        TypeKey::of::<C>()
    }

    #[test]
    fn test_empty_pattern_matches_everything() {
        assert!(ContextPattern::empty().matches(&ContextPath::root()));
        assert!(ContextPattern::empty().matches(&path(&[a(), b()])));
    }

    #[test]
    fn test_within_allows_intermediate_frames() {
        let pattern = ContextPattern::empty().within::<A>();
        assert!(pattern.matches(&path(&[a()])));
        assert!(pattern.matches(&path(&[a(), b(), c()])));
        assert!(pattern.matches(&path(&[c(), a()])));
        assert!(!pattern.matches(&path(&[b(), c()])));
        assert!(!pattern.matches(&ContextPath::root()));
    }

    #[test]
    fn test_at_requires_direct_parent() {
        let pattern = ContextPattern::empty().at::<A>();
        assert!(pattern.matches(&path(&[a()])));
        assert!(pattern.matches(&path(&[b(), a()])));
        assert!(!pattern.matches(&path(&[a(), b()])));
    }

    #[test]
    fn test_at_then_within_requires_adjacency() {
        let pattern = ContextPattern::empty().at::<A>().within::<B>();
        assert!(pattern.matches(&path(&[a(), b()])));
        assert!(pattern.matches(&path(&[a(), b(), c()])));
        assert!(!pattern.matches(&path(&[a(), c(), b()])));
    }

    #[test]
    fn test_within_then_at() {
        let pattern = ContextPattern::empty().within::<A>().at::<B>();
        assert!(pattern.matches(&path(&[a(), c(), b()])));
        assert!(!pattern.matches(&path(&[a(), b(), c()])));
        assert!(!pattern.matches(&path(&[b(), a()])));
    }

    #[test]
    fn test_backtracks_over_repeated_types() {
        let pattern = ContextPattern::empty().within::<A>().at::<B>();
        assert!(pattern.matches(&path(&[a(), b(), a(), b()])));
    }

    #[test]
    fn test_implementation_type_matches() {
        let frame = ContextFrame::new(a(), Some(b()), None);
        let p = ContextPath::root().extend(frame);
        assert!(ContextPattern::empty().within::<B>().matches(&p));
        assert!(ContextPattern::empty().within::<A>().matches(&p));
    }

    #[test]
    fn test_qualified_frames() {
        let q = Qualifier::named("left");
        let p = ContextPath::root().extend(ContextFrame::new(a(), None, Some(q.clone())));
        assert!(ContextPattern::empty().within::<A>().matches(&p));
        assert!(ContextPattern::empty().within_qualified::<A>(q).matches(&p));
        assert!(!ContextPattern::empty()
            .within_qualified::<A>(Qualifier::named("right"))
            .matches(&p));
    }

    #[test]
    fn test_specificity_counts_frames_then_adjacency() {
        let within = ContextPattern::empty().within::<A>();
        let at = ContextPattern::empty().at::<A>();
        let longer = ContextPattern::empty().within::<A>().within::<B>();
        assert!(at.specificity() > within.specificity());
        assert!(longer.specificity() > at.specificity());
    }
}
