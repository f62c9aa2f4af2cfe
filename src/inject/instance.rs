//! Type-erased component instances.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::TypeKey;

/// A built value, stored as the `Arc<T>` of the type it satisfies.
///
/// Cloning an `Instance` clones the handle, never the underlying value.
#[derive(Clone)]
pub struct Instance {
    key: TypeKey,
    ptr: usize,
    value: Arc<dyn Any + Send + Sync>,
}

impl Instance {
    pub fn new<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            ptr: Arc::as_ptr(&value) as *const () as usize,
            value: Arc::new(value),
        }
    }

    /// The type this instance was registered as.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Returns the shared value if this instance was registered as `T`.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.value.downcast_ref::<Arc<T>>().cloned()
    }

    /// Address of the underlying value; two instances with the same identity
    /// share one object.
    pub fn identity(&self) -> usize {
        self.ptr
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({} @ {:#x})", self.key, self.ptr)
    }
}

/// Upcast from a shared implementation to a shared `I`.
///
/// Every type provides itself. Further interfaces are declared with
/// [`provides!`](crate::provides).
pub trait Provides<I: ?Sized> {
    fn provide(self: Arc<Self>) -> Arc<I>;
}

impl<T: ?Sized> Provides<T> for T {
    fn provide(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// The interfaces an object satisfies, used when registering pre-built components.
pub trait Capabilities: Send + Sync + 'static {
    fn capabilities(this: &Arc<Self>) -> Vec<Instance>;
}

/// Declares the interfaces a concrete type satisfies.
///
/// ```
/// use recgraph::api::ItemScorer;
/// # use recgraph::api::ScoredItem;
/// struct Fixed;
/// impl ItemScorer for Fixed {
///     fn score(&self, _user: i64, items: &[i64]) -> Vec<ScoredItem> {
///         items.iter().map(|&item| ScoredItem::new(item, 1.0)).collect()
///     }
/// }
/// recgraph::provides!(Fixed => dyn ItemScorer);
/// ```
#[macro_export]
macro_rules! provides {
    ($ty:ty => $($iface:ty),+ $(,)?) => {
        $(
            impl $crate::inject::Provides<$iface> for $ty {
                fn provide(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$iface> {
                    self
                }
            }
        )+

        impl $crate::inject::Capabilities for $ty {
            fn capabilities(
                this: &::std::sync::Arc<Self>,
            ) -> ::std::vec::Vec<$crate::inject::Instance> {
                ::std::vec![
                    $crate::inject::Instance::new::<$ty>(::std::sync::Arc::clone(this)),
                    $(
                        $crate::inject::Instance::new::<$iface>(
                            <$ty as $crate::inject::Provides<$iface>>::provide(
                                ::std::sync::Arc::clone(this),
                            ),
                        ),
                    )+
                ]
            }
        }
    };
}
