//! Scalar configuration parameters.
//!
//! Parameters are tunable values (thresholds, iteration counts) identified by a
//! qualifier rather than by a component type. Every parameter is requested
//! under the [`ParameterValue`] type key and converted on the way out.

use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

use serde::Deserialize;

use super::Qualifier;

/// A scalar value bound to a parameter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Integer(i64),
    Double(f64),
    Text(Cow<'static, str>),
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Bool(b) => write!(f, "{b}"),
            ParameterValue::Integer(i) => write!(f, "{i}"),
            ParameterValue::Double(d) => write!(f, "{d}"),
            ParameterValue::Text(s) => write!(f, "\"{s}\""),
        }
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        ParameterValue::Bool(value)
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        ParameterValue::Integer(value)
    }
}

impl From<i32> for ParameterValue {
    fn from(value: i32) -> Self {
        ParameterValue::Integer(i64::from(value))
    }
}

impl From<u32> for ParameterValue {
    fn from(value: u32) -> Self {
        ParameterValue::Integer(i64::from(value))
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        ParameterValue::Double(value)
    }
}

impl From<&'static str> for ParameterValue {
    fn from(value: &'static str) -> Self {
        ParameterValue::Text(Cow::Borrowed(value))
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        ParameterValue::Text(Cow::Owned(value))
    }
}

/// Conversion from a bound [`ParameterValue`] to the type a component wants.
pub trait FromParameter: Sized {
    fn from_parameter(value: &ParameterValue) -> Option<Self>;
}

impl FromParameter for f64 {
    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Double(d) => Some(*d),
            ParameterValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl FromParameter for i64 {
    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl FromParameter for usize {
    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Integer(i) => usize::try_from(*i).ok(),
            _ => None,
        }
    }
}

impl FromParameter for bool {
    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromParameter for String {
    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Text(s) => Some(s.to_string()),
            _ => None,
        }
    }
}

/// Declaration of a parameter: its qualifier and optional default value.
///
/// ```
/// use recgraph::inject::{Parameter, ParameterValue};
///
/// pub const MIN_COMMON_USERS: Parameter<usize> =
///     Parameter::with_default("min_common_users", ParameterValue::Integer(2));
/// ```
pub struct Parameter<T> {
    qualifier: Qualifier,
    default: Option<ParameterValue>,
    _type: PhantomData<fn() -> T>,
}

impl<T> Parameter<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            qualifier: Qualifier::named(name),
            default: None,
            _type: PhantomData,
        }
    }

    pub const fn with_default(name: &'static str, default: ParameterValue) -> Self {
        Self {
            qualifier: Qualifier::named(name),
            default: Some(default),
            _type: PhantomData,
        }
    }

    pub fn qualifier(&self) -> &Qualifier {
        &self.qualifier
    }

    pub fn default_value(&self) -> Option<&ParameterValue> {
        self.default.as_ref()
    }
}

impl<T> fmt::Debug for Parameter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("qualifier", &self.qualifier)
            .field("default", &self.default)
            .finish()
    }
}
