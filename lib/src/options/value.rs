use std::fmt;
use std::path::PathBuf;

use strum::Display;

/// Declared type of an option
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ValueKind {
    /// Bare flag, true when present on the command line
    Bool,
    Str,
    /// Signed 64-bit integer
    Int,
    /// Unsigned 64-bit integer
    UInt,
    Float,
    Path,
}

impl ValueKind {
    /// Flags take no value token
    pub fn takes_value(self) -> bool {
        self != ValueKind::Bool
    }
}

/// Type-erased option value
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Str(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Path(PathBuf),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Str(_) => ValueKind::Str,
            Value::Int(_) => ValueKind::Int,
            Value::UInt(_) => ValueKind::UInt,
            Value::Float(_) => ValueKind::Float,
            Value::Path(_) => ValueKind::Path,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::UInt(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Path(v) => write!(f, "{}", v.display()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<PathBuf> for Value {
    fn from(v: PathBuf) -> Self {
        Value::Path(v)
    }
}

/// Rust type that can be read back out of a [`Value`].
///
/// Every implementor maps to exactly one [`ValueKind`]; there is no
/// conversion between kinds.
pub trait OptionType: Sized {
    const KIND: ValueKind;

    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! option_type {
    ($ty:ty, $kind:ident) => {
        impl OptionType for $ty {
            const KIND: ValueKind = ValueKind::$kind;

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$kind(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

option_type!(bool, Bool);
option_type!(String, Str);
option_type!(i64, Int);
option_type!(u64, UInt);
option_type!(f64, Float);
option_type!(PathBuf, Path);
