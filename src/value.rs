//! Dynamic sample values.
//!
//! A [`Value`] holds one data sample (or part of one) whose layout is described
//! by a [`DynamicType`](crate::schema::DynamicType). Values carry no type names:
//! the traversal interprets them against the schema.
//!
//! | Schema | Value |
//! |--------|-------|
//! | boolean | `Bool` |
//! | signed integers | `Int` |
//! | octet, unsigned integers | `UInt` (or a non-negative `Int`) |
//! | float32, float64 | `Float` (or `Int`) |
//! | char | `Char` |
//! | string | `String` |
//! | enumeration | `Enum` (the numeric value) |
//! | struct | `Struct`, unset optionals absent |
//! | union | `Union` |
//! | array, sequence | `Sequence`, arrays flattened in row-major order |
//!
//! ```rust
//! use flatcsv::{MemberMap, Value};
//!
//! let mut members = MemberMap::new();
//! members.insert("a", Value::from(5));
//! members.insert("c", Value::from(vec![7, 9]));
//! let sample = Value::Struct(members);
//!
//! assert!(sample.is_struct());
//! assert_eq!(sample.get("c").and_then(Value::as_sequence).map(<[Value]>::len), Some(2));
//! ```

use crate::map::MemberMap;
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Char(char),
    String(String),
    Enum(i32),
    Struct(MemberMap),
    /// Union sample; `value` is absent when the discriminator selects no case.
    Union {
        discriminator: i64,
        value: Option<Box<Value>>,
    },
    Sequence(Vec<Value>),
}

impl Value {
    /// Union sample selecting the case labelled `discriminator`.
    pub fn union(discriminator: i64, value: impl Into<Value>) -> Self {
        Value::Union {
            discriminator,
            value: Some(Box::new(value.into())),
        }
    }

    /// Name of the value kind, for error messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Char(_) => "char",
            Value::String(_) => "string",
            Value::Enum(_) => "enum",
            Value::Struct(_) => "struct",
            Value::Union { .. } => "union",
            Value::Sequence(_) => "sequence",
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_struct(&self) -> bool {
        matches!(self, Value::Struct(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_sequence(&self) -> bool {
        matches!(self, Value::Sequence(_))
    }

    /// Integer view of `Int`, `UInt` and `Enum` values that fit an `i64`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::UInt(u) => i64::try_from(*u).ok(),
            Value::Enum(e) => Some(i64::from(*e)),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt(u) => Some(*u),
            Value::Int(i) => u64::try_from(*i).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            Value::UInt(u) => Some(*u as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_struct(&self) -> Option<&MemberMap> {
        match self {
            Value::Struct(members) => Some(members),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(elements) => Some(elements),
            _ => None,
        }
    }

    /// Member of a struct value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.as_struct().and_then(|members| members.get(name))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::UInt(u) => write!(f, "{}", u),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::Char(c) => write!(f, "{}", c),
            Value::String(s) => f.write_str(s),
            Value::Enum(e) => write!(f, "{}", e),
            Value::Struct(members) => {
                f.write_str("{")?;
                for (i, (name, value)) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                f.write_str("}")
            }
            Value::Union {
                discriminator,
                value,
            } => match value {
                Some(value) => write!(f, "<{}: {}>", discriminator, value),
                None => write!(f, "<{}>", discriminator),
            },
            Value::Sequence(elements) => {
                f.write_str("[")?;
                for (i, value) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i8> for Value {
    fn from(value: i8) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Value::UInt(u64::from(value))
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Value::UInt(u64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::UInt(u64::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::UInt(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Value::Char(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<MemberMap> for Value {
    fn from(value: MemberMap) -> Self {
        Value::Struct(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Sequence(value.into_iter().map(Into::into).collect())
    }
}
