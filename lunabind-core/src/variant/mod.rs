//! Host-side value representation

pub mod error;
pub mod number;

pub use error::{ValueError, ValueResult};

use std::collections::BTreeMap;
use std::fmt;

/// Ordered sequence of variants
pub type VariantList = Vec<Variant>;

/// String-keyed variants, iterated in key order
pub type VariantMap = BTreeMap<String, Variant>;

/// Kind tag of a [`Variant`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VariantType {
    Invalid = 0,
    Null = 1,
    Boolean = 2,
    Integer = 3,
    Real = 4,
    String = 5,
    List = 6,
    Map = 7,
}

impl VariantType {
    /// Lower-case name used in diagnostics
    pub fn name(self) -> &'static str {
        match self {
            VariantType::Invalid => "invalid",
            VariantType::Null => "null",
            VariantType::Boolean => "boolean",
            VariantType::Integer => "integer",
            VariantType::Real => "real",
            VariantType::String => "string",
            VariantType::List => "list",
            VariantType::Map => "map",
        }
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value crossing the host/script boundary.
///
/// `Invalid` means "no value at all" (a call that returned nothing, a lookup
/// that missed) and is distinct from `Null`, which is an explicit nil.
/// Container payloads are owned; cloning a variant deep-copies them.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Variant {
    #[default]
    Invalid,
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(String),
    List(VariantList),
    Map(VariantMap),
}

impl Variant {
    /// Empty value of the given kind
    pub fn of_type(ty: VariantType) -> Self {
        match ty {
            VariantType::Invalid => Variant::Invalid,
            VariantType::Null => Variant::Null,
            VariantType::Boolean => Variant::Boolean(false),
            VariantType::Integer => Variant::Integer(0),
            VariantType::Real => Variant::Real(0.0),
            VariantType::String => Variant::String(String::new()),
            VariantType::List => Variant::List(VariantList::new()),
            VariantType::Map => Variant::Map(VariantMap::new()),
        }
    }

    pub fn variant_type(&self) -> VariantType {
        match self {
            Variant::Invalid => VariantType::Invalid,
            Variant::Null => VariantType::Null,
            Variant::Boolean(_) => VariantType::Boolean,
            Variant::Integer(_) => VariantType::Integer,
            Variant::Real(_) => VariantType::Real,
            Variant::String(_) => VariantType::String,
            Variant::List(_) => VariantType::List,
            Variant::Map(_) => VariantType::Map,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Variant::Invalid)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Variant::Null)
    }

    /// Reset to `Invalid`, dropping any owned payload
    pub fn clear(&mut self) {
        *self = Variant::Invalid;
    }

    /// Boolean coercion: booleans, non-zero integers and the string "true"
    pub fn to_boolean(&self, def: bool) -> bool {
        match self {
            Variant::Boolean(b) => *b,
            Variant::Integer(i) => *i != 0,
            Variant::String(s) => s == "true",
            _ => def,
        }
    }

    /// Integer coercion; reals truncate toward zero, strings parse their numeric prefix
    pub fn to_integer(&self, def: i64) -> i64 {
        match self {
            Variant::Boolean(b) => i64::from(*b),
            Variant::Integer(i) => *i,
            Variant::Real(r) => *r as i64,
            Variant::String(s) => number::parse_integer_prefix(s).unwrap_or(def),
            _ => def,
        }
    }

    /// Real coercion; strings parse their numeric prefix
    pub fn to_real(&self, def: f64) -> f64 {
        match self {
            Variant::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Variant::Integer(i) => *i as f64,
            Variant::Real(r) => *r,
            Variant::String(s) => number::parse_real_prefix(s).unwrap_or(def),
            _ => def,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Variant::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Variant::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Variant::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_string_mut(&mut self) -> Option<&mut String> {
        match self {
            Variant::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&VariantList> {
        match self {
            Variant::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut VariantList> {
        match self {
            Variant::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&VariantMap> {
        match self {
            Variant::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut VariantMap> {
        match self {
            Variant::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Strict string access
    pub fn expect_str(&self) -> ValueResult<&str> {
        self.as_str().ok_or_else(|| self.mismatch(VariantType::String))
    }

    /// Strict list access
    pub fn expect_list(&self) -> ValueResult<&VariantList> {
        self.as_list().ok_or_else(|| self.mismatch(VariantType::List))
    }

    /// Strict map access
    pub fn expect_map(&self) -> ValueResult<&VariantMap> {
        self.as_map().ok_or_else(|| self.mismatch(VariantType::Map))
    }

    /// Look up `key` in a map variant
    pub fn get(&self, key: &str) -> ValueResult<&Variant> {
        self.expect_map()?
            .get(key)
            .ok_or_else(|| ValueError::KeyNotFound(key.to_string()))
    }

    /// Element `index` of a list variant
    pub fn at(&self, index: usize) -> ValueResult<&Variant> {
        let items = self.expect_list()?;
        items.get(index).ok_or(ValueError::IndexOutOfBounds {
            index,
            length: items.len(),
        })
    }

    fn mismatch(&self, expected: VariantType) -> ValueError {
        ValueError::TypeMismatch {
            expected,
            actual: self.variant_type(),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Invalid => f.write_str("invalid"),
            Variant::Null => f.write_str("null"),
            Variant::Boolean(b) => f.write_str(if *b { "true" } else { "false" }),
            Variant::Integer(i) => write!(f, "{}", i),
            Variant::Real(r) => f.write_str(&number::format_real(*r)),
            Variant::String(s) => f.write_str(s),
            Variant::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Variant::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Variant {
    fn from(value: bool) -> Self {
        Variant::Boolean(value)
    }
}

impl From<i32> for Variant {
    fn from(value: i32) -> Self {
        Variant::Integer(i64::from(value))
    }
}

impl From<i64> for Variant {
    fn from(value: i64) -> Self {
        Variant::Integer(value)
    }
}

impl From<f64> for Variant {
    fn from(value: f64) -> Self {
        Variant::Real(value)
    }
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Variant::String(value.to_string())
    }
}

impl From<String> for Variant {
    fn from(value: String) -> Self {
        Variant::String(value)
    }
}

impl From<VariantList> for Variant {
    fn from(value: VariantList) -> Self {
        Variant::List(value)
    }
}

impl From<VariantMap> for Variant {
    fn from(value: VariantMap) -> Self {
        Variant::Map(value)
    }
}

impl<T: Into<Variant>> From<Option<T>> for Variant {
    fn from(value: Option<T>) -> Self {
        value.map_or(Variant::Null, Into::into)
    }
}

impl FromIterator<Variant> for Variant {
    fn from_iter<I: IntoIterator<Item = Variant>>(iter: I) -> Self {
        Variant::List(iter.into_iter().collect())
    }
}

impl<K: Into<String>> FromIterator<(K, Variant)> for Variant {
    fn from_iter<I: IntoIterator<Item = (K, Variant)>>(iter: I) -> Self {
        Variant::Map(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
#[path = "../variant_tests.rs"]
mod tests;
