//! Ordered member map for structure samples.
//!
//! [`MemberMap`] is a thin wrapper around [`IndexMap`] holding the members set
//! in a structure sample. Members are looked up by name while the sample is
//! traversed in schema order, so the insertion order only matters for
//! debugging output. An optional member that is unset is simply absent.
//!
//! ## Examples
//!
//! ```rust
//! use flatcsv::{MemberMap, Value};
//!
//! let mut map = MemberMap::new();
//! map.insert("a", Value::from(5));
//! map.insert("c", Value::from(vec![7, 9]));
//!
//! assert_eq!(map.len(), 2);
//! assert!(!map.contains_key("b"));
//! ```

use crate::value::Value;
use indexmap::IndexMap;
use std::collections::HashMap;

/// An ordered map of member names to sample values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemberMap(IndexMap<String, Value>);

impl MemberMap {
    /// Creates an empty `MemberMap`.
    #[must_use]
    pub fn new() -> Self {
        MemberMap(IndexMap::new())
    }

    /// Creates an empty `MemberMap` with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        MemberMap(IndexMap::with_capacity(capacity))
    }

    /// Sets a member, returning its previous value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use flatcsv::{MemberMap, Value};
    ///
    /// let mut map = MemberMap::new();
    /// assert!(map.insert("a", Value::from(1)).is_none());
    /// assert!(map.insert("a", Value::from(2)).is_some());
    /// ```
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(name.into(), value)
    }

    /// Unsets a member, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.shift_remove(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the member names, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Value> {
        self.0.keys()
    }

    /// Returns an iterator over the members, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.0.iter()
    }
}

impl From<HashMap<String, Value>> for MemberMap {
    fn from(map: HashMap<String, Value>) -> Self {
        MemberMap(map.into_iter().collect())
    }
}

impl IntoIterator for MemberMap {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a MemberMap {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for MemberMap {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        MemberMap(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
