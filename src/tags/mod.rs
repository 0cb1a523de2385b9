//! Tag model.
//!
//! # Data Flow
//! ```text
//! call site (tags! / Tags::with / Tags::from_pairs)
//!     → Tags (key → value, keys unique)
//!     → merge with stop-time or override tags (right-biased)
//!     → join(style) → wire-ready tokens handed to the sink
//! ```
//!
//! # Design Decisions
//! - Backed by a `BTreeMap`, so rendered token order is canonical (sorted by key)
//! - Merging never mutates its inputs; later sets win on duplicate keys
//! - The rendering style is chosen once per registry from the agent flavor

mod value;

pub use value::{bool_tag, coerce, int_tag, Integer, TagValue, NIL};

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::{btree_map, BTreeMap, HashMap};

/// How tag pairs are rendered for the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagStyle {
    /// `key:value` tokens (Datadog agents).
    Colon,
    /// `key`, `value` as two consecutive tokens (Telegraf agents).
    #[default]
    Pairs,
}

impl TagStyle {
    /// Append one rendered pair to `out`.
    pub fn push(self, out: &mut Vec<String>, key: &str, value: &str) {
        match self {
            TagStyle::Colon => out.push(format!("{key}:{value}")),
            TagStyle::Pairs => {
                out.push(key.to_string());
                out.push(value.to_string());
            }
        }
    }
}

/// Build a [`Tags`] set from `key => value` pairs.
///
/// Values may be any [`TagValue`] (strings, numbers, booleans, options).
///
/// ```
/// let tags = statter::tags! { "route" => "/health", "attempt" => 2, "cached" => false };
/// assert_eq!(tags.get("attempt"), Some("2"));
/// ```
#[macro_export]
macro_rules! tags {
    () => {
        $crate::tags::Tags::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut tags = $crate::tags::Tags::new();
        $(
            tags.insert($key, $crate::tags::TagValue::to_tag_value(&$value));
        )+
        tags
    }};
}

/// Key/value annotations attached to an emitted metric.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a flat list of alternating keys and values.
    ///
    /// A trailing unpaired key is dropped. Pairs whose key is not a string or
    /// whose value cannot be coerced are skipped.
    pub fn from_pairs(args: &[&dyn Any]) -> Self {
        let mut tags = Self::new();
        tags.add_pairs(args);
        tags
    }

    /// Add alternating key/value arguments, see [`Tags::from_pairs`].
    pub fn add_pairs(&mut self, args: &[&dyn Any]) -> &mut Self {
        for pair in args.chunks_exact(2) {
            let Some(key) = dyn_key(pair[0]) else {
                continue;
            };
            if let Some(value) = coerce(pair[1]) {
                self.0.insert(key, value);
            }
        }
        self
    }

    /// Insert or overwrite a single tag.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl TagValue) -> Self {
        self.0.insert(key.into(), value.to_tag_value());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.0.iter()
    }

    /// Merge `overrides` on top of `base` into a new set. Later sets win.
    pub fn merge<'a, I>(base: &Tags, overrides: I) -> Tags
    where
        I: IntoIterator<Item = &'a Tags>,
    {
        let mut merged = base.clone();
        for tags in overrides {
            merged.extend_from(tags);
        }
        merged
    }

    /// `self` with `other` merged on top.
    pub fn merged(&self, other: &Tags) -> Tags {
        Self::merge(self, [other])
    }

    /// Overwrite this set's keys with `other`'s.
    pub fn extend_from(&mut self, other: &Tags) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Render every pair in `style`, ordered by key.
    pub fn join(&self, style: TagStyle) -> Vec<String> {
        let capacity = match style {
            TagStyle::Colon => self.0.len(),
            TagStyle::Pairs => self.0.len() * 2,
        };
        let mut out = Vec::with_capacity(capacity);
        for (key, value) in &self.0 {
            style.push(&mut out, key, value);
        }
        out
    }
}

fn dyn_key(key: &dyn Any) -> Option<String> {
    if let Some(key) = key.downcast_ref::<&'static str>() {
        return Some((*key).to_string());
    }
    key.downcast_ref::<String>().cloned()
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<BTreeMap<String, String>> for Tags {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl From<HashMap<String, String>> for Tags {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Tags {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::fmt::Display for Tags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}
