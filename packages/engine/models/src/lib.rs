#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pattern set and extraction result types.
//!
//! A [`PatternSet`] maps field names to regular expressions and keeps the
//! order in which the fields were defined. Running a pattern set against a
//! document's text produces an [`ExtractionResult`] with exactly one entry
//! per field, where `None` marks a field that yielded no value.
//!
//! Both types serialize as flat maps so they read naturally in the pattern
//! configuration file and in JSON output.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Ordered mapping from field name to regular expression.
///
/// Field names are unique. Inserting an existing name replaces its pattern
/// in place, so the field keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternSet {
    entries: Vec<(String, String)>,
}

impl PatternSet {
    /// Creates an empty pattern set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of fields in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set defines no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the pattern for `field`, if defined.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.position(field).map(|i| self.entries[i].1.as_str())
    }

    /// Whether `field` is defined.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.position(field).is_some()
    }

    /// Sets the pattern for `field`, returning the previous pattern if the
    /// field already existed.
    pub fn insert(&mut self, field: impl Into<String>, pattern: impl Into<String>) -> Option<String> {
        let field = field.into();
        let pattern = pattern.into();

        if let Some(i) = self.position(&field) {
            return Some(std::mem::replace(&mut self.entries[i].1, pattern));
        }

        self.entries.push((field, pattern));
        None
    }

    /// Removes `field`, returning its pattern.
    pub fn remove(&mut self, field: &str) -> Option<String> {
        self.position(field).map(|i| self.entries.remove(i).1)
    }

    /// Renames a field without changing its position or pattern.
    ///
    /// Returns `false` when `from` is not defined or `to` is already taken
    /// by another field.
    pub fn rename(&mut self, from: &str, to: impl Into<String>) -> bool {
        let to = to.into();
        let Some(i) = self.position(from) else {
            return false;
        };
        if from != to && self.contains(&to) {
            return false;
        }
        self.entries[i].0 = to;
        true
    }

    /// Iterates over `(field, pattern)` pairs in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(f, p)| (f.as_str(), p.as_str()))
    }

    /// Iterates over field names in definition order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(f, _)| f.as_str())
    }

    fn position(&self, field: &str) -> Option<usize> {
        self.entries.iter().position(|(f, _)| f == field)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PatternSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (field, pattern) in iter {
            set.insert(field, pattern);
        }
        set
    }
}

impl Serialize for PatternSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (field, pattern) in &self.entries {
            map.serialize_entry(field, pattern)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PatternSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PatternSetVisitor;

        impl<'de> Visitor<'de> for PatternSetVisitor {
            type Value = PatternSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to regular expression strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut set = PatternSet::new();
                while let Some((field, pattern)) = access.next_entry::<String, String>()? {
                    set.insert(field, pattern);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(PatternSetVisitor)
    }
}

/// The value selected for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    /// Field name from the pattern set.
    pub field: String,
    /// Selected value, or `None` when the pattern produced nothing usable.
    pub value: Option<String>,
}

impl FieldValue {
    /// Creates a field value.
    #[must_use]
    pub fn new(field: impl Into<String>, value: Option<String>) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }
}

/// Per-document extraction output: one entry per pattern-set field, in
/// pattern-set order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    fields: Vec<FieldValue>,
}

impl ExtractionResult {
    /// Creates an empty result.
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Appends a field. Callers are expected to push each field once.
    pub fn push(&mut self, field: FieldValue) {
        self.fields.push(field);
    }

    /// Number of fields in the result.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the result holds no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Looks up a field. The outer `Option` is whether the field is part of
    /// the result, the inner one whether it has a value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<Option<&str>> {
        self.fields
            .iter()
            .find(|f| f.field == field)
            .map(|f| f.value.as_deref())
    }

    /// Returns the value for `field`, or `None` when it is absent or has no
    /// value.
    #[must_use]
    pub fn value(&self, field: &str) -> Option<&str> {
        self.get(field).flatten()
    }

    /// Iterates over the fields in order.
    pub fn iter(&self) -> std::slice::Iter<'_, FieldValue> {
        self.fields.iter()
    }

    /// Iterates over the field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.field.as_str())
    }

    /// Number of fields that have a value.
    #[must_use]
    pub fn matched_count(&self) -> usize {
        self.fields.iter().filter(|f| f.value.is_some()).count()
    }
}

impl FromIterator<FieldValue> for ExtractionResult {
    fn from_iter<I: IntoIterator<Item = FieldValue>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ExtractionResult {
    type Item = &'a FieldValue;
    type IntoIter = std::slice::Iter<'a, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl Serialize for ExtractionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for field in &self.fields {
            map.serialize_entry(&field.field, &field.value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ExtractionResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ResultVisitor;

        impl<'de> Visitor<'de> for ResultVisitor {
            type Value = ExtractionResult;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to optional strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut result = ExtractionResult::new();
                while let Some((field, value)) = access.next_entry::<String, Option<String>>()? {
                    result.push(FieldValue::new(field, value));
                }
                Ok(result)
            }
        }

        deserializer.deserialize_map(ResultVisitor)
    }
}

/// A field whose pattern could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name from the pattern set.
    pub field: String,
    /// Compiler message for the pattern.
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid pattern for field '{}': {}", self.field, self.message)
    }
}

/// Result of running a pattern set over one text, together with the fields
/// whose patterns failed to compile.
///
/// Failed fields still appear in [`Extraction::result`] with no value, so
/// the result always covers the full pattern set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    /// One value per pattern-set field.
    pub result: ExtractionResult,
    /// Fields whose patterns did not compile.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl Extraction {
    /// Whether every pattern compiled.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
