//! Runtime values produced by option parsing.
//!
//! Every parsed option lands in one of four shapes: a string, a boolean, a
//! number, or the explicit absence marker `Undefined`. Handlers receive a
//! [`ParsedArgs`] bag keyed by the declaration keys of the command's options.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// A single parsed option value.
///
/// `Undefined` is distinct from an empty string or `false`: it means the
/// option was neither supplied on the command line nor given a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Str(String),
    Bool(bool),
    Num(f64),
    Undefined,
}

impl OptionValue {
    pub fn is_undefined(&self) -> bool {
        matches!(self, OptionValue::Undefined)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_num(&self) -> Option<f64> {
        match self {
            OptionValue::Num(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Str(s) => write!(f, "{}", s),
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Num(n) => write!(f, "{}", n),
            OptionValue::Undefined => write!(f, "undefined"),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Str(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Str(s)
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Bool(b)
    }
}

impl From<f64> for OptionValue {
    fn from(n: f64) -> Self {
        OptionValue::Num(n)
    }
}

/// The option bag handed to command handlers and transforms.
///
/// Entries appear in the declaration order of the command's options, one per
/// declared key, including keys that resolved to `Undefined` (unless the run
/// was configured to omit those). Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArgs {
    entries: Vec<(String, OptionValue)>,
}

impl ParsedArgs {
    pub(crate) fn new() -> Self {
        ParsedArgs {
            entries: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, key: impl Into<String>, value: OptionValue) {
        self.entries.push((key.into(), value));
    }

    /// Looks up a value by declaration key.
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// String value of `key`, if present and a string.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(OptionValue::as_str)
    }

    /// Boolean value of `key`, if present and a boolean.
    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(OptionValue::as_bool)
    }

    /// Numeric value of `key`, if present and a number.
    pub fn num(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(OptionValue::as_num)
    }

    /// Replaces the value under `key`, appending the entry if absent.
    ///
    /// Intended for transforms that enrich the bag before the handler runs.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry whose value is `Undefined`.
    pub(crate) fn drop_undefined(&mut self) {
        self.entries.retain(|(_, v)| !v.is_undefined());
    }
}

impl Serialize for ParsedArgs {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
