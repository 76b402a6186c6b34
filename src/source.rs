//! Parameter sources: anything that can list field names and look values up by name.

use std::collections::{BTreeMap, HashMap};

use crate::error::Result;
use crate::value::{Param, Value};

/// Outcome of looking a name up in a [`Source`].
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// The source holds a non-null value for the name.
    Present(Value),
    /// The source knows the name but its value is null.
    Null,
    /// The source does not know the name.
    Absent,
}

impl Lookup {
    pub fn from_value(value: Value) -> Self {
        if value.is_null() {
            Lookup::Null
        } else {
            Lookup::Present(value)
        }
    }

    /// The value to bind, `None` when the name was never seen.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Lookup::Present(value) => Some(value),
            Lookup::Null => Some(Value::Null),
            Lookup::Absent => None,
        }
    }
}

/// A named-field parameter source.
///
/// Implemented for string-keyed maps, for `serde_json::Value` objects (feature
/// `json`) and for every [`Record`](crate::record::Record).
pub trait Source {
    /// Names expanded by the bulk directives, sorted lexicographically.
    fn field_names(&self) -> Result<Vec<String>>;

    fn lookup(&self, name: &str) -> Lookup;
}

fn sorted<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut names: Vec<String> = keys.map(str::to_owned).collect();
    names.sort_unstable();
    names
}

impl<V: Param> Source for HashMap<String, V> {
    fn field_names(&self) -> Result<Vec<String>> {
        Ok(sorted(self.keys().map(String::as_str)))
    }

    fn lookup(&self, name: &str) -> Lookup {
        self.get(name)
            .map_or(Lookup::Absent, |v| Lookup::from_value(v.to_value()))
    }
}

impl<V: Param> Source for HashMap<&str, V> {
    fn field_names(&self) -> Result<Vec<String>> {
        Ok(sorted(self.keys().copied()))
    }

    fn lookup(&self, name: &str) -> Lookup {
        self.get(name)
            .map_or(Lookup::Absent, |v| Lookup::from_value(v.to_value()))
    }
}

impl<V: Param> Source for BTreeMap<String, V> {
    fn field_names(&self) -> Result<Vec<String>> {
        Ok(self.keys().cloned().collect())
    }

    fn lookup(&self, name: &str) -> Lookup {
        self.get(name)
            .map_or(Lookup::Absent, |v| Lookup::from_value(v.to_value()))
    }
}

/// No fields at all.
impl Source for () {
    fn field_names(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn lookup(&self, _name: &str) -> Lookup {
        Lookup::Absent
    }
}

impl<S: Source> Source for Option<S> {
    fn field_names(&self) -> Result<Vec<String>> {
        match self {
            Some(source) => source.field_names(),
            None => Ok(Vec::new()),
        }
    }

    fn lookup(&self, name: &str) -> Lookup {
        self.as_ref()
            .map_or(Lookup::Absent, |source| source.lookup(name))
    }
}

#[cfg(feature = "json")]
mod json {
    use serde_json::Value as Json;

    use super::{sorted, Lookup, Source};
    use crate::error::{Error, Result};
    use crate::value::Value;

    fn kind(v: &Json) -> &'static str {
        match v {
            Json::Null => "null",
            Json::Bool(_) => "bool",
            Json::Number(_) => "number",
            Json::String(_) => "string",
            Json::Array(_) => "array",
            Json::Object(_) => "object",
        }
    }

    fn to_value(v: &Json) -> Value {
        match v {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .or_else(|| n.as_u64().map(Value::UInt))
                .or_else(|| n.as_f64().map(Value::Float))
                .unwrap_or(Value::Null),
            Json::String(s) => Value::Text(s.clone()),
            Json::Array(items) => Value::List(items.iter().map(to_value).collect()),
            // nested documents go to JSON columns as text
            Json::Object(_) => Value::Text(v.to_string()),
        }
    }

    /// JSON objects are mappings; `null` has no fields; anything else is rejected.
    impl Source for Json {
        fn field_names(&self) -> Result<Vec<String>> {
            match self {
                Json::Object(map) => Ok(sorted(map.keys().map(String::as_str))),
                Json::Null => Ok(Vec::new()),
                other => Err(Error::UnsupportedSource(format!(
                    "JSON {} is not an object",
                    kind(other)
                ))),
            }
        }

        fn lookup(&self, name: &str) -> Lookup {
            match self {
                Json::Object(map) => map
                    .get(name)
                    .map_or(Lookup::Absent, |v| Lookup::from_value(to_value(v))),
                _ => Lookup::Absent,
            }
        }
    }
}

/// Looks `name` up in `primary`, then in each fallback in order.
///
/// The first non-null value wins. When no source has a value but at least one
/// of them knows the name with a null value, the result is [`Lookup::Null`] so
/// that the caller binds an explicit NULL.
pub fn resolve(name: &str, primary: &dyn Source, fallbacks: &[&dyn Source]) -> Lookup {
    let mut seen_null = false;
    for source in std::iter::once(primary).chain(fallbacks.iter().copied()) {
        match source.lookup(name) {
            found @ Lookup::Present(_) => return found,
            Lookup::Null => seen_null = true,
            Lookup::Absent => {}
        }
    }
    if seen_null {
        Lookup::Null
    } else {
        Lookup::Absent
    }
}
