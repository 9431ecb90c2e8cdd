//! Addressing values inside a configuration record.

use std::fmt;

use keel_core::value::to_display_string;
use keel_core::{ConfigMap, ConfigValue};

/// One step of a [`ValuePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object key.
    Key(String),
    /// Array index.
    Index(usize),
}

impl PathSegment {
    /// Converts an evaluated property value into a segment.
    ///
    /// Non-negative integers become indexes; everything else is used as a key.
    #[must_use]
    pub fn from_value(value: &ConfigValue) -> Self {
        match value {
            ConfigValue::Number(n) => n
                .as_u64()
                .and_then(|i| usize::try_from(i).ok())
                .map_or_else(|| Self::Key(n.to_string()), Self::Index),
            other => Self::Key(to_display_string(other)),
        }
    }
}

/// A location inside a record, e.g. `server.hosts[0]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ValuePath(Vec<PathSegment>);

impl ValuePath {
    /// A path naming a single top-level key.
    pub fn key(key: impl Into<String>) -> Self {
        Self(vec![PathSegment::Key(key.into())])
    }

    /// Parses a dotted path; numeric segments become indexes.
    #[must_use]
    pub fn parse_dotted(path: &str) -> Self {
        Self(
            path.split('.')
                .map(|s| {
                    s.parse::<usize>()
                        .map_or_else(|_| PathSegment::Key(s.to_string()), PathSegment::Index)
                })
                .collect(),
        )
    }

    /// Appends a segment.
    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    /// Returns this path extended by `segment`.
    #[must_use]
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    /// Returns the first `len` segments.
    #[must_use]
    pub fn prefix(&self, len: usize) -> Self {
        Self(self.0[..len.min(self.0.len())].to_vec())
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the path has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The final segment.
    #[must_use]
    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// The top-level key, if the path starts with one.
    #[must_use]
    pub fn root_key(&self) -> Option<&str> {
        match self.0.first() {
            Some(PathSegment::Key(key)) => Some(key),
            _ => None,
        }
    }

    /// Returns the value stored at this path.
    #[must_use]
    pub fn get<'v>(&self, root: &'v ConfigMap) -> Option<&'v ConfigValue> {
        let (first, rest) = self.0.split_first()?;
        let mut current = match first {
            PathSegment::Key(key) => root.get(key)?,
            PathSegment::Index(i) => root.get(&i.to_string())?,
        };
        for segment in rest {
            current = step(current, segment)?;
        }
        Some(current)
    }

    /// Replaces the value stored at this path. Returns false if the parent
    /// does not exist.
    pub fn set(&self, root: &mut ConfigMap, value: ConfigValue) -> bool {
        let Some((last, parents)) = self.0.split_last() else {
            return false;
        };
        let Some((first, middle)) = parents.split_first() else {
            root.insert(segment_key(last), value);
            return true;
        };
        let Some(mut current) = root.get_mut(&segment_key(first)) else {
            return false;
        };
        for segment in middle {
            let Some(next) = step_mut(current, segment) else {
                return false;
            };
            current = next;
        }
        match (current, last) {
            (ConfigValue::Object(map), segment) => {
                map.insert(segment_key(segment), value);
                true
            }
            (ConfigValue::Array(items), PathSegment::Index(i)) if *i < items.len() => {
                items[*i] = value;
                true
            }
            _ => false,
        }
    }
}

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if position == 0 => f.write_str(key)?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(i) => write!(f, "[{i}]")?,
            }
        }
        Ok(())
    }
}

fn segment_key(segment: &PathSegment) -> String {
    match segment {
        PathSegment::Key(key) => key.clone(),
        PathSegment::Index(i) => i.to_string(),
    }
}

/// Steps one segment into `value`.
pub(crate) fn step<'v>(value: &'v ConfigValue, segment: &PathSegment) -> Option<&'v ConfigValue> {
    match (value, segment) {
        (ConfigValue::Object(map), segment) => map.get(&segment_key(segment)),
        (ConfigValue::Array(items), PathSegment::Index(i)) => items.get(*i),
        (ConfigValue::Array(items), PathSegment::Key(key)) => items.get(key.parse::<usize>().ok()?),
        _ => None,
    }
}

fn step_mut<'v>(value: &'v mut ConfigValue, segment: &PathSegment) -> Option<&'v mut ConfigValue> {
    match (value, segment) {
        (ConfigValue::Object(map), segment) => map.get_mut(&segment_key(segment)),
        (ConfigValue::Array(items), PathSegment::Index(i)) => items.get_mut(*i),
        (ConfigValue::Array(items), PathSegment::Key(key)) => {
            items.get_mut(key.parse::<usize>().ok()?)
        }
        _ => None,
    }
}

/// Reads a property of a computed value, including the derived `length` of
/// strings and arrays.
pub(crate) fn member(value: &ConfigValue, segment: &PathSegment) -> Option<ConfigValue> {
    if let Some(found) = step(value, segment) {
        return Some(found.clone());
    }
    match (value, segment) {
        (ConfigValue::Array(items), PathSegment::Key(key)) if key == "length" => {
            Some(ConfigValue::from(items.len()))
        }
        (ConfigValue::String(text), PathSegment::Key(key)) if key == "length" => {
            Some(ConfigValue::from(text.chars().count()))
        }
        (ConfigValue::String(text), PathSegment::Index(i)) => {
            text.chars().nth(*i).map(|c| ConfigValue::String(c.to_string()))
        }
        _ => None,
    }
}
