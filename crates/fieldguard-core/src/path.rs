//! Field paths: addressing nested values inside a request section.
//!
//! A path is an ordered list of string segments. Segments that look like
//! non-negative integers index into arrays; everything else is an object key.

use fieldguard_predicates::checks;
use serde_json::{Map, Value};
use std::fmt;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment(String);

impl Segment {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Segment {
    fn from(s: &str) -> Self {
        Segment(s.to_string())
    }
}

impl From<String> for Segment {
    fn from(s: String) -> Self {
        Segment(s)
    }
}

impl From<usize> for Segment {
    fn from(i: usize) -> Self {
        Segment(i.to_string())
    }
}

/// Location of a field within a request section.
///
/// Built from:
/// - a single key: `"email"`
/// - a dot/bracket string: `"user.fields.email"`, `"admins[0].name"`
/// - an index: `0` (e.g. a regex route capture)
/// - a list of segments: `["admins", "0", "name"]`
///
/// ```rust
/// use fieldguard_core::FieldPath;
///
/// let dotted = FieldPath::from("users.0.fields.email");
/// let listed = FieldPath::from(["users", "0", "fields", "email"]);
/// assert_eq!(dotted, listed);
/// assert_eq!(listed.to_string(), "users[0].fields.email");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Parse a dot/bracket path string.
    pub fn parse(path: &str) -> Self {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut after_bracket = false;
        let mut chars = path.chars();

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if !after_bracket {
                        segments.push(std::mem::take(&mut current));
                    }
                    after_bracket = false;
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                    let inner: String = chars.by_ref().take_while(|&c| c != ']').collect();
                    segments.push(inner.trim_matches(|c| c == '"' || c == '\'').to_string());
                    after_bracket = true;
                }
                _ => {
                    after_bracket = false;
                    current.push(c);
                }
            }
        }
        if !after_bracket || !current.is_empty() {
            segments.push(current);
        }

        Self { segments }
    }

    /// Build a path from explicit segments; no splitting is applied.
    pub fn from_segments<I, T>(segments: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Segment>,
    {
        Self {
            segments: segments.into_iter().map(|s| s.into().0).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Replace a single-segment path equal to `from` with `to`.
    pub(crate) fn aliased(self, from: &str, to: &str) -> Self {
        if self.segments.len() == 1 && self.segments[0] == from {
            Self {
                segments: vec![to.to_string()],
            }
        } else {
            self
        }
    }

    /// Borrow the value at this path, if every step exists.
    pub fn lookup<'v>(&self, root: &'v Value) -> Option<&'v Value> {
        self.segments
            .iter()
            .try_fold(root, |current, segment| match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            })
    }

    /// Whether the path exists, even when the value there is `null`.
    pub fn exists(&self, root: &Value) -> bool {
        self.lookup(root).is_some()
    }

    /// Write `value` at this path, creating intermediate containers.
    ///
    /// Missing containers become arrays when the key that indexes them is an
    /// array index, objects otherwise.
    pub fn assign(&self, root: &mut Value, value: Value) {
        assign_at(root, &self.segments, value);
    }
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty()
        && segment.bytes().all(|b| b.is_ascii_digit())
        && (segment == "0" || !segment.starts_with('0'))
}

fn assign_at(target: &mut Value, segments: &[String], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *target = value;
        return;
    };

    if !target.is_object() && !target.is_array() {
        *target = if is_index(head) {
            Value::Array(Vec::new())
        } else {
            Value::Object(Map::new())
        };
    }

    match target {
        Value::Array(items) => {
            let Ok(index) = head.parse::<usize>() else {
                return;
            };
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            assign_at(&mut items[index], rest, value);
        }
        Value::Object(map) => {
            let slot = map.entry(head.clone()).or_insert(Value::Null);
            assign_at(slot, rest, value);
        }
        _ => {}
    }
}

/// Render a path for error output.
///
/// The first segment is printed as-is; later integer-looking segments use
/// bracket notation and the rest use dot notation: `users[0].fields.email`.
pub fn format_param_output(path: &FieldPath) -> String {
    let mut output = String::new();
    for (i, segment) in path.segments.iter().enumerate() {
        if i == 0 {
            output.push_str(segment);
        } else if checks::is_int(segment, &[]) {
            output.push('[');
            output.push_str(segment);
            output.push(']');
        } else {
            if !output.is_empty() {
                output.push('.');
            }
            output.push_str(segment);
        }
    }
    output
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_param_output(self))
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<String> for FieldPath {
    fn from(path: String) -> Self {
        Self::parse(&path)
    }
}

impl From<&String> for FieldPath {
    fn from(path: &String) -> Self {
        Self::parse(path)
    }
}

impl From<usize> for FieldPath {
    fn from(index: usize) -> Self {
        Self::from_segments([index])
    }
}

impl<T: Into<Segment>> From<Vec<T>> for FieldPath {
    fn from(segments: Vec<T>) -> Self {
        Self::from_segments(segments)
    }
}

impl<T: Into<Segment>, const N: usize> From<[T; N]> for FieldPath {
    fn from(segments: [T; N]) -> Self {
        Self::from_segments(segments)
    }
}
