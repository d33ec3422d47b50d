//! Request context types
//!
//! The host framework owns the request; fieldguard only needs its five
//! input sections as JSON documents it can read and, for sanitizers, write.
//! Each section is a shared handle so chains can hold exactly the sections
//! they touch.

use crate::error::{Result, ValidatorError};
use crate::path::FieldPath;
use crate::validation::Validation;
use http::request::Parts;
use http::Extensions;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A request section a field can be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    /// Path parameters captured by the router
    Params,
    /// Decoded query string
    Query,
    /// Parsed request body
    Body,
    /// Request headers, keyed by lower-case name
    Headers,
    /// Uploaded files
    Files,
}

impl Location {
    /// Locations `sanitize` writes to, in write order.
    pub const INPUTS: [Location; 3] = [Location::Body, Location::Params, Location::Query];

    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Params => "params",
            Location::Query => "query",
            Location::Body => "body",
            Location::Headers => "headers",
            Location::Files => "files",
        }
    }

    /// Parse the `in` key of a schema entry; only input sections qualify.
    pub(crate) fn from_schema(name: &str) -> Option<Self> {
        match name {
            "params" => Some(Location::Params),
            "query" => Some(Location::Query),
            "body" => Some(Location::Body),
            _ => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared handle to one section's JSON document.
#[derive(Clone)]
pub struct Section(Arc<RwLock<Value>>);

impl Section {
    pub fn new(value: Value) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    fn read(&self) -> RwLockReadGuard<'_, Value> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Value> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clone of the value at `path`; `None` when the path does not exist.
    pub fn get(&self, path: &FieldPath) -> Option<Value> {
        path.lookup(&self.read()).cloned()
    }

    pub fn exists(&self, path: &FieldPath) -> bool {
        path.exists(&self.read())
    }

    /// Write `value` at `path`, creating intermediate containers.
    pub fn set(&self, path: &FieldPath, value: Value) {
        path.assign(&mut self.write(), value);
    }

    /// Clone of the whole section.
    pub fn snapshot(&self) -> Value {
        self.read().clone()
    }
}

impl Default for Section {
    fn default() -> Self {
        Self::new(Value::Object(Map::new()))
    }
}

impl fmt::Debug for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.read(), f)
    }
}

/// The five sections of a request.
#[derive(Debug, Clone, Default)]
pub struct Sections {
    params: Section,
    query: Section,
    body: Section,
    headers: Section,
    files: Section,
}

impl Sections {
    pub fn section(&self, location: Location) -> &Section {
        match location {
            Location::Params => &self.params,
            Location::Query => &self.query,
            Location::Body => &self.body,
            Location::Headers => &self.headers,
            Location::Files => &self.files,
        }
    }

    pub fn params(&self) -> &Section {
        &self.params
    }

    pub fn query(&self) -> &Section {
        &self.query
    }

    pub fn body(&self) -> &Section {
        &self.body
    }

    pub fn headers(&self) -> &Section {
        &self.headers
    }

    pub fn files(&self) -> &Section {
        &self.files
    }
}

/// An in-flight request as seen by the validation middleware.
///
/// ```rust
/// use fieldguard_core::{FieldPath, RequestContext};
/// use serde_json::json;
///
/// let ctx = RequestContext::new()
///     .with_params(json!({"id": "42"}))
///     .with_body(json!({"user": {"email": "a@b.c"}}));
///
/// assert_eq!(
///     ctx.body().get(&FieldPath::from("user.email")),
///     Some(json!("a@b.c"))
/// );
/// ```
#[derive(Debug, Default)]
pub struct RequestContext {
    sections: Sections,
    extensions: Extensions,
}

impl RequestContext {
    /// Create a context with five empty sections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from HTTP request parts.
    ///
    /// The query string is decoded with repeated keys folded into arrays;
    /// headers that are not valid UTF-8 are skipped and repeated headers are
    /// joined with `", "`.
    pub fn from_parts<I>(parts: &Parts, path_params: I, body: Value) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let params: Map<String, Value> = path_params
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();

        let mut headers = Map::new();
        for (name, value) in parts.headers.iter() {
            let Ok(value) = value.to_str() else {
                continue;
            };
            match headers.get_mut(name.as_str()) {
                Some(Value::String(existing)) => {
                    existing.push_str(", ");
                    existing.push_str(value);
                }
                _ => {
                    headers.insert(name.as_str().to_string(), Value::String(value.to_string()));
                }
            }
        }

        Self::new()
            .with_params(Value::Object(params))
            .with_query(parse_query(parts.uri.query().unwrap_or_default()))
            .with_body(body)
            .with_headers(Value::Object(headers))
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.sections.params = Section::new(params);
        self
    }

    pub fn with_query(mut self, query: Value) -> Self {
        self.sections.query = Section::new(query);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.sections.body = Section::new(body);
        self
    }

    pub fn with_headers(mut self, headers: Value) -> Self {
        self.sections.headers = Section::new(headers);
        self
    }

    pub fn with_files(mut self, files: Value) -> Self {
        self.sections.files = Section::new(files);
        self
    }

    pub fn sections(&self) -> &Sections {
        &self.sections
    }

    pub fn params(&self) -> &Section {
        &self.sections.params
    }

    pub fn query(&self) -> &Section {
        &self.sections.query
    }

    pub fn body(&self) -> &Section {
        &self.sections.body
    }

    pub fn headers(&self) -> &Section {
        &self.sections.headers
    }

    pub fn files(&self) -> &Section {
        &self.sections.files
    }

    /// Get request extensions
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Get mutable extensions
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// The validation API installed by [`ValidatorLayer`](crate::ValidatorLayer).
    pub fn validation(&self) -> Result<&Validation> {
        self.extensions
            .get::<Validation>()
            .ok_or(ValidatorError::NotInstalled)
    }
}

fn parse_query(query: &str) -> Value {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap_or_default();
    let mut map = Map::new();
    for (key, value) in pairs {
        match map.get_mut(&key) {
            Some(Value::Array(items)) => items.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                map.insert(key, Value::String(value));
            }
        }
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parts(uri: &str) -> Parts {
        let (parts, _) = http::Request::builder()
            .uri(uri)
            .header("Referer", "https://example.com")
            .header("x-tag", "a")
            .header("x-tag", "b")
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn from_parts_fills_every_section() {
        let ctx = RequestContext::from_parts(
            &parts("/users/7?page=2&tag=a&tag=b"),
            [("id".to_string(), "7".to_string())],
            json!({"name": "ada"}),
        );

        assert_eq!(ctx.params().snapshot(), json!({"id": "7"}));
        assert_eq!(
            ctx.query().snapshot(),
            json!({"page": "2", "tag": ["a", "b"]})
        );
        assert_eq!(ctx.body().snapshot(), json!({"name": "ada"}));
        assert_eq!(
            ctx.headers().get(&FieldPath::from("referer")),
            Some(json!("https://example.com"))
        );
        assert_eq!(ctx.headers().get(&FieldPath::from("x-tag")), Some(json!("a, b")));
    }

    #[test]
    fn sections_share_writes_across_clones() {
        let ctx = RequestContext::new().with_body(json!({"a": 1}));
        let handle = ctx.body().clone();
        handle.set(&FieldPath::from("a"), json!(2));
        assert_eq!(ctx.body().get(&FieldPath::from("a")), Some(json!(2)));
    }

    #[test]
    fn validation_requires_installation() {
        let ctx = RequestContext::new();
        assert_eq!(ctx.validation().unwrap_err(), ValidatorError::NotInstalled);
    }

    #[test]
    fn schema_locations_are_inputs_only() {
        assert_eq!(Location::from_schema("query"), Some(Location::Query));
        assert_eq!(Location::from_schema("headers"), None);
        assert_eq!(Location::from_schema("notSupportedOne"), None);
    }
}
