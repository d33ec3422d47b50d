//! Sanitizer chains: transforms written back into the request.

use crate::collector::ErrorCollector;
use crate::context::{Location, Sections};
use crate::error::ValidatorError;
use crate::path::FieldPath;
use crate::registry::PredicateRegistry;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug)]
struct Target {
    location: Location,
    value: Option<Value>,
}

/// Sanitizer calls bound to one field in one or more sections.
///
/// Each call transforms the current value in every target section where it
/// is present and not `null`, and writes the result back. Falsy values such
/// as `0`, `false` and `""` are transformed like any other.
#[derive(Debug)]
pub struct SanitizerChain {
    path: FieldPath,
    targets: Vec<Target>,
    result: Option<Value>,
    poisoned: bool,
    registry: Arc<PredicateRegistry>,
    collector: ErrorCollector,
    sections: Sections,
}

impl SanitizerChain {
    pub(crate) fn new(
        path: FieldPath,
        locations: &[Location],
        registry: Arc<PredicateRegistry>,
        collector: ErrorCollector,
        sections: Sections,
    ) -> Self {
        let targets = locations
            .iter()
            .map(|&location| Target {
                location,
                value: sections.section(location).get(&path),
            })
            .collect();
        trace_debug!(param = %path, locations = ?locations, "sanitizer chain created");
        Self {
            path,
            targets,
            result: None,
            poisoned: false,
            registry,
            collector,
            sections,
        }
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Result of the last transform; `None` when nothing was transformed.
    pub fn value(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn into_value(self) -> Option<Value> {
        self.result
    }

    /// Current value in `location`, as last read or written by this chain.
    pub fn value_in(&self, location: Location) -> Option<&Value> {
        self.targets
            .iter()
            .find(|t| t.location == location)
            .and_then(|t| t.value.as_ref())
    }

    /// Call the sanitizer registered under `name` with positional `args`.
    pub fn apply(mut self, name: &str, args: &[Value]) -> Self {
        if self.poisoned {
            return self;
        }
        let Some(sanitizer) = self.registry.sanitizer(name).cloned() else {
            trace_warn!(sanitizer = name, param = %self.path, "unknown sanitizer");
            self.collector.record_fault(ValidatorError::UnknownSanitizer {
                name: name.to_string(),
                field: self.path.to_string(),
            });
            self.poisoned = true;
            return self;
        };

        for target in &mut self.targets {
            let Some(current) = target.value.as_ref().filter(|v| !v.is_null()) else {
                continue;
            };
            let result = sanitizer(current, args);
            trace_trace!(sanitizer = name, param = %self.path, location = %target.location, "sanitized");
            self.sections
                .section(target.location)
                .set(&self.path, result.clone());
            target.value = Some(result.clone());
            self.result = Some(result);
        }
        self
    }

    pub fn trim(self) -> Self {
        self.apply("trim", &[])
    }

    /// Trim the given characters instead of whitespace.
    pub fn trim_chars(self, chars: &str) -> Self {
        self.apply("trim", &[json!(chars)])
    }

    pub fn ltrim(self) -> Self {
        self.apply("ltrim", &[])
    }

    pub fn rtrim(self) -> Self {
        self.apply("rtrim", &[])
    }

    pub fn to_int(self) -> Self {
        self.apply("to_int", &[])
    }

    pub fn to_int_radix(self, radix: u32) -> Self {
        self.apply("to_int", &[json!(radix)])
    }

    pub fn to_float(self) -> Self {
        self.apply("to_float", &[])
    }

    pub fn to_boolean(self) -> Self {
        self.apply("to_boolean", &[])
    }

    /// Only `"1"` and `"true"` become `true`.
    pub fn to_boolean_strict(self) -> Self {
        self.apply("to_boolean", &[json!(true)])
    }

    pub fn escape(self) -> Self {
        self.apply("escape", &[])
    }

    pub fn strip_low(self) -> Self {
        self.apply("strip_low", &[])
    }

    /// Keep only characters in `chars`.
    pub fn whitelist(self, chars: &str) -> Self {
        self.apply("whitelist", &[json!(chars)])
    }

    /// Remove every character in `chars`.
    pub fn blacklist(self, chars: &str) -> Self {
        self.apply("blacklist", &[json!(chars)])
    }

    pub fn normalize_email(self) -> Self {
        self.apply("normalize_email", &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestContext;

    fn chain(ctx: &RequestContext, field: &str, locations: &[Location]) -> (SanitizerChain, ErrorCollector) {
        let collector = ErrorCollector::new();
        let chain = SanitizerChain::new(
            FieldPath::from(field),
            locations,
            Arc::new(PredicateRegistry::builtin()),
            collector.clone(),
            ctx.sections().clone(),
        );
        (chain, collector)
    }

    #[test]
    fn targets_are_sanitized_independently() {
        let ctx = RequestContext::new()
            .with_query(json!({"testparam": "  q  "}))
            .with_body(json!({"testparam": " b "}));
        let (sanitizer, _) = chain(&ctx, "testparam", &Location::INPUTS);
        let sanitizer = sanitizer.trim();

        assert_eq!(ctx.query().snapshot(), json!({"testparam": "q"}));
        assert_eq!(ctx.body().snapshot(), json!({"testparam": "b"}));
        assert_eq!(ctx.params().snapshot(), json!({}));
        assert_eq!(sanitizer.value(), Some(&json!("q")));
        assert_eq!(sanitizer.value_in(Location::Body), Some(&json!("b")));
    }

    #[test]
    fn falsy_values_are_sanitized_but_null_is_not() {
        let ctx = RequestContext::new().with_body(json!({
            "zero": 0,
            "empty": "",
            "no": false,
            "nothing": null
        }));
        let to_string = |field: &str| {
            chain(&ctx, field, &[Location::Body])
                .0
                .apply("to_string", &[])
                .into_value()
        };

        assert_eq!(to_string("zero"), Some(json!("0")));
        assert_eq!(to_string("no"), Some(json!("false")));
        assert_eq!(to_string("nothing"), None);

        let (empty, _) = chain(&ctx, "empty", &[Location::Body]);
        assert_eq!(empty.to_boolean().into_value(), Some(json!(false)));
        assert_eq!(ctx.body().snapshot()["nothing"], Value::Null);
    }

    #[test]
    fn nested_paths_are_written_in_place() {
        let ctx = RequestContext::new().with_body(json!({"user": {"email": " A@B.COM "}}));
        let (sanitizer, _) = chain(&ctx, "user.email", &[Location::Body]);
        sanitizer.trim().normalize_email();
        assert_eq!(
            ctx.body().get(&FieldPath::from("user.email")),
            Some(json!("a@b.com"))
        );
    }

    #[tokio::test]
    async fn unknown_sanitizer_is_a_fault() {
        let ctx = RequestContext::new().with_body(json!({"n": " x "}));
        let (sanitizer, collector) = chain(&ctx, "n", &[Location::Body]);
        let sanitizer = sanitizer.apply("to_bogus", &[]).trim();

        assert_eq!(sanitizer.value(), None);
        assert!(matches!(
            collector.resolve().await,
            Err(ValidatorError::UnknownSanitizer { .. })
        ));
    }
}
