//! Declarative validation schemas.
//!
//! A schema maps field names to the validators they must pass:
//!
//! ```json
//! {
//!   "testparam": { "in": "params", "notEmpty": true, "isInt": { "errorMessage": "Not an integer" } },
//!   "page": { "isInt": { "options": [{ "min": 1 }] } }
//! }
//! ```
//!
//! Rule names may be registry names (`is_int`) or their camelCase spelling
//! (`isInt`). Fields are validated in declaration order.

use crate::chain::{ChainEnv, OptionalOptions, ValidationChain};
use crate::context::Location;
use crate::error::Result;
use crate::locator::locate;
use crate::path::FieldPath;
use crate::registry::PredicateRegistry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;

/// Failure message of schema rules that set none.
pub const SCHEMA_DEFAULT_MESSAGE: &str = "Invalid param";

/// One rule of a field: enabled flag, or options and a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSpec {
    /// `true` runs the rule without arguments; `false` skips it
    Flag(bool),
    Detailed {
        /// Positional arguments; a non-array value is passed as the only one
        #[serde(default, skip_serializing_if = "Value::is_null")]
        options: Value,
        #[serde(
            rename = "errorMessage",
            alias = "error_message",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        error_message: Option<String>,
    },
}

impl RuleSpec {
    pub fn enabled() -> Self {
        RuleSpec::Flag(true)
    }

    pub fn with_options(options: impl Into<Value>) -> Self {
        RuleSpec::Detailed {
            options: options.into(),
            error_message: None,
        }
    }

    /// Set the failure message of this rule.
    pub fn message(self, msg: impl Into<String>) -> Self {
        let options = match self {
            RuleSpec::Flag(_) => Value::Null,
            RuleSpec::Detailed { options, .. } => options,
        };
        RuleSpec::Detailed {
            options,
            error_message: Some(msg.into()),
        }
    }

    fn is_enabled(&self) -> bool {
        !matches!(self, RuleSpec::Flag(false))
    }

    fn args(&self) -> Vec<Value> {
        match self {
            RuleSpec::Flag(_) => Vec::new(),
            RuleSpec::Detailed { options, .. } => match options {
                Value::Null => Vec::new(),
                Value::Array(items) => items.clone(),
                other => vec![other.clone()],
            },
        }
    }

    fn error_message(&self) -> Option<&str> {
        match self {
            RuleSpec::Flag(_) => None,
            RuleSpec::Detailed { error_message, .. } => error_message.as_deref(),
        }
    }
}

/// Rules of one field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Section to read from. `any` or no value locates the field; anything
    /// but `params`, `query` or `body` skips it
    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Message for every rule of this field that sets none
    #[serde(
        rename = "errorMessage",
        alias = "error_message",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub error_message: Option<String>,
    #[serde(flatten)]
    pub rules: IndexMap<String, RuleSpec>,
}

impl FieldSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn located_in(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn error_message(mut self, msg: impl Into<String>) -> Self {
        self.error_message = Some(msg.into());
        self
    }

    /// Add a rule that runs without arguments.
    pub fn rule(self, name: impl Into<String>) -> Self {
        self.rule_with(name, RuleSpec::enabled())
    }

    pub fn rule_with(mut self, name: impl Into<String>, spec: RuleSpec) -> Self {
        self.rules.insert(name.into(), spec);
        self
    }
}

/// Ordered field name to rules mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: IndexMap<String, FieldSchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, field: FieldSchema) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSchema)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Run every field's rules. `default` of `None` locates each field the
    /// way `check` does.
    pub(crate) fn validate(&self, default: Option<Location>, env: &ChainEnv) {
        for (name, field) in &self.fields {
            let path = FieldPath::from(name.as_str());
            let location = match field.location.as_deref().filter(|&l| l != "any") {
                Some(declared) => match Location::from_schema(declared) {
                    Some(location) => Some(location),
                    None => {
                        trace_debug!(field = %name, location = declared, "unsupported schema location, skipping field");
                        continue;
                    }
                },
                None => default.or_else(|| locate(&env.sections, &path)),
            };

            let mut chain = ValidationChain::new(path, location, env.clone());
            for (rule, spec) in &field.rules {
                if !spec.is_enabled() {
                    continue;
                }
                let msg = spec
                    .error_message()
                    .or(field.error_message.as_deref())
                    .unwrap_or(SCHEMA_DEFAULT_MESSAGE);
                chain = apply_rule(chain.fail_message(msg), rule, &spec.args(), &env.registry);
            }
        }
    }
}

fn apply_rule(
    chain: ValidationChain,
    rule: &str,
    args: &[Value],
    registry: &PredicateRegistry,
) -> ValidationChain {
    let name = if registry.validator(rule).is_some() {
        Cow::Borrowed(rule)
    } else {
        snake_case(rule)
    };
    match name.as_ref() {
        "not_empty" => chain.not_empty(),
        "len" => chain.apply("is_length", args),
        "optional" => {
            let options = args
                .first()
                .and_then(|v| OptionalOptions::deserialize(v).ok())
                .unwrap_or_default();
            chain.optional_with(options)
        }
        other => chain.apply(other, args),
    }
}

/// `isUUID` to `is_uuid`, `notEmpty` to `not_empty`.
fn snake_case(name: &str) -> Cow<'_, str> {
    if !name.chars().any(|c| c.is_ascii_uppercase()) {
        return Cow::Borrowed(name);
    }
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::ErrorCollector;
    use crate::context::RequestContext;
    use serde_json::json;
    use std::sync::Arc;

    fn run(schema: &Schema, ctx: &RequestContext, default: Option<Location>) -> ErrorCollector {
        let env = ChainEnv {
            registry: Arc::new(PredicateRegistry::builtin()),
            collector: ErrorCollector::new(),
            sections: ctx.sections().clone(),
            fail_fast: false,
        };
        schema.validate(default, &env);
        env.collector
    }

    #[test]
    fn deserializes_in_declaration_order() {
        let schema = Schema::from_value(json!({
            "zeta": {"in": "query", "notEmpty": true},
            "alpha": {
                "errorMessage": "bad alpha",
                "isInt": {"options": [{"min": 2}], "errorMessage": "too small"},
                "isAlpha": false
            }
        }))
        .unwrap();

        let names: Vec<_> = schema.fields().map(|(name, _)| name).collect();
        assert_eq!(names, ["zeta", "alpha"]);

        let (_, alpha) = schema.fields().nth(1).unwrap();
        assert_eq!(alpha.error_message.as_deref(), Some("bad alpha"));
        assert_eq!(
            alpha.rules["isInt"],
            RuleSpec::with_options(json!([{"min": 2}])).message("too small")
        );
        assert_eq!(alpha.rules["isAlpha"], RuleSpec::Flag(false));
    }

    #[test]
    fn rule_names_accept_camel_case() {
        assert_eq!(snake_case("isInt"), "is_int");
        assert_eq!(snake_case("isUUID"), "is_uuid");
        assert_eq!(snake_case("notEmpty"), "not_empty");
        assert_eq!(snake_case("is_email"), "is_email");
    }

    #[tokio::test]
    async fn messages_fall_back_rule_field_default() {
        let schema = Schema::new()
            .field(
                "a",
                FieldSchema::new()
                    .error_message("field message")
                    .rule("is_int")
                    .rule_with("is_alpha", RuleSpec::enabled().message("rule message")),
            )
            .field("b", FieldSchema::new().rule("is_int"));
        let ctx = RequestContext::new().with_body(json!({"a": "1x", "b": "x"}));

        let errors = run(&schema, &ctx, Some(Location::Body)).resolve().await.unwrap();
        let msgs: Vec<_> = errors.iter().map(|e| e.msg.as_str()).collect();
        assert_eq!(msgs, ["field message", "rule message", SCHEMA_DEFAULT_MESSAGE]);
    }

    #[tokio::test]
    async fn unsupported_location_skips_the_field() {
        let schema = Schema::from_value(json!({
            "skipped": {
                "in": "notSupportedOne",
                "notEmpty": true,
                "isInt": {"options": [{"min": 2, "max": 10}]}
            }
        }))
        .unwrap();
        let ctx = RequestContext::new().with_query(json!({"skipped": "abc"}));

        assert!(run(&schema, &ctx, None).resolve().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn declared_location_applies_to_its_field_only() {
        let schema = Schema::from_value(json!({
            "testparam": {"in": "params", "isInt": true},
            "testquery": {"isInt": true}
        }))
        .unwrap();
        let ctx = RequestContext::new()
            .with_params(json!({"testparam": "x"}))
            .with_query(json!({"testquery": "5"}))
            .with_body(json!({"testparam": "1", "testquery": "y"}));

        let errors = run(&schema, &ctx, Some(Location::Query)).resolve().await.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].param, "testparam");
    }

    #[tokio::test]
    async fn any_location_resolves_per_field() {
        let schema = Schema::from_value(json!({
            "fromQuery": {"isInt": true},
            "fromBody": {"in": "any", "isInt": true},
            "optionalMissing": {"optional": true, "isInt": true}
        }))
        .unwrap();
        let ctx = RequestContext::new()
            .with_query(json!({"fromQuery": "1"}))
            .with_body(json!({"fromBody": "nope"}));

        let errors = run(&schema, &ctx, None).resolve().await.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].param, "fromBody");
        assert_eq!(errors[0].value, Some(json!("nope")));
    }

    #[test]
    fn malformed_schema_is_an_error() {
        assert!(Schema::from_json(r#"{"a": {"isInt": 3}}"#).is_err());
    }
}
