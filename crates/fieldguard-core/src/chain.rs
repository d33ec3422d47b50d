//! Validation chains: fluent per-field validator calls.

use crate::collector::{ErrorCollector, ErrorId, ErrorRecord};
use crate::context::{Location, Sections};
use crate::error::ValidatorError;
use crate::path::FieldPath;
use crate::registry::{Input, PredicateRegistry, Verdict};
use fieldguard_predicates::{is_truthy, to_text};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Message used when neither the call nor the chain supplies one.
pub const DEFAULT_MESSAGE: &str = "Invalid value";

/// Per-request state every chain shares.
#[derive(Debug, Clone)]
pub(crate) struct ChainEnv {
    pub(crate) registry: Arc<PredicateRegistry>,
    pub(crate) collector: ErrorCollector,
    pub(crate) sections: Sections,
    pub(crate) fail_fast: bool,
}

/// Options for [`ValidationChain::optional_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionalOptions {
    /// Also skip on falsy values (`""`, `0`, `false`, `null`)
    #[serde(default)]
    pub check_falsy: bool,
}

#[derive(Debug, Clone, Copy)]
enum LastError {
    Sync { id: ErrorId, index: usize },
    Async { id: ErrorId },
}

/// Validator calls bound to one field.
///
/// The field value is read once when the chain is created. Every call
/// returns the chain, so calls compose left to right:
///
/// ```rust,ignore
/// validation
///     .check_params("testparam")
///     .fail_message("Default error message")
///     .not_empty()
///     .is_int()
///     .with_message("testparam must be an integer");
/// ```
#[derive(Debug)]
pub struct ValidationChain {
    path: FieldPath,
    param: String,
    location: Option<Location>,
    value: Option<Value>,
    text: String,
    fail_message: Option<String>,
    errors: Vec<ErrorRecord>,
    last_error: Option<LastError>,
    skip_validating: bool,
    env: ChainEnv,
}

impl ValidationChain {
    pub(crate) fn new(path: FieldPath, location: Option<Location>, env: ChainEnv) -> Self {
        let value = location.and_then(|location| env.sections.section(location).get(&path));
        let param = path.to_string();
        trace_debug!(param = %param, location = ?location, "validation chain created");
        Self {
            text: to_text(value.as_ref()),
            param,
            path,
            location,
            value,
            fail_message: None,
            errors: Vec::new(),
            last_error: None,
            skip_validating: false,
            env,
        }
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Display form of the path, as reported in errors.
    pub fn param(&self) -> &str {
        &self.param
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }

    /// The value under test; `None` when the field is absent.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Failures recorded by this chain so far, synchronous ones only.
    pub fn errors(&self) -> &[ErrorRecord] {
        &self.errors
    }

    pub fn is_skipping(&self) -> bool {
        self.skip_validating
    }

    /// Default message for every later failure of this chain.
    pub fn fail_message(mut self, msg: impl Into<String>) -> Self {
        self.fail_message = Some(msg.into());
        self
    }

    fn message(&self) -> String {
        self.fail_message
            .clone()
            .unwrap_or_else(|| DEFAULT_MESSAGE.to_string())
    }

    /// Call the validator registered under `name` with positional `args`.
    pub fn apply(mut self, name: &str, args: &[Value]) -> Self {
        if self.skip_validating {
            return self;
        }

        let Some(validator) = self.env.registry.validator(name).cloned() else {
            trace_warn!(validator = name, param = %self.param, "unknown validator");
            self.env.collector.record_fault(ValidatorError::UnknownValidator {
                name: name.to_string(),
                field: self.param.clone(),
            });
            self.skip_validating = true;
            self.last_error = None;
            return self;
        };

        let verdict = {
            let input = Input::new(&self.text, self.value.as_ref(), args, &self.env.sections);
            validator(&input)
        };
        trace_trace!(validator = name, param = %self.param, verdict = ?verdict, "validator called");

        match verdict {
            Verdict::Ready(true) => self.last_error = None,
            Verdict::Ready(false) => {
                let record = ErrorRecord::new(self.param.clone(), self.message(), self.value.clone());
                let id = self.env.collector.register_sync(record.clone());
                self.errors.push(record);
                self.last_error = Some(LastError::Sync {
                    id,
                    index: self.errors.len() - 1,
                });
                if self.env.fail_fast {
                    self.skip_validating = true;
                }
            }
            Verdict::Pending(future) => {
                let record = ErrorRecord::new(self.param.clone(), self.message(), self.value.clone());
                let id = self.env.collector.register(future, record);
                self.last_error = Some(LastError::Async { id });
            }
        }
        self
    }

    /// Replace the message of the most recent failure.
    ///
    /// Skipped calls leave that failure in place; a passing call clears it.
    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        match self.last_error.take() {
            Some(LastError::Sync { id, index }) => {
                self.errors[index].msg = msg.clone();
                self.env.collector.replace_message(id, &msg);
            }
            Some(LastError::Async { id }) => {
                self.env.collector.replace_message(id, &msg);
                self.last_error = Some(LastError::Async { id });
            }
            None => {}
        }
        self
    }

    /// Skip every later call when the field is absent.
    pub fn optional(self) -> Self {
        self.optional_with(OptionalOptions::default())
    }

    pub fn optional_with(mut self, options: OptionalOptions) -> Self {
        let skip = if options.check_falsy {
            !is_truthy(self.value.as_ref())
        } else {
            self.value.is_none()
        };
        if skip {
            self.skip_validating = true;
        }
        self
    }

    /// At least one character.
    pub fn not_empty(self) -> Self {
        self.apply("is_length", &[json!({ "min": 1 })])
    }

    /// Character count within `min..=max`; `max` of `None` is unbounded.
    pub fn len(self, min: usize, max: impl Into<Option<usize>>) -> Self {
        let args = match max.into() {
            Some(max) => vec![json!(min), json!(max)],
            None => vec![json!(min)],
        };
        self.apply("is_length", &args)
    }

    pub fn is_length(self, options: Value) -> Self {
        self.apply("is_length", &[options])
    }

    pub fn is_int(self) -> Self {
        self.apply("is_int", &[])
    }

    /// Integer with bounds, e.g. `json!({"min": 1, "max": 10})`.
    pub fn is_int_with(self, options: Value) -> Self {
        self.apply("is_int", &[options])
    }

    pub fn is_float(self) -> Self {
        self.apply("is_float", &[])
    }

    pub fn is_numeric(self) -> Self {
        self.apply("is_numeric", &[])
    }

    pub fn is_alpha(self) -> Self {
        self.apply("is_alpha", &[])
    }

    pub fn is_alphanumeric(self) -> Self {
        self.apply("is_alphanumeric", &[])
    }

    pub fn is_email(self) -> Self {
        self.apply("is_email", &[])
    }

    pub fn is_url(self) -> Self {
        self.apply("is_url", &[])
    }

    pub fn is_uuid(self) -> Self {
        self.apply("is_uuid", &[])
    }

    pub fn is_boolean(self) -> Self {
        self.apply("is_boolean", &[])
    }

    pub fn is_in<I, T>(self, allowed: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let allowed: Vec<Value> = allowed.into_iter().map(Into::into).collect();
        self.apply("is_in", &[Value::Array(allowed)])
    }

    pub fn contains(self, needle: &str) -> Self {
        self.apply("contains", &[json!(needle)])
    }

    pub fn equals(self, expected: &str) -> Self {
        self.apply("equals", &[json!(expected)])
    }

    /// Regex match; `modifiers` may hold `i` and `m`.
    pub fn matches(self, pattern: &str, modifiers: Option<&str>) -> Self {
        match modifiers {
            Some(modifiers) => self.apply("matches", &[json!(pattern), json!(modifiers)]),
            None => self.apply("matches", &[json!(pattern)]),
        }
    }
}
