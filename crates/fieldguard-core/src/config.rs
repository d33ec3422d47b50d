//! Middleware configuration.

use crate::collector::{default_formatter, ErrorFormatter};
use crate::error::BoxError;
use crate::registry::{
    async_validator_fn, AsyncValidator, Input, PredicateRegistry, SanitizerFn, ValidatorFn,
    Verdict,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Plain flags, loadable from configuration files.
///
/// ```rust
/// use fieldguard_core::ValidatorOptions;
///
/// let options: ValidatorOptions =
///     serde_json::from_str(r#"{"skipValidationOnFirstError": true}"#).unwrap();
/// assert!(options.skip_validation_on_first_error);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidatorOptions {
    /// Stop a chain after its first synchronous failure
    #[serde(alias = "skip_validation_on_first_error")]
    pub skip_validation_on_first_error: bool,
}

/// Configuration of a [`ValidatorLayer`](crate::ValidatorLayer).
#[derive(Clone)]
pub struct ValidatorConfig {
    validators: Vec<(String, ValidatorFn)>,
    sanitizers: Vec<(String, SanitizerFn)>,
    formatter: ErrorFormatter,
    options: ValidatorOptions,
}

impl ValidatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ValidatorConfigBuilder {
        ValidatorConfigBuilder::new()
    }

    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    pub fn formatter(&self) -> &ErrorFormatter {
        &self.formatter
    }

    /// Built-ins overlaid with the custom entries of this configuration.
    pub fn registry(&self) -> PredicateRegistry {
        let mut registry = PredicateRegistry::builtin();
        for (name, validator) in &self.validators {
            registry.insert_validator(name.clone(), Arc::clone(validator));
        }
        for (name, sanitizer) in &self.sanitizers {
            registry.insert_sanitizer(name.clone(), Arc::clone(sanitizer));
        }
        registry
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        ValidatorConfigBuilder::new().build()
    }
}

impl From<ValidatorOptions> for ValidatorConfig {
    fn from(options: ValidatorOptions) -> Self {
        ValidatorConfigBuilder::new().options(options).build()
    }
}

impl fmt::Debug for ValidatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorConfig")
            .field(
                "custom_validators",
                &self.validators.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .field(
                "custom_sanitizers",
                &self.sanitizers.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .field("options", &self.options)
            .finish()
    }
}

/// Builder for [`ValidatorConfig`].
///
/// ```rust
/// use fieldguard_core::ValidatorConfig;
/// use serde_json::json;
///
/// let config = ValidatorConfig::builder()
///     .custom_validator("is_array", |input| matches!(input.raw(), Some(v) if v.is_array()))
///     .custom_sanitizer("to_test_sanitize", |_, _| json!("!!!!"))
///     .skip_validation_on_first_error(true)
///     .build();
///
/// assert!(config.registry().validator("is_array").is_some());
/// ```
pub struct ValidatorConfigBuilder {
    validators: Vec<(String, ValidatorFn)>,
    sanitizers: Vec<(String, SanitizerFn)>,
    formatter: ErrorFormatter,
    options: ValidatorOptions,
}

impl ValidatorConfigBuilder {
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
            sanitizers: Vec::new(),
            formatter: Arc::new(default_formatter),
            options: ValidatorOptions::default(),
        }
    }

    /// Add a synchronous validator; replaces a built-in of the same name.
    pub fn custom_validator<F>(self, name: impl Into<String>, validator: F) -> Self
    where
        F: Fn(&Input<'_>) -> bool + Send + Sync + 'static,
    {
        self.custom_validator_fn(name, move |input: &Input<'_>| {
            Verdict::Ready(validator(input))
        })
    }

    /// Add a validator that returns a future.
    ///
    /// The future must own what it uses; copy values out of the input first.
    pub fn custom_async_validator<F, Fut>(self, name: impl Into<String>, validator: F) -> Self
    where
        F: Fn(&Input<'_>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, BoxError>> + Send + 'static,
    {
        self.custom_validator_fn(name, move |input: &Input<'_>| {
            Verdict::Pending(Box::pin(validator(input)))
        })
    }

    /// Add an [`AsyncValidator`] implementation.
    pub fn custom_async_validator_impl(
        mut self,
        name: impl Into<String>,
        validator: impl AsyncValidator,
    ) -> Self {
        self.validators
            .push((name.into(), async_validator_fn(validator)));
        self
    }

    /// Add a validator that decides per call whether to answer now or later.
    pub fn custom_validator_fn<F>(mut self, name: impl Into<String>, validator: F) -> Self
    where
        F: Fn(&Input<'_>) -> Verdict + Send + Sync + 'static,
    {
        self.validators.push((name.into(), Arc::new(validator)));
        self
    }

    /// Add a sanitizer; replaces a built-in of the same name.
    pub fn custom_sanitizer<F>(mut self, name: impl Into<String>, sanitizer: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.sanitizers.push((name.into(), Arc::new(sanitizer)));
        self
    }

    /// Replace the `{param, msg, value}` output shape.
    pub fn error_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&str, &str, Option<&Value>) -> Value + Send + Sync + 'static,
    {
        self.formatter = Arc::new(formatter);
        self
    }

    pub fn skip_validation_on_first_error(mut self, enabled: bool) -> Self {
        self.options.skip_validation_on_first_error = enabled;
        self
    }

    pub fn options(mut self, options: ValidatorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> ValidatorConfig {
        ValidatorConfig {
            validators: self.validators,
            sanitizers: self.sanitizers,
            formatter: self.formatter,
            options: self.options,
        }
    }
}

impl Default for ValidatorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
