//! Named validators and sanitizers available to chains.
//!
//! A [`PredicateRegistry`] is built once per middleware configuration and
//! shared read-only by every request the middleware serves.

use crate::context::Sections;
use crate::error::BoxError;
use async_trait::async_trait;
use fieldguard_predicates::{catalog, Entry};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed, `Send` future.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Type-erased validator.
pub type ValidatorFn = Arc<dyn Fn(&Input<'_>) -> Verdict + Send + Sync>;

/// Type-erased sanitizer: raw value and call arguments to replacement value.
pub type SanitizerFn = Arc<dyn Fn(&Value, &[Value]) -> Value + Send + Sync>;

/// Outcome of a validator call.
pub enum Verdict {
    /// Decided synchronously
    Ready(bool),
    /// Decided once the future resolves; `Err` counts as a failure
    Pending(BoxFuture<Result<bool, BoxError>>),
}

impl From<bool> for Verdict {
    fn from(valid: bool) -> Self {
        Verdict::Ready(valid)
    }
}

impl fmt::Debug for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Ready(valid) => f.debug_tuple("Ready").field(valid).finish(),
            Verdict::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// What a validator sees of the field under test.
#[derive(Debug, Clone, Copy)]
pub struct Input<'a> {
    text: &'a str,
    raw: Option<&'a Value>,
    args: &'a [Value],
    sections: &'a Sections,
}

impl<'a> Input<'a> {
    pub fn new(
        text: &'a str,
        raw: Option<&'a Value>,
        args: &'a [Value],
        sections: &'a Sections,
    ) -> Self {
        Self {
            text,
            raw,
            args,
            sections,
        }
    }

    /// The field value coerced to a string.
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// The field value as found in the request; `None` when absent.
    pub fn raw(&self) -> Option<&'a Value> {
        self.raw
    }

    /// Positional arguments of the chain call.
    pub fn args(&self) -> &'a [Value] {
        self.args
    }

    pub fn arg(&self, index: usize) -> Option<&'a Value> {
        self.args.get(index)
    }

    /// Every section of the request the field belongs to.
    pub fn sections(&self) -> &'a Sections {
        self.sections
    }
}

/// A validator that needs to await, e.g. a uniqueness lookup.
///
/// ```rust,ignore
/// struct UniqueEmail { pool: PgPool }
///
/// #[async_trait]
/// impl AsyncValidator for UniqueEmail {
///     async fn validate(&self, text: &str, _args: &[Value], _sections: &Sections)
///         -> Result<bool, BoxError>
///     {
///         let taken = sqlx::query("SELECT 1 FROM users WHERE email = $1")
///             .bind(text)
///             .fetch_optional(&self.pool)
///             .await?;
///         Ok(taken.is_none())
///     }
/// }
/// ```
#[async_trait]
pub trait AsyncValidator: Send + Sync + 'static {
    /// Return `Ok(true)` when the value is valid.
    async fn validate(
        &self,
        text: &str,
        args: &[Value],
        sections: &Sections,
    ) -> Result<bool, BoxError>;
}

pub(crate) fn async_validator_fn<V: AsyncValidator>(validator: V) -> ValidatorFn {
    let validator = Arc::new(validator);
    Arc::new(move |input: &Input<'_>| {
        let validator = Arc::clone(&validator);
        let text = input.text().to_string();
        let args = input.args().to_vec();
        let sections = input.sections().clone();
        Verdict::Pending(Box::pin(async move {
            validator.validate(&text, &args, &sections).await
        }))
    })
}

/// Immutable name lookup for validators and sanitizers.
#[derive(Clone)]
pub struct PredicateRegistry {
    validators: HashMap<String, ValidatorFn>,
    sanitizers: HashMap<String, SanitizerFn>,
}

impl PredicateRegistry {
    /// Registry holding the built-in library only.
    pub fn builtin() -> Self {
        let mut registry = Self {
            validators: HashMap::new(),
            sanitizers: HashMap::new(),
        };
        for (name, entry) in catalog() {
            match entry {
                Entry::Check(check) => registry.insert_validator(
                    name,
                    Arc::new(move |input: &Input<'_>| {
                        Verdict::Ready(check(input.text(), input.args()))
                    }),
                ),
                Entry::Transform(transform) => {
                    registry.insert_sanitizer(name, Arc::new(transform))
                }
            }
        }
        registry
    }

    /// Insert or replace a validator.
    pub(crate) fn insert_validator(&mut self, name: impl Into<String>, validator: ValidatorFn) {
        self.validators.insert(name.into(), validator);
    }

    /// Insert or replace a sanitizer.
    pub(crate) fn insert_sanitizer(&mut self, name: impl Into<String>, sanitizer: SanitizerFn) {
        self.sanitizers.insert(name.into(), sanitizer);
    }

    pub fn validator(&self, name: &str) -> Option<&ValidatorFn> {
        self.validators.get(name)
    }

    pub fn sanitizer(&self, name: &str) -> Option<&SanitizerFn> {
        self.sanitizers.get(name)
    }

    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }

    pub fn sanitizer_count(&self) -> usize {
        self.sanitizers.len()
    }

    /// Sorted validator names.
    pub fn validator_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.validators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Sorted sanitizer names.
    pub fn sanitizer_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.sanitizers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for PredicateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateRegistry")
            .field("validators", &self.validator_names())
            .field("sanitizers", &self.sanitizer_names())
            .finish()
    }
}
